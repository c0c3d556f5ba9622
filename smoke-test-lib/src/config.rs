//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `ST_*`
//! environment variables, merging them with proper precedence rules, and the
//! runtime defaults ([`SmokeConfig`]) every request is built from.

use crate::error::SmokeTestError;
use crate::options::RequestOptions;
use crate::value::{BasicAuth, BodyLength, RequestTimeout, Url};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest concurrency accepted from config files and environment.
pub const MAX_CONCURRENCY: usize = 100;

/// Runtime settings shared by all requests of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeConfig {
    /// Maximum number of requests in flight
    /// Default: 10
    pub concurrency: usize,

    /// Characters of each body kept in results
    /// Default: 500
    pub body_length: BodyLength,

    /// Timeout for each individual request
    /// Default: 10 seconds
    pub timeout: RequestTimeout,

    /// Whether redirects are followed
    /// Default: true
    pub follow_redirect: bool,

    /// Credentials sent with every request
    /// Default: none
    pub basic_auth: Option<BasicAuth>,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            body_length: BodyLength::DEFAULT,
            timeout: RequestTimeout::DEFAULT,
            follow_redirect: true,
            basic_auth: None,
        }
    }
}

impl SmokeConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_body_length(mut self, body_length: BodyLength) -> Self {
        self.body_length = body_length;
        self
    }

    pub fn with_timeout(mut self, timeout: RequestTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_follow_redirect(mut self, follow: bool) -> Self {
        self.follow_redirect = follow;
        self
    }

    pub fn with_basic_auth(mut self, auth: Option<BasicAuth>) -> Self {
        self.basic_auth = auth;
        self
    }

    /// Request options for `url` carrying these settings.
    pub fn request_options(&self, url: Url) -> RequestOptions {
        let options = RequestOptions::new(url)
            .with_timeout(self.timeout)
            .with_follow_redirect(self.follow_redirect);

        match &self.basic_auth {
            Some(auth) => options.with_basic_auth(auth.clone()),
            None => options,
        }
    }
}

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Target URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,

    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Basic auth credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_length: Option<usize>,

    /// Timeout as string, e.g. "5s", "2m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_redirect: Option<bool>,
}

/// Basic auth section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl FileConfig {
    /// Apply this file's values on top of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value fails validation (only possible for
    /// configs that were not loaded through [`ConfigManager`]).
    pub fn apply_to(&self, mut config: SmokeConfig) -> Result<SmokeConfig, SmokeTestError> {
        if let Some(defaults) = &self.defaults {
            if let Some(concurrency) = defaults.concurrency {
                config.concurrency = concurrency;
            }
            if let Some(body_length) = defaults.body_length {
                config.body_length = BodyLength::new(body_length);
            }
            if let Some(timeout_str) = &defaults.timeout {
                config.timeout = parse_timeout(timeout_str)?;
            }
            if let Some(follow) = defaults.follow_redirect {
                config.follow_redirect = follow;
            }
        }

        if let Some(auth) = &self.auth {
            config.basic_auth = Some(BasicAuth::new(&auth.username, &auth.password)?);
        }

        Ok(config)
    }

    /// Validated target URLs from the `urls` list.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first malformed URL.
    pub fn target_urls(&self) -> Result<Vec<Url>, SmokeTestError> {
        self.urls
            .iter()
            .flatten()
            .map(|u| Url::new(u.as_str()))
            .collect()
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns a file error if the file is missing or unreadable, and a
    /// configuration error if it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, SmokeTestError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SmokeTestError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SmokeTestError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is applied first, then the global file in `$HOME`, then
    /// a local file in the working directory; later files win.
    ///
    /// # Errors
    ///
    /// Discovery itself does not fail; unreadable or invalid files are
    /// skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, SmokeTestError> {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Using configuration file");
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Ignoring configuration file: {}", e);
                }
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./smoke-test.toml", "./.smoke-test.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".smoke-test.toml", "smoke-test.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("smoke-test").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` take precedence.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            urls: higher.urls.or(lower.urls),
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    body_length: higher_defaults.body_length.or(lower_defaults.body_length),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    follow_redirect: higher_defaults
                        .follow_redirect
                        .or(lower_defaults.follow_redirect),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            auth: higher.auth.or(lower.auth),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), SmokeTestError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(SmokeTestError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                parse_timeout(timeout_str)?;
            }
        }

        if let Some(auth) = &config.auth {
            if auth.username.is_empty() {
                return Err(SmokeTestError::config("Auth username cannot be empty"));
            }
        }

        if let Some(urls) = &config.urls {
            for url in urls {
                Url::new(url.as_str())
                    .map_err(|e| SmokeTestError::config(format!("Invalid URL in config: {}", e)))?;
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values come from `ST_*` variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub body_length: Option<usize>,
    pub timeout: Option<String>,
    pub follow_redirect: Option<bool>,
    pub basic_auth: Option<BasicAuth>,
    pub json: Option<bool>,
    pub file: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from `ST_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    if let Ok(val) = env::var("ST_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= MAX_CONCURRENCY => {
                tracing::info!("Using ST_CONCURRENCY={}", concurrency);
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!(
                "Invalid ST_CONCURRENCY='{}', must be 1-{}",
                val,
                MAX_CONCURRENCY
            ),
        }
    }

    if let Ok(val) = env::var("ST_BODY_LENGTH") {
        match val.parse::<usize>() {
            Ok(length) => {
                tracing::info!("Using ST_BODY_LENGTH={}", length);
                env_config.body_length = Some(length);
            }
            Err(_) => tracing::warn!("Invalid ST_BODY_LENGTH='{}'", val),
        }
    }

    if let Ok(timeout_str) = env::var("ST_TIMEOUT") {
        if parse_timeout(&timeout_str).is_ok() {
            tracing::info!("Using ST_TIMEOUT={}", timeout_str);
            env_config.timeout = Some(timeout_str);
        } else {
            tracing::warn!(
                "Invalid ST_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                timeout_str
            );
        }
    }

    env_config.follow_redirect = env_flag("ST_FOLLOW_REDIRECT");
    env_config.json = env_flag("ST_JSON");

    if let Ok(val) = env::var("ST_BASIC_AUTH") {
        match val.parse::<BasicAuth>() {
            Ok(auth) => {
                tracing::info!("Using ST_BASIC_AUTH for user '{}'", auth.username());
                env_config.basic_auth = Some(auth);
            }
            Err(e) => tracing::warn!("Invalid ST_BASIC_AUTH: {}", e),
        }
    }

    if let Ok(file_path) = env::var("ST_FILE") {
        if !file_path.trim().is_empty() {
            tracing::info!("Using ST_FILE={}", file_path);
            env_config.file = Some(file_path);
        }
    }

    if let Ok(config_path) = env::var("ST_CONFIG") {
        if !config_path.trim().is_empty() {
            tracing::info!("Using ST_CONFIG={}", config_path);
            env_config.config = Some(config_path);
        }
    }

    env_config
}

impl EnvConfig {
    /// Apply the environment values on top of `config`.
    pub fn apply_to(&self, mut config: SmokeConfig) -> SmokeConfig {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(body_length) = self.body_length {
            config.body_length = BodyLength::new(body_length);
        }
        if let Some(timeout) = self.timeout.as_deref().and_then(|t| parse_timeout(t).ok()) {
            config.timeout = timeout;
        }
        if let Some(follow) = self.follow_redirect {
            config.follow_redirect = follow;
        }
        if let Some(auth) = &self.basic_auth {
            config.basic_auth = Some(auth.clone());
        }
        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let val = env::var(name).ok()?;
    let parsed = parse_bool(&val);
    match parsed {
        Some(flag) => tracing::info!("Using {}={}", name, flag),
        None => tracing::warn!("Invalid {}='{}', use true/false", name, val),
    }
    parsed
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

/// Parse a timeout string into a validated [`RequestTimeout`].
///
/// # Errors
///
/// Returns a configuration error for unparsable or zero timeouts.
pub fn parse_timeout(timeout_str: &str) -> Result<RequestTimeout, SmokeTestError> {
    let secs = parse_timeout_string(timeout_str).ok_or_else(|| {
        SmokeTestError::config(format!(
            "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
            timeout_str
        ))
    })?;

    RequestTimeout::new(Duration::from_secs(secs))
        .map_err(|e| SmokeTestError::config(format!("Invalid timeout '{}': {}", timeout_str, e)))
}
