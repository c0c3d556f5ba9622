//! Smoke Test CLI Application
//!
//! A command-line interface for smoke testing HTTP endpoints concurrently.
//! This CLI application provides a user-friendly interface to the smoke-test-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use smoke_test_lib::{load_env_config, parse_timeout, read_url_file, ConfigManager};
use smoke_test_lib::{BasicAuth, BodyLength, EnvConfig, FileConfig, SmokeConfig};
use smoke_test_lib::{ErrorResult, ResultCollection, Runner, SmokeResult, Url, ValidResult};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for smoke-test
#[derive(Parser, Debug)]
#[command(name = "smoke-test")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Smoke test HTTP endpoints concurrently")]
#[command(
    long_about = "Send a GET request to every URL with bounded concurrency and report status, time to first byte and body.\n\nA URL passes when it answers with a 2xx status. The exit code is 1 if any URL fails."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// URLs to check
    #[arg(value_name = "URLS", help_heading = "Target Selection")]
    pub urls: Vec<String>,

    /// Input file with URLs (one per line)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Target Selection"
    )]
    pub file: Option<String>,

    /// Max concurrent requests (default: 10, max: 100)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Characters of each response body to keep (default: 500)
    #[arg(
        short = 'b',
        long = "body-length",
        value_name = "CHARS",
        help_heading = "Request"
    )]
    pub body_length: Option<usize>,

    /// Per-request timeout, e.g. "5s", "2m" (default: 10s)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Request"
    )]
    pub timeout: Option<String>,

    /// Report redirects instead of following them
    #[arg(long = "no-follow-redirect", help_heading = "Request")]
    pub no_follow_redirect: bool,

    /// Basic auth credentials as user:password
    #[arg(
        short = 'u',
        long = "basic-auth",
        value_name = "USER:PASSWORD",
        help_heading = "Request"
    )]
    pub basic_auth: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Show the truncated response body under each result
    #[arg(long = "show-body", help_heading = "Output Format")]
    pub show_body: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed debug information and error messages
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Pass/fail counts of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) total: usize,
    pub(crate) passed: usize,
    pub(crate) failed: usize,
}

impl RunSummary {
    fn from_results(results: &[SmokeResult]) -> Self {
        let passed = results.iter().filter(|r| passes(r)).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        }
    }

    fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// A result passes when a response arrived with a 2xx status.
pub(crate) fn passes(result: &SmokeResult) -> bool {
    result.status_code().is_some_and(|status| status.is_success())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);

    tracing::info!("Smoke Test CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match run_smoke_test(args).await {
        Ok(summary) if summary.all_passed() => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > smoke_test_lib::MAX_CONCURRENCY {
            return Err(format!(
                "Concurrency must be between 1 and {}",
                smoke_test_lib::MAX_CONCURRENCY
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        parse_timeout(timeout).map_err(|e| e.to_string())?;
    }

    if let Some(auth) = &args.basic_auth {
        auth.parse::<BasicAuth>().map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins over `--verbose`/`--debug`.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,smoke_test={0},smoke_test_lib={0}", level))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(args.debug)
        .try_init();
}

/// Main smoke testing logic
async fn run_smoke_test(args: Args) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let file_config = load_file_config(&args, &env_config)?;

    // Build configuration: defaults < config file < environment < CLI
    let config = build_config(&args, &file_config, &env_config)?;
    let urls = get_urls_to_check(&args, &env_config, &file_config)?;
    let json = args.json || env_config.json.unwrap_or(false);

    if !json {
        ui::print_header(urls.len(), &config);
    }

    let results = run_requests(&config, urls, &args, json).await?;

    let summary = RunSummary::from_results(results.as_slice());
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        ui::print_failure_summary(&results);
    }

    Ok(summary)
}

/// Register every URL and run the batch, printing each result as it lands.
async fn run_requests(
    config: &SmokeConfig,
    urls: Vec<Url>,
    args: &Args,
    json: bool,
) -> Result<ResultCollection, Box<dyn std::error::Error>> {
    let total = urls.len();
    let completed = Arc::new(AtomicUsize::new(0));
    let show_body = args.show_body;
    let detailed = args.verbose || args.debug;

    let on_success = {
        let completed = completed.clone();
        move |result: &ValidResult| {
            let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if !json {
                ui::print_valid(result, show_body, (current, total));
            }
        }
    };

    let on_error = move |result: &ErrorResult| {
        let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if !json {
            ui::print_error(result, detailed, (current, total));
        }
    };

    let mut runner = Runner::new(config.concurrency, config.body_length, on_success, on_error)?;
    for url in urls {
        runner.register(config.request_options(url));
    }

    let start = Instant::now();
    let results = runner.run().await;

    if !json {
        ui::print_summary(
            &RunSummary::from_results(results.as_slice()),
            start.elapsed(),
        );
    }

    Ok(results)
}

/// Load the explicit config file (`--config`, then `ST_CONFIG`) or discover one.
fn load_file_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new();

    let explicit = args.config.as_ref().or(env_config.config.as_ref());

    match explicit {
        Some(path) => {
            tracing::info!("Using explicit config file: {}", path);
            let file_config = config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
            Ok(file_config)
        }
        None => {
            tracing::debug!("Discovering config files");
            Ok(config_manager.discover_and_load()?)
        }
    }
}

fn build_config(
    args: &Args,
    file_config: &FileConfig,
    env_config: &EnvConfig,
) -> Result<SmokeConfig, Box<dyn std::error::Error>> {
    let config = file_config.apply_to(SmokeConfig::default())?;
    let config = env_config.apply_to(config);
    apply_cli_args_to_config(config, args)
}

fn apply_cli_args_to_config(
    mut config: SmokeConfig,
    args: &Args,
) -> Result<SmokeConfig, Box<dyn std::error::Error>> {
    // CLI arguments always win over environment and config
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(body_length) = args.body_length {
        config.body_length = BodyLength::new(body_length);
    }
    if let Some(timeout) = &args.timeout {
        config.timeout = parse_timeout(timeout)?;
    }

    // Only override when the flag is passed, so config/env values survive
    if args.no_follow_redirect {
        config.follow_redirect = false;
    }
    if let Some(auth) = &args.basic_auth {
        config.basic_auth = Some(auth.parse()?);
    }

    Ok(config)
}

/// Get the URLs to check from CLI args, a URL file, or the config file.
///
/// Positional URLs and `--file` (or `ST_FILE`) are combined; the config
/// file's `urls` list is only used when neither provided any.
fn get_urls_to_check(
    args: &Args,
    env_config: &EnvConfig,
    file_config: &FileConfig,
) -> Result<Vec<Url>, Box<dyn std::error::Error>> {
    let mut urls = args
        .urls
        .iter()
        .map(|raw| Url::new(raw.as_str()).map_err(|e| format!("'{}': {}", raw, e)))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(path) = args.file.as_ref().or(env_config.file.as_ref()) {
        urls.extend(read_url_file(path)?);
    }

    if urls.is_empty() {
        urls = file_config.target_urls()?;
    }

    if urls.is_empty() {
        return Err(
            "You must specify URLs, a file with --file, or a `urls` list in a config file".into(),
        );
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smoke_test_lib::{
        Body, DefaultsConfig, ErrorMessage, HeaderCollection, RequestTimeout, StatusCode,
        TimeToFirstByte,
    };
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_args() -> Args {
        Args::try_parse_from(["smoke-test"]).unwrap()
    }

    fn valid(url: &str, status: u16) -> SmokeResult {
        ValidResult::new(
            Url::new(url).unwrap(),
            HeaderCollection::new(),
            Body::new("ok"),
            TimeToFirstByte::from_millis(12),
            StatusCode::new(status).unwrap(),
        )
        .into()
    }

    fn failed(url: &str) -> SmokeResult {
        ErrorResult::new(
            Url::new(url).unwrap(),
            HeaderCollection::new(),
            ErrorMessage::new("Transport Code: timeout Error: timed out").unwrap(),
        )
        .into()
    }

    #[test]
    fn test_parse_all_flags() {
        let args = Args::try_parse_from([
            "smoke-test",
            "https://example.com",
            "-c",
            "5",
            "-b",
            "80",
            "-t",
            "3s",
            "--no-follow-redirect",
            "-u",
            "user:pass",
            "--json",
            "--show-body",
        ])
        .unwrap();

        assert_eq!(args.urls, vec!["https://example.com"]);
        assert_eq!(args.concurrency, Some(5));
        assert_eq!(args.body_length, Some(80));
        assert_eq!(args.timeout.as_deref(), Some("3s"));
        assert!(args.no_follow_redirect);
        assert!(args.json);
        assert!(args.show_body);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_concurrency_range() {
        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(101);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(100);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_timeout_and_auth() {
        let mut args = create_test_args();
        args.timeout = Some("soon".to_string());
        assert!(validate_args(&args).is_err());

        args.timeout = Some("0s".to_string());
        assert!(validate_args(&args).is_err());

        args.timeout = None;
        args.basic_auth = Some("no-colon".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_cli_args_override_config() {
        let mut args = create_test_args();
        args.concurrency = Some(3);
        args.timeout = Some("2m".to_string());
        args.no_follow_redirect = true;
        args.basic_auth = Some("admin:pw".to_string());

        let base = SmokeConfig::default()
            .with_concurrency(50)
            .with_body_length(BodyLength::new(42));
        let config = apply_cli_args_to_config(base, &args).unwrap();

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.body_length.as_usize(), 42); // Not set on CLI, preserved
        assert_eq!(config.timeout, RequestTimeout::from_secs(120).unwrap());
        assert!(!config.follow_redirect);
        assert_eq!(config.basic_auth.unwrap().username(), "admin");
    }

    #[test]
    fn test_unset_flags_keep_lower_layers() {
        let args = create_test_args();
        let base = SmokeConfig::default()
            .with_follow_redirect(false)
            .with_concurrency(7);
        let config = apply_cli_args_to_config(base.clone(), &args).unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn test_build_config_precedence() {
        let file_config = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(30),
                body_length: Some(100),
                timeout: Some("20s".to_string()),
                follow_redirect: None,
            }),
            ..Default::default()
        };
        let env_config = EnvConfig {
            concurrency: Some(15),
            ..Default::default()
        };
        let mut args = create_test_args();
        args.body_length = Some(5);

        let config = build_config(&args, &file_config, &env_config).unwrap();
        assert_eq!(config.concurrency, 15); // env over file
        assert_eq!(config.body_length.as_usize(), 5); // CLI over file
        assert_eq!(config.timeout.in_seconds(), 20); // file over default
    }

    #[test]
    fn test_urls_from_args_and_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# targets").unwrap();
        writeln!(file, "https://from-file.example/health").unwrap();
        file.flush().unwrap();

        let mut args = create_test_args();
        args.urls = vec!["https://from-args.example".to_string()];
        args.file = Some(file.path().to_string_lossy().to_string());

        let urls =
            get_urls_to_check(&args, &EnvConfig::default(), &FileConfig::default()).unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://from-args.example");
    }

    #[test]
    fn test_urls_fall_back_to_config_file() {
        let file_config = FileConfig {
            urls: Some(vec!["https://from-config.example".to_string()]),
            ..Default::default()
        };
        let urls =
            get_urls_to_check(&create_test_args(), &EnvConfig::default(), &file_config).unwrap();
        assert_eq!(urls[0].as_str(), "https://from-config.example");
    }

    #[test]
    fn test_no_urls_is_an_error() {
        let result = get_urls_to_check(
            &create_test_args(),
            &EnvConfig::default(),
            &FileConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_url_argument() {
        let mut args = create_test_args();
        args.urls = vec!["example.com".to_string()];
        let err = get_urls_to_check(&args, &EnvConfig::default(), &FileConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("example.com"));
    }

    #[test]
    fn test_pass_rule() {
        assert!(passes(&valid("https://a.example", 200)));
        assert!(passes(&valid("https://a.example", 204)));
        assert!(!passes(&valid("https://a.example", 301)));
        assert!(!passes(&valid("https://a.example", 503)));
        assert!(!passes(&failed("https://a.example")));
    }

    #[test]
    fn test_run_summary() {
        let results = vec![
            valid("https://a.example", 200),
            valid("https://b.example", 500),
            failed("https://c.example"),
        ];

        let summary = RunSummary::from_results(&results);
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                passed: 1,
                failed: 2
            }
        );
        assert!(!summary.all_passed());
    }
}
