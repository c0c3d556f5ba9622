//! Self-validating value objects.
//!
//! Every type here checks its input on construction and is immutable
//! afterwards. Invalid input is rejected with [`SmokeTestError::Validation`]
//! (or [`SmokeTestError::Config`] for [`Concurrency`]), never coerced.

use crate::error::SmokeTestError;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::Duration;

/// Validated absolute `http`/`https` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Url(String);

impl Url {
    /// Validate and wrap a URL string.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the string is not an absolute URL with
    /// an `http` or `https` scheme and a host.
    pub fn new<S: Into<String>>(url: S) -> Result<Self, SmokeTestError> {
        let url = url.into().trim().to_string();

        if url.is_empty() {
            return Err(SmokeTestError::validation("url", "URL cannot be empty"));
        }

        let parsed = url::Url::parse(&url)
            .map_err(|e| SmokeTestError::validation("url", format!("'{}': {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SmokeTestError::validation(
                "url",
                format!("'{}': scheme must be http or https", url),
            ));
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(SmokeTestError::validation(
                "url",
                format!("'{}': missing host", url),
            ));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Url {
    type Err = SmokeTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Url {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP header name. Compared case-insensitively, displayed as received.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct HeaderKey(String);

impl HeaderKey {
    /// # Errors
    ///
    /// Returns a validation error for empty names or names containing
    /// whitespace, control characters or `:`.
    pub fn new<S: Into<String>>(key: S) -> Result<Self, SmokeTestError> {
        let key = key.into();

        if key.is_empty() {
            return Err(SmokeTestError::validation(
                "header key",
                "header key cannot be empty",
            ));
        }

        if let Some(bad) = key
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || *c == ':')
        {
            return Err(SmokeTestError::validation(
                "header key",
                format!("'{}' contains invalid character {:?}", key, bad),
            ));
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a plain string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for HeaderKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for HeaderKey {}

impl Hash for HeaderKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for HeaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP header value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderValue(String);

impl HeaderValue {
    /// # Errors
    ///
    /// Returns a validation error if the value contains CR or LF.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, SmokeTestError> {
        let value = value.into();

        if value.contains(['\r', '\n']) {
            return Err(SmokeTestError::validation(
                "header value",
                "header value cannot contain line breaks",
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    key: HeaderKey,
    value: HeaderValue,
}

impl Header {
    pub fn new(key: HeaderKey, value: HeaderValue) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &HeaderKey {
        &self.key
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

/// Maximum number of characters captured from a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BodyLength(usize);

impl BodyLength {
    pub const DEFAULT: BodyLength = BodyLength(500);

    pub const fn new(length: usize) -> Self {
        Self(length)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl Default for BodyLength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Captured response body, already truncated to its [`BodyLength`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Body(String);

impl Body {
    pub fn new<S: Into<String>>(body: S) -> Self {
        Self(body.into())
    }

    /// Keep at most `limit` characters of `raw`.
    pub fn truncated(raw: &str, limit: BodyLength) -> Self {
        match raw.char_indices().nth(limit.as_usize()) {
            Some((cut, _)) => Self(raw[..cut].to_string()),
            None => Self(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP status code in `100..=599`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StatusCode(u16);

impl StatusCode {
    /// # Errors
    ///
    /// Returns a validation error for codes outside `100..=599`.
    pub fn new(code: u16) -> Result<Self, SmokeTestError> {
        if !(100..=599).contains(&code) {
            return Err(SmokeTestError::validation(
                "status code",
                format!("{} is outside 100..=599", code),
            ));
        }
        Ok(Self(code))
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// 2xx
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time between connection establishment and the first response byte, in
/// whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct TimeToFirstByte(u64);

impl TimeToFirstByte {
    pub const ZERO: TimeToFirstByte = TimeToFirstByte(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Compute from two offsets measured from the same starting instant.
    ///
    /// A first byte that appears to precede the connection clamps to zero.
    /// The difference is rounded to the nearest millisecond, half up.
    pub fn from_timings(connected: Duration, first_byte: Duration) -> Self {
        let elapsed = first_byte.saturating_sub(connected);
        let millis = (elapsed.as_micros() + 500) / 1000;
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    pub const fn in_milliseconds(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimeToFirstByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-empty description of a transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMessage(String);

impl ErrorMessage {
    /// # Errors
    ///
    /// Returns a validation error if the message is empty or only whitespace.
    pub fn new<S: Into<String>>(message: S) -> Result<Self, SmokeTestError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(SmokeTestError::validation(
                "error message",
                "error message cannot be empty",
            ));
        }
        Ok(Self(message))
    }

    /// Used when a transport reports a failure without any description.
    pub(crate) fn unknown_failure() -> Self {
        Self("Transport Code: other Error: unknown transport failure".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maximum number of requests in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(usize);

impl Concurrency {
    /// # Errors
    ///
    /// Returns a configuration error when `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, SmokeTestError> {
        if limit == 0 {
            return Err(SmokeTestError::config("Concurrency must be at least 1"));
        }
        Ok(Self(limit))
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// Per-request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout(Duration);

impl RequestTimeout {
    pub const DEFAULT: RequestTimeout = RequestTimeout(Duration::from_secs(10));

    /// # Errors
    ///
    /// Returns a validation error for a zero duration.
    pub fn new(timeout: Duration) -> Result<Self, SmokeTestError> {
        if timeout.is_zero() {
            return Err(SmokeTestError::validation(
                "request timeout",
                "timeout must be greater than zero",
            ));
        }
        Ok(Self(timeout))
    }

    /// # Errors
    ///
    /// Returns a validation error when `secs` is zero.
    pub fn from_secs(secs: u64) -> Result<Self, SmokeTestError> {
        Self::new(Duration::from_secs(secs))
    }

    pub const fn as_duration(self) -> Duration {
        self.0
    }

    pub const fn in_seconds(self) -> u64 {
        self.0.as_secs()
    }
}

impl Default for RequestTimeout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// # Errors
    ///
    /// Returns a validation error when the username is empty.
    pub fn new<U: Into<String>, P: Into<String>>(
        username: U,
        password: P,
    ) -> Result<Self, SmokeTestError> {
        let username = username.into();
        if username.is_empty() {
            return Err(SmokeTestError::validation(
                "basic auth",
                "username cannot be empty",
            ));
        }
        Ok(Self {
            username,
            password: password.into(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Parses `user:password`. The password may itself contain `:`.
impl FromStr for BasicAuth {
    type Err = SmokeTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (username, password) = s.split_once(':').ok_or_else(|| {
            SmokeTestError::validation("basic auth", "expected format 'user:password'")
        })?;
        Self::new(username, password)
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
