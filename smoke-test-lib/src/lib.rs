//! # Smoke Test Library
//!
//! A small library for smoke-testing HTTP endpoints: fire a batch of GET
//! requests under a concurrency ceiling and collect one result per request.
//!
//! Each request produces either a [`ValidResult`] (a response arrived, with
//! status, headers, truncated body and time to first byte) or an
//! [`ErrorResult`] (no usable response, with an error message). Callbacks are
//! invoked for every result as it completes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smoke_test_lib::{BodyLength, RequestOptions, Runner, Url};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runner = Runner::new(10, BodyLength::DEFAULT, |_| {}, |_| {})?;
//!     runner.register(RequestOptions::new(Url::new("https://example.com/health")?));
//!
//!     for result in runner.run().await {
//!         println!("{}", result.as_string());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded Concurrency**: At most N requests in flight
//! - **Per-request Options**: Timeout, redirect policy and basic auth
//! - **Pluggable Transport**: Swap the HTTP client for tests or custom stacks
//! - **Configurable**: TOML files and `ST_*` environment variables

// Re-export main public API types and functions
pub use config::{
    load_env_config, parse_timeout, parse_timeout_string, AuthConfig, ConfigManager,
    DefaultsConfig, EnvConfig, FileConfig, SmokeConfig, MAX_CONCURRENCY,
};
pub use error::SmokeTestError;
pub use headers::HeaderCollection;
pub use options::RequestOptions;
pub use result::{ErrorResult, ResultCollection, SmokeResult, ValidResult};
pub use runner::{ErrorCallback, Runner, SuccessCallback};
pub use transport::{
    FailureKind, HttpTransport, Timings, Transport, TransportFailure, TransportResponse,
};
pub use utils::{parse_url_list, read_url_file, UrlList};
pub use value::{
    BasicAuth, Body, BodyLength, Concurrency, ErrorMessage, Header, HeaderKey, HeaderValue,
    RequestTimeout, StatusCode, TimeToFirstByte, Url,
};

// Public modules
pub mod transport;

// Internal modules - reachable through the re-exports above
mod config;
mod error;
mod headers;
mod options;
mod result;
mod runner;
mod utils;
mod value;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SmokeTestError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
