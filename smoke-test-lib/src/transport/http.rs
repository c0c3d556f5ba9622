//! HTTP transport built on `reqwest`.
//!
//! Redirect handling is a client-level setting in `reqwest`, so the
//! transport keeps one client that follows redirects and one that does not,
//! and picks per request. Timeout and basic auth are applied per request.
//!
//! `reqwest` exposes no connection-established hook. Before each request
//! the transport resolves the host and opens a TCP connection of its own,
//! and uses that as the connect time. Pooling is disabled so the request
//! pays the same setup. TLS handshakes are not part of the measurement.

use super::{FailureKind, Timings, Transport, TransportFailure, TransportResponse};
use crate::error::SmokeTestError;
use crate::options::RequestOptions;
use crate::value::BodyLength;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// Maximum number of redirects followed when redirects are enabled.
const MAX_REDIRECTS: usize = 10;

/// Upper bound of UTF-8 bytes per character.
const MAX_UTF8_BYTES: usize = 4;

/// Smallest timeout handed to `reqwest` once connect timing used up the rest.
const MIN_REQUEST_BUDGET: Duration = Duration::from_millis(1);

/// Production transport for smoke requests.
#[derive(Clone)]
pub struct HttpTransport {
    /// Client following up to [`MAX_REDIRECTS`] redirects
    following: reqwest::Client,
    /// Client returning redirect responses as-is
    direct: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with default client settings.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeTestError::Transport`] if a `reqwest` client cannot be
    /// built (for example when the TLS backend fails to initialise).
    pub fn new() -> Result<Self, SmokeTestError> {
        Ok(Self {
            following: build_client(Policy::limited(MAX_REDIRECTS))?,
            direct: build_client(Policy::none())?,
        })
    }

    fn client_for(&self, options: &RequestOptions) -> &reqwest::Client {
        if options.follow_redirect() {
            &self.following
        } else {
            &self.direct
        }
    }
}

fn build_client(policy: Policy) -> Result<reqwest::Client, SmokeTestError> {
    reqwest::Client::builder()
        .redirect(policy)
        .user_agent(format!("smoke-test/{}", crate::VERSION))
        .pool_max_idle_per_host(0)
        .build()
        .map_err(|e| {
            SmokeTestError::transport(format!("Failed to create HTTP client: {}", describe(&e)))
        })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        options: &RequestOptions,
        body_limit: BodyLength,
    ) -> Result<TransportResponse, TransportFailure> {
        let timeout = options.timeout().as_duration();
        let dispatched = Instant::now();
        let connected = measure_connect(options.url().as_str(), timeout)
            .await?
            .unwrap_or(Duration::ZERO);

        let remaining = timeout.saturating_sub(dispatched.elapsed()).max(MIN_REQUEST_BUDGET);

        let mut request = self
            .client_for(options)
            .get(options.url().as_str())
            .timeout(remaining);

        if let Some(auth) = options.basic_auth() {
            request = request.basic_auth(auth.username(), Some(auth.password()));
        }

        // The response future resolves once the status line and headers arrived.
        let sent = Instant::now();
        let mut response = request.send().await.map_err(|e| failure_from(&e))?;
        let timings = Timings {
            connected,
            first_byte: sent.elapsed(),
        };

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        tracing::debug!(
            url = %options.url(),
            status,
            connected_ms = timings.connected.as_millis() as u64,
            first_byte_ms = timings.first_byte.as_millis() as u64,
            "Response headers received"
        );

        let byte_cap = body_limit.as_usize().saturating_mul(MAX_UTF8_BYTES);
        let mut bytes = Vec::new();
        while bytes.len() < byte_cap {
            match response.chunk().await {
                Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => return Err(failure_from(&e).with_headers(headers)),
            }
        }
        bytes.truncate(byte_cap);

        Ok(TransportResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            timings,
        })
    }
}

fn failure_from(err: &reqwest::Error) -> TransportFailure {
    TransportFailure::new(classify(err), describe(err))
}

fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else if err.is_redirect() {
        FailureKind::Redirect
    } else if err.is_body() || err.is_decode() {
        FailureKind::Body
    } else if err.is_request() {
        FailureKind::Request
    } else {
        FailureKind::Other
    }
}

/// Time taken to resolve `url`'s host and open a TCP connection to it.
///
/// `Ok(None)` when no address can be derived or the connection fails; the
/// request that follows reports the real error. Running out of `budget`
/// is a timeout of the whole request.
async fn measure_connect(
    url: &str,
    budget: Duration,
) -> Result<Option<Duration>, TransportFailure> {
    let Some(address) = socket_address(url) else {
        return Ok(None);
    };

    let start = Instant::now();
    match tokio::time::timeout(budget, TcpStream::connect(address.as_str())).await {
        Ok(Ok(_stream)) => Ok(Some(start.elapsed())),
        Ok(Err(e)) => {
            tracing::debug!(address = %address, "Connect timing unavailable: {}", e);
            Ok(None)
        }
        Err(_) => Err(TransportFailure::new(
            FailureKind::Timeout,
            format!("operation timed out while connecting to {}", address),
        )),
    }
}

/// `host:port` for a URL, with the scheme's default port filled in.
fn socket_address(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port_or_known_default()?;
    Some(format!("{}:{}", host, port))
}

/// The error followed by its source chain, e.g. DNS or TLS details.
///
/// Causes whose text is already part of the message are skipped.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
