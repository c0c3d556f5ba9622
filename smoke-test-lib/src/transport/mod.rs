//! Transport layer for smoke requests.
//!
//! The runner only talks to the [`Transport`] trait. The production
//! implementation is [`HttpTransport`] over `reqwest`; tests plug in fakes.

/// `reqwest`-backed transport
pub mod http;

pub use http::HttpTransport;

use crate::options::RequestOptions;
use crate::value::BodyLength;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Timing marks of one exchange, as offsets from the moment it was dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    /// Connection established
    pub connected: Duration,
    /// First response byte received
    pub first_byte: Duration,
}

/// A response as delivered by the transport, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub timings: Timings,
}

/// Category of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connect,
    Redirect,
    Body,
    Request,
    Other,
}

impl FailureKind {
    /// Stable lowercase code used in error messages.
    pub fn code(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Redirect => "redirect",
            Self::Body => "body",
            Self::Request => "request",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A request that never produced a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Headers received before the failure, usually none.
    pub headers: Vec<(String, String)>,
}

impl TransportFailure {
    pub fn new<M: Into<String>>(kind: FailureKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// `Transport Code: <code> Error: <message>`
    pub fn describe(&self) -> String {
        format!("Transport Code: {} Error: {}", self.kind, self.message)
    }
}

/// Something that can execute one smoke request.
///
/// Implementations must honour the options' timeout, redirect policy and
/// credentials, and should not read more of the body than `body_limit`
/// characters can occupy.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        options: &RequestOptions,
        body_limit: BodyLength,
    ) -> Result<TransportResponse, TransportFailure>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        options: &RequestOptions,
        body_limit: BodyLength,
    ) -> Result<TransportResponse, TransportFailure> {
        (**self).execute(options, body_limit).await
    }
}
