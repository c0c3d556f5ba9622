//! Typed outcomes of smoke requests.
//!
//! A request either produced a response ([`ValidResult`], whatever its status
//! code) or failed at the transport level ([`ErrorResult`]). Both are wrapped
//! in [`SmokeResult`] and collected, in completion order, into a
//! [`ResultCollection`].

use crate::headers::HeaderCollection;
use crate::value::{Body, ErrorMessage, StatusCode, TimeToFirstByte, Url};
use serde::Serialize;
use std::fmt;

/// A request that received an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidResult {
    url: Url,
    headers: HeaderCollection,
    body: Body,
    time_to_first_byte: TimeToFirstByte,
    status_code: StatusCode,
}

impl ValidResult {
    pub fn new(
        url: Url,
        headers: HeaderCollection,
        body: Body,
        time_to_first_byte: TimeToFirstByte,
        status_code: StatusCode,
    ) -> Self {
        Self {
            url,
            headers,
            body,
            time_to_first_byte,
            status_code,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn time_to_first_byte(&self) -> TimeToFirstByte {
        self.time_to_first_byte
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Status code, time to first byte and body on three lines.
    pub fn as_string(&self) -> String {
        format!(
            "StatusCode: {}\nTimeToFirstByte: {}\nBody: {}",
            self.status_code, self.time_to_first_byte, self.body
        )
    }
}

/// A request that failed before a response was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResult {
    url: Url,
    headers: HeaderCollection,
    error_message: ErrorMessage,
}

impl ErrorResult {
    pub fn new(url: Url, headers: HeaderCollection, error_message: ErrorMessage) -> Self {
        Self {
            url,
            headers,
            error_message,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    pub fn error_message(&self) -> &ErrorMessage {
        &self.error_message
    }

    pub fn as_failure_message(&self) -> String {
        self.error_message.as_str().to_string()
    }
}

/// Outcome of one smoke request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SmokeResult {
    Valid(ValidResult),
    Error(ErrorResult),
}

impl SmokeResult {
    pub fn url(&self) -> &Url {
        match self {
            Self::Valid(r) => r.url(),
            Self::Error(r) => r.url(),
        }
    }

    pub fn headers(&self) -> &HeaderCollection {
        match self {
            Self::Valid(r) => r.headers(),
            Self::Error(r) => r.headers(),
        }
    }

    /// `None` for transport failures.
    pub fn body(&self) -> Option<&Body> {
        match self {
            Self::Valid(r) => Some(r.body()),
            Self::Error(_) => None,
        }
    }

    /// Always zero for transport failures.
    pub fn time_to_first_byte(&self) -> TimeToFirstByte {
        match self {
            Self::Valid(r) => r.time_to_first_byte(),
            Self::Error(_) => TimeToFirstByte::ZERO,
        }
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Valid(r) => Some(r.status_code()),
            Self::Error(_) => None,
        }
    }

    pub fn is_valid_result(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn as_string(&self) -> String {
        match self {
            Self::Valid(r) => r.as_string(),
            Self::Error(r) => r.as_failure_message(),
        }
    }
}

impl From<ValidResult> for SmokeResult {
    fn from(result: ValidResult) -> Self {
        Self::Valid(result)
    }
}

impl From<ErrorResult> for SmokeResult {
    fn from(result: ErrorResult) -> Self {
        Self::Error(result)
    }
}

impl fmt::Display for SmokeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Results of one run, in the order the requests completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultCollection {
    results: Vec<SmokeResult>,
}

impl ResultCollection {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn add_result(&mut self, result: SmokeResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn count_valid(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid_result()).count()
    }

    pub fn count_errors(&self) -> usize {
        self.len() - self.count_valid()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SmokeResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[SmokeResult] {
        &self.results
    }

    /// Every result's rendering, in stored order, one after another.
    pub fn as_string(&self) -> String {
        self.results
            .iter()
            .map(SmokeResult::as_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl IntoIterator for ResultCollection {
    type Item = SmokeResult;
    type IntoIter = std::vec::IntoIter<SmokeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultCollection {
    type Item = &'a SmokeResult;
    type IntoIter = std::slice::Iter<'a, SmokeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
