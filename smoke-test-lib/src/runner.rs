//! Concurrent smoke request runner.
//!
//! The runner owns the registered [`RequestOptions`], drives them through a
//! [`Transport`] with at most `concurrency` requests in flight, and turns
//! every completion into a [`SmokeResult`].
//!
//! Every request executes on its own spawned task. Completions are handled by
//! the task awaiting [`Runner::run`], one at a time, so callbacks never run
//! concurrently and always observe the collection in a consistent state. A
//! slow callback delays the next dispatch but never the requests in flight.

use crate::error::SmokeTestError;
use crate::headers::HeaderCollection;
use crate::options::RequestOptions;
use crate::result::{ErrorResult, ResultCollection, SmokeResult, ValidResult};
use crate::transport::{
    FailureKind, HttpTransport, Transport, TransportFailure, TransportResponse,
};
use crate::value::{Body, BodyLength, Concurrency, ErrorMessage, StatusCode, TimeToFirstByte, Url};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Called once per [`ValidResult`], before it is appended.
pub type SuccessCallback = Box<dyn FnMut(&ValidResult) + Send>;

/// Called once per [`ErrorResult`], before it is appended.
pub type ErrorCallback = Box<dyn FnMut(&ErrorResult) + Send>;

/// Runs a batch of smoke requests under a concurrency ceiling.
///
/// # Example
///
/// ```rust,no_run
/// use smoke_test_lib::{BodyLength, RequestOptions, Runner, Url};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut runner = Runner::new(
///         4,
///         BodyLength::new(200),
///         |ok| println!("{} -> {}", ok.url(), ok.status_code()),
///         |err| eprintln!("{} -> {}", err.url(), err.error_message()),
///     )?;
///
///     runner.register(RequestOptions::new(Url::new("https://example.com")?));
///     runner.register(RequestOptions::new(Url::new("https://example.org")?));
///
///     let results = runner.run().await;
///     println!("{} of {} responded", results.count_valid(), results.len());
///     Ok(())
/// }
/// ```
pub struct Runner {
    transport: Arc<dyn Transport>,
    concurrency: Concurrency,
    body_length: BodyLength,
    on_success: SuccessCallback,
    on_error: ErrorCallback,
    pending: Vec<RequestOptions>,
}

impl Runner {
    /// Create a runner backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`SmokeTestError::Config`] if `concurrency` is zero (checked
    /// before any client is built), or [`SmokeTestError::Transport`] if the
    /// HTTP client cannot be created.
    pub fn new<S, E>(
        concurrency: usize,
        body_length: BodyLength,
        on_success: S,
        on_error: E,
    ) -> Result<Self, SmokeTestError>
    where
        S: FnMut(&ValidResult) + Send + 'static,
        E: FnMut(&ErrorResult) + Send + 'static,
    {
        let concurrency = Concurrency::new(concurrency)?;
        let transport = HttpTransport::new()?;
        Ok(Self::assemble(
            Arc::new(transport),
            concurrency,
            body_length,
            Box::new(on_success),
            Box::new(on_error),
        ))
    }

    /// Create a runner over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeTestError::Config`] if `concurrency` is zero.
    pub fn with_transport<T, S, E>(
        transport: T,
        concurrency: usize,
        body_length: BodyLength,
        on_success: S,
        on_error: E,
    ) -> Result<Self, SmokeTestError>
    where
        T: Transport + 'static,
        S: FnMut(&ValidResult) + Send + 'static,
        E: FnMut(&ErrorResult) + Send + 'static,
    {
        let concurrency = Concurrency::new(concurrency)?;
        Ok(Self::assemble(
            Arc::new(transport),
            concurrency,
            body_length,
            Box::new(on_success),
            Box::new(on_error),
        ))
    }

    fn assemble(
        transport: Arc<dyn Transport>,
        concurrency: Concurrency,
        body_length: BodyLength,
        on_success: SuccessCallback,
        on_error: ErrorCallback,
    ) -> Self {
        Self {
            transport,
            concurrency,
            body_length,
            on_success,
            on_error,
            pending: Vec::new(),
        }
    }

    /// Queue one request. Nothing is sent until [`run`](Self::run).
    pub fn register(&mut self, options: RequestOptions) {
        self.pending.push(options);
    }

    /// Number of registered requests.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.as_usize()
    }

    pub fn body_length(&self) -> BodyLength {
        self.body_length
    }

    /// Execute every registered request and collect the outcomes.
    ///
    /// Completes once the last request reached a terminal outcome. The
    /// returned collection holds exactly one result per registration, in
    /// completion order. Transport failures become [`ErrorResult`]s; nothing
    /// here aborts the batch.
    ///
    /// Must be awaited inside a Tokio runtime, since requests are spawned
    /// onto it.
    pub async fn run(self) -> ResultCollection {
        let Self {
            transport,
            concurrency,
            body_length,
            mut on_success,
            mut on_error,
            pending,
        } = self;

        let total = pending.len();
        let mut results = ResultCollection::with_capacity(total);
        let start = Instant::now();

        tracing::info!(
            requests = total,
            concurrency = concurrency.as_usize(),
            "Starting smoke run"
        );

        // Each request runs on its own task and keeps progressing while a
        // callback runs.
        let requests = pending.into_iter().map(|options| {
            let transport = Arc::clone(&transport);
            let url = options.url().clone();
            async move {
                tracing::debug!(url = %url, "Dispatching request");
                let task =
                    tokio::spawn(async move { transport.execute(&options, body_length).await });
                let outcome = task.await.unwrap_or_else(|e| {
                    Err(TransportFailure::new(
                        FailureKind::Other,
                        format!("Request task failed: {}", e),
                    ))
                });
                (url, outcome)
            }
        });

        let mut completions = stream::iter(requests).buffer_unordered(concurrency.as_usize());

        while let Some((url, outcome)) = completions.next().await {
            let result = into_result(url, outcome, body_length);

            match &result {
                SmokeResult::Valid(valid) => {
                    tracing::debug!(url = %valid.url(), status = valid.status_code().as_u16(), "Request completed");
                    on_success(valid);
                }
                SmokeResult::Error(error) => {
                    tracing::debug!(url = %error.url(), error = %error.error_message(), "Request failed");
                    on_error(error);
                }
            }

            results.add_result(result);
        }

        tracing::info!(
            requests = results.len(),
            valid = results.count_valid(),
            errors = results.count_errors(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Smoke run finished"
        );

        results
    }
}

/// Map one transport outcome to a result for `url`.
fn into_result(
    url: Url,
    outcome: Result<TransportResponse, TransportFailure>,
    body_length: BodyLength,
) -> SmokeResult {
    match outcome {
        Ok(response) => match StatusCode::new(response.status) {
            Ok(status_code) => ValidResult::new(
                url,
                HeaderCollection::from_pairs(response.headers),
                Body::truncated(&response.body, body_length),
                TimeToFirstByte::from_timings(
                    response.timings.connected,
                    response.timings.first_byte,
                ),
                status_code,
            )
            .into(),
            Err(e) => {
                tracing::warn!(url = %url, "Discarding response: {}", e);
                error_result(url, response.headers, format!("Invalid response: {}", e))
            }
        },
        Err(failure) => {
            let message = failure.describe();
            error_result(url, failure.headers, message)
        }
    }
}

fn error_result(url: Url, headers: Vec<(String, String)>, message: String) -> SmokeResult {
    let message = ErrorMessage::new(message).unwrap_or_else(|_| ErrorMessage::unknown_failure());
    ErrorResult::new(url, HeaderCollection::from_pairs(headers), message).into()
}
