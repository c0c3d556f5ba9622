//! Per-request options.

use crate::value::{BasicAuth, RequestTimeout, Url};

/// Everything the transport needs to issue one smoke request.
///
/// Built by the caller, then moved into the runner with
/// [`Runner::register`](crate::Runner::register).
///
/// ```rust
/// use smoke_test_lib::{BasicAuth, RequestOptions, RequestTimeout, Url};
///
/// let options = RequestOptions::new(Url::new("https://example.com/health")?)
///     .with_timeout(RequestTimeout::from_secs(5)?)
///     .with_follow_redirect(false)
///     .with_basic_auth(BasicAuth::new("admin", "secret")?);
///
/// assert!(options.needs_basic_auth());
/// # Ok::<(), smoke_test_lib::SmokeTestError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    url: Url,
    timeout: RequestTimeout,
    follow_redirect: bool,
    basic_auth: Option<BasicAuth>,
}

impl RequestOptions {
    /// Options with a 10 second timeout, redirects followed, no credentials.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: RequestTimeout::default(),
            follow_redirect: true,
            basic_auth: None,
        }
    }

    pub fn with_timeout(mut self, timeout: RequestTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_follow_redirect(mut self, follow: bool) -> Self {
        self.follow_redirect = follow;
        self
    }

    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> RequestTimeout {
        self.timeout
    }

    pub fn follow_redirect(&self) -> bool {
        self.follow_redirect
    }

    pub fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    pub fn needs_basic_auth(&self) -> bool {
        self.basic_auth.is_some()
    }
}
