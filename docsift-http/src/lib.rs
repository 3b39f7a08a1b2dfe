//! Minimal HTTP client for pre-flight probes.
//!
//! - `HEAD` requests with a bounded per-request timeout
//! - Structured `tracing` events (`http.request.start`, `http.response.headers`)
//!   with secret-looking query parameters redacted
//! - Timeouts are reported separately from other network failures so callers
//!   can surface them as deadline errors
//!
//! No automatic retries: a failing probe is reported to the caller as-is.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), docsift_http::HttpError> {
//! let client = docsift_http::HttpClient::new()?;
//! let url = reqwest::Url::parse("https://example.com/").unwrap();
//! let head = client.head(&url, docsift_http::RequestOpts::default()).await?;
//! println!("{:?}", head.content_type);
//! # Ok(()) }
//! ```

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("docsift/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
}

/// Per-request tuning knobs.
///
/// ```
/// use docsift_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(15)),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 15);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
}

/// Status and selected headers of a `HEAD` response.
#[derive(Clone, Debug)]
pub struct HeadResponse {
    pub status: StatusCode,
    /// Raw `Content-Type` header, if present and valid UTF-8.
    pub content_type: Option<String>,
    pub duration: Duration,
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client with a 15 second default timeout.
    ///
    /// ```no_run
    /// use docsift_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use docsift_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?.with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Issue a `HEAD` request and report status plus content type.
    pub async fn head(&self, url: &Url, opts: RequestOpts) -> Result<HeadResponse, HttpError> {
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut rb = self.inner.request(Method::HEAD, url.clone()).timeout(timeout);
        if let Some(hdrs) = opts.headers {
            rb = rb.headers(hdrs);
        }

        let (host_path, query) = redact_query(url);
        tracing::debug!(
            method = %Method::HEAD,
            host_path = %host_path,
            query = ?query,
            timeout_ms = timeout.as_millis() as u64,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            if err.is_timeout() {
                tracing::warn!(host_path = %host_path, timeout_ms = timeout.as_millis() as u64, "http.timeout");
                HttpError::Timeout(timeout)
            } else {
                let message = err.to_string();
                tracing::warn!(host_path = %host_path, message = %message, "http.network_error.send");
                HttpError::Network(message)
            }
        })?;
        let duration = t0.elapsed();

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            %status,
            duration_ms = duration.as_millis() as u64,
            content_type = ?content_type,
            "http.response.headers"
        );

        Ok(HeadResponse {
            status,
            content_type,
            duration,
        })
    }
}

/// `host + path` plus query pairs with secret-looking values redacted.
fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let is_secret = matches!(
                k.to_ascii_lowercase().as_str(),
                "access_token"
                    | "authorization"
                    | "auth"
                    | "key"
                    | "api_key"
                    | "token"
                    | "secret"
                    | "client_secret"
                    | "bearer"
            );
            let v = if is_secret {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_secret_query_params() {
        let url = Url::parse("https://example.com/a/b?page=2&token=abc&API_KEY=zzz").unwrap();
        let (host_path, query) = redact_query(&url);
        assert_eq!(host_path, "example.com/a/b");
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("token".to_string(), "<redacted>".to_string()),
                ("API_KEY".to_string(), "<redacted>".to_string()),
            ]
        );
    }
}
