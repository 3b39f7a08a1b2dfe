//! URL admission: syntax, scheme, DNS and an optional content-type probe.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use docsift_common::{Result, SiftError, ValidationReason};
use docsift_http::{HttpClient, HttpError, RequestOpts};
use tokio_util::sync::CancellationToken;
use url::{Host, Url};

use crate::naming::capture_filename;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn parse(scheme: &str) -> Option<Self> {
        match scheme {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL that passed [`UrlValidator::validate`]. Only the validator builds
/// these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl {
    url: Url,
    scheme: Scheme,
    hostname: String,
}

impl ValidatedUrl {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host without port or IPv6 brackets.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Name for the HTML captured from this URL at `timestamp`.
    pub fn capture_filename(&self, timestamp: i64) -> String {
        capture_filename(&self.hostname, self.path(), timestamp)
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Syntax and scheme checks; no I/O.
pub fn parse_url(raw: &str) -> Result<ValidatedUrl> {
    let raw = raw.trim();
    let url = Url::parse(raw)
        .map_err(|e| SiftError::validation(raw, ValidationReason::MalformedUrl(e.to_string())))?;

    let scheme = Scheme::parse(url.scheme()).ok_or_else(|| {
        SiftError::validation(raw, ValidationReason::InvalidScheme(url.scheme().to_string()))
    })?;

    let hostname = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        _ => {
            return Err(SiftError::validation(
                raw,
                ValidationReason::InvalidHostname(String::new()),
            ));
        }
    };

    Ok(ValidatedUrl {
        url,
        scheme,
        hostname,
    })
}

/// `true` when a `Content-Type` value declares HTML.
pub fn is_html_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

/// Checks a raw URL string before any browser is involved.
///
/// Steps run in order and the first failure is returned: parse, scheme,
/// hostname resolution, then (when enabled) a `HEAD` request whose
/// `Content-Type` must contain `text/html`. Nothing is retried.
#[derive(Clone, Default)]
pub struct UrlValidator {
    preflight: Option<Preflight>,
}

#[derive(Clone)]
struct Preflight {
    client: HttpClient,
    timeout: Duration,
}

impl UrlValidator {
    /// Validator without the content-type probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the `HEAD` probe, bounded by `timeout`.
    pub fn with_content_type_check(mut self, client: HttpClient, timeout: Duration) -> Self {
        self.preflight = Some(Preflight { client, timeout });
        self
    }

    pub fn checks_content_type(&self) -> bool {
        self.preflight.is_some()
    }

    pub async fn validate(&self, raw: &str, cancel: &CancellationToken) -> Result<ValidatedUrl> {
        let validated = parse_url(raw)?;
        cancellable(cancel, resolve_host(&validated)).await?;
        if let Some(preflight) = &self.preflight {
            cancellable(cancel, preflight.check(&validated)).await?;
        }
        tracing::debug!(
            url = %validated,
            content_type_checked = self.preflight.is_some(),
            "url.validated"
        );
        Ok(validated)
    }
}

impl Preflight {
    async fn check(&self, validated: &ValidatedUrl) -> Result<()> {
        let opts = RequestOpts {
            timeout: Some(self.timeout),
            ..Default::default()
        };
        let reject = |reason| SiftError::validation(validated.as_str(), reason);
        let head = self
            .client
            .head(validated.url(), opts)
            .await
            .map_err(|e| match e {
                HttpError::Timeout(after) => reject(ValidationReason::PreflightTimeout(after)),
                other => reject(ValidationReason::PreflightFailed(other.to_string())),
            })?;

        let content_type = head.content_type.unwrap_or_default();
        if !is_html_content_type(&content_type) {
            return Err(reject(ValidationReason::InvalidContentType(content_type)));
        }
        Ok(())
    }
}

/// IP literals are accepted as-is; names must resolve to at least one
/// address.
async fn resolve_host(validated: &ValidatedUrl) -> Result<()> {
    let url = validated.url();
    let Some(Host::Domain(domain)) = url.host() else {
        return Ok(());
    };
    let port = url.port_or_known_default().unwrap_or(80);
    let invalid = || {
        SiftError::validation(
            validated.as_str(),
            ValidationReason::InvalidHostname(domain.to_string()),
        )
    };

    match tokio::net::lookup_host((domain, port)).await {
        Ok(mut addrs) => {
            if addrs.next().is_some() {
                Ok(())
            } else {
                Err(invalid())
            }
        }
        Err(e) => {
            tracing::debug!(host = %domain, error = %e, "url.dns_failed");
            Err(invalid())
        }
    }
}

/// Race `fut` against `cancel`.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SiftError::Cancelled),
        out = fut => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_common::ErrorKind;

    fn reason(err: &SiftError) -> &ValidationReason {
        err.validation_reason().expect("validation failure")
    }

    #[test]
    fn rejects_non_http_schemes() {
        for raw in ["ftp://example.com/file", "file:///etc/hosts", "mailto:a@b.c"] {
            let err = parse_url(raw).unwrap_err();
            assert!(matches!(reason(&err), ValidationReason::InvalidScheme(_)), "{raw}");
        }
    }

    #[test]
    fn rejects_unparseable_input() {
        for raw in ["", "example.com/path", "http://"] {
            let err = parse_url(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationFailure, "{raw}");
        }
        assert!(matches!(
            reason(&parse_url("not a url").unwrap_err()),
            ValidationReason::MalformedUrl(_)
        ));
    }

    #[test]
    fn exposes_parts() {
        let v = parse_url("  https://Example.COM:8443/A/b?q=1  ").unwrap();
        assert_eq!(v.scheme(), Scheme::Https);
        assert_eq!(v.hostname(), "example.com");
        assert_eq!(v.path(), "/A/b");
        assert_eq!(v.capture_filename(1000), "example.com_a_b_1000.html");
    }

    #[test]
    fn ipv6_hostname_drops_brackets() {
        let v = parse_url("http://[::1]:8080/").unwrap();
        assert_eq!(v.hostname(), "::1");
    }

    #[test]
    fn html_content_type_matching() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("Text/HTML; charset=utf-8"));
        assert!(!is_html_content_type("application/json"));
        assert!(!is_html_content_type(""));
    }

    #[tokio::test]
    async fn ip_literal_skips_dns() {
        let v = UrlValidator::new()
            .validate("http://127.0.0.1/x", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(v.hostname(), "127.0.0.1");
    }

    #[tokio::test]
    async fn unresolvable_host_is_rejected() {
        let err = UrlValidator::new()
            .validate("http://definitely-not-a-real-host.invalid", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(reason(&err), ValidationReason::InvalidHostname(h) if h.ends_with(".invalid")));
    }

    #[tokio::test]
    async fn cancelled_token_stops_validation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = UrlValidator::new()
            .validate("http://localhost/", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
