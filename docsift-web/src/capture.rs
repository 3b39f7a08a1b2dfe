//! Rendering a validated URL in a browser and reading back its DOM.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsift_common::{CaptureStage, Result, SiftError};
use docsift_drivers::{BrowserSession, DriverError, IdlePolicy, SessionFactory};
use tokio_util::sync::CancellationToken;

use crate::validate::{ValidatedUrl, cancellable};

/// Bounds and delays of one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub navigation_timeout: Duration,
    pub idle: IdlePolicy,
    /// Extra wait after the network went idle, for late script rendering.
    pub settle_delay: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            idle: IdlePolicy::default(),
            settle_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageCapture {
    pub url: ValidatedUrl,
    pub html: String,
    pub captured_at: DateTime<Utc>,
}

impl PageCapture {
    /// File name the captured HTML is persisted under.
    pub fn filename(&self) -> String {
        self.url.capture_filename(self.captured_at.timestamp())
    }
}

fn stage_error(stage: CaptureStage, err: DriverError) -> SiftError {
    match err {
        DriverError::Timeout(after) => SiftError::CaptureTimeout { stage, after },
        other => SiftError::CaptureFailure(other.to_string()),
    }
}

/// Navigate, wait for the network to go quiet, settle, then serialize the
/// live DOM. The session is left open.
pub async fn capture_html(
    session: &mut dyn BrowserSession,
    url: &ValidatedUrl,
    options: &CaptureOptions,
) -> Result<String> {
    session
        .navigate(url.url(), options.navigation_timeout)
        .await
        .map_err(|e| stage_error(CaptureStage::Navigation, e))?;
    session
        .wait_idle(options.idle)
        .await
        .map_err(|e| stage_error(CaptureStage::IdleWait, e))?;
    if !options.settle_delay.is_zero() {
        tokio::time::sleep(options.settle_delay).await;
    }
    session
        .html()
        .await
        .map_err(|e| SiftError::CaptureFailure(e.to_string()))
}

#[async_trait]
pub trait BrowserCapturer: Send + Sync {
    async fn capture(&self, url: &ValidatedUrl, cancel: &CancellationToken)
        -> Result<PageCapture>;
}

/// Opens one session per capture from `factory` and always closes it.
pub struct SessionCapturer<F> {
    factory: F,
    options: CaptureOptions,
}

impl<F: SessionFactory> SessionCapturer<F> {
    pub fn new(factory: F, options: CaptureOptions) -> Self {
        Self { factory, options }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }
}

#[async_trait]
impl<F: SessionFactory> BrowserCapturer for SessionCapturer<F> {
    async fn capture(
        &self,
        url: &ValidatedUrl,
        cancel: &CancellationToken,
    ) -> Result<PageCapture> {
        if cancel.is_cancelled() {
            return Err(SiftError::Cancelled);
        }
        let mut session = cancellable(cancel, async {
            self.factory
                .open()
                .await
                .map_err(|e| SiftError::CaptureFailure(e.to_string()))
        })
        .await?;

        tracing::info!(url = %url, "capture.start");
        let outcome = cancellable(cancel, capture_html(session.as_mut(), url, &self.options)).await;
        if let Err(e) = session.close().await {
            tracing::warn!(url = %url, error = %e, "capture.close_failed");
        }

        let html = outcome.inspect_err(|e| {
            tracing::warn!(url = %url, error = %e, "capture.failed");
        })?;
        tracing::info!(url = %url, bytes = html.len(), "capture.done");
        Ok(PageCapture {
            url: url.clone(),
            html,
            captured_at: Utc::now(),
        })
    }
}
