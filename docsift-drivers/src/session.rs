use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Failures reported by a browser session.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The operation did not finish within its bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// No session could be established with the browser driver.
    #[error("could not start browser session: {0}")]
    Session(String),

    /// The driver rejected or failed a command.
    #[error("webdriver command failed: {0}")]
    Command(String),

    /// An in-page script returned something other than what was asked for.
    #[error("unexpected script result: {0}")]
    Script(String),

    #[error("browser session already closed")]
    Closed,
}

/// Bounds for [`BrowserSession::wait_idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdlePolicy {
    /// Give up after this long.
    pub timeout: Duration,
    /// How long the network must stay quiet to count as idle.
    pub window: Duration,
    pub poll_interval: Duration,
}

impl Default for IdlePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            window: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// One browser page, exclusively owned by a single capture.
///
/// Implementations must tolerate `close` being called more than once and
/// must not be shared between concurrent captures.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` and return once the page fired its load event.
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), DriverError>;

    /// Block until outstanding network activity has quiesced.
    async fn wait_idle(&mut self, policy: IdlePolicy) -> Result<(), DriverError>;

    /// Serialized HTML of the live DOM.
    async fn html(&mut self) -> Result<String, DriverError>;

    /// Release the page and its browser connection.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Hands out a fresh [`BrowserSession`] per capture.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, DriverError>;
}

/// One poll of a page's network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSample {
    /// `document.readyState` is `complete`.
    pub ready: bool,
    /// Requests seen so far, started or finished. Only ever grows.
    pub requests: u64,
    /// Requests started but not yet settled.
    pub pending: u64,
}

/// Decides when a polled page has gone quiet.
///
/// The page is idle once it is fully loaded, has no request in flight, and
/// its request count has not moved for `window`.
#[derive(Debug)]
pub struct IdleTracker {
    window: Duration,
    last_count: Option<u64>,
    quiet_since: Option<Instant>,
}

impl IdleTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_count: None,
            quiet_since: None,
        }
    }

    /// Record a sample taken at `now`; returns `true` once idle.
    pub fn observe(&mut self, sample: NetworkSample, now: Instant) -> bool {
        if self.last_count != Some(sample.requests) {
            self.last_count = Some(sample.requests);
            self.quiet_since = Some(now);
        }
        if !sample.ready || sample.pending > 0 {
            self.quiet_since = None;
            return false;
        }
        let since = *self.quiet_since.get_or_insert(now);
        now.duration_since(since) >= self.window
    }
}
