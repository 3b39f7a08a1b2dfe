use crate::session::{BrowserSession, DriverError, IdlePolicy, IdleTracker, NetworkSample};
use async_trait::async_trait;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use url::Url;

/// Installs (once per document) counters for fetch and XHR traffic, then
/// reports `[readyState, requests seen, requests in flight]`.
///
/// The resource timing buffer is enlarged and folded into a running total
/// when it fills, so the request count never shrinks. Requests started
/// before the first run are only seen once they complete.
const NETWORK_ACTIVITY: &str = r#"
    const w = window;
    if (!w.__docsiftNet) {
        const net = { started: 0, pending: 0, flushed: 0 };
        w.__docsiftNet = net;
        const settle = () => { net.pending = Math.max(0, net.pending - 1); };
        try { performance.setResourceTimingBufferSize(10000); } catch (_) {}
        performance.addEventListener('resourcetimingbufferfull', () => {
            net.flushed += performance.getEntriesByType('resource').length;
            performance.clearResourceTimings();
        });
        if (typeof w.fetch === 'function') {
            const fetch = w.fetch;
            w.fetch = function (...args) {
                net.started++;
                net.pending++;
                let result;
                try {
                    result = fetch.apply(this, args);
                } catch (e) {
                    settle();
                    throw e;
                }
                Promise.resolve(result).then(settle, settle);
                return result;
            };
        }
        if (w.XMLHttpRequest) {
            const send = w.XMLHttpRequest.prototype.send;
            w.XMLHttpRequest.prototype.send = function (...args) {
                net.started++;
                net.pending++;
                this.addEventListener('loadend', settle, { once: true });
                try {
                    return send.apply(this, args);
                } catch (e) {
                    settle();
                    throw e;
                }
            };
        }
    }
    const net = w.__docsiftNet;
    return [
        document.readyState,
        net.flushed + performance.getEntriesByType('resource').length + net.started,
        net.pending
    ];
"#;

/// A WebDriver session driving a single browser window.
pub struct WebDriverSession {
    client: Option<Client>,
}

impl WebDriverSession {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self) -> Result<&Client, DriverError> {
        self.client.as_ref().ok_or(DriverError::Closed)
    }

    async fn sample_network(&self) -> Result<NetworkSample, DriverError> {
        let value = self
            .client()?
            .execute(NETWORK_ACTIVITY, vec![])
            .await
            .map_err(command_error)?;
        parse_sample(&value)
    }
}

fn is_timeout(err: &CmdError) -> bool {
    matches!(err, CmdError::Standard(e) if matches!(e.error, ErrorStatus::Timeout))
}

fn command_error(err: CmdError) -> DriverError {
    DriverError::Command(err.to_string())
}

fn parse_sample(value: &Value) -> Result<NetworkSample, DriverError> {
    let ready = value.get(0).and_then(Value::as_str);
    let requests = value.get(1).and_then(Value::as_u64);
    let pending = value.get(2).and_then(Value::as_u64);
    match (ready, requests, pending) {
        (Some(state), Some(requests), Some(pending)) => Ok(NetworkSample {
            ready: state == "complete",
            requests,
            pending,
        }),
        _ => Err(DriverError::Script(value.to_string())),
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), DriverError> {
        let client = self.client()?;
        client
            .update_timeouts(TimeoutConfiguration::new(None, Some(timeout), None))
            .await
            .map_err(command_error)?;

        tracing::debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "browser.goto");
        match tokio::time::timeout(timeout, client.goto(url.as_str())).await {
            Err(_) => Err(DriverError::Timeout(timeout)),
            Ok(Err(e)) if is_timeout(&e) => Err(DriverError::Timeout(timeout)),
            Ok(Err(e)) => Err(command_error(e)),
            Ok(Ok(())) => Ok(()),
        }
    }

    async fn wait_idle(&mut self, policy: IdlePolicy) -> Result<(), DriverError> {
        let deadline = Instant::now() + policy.timeout;
        let mut tracker = IdleTracker::new(policy.window);
        loop {
            let sample = self.sample_network().await?;
            let now = Instant::now();
            if tracker.observe(sample, now) {
                tracing::debug!(requests = sample.requests, "browser.idle");
                return Ok(());
            }
            if now >= deadline {
                tracing::debug!(pending = sample.pending, "browser.idle_timeout");
                return Err(DriverError::Timeout(policy.timeout));
            }
            sleep(policy.poll_interval).await;
        }
    }

    async fn html(&mut self) -> Result<String, DriverError> {
        self.client()?.source().await.map_err(command_error)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(client) = self.client.take() {
            tracing::debug!("browser.session.close");
            client.close().await.map_err(command_error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_network_sample() {
        assert_eq!(
            parse_sample(&json!(["complete", 12, 0])).unwrap(),
            NetworkSample { ready: true, requests: 12, pending: 0 }
        );
        assert_eq!(
            parse_sample(&json!(["interactive", 3, 2])).unwrap(),
            NetworkSample { ready: false, requests: 3, pending: 2 }
        );
    }

    #[test]
    fn rejects_malformed_sample() {
        assert!(matches!(
            parse_sample(&json!({"state": "complete"})),
            Err(DriverError::Script(_))
        ));
        assert!(matches!(
            parse_sample(&json!(["complete", 4])),
            Err(DriverError::Script(_))
        ));
        assert!(matches!(
            parse_sample(&json!(["complete", 4, -1])),
            Err(DriverError::Script(_))
        ));
    }
}
