#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use docsift_common::observability::{LogConfig, init_logging};
use docsift_common::{ExtractionResult, Metadata, Result, SiftError};
use docsift_drivers::{BrowserSession, DriverError, IdlePolicy, SessionFactory};
use docsift_extract::{DocumentParser, FileExtensionKind, Prettifier};
use docsift_web::{BrowserCapturer, PageCapture, ValidatedUrl};
use tokio_util::sync::CancellationToken;
use url::Url;

static INIT_PATH: OnceLock<PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "docsift-tests",
            log_dir: Some(std::env::temp_dir().join("docsift-tests")),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };
        init_logging(config).unwrap_or_default()
    });
}

/// Office converter stand-in returning a fixed document.
pub struct FakeParser;

#[async_trait]
impl DocumentParser for FakeParser {
    async fn parse(&self, kind: FileExtensionKind, _bytes: Vec<u8>) -> Result<ExtractionResult> {
        if kind == FileExtensionKind::Pages {
            return Err(SiftError::UnsupportedType(kind.to_string()));
        }
        let metadata = Metadata::from([("title".to_string(), "Deck".to_string())]);
        Ok(ExtractionResult::new("Page one\r\n\r\n\x0cPage two", metadata))
    }
}

#[derive(Default)]
pub struct FakePrettifier {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Prettifier for FakePrettifier {
    async fn prettify(&self, _path: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(SiftError::ParseFailure("prettier exited with 2".into()))
        } else {
            Ok(())
        }
    }
}

/// Capturer that must never be reached.
#[derive(Default)]
pub struct CountingCapturer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl BrowserCapturer for CountingCapturer {
    async fn capture(&self, url: &ValidatedUrl, _cancel: &CancellationToken) -> Result<PageCapture> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PageCapture {
            url: url.clone(),
            html: "<p>unexpected</p>".into(),
            captured_at: Utc.timestamp_opt(1000, 0).unwrap(),
        })
    }
}

/// Browser stand-in serving a fixed DOM.
#[derive(Clone)]
pub struct FakeBrowser {
    pub dom: &'static str,
    pub navigate_timeout: bool,
    pub closed: Arc<Mutex<usize>>,
}

impl FakeBrowser {
    pub fn serving(dom: &'static str) -> Self {
        Self {
            dom,
            navigate_timeout: false,
            closed: Arc::new(Mutex::new(0)),
        }
    }

    pub fn closed(&self) -> usize {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    async fn navigate(&mut self, _url: &Url, timeout: Duration) -> std::result::Result<(), DriverError> {
        if self.navigate_timeout {
            Err(DriverError::Timeout(timeout))
        } else {
            Ok(())
        }
    }

    async fn wait_idle(&mut self, _policy: IdlePolicy) -> std::result::Result<(), DriverError> {
        Ok(())
    }

    async fn html(&mut self) -> std::result::Result<String, DriverError> {
        Ok(self.dom.to_string())
    }

    async fn close(&mut self) -> std::result::Result<(), DriverError> {
        *self.closed.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for FakeBrowser {
    async fn open(&self) -> std::result::Result<Box<dyn BrowserSession>, DriverError> {
        Ok(Box::new(self.clone()))
    }
}
