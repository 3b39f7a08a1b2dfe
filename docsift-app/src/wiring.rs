use anyhow::{Context, Result};
use docsift_common::observability::{LogConfig, LogFormat};
use docsift_config::{LogSettings, SiftConfig};
use docsift_drivers::{ChromeLauncher, IdlePolicy, LaunchOptions};
use docsift_extract::{CommandParser, CommandPrettifier};
use docsift_http::HttpClient;
use docsift_pipeline::Pipeline;
use docsift_web::{CaptureOptions, SessionCapturer, UrlValidator};
use std::sync::Arc;

pub fn log_config(settings: &LogSettings) -> LogConfig {
    LogConfig {
        app_name: "docsift",
        log_dir: settings.dir.clone(),
        emit_stderr: settings.stderr,
        format: LogFormat::from_name(&settings.format),
        default_filter: settings.level.clone(),
    }
}

pub fn capture_options(cfg: &SiftConfig) -> CaptureOptions {
    CaptureOptions {
        navigation_timeout: cfg.capture.navigation_timeout(),
        idle: IdlePolicy {
            timeout: cfg.capture.idle_timeout(),
            window: cfg.capture.idle_window(),
            ..IdlePolicy::default()
        },
        settle_delay: cfg.capture.settle_delay(),
    }
}

/// Assemble the pipeline and its collaborators from configuration.
pub fn build_pipeline(cfg: &SiftConfig) -> Result<Pipeline> {
    let launcher = ChromeLauncher::new(LaunchOptions {
        webdriver_url: cfg.capture.webdriver_url.clone(),
        headless: cfg.capture.headless,
        ..LaunchOptions::default()
    });
    let capturer = SessionCapturer::new(launcher, capture_options(cfg));
    let parser = CommandParser::from_table(&cfg.parsers);

    let mut validator = UrlValidator::new();
    if cfg.capture.check_content_type {
        let timeout = cfg.capture.preflight_timeout();
        let client = HttpClient::new()
            .context("building pre-flight HTTP client")?
            .with_timeout(timeout);
        validator = validator.with_content_type_check(client, timeout);
    }

    let mut pipeline = Pipeline::new(&cfg.output_dir, Arc::new(parser), Arc::new(capturer))
        .with_validator(validator)
        .skip_prettify_error(cfg.skip_prettify_error);
    if cfg.prettify {
        let prettifier = CommandPrettifier::new(cfg.prettier_command.clone());
        pipeline = pipeline.with_prettifier(Arc::new(prettifier));
    }
    Ok(pipeline)
}
