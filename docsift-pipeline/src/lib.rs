//! End-to-end conversions: file, HTML file or URL to text plus metadata.
//!
//! Every flow runs its stages strictly in order and stops at the first
//! error; nothing is retried. On success two artifacts land in the output
//! directory (see [`output`]). URL captures additionally keep the rendered
//! HTML next to them.

pub mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docsift_common::{ExtractionResult, Metadata, Result, SiftError};
use docsift_extract::{
    DocumentParser, FileExtensionKind, Prettifier, extract_text_and_metadata, filter_non_readable,
};
use docsift_web::{BrowserCapturer, UrlValidator};
use tokio_util::sync::CancellationToken;

pub use output::{OutputPaths, format_metadata, output_basename, write_outputs};

/// Result of one conversion and where it was written.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub result: ExtractionResult,
    pub outputs: OutputPaths,
    /// Rendered HTML kept for a URL capture.
    pub html: Option<PathBuf>,
}

pub struct Pipeline {
    output_dir: PathBuf,
    parser: Arc<dyn DocumentParser>,
    capturer: Arc<dyn BrowserCapturer>,
    validator: UrlValidator,
    prettifier: Option<Arc<dyn Prettifier>>,
    skip_prettify_error: bool,
}

impl Pipeline {
    /// A pipeline writing into `output_dir`, validating URLs without the
    /// content-type probe and with no prettify pre-pass.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        parser: Arc<dyn DocumentParser>,
        capturer: Arc<dyn BrowserCapturer>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            parser,
            capturer,
            validator: UrlValidator::new(),
            prettifier: None,
            skip_prettify_error: false,
        }
    }

    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_prettifier(mut self, prettifier: Arc<dyn Prettifier>) -> Self {
        self.prettifier = Some(prettifier);
        self
    }

    /// Carry on without formatting when the prettify pre-pass fails.
    pub fn skip_prettify_error(mut self, skip: bool) -> Self {
        self.skip_prettify_error = skip;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Text and metadata of a local file, dispatched on its extension.
    pub async fn extract_file(&self, path: &Path) -> Result<ExtractionResult> {
        let Some(kind) = FileExtensionKind::from_path(path) else {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return Err(SiftError::UnsupportedType(ext));
        };
        tracing::info!(path = %path.display(), %kind, "pipeline.file.start");

        if kind == FileExtensionKind::Html {
            return self.extract_html(path).await;
        }
        let bytes = read(path).await?;
        let result = if kind.is_office() {
            self.parser.parse(kind, bytes).await?
        } else {
            ExtractionResult::new(String::from_utf8_lossy(&bytes), Metadata::new())
        };
        Ok(result.map_text(filter_non_readable))
    }

    /// Text and metadata of a local HTML file, whatever its extension.
    pub async fn extract_html(&self, path: &Path) -> Result<ExtractionResult> {
        self.prettify(path).await?;
        let bytes = read(path).await?;
        extract_text_and_metadata(&bytes).map(|r| r.map_text(filter_non_readable))
    }

    pub async fn convert_file(&self, path: &Path) -> Result<Conversion> {
        let result = self.extract_file(path).await?;
        self.persist(&output_basename(path), result, None).await
    }

    pub async fn convert_html(&self, path: &Path) -> Result<Conversion> {
        let result = self.extract_html(path).await?;
        self.persist(&output_basename(path), result, None).await
    }

    /// Validate, capture, keep the rendered HTML, then extract from it.
    pub async fn convert_url(&self, raw: &str, cancel: &CancellationToken) -> Result<Conversion> {
        tracing::info!(url = %raw.trim(), "pipeline.url.start");
        let url = self.validator.validate(raw, cancel).await?;
        let page = self.capturer.capture(&url, cancel).await?;

        let filename = page.filename();
        let html_path = self.output_dir.join(&filename);
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| SiftError::persistence(&self.output_dir, e))?;
        tokio::fs::write(&html_path, &page.html)
            .await
            .map_err(|e| SiftError::persistence(&html_path, e))?;
        tracing::debug!(path = %html_path.display(), bytes = page.html.len(), "pipeline.html.saved");

        let result = self.extract_html(&html_path).await?;
        let base = filename.strip_suffix(".html").unwrap_or(&filename);
        self.persist(base, result, Some(html_path)).await
    }

    async fn prettify(&self, path: &Path) -> Result<()> {
        let Some(prettifier) = &self.prettifier else {
            return Ok(());
        };
        match prettifier.prettify(path).await {
            Err(e) if self.skip_prettify_error => {
                tracing::warn!(path = %path.display(), error = %e, "pipeline.prettify.skipped");
                Ok(())
            }
            other => other,
        }
    }

    async fn persist(
        &self,
        base: &str,
        result: ExtractionResult,
        html: Option<PathBuf>,
    ) -> Result<Conversion> {
        let outputs = write_outputs(&self.output_dir, base, &result).await?;
        tracing::info!(
            text = %outputs.text.display(),
            chars = result.text.chars().count(),
            "pipeline.done"
        );
        Ok(Conversion {
            result,
            outputs,
            html,
        })
    }
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SiftError::unreadable(path, e))
}
