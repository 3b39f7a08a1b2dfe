//! Common types shared across docsift crates.
//!
//! This crate defines the extraction result, the error taxonomy every stage
//! reports through, and the observability helpers used by binaries and
//! tests. It is dependency-light so that every crate in the workspace can
//! depend on it.
//!
//! # Overview
//!
//! - [`ExtractionResult`]: extracted text plus its [`Metadata`]
//! - [`SiftError`] and [`Result`]: shared error handling, one variant per
//!   failing stage, classified by [`ErrorKind`]
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use docsift_common::{ErrorKind, SiftError, ValidationReason};
//!
//! let err = SiftError::validation("ftp://example.com", ValidationReason::InvalidScheme("ftp".into()));
//! assert_eq!(err.kind(), ErrorKind::ValidationFailure);
//! ```
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub mod observability;

/// Sidecar metadata of a document. Observed keys are `title` and
/// `description`; a missing key means the source lacked that field.
pub type Metadata = BTreeMap<String, String>;

/// Metadata key holding the document title.
pub const TITLE_KEY: &str = "title";
/// Metadata key holding the document description.
pub const DESCRIPTION_KEY: &str = "description";

/// Text and metadata extracted from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    pub metadata: Metadata,
}

impl ExtractionResult {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Apply `f` to the text, keeping metadata untouched.
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        Self {
            text: f(&self.text),
            metadata: self.metadata,
        }
    }
}

/// Why a URL was rejected before any capture was attempted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    #[error("malformed URL: {0}")]
    MalformedUrl(String),
    #[error("invalid scheme: {0:?}")]
    InvalidScheme(String),
    #[error("invalid hostname: {0:?}")]
    InvalidHostname(String),
    #[error("invalid content type: {0:?}")]
    InvalidContentType(String),
    #[error("content-type pre-flight timed out after {0:?}")]
    PreflightTimeout(Duration),
    #[error("content-type pre-flight failed: {0}")]
    PreflightFailed(String),
}

/// Error types used across the docsift pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SiftError {
    /// The file extension is not one the pipeline can convert.
    #[error("file type not supported: {0}")]
    UnsupportedType(String),

    /// The source file could not be opened or read.
    #[error("cannot read {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document parser or the HTML tokenizer rejected the input.
    #[error("parse failure: {0}")]
    ParseFailure(String),

    /// Scheme, hostname, or content type was rejected.
    #[error("validation failed for {url}: {reason}")]
    ValidationFailure {
        url: String,
        reason: ValidationReason,
    },

    /// Navigation or idle-wait exceeded its bound.
    #[error("capture timed out during {stage} after {after:?}")]
    CaptureTimeout { stage: CaptureStage, after: Duration },

    /// Browser or navigation error other than a timeout.
    #[error("capture failed: {0}")]
    CaptureFailure(String),

    /// An output or intermediate file could not be written.
    #[error("cannot write {}: {source}", .path.display())]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller aborted the operation through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}

/// Fieldless classification of [`SiftError`], convenient for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedType,
    SourceUnreadable,
    ParseFailure,
    ValidationFailure,
    CaptureTimeout,
    CaptureFailure,
    PersistenceFailure,
    Cancelled,
}

/// Capture phase a timeout was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Navigation,
    IdleWait,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigation => f.write_str("navigation"),
            Self::IdleWait => f.write_str("idle-wait"),
        }
    }
}

impl SiftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Self::SourceUnreadable { .. } => ErrorKind::SourceUnreadable,
            Self::ParseFailure(_) => ErrorKind::ParseFailure,
            Self::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            Self::CaptureTimeout { .. } => ErrorKind::CaptureTimeout,
            Self::CaptureFailure(_) => ErrorKind::CaptureFailure,
            Self::PersistenceFailure { .. } => ErrorKind::PersistenceFailure,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn validation(url: impl Into<String>, reason: ValidationReason) -> Self {
        Self::ValidationFailure {
            url: url.into(),
            reason,
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PersistenceFailure {
            path: path.into(),
            source,
        }
    }

    /// The validation reason, if this is a [`ErrorKind::ValidationFailure`].
    pub fn validation_reason(&self) -> Option<&ValidationReason> {
        match self {
            Self::ValidationFailure { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Convenient alias for results that use [`SiftError`].
pub type Result<T> = std::result::Result<T, SiftError>;
