//! Output artifacts: `<base>.txt` and `<base>_metadata.txt`.

use std::path::{Path, PathBuf};

use docsift_common::{ExtractionResult, Metadata, Result, SiftError};

/// Where one conversion's artifacts were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub text: PathBuf,
    pub metadata: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, base: &str) -> Self {
        Self {
            text: dir.join(format!("{base}.txt")),
            metadata: dir.join(format!("{base}_metadata.txt")),
        }
    }
}

/// Human-readable dump of `metadata`: `{key: value, ...}` in key order.
///
/// ```
/// use docsift_common::Metadata;
/// use docsift_pipeline::output::format_metadata;
///
/// let metadata = Metadata::from([
///     ("title".to_string(), "T".to_string()),
///     ("description".to_string(), "D".to_string()),
/// ]);
/// assert_eq!(format_metadata(&metadata), "{description: D, title: T}");
/// ```
pub fn format_metadata(metadata: &Metadata) -> String {
    let fields: Vec<String> = metadata.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!("{{{}}}", fields.join(", "))
}

/// Lower-cased file name without its extension.
pub fn output_basename(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Write both artifacts into `dir`, creating it if needed. If the second
/// write fails the first file is removed again.
pub async fn write_outputs(dir: &Path, base: &str, result: &ExtractionResult) -> Result<OutputPaths> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SiftError::persistence(dir, e))?;

    let paths = OutputPaths::new(dir, base);
    tokio::fs::write(&paths.text, &result.text)
        .await
        .map_err(|e| SiftError::persistence(&paths.text, e))?;

    if let Err(e) = tokio::fs::write(&paths.metadata, format_metadata(&result.metadata)).await {
        if let Err(cleanup) = tokio::fs::remove_file(&paths.text).await {
            tracing::warn!(path = %paths.text.display(), error = %cleanup, "pipeline.rollback_failed");
        }
        return Err(SiftError::persistence(&paths.metadata, e));
    }

    tracing::debug!(
        text = %paths.text.display(),
        metadata = %paths.metadata.display(),
        "pipeline.persist"
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_common::ErrorKind;

    #[test]
    fn empty_metadata() {
        assert_eq!(format_metadata(&Metadata::new()), "{}");
    }

    #[test]
    fn basename_is_lowercased_stem() {
        assert_eq!(output_basename(Path::new("/in/Quarterly.Report.PDF")), "quarterly.report");
        assert_eq!(output_basename(Path::new("README")), "readme");
        assert_eq!(output_basename(Path::new("/")), "");
    }

    #[tokio::test]
    async fn writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let result = ExtractionResult::new(
            "body\n",
            Metadata::from([("title".to_string(), "T".to_string())]),
        );

        let paths = write_outputs(&out, "doc", &result).await.unwrap();

        assert_eq!(std::fs::read_to_string(&paths.text).unwrap(), "body\n");
        assert_eq!(std::fs::read_to_string(&paths.metadata).unwrap(), "{title: T}");
        assert_eq!(paths.text, out.join("doc.txt"));
        assert_eq!(paths.metadata, out.join("doc_metadata.txt"));
    }

    #[tokio::test]
    async fn failed_metadata_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("doc_metadata.txt")).unwrap();

        let err = write_outputs(dir.path(), "doc", &ExtractionResult::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
        assert!(!dir.path().join("doc.txt").exists());
    }
}
