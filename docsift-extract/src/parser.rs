//! Office-document conversion, delegated to external programs.

use std::collections::BTreeMap;
use std::process::Stdio;

use async_trait::async_trait;
use docsift_common::{ExtractionResult, Metadata, Result, SiftError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::kind::FileExtensionKind;

/// Converts the bytes of an office document into raw text and metadata.
///
/// Results are not yet normalised; the pipeline filters them.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, kind: FileExtensionKind, bytes: Vec<u8>) -> Result<ExtractionResult>;
}

/// Runs one converter program per format, document on stdin, text on stdout.
#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    commands: BTreeMap<FileExtensionKind, Vec<String>>,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `argv` for `kind`. An empty argv unregisters the format.
    pub fn with_command(mut self, kind: FileExtensionKind, argv: Vec<String>) -> Self {
        if argv.is_empty() {
            self.commands.remove(&kind);
        } else {
            self.commands.insert(kind, argv);
        }
        self
    }

    /// Build from an extension-keyed table. Unknown or non-office keys are
    /// skipped with a warning.
    pub fn from_table<'a, I>(table: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<String>)>,
    {
        table
            .into_iter()
            .fold(Self::new(), |parser, (ext, argv)| {
                match FileExtensionKind::from_extension(ext) {
                    Some(kind) if kind.is_office() => parser.with_command(kind, argv.clone()),
                    _ => {
                        tracing::warn!(extension = %ext, "parser.unknown_extension");
                        parser
                    }
                }
            })
    }

    pub fn command(&self, kind: FileExtensionKind) -> Option<&[String]> {
        self.commands.get(&kind).map(Vec::as_slice)
    }
}

#[async_trait]
impl DocumentParser for CommandParser {
    async fn parse(&self, kind: FileExtensionKind, bytes: Vec<u8>) -> Result<ExtractionResult> {
        let Some((program, args)) = self.command(kind).and_then(<[String]>::split_first) else {
            return Err(SiftError::UnsupportedType(kind.to_string()));
        };

        tracing::debug!(%kind, %program, bytes = bytes.len(), "parser.spawn");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SiftError::ParseFailure(format!("cannot run {program}: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SiftError::ParseFailure(format!("{program}: stdin unavailable")))?;
        let feed = async move {
            let written = stdin.write_all(&bytes).await;
            drop(stdin);
            written
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output =
            output.map_err(|e| SiftError::ParseFailure(format!("{program} failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SiftError::ParseFailure(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if let Err(e) = fed {
            // The converter may stop reading once it has what it needs.
            tracing::debug!(%program, error = %e, "parser.stdin_closed_early");
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(ExtractionResult::new(text, Metadata::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_common::ErrorKind;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn table_skips_unknown_and_non_office_keys() {
        let table = BTreeMap::from([
            ("pdf".to_string(), argv(&["pdftotext", "-", "-"])),
            ("html".to_string(), argv(&["cat"])),
            ("xyz".to_string(), argv(&["cat"])),
        ]);
        let parser = CommandParser::from_table(&table);
        assert_eq!(parser.command(FileExtensionKind::Pdf).map(<[String]>::len), Some(3));
        assert!(parser.command(FileExtensionKind::Html).is_none());
    }

    #[tokio::test]
    async fn unregistered_format_is_unsupported() {
        let err = CommandParser::new()
            .parse(FileExtensionKind::Pages, b"PK".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pipes_document_through_converter() {
        let parser = CommandParser::new().with_command(FileExtensionKind::Rtf, argv(&["cat"]));
        let result = parser
            .parse(FileExtensionKind::Rtf, b"plain body\n".to_vec())
            .await
            .unwrap();
        assert_eq!(result.text, "plain body\n");
        assert!(result.metadata.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_converter_is_a_parse_failure() {
        let parser = CommandParser::new()
            .with_command(FileExtensionKind::Doc, argv(&["sh", "-c", "echo broken >&2; exit 3"]));
        let err = parser
            .parse(FileExtensionKind::Doc, b"\xd0\xcf\x11\xe0".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn missing_program_is_a_parse_failure() {
        let parser = CommandParser::new().with_command(
            FileExtensionKind::Odt,
            argv(&["docsift-no-such-converter-binary"]),
        );
        let err = parser
            .parse(FileExtensionKind::Odt, Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }
}
