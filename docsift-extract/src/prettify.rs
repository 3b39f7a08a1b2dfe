//! Optional formatter pre-pass over HTML files.

use std::path::Path;

use async_trait::async_trait;
use docsift_common::{Result, SiftError};
use tokio::process::Command;

/// Reformats an HTML file in place.
#[async_trait]
pub trait Prettifier: Send + Sync {
    async fn prettify(&self, path: &Path) -> Result<()>;
}

/// Runs a formatter program with the file path as its last argument,
/// `npx prettier --write <file>` by default.
#[derive(Debug, Clone)]
pub struct CommandPrettifier {
    argv: Vec<String>,
}

impl Default for CommandPrettifier {
    fn default() -> Self {
        Self::new(["npx", "prettier", "--write"].map(String::from).to_vec())
    }
}

impl CommandPrettifier {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl Prettifier for CommandPrettifier {
    async fn prettify(&self, path: &Path) -> Result<()> {
        tokio::fs::metadata(path)
            .await
            .map_err(|e| SiftError::unreadable(path, e))?;

        let Some((program, args)) = self.argv.split_first() else {
            return Err(SiftError::ParseFailure("prettier command is empty".into()));
        };

        tracing::debug!(%program, path = %path.display(), "prettify.run");
        let output = Command::new(program)
            .args(args)
            .arg(path)
            .output()
            .await
            .map_err(|e| SiftError::ParseFailure(format!("cannot run {program}: {e}")))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SiftError::ParseFailure(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}
