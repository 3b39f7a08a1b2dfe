use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use docsift_common::observability::init_logging;
use docsift_config::{DEFAULT_CONFIG_FILE, SiftConfig, SiftConfigLoader};
use docsift_pipeline::{Conversion, Pipeline};
use docsift_runtime::{SiftHandle, SiftRuntime};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod cli;
mod wiring;

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.command == Command::Version {
        println!("docsift {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // File (explicit or ./docsift.yaml), then DOCSIFT__* env, then flags.
    let loader = match &cli.overrides.config {
        Some(path) => SiftConfigLoader::new().with_file(path),
        None => SiftConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let mut cfg: SiftConfig = loader.load()?;
    cli.overrides.apply(&mut cfg);

    let log_file = init_logging(wiring::log_config(&cfg.log))?;
    tracing::debug!(log_file = %log_file.display(), "app.start");

    let pipeline = Arc::new(wiring::build_pipeline(&cfg)?);
    let runtime = SiftRuntime::build("docsift", None)?;
    runtime.cancel_on_ctrl_c();
    let handle = runtime.handle();

    let outcome = runtime.block_on(run(cli.command, pipeline, handle));
    runtime.shutdown(Duration::from_secs(2));
    outcome
}

async fn run(command: Command, pipeline: Arc<Pipeline>, handle: SiftHandle) -> Result<()> {
    match command {
        Command::File { path } => report(&pipeline.convert_file(&path).await?),
        Command::Html { path } => report(&pipeline.convert_html(&path).await?),
        Command::Url { urls } => convert_urls(urls, pipeline, handle).await?,
        Command::Version => {}
    }
    Ok(())
}

/// Each distinct URL gets its own task and browser session.
async fn convert_urls(urls: Vec<String>, pipeline: Arc<Pipeline>, handle: SiftHandle) -> Result<()> {
    let urls = unique_urls(urls);
    let cancel = handle.cancellation();
    let tasks = urls.into_iter().map(|url| {
        let pipeline = pipeline.clone();
        let cancel: CancellationToken = cancel.child_token();
        handle.spawn(async move {
            let outcome = pipeline.convert_url(&url, &cancel).await;
            (url, outcome)
        })
    });

    let mut failed = 0usize;
    let results = futures::future::join_all(tasks).await;
    let total = results.len();
    for joined in results {
        match joined {
            Ok((_, Ok(conversion))) => report(&conversion),
            Ok((url, Err(e))) => {
                failed += 1;
                tracing::error!(url = %url, kind = ?e.kind(), error = %e, "app.url_failed");
                eprintln!("{url}: {e}");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(error = %e, "app.task_failed");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} URLs failed");
    }
    Ok(())
}

/// Trim and drop repeated URLs, keeping first-seen order. Two captures of
/// one URL in the same second would write to the same file.
fn unique_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(urls.len());
    for url in urls {
        let url = url.trim().to_string();
        if seen.insert(url.clone()) {
            unique.push(url);
        } else {
            tracing::debug!(url = %url, "app.duplicate_url");
        }
    }
    unique
}

fn report(conversion: &Conversion) {
    if let Some(html) = &conversion.html {
        println!("{}", html.display());
    }
    println!("{}", conversion.outputs.text.display());
    println!("{}", conversion.outputs.metadata.display());
}
