use clap::{Args, Parser, Subcommand};
use docsift_config::SiftConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docsift")]
#[command(about = "Extract readable text and metadata from documents and web pages")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Convert a pdf, doc, docx, odt, rtf, pages, html, txt, md or json file
    File { path: PathBuf },
    /// Convert an HTML file regardless of its extension
    Html { path: PathBuf },
    /// Render one or more web pages and convert them
    Url {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the version
    Version,
}

/// Flags that take precedence over the configuration file and environment.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    #[arg(long, global = true, env = "DOCSIFT_CONFIG", help = "Configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory receiving the output files")]
    pub output_dir: Option<PathBuf>,

    #[arg(short = 's', long, global = true, help = "Ignore HTML formatter failures")]
    pub skip_prettify_error: bool,

    #[arg(long, global = true, help = "Format HTML with prettier before extraction")]
    pub prettify: bool,

    #[arg(long, global = true, value_name = "SECS", help = "Extra wait before reading a rendered page")]
    pub settle_delay: Option<u64>,

    #[arg(long, global = true, help = "Skip the HEAD request checking for text/html")]
    pub no_content_type_check: bool,

    #[arg(long, global = true, value_name = "URL", help = "WebDriver endpoint")]
    pub webdriver_url: Option<String>,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut SiftConfig) {
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if self.skip_prettify_error {
            cfg.skip_prettify_error = true;
        }
        if self.prettify {
            cfg.prettify = true;
        }
        if let Some(secs) = self.settle_delay {
            cfg.capture.settle_delay_secs = secs;
        }
        if self.no_content_type_check {
            cfg.capture.check_content_type = false;
        }
        if let Some(url) = &self.webdriver_url {
            cfg.capture.webdriver_url = url.clone();
        }
    }
}
