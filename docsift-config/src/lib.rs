//! Loader for docsift configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later wins:
//!
//! 1. built-in defaults ([`SiftConfig::default`])
//! 2. an optional YAML/TOML/JSON file (format inferred from the suffix)
//! 3. inline YAML snippets (tests, CLI)
//! 4. `DOCSIFT__`-prefixed environment variables, `__` separating nested keys
//!    (`DOCSIFT__CAPTURE__SETTLE_DELAY_SECS=2`)
//!
//! `${VAR}` placeholders in string values are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "DOCSIFT";

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "docsift.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Directory receiving `.txt`, `_metadata.txt` and captured `.html` files.
    pub output_dir: PathBuf,
    /// Ignore failures of the HTML formatter pre-pass instead of aborting.
    pub skip_prettify_error: bool,
    /// Run the HTML formatter pre-pass at all. It rewrites the input file.
    pub prettify: bool,
    /// Formatter argv; the HTML file path is appended.
    pub prettier_command: Vec<String>,
    pub capture: CaptureConfig,
    pub log: LogSettings,
    /// External converter argv per office extension (`pdf`, `doc`, ...).
    /// Documents are piped on stdin, text is read from stdout.
    pub parsers: BTreeMap<String, Vec<String>>,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            skip_prettify_error: false,
            prettify: false,
            prettier_command: argv(&["npx", "prettier", "--write"]),
            capture: CaptureConfig::default(),
            log: LogSettings::default(),
            parsers: default_parsers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Extra wait after the page went idle, before reading the DOM.
    pub settle_delay_secs: u64,
    pub navigation_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Quiet period without new network requests that counts as idle.
    pub idle_window_ms: u64,
    /// Issue a HEAD request and require `text/html` before capturing.
    pub check_content_type: bool,
    pub preflight_timeout_secs: u64,
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: 0,
            navigation_timeout_secs: 30,
            idle_timeout_secs: 10,
            idle_window_ms: 500,
            check_content_type: true,
            preflight_timeout_secs: 15,
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
        }
    }
}

impl CaptureConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.idle_window_ms)
    }
    pub fn preflight_timeout(&self) -> Duration {
        Duration::from_secs(self.preflight_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
            dir: None,
            stderr: true,
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_string()).collect()
}

fn default_parsers() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        ("pdf".into(), argv(&["pdftotext", "-layout", "-", "-"])),
        ("doc".into(), argv(&["catdoc"])),
        ("docx".into(), argv(&["pandoc", "-f", "docx", "-t", "plain"])),
        ("odt".into(), argv(&["pandoc", "-f", "odt", "-t", "plain"])),
        ("rtf".into(), argv(&["unrtf", "--text"])),
    ])
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (files + env overrides).
pub struct SiftConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SiftConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SiftConfigLoader {
    /// Start from defaults; environment overrides are always applied last.
    ///
    /// ```
    /// use docsift_config::SiftConfigLoader;
    ///
    /// let config = SiftConfigLoader::new()
    ///     .with_yaml_str("skip_prettify_error: true")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert!(config.skip_prettify_error);
    /// assert_eq!(config.capture.navigation_timeout_secs, 30);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when absent, so deployments can rely
    /// purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use docsift_config::SiftConfigLoader;
    ///
    /// let cfg = SiftConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// output_dir: "/tmp/out"
    /// capture:
    ///   settle_delay_secs: 3
    ///   check_content_type: false
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.output_dir, std::path::PathBuf::from("/tmp/out"));
    /// assert_eq!(cfg.capture.settle_delay_secs, 3);
    /// assert!(!cfg.capture.check_content_type);
    /// assert!(cfg.capture.headless);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize into
    /// [`SiftConfig`]. Missing keys keep their defaults.
    pub fn load(self) -> Result<SiftConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("DOCSIFT_TEST_OUT", Some("/srv/out"), || {
            let mut v = json!("${DOCSIFT_TEST_OUT}/text");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("/srv/out/text"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("TOOL", Some("pdftotext")), ("MODE", Some("-layout"))], || {
            let mut v = json!({ "parsers": { "pdf": ["$TOOL", "${MODE}", "-", "-"] }, "n": 3 });
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!({ "parsers": { "pdf": ["pdftotext", "-layout", "-", "-"] }, "n": 3 })
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOCSIFT_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOCSIFT_DOES_NOT_EXIST}"));
    }

    #[test]
    fn defaults_cover_office_formats() {
        let cfg = SiftConfig::default();
        for ext in ["pdf", "doc", "docx", "odt", "rtf"] {
            assert!(cfg.parsers.contains_key(ext), "missing converter for {ext}");
        }
        assert!(!cfg.parsers.contains_key("pages"));
        assert_eq!(cfg.capture.preflight_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.capture.navigation_timeout(), Duration::from_secs(30));
    }
}
