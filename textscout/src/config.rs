use config::{Config as ConfigBuilder, Environment, File};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::SearchResult;

/// Prefix for environment variable overrides, e.g. `TEXTSCOUT_SEARCH_TEXT`.
pub const ENV_PREFIX: &str = "TEXTSCOUT";

/// Configuration for one search run.
///
/// # Configuration Sources
///
/// Values are layered in order of precedence (highest last):
/// 1. Built-in defaults
/// 2. The configuration file (`config.json` unless another path is given)
/// 3. `TEXTSCOUT_*` environment variables
/// 4. Command-line overrides, applied with [`SearchConfig::merge_with_cli`]
///
/// # Configuration Format
///
/// The format is picked from the file extension (JSON, YAML or TOML). Example:
/// ```json
/// {
///     "root_directory": "./docs",
///     "search_text": "TODO",
///     "num_workers": 4,
///     "allowed_extensions": [".txt", ".md"],
///     "log_level": "info"
/// }
/// ```
///
/// A missing or malformed file is a fatal configuration error; the search is
/// never started with a half-read configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Root directory to start the search from
    #[serde(default = "default_root_directory")]
    pub root_directory: PathBuf,

    /// Literal, case-sensitive text to look for
    #[serde(default)]
    pub search_text: String,

    /// Number of worker threads scanning files
    #[serde(default = "default_num_workers")]
    pub num_workers: NonZeroUsize,

    /// Extensions to include, with or without the leading dot.
    /// An empty list disables extension filtering.
    #[serde(
        default = "default_allowed_extensions",
        deserialize_with = "deserialize_extensions"
    )]
    pub allowed_extensions: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_num_workers() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(1)
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".txt".to_string()]
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Accepts a list of extensions or one comma-separated string, which is how
/// the list arrives from an environment variable.
fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ExtensionsVisitor;

    impl<'de> Visitor<'de> for ExtensionsVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a list of extensions or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(value
                .split(',')
                .map(str::trim)
                .filter(|ext| !ext.is_empty())
                .map(String::from)
                .collect())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut extensions = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(ext) = seq.next_element::<String>()? {
                extensions.push(ext);
            }
            Ok(extensions)
        }
    }

    deserializer.deserialize_any(ExtensionsVisitor)
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_directory: default_root_directory(),
            search_text: String::new(),
            num_workers: default_num_workers(),
            allowed_extensions: default_allowed_extensions(),
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_directory: Option<PathBuf>,
    pub search_text: Option<String>,
    pub num_workers: Option<NonZeroUsize>,
    pub allowed_extensions: Option<Vec<String>>,
    pub log_level: Option<String>,
}

impl SearchConfig {
    /// Creates a configuration with defaults for everything but the root and text
    pub fn new(root_directory: impl Into<PathBuf>, search_text: impl Into<String>) -> Self {
        Self {
            root_directory: root_directory.into(),
            search_text: search_text.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the number of workers
    pub fn with_num_workers(mut self, count: NonZeroUsize) -> Self {
        self.num_workers = count;
        self
    }

    /// Builder method to set the allowed extensions
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Loads configuration from a file, layered with `TEXTSCOUT_*` environment variables
    pub fn load_from(path: &Path) -> SearchResult<Self> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Loads configuration from a file, layered with environment variables
    /// carrying the given prefix.
    ///
    /// Environment values are kept as strings, so a search text such as `007`
    /// is searched for verbatim. `num_workers` is parsed while deserializing.
    pub fn load_with_env_prefix(path: &Path, prefix: &str) -> SearchResult<Self> {
        let config = ConfigBuilder::builder()
            .add_source(File::from(path).required(true))
            .add_source(Environment::with_prefix(prefix))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        // CLI values take precedence over config file values
        if let Some(root) = cli.root_directory {
            self.root_directory = root;
        }
        if let Some(text) = cli.search_text {
            self.search_text = text;
        }
        if let Some(workers) = cli.num_workers {
            self.num_workers = workers;
        }
        if let Some(extensions) = cli.allowed_extensions {
            self.allowed_extensions = extensions;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Allowed extensions lowercased with the leading dot removed.
    /// Empty means every file is searched.
    pub fn normalized_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }
}
