//! Configuration file parsing, defaults, and merging.
//!
//! Configuration is loaded in layers (last wins):
//! 1. Built-in defaults
//! 2. Global config from `~/.symdex/config.toml`
//! 3. Per-project config from `<root>/.symdex/config.toml`
//!
//! Each layer only overrides fields it explicitly sets; absent fields
//! are left at their previous value.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::extract::ExtractOptions;
use crate::extract::typenorm::TypeGapPolicy;
use crate::filter::StopwordFilter;

// ---------------------------------------------------------------------------
// Public config types (fully resolved, no Options)
// ---------------------------------------------------------------------------

/// Top-level configuration, fully resolved with defaults applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
    pub ignore: IgnoreConfig,
}

/// Extraction engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Maximum bytes kept of any symbol text.
    pub max_symbol_len: usize,
    /// Maximum bytes kept of any rendered type.
    pub max_type_len: usize,
    /// Nesting depth the type normalizer renders before dropping arguments.
    pub max_type_depth: usize,
    /// What to do with a type node the type table does not know.
    pub type_gap_policy: TypeGapPolicy,
    /// Maximum file size (in KiB) that the extractor will process.
    pub max_file_size_kb: u64,
}

/// Filter oracle settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Words shorter than this (in chars) are noise.
    pub min_word_len: usize,
    /// Extra stopwords on top of the built-in set.
    pub stopwords: Vec<String>,
    /// Whether purely numeric words are indexed.
    pub index_numbers: bool,
}

/// Output / display settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Default output format: `"grep"` or `"json"`.
    pub default_format: String,
    /// Color mode for grep output: `"auto"`, `"always"` or `"never"`.
    pub color: String,
}

/// Ignore / exclusion settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IgnoreConfig {
    /// Extra glob patterns to exclude from walks.
    pub patterns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ExtractConfig {
    fn default() -> Self {
        let opts = ExtractOptions::default();
        Self {
            max_symbol_len: opts.max_symbol_len,
            max_type_len: opts.max_type_len,
            max_type_depth: opts.max_type_depth,
            type_gap_policy: opts.type_gap_policy,
            max_file_size_kb: opts.max_file_size / 1024,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_word_len: 1,
            stopwords: Vec::new(),
            index_numbers: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "grep".to_string(),
            color: "auto".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Option-based overlay types (for partial deserialization)
// ---------------------------------------------------------------------------

/// Mirror of [`Config`] where every field is `Option`, so we can
/// deserialize a partial TOML file and overlay only the keys that are
/// present.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigOverlay {
    extract: Option<ExtractOverlay>,
    filter: Option<FilterOverlay>,
    output: Option<OutputOverlay>,
    ignore: Option<IgnoreOverlay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ExtractOverlay {
    max_symbol_len: Option<usize>,
    max_type_len: Option<usize>,
    max_type_depth: Option<usize>,
    type_gap_policy: Option<TypeGapPolicy>,
    max_file_size_kb: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FilterOverlay {
    min_word_len: Option<usize>,
    stopwords: Option<Vec<String>>,
    index_numbers: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputOverlay {
    default_format: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct IgnoreOverlay {
    patterns: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Merge helpers
// ---------------------------------------------------------------------------

impl Config {
    /// Apply an overlay on top of this config, replacing only the fields
    /// that are `Some` in the overlay.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(ex) = overlay.extract {
            if let Some(v) = ex.max_symbol_len {
                self.extract.max_symbol_len = v;
            }
            if let Some(v) = ex.max_type_len {
                self.extract.max_type_len = v;
            }
            if let Some(v) = ex.max_type_depth {
                self.extract.max_type_depth = v;
            }
            if let Some(v) = ex.type_gap_policy {
                self.extract.type_gap_policy = v;
            }
            if let Some(v) = ex.max_file_size_kb {
                self.extract.max_file_size_kb = v;
            }
        }
        if let Some(f) = overlay.filter {
            if let Some(v) = f.min_word_len {
                self.filter.min_word_len = v;
            }
            if let Some(v) = f.stopwords {
                self.filter.stopwords = v;
            }
            if let Some(v) = f.index_numbers {
                self.filter.index_numbers = v;
            }
        }
        if let Some(out) = overlay.output {
            if let Some(v) = out.default_format {
                self.output.default_format = v;
            }
            if let Some(v) = out.color {
                self.output.color = v;
            }
        }
        if let Some(ign) = overlay.ignore
            && let Some(v) = ign.patterns
        {
            self.ignore.patterns = v;
        }
    }

    /// Engine options derived from the `[extract]` section.
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            max_symbol_len: self.extract.max_symbol_len.max(1),
            max_type_len: self.extract.max_type_len.max(1),
            max_type_depth: self.extract.max_type_depth.max(1),
            type_gap_policy: self.extract.type_gap_policy,
            max_file_size: self.extract.max_file_size_kb.saturating_mul(1024),
        }
    }

    /// The default filter oracle, configured from the `[filter]` section.
    pub fn stopword_filter(&self) -> StopwordFilter {
        StopwordFilter::new(self.filter.min_word_len)
            .with_stopwords(self.filter.stopwords.iter().map(String::as_str))
            .index_numbers(self.filter.index_numbers)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Return the user's home directory.
fn home_dir() -> Option<PathBuf> {
    #[allow(deprecated)]
    std::env::home_dir()
}

/// Parse a TOML string into a [`ConfigOverlay`], producing a clear error
/// message on malformed input.
fn parse_overlay(contents: &str, path: &Path) -> Result<ConfigOverlay> {
    toml::from_str(contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Try to read a config file and parse it as an overlay.
/// Returns `Ok(None)` if the file does not exist.
fn load_overlay(path: &Path) -> Result<Option<ConfigOverlay>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let overlay = parse_overlay(&contents, path)?;
            Ok(Some(overlay))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow::anyhow!(
            "failed to read config file {}: {}",
            path.display(),
            e
        )),
    }
}

impl Config {
    /// Load configuration by merging layers:
    /// defaults -> global (`~/.symdex/config.toml`) -> per-project (`<root>/.symdex/config.toml`).
    ///
    /// If `root` is `None`, only the global config (if any) is applied
    /// on top of defaults.
    pub fn load(root: Option<&Path>) -> Result<Config> {
        let global_dir = home_dir().map(|h| h.join(".symdex"));
        Self::load_with_global_dir(global_dir.as_deref(), root)
    }

    /// Internal: load config with an explicit global config directory.
    ///
    /// This allows tests to supply a temporary directory instead of the
    /// real `~/.symdex` without mutating environment variables.
    fn load_with_global_dir(global_dir: Option<&Path>, root: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(dir) = global_dir {
            let global_path = dir.join("config.toml");
            if let Some(overlay) = load_overlay(&global_path)? {
                config.apply_overlay(overlay);
            }
        }

        if let Some(root) = root {
            let project_path = root.join(".symdex").join("config.toml");
            if let Some(overlay) = load_overlay(&project_path)? {
                config.apply_overlay(overlay);
            }
        }

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
