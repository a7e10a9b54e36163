use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Default nesting limit for parenthesized groups and comparison sides
const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit on the height of a built tree, operator chains included
const DEFAULT_MAX_HEIGHT: usize = 512;

/// Options shared by tree building and evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Compare text exactly instead of lower-casing both sides
    #[serde(default)]
    pub case_sensitive: bool,

    /// Recognise `!=`, `>=` and `<=` as comparison operators
    #[serde(default = "default_extended_operators")]
    pub extended_operators: bool,

    /// Deepest allowed nesting of groups, function arguments and comparison sides
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Tallest allowed tree. Every `NOT` and every `AND`/`OR` in a chain adds a
    /// level, and evaluation recurses once per level.
    #[serde(default = "default_max_height")]
    pub max_height: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            extended_operators: default_extended_operators(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

fn default_extended_operators() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_height() -> usize {
    DEFAULT_MAX_HEIGHT
}

impl SearchConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_depth == 0 {
            bail!("max_depth must be greater than 0");
        }
        if self.max_height == 0 {
            bail!("max_height must be greater than 0");
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yml::from_str(yaml).context("search config is malformed")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read search config {}", path.display()))?;
        let config = Self::from_yaml_str(&yaml)?;
        log::debug!("loaded search config from {}: {config:?}", path.display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yml::to_string(self).context("failed to serialize search config")
    }

    /// Case-fold `text` unless comparisons are case sensitive.
    pub(crate) fn fold_case(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }
}
