use std::path::{Path, PathBuf};

use anyhow::Context;
use ckpt_diff::DistanceMetric;
use serde::{Deserialize, Serialize};

/// Settings read from a `--config` TOML file. Command-line flags take
/// precedence over every field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Decimal places printed for distances.
    pub precision: usize,
    pub metric: DistanceMetric,
    /// Report per-parameter distance errors instead of aborting.
    pub keep_going: bool,
    pub color: bool,
    /// HuggingFace hub cache directory, overriding the environment.
    pub hub_cache: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            metric: DistanceMetric::Rms,
            keep_going: false,
            color: true,
            hub_cache: None,
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
