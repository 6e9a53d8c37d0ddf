//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rankify_core::config::EvaluationConfig;

/// Top-level rankify configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankifyConfig {
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Report format written when `--format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Settings handed to the scoring engine.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./rankify-results")
}

fn default_format() -> String {
    "json".to_string()
}

impl Default for RankifyConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_format: default_format(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl RankifyConfig {
    fn apply_env_overrides(&mut self, output_dir: Option<String>) {
        if let Some(dir) = output_dir.filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `rankify.toml` in the current directory
/// 2. `~/.config/rankify/config.toml`
///
/// `RANKIFY_OUTPUT_DIR` overrides the output directory.
pub fn load_config_from(path: Option<&Path>) -> Result<RankifyConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("rankify.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<RankifyConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RankifyConfig::default(),
    };

    config.apply_env_overrides(std::env::var("RANKIFY_OUTPUT_DIR").ok());
    tracing::debug!("using config: {config:?}");

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("rankify"))
}
