use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,

    // Feature configs
    pub scoring: Option<ScoringConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minimum score for EMS -> GMS promotion.
    pub promotion_threshold: Option<f64>,
    /// Minimum score for PMS verification (PRP -> PFP).
    pub verification_threshold: Option<f64>,
    /// Number of top artists/genres kept in a trained profile.
    pub profile_top_n: Option<usize>,
    /// Seed for the per-track evaluation bonus. Unset disables the bonus.
    pub bonus_seed: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
