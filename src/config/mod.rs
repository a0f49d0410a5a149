mod file_config;

pub use file_config::{FileConfig, ScoringConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_PROMOTION_THRESHOLD: f64 = 70.0;
pub const DEFAULT_VERIFICATION_THRESHOLD: f64 = 70.0;
pub const DEFAULT_PROFILE_TOP_N: usize = 10;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub promotion_threshold: Option<f64>,
    pub verification_threshold: Option<f64>,
    pub bonus_seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,

    // Scoring settings (with defaults)
    pub scoring: ScoringSettings,
}

#[derive(Debug, Clone)]
pub struct ScoringSettings {
    pub promotion_threshold: f64,
    pub verification_threshold: f64,
    pub profile_top_n: usize,
    pub bonus_seed: Option<u64>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            promotion_threshold: DEFAULT_PROMOTION_THRESHOLD,
            verification_threshold: DEFAULT_VERIFICATION_THRESHOLD,
            profile_top_n: DEFAULT_PROFILE_TOP_N,
            bonus_seed: None,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // Validate db_dir exists
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let scoring_file = file.scoring.unwrap_or_default();
        let promotion_threshold = scoring_file
            .promotion_threshold
            .or(cli.promotion_threshold)
            .unwrap_or(DEFAULT_PROMOTION_THRESHOLD);
        let verification_threshold = scoring_file
            .verification_threshold
            .or(cli.verification_threshold)
            .unwrap_or(DEFAULT_VERIFICATION_THRESHOLD);
        for (name, value) in [
            ("promotion_threshold", promotion_threshold),
            ("verification_threshold", verification_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                bail!("{} must be within 0..=100, got {}", name, value);
            }
        }
        let scoring = ScoringSettings {
            promotion_threshold,
            verification_threshold,
            profile_top_n: scoring_file.profile_top_n.unwrap_or(DEFAULT_PROFILE_TOP_N),
            bonus_seed: scoring_file.bonus_seed.or(cli.bonus_seed),
        };

        Ok(Self {
            db_dir,
            port,
            logging_level,
            frontend_dir_path,
            scoring,
        })
    }

    pub fn playlist_db_path(&self) -> PathBuf {
        self.db_dir.join("playlists.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
