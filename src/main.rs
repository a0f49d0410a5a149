use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
use config::{AppConfig, CliConfig, FileConfig};

mod lifecycle;

mod playlist_store;
use playlist_store::SqlitePlaylistStore;

mod scoring;
use scoring::{BonusPolicy, ProfileCache, ScoringPolicy};

mod server;
use server::{run_server, RequestsLoggingLevel, ServerConfig};

mod sqlite_persistence;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite playlist database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. File values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Minimum score for batch promotion out of EMS.
    #[clap(long)]
    pub promotion_threshold: Option<f64>,

    /// Minimum score for marking a PMS playlist as fully processed.
    #[clap(long)]
    pub verification_threshold: Option<f64>,

    /// Seed for the per-track evaluation bonus. Omit to disable the bonus.
    #[clap(long)]
    pub bonus_seed: Option<u64>,
}

/// Bonus amplitude used when a seed is configured.
const BONUS_MAX_PER_TRACK: f64 = 2.0;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        promotion_threshold: cli_args.promotion_threshold,
        verification_threshold: cli_args.verification_threshold,
        bonus_seed: cli_args.bonus_seed,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    let db_path = app_config.playlist_db_path();
    info!("Opening SQLite playlist database at {:?}...", db_path);
    let playlist_store = Arc::new(SqlitePlaylistStore::new(&db_path)?);

    let profile_cache = Arc::new(ProfileCache::new());

    let scoring_policy = ScoringPolicy {
        bonus: match app_config.scoring.bonus_seed {
            Some(seed) => BonusPolicy::Seeded {
                seed,
                max_per_track: BONUS_MAX_PER_TRACK,
            },
            None => BonusPolicy::None,
        },
        ..Default::default()
    };

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level,
        port: app_config.port,
        frontend_dir_path: app_config.frontend_dir_path,
        promotion_threshold: app_config.scoring.promotion_threshold,
        verification_threshold: app_config.scoring.verification_threshold,
        profile_top_n: app_config.scoring.profile_top_n,
        scoring_policy,
    };

    info!("Ready to serve at port {}!", server_config.port);
    run_server(server_config, playlist_store, profile_cache).await
}
