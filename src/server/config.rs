use super::RequestsLoggingLevel;
use crate::scoring::ScoringPolicy;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub frontend_dir_path: Option<String>,
    /// Minimum score for EMS -> GMS promotion (batch default).
    pub promotion_threshold: f64,
    /// Minimum score for marking a PMS candidate as fully processed.
    pub verification_threshold: f64,
    /// Top-N cutoff for trained listening profiles.
    pub profile_top_n: usize,
    pub scoring_policy: ScoringPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            frontend_dir_path: None,
            promotion_threshold: 70.0,
            verification_threshold: 70.0,
            profile_top_n: 10,
            scoring_policy: ScoringPolicy::default(),
        }
    }
}
