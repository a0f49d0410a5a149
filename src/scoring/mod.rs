mod cache;
mod evaluate;
mod profile;

pub use cache::ProfileCache;
pub use evaluate::{evaluate, BonusPolicy, Evaluation, Grade, ScoringPolicy, COLD_START_SCORE};
pub use profile::ListeningProfile;
