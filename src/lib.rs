//! Musicspace Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod lifecycle;
pub mod playlist_store;
pub mod scoring;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use lifecycle::{BatchPromotionDriver, TransitionAction, TransitionEngine, TransitionError};
pub use playlist_store::{PlaylistStore, SpaceType, SqlitePlaylistStore, StatusFlag};
pub use scoring::{evaluate, Grade, ListeningProfile, ProfileCache, ScoringPolicy};
pub use server::{make_app, run_server, RequestsLoggingLevel};
