use axum::extract::FromRef;

use crate::lifecycle::TransitionEngine;
use crate::playlist_store::PlaylistStore;
use crate::scoring::ProfileCache;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedPlaylistStore = Arc<dyn PlaylistStore>;
pub type GuardedTransitionEngine = Arc<TransitionEngine>;
pub type GuardedProfileCache = Arc<ProfileCache>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub playlist_store: GuardedPlaylistStore,
    pub engine: GuardedTransitionEngine,
    pub profile_cache: GuardedProfileCache,
}

impl FromRef<ServerState> for GuardedPlaylistStore {
    fn from_ref(input: &ServerState) -> Self {
        input.playlist_store.clone()
    }
}

impl FromRef<ServerState> for GuardedTransitionEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.engine.clone()
    }
}

