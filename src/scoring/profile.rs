//! Per-user listening profile.

use crate::playlist_store::PlaylistStore;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;

/// Top-N (artist, frequency) and (genre, frequency) aggregate over a user's
/// Platform-sourced tracks. Derived, not persisted; recomputed on each train
/// call and held in the ProfileCache until the next one.
#[derive(Debug, Clone, Serialize)]
pub struct ListeningProfile {
    pub user_id: i64,
    pub top_artists: Vec<(String, u64)>,
    pub top_genres: Vec<(String, u64)>,
    #[serde(skip)]
    artist_set: HashSet<String>,
}

impl ListeningProfile {
    pub fn from_frequencies(
        user_id: i64,
        top_artists: Vec<(String, u64)>,
        top_genres: Vec<(String, u64)>,
    ) -> Self {
        let artist_set = top_artists.iter().map(|(name, _)| name.clone()).collect();
        Self {
            user_id,
            top_artists,
            top_genres,
            artist_set,
        }
    }

    /// Derives the profile from the user's imported Platform tracks.
    /// Returns Ok(None) when the user has no such tracks at all, so callers
    /// can distinguish "nothing to train on" from an empty cache.
    pub fn derive(
        store: &dyn PlaylistStore,
        user_id: i64,
        top_n: usize,
    ) -> Result<Option<Self>> {
        let top_artists = store.platform_artist_frequencies(user_id, top_n)?;
        if top_artists.is_empty() {
            return Ok(None);
        }
        let top_genres = store.platform_genre_frequencies(user_id, top_n)?;
        Ok(Some(Self::from_frequencies(
            user_id,
            top_artists,
            top_genres,
        )))
    }

    pub fn contains_artist(&self, artist: &str) -> bool {
        self.artist_set.contains(artist)
    }
}
