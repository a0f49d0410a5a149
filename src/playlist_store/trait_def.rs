//! PlaylistStore trait definition.
//!
//! Abstracts playlist persistence so the lifecycle engine and the server can
//! run against the SQLite store or an in-memory double in tests.

use super::models::{NewPlaylist, Playlist, PlaylistFilter, PlaylistScore, SpaceType, StatusFlag, Track};
use anyhow::Result;

pub trait PlaylistStore: Send + Sync {
    /// Imports a playlist with its ordered track list. The playlist is
    /// created in (EMS, PTP) regardless of what the caller might wish.
    /// Returns the new playlist id.
    fn create_playlist(&self, new: &NewPlaylist) -> Result<i64>;

    /// Returns Ok(None) if the playlist does not exist.
    fn get_playlist(&self, id: i64) -> Result<Option<Playlist>>;

    /// Returns the playlist's tracks in import order.
    fn get_playlist_tracks(&self, id: i64) -> Result<Vec<Track>>;

    /// Lists playlists matching the filter, oldest first.
    fn list_playlists(&self, filter: &PlaylistFilter) -> Result<Vec<Playlist>>;

    /// Compare-and-swap update of a playlist's (space, status) pair.
    /// The update only applies if the stored pair still equals `from`;
    /// returns false when it no longer does (concurrent writer won).
    fn update_space_status(
        &self,
        id: i64,
        from: (SpaceType, StatusFlag),
        to: (SpaceType, StatusFlag),
    ) -> Result<bool>;

    /// Promotion write: the space/status CAS update and the score upsert in
    /// one transaction, so a crash cannot leave a promoted playlist without
    /// its score (or the reverse).
    fn promote_with_score(
        &self,
        id: i64,
        from: (SpaceType, StatusFlag),
        to: (SpaceType, StatusFlag),
        user_id: i64,
        score: f64,
        reason: &str,
    ) -> Result<bool>;

    /// Inserts or replaces the score for the (playlist, user) pair.
    fn upsert_score(&self, playlist_id: i64, user_id: i64, score: f64, reason: &str)
        -> Result<()>;

    /// Returns Ok(None) if no score is recorded for the pair.
    fn get_score(&self, playlist_id: i64, user_id: i64) -> Result<Option<PlaylistScore>>;

    /// Deletes a playlist, its track associations and its score records.
    /// Returns false if the playlist did not exist.
    fn delete_playlist(&self, id: i64) -> Result<bool>;

    /// Artist play-frequency over the user's Platform-sourced tracks,
    /// most frequent first, capped at `limit`. Input for profile training.
    fn platform_artist_frequencies(&self, owner_id: i64, limit: usize)
        -> Result<Vec<(String, u64)>>;

    /// Genre frequency over the user's Platform-sourced tracks.
    fn platform_genre_frequencies(&self, owner_id: i64, limit: usize)
        -> Result<Vec<(String, u64)>>;

    /// Number of stored playlists, for the home stats endpoint.
    fn playlists_count(&self) -> Result<usize>;
}
