//! Batch promotion sweep over the External Music Space.
//!
//! Curator mode: all EMS playlists, regardless of owner, are evaluated
//! against the single requesting user's trained profile. The sweep is
//! strictly sequential so that each score-then-promote pair is applied as a
//! unit against a profile that cannot change mid-batch.

use super::engine::{TransitionAction, TransitionEngine};
use crate::playlist_store::{PlaylistFilter, PlaylistStore, SpaceType};
use crate::scoring::{evaluate, Grade, ProfileCache, ScoringPolicy};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum BatchError {
    /// No trained profile for the requesting user. Fatal for the whole
    /// batch: without a profile no candidate can be meaningfully scored.
    #[error("No trained listening profile for user {0}")]
    ProfileNotTrained(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub playlist_id: i64,
    pub score: f64,
    pub grade: Grade,
    pub promoted: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub promoted: usize,
    pub rejected: usize,
    pub items: Vec<BatchItem>,
}

pub struct BatchPromotionDriver {
    store: Arc<dyn PlaylistStore>,
    engine: Arc<TransitionEngine>,
    cache: Arc<ProfileCache>,
    policy: ScoringPolicy,
}

impl BatchPromotionDriver {
    pub fn new(
        store: Arc<dyn PlaylistStore>,
        engine: Arc<TransitionEngine>,
        cache: Arc<ProfileCache>,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            store,
            engine,
            cache,
            policy,
        }
    }

    /// Evaluates every EMS playlist and promotes those scoring at or above
    /// the threshold. Per-item failures are logged and counted as
    /// rejections; the result is returned only after the full sweep.
    pub fn promote_all(&self, user_id: i64, threshold: f64) -> Result<BatchOutcome, BatchError> {
        let profile = self
            .cache
            .get(user_id)
            .ok_or(BatchError::ProfileNotTrained(user_id))?;

        let candidates = self.store.list_playlists(&PlaylistFilter {
            space: Some(SpaceType::Ems),
            ..Default::default()
        })?;
        info!(
            "Batch promotion: {} EMS candidates, threshold {:.1}, curator user {}",
            candidates.len(),
            threshold,
            user_id
        );

        let mut outcome = BatchOutcome {
            promoted: 0,
            rejected: 0,
            items: Vec::with_capacity(candidates.len()),
        };

        for candidate in candidates {
            let tracks = match self.store.get_playlist_tracks(candidate.id) {
                Ok(tracks) => tracks,
                Err(err) => {
                    warn!("Skipping playlist {}: {}", candidate.id, err);
                    outcome.rejected += 1;
                    continue;
                }
            };
            let evaluation = evaluate(Some(profile.as_ref()), &tracks, &self.policy);

            let mut promoted = false;
            if evaluation.score >= threshold {
                let action = TransitionAction::Promote {
                    score: evaluation.score,
                    evaluated_by: user_id,
                    reason: evaluation.reason.clone(),
                };
                match self.engine.transition(candidate.id, action) {
                    Ok(_) => promoted = true,
                    Err(err) => {
                        warn!("Promotion of playlist {} failed: {}", candidate.id, err);
                    }
                }
            }

            if promoted {
                outcome.promoted += 1;
            } else {
                outcome.rejected += 1;
            }
            outcome.items.push(BatchItem {
                playlist_id: candidate.id,
                score: evaluation.score,
                grade: evaluation.grade,
                promoted,
            });
        }

        info!(
            "Batch promotion done: {} promoted, {} rejected",
            outcome.promoted, outcome.rejected
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist_store::{
        NewPlaylist, NewTrack, SqlitePlaylistStore, SourceType, StatusFlag,
    };
    use crate::scoring::ListeningProfile;

    fn import(store: &SqlitePlaylistStore, artists: &[&str]) -> i64 {
        store
            .create_playlist(&NewPlaylist {
                owner_id: 3,
                name: "Candidate".to_string(),
                source: SourceType::Platform,
                tracks: artists
                    .iter()
                    .map(|artist| NewTrack {
                        title: "t".to_string(),
                        artist: artist.to_string(),
                        genre: None,
                    })
                    .collect(),
            })
            .unwrap()
    }

    fn driver() -> (Arc<SqlitePlaylistStore>, Arc<ProfileCache>, BatchPromotionDriver) {
        let store = Arc::new(SqlitePlaylistStore::in_memory().unwrap());
        let engine = Arc::new(TransitionEngine::new(store.clone()));
        let cache = Arc::new(ProfileCache::new());
        let driver = BatchPromotionDriver::new(
            store.clone(),
            engine,
            cache.clone(),
            ScoringPolicy::default(),
        );
        (store, cache, driver)
    }

    #[test]
    fn missing_profile_fails_the_whole_batch() {
        let (store, _cache, driver) = driver();
        import(&store, &["A"]);

        let result = driver.promote_all(7, 70.0);
        assert!(matches!(result, Err(BatchError::ProfileNotTrained(7))));

        // Nothing moved.
        let playlist = store
            .list_playlists(&PlaylistFilter::default())
            .unwrap()
            .remove(0);
        assert_eq!(playlist.space, SpaceType::Ems);
    }

    #[test]
    fn threshold_partitions_candidates() {
        let (store, cache, driver) = driver();
        cache.put(ListeningProfile::from_frequencies(
            7,
            vec![("A".to_string(), 5)],
            vec![],
        ));

        // All matches: score 100. No matches: score 40. Empty: score 0.
        let hit = import(&store, &["A", "A"]);
        let miss = import(&store, &["X", "Y"]);
        let empty = import(&store, &[]);

        let outcome = driver.promote_all(7, 70.0).unwrap();
        assert_eq!(outcome.promoted, 1);
        assert_eq!(outcome.rejected, 2);
        assert_eq!(outcome.items.len(), 3);

        let hit_playlist = store.get_playlist(hit).unwrap().unwrap();
        assert_eq!(hit_playlist.space, SpaceType::Gms);
        assert_eq!(hit_playlist.status, StatusFlag::Prp);
        // Promotion recorded the curator's score.
        assert_eq!(store.get_score(hit, 7).unwrap().unwrap().score, 100.0);

        for id in [miss, empty] {
            let playlist = store.get_playlist(id).unwrap().unwrap();
            assert_eq!(playlist.space, SpaceType::Ems);
            assert_eq!(playlist.status, StatusFlag::Ptp);
            assert!(store.get_score(id, 7).unwrap().is_none());
        }

        let empty_item = outcome
            .items
            .iter()
            .find(|item| item.playlist_id == empty)
            .unwrap();
        assert_eq!(empty_item.score, 0.0);
        assert_eq!(empty_item.grade, Grade::F);
        assert!(!empty_item.promoted);
    }

    #[test]
    fn already_promoted_candidates_do_not_abort_the_batch() {
        let (store, cache, driver) = driver();
        cache.put(ListeningProfile::from_frequencies(
            7,
            vec![("A".to_string(), 5)],
            vec![],
        ));
        let first = import(&store, &["A"]);
        let second = import(&store, &["A"]);

        // First candidate is concurrently moved out of (EMS, PTP); its
        // promotion fails and is counted as a rejection.
        store
            .update_space_status(
                first,
                (SpaceType::Ems, StatusFlag::Ptp),
                (SpaceType::Ems, StatusFlag::Prp),
            )
            .unwrap();

        let outcome = driver.promote_all(7, 70.0).unwrap();
        assert_eq!(outcome.promoted, 1);
        assert_eq!(outcome.rejected, 1);
        let second_playlist = store.get_playlist(second).unwrap().unwrap();
        assert_eq!(second_playlist.space, SpaceType::Gms);
    }
}
