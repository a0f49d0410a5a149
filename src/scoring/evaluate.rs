//! Compatibility scoring of a track list against a listening profile.
//!
//! Pure: same profile, tracks and policy always produce the same result.

use super::profile::ListeningProfile;
use crate::playlist_store::Track;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Letter grade for a score. Ordering follows the declaration: F < C < B < A < S.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    F,
    C,
    B,
    A,
    S,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::S
        } else if score >= 80.0 {
            Grade::A
        } else if score >= 70.0 {
            Grade::B
        } else {
            Grade::C
        }
    }
}

/// Optional per-track jitter added to the raw credit. The original system
/// added an unseeded random bonus per track; here the bonus is an explicit
/// policy and deterministic for a given seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BonusPolicy {
    None,
    Seeded { seed: u64, max_per_track: f64 },
}

/// Scoring constants. The defaults reproduce the observed behavior:
/// 10 credit per matched artist, score = min(100, credit/tracks * 20 + 40).
/// Changing them moves playlists across grade boundaries, so overrides
/// should be deliberate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub match_credit: f64,
    pub scale_factor: f64,
    pub base_offset: f64,
    pub bonus: BonusPolicy,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            match_credit: 10.0,
            scale_factor: 20.0,
            base_offset: 40.0,
            bonus: BonusPolicy::None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub score: f64,
    pub grade: Grade,
    pub reason: String,
}

pub const COLD_START_SCORE: f64 = 50.0;
pub const COLD_START_REASON: &str = "Model not trained yet, assigned neutral score";

/// Scores a track list against a profile.
///
/// An empty track list scores 0/F without touching the profile (no division
/// by zero). A missing profile is the cold-start case and yields the fixed
/// neutral result, not an error.
pub fn evaluate(
    profile: Option<&ListeningProfile>,
    tracks: &[Track],
    policy: &ScoringPolicy,
) -> Evaluation {
    if tracks.is_empty() {
        return Evaluation {
            score: 0.0,
            grade: Grade::F,
            reason: "Empty playlist".to_string(),
        };
    }

    let Some(profile) = profile else {
        return Evaluation {
            score: COLD_START_SCORE,
            grade: Grade::from_score(COLD_START_SCORE),
            reason: COLD_START_REASON.to_string(),
        };
    };

    let mut rng = match policy.bonus {
        BonusPolicy::Seeded { seed, .. } => Some(StdRng::seed_from_u64(seed)),
        BonusPolicy::None => None,
    };

    let mut total_credit = 0.0;
    let mut matched_artists: Vec<&str> = Vec::new();
    for track in tracks {
        if profile.contains_artist(&track.artist) {
            total_credit += policy.match_credit;
            if !matched_artists.contains(&track.artist.as_str()) {
                matched_artists.push(&track.artist);
            }
        }
        if let (Some(rng), BonusPolicy::Seeded { max_per_track, .. }) = (rng.as_mut(), policy.bonus)
        {
            total_credit += rng.random_range(0.0..max_per_track);
        }
    }

    let raw = total_credit / tracks.len() as f64 * policy.scale_factor + policy.base_offset;
    let score = raw.clamp(0.0, 100.0);

    let reason = if matched_artists.is_empty() {
        "No overlap with your top artists".to_string()
    } else {
        format!("Matched top artists: {}", matched_artists.join(", "))
    };

    Evaluation {
        score,
        grade: Grade::from_score(score),
        reason,
    }
}
