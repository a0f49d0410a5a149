//! Transition engine for the playlist space/status lifecycle.
//!
//! Every state change goes through `transition`, which checks the request
//! against an explicit allow-list and performs the write. The legal moves:
//!
//! | from          | action            | to           |
//! |---------------|-------------------|--------------|
//! | (EMS, PTP)    | Promote           | (GMS, PRP)   |
//! | (GMS, PRP)    | Approve           | (PMS, PRP)   |
//! | (GMS, *)      | Reject            | deleted      |
//! | any           | Move(space)       | same status  |
//! | any           | SetStatus(status) | same space   |
//!
//! Promotion also records the score for the evaluating user, in the same
//! transaction as the space/status update.

use crate::playlist_store::{Playlist, PlaylistStore, SpaceType, StatusFlag};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum TransitionAction {
    /// Score-gated move out of EMS. Carries the score to persist for the
    /// evaluating user; callers gate on the promotion threshold.
    Promote {
        score: f64,
        evaluated_by: i64,
        reason: String,
    },
    /// Manual approval of a scored candidate into the owner's space.
    Approve,
    /// Manual rejection of a gateway candidate; deletes the playlist.
    Reject,
    /// Operator escape hatch: move to any space, keeping the status.
    Move(SpaceType),
    /// Operator escape hatch: set any status, keeping the space.
    SetStatus(StatusFlag),
}

impl TransitionAction {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionAction::Promote { .. } => "promote",
            TransitionAction::Approve => "approve",
            TransitionAction::Reject => "reject",
            TransitionAction::Move(_) => "move",
            TransitionAction::SetStatus(_) => "set-status",
        }
    }
}

#[derive(Debug)]
pub enum TransitionOutcome {
    Updated(Playlist),
    Deleted,
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Cannot {action} playlist {id} from ({space}, {status})")]
    InvalidTransition {
        id: i64,
        action: &'static str,
        space: SpaceType,
        status: StatusFlag,
    },

    #[error("Playlist not found: {0}")]
    NotFound(i64),

    #[error("Playlist {0} was changed concurrently, transition not applied")]
    Conflict(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub struct TransitionEngine {
    store: Arc<dyn PlaylistStore>,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn PlaylistStore>) -> Self {
        Self { store }
    }

    pub fn transition(
        &self,
        id: i64,
        action: TransitionAction,
    ) -> Result<TransitionOutcome, TransitionError> {
        let playlist = self
            .store
            .get_playlist(id)?
            .ok_or(TransitionError::NotFound(id))?;
        let from = (playlist.space, playlist.status);

        debug!(
            "Transition requested: playlist {} {} from ({}, {})",
            id,
            action.name(),
            from.0,
            from.1
        );

        match action {
            TransitionAction::Promote {
                score,
                evaluated_by,
                reason,
            } => {
                if from != (SpaceType::Ems, StatusFlag::Ptp) {
                    return Err(self.invalid(id, "promote", from));
                }
                let to = (SpaceType::Gms, StatusFlag::Prp);
                let applied = self
                    .store
                    .promote_with_score(id, from, to, evaluated_by, score, &reason)?;
                if !applied {
                    return Err(TransitionError::Conflict(id));
                }
                info!(
                    "Playlist {} promoted to GMS with score {:.1} (user {})",
                    id, score, evaluated_by
                );
                self.reload(id)
            }
            TransitionAction::Approve => {
                if from != (SpaceType::Gms, StatusFlag::Prp) {
                    return Err(self.invalid(id, "approve", from));
                }
                let to = (SpaceType::Pms, StatusFlag::Prp);
                self.apply_cas(id, from, to)?;
                info!("Playlist {} approved into PMS", id);
                self.reload(id)
            }
            TransitionAction::Reject => {
                if from.0 != SpaceType::Gms {
                    return Err(self.invalid(id, "reject", from));
                }
                if !self.store.delete_playlist(id)? {
                    return Err(TransitionError::NotFound(id));
                }
                info!("Playlist {} rejected and deleted", id);
                Ok(TransitionOutcome::Deleted)
            }
            TransitionAction::Move(space) => {
                let to = (space, from.1);
                self.apply_cas(id, from, to)?;
                self.reload(id)
            }
            TransitionAction::SetStatus(status) => {
                let to = (from.0, status);
                self.apply_cas(id, from, to)?;
                self.reload(id)
            }
        }
    }

    fn apply_cas(
        &self,
        id: i64,
        from: (SpaceType, StatusFlag),
        to: (SpaceType, StatusFlag),
    ) -> Result<(), TransitionError> {
        if self.store.update_space_status(id, from, to)? {
            Ok(())
        } else {
            Err(TransitionError::Conflict(id))
        }
    }

    fn invalid(
        &self,
        id: i64,
        action: &'static str,
        from: (SpaceType, StatusFlag),
    ) -> TransitionError {
        TransitionError::InvalidTransition {
            id,
            action,
            space: from.0,
            status: from.1,
        }
    }

    fn reload(&self, id: i64) -> Result<TransitionOutcome, TransitionError> {
        let playlist = self
            .store
            .get_playlist(id)?
            .ok_or(TransitionError::NotFound(id))?;
        Ok(TransitionOutcome::Updated(playlist))
    }
}
