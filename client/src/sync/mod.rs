//! Sync engine - replays pending local changes against the review service.

mod engine;

pub use engine::SyncEngine;

use crate::remote::RemoteError;
use chrono::{DateTime, Utc};
use reviewsync_engine::StepCounts;
use serde::Serialize;
use uuid::Uuid;

/// Where the engine is in the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PassState {
    #[default]
    Idle,
    Scanning,
    Replaying,
    Committing,
    Failed,
}

/// Summary of a successful pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub pass_id: Uuid,
    /// Pending reviews found by the scan
    pub pending_reviews: usize,
    pub counts: StepCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// Whether the pass made any remote call.
    pub fn is_noop(&self) -> bool {
        self.counts.total() == 0
    }
}

/// Why a pass did not commit.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("A sync pass is already running")]
    AlreadyRunning,

    #[error("Remote call failed at step {step_index} ({step}): {source}")]
    Remote {
        step_index: usize,
        step: String,
        #[source]
        source: RemoteError,
    },

    #[error("{0} reviews have unsynced local changes")]
    PendingChanges(u64),
}

impl SyncError {
    /// The remote error that aborted the pass, if any.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            SyncError::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}
