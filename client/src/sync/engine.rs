//! The pass runner.
//!
//! A pass moves through `Idle → Scanning → Replaying → Committing → Idle`,
//! or `Replaying → Failed → Idle` on the first remote error. Statuses are
//! cleared only in `Committing`, so a failed pass leaves every pending row
//! exactly as it found it and can simply be run again. The commit touches
//! only the rows captured by the scan; edits made while the pass replays
//! are picked up by the next one.

use super::{PassState, SyncError, SyncReport};
use crate::remote::{AuthToken, RemoteClient, RemoteError};
use crate::store::LocalStore;
use chrono::Utc;
use reviewsync_engine::{DeleteReplay, ReplayStep, StepCounts, SyncPlan};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Instrument;
use uuid::Uuid;

/// Replays pending changes from a [`LocalStore`] through a [`RemoteClient`].
///
/// The engine holds no timer; callers trigger passes (on reconnect, on
/// resume). At most one pass or pull runs at a time per engine.
pub struct SyncEngine {
    store: LocalStore,
    remote: Arc<dyn RemoteClient>,
    token: AuthToken,
    delete_replay: DeleteReplay,
    state: Mutex<PassState>,
}

/// Single-flight guard; returns the engine to `Idle` when dropped, including
/// when the pass future is dropped mid-flight.
struct PassGuard<'a> {
    state: &'a Mutex<PassState>,
}

impl<'a> PassGuard<'a> {
    fn acquire(state: &'a Mutex<PassState>) -> Option<Self> {
        let mut current = lock(state);
        if *current != PassState::Idle {
            return None;
        }
        *current = PassState::Scanning;
        Some(Self { state })
    }

    fn enter(&self, next: PassState) {
        *lock(self.state) = next;
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = PassState::Idle;
    }
}

fn lock(state: &Mutex<PassState>) -> MutexGuard<'_, PassState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SyncEngine {
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteClient>, token: AuthToken) -> Self {
        Self {
            store,
            remote,
            token,
            delete_replay: DeleteReplay::default(),
            state: Mutex::new(PassState::Idle),
        }
    }

    /// Choose how reviews marked for deletion are replayed.
    pub fn with_delete_replay(mut self, policy: DeleteReplay) -> Self {
        self.delete_replay = policy;
        self
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn delete_replay(&self) -> DeleteReplay {
        self.delete_replay
    }

    /// Current state of the running pass, `Idle` if none.
    pub fn state(&self) -> PassState {
        *lock(&self.state)
    }

    /// Run one sync pass now.
    pub async fn run_pass(&self) -> Result<SyncReport, SyncError> {
        let guard = PassGuard::acquire(&self.state).ok_or(SyncError::AlreadyRunning)?;
        let pass_id = Uuid::new_v4();

        self.execute_pass(&guard, pass_id)
            .instrument(tracing::info_span!("sync_pass", %pass_id))
            .await
    }

    /// Run one sync pass and report the outcome through callbacks.
    pub async fn sync_pending_changes<S, F>(&self, on_success: S, on_failure: F)
    where
        S: FnOnce(&SyncReport),
        F: FnOnce(&SyncError),
    {
        match self.run_pass().await {
            Ok(report) => on_success(&report),
            Err(err) => on_failure(&err),
        }
    }

    /// Replace the local store with the server's reviews.
    ///
    /// Refused while any review has unsynced changes, since the reload would
    /// discard them. Returns the number of reviews stored.
    pub async fn pull_all(&self) -> Result<usize, SyncError> {
        let guard = PassGuard::acquire(&self.state).ok_or(SyncError::AlreadyRunning)?;

        let pending = self.store.pending_count().await;
        if pending > 0 {
            tracing::info!(pending, "pull refused, push pending changes first");
            return Err(SyncError::PendingChanges(pending));
        }

        guard.enter(PassState::Replaying);
        let reviews = match self.remote.fetch_reviews(&self.token).await {
            Ok(reviews) => reviews,
            Err(source) => {
                guard.enter(PassState::Failed);
                tracing::warn!(error = %source, "pull failed");
                return Err(SyncError::Remote {
                    step_index: 0,
                    step: "fetch reviews".to_string(),
                    source,
                });
            }
        };

        guard.enter(PassState::Committing);
        self.store.replace_all(&reviews).await;
        tracing::info!(reviews = reviews.len(), "local store replaced from server");

        Ok(reviews.len())
    }

    async fn execute_pass(
        &self,
        guard: &PassGuard<'_>,
        pass_id: Uuid,
    ) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();

        let scan = self.store.scan_pending().await;
        let plan = SyncPlan::build(scan.pending(), self.delete_replay);
        tracing::info!(
            pending_reviews = scan.len(),
            steps = plan.len(),
            "scanned pending changes"
        );

        guard.enter(PassState::Replaying);
        let mut counts = StepCounts::default();
        for (step_index, step) in plan.steps().iter().enumerate() {
            tracing::debug!(step_index, %step, "replaying");
            if let Err(source) = self.replay(step).await {
                guard.enter(PassState::Failed);
                tracing::warn!(
                    step_index,
                    %step,
                    error = %source,
                    "sync pass aborted, pending changes kept"
                );
                return Err(SyncError::Remote {
                    step_index,
                    step: step.to_string(),
                    source,
                });
            }
            counts.record(step);
        }

        if !scan.is_empty() {
            guard.enter(PassState::Committing);
            self.store.commit_sync_pass(&scan, plan.deleted_reviews()).await;
        }

        let report = SyncReport {
            pass_id,
            pending_reviews: scan.len(),
            counts,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            reviews_pushed = counts.reviews_pushed,
            photos_uploaded = counts.photos_uploaded,
            photos_deleted = counts.photos_deleted,
            reviews_deleted = counts.reviews_deleted,
            "sync pass committed"
        );

        Ok(report)
    }

    async fn replay(&self, step: &ReplayStep) -> Result<(), RemoteError> {
        match step {
            ReplayStep::PushReview(update) => {
                let confirmed = self.remote.push_review_update(update, &self.token).await?;
                if confirmed != update.review_id {
                    tracing::warn!(
                        local = update.review_id,
                        remote = confirmed,
                        "server confirmed a different review id"
                    );
                }
                Ok(())
            }
            ReplayStep::UploadPhoto { review_id, uri } => {
                self.remote.upload_photo(*review_id, uri, &self.token).await
            }
            ReplayStep::DeletePhoto {
                review_id,
                photo_id,
            } => {
                self.remote
                    .delete_photo(*review_id, *photo_id, &self.token)
                    .await
            }
            ReplayStep::DeleteReview { review_id } => {
                self.remote.delete_review(*review_id, &self.token).await
            }
        }
    }
}
