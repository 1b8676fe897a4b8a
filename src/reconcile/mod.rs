//! One-shot repair of the verification state of student records,
//! followed by the faculty existence check.
//!
//! Everything runs sequentially against the injected [`UserStore`].
//! Nothing is retried and there is no rollback: any failure aborts
//! the run with earlier writes left in place, which is fine since a
//! re-run skips records that are already compliant.
use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::info;

use crate::models::Role;
use crate::store::UserStore;

mod bootstrap;
mod scan;
mod snapshot;
mod verification;

pub use bootstrap::{
    default_faculty, ensure_faculty, BootstrapError, BootstrapOutcome, DEFAULT_FACULTY_EMAIL,
    DEFAULT_FACULTY_NAME,
};
pub use scan::{scan, ScanError};
pub use snapshot::{snapshot, SnapshotRow};
pub use verification::{compute_delta, reconcile, RecordUpdate, ReconcileError, ReconcileReport};

#[derive(Debug, Error)]
#[error("Failed to run reconciliation")]
pub struct RunError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reconcile: ReconcileReport,
    pub bootstrap: BootstrapOutcome,
    pub snapshot: Vec<SnapshotRow>,
}

impl RunSummary {
    /// Total amount of writes performed by the run.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.reconcile.updated.len() + usize::from(self.bootstrap.is_created())
    }

    pub fn log(&self) {
        for row in &self.snapshot {
            info!(
                id = %row.id,
                role = %row.role,
                email = %row.email,
                verification_status = row.verification_status.as_deref().unwrap_or("<absent>"),
                is_verified = ?row.is_verified,
                "snapshot"
            );
        }

        info!(
            scanned = self.reconcile.scanned,
            updated = self.reconcile.updated.len(),
            compliant = self.reconcile.compliant(),
            faculty_created = self.bootstrap.is_created(),
            "reconciliation finished"
        );
    }
}

/// Scans every student, repairs missing verification fields and then
/// makes sure a faculty record exists.
#[tracing::instrument(skip_all, name = "reconcile.run")]
pub async fn run<S: UserStore>(store: &mut S) -> Result<RunSummary, RunError> {
    let students = scan(store, Role::Student).await.change_context(RunError)?;
    let reconcile = reconcile(store, &students).await.change_context(RunError)?;
    let bootstrap = ensure_faculty(store).await.change_context(RunError)?;
    let snapshot = snapshot(store).await.change_context(RunError)?;

    Ok(RunSummary {
        reconcile,
        bootstrap,
        snapshot,
    })
}
