use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{User, UserId, UserPatch, VerificationStatus};
use crate::store::UserStore;

#[derive(Debug, Error)]
#[error("Failed to reconcile verification state")]
pub struct ReconcileError;

/// A record that needed (and got) a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub id: UserId,
    pub email: String,
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub updated: Vec<RecordUpdate>,
}

impl ReconcileReport {
    #[must_use]
    pub fn compliant(&self) -> usize {
        self.scanned - self.updated.len()
    }
}

/// Smallest update that gives the record a verification state.
///
/// Only missing values are staged: an explicit `false` or any
/// non-empty status is left alone.
#[must_use]
pub fn compute_delta(user: &User) -> UserPatch {
    let mut patch = UserPatch::default();
    if user.is_verified.is_none() {
        patch.is_verified = Some(false);
    }
    if user.is_verification_status_missing() {
        patch.verification_status = Some(VerificationStatus::Pending);
    }
    patch
}

/// Applies [`compute_delta`] to every record in order. The first
/// failing update aborts the pass; earlier updates stay applied.
#[tracing::instrument(skip_all, fields(records = users.len()))]
pub async fn reconcile<S: UserStore>(
    store: &mut S,
    users: &[User],
) -> Result<ReconcileReport, ReconcileError> {
    let mut report = ReconcileReport {
        scanned: users.len(),
        updated: Vec::new(),
    };

    for user in users {
        let patch = compute_delta(user);
        if patch.is_empty() {
            debug!(id = %user.id, email = %user.email, "already compliant");
            continue;
        }

        let fields = patch.fields();
        info!(id = %user.id, email = %user.email, ?fields, "repairing verification state");

        store
            .update_partial(user.id, &patch)
            .await
            .change_context(ReconcileError)
            .attach_printable_lazy(|| format!("user id: {}", user.id))?;

        report.updated.push(RecordUpdate {
            id: user.id,
            email: user.email.clone(),
            fields,
        });
    }

    Ok(report)
}
