use error_stack::{Result, ResultExt};

use super::scan::ScanError;
use crate::models::{Role, UserId};
use crate::store::{UserFilter, UserStore};

/// What gets reported about each record once a run is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub id: UserId,
    pub role: Role,
    pub email: String,
    pub verification_status: Option<String>,
    pub is_verified: Option<bool>,
}

#[tracing::instrument(skip_all)]
pub async fn snapshot<S: UserStore>(store: &mut S) -> Result<Vec<SnapshotRow>, ScanError> {
    let users = store
        .find(UserFilter::All)
        .await
        .change_context(ScanError)
        .attach_printable("could not take a snapshot of all records")?;

    Ok(users
        .into_iter()
        .map(|v| SnapshotRow {
            id: v.id,
            role: v.role,
            email: v.email,
            verification_status: v.verification_status,
            is_verified: v.is_verified,
        })
        .collect())
}
