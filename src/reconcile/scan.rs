use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::debug;

use crate::models::{Role, User};
use crate::store::{UserFilter, UserStore};

#[derive(Debug, Error)]
#[error("Failed to scan user records")]
pub struct ScanError;

/// Loads every record with the given role at once.
#[tracing::instrument(skip(store))]
pub async fn scan<S: UserStore>(store: &mut S, role: Role) -> Result<Vec<User>, ScanError> {
    let users = store
        .find(UserFilter::Role(role))
        .await
        .change_context(ScanError)
        .attach_printable_lazy(|| format!("role: {role}"))?;

    debug!(count = users.len(), "scanned {role} records");
    Ok(users)
}
