use chrono::{NaiveDateTime, Utc};
use error_stack::{Result, ResultExt};
use sha2::{Digest, Sha512};
use thiserror::Error;
use tracing::info;

use crate::models::{NewUser, Role, User, VerificationStatus};
use crate::store::{UserFilter, UserStore};
use crate::util::sensitive::Sensitive;

#[derive(Debug, Error)]
#[error("Failed to bootstrap a faculty account")]
pub struct BootstrapError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A faculty record was already there, nothing was written.
    Existing(User),
    Created(User),
}

impl BootstrapOutcome {
    #[must_use]
    pub fn user(&self) -> &User {
        match self {
            Self::Existing(user) | Self::Created(user) => user,
        }
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(..))
    }
}

pub const DEFAULT_FACULTY_NAME: &str = "Default Faculty";
pub const DEFAULT_FACULTY_EMAIL: &str = "faculty@campus.local";

const PLACEHOLDER_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Operator-provisioned faculty account. It is approved and verified
/// up front so it can be used without going through review.
#[must_use]
pub fn default_faculty(now: NaiveDateTime) -> NewUser {
    NewUser {
        name: DEFAULT_FACULTY_NAME.to_string(),
        email: DEFAULT_FACULTY_EMAIL.to_string(),
        password_hash: placeholder_password_hash(),
        role: Role::Faculty,
        is_verified: true,
        verification_status: VerificationStatus::Approved,
        verification_date: Some(now),
        verification_notes: Some("Provisioned automatically by verifix".to_string()),
    }
}

/// A hash-shaped value that no password can ever match. The leading
/// `!` marks the account as locked until an operator resets it.
fn placeholder_password_hash() -> Sensitive<String> {
    let seed = random_string::generate(64, PLACEHOLDER_CHARSET);
    let mut hasher = Sha512::default();
    hasher.update(seed.as_bytes());
    Sensitive::new(format!("!{}", hex::encode(hasher.finalize())))
}

/// Makes sure at least one faculty record exists, creating the
/// default one only if none is found.
#[tracing::instrument(skip_all)]
pub async fn ensure_faculty<S: UserStore>(store: &mut S) -> Result<BootstrapOutcome, BootstrapError> {
    let existing = store
        .find_one(UserFilter::Role(Role::Faculty))
        .await
        .change_context(BootstrapError)
        .attach_printable("could not look up faculty records")?;

    if let Some(user) = existing {
        info!(id = %user.id, email = %user.email, "faculty record already exists");
        return Ok(BootstrapOutcome::Existing(user));
    }

    info!("no faculty record found, creating {DEFAULT_FACULTY_EMAIL}");
    let user = store
        .create(&default_faculty(Utc::now().naive_utc()))
        .await
        .change_context(BootstrapError)
        .attach_printable("could not create the default faculty record")?;

    info!(id = %user.id, email = %user.email, "created default faculty record");
    Ok(BootstrapOutcome::Created(user))
}
