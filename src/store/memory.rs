use chrono::{NaiveDateTime, Utc};
use error_stack::{Report, Result};

use super::{StoreError, UserFilter, UserStore};
use crate::models::{NewUser, User, UserId, UserPatch};

/// In-memory [`UserStore`] keeping records in insertion order.
///
/// Failures can be injected to exercise the fatal paths of a run.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Vec<User>,
    next_id: i64,
    unreachable: bool,
    failing_update: Option<UserId>,
    failing_create: bool,
    writes: usize,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query and write fails as if the store cannot be reached.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Inserts a record as-is, keeping its verification fields
    /// exactly as given (legacy records included). The id is
    /// reassigned by the store.
    pub fn seed(&mut self, mut user: User) -> UserId {
        self.next_id += 1;
        user.id = UserId(self.next_id);
        self.users.push(user);
        UserId(self.next_id)
    }

    pub fn fail_update_for(&mut self, id: UserId) {
        self.failing_update = Some(id);
    }

    pub fn fail_creates(&mut self) {
        self.failing_create = true;
    }

    pub fn clear_failures(&mut self) {
        self.unreachable = false;
        self.failing_update = None;
        self.failing_create = false;
    }

    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|v| v.id == id)
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Amount of successful updates and inserts so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    fn ensure_reachable(&self, context: StoreError) -> Result<(), StoreError> {
        if self.unreachable {
            Err(Report::new(context).attach_printable("store is unreachable"))
        } else {
            Ok(())
        }
    }
}

impl UserStore for MemoryUserStore {
    async fn find(&mut self, filter: UserFilter) -> Result<Vec<User>, StoreError> {
        self.ensure_reachable(StoreError::Query)?;
        Ok(self
            .users
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect())
    }

    async fn find_one(&mut self, filter: UserFilter) -> Result<Option<User>, StoreError> {
        self.ensure_reachable(StoreError::Query)?;
        Ok(self.users.iter().find(|v| filter.matches(v)).cloned())
    }

    async fn update_partial(&mut self, id: UserId, patch: &UserPatch) -> Result<User, StoreError> {
        self.ensure_reachable(StoreError::Persist)?;
        if self.failing_update == Some(id) {
            return Err(Report::new(StoreError::Persist).attach_printable("injected update failure"));
        }

        let now = Self::now();
        let user = self
            .users
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| {
                Report::new(StoreError::Persist).attach_printable(format!("user {id} does not exist"))
            })?;

        if let Some(is_verified) = patch.is_verified {
            user.is_verified = Some(is_verified);
        }
        if let Some(status) = patch.verification_status {
            user.verification_status = Some(status.as_str().to_string());
        }
        user.updated_at = Some(now);

        self.writes += 1;
        Ok(user.clone())
    }

    async fn create(&mut self, user: &NewUser) -> Result<User, StoreError> {
        self.ensure_reachable(StoreError::Persist)?;
        if self.failing_create {
            return Err(Report::new(StoreError::Persist).attach_printable("injected create failure"));
        }

        self.next_id += 1;
        let created = User {
            id: UserId(self.next_id),
            created_at: Self::now(),
            updated_at: None,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            is_verified: Some(user.is_verified),
            verification_status: Some(user.verification_status.as_str().to_string()),
            verified_by: None,
            verification_date: user.verification_date,
            verification_notes: user.verification_notes.clone(),
        };

        self.users.push(created.clone());
        self.writes += 1;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, VerificationStatus};
    use crate::util::sensitive::Sensitive;

    fn legacy(role: Role) -> User {
        User {
            id: UserId(0),
            created_at: NaiveDateTime::default(),
            updated_at: None,
            name: "legacy".into(),
            email: "legacy@x.com".into(),
            password_hash: Sensitive::new("hash".into()),
            role,
            is_verified: None,
            verification_status: None,
            verified_by: None,
            verification_date: None,
            verification_notes: Some("keep me".into()),
        }
    }

    #[tokio::test]
    async fn update_partial_only_touches_staged_fields() {
        let mut store = MemoryUserStore::new();
        let id = store.seed(legacy(Role::Student));

        let patch = UserPatch {
            is_verified: Some(false),
            verification_status: None,
        };
        let user = store.update_partial(id, &patch).await.unwrap();

        assert_eq!(user.is_verified, Some(false));
        assert_eq!(user.verification_status, None);
        assert_eq!(user.verification_notes.as_deref(), Some("keep me"));
        assert!(user.updated_at.is_some());
        assert_eq!(store.writes(), 1);

        let patch = UserPatch {
            is_verified: None,
            verification_status: Some(VerificationStatus::Pending),
        };
        let user = store.update_partial(id, &patch).await.unwrap();
        assert_eq!(user.is_verified, Some(false));
        assert_eq!(user.verification_status.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn find_respects_filter_and_order() {
        let mut store = MemoryUserStore::new();
        let a = store.seed(legacy(Role::Student));
        store.seed(legacy(Role::Company));
        let c = store.seed(legacy(Role::Student));

        let students = store.find(UserFilter::Role(Role::Student)).await.unwrap();
        let ids = students.iter().map(|v| v.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![a, c]);

        assert!(store
            .find_one(UserFilter::Role(Role::Faculty))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.find(UserFilter::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unreachable_store_fails_everything() {
        let mut store = MemoryUserStore::unreachable();
        let report = store.find(UserFilter::All).await.unwrap_err();
        assert_eq!(report.current_context(), &StoreError::Query);

        let report = store
            .update_partial(UserId(1), &UserPatch::default())
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &StoreError::Persist);
    }

    #[tokio::test]
    async fn update_of_missing_user_fails() {
        let mut store = MemoryUserStore::new();
        let result = store.update_partial(UserId(42), &UserPatch::default()).await;
        assert!(result.is_err());
        assert_eq!(store.writes(), 0);
    }
}
