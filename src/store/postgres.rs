use error_stack::{Result, ResultExt};
use sqlx::{Postgres, QueryBuilder};

use super::{StoreError, UserFilter, UserStore};
use crate::database::{ErrorExt, PoolConnection};
use crate::models::{NewUser, User, UserId, UserPatch};

/// [`UserStore`] backed by the `users` table, using a single
/// pooled connection for the whole run.
#[derive(Debug)]
pub struct PgUserStore {
    conn: PoolConnection,
}

impl PgUserStore {
    #[must_use]
    pub fn new(conn: PoolConnection) -> Self {
        Self { conn }
    }

    fn select(filter: UserFilter) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(r#"SELECT * FROM "users""#);
        if let UserFilter::Role(role) = filter {
            query.push(" WHERE role = ").push_bind(role.as_str());
        }
        query
    }
}

impl UserStore for PgUserStore {
    #[tracing::instrument(skip(self), name = "db.query.users.find")]
    async fn find(&mut self, filter: UserFilter) -> Result<Vec<User>, StoreError> {
        let mut query = Self::select(filter);
        query.push(" ORDER BY id");
        query
            .build_query_as::<User>()
            .fetch_all(&mut *self.conn)
            .await
            .into_db_error()
            .change_context(StoreError::Query)
    }

    #[tracing::instrument(skip(self), name = "db.query.users.find_one")]
    async fn find_one(&mut self, filter: UserFilter) -> Result<Option<User>, StoreError> {
        let mut query = Self::select(filter);
        query.push(" ORDER BY id LIMIT 1");
        query
            .build_query_as::<User>()
            .fetch_optional(&mut *self.conn)
            .await
            .into_db_error()
            .change_context(StoreError::Query)
    }

    #[tracing::instrument(skip(self, patch), name = "db.query.users.update_partial")]
    async fn update_partial(&mut self, id: UserId, patch: &UserPatch) -> Result<User, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"UPDATE "users" SET updated_at = (now() AT TIME ZONE 'utc')"#,
        );
        if let Some(is_verified) = patch.is_verified {
            query.push(", is_verified = ").push_bind(is_verified);
        }
        if let Some(status) = patch.verification_status {
            query.push(", verification_status = ").push_bind(status.as_str());
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING *");

        query
            .build_query_as::<User>()
            .fetch_one(&mut *self.conn)
            .await
            .into_db_error()
            .change_context(StoreError::Persist)
            .attach_printable_lazy(|| format!("user id: {id}"))
    }

    #[tracing::instrument(skip_all, name = "db.query.users.insert")]
    async fn create(&mut self, user: &NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO "users" (
                name, email, password_hash, role, is_verified,
                verification_status, verification_date, verification_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .bind(user.is_verified)
        .bind(user.verification_status.as_str())
        .bind(user.verification_date)
        .bind(&user.verification_notes)
        .fetch_one(&mut *self.conn)
        .await
        .into_db_error()
        .change_context(StoreError::Persist)
    }
}
