//! Narrow interface to the backing store of user records.
//!
//! Components never hold on to a global connection. They receive a
//! [`UserStore`] handle and only talk to the store through it.
use error_stack::Result;
use thiserror::Error;

use crate::models::{NewUser, Role, User, UserId, UserPatch};

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A scan or lookup could not be performed.
    #[error("could not query user records")]
    Query,
    /// An update or insert could not be persisted.
    #[error("could not persist user record")]
    Persist,
}

/// Which records a query should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFilter {
    All,
    Role(Role),
}

impl UserFilter {
    #[must_use]
    pub fn matches(self, user: &User) -> bool {
        match self {
            Self::All => true,
            Self::Role(role) => user.role == role,
        }
    }
}

pub trait UserStore {
    /// Every record matching the filter, in insertion order.
    async fn find(&mut self, filter: UserFilter) -> Result<Vec<User>, StoreError>;

    /// Any single record matching the filter.
    async fn find_one(&mut self, filter: UserFilter) -> Result<Option<User>, StoreError>;

    /// Writes only the staged fields of `patch` and returns the
    /// updated record.
    async fn update_partial(&mut self, id: UserId, patch: &UserPatch) -> Result<User, StoreError>;

    async fn create(&mut self, user: &NewUser) -> Result<User, StoreError>;
}
