use chrono::NaiveDateTime;
use sqlx::FromRow;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

use super::id::UserId;
use crate::util::sensitive::Sensitive;

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub password_hash: Sensitive<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_verified: Option<bool>,
    /// Raw stored value. Absent and empty are both considered missing
    /// while any other value (even one [`VerificationStatus`] does not
    /// recognize) counts as present.
    pub verification_status: Option<String>,
    pub verified_by: Option<UserId>,
    pub verification_date: Option<NaiveDateTime>,
    pub verification_notes: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_verification_status_missing(&self) -> bool {
        self.verification_status
            .as_deref()
            .map_or(true, str::is_empty)
    }

    /// Parsed verification status, if present and recognized.
    #[must_use]
    pub fn verification_status(&self) -> Option<VerificationStatus> {
        self.verification_status
            .as_deref()
            .and_then(|v| VerificationStatus::from_str(v).ok())
    }
}

/// Fields written when inserting a brand new user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Sensitive<String>,
    pub role: Role,
    pub is_verified: bool,
    pub verification_status: VerificationStatus,
    pub verification_date: Option<NaiveDateTime>,
    pub verification_notes: Option<String>,
}

/// Partial update of a user's verification state. Fields left as
/// `None` are not written at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub is_verified: Option<bool>,
    pub verification_status: Option<VerificationStatus>,
}

impl UserPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_verified.is_none() && self.verification_status.is_none()
    }

    /// Column names of the staged fields, in write order.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(2);
        if self.is_verified.is_some() {
            fields.push("is_verified");
        }
        if self.verification_status.is_some() {
            fields.push("verification_status");
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Faculty,
    Company,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Company => "company",
            Self::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown {0:?} user role")]
pub struct InvalidRole(String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "company" => Ok(Self::Company),
            "admin" => Ok(Self::Admin),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = InvalidRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown {0:?} verification status")]
pub struct InvalidVerificationStatus(String);

impl FromStr for VerificationStatus {
    type Err = InvalidVerificationStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(InvalidVerificationStatus(s.to_string())),
        }
    }
}
