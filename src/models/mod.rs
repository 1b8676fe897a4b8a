mod id;
pub mod user;

pub use id::UserId;
pub use user::{NewUser, Role, User, UserPatch, VerificationStatus};
