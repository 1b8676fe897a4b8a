use serde::Deserialize;
use std::fmt::{Debug, Display};

/// Keeps the raw sensitive data in memory but it cannot be
/// accidentally leaked through the console or logs.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> Debug for Sensitive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("<hidden>").finish()
    }
}

impl<T> Display for Sensitive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("<hidden>").finish()
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: AsRef<str>> Sensitive<T> {
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}
