use error_stack::Report;
use thiserror::Error;

/// Database related errors
#[derive(Debug, Error)]
pub enum Error {
    /// The configured Postgres connection url could not be parsed.
    #[error("invalid connection url")]
    InvalidUrl,
    /// An error caused by an [`sqlx`] error.
    #[error("received a pool error: {0}")]
    Internal(sqlx::Error),
    /// The database is currently in read mode (most likely due
    /// to maintenance) and should not perform any writes.
    #[error("database is currently in read mode")]
    Readonly,
    /// The pool could not establish a reliable connection
    /// to the database.
    #[error("unhealthy database pool")]
    UnhealthyPool,
}

/// Converts from a generic [sqlx] result into a [database compatible error](Error).
pub trait ErrorExt<T> {
    fn into_db_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, sqlx::Error> {
    fn into_db_error(self) -> Result<T> {
        self.map_err(|e| match &e {
            sqlx::Error::Database(err) if err.message().ends_with("read-only transaction") => {
                Report::new(e).change_context(Error::Readonly)
            }
            _ => Report::new(Error::Internal(e)),
        })
    }
}

/// Lazily typed [`std::result::Result`] but the error generic
/// is filled up with [a database error](Error).
pub type Result<T> = error_stack::Result<T, Error>;

/// Inspects an `error_stack::Report` without matching on
/// the downcasted [`Error`] by hand.
pub trait ErrorExt2 {
    fn is_unhealthy(&self) -> bool;
    fn is_readonly(&self) -> bool;
}

impl<C> ErrorExt2 for Report<C> {
    fn is_unhealthy(&self) -> bool {
        self.downcast_ref::<Error>()
            .is_some_and(|v| matches!(v, Error::UnhealthyPool))
    }

    fn is_readonly(&self) -> bool {
        self.downcast_ref::<Error>()
            .is_some_and(|v| matches!(v, Error::Readonly))
    }
}
