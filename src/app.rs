use error_stack::{Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::{config::Config, database, store::PgUserStore};

#[derive(Debug, Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub db: database::Pool,
}

#[derive(Debug, Error)]
#[error("Failed to connect to the user store")]
pub struct AppError;

impl App {
    #[tracing::instrument(skip_all)]
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let db = database::Pool::new(&config.db)
            .await
            .change_context(AppError)?;

        Ok(Self {
            config: Arc::new(config),
            db,
        })
    }

    #[tracing::instrument(skip_all)]
    pub async fn user_store(&self) -> Result<PgUserStore, AppError> {
        let conn = self.db.get().await.change_context(AppError)?;
        Ok(PgUserStore::new(conn))
    }
}
