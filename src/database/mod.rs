use error_stack::{Report, ResultExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::{str::FromStr, time::Duration};

use crate::config;

mod error;
pub use error::*;

pub type PoolConnection = sqlx::pool::PoolConnection<sqlx::Postgres>;

#[derive(Clone)]
pub struct Pool {
    pool: sqlx::PgPool,
}

impl Pool {
    /// Builds the pool and waits for the first connection. An
    /// unreachable database fails here, before any work is done.
    #[tracing::instrument(name = "db.pool.new", skip_all)]
    pub async fn new(cfg: &config::Database) -> Result<Self> {
        let pool_opts = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(cfg.timeout_secs.get()))
            .max_connections(cfg.pool_size.get());

        let mut connect_opts =
            PgConnectOptions::from_str(cfg.url.as_str()).change_context(Error::InvalidUrl)?;

        if cfg.enforce_tls {
            connect_opts = connect_opts.ssl_mode(PgSslMode::Require);
        }

        let pool = Self {
            pool: pool_opts.connect_lazy_with(connect_opts),
        };
        pool.wait_until_healthy().await?;

        Ok(pool)
    }

    #[must_use]
    pub fn from_pg_pool(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.pool.fmt(f)
    }
}

impl Pool {
    #[tracing::instrument(name = "db.connect", skip(self))]
    pub async fn get(&self) -> Result<PoolConnection> {
        if let Some(inner) = self.pool.try_acquire() {
            Ok(inner)
        } else {
            self.pool
                .acquire()
                .await
                .map_err(|e| Report::new(Error::Internal(e)))
                .change_context(Error::UnhealthyPool)
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn wait_until_healthy(&self) -> Result<()> {
        match self.pool.acquire().await {
            Ok(..) => Ok(()),
            Err(e) => Err(Report::new(Error::Internal(e)).change_context(Error::UnhealthyPool)),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
