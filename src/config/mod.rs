use error_stack::{Report, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::util::figment::FigmentErrorAttachable;

mod database;
mod logging;

pub use database::Database;
pub use logging::{InvalidLoggingStyle, Logging, LoggingStyle};

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub db: Database,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load() -> Result<Self, ParseError> {
        dotenvy::dotenv().ok();
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &figment::Figment) -> Result<Self, ParseError> {
        let config = figment
            .extract::<Self>()
            .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

        config.db.validate()?;
        Ok(config)
    }
}

impl Config {
    const DEFAULT_CONFIG_FILE: &'static str = "verifix.toml";

    /// Creates a default [`Figment`](figment::Figment) object to load
    /// the configuration from `verifix.toml` and environment variables.
    pub fn figment() -> figment::Figment {
        use figment::{
            providers::{Env, Format, Toml},
            Figment,
        };

        Figment::new()
            .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
            // Field names with underscores in them have to be mapped
            // by hand, everything else is nested by `_`.
            .merge(Env::prefixed("VERIFIX_").map(|v| {
                match v.as_str().to_ascii_uppercase().as_str() {
                    "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),
                    "DB_POOL_SIZE" => "db.pool_size".into(),
                    "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
                    _ => v.as_str().replace('_', ".").into(),
                }
            }))
            // Environment variable aliases
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "db.url".into()))
    }
}
