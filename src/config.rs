use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::{self, ConfigError};
use crate::store::{StorageKeys, DEFAULT_POLLS_KEY, DEFAULT_VOTES_KEY};

pub struct Config {
    pub port: u16,
    pub storage_dir: PathBuf,
    pub keys: StorageKeys,
}

impl Config {
    /// Reads the process environment, after loading a `.env` file if present.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded: {e}");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load(&lookup, "POLL_PORT", "3000")?,
            storage_dir: try_load(&lookup, "POLL_STORAGE_DIR", "./poll-data")?,
            keys: StorageKeys {
                polls: try_load(&lookup, "POLL_POLLS_KEY", DEFAULT_POLLS_KEY)?,
                votes: try_load(&lookup, "POLL_VOTES_KEY", DEFAULT_VOTES_KEY)?,
            },
        })
    }
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value {raw:?}: {e}");
        error::config_invalid(key, e)
    })
}
