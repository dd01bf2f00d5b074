//! Adapter settings, read from an optional `polistore` config file and
//! `POLISTORE_*` environment variables.

use serde::Deserialize;

use crate::error::{AdapterError, Result};

pub const DEFAULT_TABLE_NAME: &str = "policy_rule";
pub const DEFAULT_DATABASE: &str = "polistore.db";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the SQLite database file.
    pub database: String,
    /// Name of the policy-rule table.
    pub table_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `polistore.{toml,json,yaml}` in the working
    /// directory (if present), overridden by `POLISTORE_*` environment
    /// variables. Missing keys fall back to the defaults.
    pub fn load() -> Result<Self> {
        let loaded = config::Config::builder()
            .add_source(config::File::with_name("polistore").required(false))
            .add_source(config::Environment::with_prefix("POLISTORE"))
            .build()
            .map_err(|e| AdapterError::Config(e.to_string()))?;
        loaded
            .try_deserialize()
            .map_err(|e| AdapterError::Config(e.to_string()))
    }
}
