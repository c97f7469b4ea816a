use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SqlCommandError;

/// Options for opening one `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Database file path, or `:memory:`
    pub db_path: String,
    /// Busy timeout applied when a command carries no timeout of its own
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Stored procedures: name -> SQL body
    #[serde(default)]
    pub procedures: BTreeMap<String, String>,
}

impl ConnectionOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout_ms: None,
            procedures: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = Some(busy_timeout_ms);
        self
    }

    #[must_use]
    pub fn with_procedure(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.procedures.insert(name.into(), body.into());
        self
    }
}

/// Fluent builder for `ConnectionOptions`.
#[derive(Debug, Clone)]
pub struct ConnectionOptionsBuilder {
    opts: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: ConnectionOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.opts.busy_timeout_ms = Some(busy_timeout_ms);
        self
    }

    #[must_use]
    pub fn procedure(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.opts.procedures.insert(name.into(), body.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionOptions {
        self.opts
    }
}

/// Named connection configurations, looked up by key.
///
/// ```rust
/// use sql_command_builder::prelude::*;
///
/// let settings = ConnectionSettings::from_json_str(
///     r#"{ "connections": { "main": { "db_path": ":memory:" } } }"#,
/// )
/// .unwrap();
/// assert_eq!(settings.get("main").unwrap().db_path, ":memory:");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub connections: HashMap<String, ConnectionOptions>,
}

impl ConnectionSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, options: ConnectionOptions) {
        self.connections.insert(name.into(), options);
    }

    #[must_use]
    pub fn with_connection(mut self, name: impl Into<String>, options: ConnectionOptions) -> Self {
        self.insert(name, options);
        self
    }

    /// Resolve a named configuration.
    ///
    /// # Errors
    /// Returns `SqlCommandError::ConfigError` if no configuration has that name.
    pub fn get(&self, name: &str) -> Result<&ConnectionOptions, SqlCommandError> {
        self.connections.get(name).ok_or_else(|| {
            SqlCommandError::ConfigError(format!("no connection configuration named `{name}`"))
        })
    }

    /// Parse settings from JSON.
    ///
    /// # Errors
    /// Returns `SqlCommandError::Json` if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, SqlCommandError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    ///
    /// # Errors
    /// Returns `SqlCommandError::Io` if the file cannot be read, or
    /// `SqlCommandError::Json` if it is malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlCommandError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
