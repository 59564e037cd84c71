use serde::Deserialize;

use crate::config::ConnectionOptions;
use crate::connection::Connection;
use crate::error::StatementError;
use crate::fetch_mode::FetchMode;

use super::native::SqliteNative;

/// Statement layer over a single rusqlite connection.
pub type SqliteConnection = Connection<SqliteNative>;

/// Options for opening a `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteOptions {
    /// File path, or `:memory:`.
    pub db_path: String,
    /// Switch the database to WAL journaling on open.
    #[serde(default = "default_wal")]
    pub wal: bool,
    #[serde(default)]
    pub connection: ConnectionOptions,
}

fn default_wal() -> bool {
    true
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            wal: default_wal(),
            connection: ConnectionOptions::default(),
        }
    }

    /// Parse options from a JSON document such as
    /// `{"db_path": "app.db", "connection": {"default_fetch_mode": "assoc"}}`.
    ///
    /// # Errors
    ///
    /// Returns `StatementError::ConfigError` if the document does not describe valid options.
    pub fn from_json(json: &str) -> Result<Self, StatementError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Open the database and wrap it in a [`SqliteConnection`].
    ///
    /// # Errors
    ///
    /// Returns `StatementError::ConnectionError` if the file cannot be opened, or
    /// `StatementError::SqliteError` if the journal mode cannot be switched.
    pub fn open(self) -> Result<SqliteConnection, StatementError> {
        let conn = rusqlite::Connection::open(&self.db_path).map_err(|e| {
            StatementError::ConnectionError(format!(
                "Failed to open SQLite database {}: {e}",
                self.db_path
            ))
        })?;

        if self.wal {
            // In-memory databases report `memory` and stay that way.
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            tracing::debug!("sqlite journal_mode is now {mode}");
        }

        tracing::debug!("opened sqlite database {}", self.db_path);
        Ok(Connection::new(SqliteNative::new(conn), self.connection))
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn emulate_last_insert_id(mut self, enabled: bool) -> Self {
        self.opts.connection.emulate_last_insert_id = enabled;
        self
    }

    #[must_use]
    pub fn default_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.opts.connection.default_fetch_mode = mode;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open a [`SqliteConnection`] with these options.
    ///
    /// # Errors
    ///
    /// See [`SqliteOptions::open`].
    pub fn open(self) -> Result<SqliteConnection, StatementError> {
        self.finish().open()
    }
}
