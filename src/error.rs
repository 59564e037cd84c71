use std::fmt;

use thiserror::Error;

/// Diagnostic payload reported by a native client library.
///
/// Every backend failure is reduced to this shape before it reaches the caller, so the
/// statement layer never has to branch on driver error types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeDiagnostic {
    /// Backend error code, if the driver reports one.
    pub code: Option<i64>,
    /// Five character SQLSTATE, if the driver reports one.
    pub sqlstate: Option<String>,
    /// Human-readable message from the driver.
    pub message: String,
}

impl NativeDiagnostic {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            sqlstate: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }
}

impl fmt::Display for NativeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(state) = &self.sqlstate {
            write!(f, "[{state}] ")?;
        }
        if let Some(code) = self.code {
            write!(f, "({code}) ")?;
        }
        f.write_str(&self.message)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for NativeDiagnostic {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message) => {
                let text = message.clone().unwrap_or_else(|| failure.to_string());
                NativeDiagnostic::new(text).with_code(i64::from(failure.extended_code))
            }
            other => NativeDiagnostic::new(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("Statement preparation error: {0}")]
    Preparation(NativeDiagnostic),

    #[error("Statement execution error: {0}")]
    Execution(NativeDiagnostic),

    #[error("Row fetch error: {0}")]
    Fetch(NativeDiagnostic),

    #[error("fetch mode not supported: {0}")]
    UnsupportedFetchMode(String),

    #[error("Invalid column index {index}; the row has {column_count} columns")]
    InvalidColumnIndex { index: usize, column_count: usize },

    #[error("Row hydration error: {0}")]
    Hydration(String),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl StatementError {
    /// The native diagnostic carried by this error, when it came from the driver.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&NativeDiagnostic> {
        match self {
            Self::Preparation(diag) | Self::Execution(diag) | Self::Fetch(diag) => Some(diag),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StatementError {
    fn from(err: serde_json::Error) -> Self {
        StatementError::ConfigError(format!("invalid options document: {err}"))
    }
}
