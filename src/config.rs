use serde::Deserialize;

use crate::fetch_mode::FetchMode;

/// Backend-independent connection settings.
///
/// ```rust
/// use sql_stmt_middleware::prelude::*;
///
/// let opts = ConnectionOptions::default()
///     .with_default_fetch_mode(FetchMode::ASSOCIATIVE)
///     .with_last_insert_id(false);
/// assert!(!opts.emulate_last_insert_id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Rewrite `INSERT INTO ` statements so the generated identity is captured on execute.
    pub emulate_last_insert_id: bool,
    /// Fetch mode new statements start with.
    pub default_fetch_mode: FetchMode,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            emulate_last_insert_id: true,
            default_fetch_mode: FetchMode::MIXED,
        }
    }
}

impl ConnectionOptions {
    #[must_use]
    pub fn with_last_insert_id(mut self, enabled: bool) -> Self {
        self.emulate_last_insert_id = enabled;
        self
    }

    #[must_use]
    pub fn with_default_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.default_fetch_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let opts: ConnectionOptions =
            serde_json::from_str(r#"{ "default_fetch_mode": "assoc" }"#).unwrap();
        assert_eq!(opts.default_fetch_mode, FetchMode::ASSOCIATIVE);
        assert!(opts.emulate_last_insert_id);
    }

    #[test]
    fn rejects_unknown_fetch_mode_names() {
        let parsed: Result<ConnectionOptions, _> =
            serde_json::from_str(r#"{ "default_fetch_mode": "lazy" }"#);
        assert!(parsed.is_err());
    }
}
