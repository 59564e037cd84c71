//! Per-backend SQL fragments used to emulate features a driver does not offer natively.
//!
//! Adding a backend means adding one [`Dialect`] entry to [`DIALECTS`].

use std::borrow::Cow;

use crate::types::DatabaseType;

/// Statements starting with exactly this text get generated-key retrieval.
///
/// The match is a raw, case-sensitive prefix test: `insert into`, `INSERT  INTO` or a leading
/// comment all miss it, and those statements simply get no generated id.
pub const INSERT_PREFIX: &str = "INSERT INTO ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub database_type: DatabaseType,
    /// Expression yielding the identity generated by the last insert in this scope.
    pub identity_expression: &'static str,
    /// Query returning the current value of the sequence bound to the single parameter.
    pub sequence_value_sql: Option<&'static str>,
    /// Prefix and suffix wrapped around the hex digits of a blob literal.
    pub blob_literal: (&'static str, &'static str),
}

pub const DIALECTS: &[Dialect] = &[
    Dialect {
        database_type: DatabaseType::Sqlite,
        identity_expression: "last_insert_rowid()",
        sequence_value_sql: None,
        blob_literal: ("X'", "'"),
    },
    Dialect {
        database_type: DatabaseType::Mssql,
        identity_expression: "SCOPE_IDENTITY()",
        sequence_value_sql: Some(
            "SELECT CONVERT(VARCHAR(MAX), current_value) FROM sys.sequences WHERE name = ?",
        ),
        blob_literal: ("0x", ""),
    },
    Dialect {
        database_type: DatabaseType::Postgres,
        identity_expression: "LASTVAL()",
        sequence_value_sql: Some("SELECT CURRVAL(?)"),
        blob_literal: ("'\\x", "'"),
    },
];

impl Dialect {
    #[must_use]
    pub fn for_database(database_type: DatabaseType) -> &'static Dialect {
        DIALECTS
            .iter()
            .find(|d| d.database_type == database_type)
            .unwrap_or(&DIALECTS[0])
    }

    /// The clause appended to key-retrieving inserts.
    #[must_use]
    pub fn identity_clause(&self) -> String {
        format!(";SELECT {} AS LastInsertId;", self.identity_expression)
    }

    /// Rewrite `sql` for generated-key retrieval when it is an insert.
    ///
    /// Returns the text unchanged (borrowed) for anything that does not start with
    /// [`INSERT_PREFIX`].
    #[must_use]
    pub fn with_identity_select<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        if is_insert(sql) {
            let mut out = String::with_capacity(sql.len() + 48);
            out.push_str(sql);
            out.push_str(&self.identity_clause());
            Cow::Owned(out)
        } else {
            Cow::Borrowed(sql)
        }
    }

    #[must_use]
    pub fn blob_literal(&self, bytes: &[u8]) -> String {
        use std::fmt::Write;

        let (prefix, suffix) = self.blob_literal;
        let mut out = String::with_capacity(prefix.len() + bytes.len() * 2 + suffix.len());
        out.push_str(prefix);
        for b in bytes {
            let _ = write!(out, "{b:02X}");
        }
        out.push_str(suffix);
        out
    }
}

/// Raw prefix test on the first 12 bytes.
#[must_use]
pub fn is_insert(sql: &str) -> bool {
    sql.as_bytes().starts_with(INSERT_PREFIX.as_bytes())
}
