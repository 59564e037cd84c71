//! Prepared-statement execution and result fetching over pluggable native drivers.
//!
//! A [`Connection`] wraps a [`native::NativeConnection`] and hands out [`Statement`]s. Statements
//! bind parameters by value or by reference, build their native handle lazily, capture generated
//! ids for `INSERT INTO ` statements, and shape fetched rows per [`FetchMode`].

pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod fetch_mode;
pub mod native;
pub mod params;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod translation;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::ConnectionOptions;
pub use connection::{Connection, LastInsertId};
pub use error::{NativeDiagnostic, StatementError};
pub use fetch_mode::{FetchArgs, FetchMode, HydratedObject, HydrationTarget};
pub use params::ParamCell;
pub use results::{AssocRow, CustomDbRow, FetchedRow, ResultSet};
pub use statement::{ExecuteKey, ExecuteParams, Statement};
pub use types::{DatabaseType, ParamType, RowValues};
