//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so that a single
//! `use sql_stmt_middleware::prelude::*;` covers the usual statement workflow.

pub use crate::config::ConnectionOptions;
pub use crate::connection::Connection;
pub use crate::error::{NativeDiagnostic, StatementError};
pub use crate::fetch_mode::{FetchArgs, FetchMode, HydratedObject, HydrationTarget};
pub use crate::native::{NativeConnection, NativeStatement};
pub use crate::params::{BindingDescriptor, ParamCell};
pub use crate::results::{AssocRow, CustomDbRow, FetchedRow};
pub use crate::statement::{ExecuteParams, Statement};
pub use crate::types::{DatabaseType, ParamType, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder};
