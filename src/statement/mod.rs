//! Prepared statements: parameter binding, execution and generated-key capture.
//!
//! The native handle is derived state. It is built from the SQL text and the current binding
//! descriptors, dropped whenever a binding changes, and rebuilt on the next `execute()`.

use std::collections::{BTreeMap, HashMap};

use crate::config::ConnectionOptions;
use crate::connection::LastInsertId;
use crate::dialect::{Dialect, is_insert};
use crate::error::{NativeDiagnostic, StatementError};
use crate::fetch_mode::{FetchMode, HydrationTarget};
use crate::native::{NativeConnection, NativeStatement};
use crate::params::{ParamCell, ParamKey, ParameterStore, build_descriptors};
use crate::types::{ParamType, RowValues};

mod fetch;

pub use fetch::Rows;

/// Key of an entry passed to [`Statement::execute_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteKey {
    /// Zero-based index; bound at position `index + 1`.
    Index(usize),
    Name(String),
}

/// Parameters supplied directly to `execute_with`, bound by value before running.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteParams {
    Positional(Vec<RowValues>),
    Keyed(Vec<(ExecuteKey, RowValues)>),
}

impl ExecuteParams {
    fn into_bindings(self) -> Vec<(ParamKey, RowValues)> {
        match self {
            ExecuteParams::Positional(values) => values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ParamKey::Position(i + 1), v))
                .collect(),
            ExecuteParams::Keyed(entries) => entries
                .into_iter()
                .map(|(key, v)| match key {
                    ExecuteKey::Index(i) => (ParamKey::Position(i + 1), v),
                    ExecuteKey::Name(name) => (ParamKey::Named(name), v),
                })
                .collect(),
        }
    }
}

impl From<Vec<RowValues>> for ExecuteParams {
    fn from(values: Vec<RowValues>) -> Self {
        ExecuteParams::Positional(values)
    }
}

impl From<&[RowValues]> for ExecuteParams {
    fn from(values: &[RowValues]) -> Self {
        ExecuteParams::Positional(values.to_vec())
    }
}

impl<const N: usize> From<[RowValues; N]> for ExecuteParams {
    fn from(values: [RowValues; N]) -> Self {
        ExecuteParams::Positional(values.into())
    }
}

impl From<BTreeMap<usize, RowValues>> for ExecuteParams {
    fn from(map: BTreeMap<usize, RowValues>) -> Self {
        ExecuteParams::Keyed(
            map.into_iter()
                .map(|(i, v)| (ExecuteKey::Index(i), v))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, RowValues>> for ExecuteParams {
    fn from(map: BTreeMap<String, RowValues>) -> Self {
        ExecuteParams::Keyed(
            map.into_iter()
                .map(|(name, v)| (ExecuteKey::Name(name), v))
                .collect(),
        )
    }
}

impl From<HashMap<String, RowValues>> for ExecuteParams {
    fn from(map: HashMap<String, RowValues>) -> Self {
        ExecuteParams::Keyed(
            map.into_iter()
                .map(|(name, v)| (ExecuteKey::Name(name), v))
                .collect(),
        )
    }
}

/// A statement prepared on a [`Connection`](crate::connection::Connection).
///
/// ```rust
/// # #[cfg(feature = "sqlite")]
/// # fn demo() -> Result<(), sql_stmt_middleware::StatementError> {
/// use sql_stmt_middleware::prelude::*;
///
/// let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;
/// conn.exec("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")?;
///
/// let mut insert = conn.prepare("INSERT INTO t (name) VALUES (?)")?;
/// let name = ParamCell::new("ann");
/// insert.bind_param(1, name.clone(), ParamType::Str, None);
/// insert.execute()?;
/// name.set("bob");
/// insert.execute()?;
/// assert_eq!(conn.last_insert_id(), Some(RowValues::Int(2)));
///
/// let mut select = conn.query("SELECT name FROM t ORDER BY id")?;
/// assert_eq!(select.fetch_column(0)?, Some(RowValues::Text("ann".into())));
/// # Ok(())
/// # }
/// # #[cfg(feature = "sqlite")]
/// # demo().unwrap();
/// ```
pub struct Statement<C: NativeConnection> {
    conn: C,
    sql: String,
    params: ParameterStore,
    native: Option<C::Statement>,
    result_active: bool,
    default_mode: FetchMode,
    default_target: HydrationTarget,
    default_ctor_args: Vec<RowValues>,
    // Present only for key-retrieving inserts.
    last_insert_id: Option<LastInsertId>,
    last_error: Option<NativeDiagnostic>,
}

impl<C: NativeConnection> Statement<C> {
    pub(crate) fn new(
        conn: C,
        sql: &str,
        last_insert_id: Option<LastInsertId>,
        options: &ConnectionOptions,
    ) -> Self {
        let (sql, last_insert_id) = match last_insert_id {
            Some(cell) if is_insert(sql) => {
                let dialect = Dialect::for_database(conn.database_type());
                (dialect.with_identity_select(sql).into_owned(), Some(cell))
            }
            _ => (sql.to_string(), None),
        };

        Self {
            conn,
            sql,
            params: ParameterStore::default(),
            native: None,
            result_active: false,
            default_mode: options.default_fetch_mode,
            default_target: HydrationTarget::standard(),
            default_ctor_args: Vec::new(),
            last_insert_id,
            last_error: None,
        }
    }

    /// SQL text as handed to the driver, including any appended identity select.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Whether `execute()` will capture a generated id.
    #[must_use]
    pub fn retrieves_last_insert_id(&self) -> bool {
        self.last_insert_id.is_some()
    }

    #[must_use]
    pub fn is_result_active(&self) -> bool {
        self.result_active
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.native.is_some()
    }

    #[must_use]
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Diagnostic of the most recent driver failure on this statement.
    #[must_use]
    pub fn error_info(&self) -> Option<&NativeDiagnostic> {
        self.last_error.as_ref()
    }

    /// Bind a snapshot of `value`.
    ///
    /// # Panics
    /// Panics on position 0; positions are 1-based.
    pub fn bind_value(
        &mut self,
        key: impl Into<ParamKey>,
        value: impl Into<RowValues>,
        param_type: ParamType,
    ) {
        self.params.bind_value(key.into(), value.into(), param_type);
        self.invalidate();
    }

    /// Bind a reference to `cell`; its value is read each time the statement executes.
    ///
    /// # Panics
    /// Panics on position 0; positions are 1-based.
    pub fn bind_param(
        &mut self,
        key: impl Into<ParamKey>,
        cell: ParamCell,
        param_type: ParamType,
        length: Option<usize>,
    ) {
        self.params.bind_param(key.into(), cell, param_type, length);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if self.native.take().is_some() {
            tracing::trace!("binding changed, dropping native handle");
        }
        self.result_active = false;
    }

    /// Build the native handle from the current bindings if none is live.
    pub(crate) fn prepare_native(&mut self) -> Result<(), StatementError> {
        if self.native.is_some() {
            return Ok(());
        }
        let descriptors = build_descriptors(&self.params);
        tracing::debug!(
            "preparing native statement with {} bindings: {}",
            descriptors.len(),
            self.sql
        );
        let prepared = self.conn.prepare(&self.sql, descriptors).map_err(|diag| {
            self.last_error = Some(diag.clone());
            StatementError::Preparation(diag)
        })?;
        self.native = Some(prepared);
        Ok(())
    }

    /// Execute with the current bindings.
    ///
    /// # Errors
    /// [`StatementError::Preparation`] if the handle has to be built and the driver rejects it,
    /// [`StatementError::Execution`] if the driver fails to run it. The active-result flag and
    /// the generated-id cell keep their previous state on failure.
    pub fn execute(&mut self) -> Result<(), StatementError> {
        self.prepare_native()?;
        let Some(native) = self.native.as_mut() else {
            return Err(StatementError::Preparation(NativeDiagnostic::new(
                "statement has no native handle",
            )));
        };
        if let Err(diag) = native.execute() {
            tracing::debug!("native execute failed: {diag}");
            self.last_error = Some(diag.clone());
            return Err(StatementError::Execution(diag));
        }

        if let Some(cell) = &self.last_insert_id {
            match capture_generated_id(native) {
                Some(id) => cell.set(id),
                None => tracing::debug!("no generated id reported for: {}", self.sql),
            }
        }

        self.result_active = true;
        Ok(())
    }

    /// Bind `params` by value, then execute. An empty list keeps the current bindings and the
    /// live native handle.
    ///
    /// Positional lists and zero-based index keys bind at `index + 1`; string keys bind as named
    /// parameters. Nothing is checked against the markers in the SQL text; a mismatch surfaces as
    /// a driver failure.
    ///
    /// # Errors
    /// See [`Statement::execute`].
    pub fn execute_with(&mut self, params: impl Into<ExecuteParams>) -> Result<(), StatementError> {
        let bindings = params.into().into_bindings();
        if !bindings.is_empty() {
            for (key, value) in bindings {
                self.params.bind_value(key, value, ParamType::default());
            }
            self.invalidate();
        }
        self.execute()
    }

    /// Rows affected by the last execution; 0 before the first.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.native.as_ref().map_or(0, NativeStatement::rows_affected)
    }

    /// Columns of the active result shape; 0 before the first execution.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.native.as_ref().map_or(0, NativeStatement::field_count)
    }
}

// Advance to the synthesized result set and read its single field.
fn capture_generated_id<S: NativeStatement>(native: &mut S) -> Option<RowValues> {
    if !native.next_result().ok()? {
        return None;
    }
    native.fetch().ok()??;
    native.get_field(0).filter(|id| !id.is_null())
}
