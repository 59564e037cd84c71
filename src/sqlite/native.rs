use std::rc::Rc;

use crate::error::NativeDiagnostic;
use crate::native::{NativeConnection, NativeStatement};
use crate::params::{BindTarget, BindingDescriptor};
use crate::results::{CustomDbRow, ResultSet};
use crate::translation::split_statements;
use crate::types::{DatabaseType, RowValues};

use super::params::{SlotBindings, name_candidates, positional_index};
use super::query::{build_result_set, execute_dml};

// SQLITE_RANGE; also what sqlite3_bind_* reports for a bad index.
const SQLITE_RANGE: i64 = 25;

/// Shared handle on one rusqlite connection.
#[derive(Debug, Clone)]
pub struct SqliteNative {
    conn: Rc<rusqlite::Connection>,
}

impl SqliteNative {
    #[must_use]
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Rc::new(conn),
        }
    }

    /// The underlying rusqlite connection, for work outside the statement layer.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

/// One submitted batch, split into its statements.
///
/// Each statement of the batch yields one buffered result set on execute; statements without
/// columns yield an empty one. Only the statements that compile against the schema as it stands
/// are checked at prepare time; the rest compile when the batch runs, after the statements ahead
/// of them.
#[derive(Debug)]
pub struct SqliteNativeStatement {
    conn: Rc<rusqlite::Connection>,
    pieces: Vec<String>,
    bindings: Vec<BindingDescriptor>,
    first_column_count: usize,
    results: Vec<ResultSet>,
    current: usize,
    rows_affected: usize,
    last_row: Option<CustomDbRow>,
}

/// Assign to `stmt` the descriptors that target it. `offset` is the number of positional markers
/// in the statements before it; `seen` records which descriptors found a slot.
fn assign_slots(
    stmt: &rusqlite::Statement<'_>,
    offset: usize,
    bindings: &[BindingDescriptor],
    seen: &mut [bool],
) -> rusqlite::Result<SlotBindings> {
    let param_count = stmt.parameter_count();
    let mut slots = SlotBindings::new(param_count);

    for (descriptor, seen) in bindings.iter().zip(seen.iter_mut()) {
        match descriptor.target() {
            BindTarget::Index(i) => {
                if (offset..offset + param_count).contains(i) {
                    slots.assign(i - offset + 1, descriptor.clone());
                    *seen = true;
                }
            }
            BindTarget::Name(name) => {
                for candidate in name_candidates(name) {
                    if let Some(index) = stmt.parameter_index(&candidate)? {
                        slots.assign(index, descriptor.clone());
                        *seen = true;
                        break;
                    }
                }
            }
        }
    }
    Ok(slots)
}

fn check_all_bound(
    bindings: &[BindingDescriptor],
    seen: &[bool],
    param_total: usize,
) -> Result<(), NativeDiagnostic> {
    let Some((descriptor, _)) = bindings.iter().zip(seen).find(|(_, seen)| !**seen) else {
        return Ok(());
    };
    let message = match positional_index(descriptor) {
        Some(i) => format!("bind index {} out of range for {param_total} parameters", i + 1),
        None => format!("no such parameter: {:?}", descriptor.target()),
    };
    Err(NativeDiagnostic::new(message)
        .with_code(SQLITE_RANGE)
        .with_sqlstate("HY093"))
}

impl NativeConnection for SqliteNative {
    type Statement = SqliteNativeStatement;

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn prepare(
        &self,
        sql: &str,
        bindings: Vec<BindingDescriptor>,
    ) -> Result<Self::Statement, NativeDiagnostic> {
        let texts = split_statements(sql);
        if texts.is_empty() {
            return Err(NativeDiagnostic::new("no SQL statement to prepare"));
        }

        let mut seen = vec![false; bindings.len()];
        let mut offset = 0;
        let mut first_column_count = 0;
        let mut deferred = false;

        for (i, text) in texts.iter().enumerate() {
            let stmt = match self.conn.prepare_cached(text) {
                Ok(stmt) => stmt,
                // May depend on objects the earlier statements create.
                Err(err) if i > 0 => {
                    tracing::debug!("sqlite deferring statement {i} of batch to execute: {err}");
                    deferred = true;
                    break;
                }
                Err(err) => return Err(err.into()),
            };
            if i == 0 {
                first_column_count = stmt.column_count();
            }
            assign_slots(&stmt, offset, &bindings, &mut seen)?;
            offset += stmt.parameter_count();
        }

        if !deferred {
            check_all_bound(&bindings, &seen, offset)?;
        }

        tracing::debug!("sqlite prepared {} statement(s)", texts.len());
        Ok(SqliteNativeStatement {
            conn: Rc::clone(&self.conn),
            pieces: texts.into_iter().map(str::to_string).collect(),
            bindings,
            first_column_count,
            results: Vec::new(),
            current: 0,
            rows_affected: 0,
            last_row: None,
        })
    }

    fn begin_transaction(&self) -> Result<(), NativeDiagnostic> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&self) -> Result<(), NativeDiagnostic> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<(), NativeDiagnostic> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn server_version(&self) -> String {
        rusqlite::version().to_string()
    }
}

impl NativeStatement for SqliteNativeStatement {
    fn execute(&mut self) -> Result<(), NativeDiagnostic> {
        let mut results = Vec::with_capacity(self.pieces.len());
        let mut rows_affected = 0;
        let mut seen = vec![false; self.bindings.len()];
        let mut offset = 0;

        for piece in &self.pieces {
            let mut stmt = self.conn.prepare_cached(piece)?;
            let slots = assign_slots(&stmt, offset, &self.bindings, &mut seen)?;
            offset += slots.param_count;
            let values = slots.values();

            let result_set = if stmt.column_count() > 0 {
                let mut result_set = build_result_set(&mut stmt, &values)?;
                // RETURNING clauses: rows come back and rows change.
                if !stmt.readonly() {
                    result_set.rows_affected =
                        usize::try_from(self.conn.changes()).unwrap_or(usize::MAX);
                    rows_affected = result_set.rows_affected;
                }
                result_set
            } else {
                let result_set = execute_dml(&mut stmt, &values)?;
                rows_affected = result_set.rows_affected;
                result_set
            };
            results.push(result_set);
        }
        check_all_bound(&self.bindings, &seen, offset)?;

        tracing::trace!(
            "sqlite executed {} statement(s), {rows_affected} row(s) changed",
            results.len()
        );
        self.results = results;
        self.current = 0;
        self.rows_affected = rows_affected;
        self.last_row = None;
        Ok(())
    }

    fn fetch(&mut self) -> Result<Option<CustomDbRow>, NativeDiagnostic> {
        let Some(result_set) = self.results.get_mut(self.current) else {
            return Ok(None);
        };
        let row = result_set.next_row();
        self.last_row.clone_from(&row);
        Ok(row)
    }

    fn field_count(&self) -> usize {
        match self.results.get(self.current) {
            Some(result_set) => result_set.column_count(),
            None => self.first_column_count,
        }
    }

    fn rows_affected(&self) -> usize {
        self.rows_affected
    }

    fn next_result(&mut self) -> Result<bool, NativeDiagnostic> {
        if self.current + 1 >= self.results.len() {
            return Ok(false);
        }
        self.current += 1;
        self.last_row = None;
        Ok(true)
    }

    fn get_field(&self, index: usize) -> Option<RowValues> {
        self.last_row.as_ref()?.get_by_index(index).cloned()
    }
}
