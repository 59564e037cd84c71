use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ConnectionOptions;
use crate::dialect::Dialect;
use crate::error::StatementError;
use crate::native::NativeConnection;
use crate::statement::Statement;
use crate::types::{DatabaseType, ParamType, RowValues};

/// Shared slot holding the identity generated by the last key-retrieving insert.
///
/// Owned by the [`Connection`]; every insert statement it prepares holds a clone.
#[derive(Debug, Clone, Default)]
pub struct LastInsertId(Rc<RefCell<Option<RowValues>>>);

impl LastInsertId {
    pub fn set(&self, id: RowValues) {
        *self.0.borrow_mut() = Some(id);
    }

    /// `None` until an insert has reported an id.
    #[must_use]
    pub fn get(&self) -> Option<RowValues> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().take();
    }
}

/// A native connection plus the session state statements share.
pub struct Connection<C: NativeConnection> {
    native: C,
    last_insert_id: LastInsertId,
    options: ConnectionOptions,
}

impl<C: NativeConnection> Connection<C> {
    pub fn new(native: C, options: ConnectionOptions) -> Self {
        Self {
            native,
            last_insert_id: LastInsertId::default(),
            options,
        }
    }

    #[must_use]
    pub fn native(&self) -> &C {
        &self.native
    }

    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.native.database_type()
    }

    #[must_use]
    pub fn dialect(&self) -> &'static Dialect {
        Dialect::for_database(self.native.database_type())
    }

    /// Prepare `sql`.
    ///
    /// When generated-key retrieval is enabled and `sql` starts with `INSERT INTO `, the dialect's
    /// identity select is appended here, once.
    ///
    /// # Errors
    /// [`StatementError::Preparation`] if the driver rejects the text.
    pub fn prepare(&self, sql: &str) -> Result<Statement<C>, StatementError> {
        let cell = self
            .options
            .emulate_last_insert_id
            .then(|| self.last_insert_id.clone());
        let mut stmt = Statement::new(self.native.clone(), sql, cell, &self.options);
        stmt.prepare_native()?;
        Ok(stmt)
    }

    /// Prepare and execute `sql`, returning the statement positioned before its first row.
    ///
    /// # Errors
    /// Preparation or execution failures.
    pub fn query(&self, sql: &str) -> Result<Statement<C>, StatementError> {
        let mut stmt = self.prepare(sql)?;
        stmt.execute()?;
        Ok(stmt)
    }

    /// Execute `sql` and return the number of affected rows.
    ///
    /// # Errors
    /// Preparation or execution failures.
    pub fn exec(&self, sql: &str) -> Result<usize, StatementError> {
        let mut stmt = self.prepare(sql)?;
        stmt.execute()?;
        Ok(stmt.row_count())
    }

    /// Render `value` as a SQL literal for this dialect. Non-finite floats render as `NULL`.
    #[must_use]
    pub fn quote(&self, value: &RowValues) -> String {
        match value {
            RowValues::Int(i) => i.to_string(),
            RowValues::Float(f) if f.is_finite() => f.to_string(),
            // NaN and the infinities have no SQL literal.
            RowValues::Float(_) => "NULL".to_string(),
            RowValues::Bool(b) => String::from(if *b { "1" } else { "0" }),
            RowValues::Null => "NULL".to_string(),
            RowValues::Text(s) => quote_str(s),
            RowValues::Timestamp(dt) => quote_str(&dt.format("%F %T%.f").to_string()),
            RowValues::JSON(js) => quote_str(&js.to_string()),
            RowValues::Blob(bytes) => self.dialect().blob_literal(bytes),
        }
    }

    /// Identity captured by the last key-retrieving insert on this connection.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<RowValues> {
        self.last_insert_id.get()
    }

    /// Current value of the named sequence.
    ///
    /// # Errors
    /// [`StatementError::Unimplemented`] for dialects without sequences; otherwise preparation,
    /// execution or fetch failures.
    pub fn sequence_value(&self, name: &str) -> Result<Option<RowValues>, StatementError> {
        let Some(sql) = self.dialect().sequence_value_sql else {
            return Err(StatementError::Unimplemented(format!(
                "sequences are not supported for {:?}",
                self.database_type()
            )));
        };
        let mut stmt = self.prepare(sql)?;
        stmt.bind_value(1, name, ParamType::Str);
        stmt.execute()?;
        stmt.fetch_column(0)
    }

    /// # Errors
    /// [`StatementError::Execution`] with the driver diagnostic.
    pub fn begin_transaction(&self) -> Result<(), StatementError> {
        tracing::debug!("begin transaction");
        self.native
            .begin_transaction()
            .map_err(StatementError::Execution)
    }

    /// # Errors
    /// [`StatementError::Execution`] with the driver diagnostic.
    pub fn commit(&self) -> Result<(), StatementError> {
        tracing::debug!("commit");
        self.native.commit().map_err(StatementError::Execution)
    }

    /// # Errors
    /// [`StatementError::Execution`] with the driver diagnostic.
    pub fn rollback(&self) -> Result<(), StatementError> {
        tracing::debug!("rollback");
        self.native.rollback().map_err(StatementError::Execution)
    }

    #[must_use]
    pub fn server_version(&self) -> String {
        self.native.server_version()
    }
}

fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    out.push_str(&s.replace('\'', "''"));
    out.push('\'');
    out
}
