//! The call/return contract with a native client library.
//!
//! The statement layer only ever talks to a backend through these two traits. Adapters own
//! whatever driver handles they need; a [`NativeConnection`] is a cheap, cloneable handle so
//! every statement can keep one for lazy (re)preparation.

use crate::error::{NativeDiagnostic, StatementError};
use crate::fetch_mode::{HydratedObject, HydrationTarget};
use crate::params::BindingDescriptor;
use crate::results::CustomDbRow;
use crate::types::{DatabaseType, RowValues};

pub trait NativeConnection: Clone {
    type Statement: NativeStatement;

    /// Backend kind, used to look up the dialect table entry.
    fn database_type(&self) -> DatabaseType;

    /// Compile `sql` with the given bindings. The descriptors stay with the handle; values are
    /// read from them each time the handle executes.
    ///
    /// # Errors
    /// Returns the driver diagnostic if the text or a binding is rejected.
    fn prepare(
        &self,
        sql: &str,
        bindings: Vec<BindingDescriptor>,
    ) -> Result<Self::Statement, NativeDiagnostic>;

    /// # Errors
    /// Returns the driver diagnostic on failure.
    fn begin_transaction(&self) -> Result<(), NativeDiagnostic>;

    /// # Errors
    /// Returns the driver diagnostic on failure.
    fn commit(&self) -> Result<(), NativeDiagnostic>;

    /// # Errors
    /// Returns the driver diagnostic on failure.
    fn rollback(&self) -> Result<(), NativeDiagnostic>;

    fn server_version(&self) -> String;
}

pub trait NativeStatement {
    /// Run the statement, discarding whatever the previous run left unread.
    ///
    /// # Errors
    /// Returns the driver diagnostic on failure.
    fn execute(&mut self) -> Result<(), NativeDiagnostic>;

    /// Next row of the current result set, `None` once it is exhausted.
    ///
    /// # Errors
    /// Returns the driver diagnostic on failure.
    fn fetch(&mut self) -> Result<Option<CustomDbRow>, NativeDiagnostic>;

    /// Fetch the next row and build a value from it.
    ///
    /// # Errors
    /// Returns [`StatementError::Fetch`] for driver failures and whatever the target's factory
    /// returns.
    fn fetch_object(
        &mut self,
        target: &HydrationTarget,
        ctor_args: &[RowValues],
    ) -> Result<Option<HydratedObject>, StatementError> {
        match self.fetch().map_err(StatementError::Fetch)? {
            Some(row) => target.hydrate(&row, ctor_args).map(Some),
            None => Ok(None),
        }
    }

    /// Column count of the current result set.
    fn field_count(&self) -> usize;

    /// Rows changed by the last execution.
    fn rows_affected(&self) -> usize;

    /// Move to the next result set of the batch. `Ok(false)` when there is none.
    ///
    /// # Errors
    /// Returns the driver diagnostic on failure.
    fn next_result(&mut self) -> Result<bool, NativeDiagnostic>;

    /// Field of the most recently fetched row.
    fn get_field(&self, index: usize) -> Option<RowValues>;
}
