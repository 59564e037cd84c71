//! Recording native driver for exercising the statement layer without a database.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use sql_stmt_middleware::ResultSet;
use sql_stmt_middleware::prelude::*;

/// A result set the mock returns from every execution.
#[derive(Debug, Clone)]
pub struct MockResult {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<RowValues>>,
}

impl MockResult {
    pub fn new(columns: &[&'static str], rows: Vec<Vec<RowValues>>) -> Self {
        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// What a DML statement produces: no columns, no rows.
    pub fn empty() -> Self {
        Self::new(&[], Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    /// SQL text of every native prepare, in order.
    pub prepared: Vec<String>,
    /// Values resolved from the descriptors at each execution.
    pub executions: Vec<Vec<RowValues>>,
    /// Descriptors handed to the most recent prepare.
    pub last_descriptors: Vec<BindingDescriptor>,
    pub transactions: Vec<&'static str>,
    pub results: Vec<MockResult>,
    pub rows_affected: usize,
    pub fail_prepare: Option<NativeDiagnostic>,
    pub fail_execute: Option<NativeDiagnostic>,
    pub fail_fetch: Option<NativeDiagnostic>,
}

#[derive(Clone)]
pub struct MockDriver {
    database_type: DatabaseType,
    state: Rc<RefCell<MockState>>,
}

impl MockDriver {
    pub fn new(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            state: Rc::new(RefCell::new(MockState::default())),
        }
    }

    pub fn with_results(self, results: Vec<MockResult>) -> Self {
        self.state.borrow_mut().results = results;
        self
    }

    pub fn with_rows_affected(self, rows_affected: usize) -> Self {
        self.state.borrow_mut().rows_affected = rows_affected;
        self
    }

    pub fn connect(&self, options: ConnectionOptions) -> Connection<MockDriver> {
        Connection::new(self.clone(), options)
    }

    pub fn set_results(&self, results: Vec<MockResult>) {
        self.state.borrow_mut().results = results;
    }

    pub fn fail_next_prepare(&self, diag: NativeDiagnostic) {
        self.state.borrow_mut().fail_prepare = Some(diag);
    }

    pub fn fail_next_execute(&self, diag: NativeDiagnostic) {
        self.state.borrow_mut().fail_execute = Some(diag);
    }

    pub fn fail_next_fetch(&self, diag: NativeDiagnostic) {
        self.state.borrow_mut().fail_fetch = Some(diag);
    }

    pub fn prepared(&self) -> Vec<String> {
        self.state.borrow().prepared.clone()
    }

    pub fn prepare_count(&self) -> usize {
        self.state.borrow().prepared.len()
    }

    pub fn executions(&self) -> Vec<Vec<RowValues>> {
        self.state.borrow().executions.clone()
    }

    pub fn last_descriptors(&self) -> Vec<BindingDescriptor> {
        self.state.borrow().last_descriptors.clone()
    }

    pub fn transactions(&self) -> Vec<&'static str> {
        self.state.borrow().transactions.clone()
    }
}

pub struct MockStatement {
    state: Rc<RefCell<MockState>>,
    bindings: Vec<BindingDescriptor>,
    results: Vec<ResultSet>,
    current: usize,
    rows_affected: usize,
    last_row: Option<CustomDbRow>,
}

impl NativeConnection for MockDriver {
    type Statement = MockStatement;

    fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    fn prepare(
        &self,
        sql: &str,
        bindings: Vec<BindingDescriptor>,
    ) -> Result<MockStatement, NativeDiagnostic> {
        let mut state = self.state.borrow_mut();
        if let Some(diag) = state.fail_prepare.take() {
            return Err(diag);
        }
        state.prepared.push(sql.to_string());
        state.last_descriptors.clone_from(&bindings);
        Ok(MockStatement {
            state: Rc::clone(&self.state),
            bindings,
            results: Vec::new(),
            current: 0,
            rows_affected: 0,
            last_row: None,
        })
    }

    fn begin_transaction(&self) -> Result<(), NativeDiagnostic> {
        self.state.borrow_mut().transactions.push("begin");
        Ok(())
    }

    fn commit(&self) -> Result<(), NativeDiagnostic> {
        self.state.borrow_mut().transactions.push("commit");
        Ok(())
    }

    fn rollback(&self) -> Result<(), NativeDiagnostic> {
        self.state.borrow_mut().transactions.push("rollback");
        Ok(())
    }

    fn server_version(&self) -> String {
        "mock 1.0".to_string()
    }
}

impl NativeStatement for MockStatement {
    fn execute(&mut self) -> Result<(), NativeDiagnostic> {
        let mut state = self.state.borrow_mut();
        if let Some(diag) = state.fail_execute.take() {
            return Err(diag);
        }
        let values = self.bindings.iter().map(BindingDescriptor::current_value).collect();
        state.executions.push(values);

        self.results = state
            .results
            .iter()
            .map(|result| {
                let columns = result.columns.iter().map(|c| (*c).to_string()).collect();
                let mut set = ResultSet::with_columns(columns, result.rows.len());
                for row in &result.rows {
                    set.add_row_values(row.clone());
                }
                set
            })
            .collect();
        self.current = 0;
        self.rows_affected = state.rows_affected;
        self.last_row = None;
        Ok(())
    }

    fn fetch(&mut self) -> Result<Option<CustomDbRow>, NativeDiagnostic> {
        if let Some(diag) = self.state.borrow_mut().fail_fetch.take() {
            return Err(diag);
        }
        let row = self
            .results
            .get_mut(self.current)
            .and_then(ResultSet::next_row);
        self.last_row.clone_from(&row);
        Ok(row)
    }

    fn field_count(&self) -> usize {
        self.results
            .get(self.current)
            .map_or(0, ResultSet::column_count)
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
