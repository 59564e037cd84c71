use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::fetch_mode::HydratedObject;
use crate::types::RowValues;

/// A row from a database query result
///
/// This struct represents a single row from a database query result,
/// with access to both the column names and the values.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    // Name to index lookup, shared across all rows of a result set
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a new database row
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `rows` - The values for this row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let cache = Arc::new(build_index(&column_names));
        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }

        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Number of columns in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// Later duplicates win, matching what a name-keyed row would hold.
fn build_index(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

/// A row keyed by column name, in column order.
///
/// When a result carries duplicate column names the last value wins and keeps the position of
/// the first occurrence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssocRow {
    entries: Vec<(String, RowValues)>,
}

impl AssocRow {
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.entries
            .iter()
            .find(|(name, _)| name == column_name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<(String, RowValues)> {
        self.entries
    }
}

impl From<CustomDbRow> for AssocRow {
    fn from(row: CustomDbRow) -> Self {
        let mut entries: Vec<(String, RowValues)> = Vec::with_capacity(row.rows.len());
        for (name, value) in row.column_names.iter().zip(row.rows) {
            if let Some(slot) = entries.iter_mut().find(|(existing, _)| existing == name) {
                slot.1 = value;
            } else {
                entries.push((name.clone(), value));
            }
        }
        AssocRow { entries }
    }
}

/// One row as produced by the fetch engine, shaped by the fetch mode that was asked for.
#[derive(Debug)]
pub enum FetchedRow {
    /// Both name and position access (`MIXED`).
    Mixed(CustomDbRow),
    /// Column-name keyed row (`ASSOCIATIVE`).
    Associative(AssocRow),
    /// Ordinal keyed row (`NUMERIC`).
    Numeric(Vec<RowValues>),
    /// A single scalar (`COLUMN`).
    Column(RowValues),
    /// A hydrated value (`STANDARD_OBJECT` / `CUSTOM_OBJECT`).
    Object(HydratedObject),
}

impl FetchedRow {
    #[must_use]
    pub fn as_mixed(&self) -> Option<&CustomDbRow> {
        if let FetchedRow::Mixed(row) = self {
            Some(row)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_associative(&self) -> Option<&AssocRow> {
        if let FetchedRow::Associative(row) = self {
            Some(row)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_numeric(&self) -> Option<&[RowValues]> {
        if let FetchedRow::Numeric(row) = self {
            Some(row)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_column(&self) -> Option<&RowValues> {
        if let FetchedRow::Column(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&HydratedObject> {
        if let FetchedRow::Object(object) = self {
            Some(object)
        } else {
            None
        }
    }

    /// Take the hydrated value out of an object row.
    #[must_use]
    pub fn into_object<T: 'static>(self) -> Option<T> {
        match self {
            FetchedRow::Object(object) => object.downcast::<T>().ok(),
            _ => None,
        }
    }
}

/// One buffered result set: the rows of a single statement plus its column metadata.
///
/// Native adapters that materialize rows at execute time keep one of these per statement in a
/// batch and hand rows out one at a time.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows not yet handed out
    pub results: VecDeque<CustomDbRow>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    column_names: Arc<Vec<String>>,
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create a result set for the given columns with a known row capacity
    #[must_use]
    pub fn with_columns(column_names: Vec<String>, capacity: usize) -> ResultSet {
        let cache = Arc::new(build_index(&column_names));
        ResultSet {
            results: VecDeque::with_capacity(capacity),
            rows_affected: 0,
            column_names: Arc::new(column_names),
            column_index_cache: cache,
        }
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Add a row to the result set
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        let row = CustomDbRow {
            column_names: Arc::clone(&self.column_names),
            rows: row_values,
            column_index_cache: Arc::clone(&self.column_index_cache),
        };
        self.results.push_back(row);
    }

    /// Hand out the next buffered row.
    pub fn next_row(&mut self) -> Option<CustomDbRow> {
        self.results.pop_front()
    }

    /// Rows still buffered.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.results.len()
    }
}
