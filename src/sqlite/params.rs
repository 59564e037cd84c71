use rusqlite::types::Value;

use crate::params::{BindTarget, BindingDescriptor, Encoding};
use crate::types::RowValues;

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// With a binary or streamed encoding, text and JSON go to the driver as blobs of their bytes.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues, encoding: Option<Encoding>) -> Value {
    if encoding.is_some() {
        if let Some(bytes) = value.to_bytes() {
            return Value::Blob(bytes);
        }
    }
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Descriptors assigned to one statement of a batch, keyed by the statement's own 1-based
/// parameter index.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotBindings {
    pub(crate) param_count: usize,
    slots: Vec<(usize, BindingDescriptor)>,
}

impl SlotBindings {
    pub(crate) fn new(param_count: usize) -> Self {
        Self {
            param_count,
            slots: Vec::new(),
        }
    }

    pub(crate) fn assign(&mut self, index: usize, descriptor: BindingDescriptor) {
        self.slots.retain(|(i, _)| *i != index);
        self.slots.push((index, descriptor));
    }

    /// Current values for every parameter slot. Unbound slots are NULL, as in `SQLite` itself.
    pub(crate) fn values(&self) -> Vec<Value> {
        let mut values = vec![Value::Null; self.param_count];
        for (index, descriptor) in &self.slots {
            if let Some(slot) = values.get_mut(index - 1) {
                *slot = row_value_to_sqlite_value(
                    &descriptor.current_value(),
                    descriptor.encoding(),
                );
            }
        }
        values
    }
}

/// Spellings a bare parameter name may take in `SQLite` text.
pub(crate) fn name_candidates(name: &str) -> Vec<String> {
    if name.starts_with([':', '@', '$', '?']) {
        vec![name.to_string()]
    } else {
        vec![format!(":{name}"), format!("@{name}"), format!("${name}")]
    }
}

/// Target of `descriptor` translated into a global zero-based ordinal, if positional.
pub(crate) fn positional_index(descriptor: &BindingDescriptor) -> Option<usize> {
    match descriptor.target() {
        BindTarget::Index(i) => Some(*i),
        BindTarget::Name(_) => None,
    }
}
