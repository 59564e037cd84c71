//! Parameter store and type binder.
//!
//! Parameters are kept per key (1-based position or name) as either a snapshot or a shared
//! [`ParamCell`]. [`build_descriptors`] turns the store into the descriptor list a native driver
//! prepares against; cell-backed descriptors are resolved only when the driver executes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::types::{ParamType, RowValues};

/// Where a parameter is bound: a 1-based position or a parameter name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    Position(usize),
    Named(String),
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Position(position)
    }
}

// Literal positions infer as `i32`; negatives fall through to the 1-based check.
impl From<i32> for ParamKey {
    fn from(position: i32) -> Self {
        ParamKey::Position(usize::try_from(position).unwrap_or(0))
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Named(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Named(name)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Position(p) => write!(f, "#{p}"),
            ParamKey::Named(name) => f.write_str(name),
        }
    }
}

/// Caller-owned variable that can be bound by reference.
///
/// Cloning shares the slot. A statement bound to the cell reads it at execute time, so the last
/// [`set`](ParamCell::set) before `execute()` wins.
///
/// ```rust
/// use sql_stmt_middleware::prelude::*;
///
/// let v = ParamCell::new(10);
/// let alias = v.clone();
/// alias.set(20);
/// assert_eq!(v.get(), RowValues::Int(20));
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct ParamCell(Rc<RefCell<RowValues>>);

impl ParamCell {
    pub fn new(value: impl Into<RowValues>) -> Self {
        ParamCell(Rc::new(RefCell::new(value.into())))
    }

    pub fn set(&self, value: impl Into<RowValues>) {
        *self.0.borrow_mut() = value.into();
    }

    #[must_use]
    pub fn get(&self) -> RowValues {
        self.0.borrow().clone()
    }
}

impl fmt::Debug for ParamCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParamCell").field(&*self.0.borrow()).finish()
    }
}

/// Value source for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSource {
    /// Snapshot taken at bind time.
    Value(RowValues),
    /// Re-read whenever the value is needed.
    Cell(ParamCell),
}

impl ParamSource {
    /// Current value of the parameter.
    #[must_use]
    pub fn resolve(&self) -> RowValues {
        match self {
            ParamSource::Value(value) => value.clone(),
            ParamSource::Cell(cell) => cell.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub source: ParamSource,
    pub param_type: ParamType,
    /// Declared maximum length, recorded for reference bindings.
    pub length: Option<usize>,
}

/// Bound parameters of one statement, ordered positions first, then names.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: BTreeMap<ParamKey, BoundParam>,
}

impl ParameterStore {
    /// Store a snapshot of `value`.
    ///
    /// # Panics
    /// Panics if `key` is position 0; positions are 1-based.
    pub fn bind_value(&mut self, key: ParamKey, value: RowValues, param_type: ParamType) {
        check_key(&key);
        self.params.insert(
            key,
            BoundParam {
                source: ParamSource::Value(value),
                param_type,
                length: None,
            },
        );
    }

    /// Store a reference to `cell`.
    ///
    /// # Panics
    /// Panics if `key` is position 0; positions are 1-based.
    pub fn bind_param(
        &mut self,
        key: ParamKey,
        cell: ParamCell,
        param_type: ParamType,
        length: Option<usize>,
    ) {
        check_key(&key);
        self.params.insert(
            key,
            BoundParam {
                source: ParamSource::Cell(cell),
                param_type,
                length,
            },
        );
    }

    #[must_use]
    pub fn get(&self, key: &ParamKey) -> Option<&BoundParam> {
        self.params.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &BoundParam)> {
        self.params.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn check_key(key: &ParamKey) {
    assert!(
        !matches!(key, ParamKey::Position(0)),
        "parameter positions are 1-based"
    );
}

/// Native binding slot: zero-based ordinal or parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindTarget {
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDirection {
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Fixed binary string.
    Binary,
    /// Streamed binary.
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// Unbounded variable-length binary, `VARBINARY(MAX)` and friends.
    VarBinaryMax,
}

/// One entry of the list handed to a native prepare call.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingDescriptor {
    /// Pass-through; the driver infers the encoding.
    Plain {
        target: BindTarget,
        source: ParamSource,
    },
    Binary {
        target: BindTarget,
        source: ParamSource,
        direction: ParamDirection,
        encoding: Encoding,
    },
    LargeObject {
        target: BindTarget,
        source: ParamSource,
        direction: ParamDirection,
        encoding: Encoding,
        sql_type: SqlType,
    },
}

impl BindingDescriptor {
    #[must_use]
    pub fn target(&self) -> &BindTarget {
        match self {
            BindingDescriptor::Plain { target, .. }
            | BindingDescriptor::Binary { target, .. }
            | BindingDescriptor::LargeObject { target, .. } => target,
        }
    }

    #[must_use]
    pub fn source(&self) -> &ParamSource {
        match self {
            BindingDescriptor::Plain { source, .. }
            | BindingDescriptor::Binary { source, .. }
            | BindingDescriptor::LargeObject { source, .. } => source,
        }
    }

    /// `None` for pass-through bindings.
    #[must_use]
    pub fn encoding(&self) -> Option<Encoding> {
        match self {
            BindingDescriptor::Plain { .. } => None,
            BindingDescriptor::Binary { encoding, .. }
            | BindingDescriptor::LargeObject { encoding, .. } => Some(*encoding),
        }
    }

    /// Value to hand the driver right now.
    #[must_use]
    pub fn current_value(&self) -> RowValues {
        self.source().resolve()
    }
}

/// Build the native descriptor list from the store, one entry per bound key in order.
#[must_use]
pub fn build_descriptors(store: &ParameterStore) -> Vec<BindingDescriptor> {
    store
        .iter()
        .map(|(key, bound)| {
            let target = match key {
                ParamKey::Position(p) => BindTarget::Index(p - 1),
                ParamKey::Named(name) => BindTarget::Name(name.clone()),
            };
            let source = bound.source.clone();
            match bound.param_type {
                ParamType::LargeObject => BindingDescriptor::LargeObject {
                    target,
                    source,
                    direction: ParamDirection::In,
                    encoding: Encoding::Stream,
                    sql_type: SqlType::VarBinaryMax,
                },
                ParamType::Binary => BindingDescriptor::Binary {
                    target,
                    source,
                    direction: ParamDirection::In,
                    encoding: Encoding::Binary,
                },
                _ => BindingDescriptor::Plain { target, source },
            }
        })
        .collect()
}
