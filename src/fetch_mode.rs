//! Fetch modes and row hydration.
//!
//! A fetch mode picks the shape of each row handed back by
//! [`Statement::fetch_with`](crate::statement::Statement::fetch_with). The two object modes
//! hydrate the row through a [`HydrationTarget`], a caller-supplied factory standing in for a
//! class name plus constructor arguments.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::error::StatementError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// Requested row shape.
///
/// Modes are plain codes so that values outside the supported set can be expressed (and
/// rejected at fetch time) the same way a raw driver constant would be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct FetchMode(u16);

impl FetchMode {
    pub const ASSOCIATIVE: FetchMode = FetchMode(2);
    pub const NUMERIC: FetchMode = FetchMode(3);
    pub const MIXED: FetchMode = FetchMode(4);
    pub const STANDARD_OBJECT: FetchMode = FetchMode(5);
    pub const COLUMN: FetchMode = FetchMode(7);
    pub const CUSTOM_OBJECT: FetchMode = FetchMode(8);

    const NAMES: [(FetchMode, &'static str); 6] = [
        (FetchMode::ASSOCIATIVE, "associative"),
        (FetchMode::NUMERIC, "numeric"),
        (FetchMode::MIXED, "mixed"),
        (FetchMode::STANDARD_OBJECT, "standard_object"),
        (FetchMode::COLUMN, "column"),
        (FetchMode::CUSTOM_OBJECT, "custom_object"),
    ];

    /// Wrap a raw mode code. Unknown codes are accepted here and rejected by the fetch engine.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        FetchMode(code)
    }

    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(mode, _)| *mode == self)
            .map(|(_, name)| *name)
    }

    #[must_use]
    pub fn is_supported(self) -> bool {
        self.name().is_some()
    }

    #[must_use]
    pub fn is_object(self) -> bool {
        self == FetchMode::STANDARD_OBJECT || self == FetchMode::CUSTOM_OBJECT
    }
}

impl Default for FetchMode {
    fn default() -> Self {
        FetchMode::MIXED
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "mode code {}", self.0),
        }
    }
}

impl FromStr for FetchMode {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let mode = match lowered.as_str() {
            "assoc" | "associative" => FetchMode::ASSOCIATIVE,
            "num" | "numeric" => FetchMode::NUMERIC,
            "both" | "mixed" => FetchMode::MIXED,
            "obj" | "object" | "standard_object" => FetchMode::STANDARD_OBJECT,
            "column" => FetchMode::COLUMN,
            "class" | "custom_object" => FetchMode::CUSTOM_OBJECT,
            _ => return Err(StatementError::UnsupportedFetchMode(s.to_string())),
        };
        Ok(mode)
    }
}

impl TryFrom<String> for FetchMode {
    type Error = StatementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

type HydrateFn = dyn Fn(&CustomDbRow, &[RowValues]) -> Result<Box<dyn Any>, StatementError>;

/// Class-like descriptor used by the object fetch modes: a name plus a factory that builds a
/// value from a row and the constructor arguments.
///
/// ```rust
/// use sql_stmt_middleware::prelude::*;
///
/// struct User {
///     id: i64,
///     tag: String,
/// }
///
/// let target = HydrationTarget::new("User", |row, args| {
///     Ok(User {
///         id: row.get("id").and_then(RowValues::as_int).copied().unwrap_or_default(),
///         tag: args.first().and_then(RowValues::as_text).unwrap_or("none").to_string(),
///     })
/// });
/// assert_eq!(target.name(), "User");
/// ```
#[derive(Clone)]
pub struct HydrationTarget {
    name: Rc<str>,
    factory: Rc<HydrateFn>,
}

impl HydrationTarget {
    pub fn new<T, F>(name: &str, factory: F) -> Self
    where
        T: Any,
        F: Fn(&CustomDbRow, &[RowValues]) -> Result<T, StatementError> + 'static,
    {
        let erased: Rc<HydrateFn> = Rc::new(move |row: &CustomDbRow, args: &[RowValues]| {
            factory(row, args).map(|value| Box::new(value) as Box<dyn Any>)
        });
        Self {
            name: Rc::from(name),
            factory: erased,
        }
    }

    /// Generic object: a JSON map from column name to value.
    #[must_use]
    pub fn standard() -> Self {
        Self::new("object", |row, _args| Ok(row_to_json(row)))
    }

    /// Hydrate through serde: the row is turned into a JSON object and deserialized into `T`.
    /// Constructor arguments are ignored.
    #[must_use]
    pub fn deserialize<T: DeserializeOwned + 'static>() -> Self {
        Self::new(std::any::type_name::<T>(), |row, _args| {
            serde_json::from_value::<T>(JsonValue::Object(row_to_json(row)))
                .map_err(|e| StatementError::Hydration(e.to_string()))
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a value from `row`.
    ///
    /// # Errors
    /// Returns whatever the factory returns.
    pub fn hydrate(
        &self,
        row: &CustomDbRow,
        ctor_args: &[RowValues],
    ) -> Result<HydratedObject, StatementError> {
        let value = (self.factory)(row, ctor_args)?;
        Ok(HydratedObject {
            class: Rc::clone(&self.name),
            value,
        })
    }
}

impl Default for HydrationTarget {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for HydrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationTarget")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn row_to_json(row: &CustomDbRow) -> Map<String, JsonValue> {
    row.column_names
        .iter()
        .zip(&row.rows)
        .map(|(name, value)| (name.clone(), JsonValue::from(value)))
        .collect()
}

/// A row hydrated by a [`HydrationTarget`].
pub struct HydratedObject {
    class: Rc<str>,
    value: Box<dyn Any>,
}

impl HydratedObject {
    /// Name of the target that built this value.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the value out, or hand `self` back when it is not a `T`.
    ///
    /// # Errors
    /// Returns `self` unchanged on a type mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(HydratedObject {
                class: self.class,
                value,
            }),
        }
    }
}

impl fmt::Debug for HydratedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydratedObject")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// Per-call fetch arguments: the column for `COLUMN`, the target and constructor arguments for
/// the object modes. Unset fields fall back to the statement defaults.
#[derive(Debug, Clone, Default)]
pub struct FetchArgs {
    pub(crate) column: Option<usize>,
    pub(crate) target: Option<HydrationTarget>,
    pub(crate) ctor_args: Option<Vec<RowValues>>,
}

impl FetchArgs {
    #[must_use]
    pub fn column(mut self, index: usize) -> Self {
        self.column = Some(index);
        self
    }

    #[must_use]
    pub fn target(mut self, target: HydrationTarget) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn ctor_args(mut self, args: Vec<RowValues>) -> Self {
        self.ctor_args = Some(args);
        self
    }
}
