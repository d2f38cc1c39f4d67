//! Field values exchanged between records, forms and search clauses.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_object::ValueObject;

/// A single field value.
///
/// Relations are carried as raw ids: a Many2One reads as `Id`, a One2Many or
/// Many2Many reads as `Ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Boolean(bool),
    Char(String),
    Numeric(Decimal),
    Selection(String),
    Id(Uuid),
    Ids(Vec<Uuid>),
    /// List operand of `in` clauses on text fields.
    Texts(Vec<String>),
    DateTime(DateTime<Utc>),
}

impl ValueObject for Value {}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text content of `Char` and `Selection` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Char(s) | Value::Selection(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Numeric(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<Uuid> {
        match self {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }

    /// Total order used when sorting search results.
    ///
    /// `Null` sorts before anything else; values of different kinds fall back to
    /// a fixed kind rank so the order stays deterministic.
    pub fn cmp_for_order(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Selection(a), Value::Selection(b)) => a.cmp(b),
            (Value::Numeric(a), Value::Numeric(b)) => a.cmp(b),
            (Value::Id(a), Value::Id(b)) => a.cmp(b),
            (Value::Ids(a), Value::Ids(b)) => a.cmp(b),
            (Value::Texts(a), Value::Texts(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    /// Partial comparison used by `<`, `<=`, `>` and `>=` clauses.
    ///
    /// Returns `None` when either side is `Null` or the kinds differ.
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() || self.kind_rank() != other.kind_rank() {
            return None;
        }
        Some(self.cmp_for_order(other))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Numeric(_) => 2,
            Value::Char(_) => 3,
            Value::Selection(_) => 4,
            Value::Id(_) => 5,
            Value::Ids(_) => 6,
            Value::Texts(_) => 7,
            Value::DateTime(_) => 8,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Char(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Char(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::Texts(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Numeric(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Id(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
