use async_trait::async_trait;
use serde::Serialize;

use super::MigrationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Bool(bool),
    Text(String),
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotNullAction {
    Add,
    Remove,
}

/// Row filter of an [`Update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, SqlValue),
    In(String, Vec<SqlValue>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(column, _) | Filter::In(column, _) => column,
        }
    }

    /// Whether a row holding `value` in the filtered column is selected.
    pub fn accepts(&self, value: Option<&SqlValue>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Filter::Eq(_, expected), Some(value)) => expected == value,
            (Filter::In(_, candidates), Some(value)) => candidates.contains(value),
        }
    }
}

/// `UPDATE table SET ... WHERE filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub set: Vec<(String, SqlValue)>,
    pub filter: Filter,
}

impl Update {
    pub fn new(column: &str, value: impl Into<SqlValue>, filter: Filter) -> Self {
        Self {
            set: vec![(column.to_string(), value.into())],
            filter,
        }
    }
}

/// Schema and data operations on one table.
#[async_trait]
pub trait TableHandler: Send + Sync {
    fn table(&self) -> &str;

    async fn column_exists(&self, column: &str) -> Result<bool, MigrationError>;

    /// Add or drop the not-null constraint of `column`. A missing column is
    /// left alone.
    async fn not_null_action(&self, column: &str, action: NotNullAction) -> Result<(), MigrationError>;

    /// Apply `update`, returning the number of rows changed.
    async fn update(&self, update: &Update) -> Result<u64, MigrationError>;
}
