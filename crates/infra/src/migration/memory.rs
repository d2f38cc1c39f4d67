use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{MigrationError, NotNullAction, SqlValue, TableHandler, Update};

type Row = BTreeMap<String, SqlValue>;

#[derive(Debug, Default)]
struct TableState {
    /// Column name to its not-null flag.
    columns: BTreeMap<String, bool>,
    rows: Vec<Row>,
}

/// A table kept in memory, for tests and dry runs of migrations.
#[derive(Debug)]
pub struct InMemoryTable {
    name: String,
    state: RwLock<TableState>,
}

impl InMemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(TableState::default()),
        }
    }

    pub fn with_column(self, column: &str, not_null: bool) -> Self {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .columns
            .insert(column.to_string(), not_null);
        self
    }

    /// Append a row. Cells of unknown columns are dropped.
    pub fn insert<'a>(&self, cells: impl IntoIterator<Item = (&'a str, SqlValue)>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let row: Row = cells
            .into_iter()
            .filter(|(column, _)| state.columns.contains_key(*column))
            .map(|(column, value)| (column.to_string(), value))
            .collect();
        state.rows.push(row);
    }

    pub fn rows(&self) -> Vec<BTreeMap<String, SqlValue>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .clone()
    }

    pub fn is_not_null(&self, column: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .columns
            .get(column)
            .copied()
            .unwrap_or(false)
    }

    fn unknown_column(&self, column: &str) -> MigrationError {
        MigrationError::UnknownColumn {
            table: self.name.clone(),
            column: column.to_string(),
        }
    }
}

fn poisoned<T>(_: PoisonError<T>) -> MigrationError {
    MigrationError::Backend("in-memory table lock poisoned".to_string())
}

#[async_trait]
impl TableHandler for InMemoryTable {
    fn table(&self) -> &str {
        &self.name
    }

    async fn column_exists(&self, column: &str) -> Result<bool, MigrationError> {
        Ok(self.state.read().map_err(poisoned)?.columns.contains_key(column))
    }

    async fn not_null_action(&self, column: &str, action: NotNullAction) -> Result<(), MigrationError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if let Some(not_null) = state.columns.get_mut(column) {
            *not_null = action == NotNullAction::Add;
        }
        Ok(())
    }

    async fn update(&self, update: &Update) -> Result<u64, MigrationError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let columns = update
            .set
            .iter()
            .map(|(column, _)| column.as_str())
            .chain([update.filter.column()]);
        for column in columns {
            if !state.columns.contains_key(column) {
                return Err(self.unknown_column(column));
            }
        }

        let mut changed = 0;
        for row in &mut state.rows {
            if !update.filter.accepts(row.get(update.filter.column())) {
                continue;
            }
            for (column, value) in &update.set {
                row.insert(column.clone(), value.clone());
            }
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Filter;

    #[tokio::test]
    async fn update_counts_matching_rows() {
        let table = InMemoryTable::new("t")
            .with_column("kind", true)
            .with_column("flag", false);
        table.insert([("kind", SqlValue::from("a")), ("flag", SqlValue::from(false))]);
        table.insert([("kind", SqlValue::from("b"))]);
        table.insert([("flag", SqlValue::from(false))]);

        let changed = table
            .update(&Update::new(
                "flag",
                true,
                Filter::In("kind".to_string(), vec!["a".into(), "b".into()]),
            ))
            .await
            .unwrap();

        assert_eq!(changed, 2);
        let flags: Vec<_> = table.rows().iter().map(|r| r.get("flag").cloned()).collect();
        assert_eq!(
            flags,
            vec![
                Some(SqlValue::Bool(true)),
                Some(SqlValue::Bool(true)),
                Some(SqlValue::Bool(false)),
            ]
        );
    }

    #[tokio::test]
    async fn not_null_action_ignores_missing_column() {
        let table = InMemoryTable::new("t").with_column("kind", true);
        table.not_null_action("missing", NotNullAction::Remove).await.unwrap();
        table.not_null_action("kind", NotNullAction::Remove).await.unwrap();
        assert!(!table.is_not_null("kind"));
        assert!(!table.column_exists("missing").await.unwrap());
    }
}
