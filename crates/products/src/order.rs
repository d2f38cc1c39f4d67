//! Order-by support: table alias maps and order helpers.
//!
//! An order helper receives the alias map of the query being built, adds
//! the joins it needs and returns the columns to sort on.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// A table of the query with its alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub table: &'static str,
    pub alias: String,
}

/// A column qualified by table alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub alias: String,
    pub name: String,
}

impl Column {
    pub fn new(table: &TableRef, name: impl Into<String>) -> Self {
        Self {
            alias: table.alias.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\".\"{}\"", self.alias, self.name)
    }
}

/// `LEFT JOIN table ON local = remote.id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: TableRef,
    pub local: Column,
    pub remote: Column,
}

/// Alias map of a query: the root table plus named joins.
#[derive(Debug, Clone)]
pub struct Tables {
    root: TableRef,
    joins: BTreeMap<String, Join>,
    next_alias: u32,
}

impl Tables {
    pub fn new(root: &'static str) -> Self {
        Self {
            root: TableRef {
                table: root,
                alias: "a".to_string(),
            },
            joins: BTreeMap::new(),
            next_alias: 1,
        }
    }

    pub fn root(&self) -> &TableRef {
        &self.root
    }

    /// Join `table` under `name` through the root column `local`, or reuse
    /// the join already registered under that name.
    pub fn join(&mut self, name: &str, table: &'static str, local: &str) -> TableRef {
        if let Some(existing) = self.joins.get(name) {
            return existing.table.clone();
        }
        let alias = alias_for(self.next_alias);
        self.next_alias += 1;
        let joined = TableRef { table, alias };
        self.joins.insert(
            name.to_string(),
            Join {
                table: joined.clone(),
                local: Column::new(&self.root, local),
                remote: Column::new(&joined, "id"),
            },
        );
        joined
    }

    pub fn get(&self, name: &str) -> Option<&Join> {
        self.joins.get(name)
    }

    /// Name of the join using `alias`, `None` for the root table.
    pub fn join_name(&self, alias: &str) -> Option<&str> {
        self.joins
            .iter()
            .find(|(_, join)| join.table.alias == alias)
            .map(|(name, _)| name.as_str())
    }

    pub fn joins(&self) -> impl Iterator<Item = (&str, &Join)> {
        self.joins.iter().map(|(name, join)| (name.as_str(), join))
    }

    /// `FROM` clause of the query.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("\"{}\" AS \"{}\"", self.root.table, self.root.alias);
        for join in self.joins.values() {
            sql.push_str(&format!(
                " LEFT JOIN \"{}\" AS \"{}\" ON ({} = {})",
                join.table.table, join.table.alias, join.local, join.remote
            ));
        }
        sql
    }
}

fn alias_for(index: u32) -> String {
    let letter = (b'a' + (index % 26) as u8) as char;
    if index < 26 {
        letter.to_string()
    } else {
        format!("{letter}{}", index / 26)
    }
}

/// Order helper installed on a model for one field name.
pub type OrderFn = Arc<dyn Fn(&mut Tables) -> Vec<Column> + Send + Sync>;
