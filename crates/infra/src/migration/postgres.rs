//! PostgreSQL table handler.

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::{Filter, MigrationError, NotNullAction, SqlValue, TableHandler, Update};

/// Table handler running its statements on a `sqlx` pool.
#[derive(Debug, Clone)]
pub struct PostgresTableHandler {
    pool: Arc<PgPool>,
    table: String,
}

impl PostgresTableHandler {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool: Arc::new(pool),
            table: table.into(),
        }
    }
}

/// Column lookup restricted to the schema the connection works in.
const COLUMN_EXISTS_SQL: &str = "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2)";

fn backend(err: anyhow::Error) -> MigrationError {
    MigrationError::Backend(format!("{err:#}"))
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Statement and parameters of `update` on `table`.
fn update_sql(table: &str, update: &Update) -> (String, Vec<SqlValue>) {
    let mut params = Vec::new();
    let mut placeholder = |value: &SqlValue| {
        params.push(value.clone());
        format!("${}", params.len())
    };

    let assignments: Vec<String> = update
        .set
        .iter()
        .map(|(column, value)| format!("{} = {}", quote(column), placeholder(value)))
        .collect();
    let condition = match &update.filter {
        Filter::Eq(column, value) => format!("{} = {}", quote(column), placeholder(value)),
        Filter::In(column, values) if values.is_empty() => format!("{} IN (NULL)", quote(column)),
        Filter::In(column, values) => {
            let list: Vec<String> = values.iter().map(&mut placeholder).collect();
            format!("{} IN ({})", quote(column), list.join(", "))
        }
    };
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quote(table),
        assignments.join(", "),
        condition
    );
    (sql, params)
}

#[async_trait]
impl TableHandler for PostgresTableHandler {
    fn table(&self) -> &str {
        &self.table
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn column_exists(&self, column: &str) -> Result<bool, MigrationError> {
        sqlx::query_scalar::<_, bool>(COLUMN_EXISTS_SQL)
            .bind(self.table.as_str())
            .bind(column)
            .fetch_one(&*self.pool)
            .await
            .with_context(|| format!("checking column {}.{column}", self.table))
            .map_err(backend)
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn not_null_action(&self, column: &str, action: NotNullAction) -> Result<(), MigrationError> {
        if !self.column_exists(column).await? {
            return Ok(());
        }
        let constraint = match action {
            NotNullAction::Add => "SET NOT NULL",
            NotNullAction::Remove => "DROP NOT NULL",
        };
        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} {constraint}",
            quote(&self.table),
            quote(column)
        );
        sqlx::query(&sql)
            .execute(&*self.pool)
            .await
            .with_context(|| format!("altering column {}.{column}", self.table))
            .map_err(backend)?;
        Ok(())
    }

    #[instrument(skip(self, update), fields(table = %self.table))]
    async fn update(&self, update: &Update) -> Result<u64, MigrationError> {
        let (sql, params) = update_sql(&self.table, update);
        let mut query = sqlx::query(&sql);
        for param in params {
            query = match param {
                SqlValue::Bool(value) => query.bind(value),
                SqlValue::Text(value) => query.bind(value),
            };
        }
        let result = query
            .execute(&*self.pool)
            .await
            .with_context(|| format!("updating {}", self.table))
            .map_err(backend)?;
        tracing::debug!(rows = result.rows_affected(), %sql, "update applied");
        Ok(result.rows_affected())
    }
}
