//! Schema migrations run when the catalog tables are registered.

mod handler;
mod memory;
mod postgres;
mod template;

pub use handler::{Filter, NotNullAction, SqlValue, TableHandler, Update};
pub use memory::InMemoryTable;
pub use postgres::PostgresTableHandler;
pub use template::{register_template_table, MigrationReport};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("table `{table}` has no column `{column}`")]
    UnknownColumn { table: String, column: String },

    #[error("backend error: {0}")]
    Backend(String),
}
