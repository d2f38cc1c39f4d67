//! Storage and schema plumbing for the product catalog.

pub mod migration;
pub mod store;

pub use migration::{
    register_template_table, InMemoryTable, MigrationError, MigrationReport, PostgresTableHandler,
    TableHandler,
};
pub use store::CatalogStore;
