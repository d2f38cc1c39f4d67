//! In-memory catalog storage.
//!
//! Records live behind a single `RwLock`; every write validates all of its
//! payloads before touching the tables, so a failed call leaves the store
//! unchanged.

mod catalog;
mod eval;

pub use catalog::CatalogStore;

#[cfg(test)]
mod tests;
