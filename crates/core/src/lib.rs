//! `catalog-core`: shared building blocks for the product catalog.
//!
//! This crate contains identifiers, the domain error model, field values and the
//! per-call transaction context. It has no storage concerns.

pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod value;
pub mod value_object;

pub use context::Context;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, CompanyId, ProductId, TemplateId, UomCategoryId, UomId, UserId};
pub use value::Value;
pub use value_object::ValueObject;
