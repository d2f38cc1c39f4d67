//! Product catalog: templates, variants and their categories.
//!
//! Templates carry the shared attributes; variants read them through
//! template proxies installed when the [`Pool`] is built. This crate is pure
//! domain logic: storage and migrations live in `catalog-infra`.

pub mod category;
pub mod config;
pub mod domain;
pub mod field;
pub mod function;
pub mod global;
pub mod order;
pub mod pool;
pub mod product;
pub mod property;
pub mod scope;
pub mod template;

pub use category::TemplateCategory;
pub use config::{ConfigError, ProductConfig};
pub use domain::{Clause, Domain, Operator};
pub use function::TemplateFunction;
pub use global::GlobalHit;
pub use order::{Column, Direction, Tables};
pub use pool::{ModelDef, ModelField, Pool};
pub use product::{Product, ProductForm, ProductValues};
pub use property::Property;
pub use scope::Scope;
pub use template::{CostPriceMethod, FieldValue, Template, TemplateType, TemplateValues};
