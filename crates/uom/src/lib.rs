//! Units of measure.
//!
//! Units are grouped in categories (weight, length, ...). Conversion is only
//! defined between units of the same category.

pub mod uom;

pub use uom::{Uom, UomCategory, UomRegistry};
