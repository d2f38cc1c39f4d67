//! Everything a field read needs besides the record itself.

use catalog_core::Context;
use catalog_uom::UomRegistry;

use crate::config::ProductConfig;

#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub ctx: &'a Context,
    pub uoms: &'a UomRegistry,
    pub config: &'a ProductConfig,
}

impl<'a> Scope<'a> {
    pub fn new(ctx: &'a Context, uoms: &'a UomRegistry, config: &'a ProductConfig) -> Self {
        Self { ctx, uoms, config }
    }
}
