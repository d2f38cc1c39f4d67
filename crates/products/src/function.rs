//! Variant fields that read and search through the template.

use std::sync::Arc;

use crate::field::{Field, Storage};
use crate::order::{Column, OrderFn, Tables};
use crate::template;

/// Getter used by every template proxy.
pub const GET_TEMPLATE: &str = "get_template";
/// Searcher used by every template proxy.
pub const SEARCH_TEMPLATE: &str = "search_template";

/// A variant field computed from the template field of the same name.
///
/// `Clone` is a shallow copy: both copies share the wrapped template
/// descriptor. Use [`TemplateFunction::deep_copy`] for an independent one.
#[derive(Debug, Clone)]
pub struct TemplateFunction {
    field: Arc<Field>,
}

impl TemplateFunction {
    pub fn new(field: Field) -> Self {
        Self {
            field: Arc::new(field),
        }
    }

    /// The wrapped template descriptor.
    pub fn inner(&self) -> &Field {
        &self.field
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Descriptor as seen on the variant model.
    pub fn field(&self) -> Field {
        let mut field = (*self.field).clone();
        field.storage = Storage::Function {
            getter: GET_TEMPLATE,
            searcher: Some(SEARCH_TEMPLATE),
        };
        field
    }

    pub fn deep_copy(&self) -> Self {
        Self::new((*self.field).clone())
    }

    pub fn shares_descriptor(&self, other: &TemplateFunction) -> bool {
        Arc::ptr_eq(&self.field, &other.field)
    }

    /// Order helper sorting variants on template column `name`.
    pub fn order(name: &str) -> OrderFn {
        let name = name.to_string();
        Arc::new(move |tables: &mut Tables| {
            let template = tables.join("template", template::TABLE, "template");
            vec![Column::new(&template, name.clone())]
        })
    }
}
