//! Template/category association rows.

use serde::{Deserialize, Serialize};

use catalog_core::{CategoryId, TemplateId};

use crate::field::{Field, FieldType};
use crate::template;

pub const MODEL: &str = "product.template-product.category";
pub const TABLE: &str = "product_template-product_category";

pub fn fields() -> Vec<Field> {
    vec![
        Field::new(
            "template",
            "Template",
            FieldType::Many2One {
                target: template::MODEL,
            },
        )
        .required()
        .select(),
        Field::new(
            "category",
            "Category",
            FieldType::Many2One {
                target: "product.category",
            },
        )
        .required()
        .select(),
    ]
}

/// One (template, category) link. Both sides cascade on delete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateCategory {
    pub template: TemplateId,
    pub category: CategoryId,
}

impl TemplateCategory {
    pub fn new(template: TemplateId, category: CategoryId) -> Self {
        Self { template, category }
    }
}
