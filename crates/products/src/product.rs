//! Product variants.
//!
//! A variant belongs to exactly one template. Apart from its own code,
//! description and active flag, every field it exposes is read, searched and
//! ordered through the template.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, Entity, ProductId, TemplateId, Value};

use crate::config::ProductConfig;
use crate::domain::{Clause, Domain};
use crate::field::{Field, FieldType, States};
use crate::function::TemplateFunction;
use crate::global::{with_fallback_icon, GlobalHit};
use crate::order::{Column, Tables};
use crate::pool::{ModelDef, ModelField};
use crate::scope::Scope;
use crate::template::{self, Template, PRODUCT_ICON};

pub const MODEL: &str = "product.product";
pub const TABLE: &str = "product_product";

pub const GET_PRICE_UOM: &str = "get_price_uom";
pub const GET_REC_NAME: &str = "get_rec_name";
pub const SEARCH_REC_NAME: &str = "search_rec_name";

/// Template fields never proxied on the variant.
pub const NO_TEMPLATE_FIELD: &[&str] = &["products"];

/// Field declarations of the variant model, before template proxies.
pub fn fields(config: &ProductConfig) -> Vec<Field> {
    let price_digits = config.price_digits();
    vec![
        Field::new("id", "ID", FieldType::Id),
        Field::new("create_date", "Created", FieldType::DateTime),
        Field::new("write_date", "Edited", FieldType::DateTime),
        Field::new("rec_name", "Name", FieldType::Char).function(GET_REC_NAME, Some(SEARCH_REC_NAME)),
        Field::new(
            "template",
            "Product Template",
            FieldType::Many2One {
                target: template::MODEL,
            },
        )
        .required()
        .select()
        .states(States::readonly_when_inactive(), &["active"]),
        Field::new("code", "Code", FieldType::Char)
            .select()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new("description", "Description", FieldType::Text)
            .translate()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new("active", "Active", FieldType::Boolean).select(),
        Field::new("list_price_uom", "List Price", FieldType::Numeric { digits: price_digits })
            .function(GET_PRICE_UOM, None),
        Field::new("cost_price_uom", "Cost Price", FieldType::Numeric { digits: price_digits })
            .function(GET_PRICE_UOM, None),
    ]
}

/// Create/write payload of a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductValues {
    pub template: Option<TemplateId>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub template: TemplateId,
    pub code: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub create_date: DateTime<Utc>,
    pub write_date: Option<DateTime<Utc>>,
}

impl Entity for Product {
    type Id = ProductId;
    const MODEL: &'static str = MODEL;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// In-memory state of a variant form being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub template: Option<TemplateId>,
    pub values: BTreeMap<String, Value>,
}

impl Product {
    pub fn default_active() -> bool {
        true
    }

    /// A payload with every field at its default.
    pub fn default_values() -> ProductValues {
        ProductValues {
            active: Some(Self::default_active()),
            ..ProductValues::default()
        }
    }

    pub fn from_values(values: &ProductValues, now: DateTime<Utc>) -> DomainResult<Self> {
        let template = values.template.ok_or_else(|| DomainError::required("template"))?;
        Ok(Self {
            id: ProductId::new(),
            template,
            code: normalize(values.code.clone()),
            description: values.description.clone(),
            active: values.active.unwrap_or_else(Self::default_active),
            create_date: now,
            write_date: None,
        })
    }

    pub fn write(&mut self, values: &ProductValues, now: DateTime<Utc>) {
        if let Some(template) = values.template {
            self.template = template;
        }
        if let Some(code) = &values.code {
            self.code = normalize(Some(code.clone()));
        }
        if let Some(description) = &values.description {
            self.description = Some(description.clone());
        }
        if let Some(active) = values.active {
            self.active = active;
        }
        self.write_date = Some(now);
    }

    /// Value of a stored variant column.
    pub fn get_column(&self, name: &str) -> DomainResult<Value> {
        Ok(match name {
            "id" => Value::Id(*self.id.as_uuid()),
            "create_date" => Value::DateTime(self.create_date),
            "write_date" => self.write_date.into(),
            "template" => Value::Id(*self.template.as_uuid()),
            "code" => self.code.clone().into(),
            "description" => self.description.clone().into(),
            "active" => Value::Boolean(self.active),
            other => return Err(DomainError::unknown_field(MODEL, other)),
        })
    }

    /// Install the template proxies on the variant model.
    ///
    /// Every template field outside `excluded` that the variant does not
    /// declare itself becomes a [`TemplateFunction`]. Stored, non-relational
    /// fields also get an order helper joining the template table, unless the
    /// variant already has one for that name.
    pub fn setup(model: &mut ModelDef, template: &ModelDef, excluded: &BTreeSet<String>) {
        let mut installed = Vec::new();
        for (name, tfield) in template.fields() {
            if excluded.contains(name) {
                continue;
            }
            if matches!(model.field(name), Some(ModelField::Field(_))) {
                continue;
            }
            let tfield = tfield.descriptor();
            model.install_proxy(TemplateFunction::new(tfield.clone().into_owned()));
            if !model.has_order(name) && !tfield.is_function() && !tfield.is_x2many() {
                model.set_order(name, TemplateFunction::order(name));
            }
            installed.push(name.clone());
        }
        tracing::debug!(model = MODEL, proxies = ?installed, "installed template proxies");
    }

    /// Generic getter of the template proxies.
    ///
    /// A related record reads as its id, a list of related records as the
    /// list of ids; anything else is returned unchanged.
    pub fn get_template(&self, template: &Template, name: &str, scope: &Scope<'_>) -> DomainResult<Value> {
        if template.id != self.template {
            return Err(DomainError::invariant(format!(
                "product {} does not belong to template {}",
                self.id, template.id
            )));
        }
        Ok(template.get(name, scope)?.into_value())
    }

    /// Generic searcher of the template proxies.
    pub fn search_template(name: &str, clause: &Clause) -> Domain {
        let (_, rest) = clause.split_path();
        let path = match rest {
            Some(rest) => format!("template.{name}.{rest}"),
            None => format!("template.{name}"),
        };
        Domain::Leaf(clause.with_path(path))
    }

    /// Order on code, then on template name.
    pub fn order_rec_name(tables: &mut Tables) -> Vec<Column> {
        let code = Column::new(tables.root(), "code");
        let template = tables.join("template", template::TABLE, "template");
        vec![code, Column::new(&template, "name")]
    }

    /// `[code] name`, or just `name` for a variant without code.
    pub fn rec_name(&self, template: &Template, scope: &Scope<'_>) -> DomainResult<String> {
        let name = self.get_template(template, "name", scope)?;
        let name = name.as_str().unwrap_or_default();
        Ok(match &self.code {
            Some(code) => format!("[{code}] {name}"),
            None => name.to_string(),
        })
    }

    /// Match on the code or on the template name.
    ///
    /// A negative operator must hold for both, so the alternatives are
    /// combined with AND instead of OR.
    pub fn search_rec_name(_name: &str, clause: &Clause) -> Domain {
        let alternatives = vec![
            Domain::Leaf(clause.with_path("code")),
            Domain::Leaf(clause.with_path("template.name")),
        ];
        if clause.operator.is_negative() {
            Domain::And(alternatives)
        } else {
            Domain::Or(alternatives)
        }
    }

    /// Getter of `list_price_uom` and `cost_price_uom`.
    ///
    /// With a unit of measure in the context, the template price is converted
    /// from the template default unit into it.
    pub fn get_price_uom(
        products: &[(&Product, &Template)],
        name: &str,
        scope: &Scope<'_>,
    ) -> DomainResult<BTreeMap<ProductId, Option<Decimal>>> {
        let field = name
            .strip_suffix("_uom")
            .ok_or_else(|| DomainError::unknown_field(MODEL, name))?;

        let mut prices = BTreeMap::new();
        for (product, template) in products {
            let price = product
                .get_template(template, field, scope)?
                .as_decimal();
            let price = match (price, scope.ctx.uom()) {
                (Some(price), Some(to_uom)) => Some(scope.uoms.compute_price(
                    template.default_uom,
                    price,
                    to_uom,
                    scope.config.price_decimal(),
                )?),
                (price, _) => price,
            };
            prices.insert(product.id, price);
        }
        Ok(prices)
    }

    /// Refresh every proxy of `form` from the newly selected template, or
    /// clear them when the template was removed.
    pub fn on_change_template(
        form: &mut ProductForm,
        model: &ModelDef,
        template: Option<&Template>,
        scope: &Scope<'_>,
    ) -> DomainResult<()> {
        form.template = template.map(|t| t.id);
        for name in model.proxies() {
            let value = match template {
                Some(template) => template.get(name, scope)?.into_value(),
                None => Value::Null,
            };
            form.values.insert(name.to_string(), value);
        }
        Ok(())
    }

    pub fn search_global(hits: impl IntoIterator<Item = GlobalHit>) -> impl Iterator<Item = GlobalHit> {
        with_fallback_icon(hits, PRODUCT_ICON)
    }
}

fn normalize(code: Option<String>) -> Option<String> {
    code.filter(|c| !c.is_empty())
}
