//! Product templates.
//!
//! A template holds the attributes shared by all of its variants: name, type,
//! prices, default unit of measure and categories.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use catalog_core::{
    CategoryId, Context, DomainError, DomainResult, Entity, ProductId, TemplateId, UomCategoryId,
    UomId, Value,
};
use catalog_uom::UomRegistry;

use crate::config::ProductConfig;
use crate::domain::{Clause, Domain};
use crate::field::{selection, Condition, Field, FieldType, States};
use crate::global::{with_fallback_icon, GlobalHit};
use crate::product::{self, Product, ProductValues};
use crate::property::Property;
use crate::scope::Scope;

pub const MODEL: &str = "product.template";
pub const TABLE: &str = "product_template";

/// Icon shown for catalog records in global search results.
pub const PRODUCT_ICON: &str = "catalog-product";

pub const GET_DEFAULT_UOM_CATEGORY: &str = "on_change_with_default_uom_category";
pub const SEARCH_DEFAULT_UOM_CATEGORY: &str = "search_default_uom_category";
pub const GET_REC_NAME: &str = "get_rec_name";
pub const SEARCH_REC_NAME: &str = "search_rec_name";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    #[default]
    Goods,
    Assets,
    Service,
}

impl TemplateType {
    pub const OPTIONS: [(&'static str, &'static str); 3] =
        [("goods", "Goods"), ("assets", "Assets"), ("service", "Service")];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Goods => "goods",
            TemplateType::Assets => "assets",
            TemplateType::Service => "service",
        }
    }
}

impl FromStr for TemplateType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "goods" => Ok(TemplateType::Goods),
            "assets" => Ok(TemplateType::Assets),
            "service" => Ok(TemplateType::Service),
            other => Err(DomainError::validation(format!(
                "unknown template type `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostPriceMethod {
    #[default]
    Fixed,
    Average,
}

impl CostPriceMethod {
    pub const OPTIONS: [(&'static str, &'static str); 2] =
        [("fixed", "Fixed"), ("average", "Average")];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostPriceMethod::Fixed => "fixed",
            CostPriceMethod::Average => "average",
        }
    }
}

/// Field declarations of the template model.
pub fn fields(config: &ProductConfig) -> Vec<Field> {
    let price_digits = config.price_digits();
    vec![
        Field::new("id", "ID", FieldType::Id),
        Field::new("create_date", "Created", FieldType::DateTime),
        Field::new("write_date", "Edited", FieldType::DateTime),
        Field::new("rec_name", "Name", FieldType::Char).function(GET_REC_NAME, Some(SEARCH_REC_NAME)),
        Field::new("name", "Name", FieldType::Char)
            .required()
            .translate()
            .select()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new("type", "Type", selection(&TemplateType::OPTIONS))
            .required()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new("consumable", "Consumable", FieldType::Boolean).states(
            States {
                readonly: Some(Condition::IsFalse {
                    field: "active",
                    default: true,
                }),
                invisible: Some(Condition::NotEqual {
                    field: "type",
                    value: "goods",
                    default: "goods",
                }),
            },
            &["active", "type"],
        ),
        Field::new("list_price", "List Price", FieldType::Numeric { digits: price_digits })
            .property()
            .required()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new("cost_price", "Cost Price", FieldType::Numeric { digits: price_digits })
            .property()
            .required()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new("cost_price_method", "Cost Method", selection(&CostPriceMethod::OPTIONS))
            .property()
            .required()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new("default_uom", "Default UOM", FieldType::Many2One { target: "product.uom" })
            .required()
            .states(States::readonly_when_inactive(), &["active"]),
        Field::new(
            "default_uom_category",
            "Default UOM Category",
            FieldType::Many2One {
                target: "product.uom.category",
            },
        )
        .function(GET_DEFAULT_UOM_CATEGORY, Some(SEARCH_DEFAULT_UOM_CATEGORY)),
        Field::new("active", "Active", FieldType::Boolean).select(),
        Field::new(
            "categories",
            "Categories",
            FieldType::Many2Many {
                relation: crate::category::MODEL,
                origin: "template",
                target: "category",
            },
        )
        .states(States::readonly_when_inactive(), &["active"]),
        Field::new(
            "products",
            "Variants",
            FieldType::One2Many {
                target: product::MODEL,
                field: "template",
            },
        )
        .states(States::readonly_when_inactive(), &["active"]),
    ]
}

/// Reference to another record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    pub model: &'static str,
    pub id: Uuid,
}

/// Raw value of a template field: related records stay records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Value(Value),
    Record(RecordRef),
    Records(Vec<RecordRef>),
}

impl FieldValue {
    /// Collapse related records into their identifiers.
    pub fn into_value(self) -> Value {
        match self {
            FieldValue::Value(value) => value,
            FieldValue::Record(record) => Value::Id(record.id),
            FieldValue::Records(records) => Value::Ids(records.into_iter().map(|r| r.id).collect()),
        }
    }
}

/// Create/write payload. `None` leaves a field to its default (create) or
/// unchanged (write).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateValues {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TemplateType>,
    pub consumable: Option<bool>,
    pub list_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub cost_price_method: Option<CostPriceMethod>,
    pub default_uom: Option<UomId>,
    pub active: Option<bool>,
    pub categories: Option<Vec<CategoryId>>,
    pub products: Option<Vec<ProductValues>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateType,
    pub consumable: bool,
    pub list_price: Property<Decimal>,
    pub cost_price: Property<Decimal>,
    pub cost_price_method: Property<CostPriceMethod>,
    pub default_uom: UomId,
    pub active: bool,
    pub categories: Vec<CategoryId>,
    pub products: Vec<ProductId>,
    pub create_date: DateTime<Utc>,
    pub write_date: Option<DateTime<Utc>>,
}

impl Entity for Template {
    type Id = TemplateId;
    const MODEL: &'static str = MODEL;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Template {
    pub fn default_active() -> bool {
        true
    }

    pub fn default_type() -> TemplateType {
        TemplateType::Goods
    }

    pub fn default_consumable() -> bool {
        false
    }

    pub fn default_cost_price_method() -> CostPriceMethod {
        CostPriceMethod::Fixed
    }

    /// Variants a new template starts with.
    ///
    /// The system user gets none: it creates templates while installing
    /// modules, before variants can be built.
    pub fn default_products(ctx: &Context) -> Vec<ProductValues> {
        if ctx.is_root() {
            return Vec::new();
        }
        vec![Product::default_values()]
    }

    /// Defaults of a blank template form.
    pub fn default_get(ctx: &Context) -> TemplateValues {
        TemplateValues {
            kind: Some(Self::default_type()),
            consumable: Some(Self::default_consumable()),
            cost_price_method: Some(Self::default_cost_price_method()),
            active: Some(Self::default_active()),
            products: Some(Self::default_products(ctx)),
            ..TemplateValues::default()
        }
    }

    pub fn on_change_with_default_uom_category(
        default_uom: Option<UomId>,
        uoms: &UomRegistry,
    ) -> Option<UomCategoryId> {
        default_uom.and_then(|uom| uoms.category_of(uom))
    }

    pub fn search_default_uom_category(_name: &str, clause: &Clause) -> Domain {
        Domain::Leaf(clause.with_path("default_uom.category"))
    }

    pub fn search_rec_name(_name: &str, clause: &Clause) -> Domain {
        Domain::Leaf(clause.with_path("name"))
    }

    /// Normalize create payloads so each one states its variants explicitly.
    ///
    /// A payload without `products` receives [`Template::default_products`];
    /// an explicit list, even an empty one, is kept.
    pub fn prepare_create(ctx: &Context, vlist: &[TemplateValues]) -> Vec<TemplateValues> {
        vlist
            .iter()
            .cloned()
            .map(|mut values| {
                values
                    .products
                    .get_or_insert_with(|| Self::default_products(ctx));
                values
            })
            .collect()
    }

    /// Check the prices of a create or write payload against the configured
    /// digits.
    pub fn check_prices(values: &TemplateValues, config: &ProductConfig) -> DomainResult<()> {
        if let Some(price) = values.list_price {
            config.check_price("list_price", price)?;
        }
        if let Some(price) = values.cost_price {
            config.check_price("cost_price", price)?;
        }
        Ok(())
    }

    /// Build a new template from a create payload.
    ///
    /// Variants listed in `values.products` are not created here.
    pub fn from_values(
        ctx: &Context,
        values: &TemplateValues,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = values.name.clone().ok_or_else(|| DomainError::required("name"))?;
        let list_price = values.list_price.ok_or_else(|| DomainError::required("list_price"))?;
        let cost_price = values.cost_price.ok_or_else(|| DomainError::required("cost_price"))?;
        let default_uom = values
            .default_uom
            .ok_or_else(|| DomainError::required("default_uom"))?;

        let mut list_price_prop = Property::default();
        list_price_prop.set(ctx, list_price);
        let mut cost_price_prop = Property::default();
        cost_price_prop.set(ctx, cost_price);
        let mut cost_price_method = Property::default();
        cost_price_method.set(
            ctx,
            values
                .cost_price_method
                .unwrap_or_else(Self::default_cost_price_method),
        );

        let mut categories = values.categories.clone().unwrap_or_default();
        categories.sort();
        categories.dedup();

        let template = Self {
            id: TemplateId::new(),
            name,
            kind: values.kind.unwrap_or_else(Self::default_type),
            consumable: values.consumable.unwrap_or_else(Self::default_consumable),
            list_price: list_price_prop,
            cost_price: cost_price_prop,
            cost_price_method,
            default_uom,
            active: values.active.unwrap_or_else(Self::default_active),
            categories,
            products: Vec::new(),
            create_date: now,
            write_date: None,
        };
        template.validate()?;
        Ok(template)
    }

    /// Apply a write payload. Variants are created and deleted through the
    /// variant model, never through a template write.
    pub fn write(
        &mut self,
        ctx: &Context,
        values: &TemplateValues,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if values.products.is_some() {
            return Err(DomainError::validation(
                "variants are created and deleted through product.product",
            ));
        }
        let mut updated = self.clone();
        if let Some(name) = &values.name {
            updated.name = name.clone();
        }
        if let Some(kind) = values.kind {
            updated.kind = kind;
        }
        if let Some(consumable) = values.consumable {
            updated.consumable = consumable;
        }
        if let Some(price) = values.list_price {
            updated.list_price.set(ctx, price);
        }
        if let Some(price) = values.cost_price {
            updated.cost_price.set(ctx, price);
        }
        if let Some(method) = values.cost_price_method {
            updated.cost_price_method.set(ctx, method);
        }
        if let Some(uom) = values.default_uom {
            updated.default_uom = uom;
        }
        if let Some(active) = values.active {
            updated.active = active;
        }
        if let Some(categories) = &values.categories {
            updated.categories = categories.clone();
            updated.categories.sort();
            updated.categories.dedup();
        }
        updated.validate()?;
        updated.write_date = Some(now);
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(())
    }

    /// Read field `name` as seen from `scope`.
    pub fn get(&self, name: &str, scope: &Scope<'_>) -> DomainResult<FieldValue> {
        let value = match name {
            "id" => Value::Id(*self.id.as_uuid()),
            "create_date" => Value::DateTime(self.create_date),
            "write_date" => self.write_date.into(),
            "name" | "rec_name" => Value::Char(self.name.clone()),
            "type" => Value::Selection(self.kind.as_str().to_string()),
            "consumable" => Value::Boolean(self.consumable),
            "list_price" => self.list_price.get(scope.ctx).into(),
            "cost_price" => self.cost_price.get(scope.ctx).into(),
            "cost_price_method" => self
                .cost_price_method
                .get(scope.ctx)
                .map(|m| Value::Selection(m.as_str().to_string()))
                .unwrap_or(Value::Null),
            "default_uom" => {
                return Ok(FieldValue::Record(RecordRef {
                    model: "product.uom",
                    id: *self.default_uom.as_uuid(),
                }));
            }
            "default_uom_category" => {
                return Ok(
                    match Self::on_change_with_default_uom_category(Some(self.default_uom), scope.uoms)
                    {
                        Some(category) => FieldValue::Record(RecordRef {
                            model: "product.uom.category",
                            id: *category.as_uuid(),
                        }),
                        None => FieldValue::Value(Value::Null),
                    },
                );
            }
            "active" => Value::Boolean(self.active),
            "categories" => {
                return Ok(FieldValue::Records(
                    self.categories
                        .iter()
                        .map(|c| RecordRef {
                            model: "product.category",
                            id: *c.as_uuid(),
                        })
                        .collect(),
                ));
            }
            "products" => {
                return Ok(FieldValue::Records(
                    self.products
                        .iter()
                        .map(|p| RecordRef {
                            model: product::MODEL,
                            id: *p.as_uuid(),
                        })
                        .collect(),
                ));
            }
            other => return Err(DomainError::unknown_field(MODEL, other)),
        };
        Ok(FieldValue::Value(value))
    }

    pub fn search_global(hits: impl IntoIterator<Item = GlobalHit>) -> impl Iterator<Item = GlobalHit> {
        with_fallback_icon(hits, PRODUCT_ICON)
    }
}
