//! Model registry.
//!
//! The pool owns the field and order-helper declarations of every catalog
//! model. Building it runs the variant setup once, which installs the
//! template proxies.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use catalog_core::{DomainError, DomainResult};

use crate::category;
use crate::config::ProductConfig;
use crate::field::Field;
use crate::function::TemplateFunction;
use crate::order::OrderFn;
use crate::product::{self, Product};
use crate::template;

/// A field as installed on a model.
#[derive(Debug, Clone)]
pub enum ModelField {
    Field(Field),
    Proxy(TemplateFunction),
}

impl ModelField {
    /// Descriptor of the field on this model.
    pub fn descriptor(&self) -> Cow<'_, Field> {
        match self {
            ModelField::Field(field) => Cow::Borrowed(field),
            ModelField::Proxy(proxy) => Cow::Owned(proxy.field()),
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, ModelField::Proxy(_))
    }
}

#[derive(Clone)]
pub struct ModelDef {
    name: &'static str,
    table: &'static str,
    fields: BTreeMap<String, ModelField>,
    order: BTreeMap<String, OrderFn>,
}

impl fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("order", &self.order.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelDef {
    pub fn new(name: &'static str, table: &'static str, fields: Vec<Field>) -> Self {
        Self {
            name,
            table,
            fields: fields
                .into_iter()
                .map(|f| (f.name.clone(), ModelField::Field(f)))
                .collect(),
            order: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &ModelField)> {
        self.fields.iter()
    }

    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.get(name)
    }

    pub fn require_field(&self, name: &str) -> DomainResult<&ModelField> {
        self.field(name)
            .ok_or_else(|| DomainError::unknown_field(self.name, name))
    }

    pub fn install_proxy(&mut self, proxy: TemplateFunction) {
        self.fields
            .insert(proxy.name().to_string(), ModelField::Proxy(proxy));
    }

    /// Names of the installed template proxies.
    pub fn proxies(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.is_proxy())
            .map(|(name, _)| name.as_str())
    }

    pub fn has_order(&self, name: &str) -> bool {
        self.order.contains_key(name)
    }

    pub fn set_order(&mut self, name: &str, order: OrderFn) {
        self.order.insert(name.to_string(), order);
    }

    pub fn order_fn(&self, name: &str) -> Option<&OrderFn> {
        self.order.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct Pool {
    models: BTreeMap<&'static str, ModelDef>,
    no_template_field: BTreeSet<String>,
    setup_done: bool,
}

impl Pool {
    /// Register the catalog models without running setup.
    pub fn new(config: &ProductConfig) -> Self {
        let mut product_model = ModelDef::new(product::MODEL, product::TABLE, product::fields(config));
        product_model.set_order("rec_name", std::sync::Arc::new(Product::order_rec_name));

        let mut models = BTreeMap::new();
        models.insert(
            template::MODEL,
            ModelDef::new(template::MODEL, template::TABLE, template::fields(config)),
        );
        models.insert(product::MODEL, product_model);
        models.insert(
            category::MODEL,
            ModelDef::new(category::MODEL, category::TABLE, category::fields()),
        );

        Self {
            models,
            no_template_field: product::NO_TEMPLATE_FIELD
                .iter()
                .map(|name| name.to_string())
                .collect(),
            setup_done: false,
        }
    }

    /// Register and set up the catalog models.
    pub fn build(config: &ProductConfig) -> Self {
        let mut pool = Self::new(config);
        pool.setup();
        pool
    }

    /// Keep a template field off the variant model. Only effective before
    /// [`Pool::setup`].
    pub fn exclude_template_field(&mut self, name: impl Into<String>) {
        self.no_template_field.insert(name.into());
    }

    /// Run the model setup steps. Subsequent calls are no-ops.
    pub fn setup(&mut self) {
        if self.setup_done {
            return;
        }
        let template_model = self.models.get(template::MODEL).cloned();
        if let (Some(template_model), Some(product_model)) =
            (template_model, self.models.get_mut(product::MODEL))
        {
            Product::setup(product_model, &template_model, &self.no_template_field);
        }
        self.setup_done = true;
        tracing::info!(models = self.models.len(), "catalog models set up");
    }

    pub fn get(&self, model: &str) -> DomainResult<&ModelDef> {
        self.models
            .get(model)
            .ok_or_else(|| DomainError::not_found(format!("model {model}")))
    }
}
