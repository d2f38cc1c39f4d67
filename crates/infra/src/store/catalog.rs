use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::instrument;

use catalog_core::{
    CategoryId, Context, DomainError, DomainResult, Entity, ProductId, TemplateId, Value,
};
use catalog_products::field::Storage;
use catalog_products::{
    product, template, Direction, Domain, GlobalHit, ModelField, Operator, Pool, Product, ProductConfig,
    ProductValues, Scope, Template, TemplateCategory, TemplateValues,
};
use catalog_uom::UomRegistry;

fn missing<E: Entity>(id: impl fmt::Display) -> DomainError {
    DomainError::not_found(format!("{} {id}", E::MODEL))
}

#[derive(Debug, Default)]
pub(super) struct Records {
    pub(super) templates: BTreeMap<TemplateId, Template>,
    pub(super) products: BTreeMap<ProductId, Product>,
    pub(super) template_categories: BTreeSet<TemplateCategory>,
}

impl Records {
    pub(super) fn template(&self, id: TemplateId) -> DomainResult<&Template> {
        self.templates
            .get(&id)
            .ok_or_else(|| missing::<Template>(id))
    }

    pub(super) fn product(&self, id: ProductId) -> DomainResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| missing::<Product>(id))
    }

    /// Template of a stored variant.
    pub(super) fn template_of(&self, product: &Product) -> DomainResult<&Template> {
        self.templates.get(&product.template).ok_or_else(|| {
            DomainError::invariant(format!(
                "product {} references missing template {}",
                product.id, product.template
            ))
        })
    }

    fn sync_categories(&mut self, template: TemplateId, categories: &[CategoryId]) {
        self.template_categories.retain(|row| row.template != template);
        self.template_categories.extend(
            categories
                .iter()
                .map(|category| TemplateCategory::new(template, *category)),
        );
    }
}

/// Catalog records plus the model registry and units they are read with.
#[derive(Debug)]
pub struct CatalogStore {
    pub(super) pool: Arc<Pool>,
    pub(super) uoms: Arc<UomRegistry>,
    pub(super) config: ProductConfig,
    records: RwLock<Records>,
}

impl CatalogStore {
    pub fn new(pool: Arc<Pool>, uoms: Arc<UomRegistry>, config: ProductConfig) -> Self {
        Self {
            pool,
            uoms,
            config,
            records: RwLock::new(Records::default()),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn uoms(&self) -> &UomRegistry {
        &self.uoms
    }

    pub(super) fn scope<'a>(&'a self, ctx: &'a Context) -> Scope<'a> {
        Scope::new(ctx, &self.uoms, &self.config)
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, Records>> {
        self.records
            .read()
            .map_err(|_| DomainError::storage("catalog store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, Records>> {
        self.records
            .write()
            .map_err(|_| DomainError::storage("catalog store lock poisoned"))
    }

    /// Defaults of a blank template form, default variant included.
    pub fn default_get_template(&self, ctx: &Context) -> TemplateValues {
        Template::default_get(ctx)
    }

    /// Create templates together with their variants and category links.
    #[instrument(skip(self, ctx, vlist), fields(user = %ctx.user(), count = vlist.len()), err)]
    pub fn create_templates(
        &self,
        ctx: &Context,
        vlist: &[TemplateValues],
    ) -> DomainResult<Vec<TemplateId>> {
        let now = Utc::now();
        let mut staged = Vec::with_capacity(vlist.len());
        for values in Template::prepare_create(ctx, vlist) {
            Template::check_prices(&values, &self.config)?;
            let mut template = Template::from_values(ctx, &values, now)?;
            self.uoms.get(template.default_uom)?;
            let variants = values
                .products
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|variant| {
                    let variant = ProductValues {
                        template: Some(template.id),
                        ..variant.clone()
                    };
                    Product::from_values(&variant, now)
                })
                .collect::<DomainResult<Vec<_>>>()?;
            template.products = variants.iter().map(|p| p.id).collect();
            staged.push((template, variants));
        }

        let mut records = self.write()?;
        let mut ids = Vec::with_capacity(staged.len());
        for (template, variants) in staged {
            tracing::debug!(
                template_id = %template.id,
                variants = variants.len(),
                "creating template"
            );
            records.sync_categories(template.id, &template.categories);
            for variant in variants {
                records.products.insert(variant.id, variant);
            }
            ids.push(template.id);
            records.templates.insert(template.id, template);
        }
        Ok(ids)
    }

    #[instrument(skip(self, ctx, vlist), fields(user = %ctx.user(), count = vlist.len()), err)]
    pub fn create_products(
        &self,
        ctx: &Context,
        vlist: &[ProductValues],
    ) -> DomainResult<Vec<ProductId>> {
        let now = Utc::now();
        let mut records = self.write()?;
        let staged = vlist
            .iter()
            .map(|values| {
                let product = Product::from_values(values, now)?;
                records.template(product.template)?;
                Ok(product)
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let mut ids = Vec::with_capacity(staged.len());
        for product in staged {
            if let Some(template) = records.templates.get_mut(&product.template) {
                template.products.push(product.id);
            }
            ids.push(product.id);
            records.products.insert(product.id, product);
        }
        Ok(ids)
    }

    #[instrument(skip(self, ctx, values), fields(user = %ctx.user(), count = ids.len()), err)]
    pub fn write_templates(
        &self,
        ctx: &Context,
        ids: &[TemplateId],
        values: &TemplateValues,
    ) -> DomainResult<()> {
        Template::check_prices(values, &self.config)?;
        if let Some(uom) = values.default_uom {
            self.uoms.get(uom)?;
        }
        let now = Utc::now();
        let mut records = self.write()?;
        let mut staged = Vec::with_capacity(ids.len());
        for id in ids {
            let mut template = records.template(*id)?.clone();
            template.write(ctx, values, now)?;
            staged.push(template);
        }
        for template in staged {
            if values.categories.is_some() {
                records.sync_categories(template.id, &template.categories);
            }
            records.templates.insert(template.id, template);
        }
        Ok(())
    }

    /// Write variants. Changing `template` moves the variant to the new one.
    #[instrument(skip(self, ctx, values), fields(user = %ctx.user(), count = ids.len()), err)]
    pub fn write_products(
        &self,
        ctx: &Context,
        ids: &[ProductId],
        values: &ProductValues,
    ) -> DomainResult<()> {
        let now = Utc::now();
        let mut records = self.write()?;
        if let Some(template) = values.template {
            records.template(template)?;
        }
        let mut staged = Vec::with_capacity(ids.len());
        for id in ids {
            let mut product = records.product(*id)?.clone();
            let previous = product.template;
            product.write(values, now);
            staged.push((previous, product));
        }
        for (previous, product) in staged {
            if previous != product.template {
                if let Some(old) = records.templates.get_mut(&previous) {
                    old.products.retain(|p| *p != product.id);
                }
                if let Some(new) = records.templates.get_mut(&product.template) {
                    new.products.push(product.id);
                }
            }
            records.products.insert(product.id, product);
        }
        Ok(())
    }

    /// Delete templates with their variants and category links.
    #[instrument(skip(self, ctx), fields(user = %ctx.user()), err)]
    pub fn delete_templates(&self, ctx: &Context, ids: &[TemplateId]) -> DomainResult<()> {
        let mut records = self.write()?;
        for id in ids {
            records.template(*id)?;
        }
        let doomed: BTreeSet<TemplateId> = ids.iter().copied().collect();
        let before_products = records.products.len();
        let before_links = records.template_categories.len();

        records.templates.retain(|id, _| !doomed.contains(id));
        records.products.retain(|_, p| !doomed.contains(&p.template));
        records
            .template_categories
            .retain(|row| !doomed.contains(&row.template));

        tracing::info!(
            templates = doomed.len(),
            products = before_products - records.products.len(),
            template_categories = before_links - records.template_categories.len(),
            "deleted templates"
        );
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(user = %ctx.user()), err)]
    pub fn delete_products(&self, ctx: &Context, ids: &[ProductId]) -> DomainResult<()> {
        let mut records = self.write()?;
        for id in ids {
            records.product(*id)?;
        }
        for id in ids {
            if let Some(product) = records.products.remove(id) {
                if let Some(template) = records.templates.get_mut(&product.template) {
                    template.products.retain(|p| p != id);
                }
            }
        }
        Ok(())
    }

    /// Link templates to categories. Existing links are left as they are.
    pub fn create_template_categories(&self, rows: &[TemplateCategory]) -> DomainResult<()> {
        let mut records = self.write()?;
        for row in rows {
            records.template(row.template)?;
        }
        for row in rows {
            if records.template_categories.insert(*row) {
                if let Some(template) = records.templates.get_mut(&row.template) {
                    template.categories.push(row.category);
                    template.categories.sort();
                }
            }
        }
        Ok(())
    }

    pub fn delete_template_categories(&self, rows: &[TemplateCategory]) -> DomainResult<()> {
        let mut records = self.write()?;
        for row in rows {
            if records.template_categories.remove(row) {
                if let Some(template) = records.templates.get_mut(&row.template) {
                    template.categories.retain(|c| *c != row.category);
                }
            }
        }
        Ok(())
    }

    pub fn template_categories(&self, template: TemplateId) -> DomainResult<Vec<TemplateCategory>> {
        Ok(self
            .read()?
            .template_categories
            .iter()
            .filter(|row| row.template == template)
            .copied()
            .collect())
    }

    pub fn template(&self, id: TemplateId) -> DomainResult<Template> {
        self.read()?.template(id).cloned()
    }

    pub fn product(&self, id: ProductId) -> DomainResult<Product> {
        self.read()?.product(id).cloned()
    }

    /// Read a template field as seen from `ctx`.
    pub fn read_template(&self, ctx: &Context, id: TemplateId, field: &str) -> DomainResult<Value> {
        self.pool.get(template::MODEL)?.require_field(field)?;
        let records = self.read()?;
        let template = records.template(id)?;
        Ok(template.get(field, &self.scope(ctx))?.into_value())
    }

    /// Read a variant field as seen from `ctx`, proxies included.
    pub fn read_product(&self, ctx: &Context, id: ProductId, field: &str) -> DomainResult<Value> {
        let records = self.read()?;
        let product = records.product(id)?;
        self.product_value(&records, &self.scope(ctx), product, field)
    }

    pub(super) fn product_value(
        &self,
        records: &Records,
        scope: &Scope<'_>,
        product: &Product,
        name: &str,
    ) -> DomainResult<Value> {
        let model = self.pool.get(product::MODEL)?;
        match model.require_field(name)? {
            ModelField::Proxy(_) => product.get_template(records.template_of(product)?, name, scope),
            ModelField::Field(field) => match &field.storage {
                Storage::Column => product.get_column(name),
                Storage::Function { getter, .. } if *getter == product::GET_PRICE_UOM => {
                    let template = records.template_of(product)?;
                    let mut prices = Product::get_price_uom(&[(product, template)], name, scope)?;
                    Ok(prices.remove(&product.id).flatten().into())
                }
                Storage::Function { getter, .. } if *getter == product::GET_REC_NAME => {
                    Ok(Value::Char(product.rec_name(records.template_of(product)?, scope)?))
                }
                Storage::Function { getter, .. } => Err(DomainError::invariant(format!(
                    "no getter `{getter}` on {}",
                    product::MODEL
                ))),
                Storage::Property => Err(DomainError::invariant(format!(
                    "unexpected property field `{name}` on {}",
                    product::MODEL
                ))),
            },
        }
    }

    /// Variants matching `domain`, sorted by `order`.
    #[instrument(skip(self, ctx, domain, order), fields(user = %ctx.user()), err)]
    pub fn search_products(
        &self,
        ctx: &Context,
        domain: &Domain,
        order: &[(&str, Direction)],
    ) -> DomainResult<Vec<ProductId>> {
        let records = self.read()?;
        let scope = self.scope(ctx);
        let mut matched = Vec::new();
        for product in records.products.values() {
            if self.product_matches(&records, &scope, product, domain)? {
                matched.push(product);
            }
        }
        let ids = self.sort_products(&records, &scope, matched, order)?;
        tracing::debug!(found = ids.len(), "searched products");
        Ok(ids)
    }

    /// Templates matching `domain`, sorted by `order`.
    #[instrument(skip(self, ctx, domain, order), fields(user = %ctx.user()), err)]
    pub fn search_templates(
        &self,
        ctx: &Context,
        domain: &Domain,
        order: &[(&str, Direction)],
    ) -> DomainResult<Vec<TemplateId>> {
        let records = self.read()?;
        let scope = self.scope(ctx);
        let mut matched = Vec::new();
        for template in records.templates.values() {
            if self.template_matches(&records, &scope, template, domain)? {
                matched.push(template);
            }
        }
        self.sort_templates(&scope, matched, order)
    }

    /// Fuzzy search on the display name of `model` records.
    #[instrument(skip(self, ctx), fields(user = %ctx.user()), err)]
    pub fn search_global(&self, ctx: &Context, model: &str, text: &str) -> DomainResult<Vec<GlobalHit>> {
        let pattern = Value::Char(format!("%{text}%"));
        let domain = Domain::leaf("rec_name", Operator::ILike, pattern);
        let scope = self.scope(ctx);

        match model {
            template::MODEL => {
                let ids = self.search_templates(ctx, &domain, &[("name", Direction::Asc)])?;
                let records = self.read()?;
                let hits = ids
                    .into_iter()
                    .map(|id| {
                        let template = records.template(id)?;
                        Ok(GlobalHit {
                            model: template::MODEL.to_string(),
                            id: *id.as_uuid(),
                            rec_name: template.name.clone(),
                            icon: None,
                        })
                    })
                    .collect::<DomainResult<Vec<_>>>()?;
                Ok(Template::search_global(hits).collect())
            }
            product::MODEL => {
                let ids = self.search_products(ctx, &domain, &[("rec_name", Direction::Asc)])?;
                let records = self.read()?;
                let hits = ids
                    .into_iter()
                    .map(|id| {
                        let product = records.product(id)?;
                        Ok(GlobalHit {
                            model: product::MODEL.to_string(),
                            id: *id.as_uuid(),
                            rec_name: product.rec_name(records.template_of(product)?, &scope)?,
                            icon: None,
                        })
                    })
                    .collect::<DomainResult<Vec<_>>>()?;
                Ok(Product::search_global(hits).collect())
            }
            other => Err(DomainError::not_found(format!("model {other}"))),
        }
    }
}
