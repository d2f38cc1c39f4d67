//! Domain evaluation and ordering over the in-memory records.

use std::cmp::Ordering;

use catalog_core::{DomainError, DomainResult, ProductId, TemplateId, UomId, Value};
use catalog_products::field::{FieldType, Storage};
use catalog_products::{
    product, template, Clause, Column, Direction, Domain, ModelField, Product, Scope, Tables,
    Template,
};

use super::catalog::{CatalogStore, Records};

type SortKey = Vec<(Value, Direction)>;

impl CatalogStore {
    pub(super) fn product_matches(
        &self,
        records: &Records,
        scope: &Scope<'_>,
        product: &Product,
        domain: &Domain,
    ) -> DomainResult<bool> {
        domain.eval_with(&mut |clause| self.product_clause(records, scope, product, clause))
    }

    fn product_clause(
        &self,
        records: &Records,
        scope: &Scope<'_>,
        product: &Product,
        clause: &Clause,
    ) -> DomainResult<bool> {
        let (head, rest) = clause.split_path();
        let model = self.pool.get(product::MODEL)?;
        match model.require_field(head)? {
            ModelField::Proxy(_) => {
                let domain = Product::search_template(head, clause);
                self.product_matches(records, scope, product, &domain)
            }
            ModelField::Field(field) => match &field.storage {
                Storage::Function {
                    searcher: Some(searcher),
                    ..
                } if *searcher == product::SEARCH_REC_NAME => {
                    let domain = Product::search_rec_name(head, clause);
                    self.product_matches(records, scope, product, &domain)
                }
                Storage::Function { .. } | Storage::Property => Err(not_searchable(product::MODEL, head)),
                Storage::Column => match (head, rest) {
                    ("template", Some(rest)) => {
                        let template = records.template_of(product)?;
                        self.template_clause(records, scope, template, &clause.with_path(rest))
                    }
                    (_, Some(_)) => Err(not_traversable(product::MODEL, head)),
                    (_, None) => clause.operator.matches(&product.get_column(head)?, &clause.value),
                },
            },
        }
    }

    pub(super) fn template_matches(
        &self,
        records: &Records,
        scope: &Scope<'_>,
        template: &Template,
        domain: &Domain,
    ) -> DomainResult<bool> {
        domain.eval_with(&mut |clause| self.template_clause(records, scope, template, clause))
    }

    fn template_clause(
        &self,
        records: &Records,
        scope: &Scope<'_>,
        template: &Template,
        clause: &Clause,
    ) -> DomainResult<bool> {
        let (head, rest) = clause.split_path();
        let model = self.pool.get(template::MODEL)?;
        let field = model.require_field(head)?.descriptor();

        if let Storage::Function { searcher, .. } = &field.storage {
            let domain = match *searcher {
                Some(template::SEARCH_REC_NAME) => Template::search_rec_name(head, clause),
                Some(template::SEARCH_DEFAULT_UOM_CATEGORY) => {
                    Template::search_default_uom_category(head, clause)
                }
                _ => return Err(not_searchable(template::MODEL, head)),
            };
            return self.template_matches(records, scope, template, &domain);
        }

        let Some(rest) = rest else {
            let value = template.get(head, scope)?.into_value();
            return clause.operator.matches(&value, &clause.value);
        };
        match (&field.ty, head) {
            (FieldType::Many2One { .. }, "default_uom") => {
                let value = self.uom_value(template.default_uom, rest)?;
                clause.operator.matches(&value, &clause.value)
            }
            (FieldType::One2Many { .. }, "products") => {
                let inner = clause.with_path(rest);
                for id in &template.products {
                    let product = records.product(*id)?;
                    if self.product_clause(records, scope, product, &inner)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(not_traversable(template::MODEL, head)),
        }
    }

    /// Sort value of a template column. The unit of measure sorts by name.
    fn template_order_value(
        &self,
        template: &Template,
        name: &str,
        scope: &Scope<'_>,
    ) -> DomainResult<Value> {
        match name {
            "default_uom" => self.uom_value(template.default_uom, "name"),
            _ => Ok(template.get(name, scope)?.into_value()),
        }
    }

    fn uom_value(&self, id: UomId, name: &str) -> DomainResult<Value> {
        let uom = self.uoms.get(id)?;
        Ok(match name {
            "id" => Value::Id(*uom.id.as_uuid()),
            "name" | "rec_name" => Value::Char(uom.name.clone()),
            "symbol" => Value::Char(uom.symbol.clone()),
            "category" => Value::Id(*uom.category.as_uuid()),
            "factor" => Value::Numeric(uom.factor),
            "rate" => Value::Numeric(uom.rate),
            "rounding" => Value::Numeric(uom.rounding),
            "active" => Value::Boolean(uom.active),
            other => return Err(DomainError::unknown_field("product.uom", other)),
        })
    }

    pub(super) fn sort_products(
        &self,
        records: &Records,
        scope: &Scope<'_>,
        products: Vec<&Product>,
        order: &[(&str, Direction)],
    ) -> DomainResult<Vec<ProductId>> {
        let model = self.pool.get(product::MODEL)?;
        let mut keyed = Vec::with_capacity(products.len());
        for product in products {
            let mut key = SortKey::new();
            for (name, direction) in order {
                if let Some(order_fn) = model.order_fn(name) {
                    let mut tables = Tables::new(product::TABLE);
                    for column in (**order_fn)(&mut tables) {
                        let value = self.product_column(records, scope, product, &tables, &column)?;
                        key.push((value, *direction));
                    }
                    continue;
                }
                match model.require_field(name)? {
                    ModelField::Field(field) if matches!(field.storage, Storage::Column) => {
                        key.push((product.get_column(name)?, *direction));
                    }
                    _ => return Err(not_orderable(product::MODEL, name)),
                }
            }
            keyed.push((key, product.id));
        }
        keyed.sort_by(|(a, a_id), (b, b_id)| compare_keys(a, b).then_with(|| a_id.cmp(b_id)));
        Ok(keyed.into_iter().map(|(_, id)| id).collect())
    }

    /// Value of an order column, resolved through the join it belongs to.
    fn product_column(
        &self,
        records: &Records,
        scope: &Scope<'_>,
        product: &Product,
        tables: &Tables,
        column: &Column,
    ) -> DomainResult<Value> {
        if column.alias == tables.root().alias {
            return product.get_column(&column.name);
        }
        match tables.join_name(&column.alias) {
            Some("template") => {
                let template = records.template_of(product)?;
                self.template_order_value(template, &column.name, scope)
            }
            _ => Err(DomainError::invariant(format!(
                "order column {column} has no known table"
            ))),
        }
    }

    pub(super) fn sort_templates(
        &self,
        scope: &Scope<'_>,
        templates: Vec<&Template>,
        order: &[(&str, Direction)],
    ) -> DomainResult<Vec<TemplateId>> {
        let model = self.pool.get(template::MODEL)?;
        for (name, _) in order {
            if model.require_field(name)?.descriptor().is_x2many() {
                return Err(not_orderable(template::MODEL, name));
            }
        }
        let mut keyed = Vec::with_capacity(templates.len());
        for template in templates {
            let key = order
                .iter()
                .map(|(name, direction)| {
                    Ok((self.template_order_value(template, name, scope)?, *direction))
                })
                .collect::<DomainResult<SortKey>>()?;
            keyed.push((key, template.id));
        }
        keyed.sort_by(|(a, a_id), (b, b_id)| compare_keys(a, b).then_with(|| a_id.cmp(b_id)));
        Ok(keyed.into_iter().map(|(_, id)| id).collect())
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    a.iter()
        .zip(b)
        .map(|((left, direction), (right, _))| match direction {
            Direction::Asc => left.cmp_for_order(right),
            Direction::Desc => right.cmp_for_order(left),
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn not_searchable(model: &str, field: &str) -> DomainError {
    DomainError::invalid_clause(format!("{model}.{field} cannot be searched"))
}

fn not_traversable(model: &str, field: &str) -> DomainError {
    DomainError::invalid_clause(format!("{model}.{field} cannot be traversed"))
}

fn not_orderable(model: &str, field: &str) -> DomainError {
    DomainError::invalid_clause(format!("{model}.{field} cannot be ordered"))
}
