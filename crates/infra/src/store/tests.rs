use std::sync::Arc;

use rust_decimal::Decimal;

use catalog_core::{CategoryId, CompanyId, Context, DomainError, UomId, UserId, Value};
use catalog_products::{
    product, template, Clause, Direction, Domain, Operator, Pool, ProductConfig, ProductValues,
    TemplateCategory, TemplateType, TemplateValues,
};
use catalog_uom::{Uom, UomCategory, UomRegistry};

use super::CatalogStore;

struct Fixture {
    store: CatalogStore,
    kg: UomId,
    g: UomId,
    unit: UomId,
}

impl Fixture {
    fn new() -> Self {
        catalog_observability::init_for_tests();
        let mut uoms = UomRegistry::new();
        let weight = uoms.add_category(UomCategory::new("Weight"));
        let kg = uoms
            .add_uom(Uom::new("Kilogram", "kg", weight, Decimal::ONE).unwrap())
            .unwrap();
        let g = uoms
            .add_uom(Uom::new("Gram", "g", weight, Decimal::new(1, 3)).unwrap())
            .unwrap();
        let units = uoms.add_category(UomCategory::new("Units"));
        let unit = uoms
            .add_uom(Uom::new("Unit", "u", units, Decimal::ONE).unwrap())
            .unwrap();

        let config = ProductConfig::default();
        let pool = Arc::new(Pool::build(&config));
        Self {
            store: CatalogStore::new(pool, Arc::new(uoms), config),
            kg,
            g,
            unit,
        }
    }

    fn values(&self, name: &str) -> TemplateValues {
        TemplateValues {
            name: Some(name.to_string()),
            list_price: Some(Decimal::from(20)),
            cost_price: Some(Decimal::from(10)),
            default_uom: Some(self.kg),
            ..TemplateValues::default()
        }
    }

    fn variant(code: &str) -> ProductValues {
        ProductValues {
            code: Some(code.to_string()),
            ..ProductValues::default()
        }
    }
}

fn user() -> Context {
    Context::new(UserId::new())
}

#[test]
fn create_without_products_adds_default_variant() {
    let fx = Fixture::new();
    let ids = fx.store.create_templates(&user(), &[fx.values("Widget")]).unwrap();

    let template = fx.store.template(ids[0]).unwrap();
    assert_eq!(template.products.len(), 1);
    let variant = fx.store.product(template.products[0]).unwrap();
    assert_eq!(variant.template, template.id);
    assert!(variant.active);
    assert_eq!(variant.code, None);
}

#[test]
fn root_gets_no_default_variant() {
    let fx = Fixture::new();
    let ids = fx
        .store
        .create_templates(&Context::root(), &[fx.values("Widget")])
        .unwrap();
    assert!(fx.store.template(ids[0]).unwrap().products.is_empty());
}

#[test]
fn explicit_products_are_kept() {
    let fx = Fixture::new();
    let values = TemplateValues {
        products: Some(vec![Fixture::variant("W-1"), Fixture::variant("W-2")]),
        ..fx.values("Widget")
    };
    let empty = TemplateValues {
        products: Some(Vec::new()),
        ..fx.values("Bare")
    };
    let ids = fx.store.create_templates(&user(), &[values, empty]).unwrap();

    assert_eq!(fx.store.template(ids[0]).unwrap().products.len(), 2);
    assert!(fx.store.template(ids[1]).unwrap().products.is_empty());
}

#[test]
fn failed_create_leaves_store_untouched() {
    let fx = Fixture::new();
    let missing_price = TemplateValues {
        list_price: None,
        ..fx.values("Broken")
    };
    let err = fx
        .store
        .create_templates(&user(), &[fx.values("Fine"), missing_price])
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let all = fx
        .store
        .search_templates(&user(), &Domain::all(), &[])
        .unwrap();
    assert!(all.is_empty());
}

#[test]
fn unknown_default_uom_is_rejected() {
    let fx = Fixture::new();
    let values = TemplateValues {
        default_uom: Some(UomId::new()),
        ..fx.values("Widget")
    };
    let err = fx.store.create_templates(&user(), &[values]).unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn proxies_read_the_template() {
    let fx = Fixture::new();
    let ctx = user();
    let ids = fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let template = fx.store.template(ids[0]).unwrap();
    let variant = template.products[0];

    for name in [
        "name",
        "type",
        "consumable",
        "list_price",
        "cost_price",
        "cost_price_method",
        "default_uom",
        "default_uom_category",
        "categories",
    ] {
        assert_eq!(
            fx.store.read_product(&ctx, variant, name).unwrap(),
            fx.store.read_template(&ctx, template.id, name).unwrap(),
            "proxy {name}"
        );
    }
    assert_eq!(
        fx.store.read_product(&ctx, variant, "default_uom").unwrap(),
        Value::Id(*fx.kg.as_uuid())
    );
}

#[test]
fn products_is_not_proxied() {
    let fx = Fixture::new();
    let ctx = user();
    let ids = fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let variant = fx.store.template(ids[0]).unwrap().products[0];
    let err = fx.store.read_product(&ctx, variant, "products").unwrap_err();
    assert!(matches!(err, DomainError::UnknownField { .. }));
}

#[test]
fn template_write_is_visible_through_proxy() {
    let fx = Fixture::new();
    let ctx = user();
    let ids = fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let variant = fx.store.template(ids[0]).unwrap().products[0];

    let update = TemplateValues {
        name: Some("Gizmo".to_string()),
        ..TemplateValues::default()
    };
    fx.store.write_templates(&ctx, &ids, &update).unwrap();
    assert_eq!(
        fx.store.read_product(&ctx, variant, "name").unwrap(),
        Value::Char("Gizmo".to_string())
    );
}

#[test]
fn company_prices_are_scoped() {
    let fx = Fixture::new();
    let company = CompanyId::new();
    let in_company = user().with_company(company);
    let ids = fx.store.create_templates(&user(), &[fx.values("Widget")]).unwrap();
    let variant = fx.store.template(ids[0]).unwrap().products[0];

    let update = TemplateValues {
        list_price: Some(Decimal::from(35)),
        ..TemplateValues::default()
    };
    fx.store.write_templates(&in_company, &ids, &update).unwrap();

    assert_eq!(
        fx.store.read_product(&in_company, variant, "list_price").unwrap(),
        Value::Numeric(Decimal::from(35))
    );
    assert_eq!(
        fx.store.read_product(&user(), variant, "list_price").unwrap(),
        Value::Numeric(Decimal::from(20))
    );
}

#[test]
fn price_uom_follows_context_unit() {
    let fx = Fixture::new();
    let ids = fx.store.create_templates(&user(), &[fx.values("Flour")]).unwrap();
    let variant = fx.store.template(ids[0]).unwrap().products[0];

    assert_eq!(
        fx.store.read_product(&user(), variant, "list_price_uom").unwrap(),
        Value::Numeric(Decimal::from(20))
    );
    assert_eq!(
        fx.store
            .read_product(&user().with_uom(fx.g), variant, "list_price_uom")
            .unwrap(),
        Value::Numeric(Decimal::from(20_000))
    );
    let err = fx
        .store
        .read_product(&user().with_uom(fx.unit), variant, "cost_price_uom")
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn rec_name_search_and_order() {
    let fx = Fixture::new();
    let ctx = user();
    let apple = TemplateValues {
        products: Some(vec![Fixture::variant("B-2"), ProductValues::default()]),
        ..fx.values("Apple")
    };
    let pear = TemplateValues {
        products: Some(vec![Fixture::variant("A-1")]),
        ..fx.values("Pear")
    };
    fx.store.create_templates(&ctx, &[apple, pear]).unwrap();

    let found = fx
        .store
        .search_products(
            &ctx,
            &Domain::leaf("rec_name", Operator::ILike, "%apple%"),
            &[("rec_name", Direction::Asc)],
        )
        .unwrap();
    let names: Vec<_> = found
        .iter()
        .map(|id| fx.store.read_product(&ctx, *id, "rec_name").unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            Value::Char("Apple".to_string()),
            Value::Char("[B-2] Apple".to_string()),
        ]
    );

    let by_code = fx
        .store
        .search_products(&ctx, &Domain::leaf("rec_name", Operator::ILike, "a-1"), &[])
        .unwrap();
    assert_eq!(by_code.len(), 1);

    let excluded = fx
        .store
        .search_products(&ctx, &Domain::leaf("rec_name", Operator::NotILike, "%apple%"), &[])
        .unwrap();
    assert_eq!(excluded.len(), 1);
    assert_eq!(
        fx.store.read_product(&ctx, excluded[0], "code").unwrap(),
        Value::Char("A-1".to_string())
    );
}

#[test]
fn proxy_search_and_order_go_through_template() {
    let fx = Fixture::new();
    let ctx = user();
    let service = TemplateValues {
        kind: Some(TemplateType::Service),
        ..fx.values("Repair")
    };
    fx.store
        .create_templates(&ctx, &[fx.values("Zinc"), fx.values("Bolt"), service])
        .unwrap();

    let goods = fx
        .store
        .search_products(
            &ctx,
            &Domain::leaf("type", Operator::Eq, "goods"),
            &[("name", Direction::Desc)],
        )
        .unwrap();
    let names: Vec<_> = goods
        .iter()
        .map(|id| fx.store.read_product(&ctx, *id, "name").unwrap())
        .collect();
    assert_eq!(
        names,
        vec![Value::Char("Zinc".to_string()), Value::Char("Bolt".to_string())]
    );
}

#[test]
fn default_uom_category_search_traverses_uom() {
    let fx = Fixture::new();
    let ctx = user();
    let pieces = TemplateValues {
        default_uom: Some(fx.unit),
        ..fx.values("Bolt")
    };
    fx.store
        .create_templates(&ctx, &[fx.values("Flour"), pieces])
        .unwrap();
    let weight = fx.store.uoms().category_of(fx.kg).unwrap();

    let found = fx
        .store
        .search_templates(
            &ctx,
            &Domain::leaf("default_uom_category", Operator::Eq, *weight.as_uuid()),
            &[],
        )
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(
        fx.store.read_template(&ctx, found[0], "name").unwrap(),
        Value::Char("Flour".to_string())
    );

    let variants = fx
        .store
        .search_products(
            &ctx,
            &Domain::leaf("default_uom.symbol", Operator::Eq, "u"),
            &[],
        )
        .unwrap();
    assert_eq!(variants.len(), 1);
}

#[test]
fn clause_on_unknown_field_fails() {
    let fx = Fixture::new();
    let ctx = user();
    fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let err = fx
        .store
        .search_products(
            &ctx,
            &Clause::parse("colour", "=", "red").unwrap().into(),
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::UnknownField { .. }));
}

#[test]
fn deleting_template_cascades() {
    let fx = Fixture::new();
    let ctx = user();
    let category = CategoryId::new();
    let values = TemplateValues {
        categories: Some(vec![category]),
        products: Some(vec![Fixture::variant("W-1"), Fixture::variant("W-2")]),
        ..fx.values("Widget")
    };
    let ids = fx.store.create_templates(&ctx, &[values, fx.values("Other")]).unwrap();
    assert_eq!(fx.store.template_categories(ids[0]).unwrap().len(), 1);

    fx.store.delete_templates(&ctx, &ids[..1]).unwrap();

    assert!(fx.store.template(ids[0]).is_err());
    assert!(fx.store.template_categories(ids[0]).unwrap().is_empty());
    let remaining = fx.store.search_products(&ctx, &Domain::all(), &[]).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(fx.store.product(remaining[0]).unwrap().template, ids[1]);
}

#[test]
fn template_categories_keep_links_in_sync() {
    let fx = Fixture::new();
    let ctx = user();
    let ids = fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let (a, b) = (CategoryId::new(), CategoryId::new());

    fx.store
        .create_template_categories(&[
            TemplateCategory::new(ids[0], a),
            TemplateCategory::new(ids[0], b),
            TemplateCategory::new(ids[0], a),
        ])
        .unwrap();
    assert_eq!(fx.store.template(ids[0]).unwrap().categories.len(), 2);

    fx.store
        .delete_template_categories(&[TemplateCategory::new(ids[0], a)])
        .unwrap();
    assert_eq!(fx.store.template(ids[0]).unwrap().categories, vec![b]);
    assert_eq!(
        fx.store.template_categories(ids[0]).unwrap(),
        vec![TemplateCategory::new(ids[0], b)]
    );
}

#[test]
fn moving_a_variant_updates_both_templates() {
    let fx = Fixture::new();
    let ctx = user();
    let ids = fx
        .store
        .create_templates(&ctx, &[fx.values("From"), fx.values("To")])
        .unwrap();
    let variant = fx.store.template(ids[0]).unwrap().products[0];

    let update = ProductValues {
        template: Some(ids[1]),
        ..ProductValues::default()
    };
    fx.store.write_products(&ctx, &[variant], &update).unwrap();

    assert!(fx.store.template(ids[0]).unwrap().products.is_empty());
    assert_eq!(fx.store.template(ids[1]).unwrap().products.len(), 2);
    assert_eq!(
        fx.store.read_product(&ctx, variant, "name").unwrap(),
        Value::Char("To".to_string())
    );
}

#[test]
fn template_write_rejects_products() {
    let fx = Fixture::new();
    let ctx = user();
    let ids = fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let update = TemplateValues {
        products: Some(vec![ProductValues::default()]),
        ..TemplateValues::default()
    };
    assert!(fx.store.write_templates(&ctx, &ids, &update).is_err());
}

#[test]
fn create_products_requires_existing_template() {
    let fx = Fixture::new();
    let ctx = user();
    let orphan = ProductValues {
        template: Some(catalog_core::TemplateId::new()),
        ..ProductValues::default()
    };
    assert!(fx.store.create_products(&ctx, &[orphan]).is_err());

    let ids = fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let extra = ProductValues {
        template: Some(ids[0]),
        ..Fixture::variant("W-9")
    };
    let created = fx.store.create_products(&ctx, &[extra]).unwrap();
    assert!(fx.store.template(ids[0]).unwrap().products.contains(&created[0]));

    fx.store.delete_products(&ctx, &created).unwrap();
    assert_eq!(fx.store.template(ids[0]).unwrap().products.len(), 1);
}

#[test]
fn global_search_uses_product_icon() {
    let fx = Fixture::new();
    let ctx = user();
    fx.store
        .create_templates(&ctx, &[fx.values("Blue Widget"), fx.values("Gadget")])
        .unwrap();

    for model in [template::MODEL, product::MODEL] {
        let hits = fx.store.search_global(&ctx, model, "widget").unwrap();
        assert_eq!(hits.len(), 1, "{model}");
        assert_eq!(hits[0].rec_name, "Blue Widget");
        assert_eq!(hits[0].icon.as_deref(), Some(template::PRODUCT_ICON));
    }
    assert!(fx.store.search_global(&ctx, "res.partner", "x").is_err());
}

#[test]
fn default_get_offers_one_variant() {
    let fx = Fixture::new();
    let defaults = fx.store.default_get_template(&user());
    assert_eq!(defaults.products.map(|p| p.len()), Some(1));
    assert_eq!(defaults.kind, Some(TemplateType::Goods));
}

#[test]
fn prices_beyond_configured_digits_are_rejected() {
    let fx = Fixture::new();
    let ctx = user();
    let huge = TemplateValues {
        list_price: Some(Decimal::MAX),
        ..fx.values("Widget")
    };
    let err = fx.store.create_templates(&ctx, &[huge]).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let ids = fx.store.create_templates(&ctx, &[fx.values("Widget")]).unwrap();
    let update = TemplateValues {
        cost_price: Some(Decimal::MAX),
        ..TemplateValues::default()
    };
    let err = fx.store.write_templates(&ctx, &ids, &update).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let variant = fx.store.template(ids[0]).unwrap().products[0];
    assert_eq!(
        fx.store
            .read_product(&ctx.with_uom(fx.g), variant, "cost_price_uom")
            .unwrap(),
        Value::Numeric(Decimal::from(10_000))
    );
}

#[test]
fn largest_accepted_price_converts_without_panicking() {
    let fx = Fixture::new();
    let ctx = user();
    let values = TemplateValues {
        list_price: Some(Decimal::new(9_999_999_999_999_999, 4)),
        ..fx.values("Gold")
    };
    let ids = fx.store.create_templates(&ctx, &[values]).unwrap();
    let variant = fx.store.template(ids[0]).unwrap().products[0];

    let price = fx
        .store
        .read_product(&ctx.with_uom(fx.g), variant, "list_price_uom")
        .unwrap();
    assert_eq!(
        price,
        Value::Numeric(Decimal::new(9_999_999_999_999_999, 4) * Decimal::from(1000))
    );
}

#[test]
fn consumable_template_can_become_a_service() {
    let fx = Fixture::new();
    let ctx = user();
    let values = TemplateValues {
        consumable: Some(true),
        ..fx.values("Glue")
    };
    let ids = fx.store.create_templates(&ctx, &[values]).unwrap();

    let update = TemplateValues {
        kind: Some(TemplateType::Service),
        ..TemplateValues::default()
    };
    fx.store.write_templates(&ctx, &ids, &update).unwrap();
    assert_eq!(
        fx.store.read_template(&ctx, ids[0], "type").unwrap(),
        Value::Selection("service".to_string())
    );
}

#[test]
fn default_uom_orders_by_unit_name() {
    let fx = Fixture::new();
    let ctx = user();
    let grams = TemplateValues {
        default_uom: Some(fx.g),
        ..fx.values("Saffron")
    };
    fx.store
        .create_templates(&ctx, &[fx.values("Flour"), grams])
        .unwrap();

    let products = fx
        .store
        .search_products(&ctx, &Domain::all(), &[("default_uom", Direction::Asc)])
        .unwrap();
    let names: Vec<_> = products
        .iter()
        .map(|id| fx.store.read_product(&ctx, *id, "name").unwrap())
        .collect();
    assert_eq!(
        names,
        vec![Value::Char("Saffron".to_string()), Value::Char("Flour".to_string())]
    );

    let templates = fx
        .store
        .search_templates(&ctx, &Domain::all(), &[("default_uom", Direction::Desc)])
        .unwrap();
    assert_eq!(
        fx.store.read_template(&ctx, templates[0], "name").unwrap(),
        Value::Char("Flour".to_string())
    );
}

#[test]
fn rec_name_search_accepts_a_list_of_texts() {
    let fx = Fixture::new();
    let ctx = user();
    let values = TemplateValues {
        products: Some(vec![
            Fixture::variant("C1"),
            Fixture::variant("C2"),
            Fixture::variant("C3"),
        ]),
        ..fx.values("Widget")
    };
    fx.store.create_templates(&ctx, &[values]).unwrap();
    let wanted = Value::from(vec!["C1".to_string(), "C3".to_string()]);

    let found = fx
        .store
        .search_products(
            &ctx,
            &Domain::leaf("rec_name", Operator::In, wanted.clone()),
            &[("rec_name", Direction::Asc)],
        )
        .unwrap();
    let codes: Vec<_> = found
        .iter()
        .map(|id| fx.store.read_product(&ctx, *id, "code").unwrap())
        .collect();
    assert_eq!(
        codes,
        vec![Value::Char("C1".to_string()), Value::Char("C3".to_string())]
    );

    let rest = fx
        .store
        .search_products(&ctx, &Domain::leaf("code", Operator::NotIn, wanted), &[])
        .unwrap();
    assert_eq!(rest.len(), 1);
}
