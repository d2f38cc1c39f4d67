use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, Entity, UomCategoryId, UomId};

/// Category of units that can be converted into each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UomCategory {
    pub id: UomCategoryId,
    pub name: String,
}

impl UomCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UomCategoryId::new(),
            name: name.into(),
        }
    }
}

impl Entity for UomCategory {
    type Id = UomCategoryId;
    const MODEL: &'static str = "product.uom.category";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Unit of measure.
///
/// `factor` is the size of the unit expressed in the category reference unit
/// (gram in the weight category: `0.001` when kilogram is the reference) and
/// `rate` its inverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uom {
    pub id: UomId,
    pub name: String,
    pub symbol: String,
    pub category: UomCategoryId,
    pub factor: Decimal,
    pub rate: Decimal,
    pub rounding: Decimal,
    pub digits: u32,
    pub active: bool,
}

impl Uom {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        category: UomCategoryId,
        factor: Decimal,
    ) -> DomainResult<Self> {
        if factor <= Decimal::ZERO {
            return Err(DomainError::validation("uom factor must be positive"));
        }
        Ok(Self {
            id: UomId::new(),
            name: name.into(),
            symbol: symbol.into(),
            category,
            factor,
            rate: Decimal::ONE / factor,
            rounding: Decimal::new(1, 2),
            digits: 2,
            active: true,
        })
    }

    pub fn with_rounding(mut self, rounding: Decimal, digits: u32) -> Self {
        self.rounding = rounding;
        self.digits = digits;
        self
    }

    /// Round `qty` to the closest multiple of the unit rounding.
    pub fn round(&self, qty: Decimal) -> Decimal {
        if self.rounding.is_zero() {
            return qty;
        }
        ((qty / self.rounding).round() * self.rounding).round_dp(self.digits)
    }
}

impl Entity for Uom {
    type Id = UomId;
    const MODEL: &'static str = "product.uom";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Registry of the known units and categories.
#[derive(Debug, Default, Clone)]
pub struct UomRegistry {
    categories: HashMap<UomCategoryId, UomCategory>,
    uoms: HashMap<UomId, Uom>,
}

impl UomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&mut self, category: UomCategory) -> UomCategoryId {
        let id = category.id;
        self.categories.insert(id, category);
        id
    }

    pub fn add_uom(&mut self, uom: Uom) -> DomainResult<UomId> {
        if !self.categories.contains_key(&uom.category) {
            return Err(DomainError::not_found(format!(
                "uom category {}",
                uom.category
            )));
        }
        let id = uom.id;
        self.uoms.insert(id, uom);
        Ok(id)
    }

    pub fn get(&self, id: UomId) -> DomainResult<&Uom> {
        self.uoms
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("uom {id}")))
    }

    pub fn category(&self, id: UomCategoryId) -> Option<&UomCategory> {
        self.categories.get(&id)
    }

    /// Category of the given unit, if the unit is known.
    pub fn category_of(&self, id: UomId) -> Option<UomCategoryId> {
        self.uoms.get(&id).map(|u| u.category)
    }

    /// Convert a quantity between two units of the same category.
    pub fn compute_qty(
        &self,
        from: UomId,
        qty: Decimal,
        to: UomId,
        round: bool,
    ) -> DomainResult<Decimal> {
        if from == to {
            return Ok(qty);
        }
        let (from_uom, to_uom) = self.pair(from, to)?;
        let amount = scale(qty, from_uom, to_uom)?;
        Ok(if round { to_uom.round(amount) } else { amount })
    }

    /// Convert a price attached to `from` into a price attached to `to`.
    ///
    /// The amount scales by `from.factor / to.factor` and is quantized to
    /// `digits` decimal places.
    pub fn compute_price(
        &self,
        from: UomId,
        price: Decimal,
        to: UomId,
        digits: u32,
    ) -> DomainResult<Decimal> {
        if from == to {
            return Ok(price);
        }
        let (from_uom, to_uom) = self.pair(from, to)?;
        let converted = scale(price, from_uom, to_uom)?;
        tracing::debug!(
            from = %from_uom.symbol,
            to = %to_uom.symbol,
            %price,
            %converted,
            "converted price between units"
        );
        Ok(converted.round_dp(digits))
    }

    fn pair(&self, from: UomId, to: UomId) -> DomainResult<(&Uom, &Uom)> {
        let from_uom = self.get(from)?;
        let to_uom = self.get(to)?;
        if from_uom.category != to_uom.category {
            return Err(DomainError::validation(format!(
                "cannot convert between {} and {}: different categories",
                from_uom.symbol, to_uom.symbol
            )));
        }
        Ok((from_uom, to_uom))
    }
}

/// `amount * from.factor / to.factor`, failing instead of overflowing.
fn scale(amount: Decimal, from: &Uom, to: &Uom) -> DomainResult<Decimal> {
    amount
        .checked_mul(from.factor)
        .and_then(|scaled| scaled.checked_div(to.factor))
        .ok_or_else(|| {
            DomainError::validation(format!(
                "{amount} {} cannot be expressed in {}",
                from.symbol, to.symbol
            ))
        })
}
