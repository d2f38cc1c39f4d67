//! Catalog configuration.
//!
//! Values are read from the process environment; unset variables fall back to
//! the defaults below.

use rust_decimal::Decimal;
use thiserror::Error;

use catalog_core::{DomainError, DomainResult};

/// Environment variable holding the number of decimal places kept on prices.
pub const PRICE_DECIMAL_VAR: &str = "CATALOG_PRICE_DECIMAL";

const DEFAULT_PRICE_DECIMAL: u32 = 4;
const PRICE_PRECISION: u32 = 16;
const MAX_PRICE_DECIMAL: u32 = 12;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an integer between 0 and {max}, got `{value}`")]
    InvalidPriceDecimal {
        var: &'static str,
        value: String,
        max: u32,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProductConfig {
    price_decimal: u32,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            price_decimal: DEFAULT_PRICE_DECIMAL,
        }
    }
}

impl ProductConfig {
    pub fn new(price_decimal: u32) -> Result<Self, ConfigError> {
        Self::parse_price_decimal(&price_decimal.to_string())
    }

    /// Load the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(PRICE_DECIMAL_VAR) {
            Ok(raw) => Self::parse_price_decimal(&raw),
            Err(_) => {
                tracing::debug!(
                    "{PRICE_DECIMAL_VAR} not set; using {DEFAULT_PRICE_DECIMAL} price decimals"
                );
                Ok(Self::default())
            }
        }
    }

    fn parse_price_decimal(raw: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidPriceDecimal {
            var: PRICE_DECIMAL_VAR,
            value: raw.to_string(),
            max: MAX_PRICE_DECIMAL,
        };
        let price_decimal: u32 = raw.trim().parse().map_err(|_| invalid())?;
        if price_decimal > MAX_PRICE_DECIMAL {
            return Err(invalid());
        }
        Ok(Self { price_decimal })
    }

    /// `(precision, scale)` of price fields.
    pub fn price_digits(&self) -> (u32, u32) {
        (PRICE_PRECISION, self.price_decimal)
    }

    pub fn price_decimal(&self) -> u32 {
        self.price_decimal
    }

    /// Reject a price that does not fit [`ProductConfig::price_digits`].
    pub fn check_price(&self, field: &str, price: Decimal) -> DomainResult<()> {
        let (precision, scale) = self.price_digits();
        let limit = Decimal::from(10u64.pow(precision - scale));
        if price.normalize().scale() > scale || price.abs().trunc() >= limit {
            return Err(DomainError::validation(format!(
                "`{field}` must fit {precision} digits with {scale} decimals, got {price}"
            )));
        }
        Ok(())
    }
}
