//! Property values: a global value with per-company overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use catalog_core::{CompanyId, Context};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property<T> {
    global: Option<T>,
    companies: BTreeMap<CompanyId, T>,
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Self {
            global: None,
            companies: BTreeMap::new(),
        }
    }
}

impl<T: Clone> Property<T> {
    pub fn new(global: T) -> Self {
        Self {
            global: Some(global),
            companies: BTreeMap::new(),
        }
    }

    /// Value seen from `ctx`: the company override when there is one, the
    /// global value otherwise.
    pub fn get(&self, ctx: &Context) -> Option<T> {
        ctx.company()
            .and_then(|company| self.companies.get(&company))
            .or(self.global.as_ref())
            .cloned()
    }

    /// Store `value` for the context company, or globally without one.
    pub fn set(&mut self, ctx: &Context, value: T) {
        match ctx.company() {
            Some(company) => {
                self.companies.insert(company, value);
            }
            None => self.global = Some(value),
        }
    }

    pub fn global(&self) -> Option<&T> {
        self.global.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::UserId;

    #[test]
    fn company_override_wins_over_global() {
        let company = CompanyId::new();
        let global_ctx = Context::new(UserId::new());
        let company_ctx = Context::new(UserId::new()).with_company(company);

        let mut price = Property::new(10);
        price.set(&company_ctx, 12);

        assert_eq!(price.get(&global_ctx), Some(10));
        assert_eq!(price.get(&company_ctx), Some(12));
    }

    #[test]
    fn unknown_company_falls_back_to_global() {
        let price = Property::new(10);
        let ctx = Context::new(UserId::new()).with_company(CompanyId::new());
        assert_eq!(price.get(&ctx), Some(10));
        assert_eq!(Property::<i32>::default().get(&ctx), None);
    }
}
