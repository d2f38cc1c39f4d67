//! Per-call transaction context.
//!
//! Carries the acting user plus request-scoped settings that change how
//! values are read: the company for property fields and the target unit of
//! measure for converted prices.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::id::{CompanyId, UomId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    user: UserId,
    company: Option<CompanyId>,
    uom: Option<UomId>,
    #[serde(default)]
    extra: Map<String, JsonValue>,
}

impl Context {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            company: None,
            uom: None,
            extra: Map::new(),
        }
    }

    /// Context of the system user.
    pub fn root() -> Self {
        Self::new(UserId::ROOT)
    }

    pub fn with_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    pub fn with_uom(mut self, uom: UomId) -> Self {
        self.uom = Some(uom);
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn company(&self) -> Option<CompanyId> {
        self.company
    }

    pub fn uom(&self) -> Option<UomId> {
        self.uom
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.extra.get(key)
    }

    pub fn is_root(&self) -> bool {
        self.user.is_root()
    }
}
