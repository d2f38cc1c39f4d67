//! Field descriptors.
//!
//! A model is a named set of fields. Each field declares its value type, how
//! it is stored and the client-side states (readonly/invisible) it carries.

use serde::Serialize;

use catalog_core::Value;

/// Value type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    Id,
    Char,
    Text,
    Boolean,
    DateTime,
    Numeric {
        digits: (u32, u32),
    },
    Selection {
        options: Vec<(String, String)>,
    },
    Many2One {
        target: &'static str,
    },
    One2Many {
        target: &'static str,
        field: &'static str,
    },
    Many2Many {
        relation: &'static str,
        origin: &'static str,
        target: &'static str,
    },
}

/// Where the value of a field comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "storage", rename_all = "snake_case")]
pub enum Storage {
    /// A column on the model table.
    Column,
    /// A per-company overridable value.
    Property,
    /// Computed by `getter`, searchable through `searcher` when set.
    Function {
        getter: &'static str,
        searcher: Option<&'static str>,
    },
}

/// Condition evaluated against the values of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Condition {
    /// The boolean field is false (a missing value counts as `default`).
    IsFalse { field: &'static str, default: bool },
    /// The field differs from `value` (a missing value counts as `default`).
    NotEqual {
        field: &'static str,
        value: &'static str,
        default: &'static str,
    },
}

impl Condition {
    pub fn eval(&self, lookup: impl Fn(&str) -> Option<Value>) -> bool {
        match self {
            Condition::IsFalse { field, default } => {
                let value = lookup(*field).and_then(|v| v.as_bool()).unwrap_or(*default);
                !value
            }
            Condition::NotEqual {
                field,
                value,
                default,
            } => {
                let current = lookup(*field);
                let current = current.as_ref().and_then(|v| v.as_str()).unwrap_or(*default);
                current != *value
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct States {
    pub readonly: Option<Condition>,
    pub invisible: Option<Condition>,
}

impl States {
    /// Readonly while the record is inactive.
    pub fn readonly_when_inactive() -> Self {
        Self {
            readonly: Some(Condition::IsFalse {
                field: "active",
                default: true,
            }),
            invisible: None,
        }
    }
}

/// A field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub string: String,
    pub ty: FieldType,
    pub storage: Storage,
    pub required: bool,
    pub select: bool,
    pub translate: bool,
    pub states: States,
    pub depends: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, string: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            string: string.into(),
            ty,
            storage: Storage::Column,
            required: false,
            select: false,
            translate: false,
            states: States::default(),
            depends: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn select(mut self) -> Self {
        self.select = true;
        self
    }

    pub fn translate(mut self) -> Self {
        self.translate = true;
        self
    }

    pub fn property(mut self) -> Self {
        self.storage = Storage::Property;
        self
    }

    pub fn function(mut self, getter: &'static str, searcher: Option<&'static str>) -> Self {
        self.storage = Storage::Function { getter, searcher };
        self
    }

    pub fn states(mut self, states: States, depends: &[&str]) -> Self {
        self.states = states;
        self.depends = depends.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Computed fields. Property fields resolve through the context, so they
    /// count as computed as well.
    pub fn is_function(&self) -> bool {
        matches!(self.storage, Storage::Function { .. } | Storage::Property)
    }

    pub fn is_x2many(&self) -> bool {
        matches!(
            self.ty,
            FieldType::One2Many { .. } | FieldType::Many2Many { .. }
        )
    }

    pub fn is_readonly(&self, lookup: impl Fn(&str) -> Option<Value>) -> bool {
        self.states.readonly.as_ref().is_some_and(|c| c.eval(lookup))
    }

    pub fn is_invisible(&self, lookup: impl Fn(&str) -> Option<Value>) -> bool {
        self.states.invisible.as_ref().is_some_and(|c| c.eval(lookup))
    }
}

pub(crate) fn selection(options: &[(&str, &str)]) -> FieldType {
    FieldType::Selection {
        options: options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_and_function_fields_are_computed() {
        let plain = Field::new("code", "Code", FieldType::Char);
        let property = Field::new("list_price", "List Price", FieldType::Numeric { digits: (16, 4) })
            .property();
        let function = Field::new("rec_name", "Name", FieldType::Char).function("get_rec_name", None);

        assert!(!plain.is_function());
        assert!(property.is_function());
        assert!(function.is_function());
    }

    #[test]
    fn readonly_follows_active_flag() {
        let field = Field::new("name", "Name", FieldType::Char)
            .states(States::readonly_when_inactive(), &["active"]);

        assert!(field.is_readonly(|_| Some(Value::Boolean(false))));
        assert!(!field.is_readonly(|_| Some(Value::Boolean(true))));
        // missing active defaults to true
        assert!(!field.is_readonly(|_| None));
    }
}
