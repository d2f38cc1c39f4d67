//! Search domains.
//!
//! A domain is a tree of `And`/`Or` nodes over clauses `(path, operator,
//! value)`. Dotted paths traverse Many2One fields (`template.name`).

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, Value};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "not like")]
    NotLike,
    #[serde(rename = "ilike")]
    ILike,
    #[serde(rename = "not ilike")]
    NotILike,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::ILike => "ilike",
            Operator::NotILike => "not ilike",
        }
    }

    /// Operators that express "does not match".
    pub fn is_negative(&self) -> bool {
        let op = self.as_str();
        op.starts_with('!') || op.starts_with("not ")
    }

    /// Evaluate `field <op> operand`.
    pub fn matches(&self, field: &Value, operand: &Value) -> DomainResult<bool> {
        match self {
            Operator::Eq => Ok(equals(field, operand)),
            Operator::NotEq => Ok(!equals(field, operand)),
            Operator::Lt => Ok(compare(field, operand, |o| o == Ordering::Less)),
            Operator::Le => Ok(compare(field, operand, |o| o != Ordering::Greater)),
            Operator::Gt => Ok(compare(field, operand, |o| o == Ordering::Greater)),
            Operator::Ge => Ok(compare(field, operand, |o| o != Ordering::Less)),
            Operator::In => contains(field, operand),
            Operator::NotIn => contains(field, operand).map(|found| !found),
            Operator::Like => like(field, operand, false),
            Operator::ILike => like(field, operand, true),
            Operator::NotLike => like(field, operand, false).map(|found| !found),
            Operator::NotILike => like(field, operand, true).map(|found| !found),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            "ilike" => Operator::ILike,
            "not ilike" => Operator::NotILike,
            other => {
                return Err(DomainError::invalid_clause(format!(
                    "unknown operator `{other}`"
                )));
            }
        };
        Ok(op)
    }
}

fn equals(field: &Value, operand: &Value) -> bool {
    match (field, operand) {
        (Value::Ids(ids), Value::Id(id)) => ids.contains(id),
        (Value::Ids(ids), Value::Null) => ids.is_empty(),
        _ => match (field.as_str(), operand.as_str()) {
            (Some(a), Some(b)) => a == b,
            _ => field == operand,
        },
    }
}

fn compare(field: &Value, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let ordering = match (field.as_str(), operand.as_str()) {
        (Some(a), Some(b)) => Some(a.cmp(b)),
        _ => field.partial_cmp_value(operand),
    };
    ordering.is_some_and(accept)
}

fn contains(field: &Value, operand: &Value) -> DomainResult<bool> {
    match operand {
        Value::Ids(candidates) => Ok(match field {
            Value::Id(id) => candidates.contains(id),
            Value::Ids(ids) => ids.iter().any(|id| candidates.contains(id)),
            _ => false,
        }),
        Value::Texts(candidates) => Ok(field
            .as_str()
            .is_some_and(|text| candidates.iter().any(|c| c == text))),
        _ => Err(DomainError::invalid_clause(
            "`in` expects a list of identifiers or texts",
        )),
    }
}

fn like(field: &Value, operand: &Value, case_insensitive: bool) -> DomainResult<bool> {
    let Some(pattern) = operand.as_str() else {
        return Err(DomainError::invalid_clause("`like` expects a text pattern"));
    };
    Ok(match field.as_str() {
        Some(text) => like_match(pattern, text, case_insensitive),
        None => false,
    })
}

/// SQL `LIKE` matching: `%` matches any run of characters, `_` a single
/// character and `\` escapes the next one.
pub fn like_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let fold = |s: &str| -> Vec<char> {
        if case_insensitive {
            s.chars().flat_map(char::to_lowercase).collect()
        } else {
            s.chars().collect()
        }
    };
    let text = fold(text);

    #[derive(Clone, Copy, PartialEq)]
    enum Token {
        Any,
        One,
        Lit(char),
    }

    let mut tokens = Vec::new();
    let mut chars = fold(pattern).into_iter();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Lit(chars.next().unwrap_or('\\')),
            c => Token::Lit(c),
        });
    }

    // dp[j]: pattern prefix of length i matches text prefix of length j
    let mut dp = vec![false; text.len() + 1];
    dp[0] = true;
    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::Any => {
                let mut reachable = false;
                for j in 0..=text.len() {
                    reachable |= dp[j];
                    next[j] = reachable;
                }
            }
            Token::One => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1];
                }
            }
            Token::Lit(c) => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1] && text[j - 1] == *c;
                }
            }
        }
        dp = next;
    }
    dp[text.len()]
}

/// A single search condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub path: String,
    pub operator: Operator,
    pub value: Value,
}

impl Clause {
    pub fn new(path: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn parse(path: impl Into<String>, operator: &str, value: impl Into<Value>) -> DomainResult<Self> {
        Ok(Self::new(path, operator.parse()?, value))
    }

    /// Same operator and operand on another path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operator: self.operator,
            value: self.value.clone(),
        }
    }

    /// Split `template.name` into `("template", Some("name"))`.
    pub fn split_path(&self) -> (&str, Option<&str>) {
        match self.path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (self.path.as_str(), None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    Leaf(Clause),
    And(Vec<Domain>),
    Or(Vec<Domain>),
}

impl Domain {
    /// The domain matching every record.
    pub fn all() -> Self {
        Domain::And(Vec::new())
    }

    pub fn leaf(path: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Domain::Leaf(Clause::new(path, operator, value))
    }

    /// Walk the tree, resolving each clause with `eval`.
    pub fn eval_with(&self, eval: &mut impl FnMut(&Clause) -> DomainResult<bool>) -> DomainResult<bool> {
        match self {
            Domain::Leaf(clause) => eval(clause),
            Domain::And(children) => {
                for child in children {
                    if !child.eval_with(eval)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Domain::Or(children) => {
                for child in children {
                    if child.eval_with(eval)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

impl From<Clause> for Domain {
    fn from(clause: Clause) -> Self {
        Domain::Leaf(clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn negative_operators() {
        for op in ["!=", "not in", "not like", "not ilike"] {
            assert!(op.parse::<Operator>().unwrap().is_negative(), "{op}");
        }
        for op in ["=", "in", "like", "ilike", "<", ">="] {
            assert!(!op.parse::<Operator>().unwrap().is_negative(), "{op}");
        }
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert!(matches!(
            "~".parse::<Operator>(),
            Err(DomainError::InvalidClause(_))
        ));
    }

    #[test]
    fn like_wildcards() {
        assert!(like_match("Wid%", "Widget", false));
        assert!(like_match("%dge%", "Widget", false));
        assert!(like_match("W_dget", "Widget", false));
        assert!(!like_match("w%", "Widget", false));
        assert!(like_match("w%", "Widget", true));
        assert!(like_match("100\\%", "100%", false));
        assert!(!like_match("100\\%", "1000", false));
        assert!(like_match("%", "", false));
    }

    #[test]
    fn selection_compares_with_text_operand() {
        let field = Value::Selection("goods".to_string());
        assert!(Operator::Eq.matches(&field, &Value::from("goods")).unwrap());
        assert!(Operator::NotEq.matches(&field, &Value::from("service")).unwrap());
    }

    #[test]
    fn in_matches_any_related_id() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let field = Value::Ids(vec![a]);
        assert!(Operator::In.matches(&field, &Value::Ids(vec![b, a])).unwrap());
        assert!(Operator::NotIn.matches(&field, &Value::Ids(vec![b])).unwrap());
        assert!(Operator::Eq.matches(&field, &Value::Id(a)).unwrap());
    }

    #[test]
    fn in_matches_text_against_a_list() {
        let candidates = Value::from(vec!["C1".to_string(), "C2".to_string()]);
        assert!(Operator::In.matches(&Value::from("C2"), &candidates).unwrap());
        assert!(!Operator::In.matches(&Value::from("C3"), &candidates).unwrap());
        assert!(!Operator::In.matches(&Value::Null, &candidates).unwrap());
        assert!(Operator::NotIn.matches(&Value::Null, &candidates).unwrap());
        assert!(Operator::In.matches(&Value::from("C1"), &Value::from("C1")).is_err());
    }

    #[test]
    fn null_never_matches_a_positive_like() {
        assert!(!Operator::ILike.matches(&Value::Null, &Value::from("%")).unwrap());
        assert!(Operator::NotILike.matches(&Value::Null, &Value::from("%")).unwrap());
    }

    #[test]
    fn split_path_on_first_dot() {
        let clause = Clause::new("default_uom.category", Operator::Eq, Value::Null);
        assert_eq!(clause.split_path(), ("default_uom", Some("category")));
        let clause = clause.with_path("name");
        assert_eq!(clause.split_path(), ("name", None));
    }

    #[test]
    fn empty_and_matches_everything() {
        let mut never_called = |_: &Clause| -> DomainResult<bool> { panic!("no clauses") };
        assert!(Domain::all().eval_with(&mut never_called).unwrap());
        assert!(!Domain::Or(vec![]).eval_with(&mut never_called).unwrap());
    }
}
