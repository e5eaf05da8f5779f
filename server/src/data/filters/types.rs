//! Filter type definitions
//!
//! A [`FilterSpec`] is the ordered list of predicates built from the current
//! dashboard selection. It is constructed once per query and never mutated.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Selection value meaning "no constraint on this field"
pub const ALL_SENTINEL: &str = "all";

/// Predicate operators understood by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    Range,
    In,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Range => "range",
            Self::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selected value(s) of a predicate: a scalar or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// True for `"all"` and `["all"]`
    pub fn is_sentinel(&self) -> bool {
        match self {
            Self::One(v) => v == ALL_SENTINEL,
            Self::Many(values) => values.len() == 1 && values[0] == ALL_SENTINEL,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// A single named predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Predicate {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Equals, FilterValue::One(value.into()))
    }

    pub fn range(field: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(
            field,
            Operator::Range,
            FilterValue::Many(vec![from.into(), to.into()]),
        )
    }

    pub fn any_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            field,
            Operator::In,
            FilterValue::Many(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn is_sentinel(&self) -> bool {
        self.value.is_sentinel()
    }
}

/// Ordered, immutable sequence of predicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.predicates.iter()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl FromIterator<Predicate> for FilterSpec {
    fn from_iter<T: IntoIterator<Item = Predicate>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for FilterSpec {
    type Item = Predicate;
    type IntoIter = std::vec::IntoIter<Predicate>;

    fn into_iter(self) -> Self::IntoIter {
        self.predicates.into_iter()
    }
}

impl<'a> IntoIterator for &'a FilterSpec {
    type Item = &'a Predicate;
    type IntoIter = std::slice::Iter<'a, Predicate>;

    fn into_iter(self) -> Self::IntoIter {
        self.predicates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_scalar_and_single_item_list() {
        assert!(FilterValue::from("all").is_sentinel());
        assert!(FilterValue::Many(vec!["all".to_string()]).is_sentinel());
        assert!(!FilterValue::from("All Metrics").is_sentinel());
        assert!(!FilterValue::Many(vec!["all".to_string(), "Acme".to_string()]).is_sentinel());
    }

    #[test]
    fn deserialize_spec_from_json() {
        let json = r#"[
            {"field": "organization", "operator": "equals", "value": "Acme"},
            {"field": "date", "operator": "range", "value": ["2024-01-01", "2024-02-01"]}
        ]"#;
        let spec: FilterSpec = serde_json::from_str(json).unwrap();

        assert_eq!(spec.len(), 2);
        assert_eq!(spec.predicates()[0], Predicate::equals("organization", "Acme"));
        assert_eq!(
            spec.predicates()[1],
            Predicate::range("date", "2024-01-01", "2024-02-01")
        );
    }

    #[test]
    fn unknown_operator_rejected() {
        let json = r#"[{"field": "organization", "operator": "like", "value": "A%"}]"#;
        assert!(serde_json::from_str::<FilterSpec>(json).is_err());
    }

    #[test]
    fn operator_display() {
        assert_eq!(Operator::Equals.to_string(), "equals");
        assert_eq!(Operator::Range.to_string(), "range");
        assert_eq!(Operator::In.to_string(), "in");
    }
}
