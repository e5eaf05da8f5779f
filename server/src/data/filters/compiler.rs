//! Predicate compiler
//!
//! Turns a [`FilterSpec`] into a `?`-placeholder clause and an ordered
//! parameter list. Values never appear in the clause text.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::schema::{FieldSchema, FieldType, Schema};
use super::types::{FilterSpec, FilterValue, Operator, Predicate};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while compiling a filter spec
///
/// All variants are configuration or programmer errors. Callers must reject
/// the query rather than drop the offending predicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unknown filter field: {field}")]
    UnknownField { field: String },

    #[error("Operator '{operator}' is not allowed on field '{field}'")]
    InvalidOperator { field: String, operator: Operator },

    #[error("Invalid range on field '{field}': {reason}")]
    InvalidRange { field: String, reason: String },

    #[error("Invalid value on field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl CompileError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "UNKNOWN_FILTER_FIELD",
            Self::InvalidOperator { .. } => "INVALID_FILTER_OPERATOR",
            Self::InvalidRange { .. } => "INVALID_FILTER_RANGE",
            Self::InvalidValue { .. } => "INVALID_FILTER_VALUE",
        }
    }
}

/// A bound parameter
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    Date(NaiveDate),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

/// Compiled filter: clause text plus its parameters, in placeholder order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CompiledFilter {
    pub clause: String,
    #[schema(value_type = Vec<String>)]
    pub params: Vec<SqlParam>,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

/// Compile `spec` against the allow-list `schema`.
///
/// Sentinel predicates are dropped, remaining terms are joined with ` AND `
/// in input order. Field and operator are checked against the schema for
/// sentinel predicates too, so a typo never goes unnoticed.
pub fn compile(spec: &FilterSpec, schema: &Schema) -> Result<CompiledFilter, CompileError> {
    let mut terms: Vec<String> = Vec::with_capacity(spec.len());
    let mut params: Vec<SqlParam> = Vec::new();

    for predicate in spec {
        let field = schema
            .field(&predicate.field)
            .ok_or_else(|| CompileError::UnknownField {
                field: predicate.field.clone(),
            })?;

        if !field.allows(predicate.operator) {
            return Err(CompileError::InvalidOperator {
                field: field.name.clone(),
                operator: predicate.operator,
            });
        }

        if predicate.is_sentinel() {
            continue;
        }

        terms.push(compile_predicate(predicate, field, &mut params)?);
    }

    Ok(CompiledFilter {
        clause: terms.join(" AND "),
        params,
    })
}

fn compile_predicate(
    predicate: &Predicate,
    field: &FieldSchema,
    params: &mut Vec<SqlParam>,
) -> Result<String, CompileError> {
    let col = &field.column;

    match predicate.operator {
        Operator::Equals => {
            let FilterValue::One(value) = &predicate.value else {
                return Err(invalid_value(field, "equals expects a single value"));
            };
            params.push(bind(field, value)?);
            Ok(format!("{} = ?", col))
        }
        Operator::In => {
            let values: &[String] = match &predicate.value {
                FilterValue::One(value) => std::slice::from_ref(value),
                FilterValue::Many(values) => values,
            };
            if values.is_empty() {
                return Err(invalid_value(field, "in expects at least one value"));
            }
            let bound = values
                .iter()
                .map(|v| bind(field, v))
                .collect::<Result<Vec<_>, _>>()?;
            let placeholders: Vec<&str> = bound.iter().map(|_| "?").collect();
            params.extend(bound);
            Ok(format!("{} IN ({})", col, placeholders.join(", ")))
        }
        Operator::Range => {
            let (from, to) = match &predicate.value {
                FilterValue::Many(values) if values.len() == 2 => (&values[0], &values[1]),
                FilterValue::Many(values) => {
                    return Err(invalid_range(
                        field,
                        format!("expected [from, to], got {} values", values.len()),
                    ));
                }
                FilterValue::One(_) => {
                    return Err(invalid_range(field, "expected [from, to], got a scalar"));
                }
            };
            let from = bind(field, from)?;
            let to = bind(field, to)?;
            if to < from {
                return Err(invalid_range(
                    field,
                    format!("'{}' is before '{}'", to, from),
                ));
            }
            params.push(from);
            params.push(to);
            Ok(format!("{} BETWEEN ? AND ?", col))
        }
    }
}

/// Convert a raw selection into a typed parameter for `field`
fn bind(field: &FieldSchema, raw: &str) -> Result<SqlParam, CompileError> {
    match &field.field_type {
        FieldType::String => Ok(SqlParam::Text(raw.to_string())),
        FieldType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(SqlParam::Date)
            .map_err(|_| invalid_value(field, format!("'{}' is not a YYYY-MM-DD date", raw))),
        FieldType::Enum { values } => {
            if values.iter().any(|v| v == raw) {
                Ok(SqlParam::Text(raw.to_string()))
            } else {
                Err(invalid_value(
                    field,
                    format!("'{}' is not one of: {}", raw, values.join(", ")),
                ))
            }
        }
    }
}

fn invalid_value(field: &FieldSchema, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidValue {
        field: field.name.clone(),
        reason: reason.into(),
    }
}

fn invalid_range(field: &FieldSchema, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidRange {
        field: field.name.clone(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> SqlParam {
        SqlParam::Text(s.to_string())
    }

    fn date(s: &str) -> SqlParam {
        SqlParam::Date(NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap())
    }

    fn sales_schema() -> Schema {
        Schema::new(vec![
            FieldSchema::string("organization", &[Operator::Equals, Operator::In]),
            FieldSchema::string("region", &[Operator::Equals]),
            FieldSchema::date("date", &[Operator::Equals, Operator::Range]),
            FieldSchema::enumerated("channel", &["retail", "online"], &[Operator::In]),
            FieldSchema::string("warehouse", &[Operator::Equals]).with_column("wh_code"),
        ])
        .unwrap()
    }

    #[test]
    fn all_sentinels_compile_to_empty() {
        let spec = FilterSpec::new(vec![
            Predicate::equals("organization", "all"),
            Predicate::equals("region", "all"),
            Predicate::new("date", Operator::Range, FilterValue::Many(vec!["all".into()])),
        ]);
        let compiled = compile(&spec, &sales_schema()).unwrap();

        assert_eq!(compiled, CompiledFilter::default());
        assert!(compiled.is_empty());
    }

    #[test]
    fn empty_spec_compiles_to_empty() {
        let compiled = compile(&FilterSpec::default(), &sales_schema()).unwrap();
        assert_eq!(compiled.clause, "");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn single_equals_binds_one_param() {
        let spec = FilterSpec::new(vec![Predicate::equals("organization", "Acme")]);
        let compiled = compile(&spec, &sales_schema()).unwrap();

        assert_eq!(compiled.clause, "organization = ?");
        assert_eq!(compiled.clause.matches('?').count(), 1);
        assert_eq!(compiled.params, vec![text("Acme")]);
    }

    #[test]
    fn sentinel_predicate_is_omitted() {
        let schema = Schema::new(vec![
            FieldSchema::string("organization", &[Operator::Equals]),
            FieldSchema::string("region", &[Operator::Equals]),
        ])
        .unwrap();
        let spec = FilterSpec::new(vec![
            Predicate::equals("organization", "Acme"),
            Predicate::equals("region", "all"),
        ]);
        let compiled = compile(&spec, &schema).unwrap();

        assert_eq!(compiled.clause, "organization = ?");
        assert_eq!(compiled.params, vec![text("Acme")]);
    }

    #[test]
    fn terms_joined_in_input_order() {
        let spec = FilterSpec::new(vec![
            Predicate::range("date", "2024-01-01", "2024-03-31"),
            Predicate::any_of("organization", ["Acme", "Globex"]),
            Predicate::equals("warehouse", "WH-1"),
        ]);
        let compiled = compile(&spec, &sales_schema()).unwrap();

        assert_eq!(
            compiled.clause,
            "date BETWEEN ? AND ? AND organization IN (?, ?) AND wh_code = ?"
        );
        assert_eq!(
            compiled.params,
            vec![
                date("2024-01-01"),
                date("2024-03-31"),
                text("Acme"),
                text("Globex"),
                text("WH-1"),
            ]
        );
    }

    #[test]
    fn values_never_reach_clause_text() {
        let spec = FilterSpec::new(vec![Predicate::equals(
            "organization",
            "x' OR '1'='1",
        )]);
        let compiled = compile(&spec, &sales_schema()).unwrap();

        assert_eq!(compiled.clause, "organization = ?");
        assert_eq!(compiled.params, vec![text("x' OR '1'='1")]);
    }

    #[test]
    fn unknown_field_fails() {
        let spec = FilterSpec::new(vec![
            Predicate::equals("organization", "Acme"),
            Predicate::equals("country", "NZ"),
        ]);
        let err = compile(&spec, &sales_schema()).unwrap_err();

        assert_eq!(
            err,
            CompileError::UnknownField {
                field: "country".to_string()
            }
        );
        assert_eq!(err.code(), "UNKNOWN_FILTER_FIELD");
    }

    #[test]
    fn unknown_field_fails_even_with_sentinel() {
        let spec = FilterSpec::new(vec![Predicate::equals("country", "all")]);
        assert!(matches!(
            compile(&spec, &sales_schema()),
            Err(CompileError::UnknownField { .. })
        ));
    }

    #[test]
    fn disallowed_operator_fails_even_with_sentinel() {
        let spec = FilterSpec::new(vec![Predicate::new("region", Operator::In, "all")]);
        let err = compile(&spec, &sales_schema()).unwrap_err();

        assert_eq!(
            err,
            CompileError::InvalidOperator {
                field: "region".to_string(),
                operator: Operator::In,
            }
        );
    }

    #[test]
    fn operator_not_allowed() {
        let spec = FilterSpec::new(vec![Predicate::any_of("region", ["North"])]);
        let err = compile(&spec, &sales_schema()).unwrap_err();

        assert_eq!(
            err,
            CompileError::InvalidOperator {
                field: "region".to_string(),
                operator: Operator::In,
            }
        );
    }

    #[test]
    fn reversed_date_range_fails() {
        let spec = FilterSpec::new(vec![Predicate::range("date", "2024-01-01", "2023-01-01")]);
        let err = compile(&spec, &sales_schema()).unwrap_err();

        assert!(matches!(err, CompileError::InvalidRange { ref field, .. } if field == "date"));
        assert_eq!(err.code(), "INVALID_FILTER_RANGE");
    }

    #[test]
    fn reversed_string_range_fails() {
        let schema = Schema::new(vec![FieldSchema::string("product", &[Operator::Range])]).unwrap();
        let spec = FilterSpec::new(vec![Predicate::range("product", "m", "c")]);

        assert!(matches!(
            compile(&spec, &schema),
            Err(CompileError::InvalidRange { .. })
        ));
    }

    #[test]
    fn single_day_range_is_valid() {
        let spec = FilterSpec::new(vec![Predicate::range("date", "2024-05-01", "2024-05-01")]);
        let compiled = compile(&spec, &sales_schema()).unwrap();

        assert_eq!(compiled.clause, "date BETWEEN ? AND ?");
        assert_eq!(compiled.params, vec![date("2024-05-01"), date("2024-05-01")]);
    }

    #[test]
    fn range_arity_checked() {
        let three = FilterSpec::new(vec![Predicate::new(
            "date",
            Operator::Range,
            FilterValue::Many(vec![
                "2024-01-01".into(),
                "2024-02-01".into(),
                "2024-03-01".into(),
            ]),
        )]);
        let scalar = FilterSpec::new(vec![Predicate::new("date", Operator::Range, "2024-01-01")]);

        for spec in [three, scalar] {
            assert!(matches!(
                compile(&spec, &sales_schema()),
                Err(CompileError::InvalidRange { .. })
            ));
        }
    }

    #[test]
    fn date_values_are_validated() {
        let spec = FilterSpec::new(vec![Predicate::equals("date", "01/02/2024")]);
        let err = compile(&spec, &sales_schema()).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILTER_VALUE");
    }

    #[test]
    fn enum_members_are_validated() {
        let ok = FilterSpec::new(vec![Predicate::any_of("channel", ["online"])]);
        assert_eq!(
            compile(&ok, &sales_schema()).unwrap().clause,
            "channel IN (?)"
        );

        let bad = FilterSpec::new(vec![Predicate::any_of("channel", ["online", "wholesale"])]);
        assert!(matches!(
            compile(&bad, &sales_schema()),
            Err(CompileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn in_accepts_scalar_and_rejects_empty() {
        let scalar = FilterSpec::new(vec![Predicate::new("organization", Operator::In, "Acme")]);
        let compiled = compile(&scalar, &sales_schema()).unwrap();
        assert_eq!(compiled.clause, "organization IN (?)");
        assert_eq!(compiled.params, vec![text("Acme")]);

        let empty = FilterSpec::new(vec![Predicate::any_of("organization", Vec::<String>::new())]);
        assert!(matches!(
            compile(&empty, &sales_schema()),
            Err(CompileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn equals_rejects_list() {
        let spec = FilterSpec::new(vec![Predicate::new(
            "organization",
            Operator::Equals,
            FilterValue::Many(vec!["Acme".into(), "Globex".into()]),
        )]);
        assert!(matches!(
            compile(&spec, &sales_schema()),
            Err(CompileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn compile_is_idempotent() {
        let spec = FilterSpec::new(vec![
            Predicate::equals("organization", "Acme"),
            Predicate::range("date", "2023-01-01", "2023-12-31"),
        ]);
        let schema = sales_schema();

        assert_eq!(compile(&spec, &schema), compile(&spec, &schema));
    }

    #[test]
    fn params_serialize_as_plain_json() {
        let spec = FilterSpec::new(vec![
            Predicate::equals("organization", "Acme"),
            Predicate::range("date", "2024-01-01", "2024-01-31"),
        ]);
        let compiled = compile(&spec, &sales_schema()).unwrap();
        let json = serde_json::to_value(&compiled.params).unwrap();

        assert_eq!(json, serde_json::json!(["Acme", "2024-01-01", "2024-01-31"]));
    }
}
