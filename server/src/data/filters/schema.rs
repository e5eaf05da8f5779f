//! Allow-list schema
//!
//! Maps filterable field names to the column they compile to, their value
//! type, and the operators permitted on them.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::types::Operator;

/// Invalid schema definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid SQL identifier for field '{field}': {identifier}")]
    InvalidIdentifier { field: String, identifier: String },

    #[error("Field '{0}' allows no operators")]
    NoOperators(String),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Enumerated field '{0}' has no members")]
    EmptyEnum(String),
}

/// Value type of a filterable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String,
    /// ISO calendar date (`YYYY-MM-DD`)
    Date,
    /// Closed set of allowed values
    Enum { values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldSchema {
    pub name: String,
    /// Column expression the field compiles to
    pub column: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    pub operators: Vec<Operator>,
}

impl FieldSchema {
    pub fn new(name: &str, field_type: FieldType, operators: &[Operator]) -> Self {
        Self {
            name: name.to_string(),
            column: name.to_string(),
            field_type,
            operators: operators.to_vec(),
        }
    }

    pub fn string(name: &str, operators: &[Operator]) -> Self {
        Self::new(name, FieldType::String, operators)
    }

    pub fn date(name: &str, operators: &[Operator]) -> Self {
        Self::new(name, FieldType::Date, operators)
    }

    pub fn enumerated(name: &str, values: &[&str], operators: &[Operator]) -> Self {
        Self::new(
            name,
            FieldType::Enum {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
            operators,
        )
    }

    /// Compile this field to a different column than its API name
    pub fn with_column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }

    pub fn allows(&self, operator: Operator) -> bool {
        self.operators.contains(&operator)
    }
}

/// Validated set of filterable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            for identifier in [&field.name, &field.column] {
                if !is_sql_identifier(identifier) {
                    return Err(SchemaError::InvalidIdentifier {
                        field: field.name.clone(),
                        identifier: identifier.clone(),
                    });
                }
            }
            if field.operators.is_empty() {
                return Err(SchemaError::NoOperators(field.name.clone()));
            }
            if let FieldType::Enum { values } = &field.field_type
                && values.is_empty()
            {
                return Err(SchemaError::EmptyEnum(field.name.clone()));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

/// Plain or dotted SQL identifier (`organization`, `s.organization`)
pub fn is_sql_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_rules() {
        assert!(is_sql_identifier("organization"));
        assert!(is_sql_identifier("_tmp1"));
        assert!(is_sql_identifier("p.product_group"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("1abc"));
        assert!(!is_sql_identifier("org; DROP TABLE x"));
        assert!(!is_sql_identifier("org'"));
        assert!(!is_sql_identifier("a..b"));
    }

    #[test]
    fn rejects_injected_column() {
        let result = Schema::new(vec![
            FieldSchema::string("organization", &[Operator::Equals]).with_column("1=1 OR org"),
        ]);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn rejects_field_without_operators() {
        let result = Schema::new(vec![FieldSchema::string("organization", &[])]);
        assert_eq!(
            result.unwrap_err(),
            SchemaError::NoOperators("organization".to_string())
        );
    }

    #[test]
    fn rejects_duplicates_and_empty_enums() {
        let dup = Schema::new(vec![
            FieldSchema::string("region", &[Operator::Equals]),
            FieldSchema::string("region", &[Operator::In]),
        ]);
        assert_eq!(
            dup.unwrap_err(),
            SchemaError::DuplicateField("region".to_string())
        );

        let empty = Schema::new(vec![FieldSchema::enumerated(
            "status",
            &[],
            &[Operator::Equals],
        )]);
        assert_eq!(
            empty.unwrap_err(),
            SchemaError::EmptyEnum("status".to_string())
        );
    }

    #[test]
    fn lookup_and_operator_check() {
        let schema = Schema::new(vec![
            FieldSchema::date("date", &[Operator::Range]).with_column("sale_date"),
        ])
        .unwrap();

        let field = schema.field("date").unwrap();
        assert_eq!(field.column, "sale_date");
        assert!(field.allows(Operator::Range));
        assert!(!field.allows(Operator::Equals));
        assert!(schema.field("sale_date").is_none());
    }

    #[test]
    fn serializes_field_type_inline() {
        let field = FieldSchema::enumerated("status", &["open", "closed"], &[Operator::In]);
        let json = serde_json::to_value(&field).unwrap();

        assert_eq!(json["name"], "status");
        assert_eq!(json["type"], "enum");
        assert_eq!(json["values"][1], "closed");
        assert_eq!(json["operators"][0], "in");
    }
}
