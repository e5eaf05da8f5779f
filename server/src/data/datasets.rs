//! Dataset catalog
//!
//! Allow-list schemas for the analytics tables the dashboard reads.

use serde::Serialize;
use utoipa::ToSchema;

use super::filters::{FieldSchema, FieldType, Operator, Schema, SchemaError, is_sql_identifier};

const EQ_IN: &[Operator] = &[Operator::Equals, Operator::In];
const DATE_OPS: &[Operator] = &[Operator::Equals, Operator::Range];

/// A queryable table and its filterable fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dataset {
    pub id: String,
    pub table: String,
    #[schema(value_type = Vec<FieldSchema>)]
    pub fields: Schema,
}

impl Dataset {
    pub fn new(id: &str, table: &str, fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        if !is_sql_identifier(table) {
            return Err(SchemaError::InvalidIdentifier {
                field: id.to_string(),
                identifier: table.to_string(),
            });
        }
        Ok(Self {
            id: id.to_string(),
            table: table.to_string(),
            fields: Schema::new(fields)?,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.fields
    }

    /// Fields whose distinct values can be offered as filter options
    pub fn option_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .field(name)
            .filter(|f| f.field_type == FieldType::String)
    }
}

/// Registry of known datasets
#[derive(Debug, Clone)]
pub struct Catalog {
    datasets: Vec<Dataset>,
}

impl Catalog {
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self { datasets }
    }

    /// Tables of the `kfg_analytics` namespace
    pub fn builtin() -> Result<Self, SchemaError> {
        Ok(Self::new(vec![
            Dataset::new(
                "sales",
                "iceberg.kfg_analytics.fact_sales_v1",
                vec![
                    FieldSchema::string("organization", EQ_IN),
                    FieldSchema::string("warehouse", EQ_IN),
                    FieldSchema::date("date", DATE_OPS),
                ],
            )?,
            Dataset::new(
                "production",
                "iceberg.kfg_analytics.production_qty_info",
                vec![
                    FieldSchema::string("organization", EQ_IN),
                    FieldSchema::string("category", EQ_IN),
                    FieldSchema::string("product", EQ_IN),
                    FieldSchema::date("date", DATE_OPS),
                ],
            )?,
            Dataset::new(
                "internal",
                "iceberg.kfg_analytics.internal_qty_info",
                vec![
                    FieldSchema::string("organization", EQ_IN),
                    FieldSchema::string("product_group", EQ_IN),
                    FieldSchema::date("date", DATE_OPS),
                ],
            )?,
        ]))
    }

    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::{FilterSpec, Predicate, compile};

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        let ids: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["sales", "production", "internal"]);
    }

    #[test]
    fn lookup_by_id() {
        let catalog = Catalog::builtin().unwrap();
        let production = catalog.get("production").unwrap();

        assert_eq!(production.table, "iceberg.kfg_analytics.production_qty_info");
        assert!(production.schema().field("category").is_some());
        assert!(catalog.get("inventory").is_none());
    }

    #[test]
    fn option_fields_are_string_fields_only() {
        let catalog = Catalog::builtin().unwrap();
        let sales = catalog.get("sales").unwrap();

        assert!(sales.option_field("organization").is_some());
        assert!(sales.option_field("date").is_none());
        assert!(sales.option_field("qty").is_none());
    }

    #[test]
    fn rejects_bad_table_name() {
        let result = Dataset::new("x", "sales; DROP TABLE y", vec![]);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn production_org_filter_compiles() {
        let catalog = Catalog::builtin().unwrap();
        let spec = FilterSpec::new(vec![Predicate::equals("organization", "KFG Foods")]);
        let compiled = compile(&spec, catalog.get("production").unwrap().schema()).unwrap();

        assert_eq!(compiled.clause, "organization = ?");
    }
}
