//! Dashboard panel queries
//!
//! Each panel is a fixed aggregation over one dataset. Only the WHERE clause
//! varies per request, and it always comes from the filter compiler.

use crate::data::analytics::PreparedQuery;
use crate::data::datasets::Dataset;
use crate::data::filters::{CompiledFilter, FieldSchema};

/// A chart query template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelQuery {
    pub id: &'static str,
    pub dataset: &'static str,
    pub select: &'static str,
    /// Fixed condition ANDed ahead of the compiled filter
    pub condition: Option<&'static str>,
    pub group_by: Option<&'static str>,
    pub order_by: Option<&'static str>,
    pub limit: Option<u32>,
}

const MONTH: &str = "DATE_TRUNC('month', date)";

const PANELS: &[PanelQuery] = &[
    PanelQuery {
        id: "sales_totals",
        dataset: "sales",
        select: "SUM(qty) AS qty, SUM(sales) AS amt",
        condition: None,
        group_by: None,
        order_by: None,
        limit: None,
    },
    PanelQuery {
        id: "sales_quantity",
        dataset: "sales",
        select: "SUM(qty) AS qty",
        condition: None,
        group_by: None,
        order_by: None,
        limit: None,
    },
    PanelQuery {
        id: "production_by_org",
        dataset: "production",
        select: "organization AS org, SUM(qty) AS qty",
        condition: None,
        group_by: Some("organization"),
        order_by: None,
        limit: None,
    },
    PanelQuery {
        id: "internal_by_group",
        dataset: "internal",
        select: "product_group AS \"group\", SUM(qty) AS qty",
        condition: None,
        group_by: Some("product_group"),
        order_by: None,
        limit: None,
    },
    PanelQuery {
        id: "production_by_category_org",
        dataset: "production",
        select: "organization AS org, category AS cat, SUM(qty) AS qty",
        condition: None,
        group_by: Some("organization, category"),
        order_by: None,
        limit: None,
    },
    PanelQuery {
        id: "top_products",
        dataset: "production",
        select: "product, SUM(qty) AS qty",
        condition: None,
        group_by: Some("product"),
        order_by: Some("qty DESC"),
        limit: Some(10),
    },
    PanelQuery {
        id: "production_over_time",
        dataset: "production",
        select: "DATE_TRUNC('month', date) AS date, SUM(qty) AS qty",
        condition: Some("date IS NOT NULL AND qty IS NOT NULL"),
        group_by: Some(MONTH),
        order_by: Some(MONTH),
        limit: None,
    },
];

pub fn builtin_panels() -> &'static [PanelQuery] {
    PANELS
}

pub fn find_panel(id: &str) -> Option<&'static PanelQuery> {
    PANELS.iter().find(|p| p.id == id)
}

impl PanelQuery {
    /// Build the full statement for `dataset` with an already compiled filter
    pub fn render(&self, dataset: &Dataset, filter: &CompiledFilter) -> PreparedQuery {
        let mut sql = format!("SELECT {} FROM {}", self.select, dataset.table);
        let mut conditions: Vec<&str> = Vec::new();
        if let Some(condition) = self.condition {
            conditions.push(condition);
        }
        if !filter.is_empty() {
            conditions.push(&filter.clause);
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if let Some(group_by) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some(order_by) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        PreparedQuery {
            sql,
            params: filter.params.clone(),
        }
    }
}

/// Distinct values of a field, used to populate filter dropdowns.
///
/// `filter` narrows the options by the other active selections.
pub fn option_query(
    dataset: &Dataset,
    field: &FieldSchema,
    filter: &CompiledFilter,
) -> PreparedQuery {
    let mut sql = format!(
        "SELECT DISTINCT {} AS value FROM {}",
        field.column, dataset.table
    );
    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.clause);
    }
    sql.push_str(" ORDER BY value");

    PreparedQuery {
        sql,
        params: filter.params.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::data::datasets::Catalog;
    use crate::data::filters::{FilterSpec, Predicate, SqlParam, compile};

    fn production() -> Dataset {
        Catalog::builtin().unwrap().get("production").unwrap().clone()
    }

    #[test]
    fn every_panel_targets_a_known_dataset() {
        let catalog = Catalog::builtin().unwrap();
        for panel in builtin_panels() {
            assert!(
                catalog.get(panel.dataset).is_some(),
                "panel {} uses unknown dataset {}",
                panel.id,
                panel.dataset
            );
        }
    }

    #[test]
    fn panel_ids_are_unique() {
        let ids: HashSet<_> = builtin_panels().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), builtin_panels().len());
    }

    #[test]
    fn render_without_filter_omits_where() {
        let panel = find_panel("production_by_org").unwrap();
        let query = panel.render(&production(), &CompiledFilter::default());

        assert_eq!(
            query.sql,
            "SELECT organization AS org, SUM(qty) AS qty \
             FROM iceberg.kfg_analytics.production_qty_info GROUP BY organization"
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn render_places_where_before_group_by() {
        let dataset = production();
        let spec = FilterSpec::new(vec![Predicate::equals("organization", "Acme")]);
        let filter = compile(&spec, dataset.schema()).unwrap();

        let query = find_panel("top_products").unwrap().render(&dataset, &filter);

        assert_eq!(
            query.sql,
            "SELECT product, SUM(qty) AS qty FROM iceberg.kfg_analytics.production_qty_info \
             WHERE organization = ? GROUP BY product ORDER BY qty DESC LIMIT 10"
        );
        assert_eq!(query.params, vec![SqlParam::Text("Acme".to_string())]);
    }

    #[test]
    fn filter_values_never_reach_sql_text() {
        let dataset = production();
        let hostile = "x' OR '1'='1";
        let spec = FilterSpec::new(vec![Predicate::equals("organization", hostile)]);
        let filter = compile(&spec, dataset.schema()).unwrap();

        let query = find_panel("production_over_time")
            .unwrap()
            .render(&dataset, &filter);

        assert!(!query.sql.contains(hostile));
        assert!(query.sql.ends_with(
            "GROUP BY DATE_TRUNC('month', date) ORDER BY DATE_TRUNC('month', date)"
        ));
    }

    #[test]
    fn time_series_skips_rows_without_date_or_qty() {
        let dataset = production();
        let panel = find_panel("production_over_time").unwrap();

        let unfiltered = panel.render(&dataset, &CompiledFilter::default());
        assert!(unfiltered.sql.contains(
            "production_qty_info WHERE date IS NOT NULL AND qty IS NOT NULL GROUP BY"
        ));

        let spec = FilterSpec::new(vec![Predicate::equals("organization", "Acme")]);
        let filter = compile(&spec, dataset.schema()).unwrap();
        let filtered = panel.render(&dataset, &filter);
        assert!(filtered.sql.contains(
            "WHERE date IS NOT NULL AND qty IS NOT NULL AND organization = ? GROUP BY"
        ));
        assert_eq!(filtered.params, vec![SqlParam::Text("Acme".to_string())]);
    }

    #[test]
    fn unknown_panel() {
        assert!(find_panel("revenue_forecast").is_none());
    }

    #[test]
    fn option_query_selects_distinct_column() {
        let dataset = production();
        let field = dataset.option_field("organization").unwrap();
        let query = option_query(&dataset, field, &CompiledFilter::default());

        assert_eq!(
            query.sql,
            "SELECT DISTINCT organization AS value \
             FROM iceberg.kfg_analytics.production_qty_info ORDER BY value"
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn option_query_narrowed_by_filter() {
        let dataset = production();
        let spec = FilterSpec::new(vec![Predicate::equals("organization", "Acme")]);
        let filter = compile(&spec, dataset.schema()).unwrap();
        let field = dataset.option_field("category").unwrap();

        let query = option_query(&dataset, field, &filter);

        assert_eq!(
            query.sql,
            "SELECT DISTINCT category AS value FROM iceberg.kfg_analytics.production_qty_info \
             WHERE organization = ? ORDER BY value"
        );
        assert_eq!(query.params, vec![SqlParam::Text("Acme".to_string())]);
    }
}
