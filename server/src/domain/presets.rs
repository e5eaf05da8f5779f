//! Relative date range presets (`7d`, `30d`, `90d`, `1y`)
//!
//! A `range` predicate may carry a single preset token instead of a
//! `[from, to]` pair. Presets are resolved against a caller-supplied date so
//! compilation itself stays deterministic.

use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};

use crate::data::filters::{FilterSpec, FilterValue, Operator, Predicate};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangePreset {
    Last7Days,
    Last30Days,
    Last90Days,
    LastYear,
}

impl FromStr for DateRangePreset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            "1y" => Ok(Self::LastYear),
            _ => Err(()),
        }
    }
}

impl DateRangePreset {
    /// Inclusive `(from, to)` ending on `today`
    pub fn resolve(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = match self {
            Self::Last7Days => today.checked_sub_days(Days::new(7)),
            Self::Last30Days => today.checked_sub_days(Days::new(30)),
            Self::Last90Days => today.checked_sub_days(Days::new(90)),
            Self::LastYear => today.checked_sub_months(Months::new(12)),
        };
        (from.unwrap_or(NaiveDate::MIN), today)
    }
}

/// Replace preset tokens in `range` predicates with concrete date pairs.
///
/// Anything that is not a recognised preset is left untouched for the
/// compiler to accept or reject.
pub fn resolve_presets(spec: FilterSpec, today: NaiveDate) -> FilterSpec {
    spec.into_iter()
        .map(|predicate| resolve_predicate(predicate, today))
        .collect()
}

fn resolve_predicate(predicate: Predicate, today: NaiveDate) -> Predicate {
    if predicate.operator != Operator::Range {
        return predicate;
    }
    let FilterValue::One(token) = &predicate.value else {
        return predicate;
    };
    match token.parse::<DateRangePreset>() {
        Ok(preset) => {
            let (from, to) = preset.resolve(today);
            Predicate::range(
                predicate.field,
                from.format(DATE_FORMAT).to_string(),
                to.format(DATE_FORMAT).to_string(),
            )
        }
        Err(()) => predicate,
    }
}
