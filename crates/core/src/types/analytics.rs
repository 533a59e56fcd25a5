//! Analytics result rows.
//!
//! Callers index results positionally, so [`AnalyticsRows`] keeps the order
//! produced by the catalog. The name-keyed helpers are a convenience on top
//! of that order, never a replacement for it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One named metric value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Catalog name of the metric.
    pub name: String,
    /// Computed value.
    pub value: i64,
    /// Calendar day covered by a day-bucketed row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl MetricRow {
    /// An instantaneous metric row.
    #[must_use]
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            date: None,
        }
    }

    /// A row covering a single calendar day.
    #[must_use]
    pub fn for_day(name: impl Into<String>, date: NaiveDate, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            date: Some(date),
        }
    }
}

/// Ordered result of one analytics request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyticsRows(Vec<MetricRow>);

impl AnalyticsRows {
    #[must_use]
    pub const fn new(rows: Vec<MetricRow>) -> Self {
        Self(rows)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Row at `position`.
    #[must_use]
    pub fn row(&self, position: usize) -> Option<&MetricRow> {
        self.0.get(position)
    }

    /// First row named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetricRow> {
        self.0.iter().find(|row| row.name == name)
    }

    /// Value of the first row named `name`.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.get(name).map(|row| row.value)
    }

    /// Row names in result order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|row| row.name.as_str()).collect()
    }

    /// Name-keyed view of instantaneous rows.
    ///
    /// Day-bucketed rows share a name, so they are keyed `name:YYYY-MM-DD`.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, i64> {
        self.0
            .iter()
            .map(|row| {
                let key = match row.date {
                    Some(date) => format!("{}:{date}", row.name),
                    None => row.name.clone(),
                };
                (key, row.value)
            })
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricRow> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<MetricRow> {
        self.0
    }
}

impl From<Vec<MetricRow>> for AnalyticsRows {
    fn from(rows: Vec<MetricRow>) -> Self {
        Self(rows)
    }
}

impl<'a> IntoIterator for &'a AnalyticsRows {
    type Item = &'a MetricRow;
    type IntoIter = std::slice::Iter<'a, MetricRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
