//! Descriptor handed to the long-form query engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::{AggregationFunction, NationalPosition, PeriodFilter};

/// One aggregated value column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FetchValue {
    pub prop: String,
    pub func: AggregationFunction,
}

/// A dimension value used in a filter; the engine accepts text or numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(Number),
}

impl FilterValue {
    /// Sort/hash key; the type tag keeps `"1"` and `1` apart.
    pub fn canonical_key(&self) -> String {
        match self {
            FilterValue::Text(text) => format!("s:{text}"),
            FilterValue::Number(number) => format!("n:{number}"),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => f.write_str(text),
            FilterValue::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(Number::from(value))
    }
}

/// Which replicant instance a fetch is for.
///
/// `Unselected` is a deliberate request for "no instance chosen yet": the
/// engine returns an empty result instead of aggregating across every value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ReplicantSelection {
    Selected(FilterValue),
    Unselected,
}

impl ReplicantSelection {
    pub fn from_option(value: Option<&FilterValue>) -> Self {
        match value {
            Some(value) => ReplicantSelection::Selected(value.clone()),
            None => ReplicantSelection::Unselected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchFilter {
    /// Keep only rows whose dimension matches one of `values`.
    Values {
        dimension: String,
        values: Vec<FilterValue>,
    },
    /// Synthetic single-value filter for the replicant dimension.
    Replicant {
        dimension: String,
        selection: ReplicantSelection,
    },
}

impl FetchFilter {
    pub fn dimension(&self) -> &str {
        match self {
            FetchFilter::Values { dimension, .. } | FetchFilter::Replicant { dimension, .. } => {
                dimension
            }
        }
    }
}

/// Compiled query descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FetchConfig {
    pub values: Vec<FetchValue>,
    /// Formula over `values` when the metric is derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    pub group_bys: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FetchFilter>,
    #[serde(default)]
    pub period_filter: Option<PeriodFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_national_for_region: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_national_position: Option<NationalPosition>,
}
