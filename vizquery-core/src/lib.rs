//! Data model for compiling visualization configurations into fetch descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

mod error;
mod fetch;
mod period;

pub use error::{AuthoringError, ValidationError, VizError};
pub use fetch::{FetchConfig, FetchFilter, FetchValue, FilterValue, ReplicantSelection};
pub use period::{Calendar, PeriodBounds, PeriodFilter, PeriodOption};

/// Options that steer fetch compilation and period resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Skip the synthetic filter on the replicant dimension (used when every
    /// replicant value is fetched at once, e.g. to list the choices).
    pub suppress_replicant_filter: bool,
    /// Calendar used when resolving relative period filters.
    pub calendar: Calendar,
    /// Dimension whose national aggregate can be appended to the results.
    pub region_dimension: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            suppress_replicant_filter: false,
            calendar: Calendar::Gregorian,
            region_dimension: "region".to_string(),
        }
    }
}

/// Overall shape of a visualization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PresentationType {
    Table,
    Timeseries,
    Chart,
}

impl PresentationType {
    pub const ALL: [PresentationType; 3] = [
        PresentationType::Table,
        PresentationType::Timeseries,
        PresentationType::Chart,
    ];

    /// Valid display slots, in the order the allocator tries them.
    pub fn slot_priority(self) -> &'static [DisplaySlot] {
        match self {
            PresentationType::Table => &TABLE_SLOTS,
            PresentationType::Timeseries => &TIMESERIES_SLOTS,
            PresentationType::Chart => &CHART_SLOTS,
        }
    }

    pub fn accepts(self, slot: DisplaySlot) -> bool {
        self.slot_priority().contains(&slot)
    }

    /// Slot the value axis lands on in a freshly styled configuration.
    pub fn default_values_slot(self) -> DisplaySlot {
        match self {
            PresentationType::Table => DisplaySlot::Col,
            PresentationType::Timeseries => DisplaySlot::Series,
            PresentationType::Chart => DisplaySlot::Indicator,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PresentationType::Table => "table",
            PresentationType::Timeseries => "timeseries",
            PresentationType::Chart => "chart",
        }
    }
}

impl fmt::Display for PresentationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual encoding a dimension is mapped to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySlot {
    Row,
    Col,
    RowGroup,
    ColGroup,
    Series,
    Cell,
    Indicator,
    Replicant,
}

impl DisplaySlot {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplaySlot::Row => "row",
            DisplaySlot::Col => "col",
            DisplaySlot::RowGroup => "row_group",
            DisplaySlot::ColGroup => "col_group",
            DisplaySlot::Series => "series",
            DisplaySlot::Cell => "cell",
            DisplaySlot::Indicator => "indicator",
            DisplaySlot::Replicant => "replicant",
        }
    }
}

impl fmt::Display for DisplaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TABLE_SLOTS: [DisplaySlot; 5] = [
    DisplaySlot::Col,
    DisplaySlot::Row,
    DisplaySlot::ColGroup,
    DisplaySlot::RowGroup,
    DisplaySlot::Replicant,
];

const TIMESERIES_SLOTS: [DisplaySlot; 5] = [
    DisplaySlot::Series,
    DisplaySlot::Cell,
    DisplaySlot::Row,
    DisplaySlot::Col,
    DisplaySlot::Replicant,
];

const CHART_SLOTS: [DisplaySlot; 6] = [
    DisplaySlot::Indicator,
    DisplaySlot::Series,
    DisplaySlot::Cell,
    DisplaySlot::Row,
    DisplaySlot::Col,
    DisplaySlot::Replicant,
];

/// Aggregation applied by the query engine to a value property.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    Identity,
}

impl AggregationFunction {
    pub const ALL: [AggregationFunction; 6] = [
        AggregationFunction::Sum,
        AggregationFunction::Avg,
        AggregationFunction::Count,
        AggregationFunction::Min,
        AggregationFunction::Max,
        AggregationFunction::Identity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AggregationFunction::Sum => "SUM",
            AggregationFunction::Avg => "AVG",
            AggregationFunction::Count => "COUNT",
            AggregationFunction::Min => "MIN",
            AggregationFunction::Max => "MAX",
            AggregationFunction::Identity => "IDENTITY",
        }
    }

    /// Parse the wire literal; `None` for anything outside the enumerated set.
    pub fn from_literal(literal: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|func| func.as_str() == literal)
    }
}

/// Catalogue entry for one dimension a metric can be split by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisaggregationOptionInfo {
    pub dimension: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    /// When set, the dimension may only be active under these types.
    #[serde(default)]
    pub allowed_presentation_types: Option<Vec<PresentationType>>,
}

impl DisaggregationOptionInfo {
    pub fn allows(&self, presentation_type: PresentationType) -> bool {
        match &self.allowed_presentation_types {
            Some(allowed) => allowed.contains(&presentation_type),
            None => true,
        }
    }
}

/// Formula computed from several independently aggregated ingredients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedValueExpression {
    pub ingredients: Vec<FetchValue>,
    pub formula: String,
}

/// Metric metadata supplied by the catalogue service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricInfo {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub value_props: Vec<String>,
    pub value_func: AggregationFunction,
    #[serde(default)]
    pub disaggregation_options: Vec<DisaggregationOptionInfo>,
    pub period_options: Vec<PeriodOption>,
    #[serde(default)]
    pub derived_value: Option<DerivedValueExpression>,
}

impl MetricInfo {
    /// The value axis only competes for a slot when there is more than one value.
    pub fn has_multiple_values(&self) -> bool {
        self.value_props.len() > 1
    }

    pub fn disaggregation(&self, dimension: &str) -> Option<&DisaggregationOptionInfo> {
        self.disaggregation_options
            .iter()
            .find(|option| option.dimension == dimension)
    }

    pub fn required_dimensions(&self) -> impl Iterator<Item = &DisaggregationOptionInfo> {
        self.disaggregation_options
            .iter()
            .filter(|option| option.is_required)
    }
}

/// An active dimension and the slot it is drawn on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisaggregationSelection {
    pub dimension: String,
    pub slot: DisplaySlot,
}

/// Explicit values the user kept for one dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DimensionFilter {
    pub dimension: String,
    pub values: Vec<FilterValue>,
}

/// Where the national aggregate row goes relative to the regions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NationalPosition {
    Top,
    #[default]
    Bottom,
}

impl NationalPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            NationalPosition::Top => "top",
            NationalPosition::Bottom => "bottom",
        }
    }
}

/// Primary rendering mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Values,
    Bars,
    Lines,
    Points,
}

/// Presentation-type specific styling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleConfig {
    pub content: RenderMode,
    pub stacked: bool,
    pub horizontal: bool,
    pub show_data_labels: bool,
    pub conditional_formatting: bool,
}

impl StyleConfig {
    pub fn for_presentation_type(presentation_type: PresentationType) -> Self {
        match presentation_type {
            PresentationType::Table => Self {
                content: RenderMode::Values,
                stacked: false,
                horizontal: false,
                show_data_labels: false,
                conditional_formatting: true,
            },
            PresentationType::Timeseries => Self {
                content: RenderMode::Lines,
                stacked: false,
                horizontal: false,
                show_data_labels: false,
                conditional_formatting: false,
            },
            PresentationType::Chart => Self {
                content: RenderMode::Bars,
                stacked: false,
                horizontal: false,
                show_data_labels: true,
                conditional_formatting: false,
            },
        }
    }
}

/// Captions survive presentation-type changes untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TextConfig {
    pub caption: Option<String>,
    pub sub_caption: Option<String>,
    pub footnote: Option<String>,
}

/// User-editable visualization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresentationConfig {
    pub presentation_type: PresentationType,
    /// Slot of the implicit value axis; ignored for single-value metrics.
    pub values_slot: DisplaySlot,
    /// Subset of the metric's value properties the user kept.
    #[serde(default)]
    pub values_filter: Option<Vec<String>>,
    #[serde(default)]
    pub disaggregations: Vec<DisaggregationSelection>,
    #[serde(default)]
    pub filters: Vec<DimensionFilter>,
    #[serde(default)]
    pub period_filter: Option<PeriodFilter>,
    pub period_option: PeriodOption,
    #[serde(default)]
    pub selected_replicant_value: Option<FilterValue>,
    #[serde(default)]
    pub include_national_for_region: bool,
    #[serde(default)]
    pub include_national_position: NationalPosition,
    pub style: StyleConfig,
    #[serde(default)]
    pub text: TextConfig,
}

impl PresentationConfig {
    /// Empty configuration styled for `presentation_type`.
    pub fn blank(presentation_type: PresentationType, period_option: PeriodOption) -> Self {
        Self {
            presentation_type,
            values_slot: presentation_type.default_values_slot(),
            values_filter: None,
            disaggregations: Vec::new(),
            filters: Vec::new(),
            period_filter: None,
            period_option,
            selected_replicant_value: None,
            include_national_for_region: false,
            include_national_position: NationalPosition::default(),
            style: StyleConfig::for_presentation_type(presentation_type),
            text: TextConfig::default(),
        }
    }

    pub fn has_dimension(&self, dimension: &str) -> bool {
        self.slot_of(dimension).is_some()
    }

    pub fn slot_of(&self, dimension: &str) -> Option<DisplaySlot> {
        self.disaggregations
            .iter()
            .find(|selection| selection.dimension == dimension)
            .map(|selection| selection.slot)
    }

    /// Dimension currently fanned out into independent chart instances.
    pub fn replicant_dimension(&self) -> Option<&str> {
        self.disaggregations
            .iter()
            .find(|selection| selection.slot == DisplaySlot::Replicant)
            .map(|selection| selection.dimension.as_str())
    }

    pub fn filter_for(&self, dimension: &str) -> Option<&DimensionFilter> {
        self.filters
            .iter()
            .find(|filter| filter.dimension == dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_presentation_type_accepts_its_default_values_slot() {
        for presentation_type in PresentationType::ALL {
            assert!(presentation_type.accepts(presentation_type.default_values_slot()));
            assert!(presentation_type.accepts(DisplaySlot::Replicant));
        }
        assert!(!PresentationType::Table.accepts(DisplaySlot::Series));
        assert!(!PresentationType::Chart.accepts(DisplaySlot::RowGroup));
    }

    #[test]
    fn aggregation_literals_round_trip_through_from_literal() {
        assert_eq!(
            AggregationFunction::from_literal("SUM"),
            Some(AggregationFunction::Sum)
        );
        assert_eq!(AggregationFunction::from_literal("sum"), None);
        assert_eq!(AggregationFunction::from_literal("MEDIAN"), None);
    }

    #[test]
    fn blank_configs_are_fresh_per_call() {
        let mut first = PresentationConfig::blank(PresentationType::Chart, PeriodOption::PeriodId);
        let second = PresentationConfig::blank(PresentationType::Chart, PeriodOption::PeriodId);
        first.text.caption = Some("Coverage".to_string());
        assert_eq!(second.text.caption, None);
        assert_eq!(second.values_slot, DisplaySlot::Indicator);
        assert_eq!(second.style.content, RenderMode::Bars);
    }

    #[test]
    fn config_deserializes_with_sparse_fields() {
        let config: PresentationConfig = serde_json::from_value(serde_json::json!({
            "presentation_type": "table",
            "values_slot": "col",
            "disaggregations": [{ "dimension": "region", "slot": "row" }],
            "period_option": "period_id",
            "style": {
                "content": "values",
                "stacked": false,
                "horizontal": false,
                "show_data_labels": false,
                "conditional_formatting": true
            }
        }))
        .expect("config should parse");

        assert_eq!(config.slot_of("region"), Some(DisplaySlot::Row));
        assert_eq!(config.replicant_dimension(), None);
        assert_eq!(config.include_national_position, NationalPosition::Bottom);
    }
}
