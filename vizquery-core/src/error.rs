use crate::{DisplaySlot, PeriodOption, PresentationType};

/// Problems the person editing the visualization can fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthoringError {
    #[error("Dimension `{dimension}` is not available for this metric")]
    UnknownDimension { dimension: String },
    #[error("Dimension `{dimension}` cannot be used in a {presentation_type}")]
    DisallowedDimension {
        dimension: String,
        presentation_type: PresentationType,
    },
    #[error("Dimension `{dimension}` is required for this metric")]
    MissingRequiredDimension { dimension: String },
    #[error("Dimension `{dimension}` cannot be displayed as `{slot}` in a {presentation_type}")]
    InvalidSlot {
        dimension: String,
        slot: DisplaySlot,
        presentation_type: PresentationType,
    },
    #[error("Value `{prop}` is not reported by this metric")]
    UnknownValueProperty { prop: String },
    #[error("At least one value must be selected")]
    EmptyValueSelection,
    #[error("This metric is not reported by {period_option}")]
    UnsupportedPeriodOption { period_option: PeriodOption },
    #[error("Period filter cannot be resolved: {0}")]
    UnsupportedPeriodFilter(String),
    #[error("`{id}` is not a valid {period_option}")]
    MalformedPeriod { period_option: PeriodOption, id: u32 },
}

/// Structural defects in a descriptor; these point at an upstream bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Descriptor is not a JSON object")]
    NotAnObject,
    #[error("`{0}` must be a list")]
    NotAList(&'static str),
    #[error("Descriptor requests no values")]
    EmptyValues,
    #[error("Value entry {index} is malformed: {reason}")]
    MalformedValue { index: usize, reason: String },
    #[error("Aggregation `{0}` is not supported")]
    UnknownAggregation(String),
    #[error("Filter {index} has an empty dimension id")]
    EmptyFilterDimension { index: usize },
    #[error("Filter on `{dimension}` has no values")]
    EmptyFilterValues { dimension: String },
    #[error("Filter on `{dimension}` has a value that is neither text nor number: {found}")]
    InvalidFilterValue { dimension: String, found: String },
    #[error("Filter {index} is malformed: {reason}")]
    MalformedFilter { index: usize, reason: String },
    #[error("National aggregate flag must be a boolean, found {0}")]
    NationalFlagNotBoolean(String),
    #[error("National aggregate position must be `top` or `bottom`, found {0}")]
    InvalidNationalPosition(String),
    #[error("Descriptor does not match the fetch schema: {0}")]
    Schema(String),
}

/// Umbrella error for the JSON entry points.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error(transparent)]
    Authoring(#[from] AuthoringError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Cannot read input: {0}")]
    Parse(String),
}
