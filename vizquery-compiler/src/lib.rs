//! Compiles visualization configurations into canonical fetch descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vizquery_core::{
    Calendar, CompileOptions, FetchConfig, MetricInfo, PeriodBounds, PresentationConfig, VizError,
};

mod convert;
mod defaults;
mod fetch;
mod hash;
mod period;
mod slots;
mod validate;

pub use convert::convert_presentation_type;
pub use defaults::default_presentation_config;
pub use fetch::compile_fetch_config;
pub use hash::hash_fetch_config;
pub use period::{resolve_period_filter, Period};
pub use slots::{
    add_disaggregation, conflicting_slots, has_conflict, next_available_slot,
    remove_disaggregation,
};
pub use validate::{validate_fetch_config, validate_fetch_config_value};

/// Options as they arrive from JSON callers; missing fields fall back to
/// [`CompileOptions::default`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialCompileOptions {
    #[serde(default)]
    pub suppress_replicant_filter: Option<bool>,
    #[serde(default)]
    pub calendar: Option<Calendar>,
    #[serde(default)]
    pub region_dimension: Option<String>,
}

impl From<PartialCompileOptions> for CompileOptions {
    fn from(partial: PartialCompileOptions) -> Self {
        let mut base = CompileOptions::default();
        if let Some(suppress) = partial.suppress_replicant_filter {
            base.suppress_replicant_filter = suppress;
        }
        if let Some(calendar) = partial.calendar {
            base.calendar = calendar;
        }
        if let Some(region) = partial.region_dimension {
            base.region_dimension = region;
        }
        base
    }
}

/// Everything needed to turn one configuration into a cache-keyed fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileRequest {
    pub metric: MetricInfo,
    pub config: PresentationConfig,
    #[serde(default)]
    pub options: PartialCompileOptions,
    #[serde(default)]
    pub period_bounds: Option<PeriodBounds>,
}

/// Output of the full pipeline.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompiledQuery {
    pub fetch_config: FetchConfig,
    /// Order-independent cache key of `fetch_config`.
    pub hash: String,
    /// Absolute window for the period filter, when it can be resolved.
    pub resolved_period: Option<PeriodBounds>,
}

/// Run the pipeline on a JSON string.
pub fn compile_request_str(request_json: &str) -> Result<CompiledQuery, VizError> {
    let value: Value =
        serde_json::from_str(request_json).map_err(|err| VizError::Parse(err.to_string()))?;
    compile_request_value(&value)
}

/// Run the pipeline on a `serde_json::Value`.
pub fn compile_request_value(request: &Value) -> Result<CompiledQuery, VizError> {
    let request = CompileRequest::deserialize(request)
        .map_err(|err| VizError::Parse(format!("Invalid compile request: {err}")))?;
    compile_request(request)
}

/// Compile, validate, hash, then resolve the period window.
pub fn compile_request(request: CompileRequest) -> Result<CompiledQuery, VizError> {
    let options = CompileOptions::from(request.options);
    let fetch_config = compile_fetch_config(&request.metric, &request.config, &options)?;
    validate_fetch_config(&fetch_config)?;
    let hash = hash_fetch_config(&fetch_config);
    let resolved_period = resolve_period_filter(
        fetch_config.period_filter.as_ref(),
        request.period_bounds.as_ref(),
        options.calendar,
    )?;

    log::debug!(
        "compiled metric {} into {} values / {} group-bys",
        request.metric.id,
        fetch_config.values.len(),
        fetch_config.group_bys.len()
    );

    Ok(CompiledQuery {
        fetch_config,
        hash,
        resolved_period,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Once;

    use vizquery_core::{
        AggregationFunction, DisaggregationOptionInfo, MetricInfo, PeriodOption, PresentationType,
    };

    static INIT: Once = Once::new();

    pub fn init_logger() {
        INIT.call_once(|| {
            let _ = env_logger::builder().is_test(true).try_init();
        });
    }

    pub fn dimension(id: &str) -> DisaggregationOptionInfo {
        DisaggregationOptionInfo {
            dimension: id.to_string(),
            label: None,
            is_required: false,
            allowed_presentation_types: None,
        }
    }

    /// Two-valued coverage metric with a required region dimension.
    pub fn coverage_metric() -> MetricInfo {
        let mut region = dimension("region");
        region.is_required = true;
        let mut facility = dimension("facility_type");
        facility.allowed_presentation_types =
            Some(vec![PresentationType::Table, PresentationType::Chart]);

        MetricInfo {
            id: "anc_coverage".to_string(),
            label: "ANC coverage".to_string(),
            value_props: vec!["numerator".to_string(), "denominator".to_string()],
            value_func: AggregationFunction::Sum,
            disaggregation_options: vec![
                region,
                facility,
                dimension("district"),
                dimension("indicator"),
                dimension("sex"),
            ],
            period_options: vec![PeriodOption::PeriodId, PeriodOption::QuarterId],
            derived_value: None,
        }
    }

    /// Single-valued metric without required dimensions.
    pub fn visits_metric() -> MetricInfo {
        MetricInfo {
            id: "opd_visits".to_string(),
            label: "Outpatient visits".to_string(),
            value_props: vec!["count".to_string()],
            value_func: AggregationFunction::Sum,
            disaggregation_options: vec![
                dimension("region"),
                dimension("district"),
                dimension("sex"),
                dimension("age_group"),
                dimension("facility_type"),
                dimension("indicator"),
            ],
            period_options: vec![PeriodOption::PeriodId, PeriodOption::Year],
            derived_value: None,
        }
    }
}
