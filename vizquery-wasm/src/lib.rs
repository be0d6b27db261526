//! WASM <-> JavaScript bridge for the visualization query compiler.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use vizquery_compiler::PartialCompileOptions;
use vizquery_core::{
    Calendar, CompileOptions, MetricInfo, PeriodBounds, PeriodFilter, PresentationConfig,
    PresentationType, VizError,
};
use wasm_bindgen::prelude::*;

/// Full pipeline: compile, validate, hash and resolve the period window.
#[wasm_bindgen]
pub fn compile_request(request: JsValue) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let request = read::<serde_json::Value>(request, "compile request")?;
    let compiled =
        vizquery_compiler::compile_request_value(&request).map_err(format_viz_error)?;
    write(&compiled, "compiled query")
}

#[wasm_bindgen]
pub fn compile_fetch_config(
    metric: JsValue,
    config: JsValue,
    options: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let metric: MetricInfo = read(metric, "metric")?;
    let config: PresentationConfig = read(config, "config")?;
    let options = match options {
        Some(js_options) => {
            CompileOptions::from(read::<PartialCompileOptions>(js_options, "options")?)
        }
        None => CompileOptions::default(),
    };

    let fetch = vizquery_compiler::compile_fetch_config(&metric, &config, &options)
        .map_err(|err| format_viz_error(err.into()))?;
    write(&fetch, "fetch config")
}

#[wasm_bindgen]
pub fn default_presentation_config(
    metric: JsValue,
    presentation_type: JsValue,
) -> Result<JsValue, JsValue> {
    let metric: MetricInfo = read(metric, "metric")?;
    let presentation_type: PresentationType = read(presentation_type, "presentation type")?;

    let config = vizquery_compiler::default_presentation_config(&metric, presentation_type)
        .map_err(|err| format_viz_error(err.into()))?;
    write(&config, "config")
}

#[wasm_bindgen]
pub fn convert_presentation_type(
    config: JsValue,
    new_type: JsValue,
    metric: JsValue,
) -> Result<JsValue, JsValue> {
    let config: PresentationConfig = read(config, "config")?;
    let new_type: PresentationType = read(new_type, "presentation type")?;
    let metric: MetricInfo = read(metric, "metric")?;

    let converted = vizquery_compiler::convert_presentation_type(&config, new_type, &metric)
        .map_err(|err| format_viz_error(err.into()))?;
    write(&converted, "config")
}

#[wasm_bindgen]
pub fn next_available_slot(
    metric: JsValue,
    config: JsValue,
    dimension: &str,
) -> Result<JsValue, JsValue> {
    let metric: MetricInfo = read(metric, "metric")?;
    let config: PresentationConfig = read(config, "config")?;
    write(
        &vizquery_compiler::next_available_slot(&metric, &config, dimension),
        "display slot",
    )
}

#[wasm_bindgen]
pub fn has_conflict(metric: JsValue, config: JsValue) -> Result<bool, JsValue> {
    let metric: MetricInfo = read(metric, "metric")?;
    let config: PresentationConfig = read(config, "config")?;
    Ok(vizquery_compiler::has_conflict(&metric, &config))
}

#[wasm_bindgen]
pub fn resolve_period_filter(
    filter: JsValue,
    bounds: JsValue,
    calendar: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    let filter: Option<PeriodFilter> = read(filter, "period filter")?;
    let bounds: Option<PeriodBounds> = read(bounds, "period bounds")?;
    let calendar = match calendar {
        Some(js_calendar) => read::<Calendar>(js_calendar, "calendar")?,
        None => Calendar::default(),
    };

    let resolved =
        vizquery_compiler::resolve_period_filter(filter.as_ref(), bounds.as_ref(), calendar)
            .map_err(|err| format_viz_error(err.into()))?;
    write(&resolved, "period bounds")
}

/// Validate a descriptor and return it in canonical typed form.
#[wasm_bindgen]
pub fn validate_fetch_config(descriptor: JsValue) -> Result<JsValue, JsValue> {
    let descriptor = read::<serde_json::Value>(descriptor, "fetch config")?;
    let fetch = vizquery_compiler::validate_fetch_config_value(&descriptor)
        .map_err(|err| format_viz_error(err.into()))?;
    write(&fetch, "fetch config")
}

/// Cache key for a descriptor; malformed descriptors are rejected first.
#[wasm_bindgen]
pub fn hash_fetch_config(descriptor: JsValue) -> Result<String, JsValue> {
    let descriptor = read::<serde_json::Value>(descriptor, "fetch config")?;
    let fetch = vizquery_compiler::validate_fetch_config_value(&descriptor)
        .map_err(|err| format_viz_error(err.into()))?;
    Ok(vizquery_compiler::hash_fetch_config(&fetch))
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn read<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    from_value::<T>(value).map_err(|err| JsValue::from_str(&format!("Cannot read {what}: {err}")))
}

fn write<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("Cannot serialize {what}: {err}")))
}

fn format_viz_error(err: VizError) -> JsValue {
    JsValue::from_str(&format!("Visualization error: {err}"))
}
