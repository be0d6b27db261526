//! Assembles the fetch descriptor from a configuration and metric metadata.

use std::collections::BTreeSet;

use vizquery_core::{
    AuthoringError, CompileOptions, DisplaySlot, FetchConfig, FetchFilter, FetchValue,
    MetricInfo, NationalPosition, PresentationConfig, PresentationType, ReplicantSelection,
};

/// Compile `config` into the descriptor the query engine consumes.
///
/// Fails on authoring problems (unknown, disallowed or misplaced dimensions,
/// missing required dimensions, bad value selections, unsupported period
/// option); there is no partial output.
pub fn compile_fetch_config(
    metric: &MetricInfo,
    config: &PresentationConfig,
    options: &CompileOptions,
) -> Result<FetchConfig, AuthoringError> {
    check_disaggregations(metric, config)?;

    let (values, formula) = compile_values(metric, config)?;
    let group_bys = compile_group_bys(metric, config)?;
    let filters = compile_filters(config, options);
    let (include_national_for_region, include_national_position) =
        national_flags(config, options);

    Ok(FetchConfig {
        values,
        formula,
        group_bys,
        filters,
        period_filter: config.period_filter.clone(),
        include_national_for_region,
        include_national_position,
    })
}

fn check_disaggregations(
    metric: &MetricInfo,
    config: &PresentationConfig,
) -> Result<(), AuthoringError> {
    let presentation_type = config.presentation_type;

    for selection in &config.disaggregations {
        let option = metric.disaggregation(&selection.dimension).ok_or_else(|| {
            AuthoringError::UnknownDimension {
                dimension: selection.dimension.clone(),
            }
        })?;
        if !option.allows(presentation_type) {
            return Err(AuthoringError::DisallowedDimension {
                dimension: selection.dimension.clone(),
                presentation_type,
            });
        }
        if !presentation_type.accepts(selection.slot) {
            return Err(AuthoringError::InvalidSlot {
                dimension: selection.dimension.clone(),
                slot: selection.slot,
                presentation_type,
            });
        }
    }

    if let Some(missing) = metric
        .required_dimensions()
        .find(|option| !config.has_dimension(&option.dimension))
    {
        return Err(AuthoringError::MissingRequiredDimension {
            dimension: missing.dimension.clone(),
        });
    }

    Ok(())
}

fn compile_values(
    metric: &MetricInfo,
    config: &PresentationConfig,
) -> Result<(Vec<FetchValue>, Option<String>), AuthoringError> {
    if let Some(derived) = &metric.derived_value {
        if derived.ingredients.is_empty() {
            return Err(AuthoringError::EmptyValueSelection);
        }
        return Ok((derived.ingredients.clone(), Some(derived.formula.clone())));
    }

    if let Some(kept) = &config.values_filter {
        if let Some(unknown) = kept.iter().find(|prop| !metric.value_props.contains(prop)) {
            return Err(AuthoringError::UnknownValueProperty {
                prop: unknown.clone(),
            });
        }
    }

    // Metric order, not the order the user ticked values in.
    let values: Vec<FetchValue> = metric
        .value_props
        .iter()
        .filter(|prop| {
            config
                .values_filter
                .as_ref()
                .map_or(true, |kept| kept.contains(prop))
        })
        .map(|prop| FetchValue {
            prop: prop.clone(),
            func: metric.value_func,
        })
        .collect();

    if values.is_empty() {
        return Err(AuthoringError::EmptyValueSelection);
    }
    Ok((values, None))
}

fn compile_group_bys(
    metric: &MetricInfo,
    config: &PresentationConfig,
) -> Result<Vec<String>, AuthoringError> {
    let mut seen = BTreeSet::new();
    let mut group_bys: Vec<String> = config
        .disaggregations
        .iter()
        .filter(|selection| seen.insert(selection.dimension.as_str()))
        .map(|selection| selection.dimension.clone())
        .collect();

    if config.presentation_type == PresentationType::Timeseries {
        let period_option = config.period_option;
        if !metric.period_options.contains(&period_option) {
            return Err(AuthoringError::UnsupportedPeriodOption { period_option });
        }
        if seen.insert(period_option.as_str()) {
            group_bys.push(period_option.as_str().to_string());
        }
    }

    Ok(group_bys)
}

fn compile_filters(config: &PresentationConfig, options: &CompileOptions) -> Vec<FetchFilter> {
    let mut filters: Vec<FetchFilter> = config
        .filters
        .iter()
        .filter(|filter| !filter.values.is_empty())
        .map(|filter| FetchFilter::Values {
            dimension: filter.dimension.clone(),
            values: filter.values.clone(),
        })
        .collect();

    if !options.suppress_replicant_filter {
        if let Some(dimension) = config.replicant_dimension() {
            filters.push(FetchFilter::Replicant {
                dimension: dimension.to_string(),
                selection: ReplicantSelection::from_option(
                    config.selected_replicant_value.as_ref(),
                ),
            });
        }
    }

    filters
}

// Replicating by region already yields one aggregate per instance, so the
// national row only applies when the region is on a regular slot.
fn national_flags(
    config: &PresentationConfig,
    options: &CompileOptions,
) -> (Option<bool>, Option<NationalPosition>) {
    let region_on_regular_slot = config
        .slot_of(&options.region_dimension)
        .is_some_and(|slot| slot != DisplaySlot::Replicant);

    if config.include_national_for_region && region_on_regular_slot {
        (Some(true), Some(config.include_national_position))
    } else {
        (None, None)
    }
}
