//! Starting configurations for a freshly chosen metric and presentation type.

use vizquery_core::{AuthoringError, MetricInfo, PeriodOption, PresentationConfig, PresentationType};

use crate::slots::add_disaggregation;

/// Fresh configuration for `metric`: default styling, the metric's first
/// period option, and every required dimension on an allocated slot.
pub fn default_presentation_config(
    metric: &MetricInfo,
    presentation_type: PresentationType,
) -> Result<PresentationConfig, AuthoringError> {
    let period_option = metric
        .period_options
        .first()
        .copied()
        .unwrap_or(PeriodOption::PeriodId);

    let mut config = PresentationConfig::blank(presentation_type, period_option);
    for option in metric.required_dimensions() {
        config = add_disaggregation(metric, &config, &option.dimension)?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{coverage_metric, visits_metric};
    use pretty_assertions::assert_eq;
    use vizquery_core::{DisaggregationSelection, DisplaySlot};

    #[test]
    fn required_dimensions_are_placed_around_the_values_axis() {
        let config =
            default_presentation_config(&coverage_metric(), PresentationType::Chart).unwrap();
        assert_eq!(config.values_slot, DisplaySlot::Indicator);
        assert_eq!(
            config.disaggregations,
            vec![DisaggregationSelection {
                dimension: "region".to_string(),
                slot: DisplaySlot::Series,
            }]
        );
        assert_eq!(config.period_option, PeriodOption::PeriodId);
    }

    #[test]
    fn metrics_without_required_dimensions_start_empty() {
        let config =
            default_presentation_config(&visits_metric(), PresentationType::Table).unwrap();
        assert!(config.disaggregations.is_empty());
        assert_eq!(config.values_slot, DisplaySlot::Col);
    }

    #[test]
    fn required_dimension_outside_allow_list_fails() {
        let mut metric = coverage_metric();
        metric.disaggregation_options[0].allowed_presentation_types =
            Some(vec![PresentationType::Table]);
        let err = default_presentation_config(&metric, PresentationType::Timeseries).unwrap_err();
        assert_eq!(
            err,
            AuthoringError::DisallowedDimension {
                dimension: "region".to_string(),
                presentation_type: PresentationType::Timeseries,
            }
        );
    }
}
