//! Display slot bookkeeping: allocation, conflict detection, adding and
//! removing dimensions.

use std::collections::BTreeSet;

use vizquery_core::{
    AuthoringError, DisaggregationSelection, DisplaySlot, MetricInfo, PresentationConfig,
};

/// Slots in the order they were claimed, plus a set for lookups.
#[derive(Debug, Default)]
pub(crate) struct SlotUsage {
    order: Vec<DisplaySlot>,
    taken: BTreeSet<DisplaySlot>,
}

impl SlotUsage {
    /// Returns `false` when the slot was already taken.
    pub(crate) fn claim(&mut self, slot: DisplaySlot) -> bool {
        if self.taken.insert(slot) {
            self.order.push(slot);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_taken(&self, slot: DisplaySlot) -> bool {
        self.taken.contains(&slot)
    }

    pub(crate) fn claimed(&self) -> &[DisplaySlot] {
        &self.order
    }
}

/// First slot in the presentation type's priority order that neither another
/// active dimension nor the value axis uses.
///
/// When every slot is used the first one in priority order is returned; the
/// resulting overlap shows up in [`has_conflict`].
pub fn next_available_slot(
    metric: &MetricInfo,
    config: &PresentationConfig,
    dimension: &str,
) -> DisplaySlot {
    let priority = config.presentation_type.slot_priority();
    let mut usage = SlotUsage::default();

    if metric.has_multiple_values() {
        usage.claim(config.values_slot);
    }
    for selection in config
        .disaggregations
        .iter()
        .filter(|selection| selection.dimension != dimension)
    {
        usage.claim(selection.slot);
    }

    let slot = priority
        .iter()
        .copied()
        .find(|slot| !usage.is_taken(*slot))
        .unwrap_or(priority[0]);

    log::debug!(
        "allocated {slot} to {dimension} ({} in use: {:?})",
        config.presentation_type,
        usage.claimed()
    );
    slot
}

/// Slots shared by two or more informative participants, in first-seen order.
pub fn conflicting_slots(metric: &MetricInfo, config: &PresentationConfig) -> Vec<DisplaySlot> {
    let mut usage = SlotUsage::default();
    let mut conflicts = SlotUsage::default();

    if values_axis_is_informative(metric, config) {
        usage.claim(config.values_slot);
    }
    for selection in &config.disaggregations {
        if !dimension_is_informative(config, &selection.dimension) {
            continue;
        }
        if !usage.claim(selection.slot) {
            conflicts.claim(selection.slot);
        }
    }

    conflicts.order
}

pub fn has_conflict(metric: &MetricInfo, config: &PresentationConfig) -> bool {
    !conflicting_slots(metric, config).is_empty()
}

/// Activate `dimension` on the next free slot. Already active dimensions are
/// left where they are.
pub fn add_disaggregation(
    metric: &MetricInfo,
    config: &PresentationConfig,
    dimension: &str,
) -> Result<PresentationConfig, AuthoringError> {
    let option = metric
        .disaggregation(dimension)
        .ok_or_else(|| AuthoringError::UnknownDimension {
            dimension: dimension.to_string(),
        })?;

    if !option.allows(config.presentation_type) {
        return Err(AuthoringError::DisallowedDimension {
            dimension: dimension.to_string(),
            presentation_type: config.presentation_type,
        });
    }

    let mut updated = config.clone();
    if updated.has_dimension(dimension) {
        return Ok(updated);
    }

    let slot = next_available_slot(metric, config, dimension);
    updated.disaggregations.push(DisaggregationSelection {
        dimension: dimension.to_string(),
        slot,
    });
    Ok(updated)
}

/// Deactivate `dimension`, dropping its filter and, if it was the replicant,
/// the selected replicant value.
pub fn remove_disaggregation(
    metric: &MetricInfo,
    config: &PresentationConfig,
    dimension: &str,
) -> Result<PresentationConfig, AuthoringError> {
    if metric
        .disaggregation(dimension)
        .is_some_and(|option| option.is_required)
    {
        return Err(AuthoringError::MissingRequiredDimension {
            dimension: dimension.to_string(),
        });
    }

    let mut updated = config.clone();
    if updated.replicant_dimension() == Some(dimension) {
        updated.selected_replicant_value = None;
    }
    updated
        .disaggregations
        .retain(|selection| selection.dimension != dimension);
    updated.filters.retain(|filter| filter.dimension != dimension);
    Ok(updated)
}

fn values_axis_is_informative(metric: &MetricInfo, config: &PresentationConfig) -> bool {
    metric.has_multiple_values()
        && config
            .values_filter
            .as_ref()
            .map_or(true, |kept| kept.len() > 1)
}

// A dimension filtered down to a single value has nothing left to encode.
fn dimension_is_informative(config: &PresentationConfig, dimension: &str) -> bool {
    config
        .filter_for(dimension)
        .map_or(true, |filter| filter.values.len() != 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{coverage_metric, init_logger, visits_metric};
    use pretty_assertions::assert_eq;
    use vizquery_core::{DimensionFilter, FilterValue, PeriodOption, PresentationType};

    fn chart_config() -> PresentationConfig {
        PresentationConfig::blank(PresentationType::Chart, PeriodOption::PeriodId)
    }

    fn with_dimensions(
        mut config: PresentationConfig,
        dims: &[(&str, DisplaySlot)],
    ) -> PresentationConfig {
        config.disaggregations = dims
            .iter()
            .map(|(dimension, slot)| DisaggregationSelection {
                dimension: dimension.to_string(),
                slot: *slot,
            })
            .collect();
        config
    }

    #[test]
    fn values_axis_blocks_its_slot_only_for_multi_value_metrics() {
        init_logger();
        let config = chart_config();
        assert_eq!(
            next_available_slot(&coverage_metric(), &config, "region"),
            DisplaySlot::Series
        );
        assert_eq!(
            next_available_slot(&visits_metric(), &config, "region"),
            DisplaySlot::Indicator
        );
    }

    #[test]
    fn allocation_skips_slots_held_by_other_dimensions() {
        let config = with_dimensions(
            chart_config(),
            &[
                ("region", DisplaySlot::Series),
                ("sex", DisplaySlot::Cell),
            ],
        );
        assert_eq!(
            next_available_slot(&coverage_metric(), &config, "district"),
            DisplaySlot::Row
        );
        // The dimension's own slot does not count against it.
        assert_eq!(
            next_available_slot(&coverage_metric(), &config, "sex"),
            DisplaySlot::Cell
        );
    }

    #[test]
    fn full_configuration_falls_back_to_first_slot_and_reports_conflict() {
        let metric = visits_metric();
        let config = with_dimensions(
            PresentationConfig::blank(PresentationType::Table, PeriodOption::PeriodId),
            &[
                ("region", DisplaySlot::Col),
                ("district", DisplaySlot::Row),
                ("sex", DisplaySlot::ColGroup),
                ("age_group", DisplaySlot::RowGroup),
                ("facility_type", DisplaySlot::Replicant),
            ],
        );
        assert_eq!(
            next_available_slot(&metric, &config, "indicator"),
            DisplaySlot::Col
        );

        let added = add_disaggregation(&metric, &config, "indicator").unwrap();
        assert!(has_conflict(&metric, &added));
        assert_eq!(conflicting_slots(&metric, &added), vec![DisplaySlot::Col]);
    }

    #[test]
    fn single_value_filters_do_not_conflict() {
        let metric = coverage_metric();
        let mut config = with_dimensions(
            chart_config(),
            &[
                ("region", DisplaySlot::Series),
                ("sex", DisplaySlot::Series),
            ],
        );
        assert!(has_conflict(&metric, &config));

        config.filters.push(DimensionFilter {
            dimension: "sex".to_string(),
            values: vec![FilterValue::from("female")],
        });
        assert!(!has_conflict(&metric, &config));
    }

    #[test]
    fn values_axis_counts_towards_conflicts_unless_narrowed() {
        let metric = coverage_metric();
        let mut config = with_dimensions(chart_config(), &[("region", DisplaySlot::Indicator)]);
        assert!(has_conflict(&metric, &config));

        config.values_filter = Some(vec!["numerator".to_string()]);
        assert!(!has_conflict(&metric, &config));
        assert!(!has_conflict(&visits_metric(), &config));
    }

    #[test]
    fn add_rejects_unknown_and_disallowed_dimensions() {
        let metric = coverage_metric();
        let timeseries =
            PresentationConfig::blank(PresentationType::Timeseries, PeriodOption::PeriodId);

        assert_eq!(
            add_disaggregation(&metric, &timeseries, "ward").unwrap_err(),
            AuthoringError::UnknownDimension {
                dimension: "ward".to_string()
            }
        );
        assert_eq!(
            add_disaggregation(&metric, &timeseries, "facility_type").unwrap_err(),
            AuthoringError::DisallowedDimension {
                dimension: "facility_type".to_string(),
                presentation_type: PresentationType::Timeseries,
            }
        );
    }

    #[test]
    fn adding_twice_keeps_the_original_slot() {
        let metric = coverage_metric();
        let once = add_disaggregation(&metric, &chart_config(), "sex").unwrap();
        let twice = add_disaggregation(&metric, &once, "sex").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn remove_clears_filter_and_replicant_selection() {
        let metric = coverage_metric();
        let mut config = with_dimensions(
            chart_config(),
            &[
                ("region", DisplaySlot::Series),
                ("district", DisplaySlot::Replicant),
            ],
        );
        config.selected_replicant_value = Some(FilterValue::from("Bole"));
        config.filters.push(DimensionFilter {
            dimension: "district".to_string(),
            values: vec![FilterValue::from("Bole"), FilterValue::from("Yeka")],
        });

        let removed = remove_disaggregation(&metric, &config, "district").unwrap();
        assert_eq!(removed.replicant_dimension(), None);
        assert_eq!(removed.selected_replicant_value, None);
        assert!(removed.filters.is_empty());

        assert_eq!(
            remove_disaggregation(&metric, &config, "region").unwrap_err(),
            AuthoringError::MissingRequiredDimension {
                dimension: "region".to_string()
            }
        );
    }
}
