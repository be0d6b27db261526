//! Remapping a configuration onto another presentation type.

use vizquery_core::{
    AuthoringError, DisplaySlot, MetricInfo, PresentationConfig, PresentationType, StyleConfig,
};

use crate::slots::SlotUsage;

/// Re-express `config` as a `new_type` visualization.
///
/// Dimensions whose slot is still valid and unshared keep it. The others
/// take a substitute slot, moving on to the next unused one in list order,
/// and styling is reset to `new_type` defaults.
/// Text fields are kept.
pub fn convert_presentation_type(
    config: &PresentationConfig,
    new_type: PresentationType,
    metric: &MetricInfo,
) -> Result<PresentationConfig, AuthoringError> {
    if config.presentation_type == new_type {
        return Ok(config.clone());
    }

    for selection in &config.disaggregations {
        let allowed = metric
            .disaggregation(&selection.dimension)
            .map_or(true, |option| option.allows(new_type));
        if !allowed {
            return Err(AuthoringError::DisallowedDimension {
                dimension: selection.dimension.clone(),
                presentation_type: new_type,
            });
        }
    }

    let mut converted = config.clone();
    converted.presentation_type = new_type;
    converted.values_slot = new_type.default_values_slot();
    converted.style = StyleConfig::for_presentation_type(new_type);

    let mut usage = SlotUsage::default();
    if metric.has_multiple_values() {
        usage.claim(converted.values_slot);
    }

    // Dimensions already on a valid, unshared slot keep it; only the rest move.
    let settled: Vec<bool> = converted
        .disaggregations
        .iter()
        .map(|selection| new_type.accepts(selection.slot) && usage.claim(selection.slot))
        .collect();

    for (selection, settled) in converted.disaggregations.iter_mut().zip(settled) {
        if settled {
            continue;
        }

        let mut slot = selection.slot;
        if !new_type.accepts(slot) {
            slot = fallback_slot(new_type, slot).unwrap_or(new_type.slot_priority()[0]);
        }
        if usage.is_taken(slot) {
            if let Some(free) = next_unused_after(new_type, slot, &usage) {
                slot = free;
            }
        }
        usage.claim(slot);

        if slot != selection.slot {
            log::debug!(
                "moved {} from {} to {slot} for {new_type}",
                selection.dimension,
                selection.slot
            );
        }
        selection.slot = slot;
    }

    if converted.replicant_dimension() != config.replicant_dimension() {
        converted.selected_replicant_value = None;
    }

    Ok(converted)
}

fn fallback_slot(new_type: PresentationType, slot: DisplaySlot) -> Option<DisplaySlot> {
    match (new_type, slot) {
        (PresentationType::Table, DisplaySlot::Indicator) => Some(DisplaySlot::Col),
        (PresentationType::Table, DisplaySlot::Series) => Some(DisplaySlot::Row),
        (PresentationType::Timeseries, DisplaySlot::Indicator) => Some(DisplaySlot::Series),
        (PresentationType::Timeseries, DisplaySlot::RowGroup) => Some(DisplaySlot::Row),
        (PresentationType::Chart, DisplaySlot::RowGroup) => Some(DisplaySlot::Row),
        (PresentationType::Chart, DisplaySlot::ColGroup) => Some(DisplaySlot::Col),
        _ => None,
    }
}

// Walks the priority order starting just after `slot`, wrapping around.
fn next_unused_after(
    new_type: PresentationType,
    slot: DisplaySlot,
    usage: &SlotUsage,
) -> Option<DisplaySlot> {
    let priority = new_type.slot_priority();
    let start = priority
        .iter()
        .position(|candidate| *candidate == slot)
        .map_or(0, |index| index + 1);

    priority
        .iter()
        .cycle()
        .skip(start)
        .take(priority.len())
        .copied()
        .find(|candidate| !usage.is_taken(*candidate))
}
