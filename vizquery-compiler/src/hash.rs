//! Order-independent fingerprint of a fetch descriptor.

use vizquery_core::{FetchConfig, FetchFilter, PeriodFilter, ReplicantSelection};

const FIELD_SEPARATOR: char = '|';
const ITEM_SEPARATOR: char = ';';
const VALUE_SEPARATOR: char = ',';
const ESCAPE: char = '\\';

/// Canonical string for `config`.
///
/// Values, group-bys, filters and filter values are sorted first, so
/// descriptors that differ only in ordering produce the same key.
pub fn hash_fetch_config(config: &FetchConfig) -> String {
    let mut values: Vec<(&str, &str)> = config
        .values
        .iter()
        .map(|value| (value.prop.as_str(), value.func.as_str()))
        .collect();
    values.sort_unstable();
    let values: Vec<String> = values
        .into_iter()
        .map(|(prop, func)| format!("{}:{func}", escape(prop)))
        .collect();

    let mut group_bys: Vec<String> = config.group_bys.iter().map(|key| escape(key)).collect();
    group_bys.sort_unstable();

    let mut filters: Vec<(&str, String)> = config
        .filters
        .iter()
        .map(|filter| (filter.dimension(), canonical_filter(filter)))
        .collect();
    filters.sort_unstable();
    let filters: Vec<String> = filters.into_iter().map(|(_, filter)| filter).collect();

    let national = match config.include_national_for_region {
        Some(true) => "1",
        Some(false) => "0",
        None => "-",
    };
    let position = config
        .include_national_position
        .map_or("-", |position| position.as_str());

    [
        format!("v={}", values.join(&ITEM_SEPARATOR.to_string())),
        format!(
            "x={}",
            config.formula.as_deref().map_or("-".to_string(), escape)
        ),
        format!("g={}", group_bys.join(&ITEM_SEPARATOR.to_string())),
        format!("f={}", filters.join(&ITEM_SEPARATOR.to_string())),
        format!("p={}", canonical_period(config.period_filter.as_ref())),
        format!("n={national}:{position}"),
    ]
    .join(&FIELD_SEPARATOR.to_string())
}

fn canonical_filter(filter: &FetchFilter) -> String {
    match filter {
        FetchFilter::Values { dimension, values } => {
            let mut keys: Vec<String> = values
                .iter()
                .map(|value| escape(&value.canonical_key()))
                .collect();
            keys.sort_unstable();
            keys.dedup();
            format!(
                "{}=in:{}",
                escape(dimension),
                keys.join(&VALUE_SEPARATOR.to_string())
            )
        }
        FetchFilter::Replicant {
            dimension,
            selection,
        } => {
            let selection = match selection {
                ReplicantSelection::Selected(value) => escape(&value.canonical_key()),
                ReplicantSelection::Unselected => "!".to_string(),
            };
            format!("{}=rep:{selection}", escape(dimension))
        }
    }
}

fn canonical_period(filter: Option<&PeriodFilter>) -> String {
    match filter {
        None => "-".to_string(),
        Some(PeriodFilter::Custom {
            period_option,
            min,
            max,
        }) => format!("custom:{period_option}:{min}:{max}"),
        Some(PeriodFilter::LastNMonths { n_months }) => format!("last_n_months:{n_months}"),
        Some(PeriodFilter::FromMonth { min }) => format!("from_month:{min}"),
        Some(PeriodFilter::LastCalendarYear) => "last_calendar_year".to_string(),
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, FIELD_SEPARATOR | ITEM_SEPARATOR | VALUE_SEPARATOR | ESCAPE | '=' | ':') {
            escaped.push(ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
