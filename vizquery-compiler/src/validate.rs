//! Structural checks run before a descriptor is dispatched.
//!
//! Failures here are programming defects upstream, not authoring mistakes, so
//! every rejection is logged at error level.

use serde_json::Value;
use vizquery_core::{AggregationFunction, FetchConfig, FetchFilter, ValidationError};

/// Check a typed descriptor.
pub fn validate_fetch_config(config: &FetchConfig) -> Result<(), ValidationError> {
    check_typed(config).inspect_err(report)
}

/// Check a descriptor that arrived as JSON and convert it.
///
/// Shape problems that the typed form cannot express (non-list group-bys,
/// unknown aggregation literals, filter values that are neither text nor
/// number, a non-boolean national flag) are reported individually before
/// deserialization.
pub fn validate_fetch_config_value(value: &Value) -> Result<FetchConfig, ValidationError> {
    check_shape(value)
        .and_then(|()| {
            serde_json::from_value::<FetchConfig>(value.clone())
                .map_err(|err| ValidationError::Schema(err.to_string()))
        })
        .and_then(|config| check_typed(&config).map(|()| config))
        .inspect_err(report)
}

fn report(err: &ValidationError) {
    log::error!("rejected fetch descriptor: {err}");
}

fn check_typed(config: &FetchConfig) -> Result<(), ValidationError> {
    if config.values.is_empty() {
        return Err(ValidationError::EmptyValues);
    }

    for (index, filter) in config.filters.iter().enumerate() {
        if filter.dimension().trim().is_empty() {
            return Err(ValidationError::EmptyFilterDimension { index });
        }
        if let FetchFilter::Values { dimension, values } = filter {
            if values.is_empty() {
                return Err(ValidationError::EmptyFilterValues {
                    dimension: dimension.clone(),
                });
            }
        }
    }

    Ok(())
}

fn check_shape(value: &Value) -> Result<(), ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let values = object
        .get("values")
        .and_then(Value::as_array)
        .ok_or(ValidationError::NotAList("values"))?;
    if values.is_empty() {
        return Err(ValidationError::EmptyValues);
    }
    for (index, entry) in values.iter().enumerate() {
        check_value_entry(index, entry)?;
    }

    if !object.get("group_bys").is_some_and(Value::is_array) {
        return Err(ValidationError::NotAList("group_bys"));
    }

    match object.get("filters") {
        None | Some(Value::Null) => {}
        Some(Value::Array(filters)) => {
            for (index, filter) in filters.iter().enumerate() {
                check_filter(index, filter)?;
            }
        }
        Some(_) => return Err(ValidationError::NotAList("filters")),
    }

    match object.get("include_national_for_region") {
        None | Some(Value::Null) | Some(Value::Bool(_)) => {}
        Some(other) => return Err(ValidationError::NationalFlagNotBoolean(other.to_string())),
    }

    match object.get("include_national_position") {
        None | Some(Value::Null) => {}
        Some(Value::String(position)) if position == "top" || position == "bottom" => {}
        Some(other) => return Err(ValidationError::InvalidNationalPosition(other.to_string())),
    }

    Ok(())
}

fn check_value_entry(index: usize, entry: &Value) -> Result<(), ValidationError> {
    let prop = entry.get("prop").and_then(Value::as_str).unwrap_or_default();
    if prop.is_empty() {
        return Err(ValidationError::MalformedValue {
            index,
            reason: "`prop` must be a non-empty string".to_string(),
        });
    }

    match entry.get("func") {
        Some(Value::String(literal)) if AggregationFunction::from_literal(literal).is_some() => {
            Ok(())
        }
        Some(Value::String(literal)) => Err(ValidationError::UnknownAggregation(literal.clone())),
        Some(other) => Err(ValidationError::UnknownAggregation(other.to_string())),
        None => Err(ValidationError::MalformedValue {
            index,
            reason: "missing `func`".to_string(),
        }),
    }
}

fn check_filter(index: usize, filter: &Value) -> Result<(), ValidationError> {
    let dimension = filter
        .get("dimension")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if dimension.trim().is_empty() {
        return Err(ValidationError::EmptyFilterDimension { index });
    }

    let malformed = |reason: &str| ValidationError::MalformedFilter {
        index,
        reason: reason.to_string(),
    };

    match filter.get("kind").and_then(Value::as_str) {
        Some("values") => {
            let values = filter
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| malformed("`values` must be a list"))?;
            if values.is_empty() {
                return Err(ValidationError::EmptyFilterValues {
                    dimension: dimension.to_string(),
                });
            }
            values
                .iter()
                .try_for_each(|value| check_filter_value(dimension, value))
        }
        Some("replicant") => {
            let selection = filter
                .get("selection")
                .ok_or_else(|| malformed("missing `selection`"))?;
            match selection.get("state").and_then(Value::as_str) {
                Some("unselected") => Ok(()),
                Some("selected") => check_filter_value(
                    dimension,
                    selection.get("value").unwrap_or(&Value::Null),
                ),
                _ => Err(malformed("selection state must be `selected` or `unselected`")),
            }
        }
        _ => Err(malformed("`kind` must be `values` or `replicant`")),
    }
}

fn check_filter_value(dimension: &str, value: &Value) -> Result<(), ValidationError> {
    if value.is_string() || value.is_number() {
        Ok(())
    } else {
        Err(ValidationError::InvalidFilterValue {
            dimension: dimension.to_string(),
            found: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init_logger;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use vizquery_core::{FetchValue, FilterValue, NationalPosition, ReplicantSelection};

    fn descriptor() -> Value {
        json!({
            "values": [{ "prop": "count", "func": "SUM" }],
            "group_bys": ["region"],
            "filters": [
                { "kind": "values", "dimension": "sex", "values": ["female"] },
                { "kind": "values", "dimension": "age_group", "values": [15, 49] },
                {
                    "kind": "replicant",
                    "dimension": "district",
                    "selection": { "state": "unselected" }
                }
            ],
            "period_filter": { "filter_type": "last_n_months", "n_months": 12 },
            "include_national_for_region": true,
            "include_national_position": "top"
        })
    }

    fn rejects(value: Value) -> ValidationError {
        init_logger();
        validate_fetch_config_value(&value).expect_err("descriptor should be rejected")
    }

    #[test]
    fn accepts_text_and_numeric_filter_values() {
        let config = validate_fetch_config_value(&descriptor()).expect("descriptor is valid");
        assert_eq!(
            config.filters[1],
            FetchFilter::Values {
                dimension: "age_group".to_string(),
                values: vec![FilterValue::from(15_i64), FilterValue::from(49_i64)],
            }
        );
        assert_eq!(
            config.include_national_position,
            Some(NationalPosition::Top)
        );
        assert!(matches!(
            &config.filters[2],
            FetchFilter::Replicant {
                selection: ReplicantSelection::Unselected,
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_values() {
        let mut value = descriptor();
        value["values"] = json!([]);
        assert_eq!(rejects(value), ValidationError::EmptyValues);

        let config = FetchConfig {
            values: Vec::new(),
            formula: None,
            group_bys: Vec::new(),
            filters: Vec::new(),
            period_filter: None,
            include_national_for_region: None,
            include_national_position: None,
        };
        assert_eq!(
            validate_fetch_config(&config),
            Err(ValidationError::EmptyValues)
        );
    }

    #[test]
    fn rejects_unknown_aggregation() {
        let mut value = descriptor();
        value["values"][0]["func"] = json!("MEDIAN");
        assert_eq!(
            rejects(value),
            ValidationError::UnknownAggregation("MEDIAN".to_string())
        );
    }

    #[test]
    fn rejects_filters_without_values_or_dimension() {
        let mut value = descriptor();
        value["filters"][0]["values"] = json!([]);
        assert_eq!(
            rejects(value),
            ValidationError::EmptyFilterValues {
                dimension: "sex".to_string()
            }
        );

        let mut value = descriptor();
        value["filters"][1]["dimension"] = json!("");
        assert_eq!(
            rejects(value),
            ValidationError::EmptyFilterDimension { index: 1 }
        );

        let config = FetchConfig {
            values: vec![FetchValue {
                prop: "count".to_string(),
                func: vizquery_core::AggregationFunction::Sum,
            }],
            formula: None,
            group_bys: Vec::new(),
            filters: vec![FetchFilter::Values {
                dimension: "sex".to_string(),
                values: Vec::new(),
            }],
            period_filter: None,
            include_national_for_region: None,
            include_national_position: None,
        };
        assert_eq!(
            validate_fetch_config(&config),
            Err(ValidationError::EmptyFilterValues {
                dimension: "sex".to_string()
            })
        );
    }

    #[test]
    fn rejects_non_scalar_filter_values() {
        let mut value = descriptor();
        value["filters"][0]["values"] = json!(["female", { "code": "F" }]);
        assert_eq!(
            rejects(value),
            ValidationError::InvalidFilterValue {
                dimension: "sex".to_string(),
                found: r#"{"code":"F"}"#.to_string(),
            }
        );

        let mut value = descriptor();
        value["filters"][2]["selection"] = json!({ "state": "selected", "value": null });
        assert!(matches!(
            rejects(value),
            ValidationError::InvalidFilterValue { .. }
        ));
    }

    #[test]
    fn rejects_malformed_group_bys_and_national_fields() {
        let mut value = descriptor();
        value["group_bys"] = json!("region");
        assert_eq!(rejects(value), ValidationError::NotAList("group_bys"));

        let mut value = descriptor();
        value["include_national_for_region"] = json!("yes");
        assert_eq!(
            rejects(value),
            ValidationError::NationalFlagNotBoolean("\"yes\"".to_string())
        );

        let mut value = descriptor();
        value["include_national_position"] = json!("middle");
        assert_eq!(
            rejects(value),
            ValidationError::InvalidNationalPosition("\"middle\"".to_string())
        );
    }
}
