//! Parameter canonicalization and cache-key derivation.
//!
//! Two requests that are semantically equivalent after normalization must map
//! to the same key; any difference in a normalized parameter must produce a
//! different key. Keys are scoped by endpoint name so endpoints never collide.
//!
//! Multi-valued parameters keep the order the caller supplied them in —
//! reordering `group_by` changes the key. Source behavior, kept as-is.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::proxy::endpoints::QueryEndpoint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

/// Canonical parameter mapping. BTreeMap gives the sorted key ordering the
/// serialization step needs.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Build the canonical mapping for one request: drop empty parameters, fold
/// repeated names into ordered multi-values, apply endpoint defaults, then the
/// endpoint-specific `end_time` rule.
pub fn normalize(
    endpoint: &QueryEndpoint,
    raw: &[(String, String)],
) -> Result<ParamMap, AppError> {
    let mut params = ParamMap::new();

    for (name, value) in raw {
        if value.is_empty() {
            continue;
        }
        let folded = match params.remove(name.as_str()) {
            None => ParamValue::Single(value.clone()),
            Some(ParamValue::Single(first)) => ParamValue::Multi(vec![first, value.clone()]),
            Some(ParamValue::Multi(mut values)) => {
                values.push(value.clone());
                ParamValue::Multi(values)
            }
        };
        params.insert(name.clone(), folded);
    }

    for (name, default) in endpoint.defaults {
        params
            .entry((*name).to_string())
            .or_insert_with(|| ParamValue::Single((*default).to_string()));
    }

    if endpoint.round_end_time {
        let rounded = match params.get("end_time") {
            Some(ParamValue::Single(raw_end)) => {
                let ts: i64 = raw_end.parse().map_err(|_| {
                    AppError::InvalidParameter("end_time must be Unix seconds".to_string())
                })?;
                let dt = Local.timestamp_opt(ts, 0).single().ok_or_else(|| {
                    AppError::InvalidParameter("end_time is out of range".to_string())
                })?;
                end_of_day(dt)?
            }
            Some(ParamValue::Multi(_)) => {
                return Err(AppError::InvalidParameter(
                    "end_time supplied more than once".to_string(),
                ));
            }
            // Open-ended query: "today's data so far" shares one entry.
            None => end_of_day(Local::now())?,
        };
        params.insert(
            "end_time".to_string(),
            ParamValue::Single(rounded.to_string()),
        );
    }

    Ok(params)
}

/// Unix timestamp of 23:59:59.999999 on the same local calendar day.
fn end_of_day(dt: DateTime<Local>) -> Result<i64, AppError> {
    let eod = dt
        .date_naive()
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .ok_or_else(|| AppError::InvalidParameter("end_time is out of range".to_string()))?;
    Local
        .from_local_datetime(&eod)
        .latest()
        .map(|d| d.timestamp())
        .ok_or_else(|| AppError::InvalidParameter("end_time is out of range".to_string()))
}

/// Deterministic digest of (endpoint, canonical params). Pure: same inputs,
/// same key. Collision resistance only needs to serve cache correctness.
pub fn derive(endpoint: &str, params: &ParamMap) -> String {
    let canonical =
        serde_json::to_string(params).expect("canonical param map serializes to JSON");
    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Expand the canonical mapping back into query pairs for the upstream call,
/// repeating multi-valued parameters.
pub fn query_pairs(params: &ParamMap) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    for (name, value) in params {
        match value {
            ParamValue::Single(v) => pairs.push((name.as_str(), v.as_str())),
            ParamValue::Multi(values) => {
                for v in values {
                    pairs.push((name.as_str(), v.as_str()));
                }
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::endpoints;

    fn raw(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn costs() -> &'static QueryEndpoint {
        endpoints::find("costs").unwrap()
    }

    fn projects() -> &'static QueryEndpoint {
        endpoints::find("projects").unwrap()
    }

    #[test]
    fn derive_is_pure() {
        let params = normalize(
            costs(),
            &raw(&[("start_time", "1700000000"), ("end_time", "1700000000")]),
        )
        .unwrap();
        assert_eq!(derive("costs", &params), derive("costs", &params));
    }

    #[test]
    fn same_calendar_day_end_times_share_a_key() {
        // A minute of jitter within the same local day must not split the key.
        let a = normalize(
            costs(),
            &raw(&[("start_time", "1700000000"), ("end_time", "1700000000")]),
        )
        .unwrap();
        let b = normalize(
            costs(),
            &raw(&[("start_time", "1700000000"), ("end_time", "1700000060")]),
        )
        .unwrap();
        assert_eq!(derive("costs", &a), derive("costs", &b));
    }

    #[test]
    fn next_day_end_time_changes_the_key() {
        let a = normalize(
            costs(),
            &raw(&[("start_time", "1700000000"), ("end_time", "1700000000")]),
        )
        .unwrap();
        let b = normalize(
            costs(),
            &raw(&[("start_time", "1700000000"), ("end_time", "1700086400")]),
        )
        .unwrap();
        assert_ne!(derive("costs", &a), derive("costs", &b));
    }

    #[test]
    fn raw_key_ordering_does_not_matter() {
        let a = normalize(
            costs(),
            &raw(&[
                ("start_time", "1700000000"),
                ("end_time", "1700000000"),
                ("limit", "5"),
            ]),
        )
        .unwrap();
        let b = normalize(
            costs(),
            &raw(&[
                ("limit", "5"),
                ("end_time", "1700000000"),
                ("start_time", "1700000000"),
            ]),
        )
        .unwrap();
        assert_eq!(derive("costs", &a), derive("costs", &b));
    }

    #[test]
    fn multi_value_order_is_significant() {
        let a = normalize(
            costs(),
            &raw(&[
                ("start_time", "1700000000"),
                ("end_time", "1700000000"),
                ("group_by", "project_id"),
                ("group_by", "line_item"),
            ]),
        )
        .unwrap();
        let b = normalize(
            costs(),
            &raw(&[
                ("start_time", "1700000000"),
                ("end_time", "1700000000"),
                ("group_by", "line_item"),
                ("group_by", "project_id"),
            ]),
        )
        .unwrap();
        assert_ne!(derive("costs", &a), derive("costs", &b));
    }

    #[test]
    fn endpoints_never_collide() {
        let params = normalize(projects(), &raw(&[])).unwrap();
        assert_ne!(derive("projects", &params), derive("billing", &params));
    }

    #[test]
    fn empty_parameters_are_dropped() {
        let params = normalize(projects(), &raw(&[("after", "")])).unwrap();
        assert!(!params.contains_key("after"));
    }

    #[test]
    fn defaults_are_applied_but_not_forced() {
        let defaulted = normalize(projects(), &raw(&[])).unwrap();
        assert_eq!(
            defaulted.get("limit"),
            Some(&ParamValue::Single("20".to_string()))
        );
        assert_eq!(
            defaulted.get("include_archived"),
            Some(&ParamValue::Single("false".to_string()))
        );

        let explicit = normalize(projects(), &raw(&[("limit", "50")])).unwrap();
        assert_eq!(
            explicit.get("limit"),
            Some(&ParamValue::Single("50".to_string()))
        );
    }

    #[test]
    fn omitted_end_time_matches_todays_jitter() {
        // No end_time normalizes to the end of the current day, the same
        // value a caller passing "now" gets after rounding.
        let now = chrono::Local::now().timestamp();
        let open_ended =
            normalize(costs(), &raw(&[("start_time", "1700000000")])).unwrap();
        let with_now = normalize(
            costs(),
            &raw(&[("start_time", "1700000000"), ("end_time", &now.to_string())]),
        )
        .unwrap();
        assert_eq!(derive("costs", &open_ended), derive("costs", &with_now));
    }

    #[test]
    fn non_numeric_end_time_is_rejected() {
        let err = normalize(
            costs(),
            &raw(&[("start_time", "1700000000"), ("end_time", "tomorrow")]),
        );
        assert!(matches!(err, Err(AppError::InvalidParameter(_))));
    }

    #[test]
    fn query_pairs_repeat_multi_values() {
        let params = normalize(
            costs(),
            &raw(&[
                ("start_time", "1700000000"),
                ("end_time", "1700000000"),
                ("group_by", "project_id"),
                ("group_by", "line_item"),
            ]),
        )
        .unwrap();
        let pairs = query_pairs(&params);
        let groups: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| *k == "group_by")
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(groups, vec!["project_id", "line_item"]);
    }
}
