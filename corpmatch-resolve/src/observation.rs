//! Observation preparation
//!
//! Cleans a [`RawObservation`] into the field map the matcher and merge
//! engine work on. The raw observation is only borrowed; every cleaned
//! value lives in the [`PreparedObservation`].
//!
//! # Cleaning Rules
//! - Values are trimmed; empty values are dropped without an issue
//! - `identifier` is upper-cased and must match the configured pattern
//! - Integer fields must parse as non-negative integers
//! - `is_delisted` and `company_size` are normalized to a fixed vocabulary
//! - URL fields get `https://` when no scheme is present
//!
//! Any other rejected value is dropped with a
//! [`ObservationIssue::MalformedField`]; the rest of the observation proceeds.
//! Keys outside the known field set become
//! [`ObservationIssue::UnrecognizedField`] and are not merged.

use crate::rules::FieldRules;
use crate::types::{FieldMap, FieldName, ObservationIssue, RawObservation, SourceClass};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// A raw observation after field cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedObservation {
    pub observation_id: Uuid,
    pub source_id: String,
    pub source_class: SourceClass,
    pub observed_at: DateTime<Utc>,
    /// Cleaned values; malformed ones are absent
    pub fields: FieldMap,
    /// One issue per dropped value or unrecognized key
    pub issues: Vec<ObservationIssue>,
}

impl PreparedObservation {
    pub fn field(&self, field: FieldName) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

/// Clean every field of `raw` against `rules`
pub fn prepare(raw: &RawObservation, rules: &FieldRules) -> PreparedObservation {
    let mut fields = FieldMap::new();
    let mut issues = Vec::new();

    for (&field, value) in raw.fields() {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        match clean_value(field, trimmed, rules) {
            Ok(cleaned) => {
                fields.insert(field, cleaned);
            }
            Err(reason) => {
                debug!(
                    observation_id = %raw.observation_id(),
                    field = %field,
                    value = trimmed,
                    reason = %reason,
                    "Dropping malformed field"
                );
                issues.push(ObservationIssue::MalformedField {
                    field,
                    value: trimmed.to_string(),
                    reason,
                });
            }
        }
    }

    for (key, value) in raw.unrecognized_fields() {
        debug!(
            observation_id = %raw.observation_id(),
            field = key.as_str(),
            "Ignoring unrecognized field"
        );
        issues.push(ObservationIssue::UnrecognizedField {
            field: key.clone(),
            value: value.clone(),
        });
    }

    PreparedObservation {
        observation_id: raw.observation_id(),
        source_id: raw.source_id().to_string(),
        source_class: raw.source_class(),
        observed_at: raw.observed_at(),
        fields,
        issues,
    }
}

fn clean_value(field: FieldName, value: &str, rules: &FieldRules) -> Result<String, String> {
    match field {
        FieldName::Identifier => {
            let upper = value.to_uppercase();
            if rules.is_valid_identifier(&upper) {
                Ok(upper)
            } else {
                Err("identifier does not match the configured pattern".to_string())
            }
        }
        FieldName::EmployeeCount | FieldName::FoundingYear | FieldName::LocationsInSingapore => {
            parse_count(value)
        }
        FieldName::IndustryConfidence => {
            let parsed = parse_count(value)?;
            match parsed.parse::<u64>() {
                Ok(n) if n <= 100 => Ok(parsed),
                _ => Err("industry confidence must be between 0 and 100".to_string()),
            }
        }
        FieldName::IsDelisted => match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok("true".to_string()),
            "false" | "no" | "0" => Ok("false".to_string()),
            _ => Err("expected true/false, yes/no or 1/0".to_string()),
        },
        FieldName::CompanySize => match value.to_lowercase().as_str() {
            "small" => Ok("Small".to_string()),
            "medium" => Ok("Medium".to_string()),
            "large" => Ok("Large".to_string()),
            "unknown" => Ok("Unknown".to_string()),
            _ => Err("expected Small, Medium, Large or Unknown".to_string()),
        },
        f if f.is_url() => {
            if value.contains("://") {
                Ok(value.to_string())
            } else {
                Ok(format!("https://{}", value))
            }
        }
        _ => Ok(value.to_string()),
    }
}

/// Non-negative integer, re-rendered without leading zeros or `+`
fn parse_count(value: &str) -> Result<String, String> {
    value
        .parse::<u64>()
        .map(|n| n.to_string())
        .map_err(|_| format!("'{}' is not a non-negative integer", value))
}
