//! Accuracy Validator
//!
//! accuracy = 100 × valid / checked, over populated fields that carry a
//! format rule. Fields without a rule never affect the score, and an entity
//! with no rule-bearing field scores 100.

use super::{EntityValidator, SubScore};
use crate::rules::{self, FieldRules};
use crate::types::{FieldMap, FieldName};

pub struct AccuracyValidator {
    rules: FieldRules,
}

impl AccuracyValidator {
    pub fn new(rules: FieldRules) -> Self {
        Self { rules }
    }

    /// `None` when the field has no format rule
    fn check(&self, field: FieldName, value: &str) -> Option<bool> {
        match field {
            FieldName::Identifier => Some(self.rules.is_valid_identifier(value)),
            FieldName::ContactEmail => Some(rules::is_valid_email(value)),
            FieldName::ContactPhone => Some(rules::is_valid_phone(value)),
            FieldName::FoundingYear => Some(
                value
                    .parse::<i32>()
                    .map(|year| self.rules.is_plausible_founding_year(year))
                    .unwrap_or(false),
            ),
            f if f.is_url() => Some(rules::is_valid_url(value)),
            _ => None,
        }
    }
}

impl EntityValidator for AccuracyValidator {
    fn name(&self) -> &'static str {
        "accuracy"
    }

    fn validate(&self, fields: &FieldMap) -> SubScore {
        let mut checked = 0u32;
        let mut valid = 0u32;
        let mut issues = Vec::new();

        for (&field, value) in fields {
            match self.check(field, value) {
                Some(true) => {
                    checked += 1;
                    valid += 1;
                }
                Some(false) => {
                    checked += 1;
                    issues.push(format!("Invalid {}: '{}'", field, value));
                }
                None => {}
            }
        }

        let score = if checked == 0 {
            100.0
        } else {
            valid as f32 * 100.0 / checked as f32
        };

        SubScore { score, issues }
    }
}
