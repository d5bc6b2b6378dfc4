//! Completeness Scorer
//!
//! Each tracked field contributes its configured weight when populated; the
//! sum is normalized to 0-100 by the total weight. The social-profile term
//! counts when any of linkedin, facebook or instagram is present.

use super::{EntityValidator, SubScore};
use crate::types::{FieldMap, FieldName};
use corpmatch_common::config::CompletenessWeights;

pub struct CompletenessScorer {
    weights: CompletenessWeights,
}

impl CompletenessScorer {
    pub fn new() -> Self {
        Self::with_weights(CompletenessWeights::default())
    }

    pub fn with_weights(weights: CompletenessWeights) -> Self {
        Self { weights }
    }

    /// Weighted terms as (label, weight, present)
    fn terms(&self, fields: &FieldMap) -> [(&'static str, u32, bool); 7] {
        let has = |f: FieldName| fields.contains_key(&f);
        let w = &self.weights;
        [
            ("identifier", w.identifier, has(FieldName::Identifier)),
            ("name", w.name, has(FieldName::Name)),
            ("website", w.website, has(FieldName::Website)),
            ("industry", w.industry, has(FieldName::Industry)),
            ("contact email", w.contact_email, has(FieldName::ContactEmail)),
            (
                "social profile",
                w.social_profile,
                FieldName::SOCIAL.iter().any(|&f| has(f)),
            ),
            ("services", w.services, has(FieldName::ServicesOffered)),
        ]
    }
}

impl Default for CompletenessScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityValidator for CompletenessScorer {
    fn name(&self) -> &'static str {
        "completeness"
    }

    fn validate(&self, fields: &FieldMap) -> SubScore {
        let total = self.weights.total();
        if total == 0 {
            return SubScore {
                score: 0.0,
                issues: vec!["No completeness weights configured".to_string()],
            };
        }

        let mut earned = 0u32;
        let mut missing = Vec::new();
        for (label, weight, present) in self.terms(fields) {
            if present {
                earned += weight;
            } else if weight > 0 {
                missing.push(label);
            }
        }

        let mut issues = Vec::new();
        if !missing.is_empty() {
            issues.push(format!("Missing fields: {}", missing.join(", ")));
        }

        SubScore {
            score: earned as f32 * 100.0 / total as f32,
            issues,
        }
    }
}
