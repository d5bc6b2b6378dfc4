//! Quality Scorer
//!
//! Runs the three validators over an entity's current field set and combines
//! them into a [`QualityScore`].
//!
//! # Scoring Algorithm
//! - **Composite**: unweighted mean of completeness, accuracy and
//!   consistency, rounded to the nearest integer
//!
//! # Status Determination
//! - Fail: completeness or accuracy below the configured minimum
//! - Warning: any consistency check violated
//! - Pass: otherwise
//!
//! # Example
//! ```rust,ignore
//! use corpmatch_resolve::validators::QualityScorer;
//!
//! let scorer = QualityScorer::from_settings(&settings)?;
//! let quality = scorer.score(entity.fields());
//! println!("Quality: {} ({:?})", quality.composite, quality.status);
//! ```

use super::{AccuracyValidator, CompletenessScorer, ConsistencyValidator, EntityValidator, SubScore};
use crate::rules::FieldRules;
use crate::types::{FieldMap, QualityScore, QualityStatus};
use corpmatch_common::config::QualityThresholds;
use corpmatch_common::{ResolverSettings, Result};
use tracing::debug;

/// Quality Scorer
///
/// Pure function of a field map: holds configuration only, no entity state.
pub struct QualityScorer {
    completeness: CompletenessScorer,
    accuracy: AccuracyValidator,
    consistency: ConsistencyValidator,
    thresholds: QualityThresholds,
}

impl QualityScorer {
    /// Build from resolver settings (weights, thresholds and format rules)
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self> {
        let rules = FieldRules::from_settings(settings)?;
        Ok(Self::with_parts(
            CompletenessScorer::with_weights(settings.completeness_weights),
            AccuracyValidator::new(rules),
            settings.quality_thresholds,
        ))
    }

    pub fn with_parts(
        completeness: CompletenessScorer,
        accuracy: AccuracyValidator,
        thresholds: QualityThresholds,
    ) -> Self {
        Self {
            completeness,
            accuracy,
            consistency: ConsistencyValidator::new(),
            thresholds,
        }
    }

    /// Score a field set
    pub fn score(&self, fields: &FieldMap) -> QualityScore {
        let validators: [&dyn EntityValidator; 3] =
            [&self.completeness, &self.accuracy, &self.consistency];
        let [completeness, accuracy, consistency]: [SubScore; 3] =
            validators.map(|v| v.validate(fields));

        let composite = ((completeness.score + accuracy.score + consistency.score) / 3.0)
            .round()
            .clamp(0.0, 100.0) as u8;

        let status = if completeness.score < self.thresholds.min_completeness
            || accuracy.score < self.thresholds.min_accuracy
        {
            QualityStatus::Fail
        } else if !consistency.issues.is_empty() {
            QualityStatus::Warning
        } else {
            QualityStatus::Pass
        };

        debug!(
            completeness = completeness.score,
            accuracy = accuracy.score,
            consistency = consistency.score,
            composite,
            status = ?status,
            "Quality scored"
        );

        let mut issues = completeness.issues;
        issues.extend(accuracy.issues);
        issues.extend(consistency.issues);

        QualityScore {
            completeness: completeness.score,
            accuracy: accuracy.score,
            consistency: consistency.score,
            composite,
            status,
            issues,
        }
    }
}
