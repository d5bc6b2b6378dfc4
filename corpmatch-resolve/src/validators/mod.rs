//! Quality validators
//!
//! Each validator is a pure function of an entity's field map and yields one
//! sub-score in 0-100 plus the findings behind it.
//!
//! # Validators
//! 1. **completeness_scorer** - Weighted presence of tracked fields
//! 2. **accuracy_validator** - Format rules on populated fields
//! 3. **consistency_validator** - Cross-field logical checks
//! 4. **quality_scorer** - Composite score and review status

pub mod accuracy_validator;
pub mod completeness_scorer;
pub mod consistency_validator;
pub mod quality_scorer;

pub use accuracy_validator::AccuracyValidator;
pub use completeness_scorer::CompletenessScorer;
pub use consistency_validator::ConsistencyValidator;
pub use quality_scorer::QualityScorer;

use crate::types::FieldMap;

/// One quality dimension
#[derive(Debug, Clone, PartialEq)]
pub struct SubScore {
    /// 0-100
    pub score: f32,
    pub issues: Vec<String>,
}

/// Scores one quality dimension of a field map
pub trait EntityValidator: Send + Sync {
    /// Dimension name used in logs
    fn name(&self) -> &'static str;

    fn validate(&self, fields: &FieldMap) -> SubScore;
}
