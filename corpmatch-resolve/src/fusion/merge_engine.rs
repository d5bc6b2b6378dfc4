//! Provenance-Aware Merge Engine
//!
//! # Field-wise Fusion
//! Each field is decided independently:
//! - Empty on the entity: adopt the incoming value
//! - Populated: adopt only if the incoming source confidence is strictly
//!   greater, or equal with a strictly newer observation timestamp
//!
//! The observation id is appended to the entity's audit list whether or not
//! any value changed, and the quality score is recomputed as the last step
//! of every merge.
//!
//! # Example
//! ```rust,ignore
//! let engine = MergeEngine::from_settings(&settings)?;
//! let mut entity = engine.seed(&prepared);
//! let changed = engine.merge(&mut entity, &later);
//! ```

use crate::observation::PreparedObservation;
use crate::types::{CanonicalEntity, FieldName, FieldProvenance};
use crate::validators::QualityScorer;
use chrono::{DateTime, Utc};
use corpmatch_common::config::SourceConfidence;
use corpmatch_common::{ResolverSettings, Result};
use tracing::{debug, warn};

/// Merge Engine
///
/// Holds the source-reliability table and the quality scorer; entity state
/// is always passed in.
pub struct MergeEngine {
    source_confidence: SourceConfidence,
    quality: QualityScorer,
}

impl MergeEngine {
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self> {
        Ok(Self::new(
            settings.source_confidence,
            QualityScorer::from_settings(settings)?,
        ))
    }

    pub fn new(source_confidence: SourceConfidence, quality: QualityScorer) -> Self {
        Self {
            source_confidence,
            quality,
        }
    }

    /// Create a new canonical entity from its first observation
    pub fn seed(&self, observation: &PreparedObservation) -> CanonicalEntity {
        let mut entity = CanonicalEntity::new();
        self.merge(&mut entity, observation);
        debug!(
            entity_id = %entity.id(),
            observation_id = %observation.observation_id,
            "Seeded canonical entity"
        );
        entity
    }

    /// Fold one observation into `entity`, returning the fields that changed
    pub fn merge(
        &self,
        entity: &mut CanonicalEntity,
        observation: &PreparedObservation,
    ) -> Vec<FieldName> {
        let confidence = observation.source_class.confidence(&self.source_confidence);
        let mut changed = Vec::new();

        for (&field, value) in &observation.fields {
            let incoming = FieldProvenance {
                source_id: observation.source_id.clone(),
                source_class: observation.source_class,
                confidence,
                observed_at: observation.observed_at,
                observation_id: observation.observation_id,
            };
            if self.apply_field(entity, field, value, incoming) {
                changed.push(field);
            }
        }

        entity.record_observation(observation.observation_id);
        self.rescore(entity);

        debug!(
            entity_id = %entity.id(),
            observation_id = %observation.observation_id,
            source_id = %observation.source_id,
            confidence,
            changed = changed.len(),
            "Merged observation"
        );
        changed
    }

    /// Fold every field of `source` into `target` using `source`'s recorded
    /// provenance, and carry over its audit list
    pub fn absorb(&self, target: &mut CanonicalEntity, source: &CanonicalEntity) -> Vec<FieldName> {
        let mut changed = Vec::new();

        for (&field, value) in source.fields() {
            let Some(provenance) = source.provenance(field) else {
                continue;
            };
            if self.apply_field(target, field, value, provenance.clone()) {
                changed.push(field);
            }
        }

        for &observation_id in source.contributing_observations() {
            target.record_observation(observation_id);
        }
        self.rescore(target);

        debug!(
            survivor = %target.id(),
            absorbed = %source.id(),
            changed = changed.len(),
            "Absorbed entity"
        );
        changed
    }

    /// Recompute quality from the entity's current fields
    pub fn rescore(&self, entity: &mut CanonicalEntity) {
        let quality = self.quality.score(entity.fields());
        entity.set_quality(quality);
    }

    fn apply_field(
        &self,
        entity: &mut CanonicalEntity,
        field: FieldName,
        value: &str,
        incoming: FieldProvenance,
    ) -> bool {
        if let Some(existing) = entity.provenance(field) {
            if !should_replace(existing, incoming.confidence, incoming.observed_at) {
                return false;
            }
        }

        if field == FieldName::Identifier {
            if let Some(current) = entity.identifier() {
                if current != value {
                    warn!(
                        entity_id = %entity.id(),
                        from = current,
                        to = value,
                        source_id = %incoming.source_id,
                        "Replacing official identifier"
                    );
                }
            }
        }

        entity.set_field(field, value.to_string(), incoming);
        true
    }
}

/// Incoming value wins on strictly higher confidence, or on equal
/// confidence with a strictly newer timestamp
pub fn should_replace(
    existing: &FieldProvenance,
    incoming_confidence: u8,
    incoming_observed_at: DateTime<Utc>,
) -> bool {
    incoming_confidence > existing.confidence
        || (incoming_confidence == existing.confidence
            && incoming_observed_at > existing.observed_at)
}
