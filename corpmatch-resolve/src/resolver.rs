//! Resolution Orchestrator
//!
//! Single entry point for collaborators. Owns the entity index behind one
//! lock; for each observation the whole match → merge → rescore → index
//! update sequence runs while holding it, so two workers can never both see
//! `NoMatch` for the same new company.
//!
//! # Operations
//! - [`Resolver::resolve`]: fold a batch of raw observations into the index
//! - [`Resolver::reconcile`]: explicitly merge two existing entities
//!
//! Per-observation problems never fail a batch; they are reported as
//! [`ObservationIssue`]s on the [`Resolution`] records.

use crate::error::{ResolveError, ResolveResult};
use crate::fusion::MergeEngine;
use crate::index::{round2, CoverageReport, EntityIndex};
use crate::matcher::IdentityMatcher;
use crate::observation::prepare;
use crate::rules::FieldRules;
use crate::types::{
    CanonicalEntity, EntityId, FieldName, MatchDecision, ObservationIssue, RawObservation,
    Resolution,
};
use corpmatch_common::ResolverSettings;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Result of one `resolve` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResolution {
    /// One record per processed observation, in input order
    pub resolutions: Vec<Resolution>,
    pub report: MatchingReport,
    /// Cancellation stopped the batch before its last observation
    pub cancelled: bool,
}

/// Matching statistics for one `resolve` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingReport {
    /// Observations processed
    pub observations: usize,
    pub new_entities: usize,
    /// Observations folded into an already existing entity
    pub merged: usize,
    pub ambiguous: usize,
    /// Observations whose merge was blocked by an integrity violation
    pub uncommitted: usize,
    /// merged / observations × 100, two decimals
    pub deduplication_rate: f64,
    pub threshold: u8,
}

impl MatchingReport {
    pub fn from_resolutions(resolutions: &[Resolution], threshold: u8) -> Self {
        let observations = resolutions.len();
        let new_entities = resolutions.iter().filter(|r| r.committed && r.created).count();
        let merged = resolutions.iter().filter(|r| r.committed && !r.created).count();
        let ambiguous = resolutions
            .iter()
            .filter(|r| {
                r.issues
                    .iter()
                    .any(|i| matches!(i, ObservationIssue::AmbiguousMatch { .. }))
            })
            .count();
        let uncommitted = resolutions.iter().filter(|r| !r.committed).count();

        let deduplication_rate = if observations == 0 {
            0.0
        } else {
            round2(merged as f64 * 100.0 / observations as f64)
        };

        Self {
            observations,
            new_entities,
            merged,
            ambiguous,
            uncommitted,
            deduplication_rate,
            threshold,
        }
    }
}

/// Result of an explicit `reconcile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub survivor: EntityId,
    pub absorbed: EntityId,
    /// Survivor fields whose value or provenance changed
    pub changed_fields: Vec<FieldName>,
}

pub struct Resolver {
    index: Mutex<EntityIndex>,
    matcher: IdentityMatcher,
    merger: MergeEngine,
    rules: FieldRules,
    settings: ResolverSettings,
}

impl Resolver {
    /// Create a resolver with an empty index
    pub fn new(settings: ResolverSettings) -> ResolveResult<Self> {
        Self::with_index(settings, EntityIndex::new())
    }

    /// Create a resolver over an existing index
    pub fn with_index(settings: ResolverSettings, index: EntityIndex) -> ResolveResult<Self> {
        settings.validate()?;
        Ok(Self {
            index: Mutex::new(index),
            matcher: IdentityMatcher::new(settings.fuzzy_match_threshold),
            merger: MergeEngine::from_settings(&settings)?,
            rules: FieldRules::from_settings(&settings)?,
            settings,
        })
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve every observation of `batch`, in input order
    pub fn resolve(&self, batch: &[RawObservation]) -> BatchResolution {
        self.resolve_cancellable(batch, &CancellationToken::new())
    }

    /// Like [`resolve`](Self::resolve), stopping between observations once
    /// `cancel` fires
    pub fn resolve_cancellable(
        &self,
        batch: &[RawObservation],
        cancel: &CancellationToken,
    ) -> BatchResolution {
        let mut resolutions = Vec::with_capacity(batch.len());
        let mut cancelled = false;

        for raw in batch {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            resolutions.push(self.resolve_one(raw));
        }

        let report = MatchingReport::from_resolutions(&resolutions, self.matcher.threshold());
        info!(
            observations = report.observations,
            skipped = batch.len() - resolutions.len(),
            new_entities = report.new_entities,
            merged = report.merged,
            ambiguous = report.ambiguous,
            uncommitted = report.uncommitted,
            deduplication_rate = report.deduplication_rate,
            cancelled,
            "Batch resolved"
        );

        BatchResolution {
            resolutions,
            report,
            cancelled,
        }
    }

    /// Match, merge and commit one observation as a single locked unit
    pub fn resolve_one(&self, raw: &RawObservation) -> Resolution {
        let prepared = prepare(raw, &self.rules);
        let mut issues = prepared.issues.clone();

        let mut index = self.lock_index();
        let mut outcome = self.matcher.find_match(&prepared, &index);
        // a replayed observation goes back to the entity that already holds it
        if let Some(known) = index.lookup_observation(prepared.observation_id) {
            if outcome.entity_id != Some(known) {
                debug!(
                    observation_id = %prepared.observation_id,
                    entity_id = %known,
                    "Observation already resolved"
                );
                outcome.decision = MatchDecision::KnownObservation;
                outcome.entity_id = Some(known);
            }
        }
        issues.extend(outcome.issues);

        let existing = outcome.entity_id.and_then(|id| index.get(id)).cloned();
        let (entity, created, changed_fields) = match existing {
            Some(mut entity) => {
                let changed = self.merger.merge(&mut entity, &prepared);
                (entity, false, changed)
            }
            None => {
                let entity = self.merger.seed(&prepared);
                let changed = entity.fields().keys().copied().collect();
                (entity, true, changed)
            }
        };
        let entity_id = entity.id();
        // a match on a missing entity would be seeded above; report it as NoMatch
        let decision = if created { MatchDecision::NoMatch } else { outcome.decision };

        let committed = match index.commit(vec![entity]) {
            Ok(()) => true,
            Err(ResolveError::IdentifierCollision {
                identifier,
                existing,
                incoming,
            }) => {
                error!(
                    observation_id = %prepared.observation_id,
                    identifier = %identifier,
                    holder = %existing,
                    entity_id = %incoming,
                    "Identifier collision, merge not committed"
                );
                issues.push(ObservationIssue::IdentifierCollision {
                    identifier,
                    holder: existing,
                });
                false
            }
            Err(e) => {
                error!(observation_id = %prepared.observation_id, error = %e, "Commit failed");
                false
            }
        };
        drop(index);

        Resolution {
            observation_id: prepared.observation_id,
            entity_id,
            decision,
            confidence: decision.confidence(),
            created,
            committed,
            changed_fields: if committed { changed_fields } else { Vec::new() },
            issues,
        }
    }

    /// Merge `absorbed` into `survivor`, then deactivate `absorbed` with a
    /// back-reference to `survivor`
    pub fn reconcile(
        &self,
        survivor: EntityId,
        absorbed: EntityId,
    ) -> ResolveResult<ReconcileOutcome> {
        if survivor == absorbed {
            return Err(ResolveError::SelfReconcile(survivor));
        }

        let mut index = self.lock_index();
        let mut target = active_entity(&index, survivor)?.clone();
        let mut source = active_entity(&index, absorbed)?.clone();

        let changed_fields = self.merger.absorb(&mut target, &source);
        source.mark_merged_into(survivor);

        if let Err(e) = index.commit(vec![target, source]) {
            error!(survivor = %survivor, absorbed = %absorbed, error = %e, "Reconcile not committed");
            return Err(e);
        }

        info!(
            survivor = %survivor,
            absorbed = %absorbed,
            changed = changed_fields.len(),
            "Reconciled entities"
        );

        Ok(ReconcileOutcome {
            survivor,
            absorbed,
            changed_fields,
        })
    }

    /// Copy of one entity
    pub fn entity(&self, id: EntityId) -> Option<CanonicalEntity> {
        self.lock_index().get(id).cloned()
    }

    /// Copy of every entity in creation order, absorbed ones included
    pub fn snapshot(&self) -> Vec<CanonicalEntity> {
        self.lock_index().iter().cloned().collect()
    }

    pub fn coverage(&self) -> CoverageReport {
        self.lock_index().coverage()
    }

    pub fn verify_integrity(&self) -> ResolveResult<()> {
        self.lock_index().verify_integrity()
    }

    fn lock_index(&self) -> MutexGuard<'_, EntityIndex> {
        // commits are all-or-nothing, so a poisoned index is still consistent
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn active_entity(index: &EntityIndex, id: EntityId) -> ResolveResult<&CanonicalEntity> {
    let entity = index.get(id).ok_or(ResolveError::EntityNotFound(id))?;
    match entity.merged_into() {
        Some(into) => Err(ResolveError::AlreadyMerged { entity: id, into }),
        None => Ok(entity),
    }
}
