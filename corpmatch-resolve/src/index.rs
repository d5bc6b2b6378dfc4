//! Canonical entity index
//!
//! Owns every canonical entity in creation order plus the secondary lookups
//! used by the matcher:
//! - identifier → entity (tier 1)
//! - normalized website host → entities, creation-ordered (tier 2)
//! - cached normalized names (tier 3)
//! - observation id → entity whose audit list holds it (replays)
//!
//! Entities absorbed by `reconcile` stay stored but are excluded from every
//! lookup. Entities are never removed.

use crate::error::{ResolveError, ResolveResult};
use crate::normalize::{normalize_domain, normalize_name};
use crate::types::{CanonicalEntity, EntityId, FieldName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

const TOP_INDUSTRIES: usize = 5;

#[derive(Debug, Default)]
pub struct EntityIndex {
    entities: Vec<CanonicalEntity>,
    positions: HashMap<EntityId, usize>,
    by_identifier: HashMap<String, EntityId>,
    by_domain: HashMap<String, Vec<EntityId>>,
    by_observation: HashMap<Uuid, EntityId>,
    /// Normalized name per active entity, by position
    name_keys: Vec<Option<String>>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities, absorbed ones included
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_active()).count()
    }

    pub fn get(&self, id: EntityId) -> Option<&CanonicalEntity> {
        self.positions.get(&id).map(|&pos| &self.entities[pos])
    }

    /// All entities in creation order
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalEntity> {
        self.entities.iter()
    }

    /// Active entity holding this identifier
    pub fn lookup_identifier(&self, identifier: &str) -> Option<EntityId> {
        self.by_identifier.get(identifier).copied()
    }

    /// Active entities whose website normalizes to `host`, in creation order
    pub fn lookup_domain(&self, host: &str) -> &[EntityId] {
        self.by_domain.get(host).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Active entity whose audit list already contains this observation
    pub fn lookup_observation(&self, observation_id: Uuid) -> Option<EntityId> {
        self.by_observation.get(&observation_id).copied()
    }

    /// Active entities with a non-empty normalized name, in creation order
    pub fn name_candidates(&self) -> impl Iterator<Item = (EntityId, &str)> {
        self.entities
            .iter()
            .zip(&self.name_keys)
            .filter_map(|(entity, key)| match key {
                Some(key) if entity.is_active() => Some((entity.id(), key.as_str())),
                _ => None,
            })
    }

    /// Check that committing `entities` would leave every identifier with one holder
    pub fn check_commit(&self, entities: &[CanonicalEntity]) -> ResolveResult<()> {
        let mut claimed: HashMap<&str, EntityId> = HashMap::new();
        for entity in entities.iter().filter(|e| e.is_active()) {
            let Some(identifier) = entity.identifier() else {
                continue;
            };
            if let Some(existing) = self.lookup_identifier(identifier) {
                let replaced = entities.iter().any(|e| {
                    e.id() == existing && (!e.is_active() || e.identifier() != Some(identifier))
                });
                if existing != entity.id() && !replaced {
                    return Err(ResolveError::IdentifierCollision {
                        identifier: identifier.to_string(),
                        existing,
                        incoming: entity.id(),
                    });
                }
            }
            if let Some(other) = claimed.insert(identifier, entity.id()) {
                return Err(ResolveError::IdentifierCollision {
                    identifier: identifier.to_string(),
                    existing: other,
                    incoming: entity.id(),
                });
            }
        }
        Ok(())
    }

    /// Insert or replace entities as one unit
    ///
    /// Nothing is written unless the whole set passes [`check_commit`](Self::check_commit).
    pub fn commit(&mut self, entities: Vec<CanonicalEntity>) -> ResolveResult<()> {
        self.check_commit(&entities)?;
        for entity in entities {
            self.upsert(entity);
        }
        Ok(())
    }

    fn upsert(&mut self, entity: CanonicalEntity) {
        let id = entity.id();
        let pos = match self.positions.get(&id).copied() {
            Some(pos) => {
                self.unlink(pos);
                self.entities[pos] = entity;
                pos
            }
            None => {
                let pos = self.entities.len();
                self.entities.push(entity);
                self.name_keys.push(None);
                self.positions.insert(id, pos);
                pos
            }
        };
        self.link(pos);
    }

    fn unlink(&mut self, pos: usize) {
        let entity = &self.entities[pos];
        let id = entity.id();
        if let Some(identifier) = entity.identifier() {
            if self.by_identifier.get(identifier) == Some(&id) {
                self.by_identifier.remove(identifier);
            }
        }
        if let Some(host) = entity.website().and_then(normalize_domain) {
            if let Some(ids) = self.by_domain.get_mut(&host) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.by_domain.remove(&host);
                }
            }
        }
        for observation_id in entity.contributing_observations() {
            if self.by_observation.get(observation_id) == Some(&id) {
                self.by_observation.remove(observation_id);
            }
        }
        self.name_keys[pos] = None;
    }

    fn link(&mut self, pos: usize) {
        let entity = &self.entities[pos];
        if !entity.is_active() {
            return;
        }
        let id = entity.id();
        if let Some(identifier) = entity.identifier() {
            self.by_identifier.insert(identifier.to_string(), id);
        }
        if let Some(host) = entity.website().and_then(normalize_domain) {
            let ids = self.by_domain.entry(host).or_default();
            // keep creation order
            let at = ids
                .iter()
                .position(|other| self.positions.get(other).map_or(false, |&p| p > pos))
                .unwrap_or(ids.len());
            ids.insert(at, id);
        }
        for &observation_id in entity.contributing_observations() {
            self.by_observation.insert(observation_id, id);
        }
        let key = entity.name().map(normalize_name).filter(|k| !k.is_empty());
        self.name_keys[pos] = key;
    }

    /// Scan for two active entities sharing one identifier
    pub fn verify_integrity(&self) -> ResolveResult<()> {
        let mut seen: HashMap<&str, EntityId> = HashMap::new();
        for entity in self.entities.iter().filter(|e| e.is_active()) {
            if let Some(identifier) = entity.identifier() {
                if let Some(existing) = seen.insert(identifier, entity.id()) {
                    return Err(ResolveError::IdentifierCollision {
                        identifier: identifier.to_string(),
                        existing,
                        incoming: entity.id(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Field coverage summary over active entities
    pub fn coverage(&self) -> CoverageReport {
        let active: Vec<&CanonicalEntity> = self.entities.iter().filter(|e| e.is_active()).collect();
        let count = active.len();

        let percent = |field: FieldName| -> f64 {
            if count == 0 {
                return 0.0;
            }
            let with = active.iter().filter(|e| e.field(field).is_some()).count();
            round2(with as f64 * 100.0 / count as f64)
        };

        let average_quality = if count == 0 {
            0.0
        } else {
            let sum: u64 = active.iter().map(|e| e.quality().composite as u64).sum();
            round2(sum as f64 / count as f64)
        };

        let mut industries: HashMap<&str, usize> = HashMap::new();
        for entity in &active {
            if let Some(industry) = entity.field(FieldName::Industry) {
                *industries.entry(industry).or_default() += 1;
            }
        }
        let mut top_industries: Vec<(String, usize)> = industries
            .into_iter()
            .map(|(label, n)| (label.to_string(), n))
            .collect();
        top_industries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_industries.truncate(TOP_INDUSTRIES);

        CoverageReport {
            total_entities: self.entities.len(),
            active_entities: count,
            website_coverage: percent(FieldName::Website),
            linkedin_coverage: percent(FieldName::Linkedin),
            email_coverage: percent(FieldName::ContactEmail),
            industry_coverage: percent(FieldName::Industry),
            average_quality,
            top_industries,
        }
    }
}

/// Field coverage across active entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub total_entities: usize,
    pub active_entities: usize,
    /// Percentages, two decimals
    pub website_coverage: f64,
    pub linkedin_coverage: f64,
    pub email_coverage: f64,
    pub industry_coverage: f64,
    /// Mean composite quality
    pub average_quality: f64,
    /// Most common industry labels, by count then label
    pub top_industries: Vec<(String, usize)>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
