//! Identity Matcher
//!
//! Decides which existing canonical entity, if any, a prepared observation
//! describes.
//!
//! # Tier Order
//! 1. **Identifier**: exact official identifier (authoritative)
//! 2. **Domain**: normalized website host held by exactly one entity
//! 3. **Fuzzy name**: best name similarity at or above the threshold
//!
//! The first tier that fires wins; later tiers are not consulted. A tier
//! whose input field is missing is skipped. A domain shared by several
//! entities is recorded as ambiguous and falls through to the name tier.
//! Fuzzy ties resolve to the earliest-created candidate and are flagged.

use crate::index::EntityIndex;
use crate::normalize::{normalize_domain, normalize_name};
use crate::observation::PreparedObservation;
use crate::similarity::similarity;
use crate::types::{EntityId, FieldName, MatchDecision, MatchTier, ObservationIssue};
use tracing::{debug, warn};

/// Result of matching one observation
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub decision: MatchDecision,
    /// Matched entity; `None` exactly when the decision is `NoMatch`
    pub entity_id: Option<EntityId>,
    /// `AmbiguousMatch` findings from any tier consulted
    pub issues: Vec<ObservationIssue>,
}

impl MatchOutcome {
    fn matched(decision: MatchDecision, entity_id: EntityId, issues: Vec<ObservationIssue>) -> Self {
        Self {
            decision,
            entity_id: Some(entity_id),
            issues,
        }
    }
}

pub struct IdentityMatcher {
    threshold: u8,
}

impl IdentityMatcher {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Similarity at or above the threshold is a match
    pub fn accepts(&self, score: u8) -> bool {
        score >= self.threshold
    }

    /// Run the tiers against the current index state
    pub fn find_match(&self, observation: &PreparedObservation, index: &EntityIndex) -> MatchOutcome {
        let mut issues = Vec::new();

        if let Some(identifier) = observation.field(FieldName::Identifier) {
            if let Some(entity_id) = index.lookup_identifier(identifier) {
                debug!(
                    observation_id = %observation.observation_id,
                    entity_id = %entity_id,
                    "Exact identifier match"
                );
                return MatchOutcome::matched(MatchDecision::ExactIdentifierMatch, entity_id, issues);
            }
        }

        if let Some(host) = observation.field(FieldName::Website).and_then(normalize_domain) {
            match index.lookup_domain(&host) {
                [] => {}
                [entity_id] => {
                    debug!(
                        observation_id = %observation.observation_id,
                        entity_id = %entity_id,
                        host = %host,
                        "Domain match"
                    );
                    return MatchOutcome::matched(MatchDecision::DomainMatch, *entity_id, issues);
                }
                candidates => {
                    warn!(
                        observation_id = %observation.observation_id,
                        host = %host,
                        candidates = candidates.len(),
                        "Domain shared by several entities, falling through to name match"
                    );
                    issues.push(ObservationIssue::AmbiguousMatch {
                        tier: MatchTier::Domain,
                        candidates: candidates.to_vec(),
                    });
                }
            }
        }

        if let Some(name) = observation.field(FieldName::Name) {
            if let Some((score, tied)) = self.best_name_matches(&normalize_name(name), index) {
                let ambiguous = tied.len() > 1;
                let entity_id = tied[0];
                if ambiguous {
                    warn!(
                        observation_id = %observation.observation_id,
                        score,
                        candidates = tied.len(),
                        chosen = %entity_id,
                        "Fuzzy name tie, choosing earliest-created entity"
                    );
                    issues.push(ObservationIssue::AmbiguousMatch {
                        tier: MatchTier::FuzzyName,
                        candidates: tied,
                    });
                } else {
                    debug!(
                        observation_id = %observation.observation_id,
                        entity_id = %entity_id,
                        score,
                        "Fuzzy name match"
                    );
                }
                return MatchOutcome::matched(
                    MatchDecision::FuzzyNameMatch { score, ambiguous },
                    entity_id,
                    issues,
                );
            }
        }

        debug!(observation_id = %observation.observation_id, "No match");
        MatchOutcome {
            decision: MatchDecision::NoMatch,
            entity_id: None,
            issues,
        }
    }

    /// Best accepted score and every candidate reaching it, in creation order
    fn best_name_matches(&self, key: &str, index: &EntityIndex) -> Option<(u8, Vec<EntityId>)> {
        if key.is_empty() {
            return None;
        }

        let mut best: Option<(u8, Vec<EntityId>)> = None;
        for (entity_id, candidate) in index.name_candidates() {
            let score = similarity(key, candidate);
            if !self.accepts(score) {
                continue;
            }
            let top = best.as_ref().map(|(top, _)| *top);
            match top {
                Some(top) if score < top => {}
                Some(top) if score == top => {
                    if let Some((_, tied)) = best.as_mut() {
                        tied.push(entity_id);
                    }
                }
                _ => best = Some((score, vec![entity_id])),
            }
        }
        best
    }
}
