//! Integration tests for batch resolution
//!
//! Covers tier ordering, confidence-ordered merging, idempotent re-ingestion,
//! same-batch matching and per-observation issue reporting.

use chrono::{DateTime, TimeZone, Utc};
use corpmatch_common::config::SourceConfidence;
use corpmatch_common::ResolverSettings;
use corpmatch_resolve::{
    FieldName, MatchConfidence, MatchDecision, ObservationIssue, QualityStatus, RawObservation,
    Resolver, SourceClass,
};

// ============================================================================
// Helpers
// ============================================================================

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap()
}

fn observation(
    source_id: &str,
    class: SourceClass,
    at: DateTime<Utc>,
    pairs: &[(FieldName, &str)],
) -> RawObservation {
    pairs
        .iter()
        .fold(RawObservation::new(source_id, class, at), |obs, (field, value)| {
            obs.with_field(*field, *value)
        })
}

fn resolver_with(confidence: SourceConfidence) -> Resolver {
    let settings = ResolverSettings {
        source_confidence: confidence,
        ..ResolverSettings::default()
    };
    Resolver::new(settings).unwrap()
}

fn default_resolver() -> Resolver {
    Resolver::new(ResolverSettings::default()).unwrap()
}

// ============================================================================
// Merge semantics
// ============================================================================

#[test]
fn test_registry_name_wins_over_lower_confidence_source() {
    let resolver = resolver_with(SourceConfidence {
        registry: 95,
        website: 75,
        ..SourceConfidence::default()
    });

    let batch = resolver.resolve(&[
        observation(
            "acra",
            SourceClass::Registry,
            day(1),
            &[(FieldName::Identifier, "201512345K"), (FieldName::Name, "TechCorp Pte Ltd")],
        ),
        observation(
            "techcorp.sg",
            SourceClass::Website,
            day(2),
            &[(FieldName::Identifier, "201512345K"), (FieldName::Name, "Techcorp")],
        ),
    ]);

    assert_eq!(batch.resolutions[1].decision, MatchDecision::ExactIdentifierMatch);
    assert_eq!(batch.resolutions[1].confidence, MatchConfidence::Authoritative);
    assert!(batch.resolutions[1].changed_fields.is_empty());

    let entities = resolver.snapshot();
    assert_eq!(entities.len(), 1);
    let entity = &entities[0];
    assert_eq!(entity.name(), Some("TechCorp Pte Ltd"));
    assert_eq!(entity.identifier(), Some("201512345K"));
    assert_eq!(entity.provenance(FieldName::Name).unwrap().source_id, "acra");
    assert_eq!(entity.contributing_observations().len(), 2);
}

#[test]
fn test_higher_confidence_value_is_never_overwritten_by_lower() {
    let resolver = resolver_with(SourceConfidence {
        registry: 90,
        social_profile: 70,
        ..SourceConfidence::default()
    });

    resolver.resolve(&[observation(
        "acra",
        SourceClass::Registry,
        day(1),
        &[(FieldName::Identifier, "201512345K"), (FieldName::Industry, "Finance")],
    )]);
    // newer, but less reliable
    let batch = resolver.resolve(&[observation(
        "linkedin",
        SourceClass::SocialProfile,
        day(28),
        &[(FieldName::Identifier, "201512345K"), (FieldName::Industry, "Technology")],
    )]);

    let entity = resolver.entity(batch.resolutions[0].entity_id).unwrap();
    assert_eq!(entity.field(FieldName::Industry), Some("Finance"));
    assert_eq!(entity.provenance(FieldName::Industry).unwrap().confidence, 90);
}

#[test]
fn test_reingesting_same_observation_only_extends_audit() {
    let resolver = default_resolver();
    let obs = observation(
        "techcorp.sg",
        SourceClass::Website,
        day(1),
        &[
            (FieldName::Name, "TechCorp"),
            (FieldName::Website, "techcorp.sg"),
            (FieldName::ContactEmail, "info@techcorp.sg"),
        ],
    );

    let first = resolver.resolve(std::slice::from_ref(&obs));
    let before = resolver.entity(first.resolutions[0].entity_id).unwrap();

    let second = resolver.resolve(std::slice::from_ref(&obs));
    let after = resolver.entity(second.resolutions[0].entity_id).unwrap();

    assert_eq!(first.resolutions[0].entity_id, second.resolutions[0].entity_id);
    assert_eq!(after.fields(), before.fields());
    assert_eq!(after.provenance_map(), before.provenance_map());
    assert_eq!(after.quality(), before.quality());
    assert_eq!(
        after.contributing_observations(),
        &[obs.observation_id(), obs.observation_id()]
    );
    assert_eq!(resolver.snapshot().len(), 1);
}

#[test]
fn test_reingesting_observation_without_match_keys_reuses_entity() {
    let resolver = default_resolver();
    let email_only = observation(
        "crawl",
        SourceClass::Discovery,
        day(1),
        &[(FieldName::ContactEmail, "info@techcorp.sg")],
    );
    // the identifier is dropped as malformed, leaving nothing to match on
    let bad_identifier = observation(
        "crawl",
        SourceClass::Discovery,
        day(1),
        &[(FieldName::Identifier, "garbage")],
    );

    let batch = resolver.resolve(&[
        email_only.clone(),
        bad_identifier.clone(),
        email_only.clone(),
        bad_identifier.clone(),
    ]);
    let created: Vec<bool> = batch.resolutions.iter().map(|r| r.created).collect();
    assert_eq!(created, vec![true, true, false, false]);
    assert_eq!(batch.resolutions[2].entity_id, batch.resolutions[0].entity_id);
    assert_eq!(batch.resolutions[3].entity_id, batch.resolutions[1].entity_id);
    assert_eq!(batch.resolutions[2].decision, MatchDecision::KnownObservation);
    assert_eq!(batch.resolutions[2].confidence, MatchConfidence::Authoritative);
    assert!(batch.resolutions[2].changed_fields.is_empty());
    assert_eq!(resolver.snapshot().len(), 2);

    let entity = resolver.entity(batch.resolutions[0].entity_id).unwrap();
    assert_eq!(
        entity.contributing_observations(),
        &[email_only.observation_id(), email_only.observation_id()]
    );
}

#[test]
fn test_equal_confidence_newer_observation_wins() {
    let resolver = default_resolver();
    resolver.resolve(&[
        observation(
            "acra",
            SourceClass::Registry,
            day(1),
            &[(FieldName::Identifier, "201512345K"), (FieldName::Status, "Live")],
        ),
        observation(
            "acra",
            SourceClass::Registry,
            day(10),
            &[(FieldName::Identifier, "201512345K"), (FieldName::Status, "Struck Off")],
        ),
    ]);

    let entities = resolver.snapshot();
    assert_eq!(entities.len(), 1);
    // leaving the registry is a field change, never a removal
    assert_eq!(entities[0].field(FieldName::Status), Some("Struck Off"));
    assert!(entities[0].is_active());
}

// ============================================================================
// Matching tiers
// ============================================================================

#[test]
fn test_identifier_tier_is_absolute() {
    let resolver = default_resolver();
    let seeded = resolver.resolve(&[
        observation(
            "acra",
            SourceClass::Registry,
            day(1),
            &[(FieldName::Identifier, "201512345K"), (FieldName::Name, "Alpha Holdings")],
        ),
        observation("crawl", SourceClass::Discovery, day(1), &[(FieldName::Name, "Beta Trading")]),
    ]);
    let alpha = seeded.resolutions[0].entity_id;

    let batch = resolver.resolve(&[observation(
        "crawl",
        SourceClass::Discovery,
        day(2),
        &[(FieldName::Identifier, "201512345K"), (FieldName::Name, "Beta Trading")],
    )]);

    assert_eq!(batch.resolutions[0].decision, MatchDecision::ExactIdentifierMatch);
    assert_eq!(batch.resolutions[0].entity_id, alpha);
}

#[test]
fn test_domain_match_and_secondary_index_refresh() {
    let resolver = default_resolver();
    let batch = resolver.resolve(&[
        observation(
            "crawl",
            SourceClass::Discovery,
            day(1),
            &[(FieldName::Name, "Acme Robotics"), (FieldName::Website, "https://www.acme.sg")],
        ),
        // supplies the identifier through a domain match
        observation(
            "acme.sg",
            SourceClass::Website,
            day(2),
            &[(FieldName::Website, "acme.sg/about"), (FieldName::Identifier, "201811111B")],
        ),
        // now found through the freshly indexed identifier
        observation(
            "acra",
            SourceClass::Registry,
            day(3),
            &[(FieldName::Identifier, "201811111b"), (FieldName::Name, "Zeta Unrelated")],
        ),
    ]);

    assert_eq!(batch.resolutions[1].decision, MatchDecision::DomainMatch);
    assert_eq!(batch.resolutions[1].confidence, MatchConfidence::High);
    assert_eq!(batch.resolutions[2].decision, MatchDecision::ExactIdentifierMatch);

    let entities = resolver.snapshot();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].name(), Some("Zeta Unrelated"));
    assert_eq!(batch.report.new_entities, 1);
    assert_eq!(batch.report.merged, 2);
    assert_eq!(batch.report.deduplication_rate, 66.67);
}

#[test]
fn test_later_observation_matches_entity_created_in_same_batch() {
    let resolver = default_resolver();
    let batch = resolver.resolve(&[
        observation("crawl", SourceClass::Discovery, day(1), &[(FieldName::Name, "TechCorp Solutions Pte. Ltd.")]),
        observation("linkedin", SourceClass::SocialProfile, day(1), &[(FieldName::Name, "Techcorp Solutions")]),
    ]);

    assert!(batch.resolutions[0].created);
    assert_eq!(
        batch.resolutions[1].decision,
        MatchDecision::FuzzyNameMatch { score: 100, ambiguous: false }
    );
    assert_eq!(batch.resolutions[1].confidence, MatchConfidence::Probable);
    assert_eq!(batch.resolutions[0].entity_id, batch.resolutions[1].entity_id);
    assert_eq!(resolver.snapshot().len(), 1);
}

#[test]
fn test_default_threshold_is_inclusive() {
    let resolver = default_resolver();
    let seeded = resolver.resolve(&[observation(
        "acra",
        SourceClass::Registry,
        day(1),
        &[(FieldName::Name, "Kestrel Marine Pte Ltd")],
    )]);
    let kestrel = seeded.resolutions[0].entity_id;

    let batch = resolver.resolve(&[
        observation("crawl", SourceClass::Discovery, day(2), &[(FieldName::Name, "Kestrel Marine Holdings")]),
        observation("crawl", SourceClass::Discovery, day(2), &[(FieldName::Name, "Kestrel Marine Solutions")]),
    ]);

    // 85: merged, and the registry name survives the lower-confidence source
    assert_eq!(
        batch.resolutions[0].decision,
        MatchDecision::FuzzyNameMatch { score: 85, ambiguous: false }
    );
    assert_eq!(batch.resolutions[0].entity_id, kestrel);
    assert_eq!(resolver.entity(kestrel).unwrap().name(), Some("Kestrel Marine Pte Ltd"));

    // 84: a new entity
    assert_eq!(batch.resolutions[1].decision, MatchDecision::NoMatch);
    assert!(batch.resolutions[1].created);
    assert_eq!(resolver.snapshot().len(), 2);
}

#[test]
fn test_near_spelling_matches_at_default_threshold() {
    let resolver = default_resolver();
    let batch = resolver.resolve(&[
        observation("acra", SourceClass::Registry, day(1), &[(FieldName::Name, "Alpha Logistics Pte Ltd")]),
        observation("crawl", SourceClass::Discovery, day(2), &[(FieldName::Name, "Alfa Logistic")]),
    ]);

    assert_eq!(
        batch.resolutions[1].decision,
        MatchDecision::FuzzyNameMatch { score: 86, ambiguous: false }
    );
    assert_eq!(batch.resolutions[0].entity_id, batch.resolutions[1].entity_id);
}

#[test]
fn test_fuzzy_tie_flags_ambiguity_and_picks_earliest() {
    // the two seeds score 82 against each other, the query 89 against both
    let resolver = default_resolver();
    let seeded = resolver.resolve(&[
        observation(
            "acra",
            SourceClass::Registry,
            day(1),
            &[(FieldName::Identifier, "201512345K"), (FieldName::Name, "Orchid Trading North Pte Ltd")],
        ),
        observation(
            "acra",
            SourceClass::Registry,
            day(1),
            &[(FieldName::Identifier, "201598765A"), (FieldName::Name, "Orchid Trading South Limited")],
        ),
    ]);
    assert_eq!(resolver.snapshot().len(), 2);

    let batch = resolver.resolve(&[observation(
        "crawl",
        SourceClass::Discovery,
        day(2),
        &[(FieldName::Name, "ORCHID TRADING")],
    )]);

    let resolution = &batch.resolutions[0];
    assert_eq!(
        resolution.decision,
        MatchDecision::FuzzyNameMatch { score: 89, ambiguous: true }
    );
    assert_eq!(resolution.entity_id, seeded.resolutions[0].entity_id);
    assert_eq!(batch.report.ambiguous, 1);
    assert!(resolution
        .issues
        .iter()
        .any(|i| matches!(i, ObservationIssue::AmbiguousMatch { candidates, .. } if candidates.len() == 2)));
}

#[test]
fn test_unrelated_names_create_separate_entities() {
    let resolver = default_resolver();
    resolver.resolve(&[
        observation("crawl", SourceClass::Discovery, day(1), &[(FieldName::Name, "Acme Robotics")]),
        observation("crawl", SourceClass::Discovery, day(1), &[(FieldName::Name, "Globex Shipping")]),
    ]);
    assert_eq!(resolver.snapshot().len(), 2);
}

// ============================================================================
// Issues and quality
// ============================================================================

#[test]
fn test_malformed_identifier_is_dropped_rest_proceeds() {
    let resolver = default_resolver();
    let batch = resolver.resolve(&[observation(
        "crawl",
        SourceClass::Discovery,
        day(1),
        &[
            (FieldName::Identifier, "UEN-UNKNOWN"),
            (FieldName::Name, "Acme Robotics"),
            (FieldName::EmployeeCount, "forty"),
        ],
    )]);

    let resolution = &batch.resolutions[0];
    assert!(resolution.committed);
    assert_eq!(resolution.issues.len(), 2);
    assert!(resolution.issues.iter().all(|i| matches!(i, ObservationIssue::MalformedField { .. })));

    let entity = resolver.entity(resolution.entity_id).unwrap();
    assert_eq!(entity.identifier(), None);
    assert_eq!(entity.name(), Some("Acme Robotics"));
}

#[test]
fn test_identifier_and_name_only_completeness() {
    let resolver = default_resolver();
    let batch = resolver.resolve(&[observation(
        "acra",
        SourceClass::Registry,
        day(1),
        &[(FieldName::Identifier, "201512345K"), (FieldName::Name, "TechCorp Pte Ltd")],
    )]);
    let entity = resolver.entity(batch.resolutions[0].entity_id).unwrap();
    assert_eq!(entity.quality().completeness, 50.0);
    assert_eq!(entity.quality().status, QualityStatus::Pass);
}

#[test]
fn test_quality_tracks_latest_merge() {
    let resolver = default_resolver();
    let batch = resolver.resolve(&[
        observation("acra", SourceClass::Registry, day(1), &[(FieldName::Identifier, "201512345K")]),
        observation(
            "techcorp.sg",
            SourceClass::Website,
            day(2),
            &[
                (FieldName::Identifier, "201512345K"),
                (FieldName::Name, "TechCorp"),
                (FieldName::Website, "techcorp.sg"),
                (FieldName::ContactEmail, "info@techcorp.sg"),
            ],
        ),
    ]);

    let entity = resolver.entity(batch.resolutions[1].entity_id).unwrap();
    // 25 + 25 + 15 + 10 of 100
    assert_eq!(entity.quality().completeness, 75.0);
    assert_eq!(entity.quality().accuracy, 100.0);
}

#[test]
fn test_coverage_after_resolution() {
    let resolver = default_resolver();
    resolver.resolve(&[
        observation(
            "acra",
            SourceClass::Registry,
            day(1),
            &[(FieldName::Identifier, "201512345K"), (FieldName::Industry, "Technology"), (FieldName::Website, "techcorp.sg")],
        ),
        observation(
            "acra",
            SourceClass::Registry,
            day(1),
            &[(FieldName::Identifier, "201598765A"), (FieldName::Industry, "Technology")],
        ),
    ]);

    let coverage = resolver.coverage();
    assert_eq!(coverage.active_entities, 2);
    assert_eq!(coverage.website_coverage, 50.0);
    assert_eq!(coverage.industry_coverage, 100.0);
    assert_eq!(coverage.top_industries, vec![("Technology".to_string(), 2)]);
    resolver.verify_integrity().unwrap();
}

#[test]
fn test_resolution_record_serializes() {
    let resolver = default_resolver();
    let batch = resolver.resolve(&[observation(
        "acra",
        SourceClass::Registry,
        day(1),
        &[(FieldName::Identifier, "bad"), (FieldName::Name, "TechCorp")],
    )]);

    let json = serde_json::to_value(&batch.resolutions[0]).unwrap();
    assert_eq!(json["decision"]["decision"], "no_match");
    assert_eq!(json["issues"][0]["kind"], "malformed_field");
    assert_eq!(json["issues"][0]["field"], "identifier");
}
