//! Core Types for corpmatch-resolve
//!
//! Defines the data model shared by every stage of the resolution pipeline:
//! - **Input:** [`RawObservation`] (one source's view of one company)
//! - **Matching:** [`MatchDecision`], [`MatchConfidence`], [`MatchTier`]
//! - **Merged state:** [`CanonicalEntity`], [`FieldProvenance`], [`QualityScore`]
//! - **Audit:** [`Resolution`], [`ObservationIssue`]
//!
//! # Architecture
//! raw observation → match against index → merge into canonical entity →
//! quality scoring → index update

use chrono::{DateTime, Utc};
use corpmatch_common::config::SourceConfidence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Fields and Sources
// ============================================================================

/// Company fields the resolver understands; other keys are reported, not merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Official registry identifier (UEN-equivalent)
    Identifier,
    Name,
    Website,
    ContactEmail,
    ContactPhone,
    /// Industry label supplied by the enrichment layer
    Industry,
    /// Enrichment confidence (0-100) for the industry label
    IndustryConfidence,
    EmployeeCount,
    /// Small / Medium / Large / Unknown
    CompanySize,
    FoundingYear,
    Linkedin,
    Facebook,
    Instagram,
    ServicesOffered,
    ProductsOffered,
    Keywords,
    HqCountry,
    StockExchangeCode,
    IsDelisted,
    /// Registry status; a company leaving the registry is marked here, never removed
    Status,
    /// Free-text revenue as reported, e.g. "SGD 5M"
    Revenue,
    #[serde(rename = "no_of_locations_in_singapore")]
    LocationsInSingapore,
}

impl FieldName {
    /// Every field, in canonical order
    pub const ALL: [FieldName; 22] = [
        FieldName::Identifier,
        FieldName::Name,
        FieldName::Website,
        FieldName::ContactEmail,
        FieldName::ContactPhone,
        FieldName::Industry,
        FieldName::IndustryConfidence,
        FieldName::EmployeeCount,
        FieldName::CompanySize,
        FieldName::FoundingYear,
        FieldName::Linkedin,
        FieldName::Facebook,
        FieldName::Instagram,
        FieldName::ServicesOffered,
        FieldName::ProductsOffered,
        FieldName::Keywords,
        FieldName::HqCountry,
        FieldName::StockExchangeCode,
        FieldName::IsDelisted,
        FieldName::Status,
        FieldName::Revenue,
        FieldName::LocationsInSingapore,
    ];

    /// Social-profile link fields
    pub const SOCIAL: [FieldName; 3] =
        [FieldName::Linkedin, FieldName::Facebook, FieldName::Instagram];

    /// Snake-case field name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Identifier => "identifier",
            FieldName::Name => "name",
            FieldName::Website => "website",
            FieldName::ContactEmail => "contact_email",
            FieldName::ContactPhone => "contact_phone",
            FieldName::Industry => "industry",
            FieldName::IndustryConfidence => "industry_confidence",
            FieldName::EmployeeCount => "employee_count",
            FieldName::CompanySize => "company_size",
            FieldName::FoundingYear => "founding_year",
            FieldName::Linkedin => "linkedin",
            FieldName::Facebook => "facebook",
            FieldName::Instagram => "instagram",
            FieldName::ServicesOffered => "services_offered",
            FieldName::ProductsOffered => "products_offered",
            FieldName::Keywords => "keywords",
            FieldName::HqCountry => "hq_country",
            FieldName::StockExchangeCode => "stock_exchange_code",
            FieldName::IsDelisted => "is_delisted",
            FieldName::Status => "status",
            FieldName::Revenue => "revenue",
            FieldName::LocationsInSingapore => "no_of_locations_in_singapore",
        }
    }

    /// Fields holding a URL
    pub fn is_url(&self) -> bool {
        matches!(
            self,
            FieldName::Website | FieldName::Linkedin | FieldName::Facebook | FieldName::Instagram
        )
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unrecognized field '{}'", s))
    }
}

/// Field name → value mapping
pub type FieldMap = BTreeMap<FieldName, String>;

/// Class of data origin; each class maps to a configured reliability confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    /// Official government registry
    Registry,
    /// The company's own website
    Website,
    /// A social-media profile
    SocialProfile,
    /// Automated discovery (search results, crawls)
    Discovery,
}

impl SourceClass {
    /// Reliability confidence for this class from the configured table
    pub fn confidence(&self, table: &SourceConfidence) -> u8 {
        match self {
            SourceClass::Registry => table.registry,
            SourceClass::Website => table.website,
            SourceClass::SocialProfile => table.social_profile,
            SourceClass::Discovery => table.discovery,
        }
    }
}

// ============================================================================
// Raw Observation
// ============================================================================

/// One set of facts about a company as reported by exactly one source
///
/// Built once by the acquisition layer and read-only afterwards: the
/// resolver only ever borrows observations and never mutates them.
///
/// Field keys outside [`FieldName`] do not reject the record. They are
/// kept aside, serialized back under `fields`, and reported during
/// preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ObservationRecord", into = "ObservationRecord")]
pub struct RawObservation {
    observation_id: Uuid,
    source_id: String,
    source_class: SourceClass,
    fields: FieldMap,
    unrecognized_fields: BTreeMap<String, String>,
    observed_at: DateTime<Utc>,
}

/// Wire form of [`RawObservation`] with string field keys
#[derive(Serialize, Deserialize)]
struct ObservationRecord {
    observation_id: Uuid,
    source_id: String,
    source_class: SourceClass,
    fields: BTreeMap<String, String>,
    observed_at: DateTime<Utc>,
}

impl From<ObservationRecord> for RawObservation {
    fn from(record: ObservationRecord) -> Self {
        let mut fields = FieldMap::new();
        let mut unrecognized_fields = BTreeMap::new();
        for (key, value) in record.fields {
            match key.parse::<FieldName>() {
                Ok(field) => {
                    fields.insert(field, value);
                }
                Err(_) => {
                    unrecognized_fields.insert(key, value);
                }
            }
        }
        Self {
            observation_id: record.observation_id,
            source_id: record.source_id,
            source_class: record.source_class,
            fields,
            unrecognized_fields,
            observed_at: record.observed_at,
        }
    }
}

impl From<RawObservation> for ObservationRecord {
    fn from(obs: RawObservation) -> Self {
        let mut fields = obs.unrecognized_fields;
        fields.extend(obs.fields.into_iter().map(|(f, v)| (f.as_str().to_string(), v)));
        Self {
            observation_id: obs.observation_id,
            source_id: obs.source_id,
            source_class: obs.source_class,
            fields,
            observed_at: obs.observed_at,
        }
    }
}

impl RawObservation {
    /// Create an observation with no fields and a fresh identifier
    pub fn new(
        source_id: impl Into<String>,
        source_class: SourceClass,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            observation_id: corpmatch_common::uuid_utils::generate(),
            source_id: source_id.into(),
            source_class,
            fields: FieldMap::new(),
            unrecognized_fields: BTreeMap::new(),
            observed_at,
        }
    }

    /// Builder: add one field value
    pub fn with_field(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn observation_id(&self) -> Uuid {
        self.observation_id
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn source_class(&self) -> SourceClass {
        self.source_class
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, field: FieldName) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Keys the resolver has no [`FieldName`] for, with their values
    pub fn unrecognized_fields(&self) -> &BTreeMap<String, String> {
        &self.unrecognized_fields
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

// ============================================================================
// Canonical Entity
// ============================================================================

/// Stable internal identifier of a canonical entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub(crate) fn generate() -> Self {
        Self(corpmatch_common::uuid_utils::generate())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntityId {
    type Err = corpmatch_common::Error;

    /// Parse an id previously rendered with `Display`, e.g. by a storage layer
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        corpmatch_common::uuid_utils::parse(s)
            .map(Self)
            .map_err(|e| corpmatch_common::Error::InvalidInput(format!("entity id '{}': {}", s, e)))
    }
}

/// Which source supplied the current value of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProvenance {
    pub source_id: String,
    pub source_class: SourceClass,
    /// Reliability confidence (0-100) recorded when the value was adopted
    pub confidence: u8,
    /// Timestamp of the observation that supplied the value
    pub observed_at: DateTime<Utc>,
    pub observation_id: Uuid,
}

/// The merged, de-duplicated record for one real-world company
///
/// Fields are private: values change only through the merge engine, which
/// recomputes the quality score as its last step, so a stale score can
/// never be read after a merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEntity {
    id: EntityId,
    fields: FieldMap,
    provenance: BTreeMap<FieldName, FieldProvenance>,
    /// Every observation folded into this entity, duplicates included
    contributing_observations: Vec<Uuid>,
    quality: QualityScore,
    /// Set when `reconcile` absorbed this entity into another one
    merged_into: Option<EntityId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CanonicalEntity {
    pub(crate) fn new() -> Self {
        let now = corpmatch_common::time::now();
        Self {
            id: EntityId::generate(),
            fields: FieldMap::new(),
            provenance: BTreeMap::new(),
            contributing_observations: Vec::new(),
            quality: QualityScore::default(),
            merged_into: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, field: FieldName) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn provenance(&self, field: FieldName) -> Option<&FieldProvenance> {
        self.provenance.get(&field)
    }

    pub fn provenance_map(&self) -> &BTreeMap<FieldName, FieldProvenance> {
        &self.provenance
    }

    pub fn identifier(&self) -> Option<&str> {
        self.field(FieldName::Identifier)
    }

    pub fn name(&self) -> Option<&str> {
        self.field(FieldName::Name)
    }

    pub fn website(&self) -> Option<&str> {
        self.field(FieldName::Website)
    }

    pub fn contributing_observations(&self) -> &[Uuid] {
        &self.contributing_observations
    }

    pub fn quality(&self) -> &QualityScore {
        &self.quality
    }

    pub fn merged_into(&self) -> Option<EntityId> {
        self.merged_into
    }

    /// False once the entity has been absorbed by `reconcile`
    pub fn is_active(&self) -> bool {
        self.merged_into.is_none()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn set_field(&mut self, field: FieldName, value: String, provenance: FieldProvenance) {
        self.fields.insert(field, value);
        self.provenance.insert(field, provenance);
        self.updated_at = corpmatch_common::time::now();
    }

    pub(crate) fn record_observation(&mut self, observation_id: Uuid) {
        self.contributing_observations.push(observation_id);
    }

    pub(crate) fn set_quality(&mut self, quality: QualityScore) {
        self.quality = quality;
    }

    pub(crate) fn mark_merged_into(&mut self, survivor: EntityId) {
        self.merged_into = Some(survivor);
        self.updated_at = corpmatch_common::time::now();
    }
}

// ============================================================================
// Quality
// ============================================================================

/// Overall review status derived from the sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    /// Meets thresholds, no consistency violations
    Pass,
    /// Meets thresholds but at least one cross-field check failed
    Warning,
    /// Completeness or accuracy below the configured minimum
    #[default]
    Fail,
}

/// Data quality of a canonical entity's current field set
///
/// Sub-scores are in 0-100. Always derived from the entity it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub completeness: f32,
    pub accuracy: f32,
    pub consistency: f32,
    /// Unweighted mean of the three sub-scores, rounded
    pub composite: u8,
    pub status: QualityStatus,
    /// Human-readable findings behind the sub-scores
    pub issues: Vec<String>,
}

// ============================================================================
// Matching
// ============================================================================

/// Matching tier, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Identifier,
    Domain,
    FuzzyName,
}

/// Confidence level of the tier that produced a match decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    None,
    /// Name similarity at or above threshold
    Probable,
    /// Same normalized website host
    High,
    /// Same official identifier
    Authoritative,
}

/// Outcome of comparing one observation against the entity index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum MatchDecision {
    ExactIdentifierMatch,
    DomainMatch,
    FuzzyNameMatch {
        /// Composite similarity (0-100)
        score: u8,
        /// Several entities tied at the best score; the earliest-created won
        ambiguous: bool,
    },
    /// The observation id is already in this entity's audit list
    KnownObservation,
    NoMatch,
}

impl MatchDecision {
    /// Confidence level carried by this decision
    pub fn confidence(&self) -> MatchConfidence {
        match self {
            MatchDecision::ExactIdentifierMatch | MatchDecision::KnownObservation => {
                MatchConfidence::Authoritative
            }
            MatchDecision::DomainMatch => MatchConfidence::High,
            MatchDecision::FuzzyNameMatch { .. } => MatchConfidence::Probable,
            MatchDecision::NoMatch => MatchConfidence::None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, MatchDecision::NoMatch)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MatchDecision::FuzzyNameMatch { ambiguous: true, .. })
    }
}

// ============================================================================
// Audit
// ============================================================================

/// A non-fatal problem found while resolving one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservationIssue {
    /// Field value failed its format check and was dropped
    MalformedField {
        field: FieldName,
        value: String,
        reason: String,
    },
    /// Field key outside the known set; the value was not merged
    UnrecognizedField { field: String, value: String },
    /// More than one entity qualified at a tier
    AmbiguousMatch {
        tier: MatchTier,
        candidates: Vec<EntityId>,
    },
    /// Committing the merge would give two entities one identifier; nothing was committed
    IdentifierCollision { identifier: String, holder: EntityId },
}

/// Audit record for one resolved observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub observation_id: Uuid,
    /// Entity the observation was matched to or seeded
    pub entity_id: EntityId,
    pub decision: MatchDecision,
    pub confidence: MatchConfidence,
    /// A new canonical entity was created for this observation
    pub created: bool,
    /// False only when an integrity violation blocked the commit
    pub committed: bool,
    /// Fields whose value or provenance changed
    pub changed_fields: Vec<FieldName>,
    pub issues: Vec<ObservationIssue>,
}
