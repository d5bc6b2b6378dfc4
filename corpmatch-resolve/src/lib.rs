//! # corpmatch Resolve Library
//!
//! Company entity resolution and data-quality scoring.
//!
//! Raw observations from registries, websites, social profiles and discovery
//! crawls are matched against a canonical entity index (identifier, then
//! website domain, then fuzzy name), merged field by field according to
//! source reliability, and scored for completeness, accuracy and
//! consistency.
//!
//! # Example
//! ```rust,ignore
//! use corpmatch_resolve::{FieldName, RawObservation, Resolver, SourceClass};
//!
//! let resolver = Resolver::new(config.resolver)?;
//! let batch = resolver.resolve(&[
//!     RawObservation::new("acra", SourceClass::Registry, observed_at)
//!         .with_field(FieldName::Identifier, "201512345K")
//!         .with_field(FieldName::Name, "TechCorp Pte Ltd"),
//! ]);
//! ```

pub mod error;
pub mod fusion;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod observation;
pub mod resolver;
pub mod rules;
pub mod similarity;
pub mod types;
pub mod validators;
pub mod workers;

pub use error::{ResolveError, ResolveResult};
pub use index::{CoverageReport, EntityIndex};
pub use matcher::{IdentityMatcher, MatchOutcome};
pub use resolver::{BatchResolution, MatchingReport, ReconcileOutcome, Resolver};
pub use types::{
    CanonicalEntity, EntityId, FieldMap, FieldName, FieldProvenance, MatchConfidence,
    MatchDecision, MatchTier, ObservationIssue, QualityScore, QualityStatus, RawObservation,
    Resolution, SourceClass,
};
pub use workers::{chunk_batches, BatchPool, BatchReport};
