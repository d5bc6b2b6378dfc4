//! Error types for corpmatch-resolve
//!
//! Per-observation problems (malformed fields, ambiguous matches, integrity
//! violations while ingesting) are not errors: they are recorded as
//! [`ObservationIssue`](crate::types::ObservationIssue) values on the
//! resolution record. `ResolveError` is reserved for misuse of the explicit
//! operations and for integrity checks requested by the caller.

use crate::types::EntityId;
use thiserror::Error;

/// Resolution error type
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No entity with this identifier exists in the index
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// `reconcile` was asked to merge an entity with itself
    #[error("Cannot reconcile entity {0} with itself")]
    SelfReconcile(EntityId),

    /// The entity was already absorbed by an earlier reconcile
    #[error("Entity {entity} was already merged into {into}")]
    AlreadyMerged { entity: EntityId, into: EntityId },

    /// Two distinct entities would hold one official identifier
    #[error("Identifier collision: {identifier} held by {existing}, claimed by {incoming}")]
    IdentifierCollision {
        identifier: String,
        existing: EntityId,
        incoming: EntityId,
    },

    /// A batch worker task failed to complete
    #[error("Worker error: {0}")]
    Worker(String),

    /// corpmatch-common error
    #[error("Common error: {0}")]
    Common(#[from] corpmatch_common::Error),
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;
