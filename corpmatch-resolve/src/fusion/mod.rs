//! Field fusion
//!
//! Folds prepared observations (and, for `reconcile`, whole entities) into
//! canonical entities field by field, keeping one provenance per field.

pub mod merge_engine;

pub use merge_engine::{should_replace, MergeEngine};
