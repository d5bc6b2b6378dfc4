//! Parallel batch pool
//!
//! Runs disjoint batches on a fixed number of workers. Each worker is a
//! blocking task calling the shared [`Resolver`], whose index lock keeps
//! every single-observation commit atomic across workers.
//!
//! # Architecture
//! - `workers` concurrent batches via `futures::stream::buffer_unordered`
//! - Each batch runs on `tokio::task::spawn_blocking` (resolution never awaits)
//! - Cancellation is checked between observations; an observation already
//!   being committed always completes

use crate::error::{ResolveError, ResolveResult};
use crate::resolver::{BatchResolution, Resolver};
use crate::types::RawObservation;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outcome of one batch run by the pool
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Position of the batch in the input list
    pub batch_index: usize,
    pub resolution: BatchResolution,
}

pub struct BatchPool {
    resolver: Arc<Resolver>,
    workers: usize,
}

impl BatchPool {
    /// Pool sized by the resolver's `workers` setting
    pub fn new(resolver: Arc<Resolver>) -> Self {
        let workers = resolver.settings().workers;
        Self::with_workers(resolver, workers)
    }

    pub fn with_workers(resolver: Arc<Resolver>, workers: usize) -> Self {
        Self {
            resolver,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Resolve every batch; reports come back ordered by `batch_index`
    pub async fn run(
        &self,
        batches: Vec<Vec<RawObservation>>,
        cancel: CancellationToken,
    ) -> ResolveResult<Vec<BatchReport>> {
        let total = batches.len();
        info!(batches = total, workers = self.workers, "Starting batch pool");

        let results: Vec<ResolveResult<BatchReport>> = stream::iter(batches.into_iter().enumerate())
            .map(|(batch_index, batch)| {
                let resolver = Arc::clone(&self.resolver);
                let cancel = cancel.clone();

                async move {
                    debug!(batch_index, observations = batch.len(), "Worker starting batch");
                    let resolution = tokio::task::spawn_blocking(move || {
                        resolver.resolve_cancellable(&batch, &cancel)
                    })
                    .await
                    .map_err(|e| ResolveError::Worker(format!("batch {} failed: {}", batch_index, e)))?;

                    Ok::<_, ResolveError>(BatchReport {
                        batch_index,
                        resolution,
                    })
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut reports = results.into_iter().collect::<ResolveResult<Vec<_>>>()?;
        reports.sort_by_key(|r| r.batch_index);

        let cancelled = reports.iter().filter(|r| r.resolution.cancelled).count();
        info!(batches = total, cancelled, "Batch pool finished");
        Ok(reports)
    }
}

/// Split observations into consecutive batches of at most `batch_size`
pub fn chunk_batches(observations: Vec<RawObservation>, batch_size: usize) -> Vec<Vec<RawObservation>> {
    let size = batch_size.max(1);
    let mut batches = Vec::with_capacity(observations.len().div_ceil(size));
    let mut iter = observations.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(size).collect());
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldName, SourceClass};

    fn observations(n: usize) -> Vec<RawObservation> {
        (0..n)
            .map(|i| {
                RawObservation::new("test", SourceClass::Discovery, corpmatch_common::time::now())
                    .with_field(FieldName::Name, format!("Company {}", i))
            })
            .collect()
    }

    #[test]
    fn test_chunk_batches() {
        let batches = chunk_batches(observations(7), 3);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert!(chunk_batches(Vec::new(), 3).is_empty());
        assert_eq!(chunk_batches(observations(2), 0).len(), 2);
    }

    #[test]
    fn test_pool_uses_configured_workers() {
        let resolver = Arc::new(Resolver::new(corpmatch_common::ResolverSettings::default()).unwrap());
        assert_eq!(BatchPool::new(Arc::clone(&resolver)).workers(), 4);
        assert_eq!(BatchPool::with_workers(resolver, 0).workers(), 1);
    }
}
