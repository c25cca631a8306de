//! # Multi-Worker Distribution
//!
//! Splits an assembled [`Batch`] into contiguous per-worker chunks along the
//! batch axis. Labels are sparse-encoded per chunk, after the split.

use crate::{
    assembly::Batch,
    errors::{CFResult, CtcFeedError},
};

/// Partitions a batch across workers.
pub trait Distributor: Send + Sync {
    /// Split `batch` into per-worker chunks.
    ///
    /// Chunks are contiguous, in batch order, and non-empty; their
    /// concatenation must reproduce `batch`.
    fn distribute(
        &self,
        batch: Batch,
        num_workers: usize,
    ) -> CFResult<Vec<Batch>>;
}

/// Chunk sizes for splitting `len` examples across `num_workers`.
///
/// Even splits when `len % num_workers == 0`; otherwise sizes differ by at most
/// one, larger chunks first. Never returns an empty chunk.
pub fn chunk_sizes(
    len: usize,
    num_workers: usize,
) -> Vec<usize> {
    let chunks = num_workers.min(len);
    if chunks == 0 {
        return Vec::new();
    }
    let (base, extra) = (len / chunks, len % chunks);
    (0..chunks)
        .map(|i| base + usize::from(i < extra))
        .collect()
}

/// The in-process [`Distributor`]: copies each chunk out of the batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkDistributor;

impl Distributor for ChunkDistributor {
    fn distribute(
        &self,
        batch: Batch,
        num_workers: usize,
    ) -> CFResult<Vec<Batch>> {
        if num_workers == 0 {
            return Err(CtcFeedError::Configuration(
                "num_workers must be >= 1".to_string(),
            ));
        }
        if batch.is_empty() {
            return Err(CtcFeedError::InvalidBatch(
                "cannot distribute an empty batch".to_string(),
            ));
        }
        if num_workers == 1 {
            return Ok(vec![batch]);
        }

        if !batch.len().is_multiple_of(num_workers) {
            log::debug!(
                "uneven split of {} examples across {num_workers} workers",
                batch.len()
            );
        }

        let mut start = 0;
        Ok(chunk_sizes(batch.len(), num_workers)
            .into_iter()
            .map(|size| {
                let chunk = batch.slice_rows(start, start + size);
                start += size;
                chunk
            })
            .collect())
    }
}
