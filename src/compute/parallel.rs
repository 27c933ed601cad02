//! Parallel dispatch of query batches over a fixed worker pool.
//!
//! A batch is cut into contiguous, near-equal sub-batches, one per worker.
//! Workers run concurrently and may finish in any order; each one stores its
//! output in a slot keyed by sub-batch position, and the coordinator only
//! stitches the slots together once every worker has returned. The merged
//! output therefore always follows input order.
//!
//! There is no partial success. If any sub-batch fails, the whole call fails
//! with [`GeocodeError::WorkerFailure`] naming the lowest failing sub-batch.

use crate::error::{GeocodeError, Result};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::ops::Range;

/// Splits `len` items into at most `parts` contiguous ranges whose sizes
/// differ by at most one. Larger ranges come first. No range is empty.
///
/// # Examples
///
/// ```
/// use revgeo::compute::parallel::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..7, 7..10]);
/// assert_eq!(partition(2, 4), vec![0..1, 1..2]);
/// assert!(partition(0, 4).is_empty());
/// ```
pub fn partition(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1).min(len);
    if parts == 0 {
        return Vec::new();
    }

    let base = len / parts;
    let remainder = len % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let size = base + usize::from(i < remainder);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// Runs query batches either inline or across a fixed pool of workers.
pub struct QueryCoordinator {
    pool: Option<ThreadPool>,
    workers: usize,
}

impl QueryCoordinator {
    /// Coordinator that runs every batch on the calling thread.
    pub fn single() -> Self {
        Self {
            pool: None,
            workers: 1,
        }
    }

    /// Coordinator backed by a pool of exactly `workers` threads.
    ///
    /// A single worker needs no pool and behaves like [`QueryCoordinator::single`].
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(GeocodeError::InvalidConfig(
                "Worker count must be greater than zero".to_string(),
            ));
        }
        if workers == 1 {
            return Ok(Self::single());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("revgeo-worker-{}", i))
            .build()
            .map_err(|e| GeocodeError::WorkerPool(e.to_string()))?;

        Ok(Self {
            pool: Some(pool),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Apply `task` to `items` and return the concatenated output in input
    /// order.
    ///
    /// `task` receives a contiguous sub-slice and must return one output per
    /// input item (it is free to return any number; outputs are concatenated
    /// as returned).
    pub fn run<Q, T, F>(&self, items: &[Q], task: F) -> Result<Vec<T>>
    where
        Q: Sync,
        T: Send,
        F: Fn(&[Q]) -> Result<Vec<T>> + Sync,
    {
        let Some(pool) = &self.pool else {
            return task(items);
        };

        let ranges = partition(items.len(), self.workers);
        if ranges.len() <= 1 {
            return task(items);
        }

        log::debug!(
            "Dispatching {} queries across {} sub-batches",
            items.len(),
            ranges.len()
        );

        let slots: Mutex<Vec<Option<Result<Vec<T>>>>> =
            Mutex::new((0..ranges.len()).map(|_| None).collect());

        pool.scope(|scope| {
            for (position, range) in ranges.iter().enumerate() {
                let chunk = &items[range.clone()];
                let slots = &slots;
                let task = &task;
                scope.spawn(move |_| {
                    let output = task(chunk);
                    slots.lock()[position] = Some(output);
                });
            }
        });

        merge(slots.into_inner(), &ranges, items.len())
    }
}

/// Concatenate per-worker outputs in sub-batch order.
fn merge<T>(
    slots: Vec<Option<Result<Vec<T>>>>,
    ranges: &[Range<usize>],
    total: usize,
) -> Result<Vec<T>> {
    let mut merged = Vec::with_capacity(total);

    for (position, (slot, range)) in slots.into_iter().zip(ranges).enumerate() {
        let failure = |source: GeocodeError| {
            log::warn!(
                "Sub-batch {} (queries {}..{}) failed: {}",
                position,
                range.start,
                range.end,
                source
            );
            GeocodeError::WorkerFailure {
                sub_batch: position,
                start: range.start,
                end: range.end,
                source: Box::new(source),
            }
        };

        match slot {
            Some(Ok(output)) => merged.extend(output),
            Some(Err(e)) => return Err(failure(e)),
            None => {
                return Err(failure(GeocodeError::WorkerPool(
                    "worker returned no result".to_string(),
                )));
            }
        }
    }

    Ok(merged)
}

impl fmt::Debug for QueryCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCoordinator")
            .field("workers", &self.workers)
            .field("parallel", &self.is_parallel())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_partition_even() {
        assert_eq!(partition(9, 3), vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn test_partition_uneven() {
        let ranges = partition(11, 4);
        assert_eq!(ranges, vec![0..3, 3..6, 6..9, 9..11]);
    }

    #[test]
    fn test_partition_more_parts_than_items() {
        assert_eq!(partition(3, 8), vec![0..1, 1..2, 2..3]);
        assert!(partition(0, 8).is_empty());
    }

    #[test]
    fn test_partition_covers_everything() {
        for len in 0..50 {
            for parts in 1..9 {
                let ranges = partition(len, parts);
                let covered: Vec<usize> = ranges.iter().flat_map(|r| r.clone()).collect();
                assert_eq!(covered, (0..len).collect::<Vec<_>>());
                assert!(ranges.iter().all(|r| !r.is_empty()));
                if let (Some(max), Some(min)) = (
                    ranges.iter().map(|r| r.len()).max(),
                    ranges.iter().map(|r| r.len()).min(),
                ) {
                    assert!(max - min <= 1);
                }
            }
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            QueryCoordinator::new(0),
            Err(GeocodeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_one_worker_runs_inline() {
        let coordinator = QueryCoordinator::new(1).unwrap();
        assert!(!coordinator.is_parallel());
        let out = coordinator.run(&[1, 2, 3], |chunk| {
            Ok(chunk.iter().map(|v| v * 10).collect())
        });
        assert_eq!(out.unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_order_preserved_when_late_batches_finish_first() {
        let coordinator = QueryCoordinator::new(4).unwrap();
        assert!(coordinator.is_parallel());

        let items: Vec<u64> = (0..40).collect();
        let out = coordinator
            .run(&items, |chunk| {
                // Earlier chunks sleep longer so they complete last.
                let delay = 40 - chunk[0];
                std::thread::sleep(Duration::from_millis(delay));
                Ok(chunk.iter().map(|v| v * 2).collect())
            })
            .unwrap();

        let expected: Vec<u64> = items.iter().map(|v| v * 2).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_parallel_matches_single() {
        let single = QueryCoordinator::single();
        let parallel = QueryCoordinator::new(3).unwrap();
        let items: Vec<i64> = (-50..77).collect();
        let task = |chunk: &[i64]| Ok(chunk.iter().map(|v| v * v - 3).collect::<Vec<_>>());

        assert_eq!(
            single.run(&items, task).unwrap(),
            parallel.run(&items, task).unwrap()
        );
    }

    #[test]
    fn test_failure_identifies_sub_batch() {
        let coordinator = QueryCoordinator::new(4).unwrap();
        let items: Vec<i32> = (0..20).collect();

        let err = coordinator
            .run(&items, |chunk| {
                if chunk.contains(&12) {
                    Err(GeocodeError::parse("lat", "bad"))
                } else {
                    Ok(chunk.to_vec())
                }
            })
            .unwrap_err();

        match err {
            GeocodeError::WorkerFailure {
                sub_batch,
                start,
                end,
                source,
            } => {
                assert_eq!(sub_batch, 2);
                assert_eq!((start, end), (10, 15));
                assert!(matches!(*source, GeocodeError::Parse { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_lowest_failing_sub_batch_reported() {
        let coordinator = QueryCoordinator::new(4).unwrap();
        let items: Vec<i32> = (0..8).collect();

        let err = coordinator
            .run(&items, |chunk| {
                if chunk[0] >= 2 {
                    Err::<Vec<i32>, _>(GeocodeError::EmptyIndex)
                } else {
                    Ok(chunk.to_vec())
                }
            })
            .unwrap_err();

        assert!(matches!(
            err,
            GeocodeError::WorkerFailure { sub_batch: 1, start: 2, end: 4, .. }
        ));
    }

    #[test]
    fn test_empty_batch() {
        let coordinator = QueryCoordinator::new(2).unwrap();
        let items: Vec<u8> = Vec::new();
        let out = coordinator.run(&items, |chunk| Ok(chunk.to_vec())).unwrap();
        assert!(out.is_empty());
    }
}
