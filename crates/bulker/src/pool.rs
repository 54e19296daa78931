use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use search_client::SearchBackend;

use crate::accumulator::{Accumulator, FatalHandler};
use crate::error::{Error, Result};

/// A fixed-size ring of accumulators with load-shedding round-robin
/// selection (spec.md §4.3).
pub struct BulkerPool {
    bulkers: Vec<Arc<Accumulator>>,
    bulk_size: usize,
    index: AtomicUsize,
}

impl BulkerPool {
    pub fn new(pool_size: usize, bulk_size: usize, backend: Arc<dyn SearchBackend>) -> Self {
        let bulkers = (0..pool_size)
            .map(|_| Arc::new(Accumulator::new(bulk_size, backend.clone())))
            .collect();
        Self {
            bulkers,
            bulk_size,
            index: AtomicUsize::new(0),
        }
    }

    pub fn with_fatal_handler(
        pool_size: usize,
        bulk_size: usize,
        backend: Arc<dyn SearchBackend>,
        on_fatal: FatalHandler,
    ) -> Self {
        let bulkers = (0..pool_size)
            .map(|_| Arc::new(Accumulator::with_fatal_handler(bulk_size, backend.clone(), on_fatal.clone())))
            .collect();
        Self {
            bulkers,
            bulk_size,
            index: AtomicUsize::new(0),
        }
    }

    /// Returns the currently-selected accumulator, advancing the ring
    /// if it is already at or above `bulk_size` — traffic migrates to
    /// the next accumulator while the full one drains.
    pub fn get(&self) -> Result<Arc<Accumulator>> {
        let pool_size = self.bulkers.len();
        if pool_size == 0 {
            return Err(Error::EmptyPool);
        }

        let cur_idx = self.index.load(Ordering::Relaxed) % pool_size;
        let current = &self.bulkers[cur_idx];

        if current.size() >= self.bulk_size {
            let next_idx = (cur_idx + 1) % pool_size;
            self.index.store(next_idx, Ordering::Relaxed);
            Ok(self.bulkers[next_idx].clone())
        } else {
            Ok(current.clone())
        }
    }
}
