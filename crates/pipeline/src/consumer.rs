//! The Consumer Loop (spec.md §4.7): the single thread that drains the
//! four intake queues each cycle and hands every item to the worker
//! pool, which is where the matching processor actually runs (spec.md
//! §2's data-flow line: "consumer loop drains → worker pool executes
//! processors").

use std::sync::Arc;
use std::time::{Duration, Instant};

use intake::IntakeQueues;

use crate::processors::{applied, block, irreversible, transaction, Resources};
use crate::worker_pool::WorkerPool;

const SLOW_BATCH_THRESHOLD: Duration = Duration::from_secs(5);

pub struct Consumer {
    queues: Arc<IntakeQueues>,
    pool: Arc<WorkerPool>,
    resources: Arc<Resources>,
}

impl Consumer {
    pub fn new(queues: Arc<IntakeQueues>, pool: Arc<WorkerPool>, resources: Arc<Resources>) -> Self {
        Self { queues, pool, resources }
    }

    /// Runs until `queues.signal_done()` has been called and a final
    /// drain comes back empty. Intended to be run on its own thread.
    pub fn run(&self) {
        loop {
            let drained = self.queues.drain();
            if drained.total_len() == 0 && self.queues.is_done() {
                return;
            }

            let start = Instant::now();
            self.dispatch(drained);
            let elapsed = start.elapsed();
            if elapsed > SLOW_BATCH_THRESHOLD {
                tracing::warn!(elapsed_ms = elapsed.as_millis(), "consumer batch exceeded 5s");
            }
        }
    }

    /// Enqueues one worker-pool job per drained item, in the fixed
    /// per-cycle dispatch order (spec.md §4.7, §5): trace, meta,
    /// accept, irreversible.
    fn dispatch(&self, drained: intake::Drained) {
        for trace in drained.tx_trace {
            let resources = self.resources.clone();
            self.pool.enqueue(move || applied::process_applied_transaction(&resources, &trace));
        }
        for meta in drained.tx_meta {
            let resources = self.resources.clone();
            self.pool.enqueue(move || transaction::process_accepted_transaction(&resources, &meta));
        }
        for bs in drained.block_state {
            let resources = self.resources.clone();
            self.pool.enqueue(move || block::process_accepted_block(&resources, &bs));
        }
        for bs in drained.irreversible_block_state {
            let resources = self.resources.clone();
            self.pool.enqueue(move || irreversible::process_irreversible_block(&resources, &bs));
        }
    }
}
