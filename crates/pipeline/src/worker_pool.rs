//! Fixed-size FIFO task executor with its own adaptive-sleep
//! backpressure (spec.md §4.8), mirroring `intake::Backpressure` at the
//! CPU-bound layer rather than the intake-queue layer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use intake::Backpressure;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads draining one shared FIFO job
/// queue (spec.md §4.8). `enqueue` applies the same adaptive-sleep
/// policy as the intake queues before pushing, so a consumer that
/// floods the pool backs off instead of growing its queue unbounded.
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    queue_size: Arc<AtomicUsize>,
    backpressure: Backpressure,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize, max_task_queue_size: usize) -> Self {
        assert!(size > 0, "worker pool size must be greater than 0");
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let queue_size = Arc::new(AtomicUsize::new(0));

        let workers = (0..size)
            .map(|id| {
                let receiver = receiver.clone();
                let queue_size = queue_size.clone();
                std::thread::Builder::new()
                    .name(format!("pipeline-worker-{id}"))
                    .spawn(move || {
                        loop {
                            let job = {
                                let guard = receiver.lock().unwrap();
                                guard.recv()
                            };
                            match job {
                                Ok(job) => {
                                    job();
                                    queue_size.fetch_sub(1, Ordering::SeqCst);
                                }
                                Err(_) => break,
                            }
                        }
                    })
                    .expect("failed to spawn pipeline worker thread")
            })
            .collect();

        Self {
            sender,
            queue_size,
            backpressure: Backpressure::new(max_task_queue_size),
            workers,
        }
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size.load(Ordering::SeqCst)
    }

    pub fn current_sleep_ms(&self) -> i64 {
        self.backpressure.current_sleep_ms()
    }

    /// Applies `check_task_queue_size()` (spec.md §4.8) then submits
    /// `job` to the pool.
    pub fn enqueue(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(sleep_for) = self.backpressure.observe(self.queue_size()) {
            std::thread::sleep(sleep_for);
        }
        self.queue_size.fetch_add(1, Ordering::SeqCst);
        // The receiving end only goes away once every worker thread has
        // exited, which only happens after `join` below; a send here
        // can't outlive its receiver within this type's own lifecycle.
        let _ = self.sender.send(Box::new(job));
    }

    /// Drops the sender (unblocking every worker's `recv()`) and joins
    /// all worker threads, draining any jobs already queued.
    pub fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}
