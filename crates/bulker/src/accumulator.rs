use std::sync::{Arc, Mutex};

use search_client::SearchBackend;

/// Invoked when a flush hits an error the spec treats as fatal
/// (`Connection`, `ResponseCode`, `Decode`) — the closest analogue of
/// requesting the embedding host shut the process down. `BulkErrors`
/// is handled inline as a non-fatal dropped batch and never reaches
/// this callback.
pub type FatalHandler = Arc<dyn Fn(&search_client::Error) + Send + Sync>;

fn default_fatal_handler() -> FatalHandler {
    Arc::new(|err| tracing::error!(error = %err, "unhandled fatal search engine error"))
}

/// A protected byte buffer that flushes to the search engine once its
/// size crosses `bulk_size` bytes (spec.md §4.2).
///
/// The body lock and the client lock are deliberately separate: a
/// flush holds only the client lock while the underlying HTTP call is
/// in flight, so appenders on other threads are never blocked by it —
/// they only ever contend on the (much cheaper) body lock.
pub struct Accumulator {
    bulk_size: usize,
    body: Mutex<String>,
    client_lock: Mutex<()>,
    backend: Arc<dyn SearchBackend>,
    on_fatal: FatalHandler,
}

impl Accumulator {
    pub fn new(bulk_size: usize, backend: Arc<dyn SearchBackend>) -> Self {
        Self::with_fatal_handler(bulk_size, backend, default_fatal_handler())
    }

    pub fn with_fatal_handler(
        bulk_size: usize,
        backend: Arc<dyn SearchBackend>,
        on_fatal: FatalHandler,
    ) -> Self {
        Self {
            bulk_size,
            body: Mutex::new(String::new()),
            client_lock: Mutex::new(()),
            backend,
            on_fatal,
        }
    }

    /// Current buffered size in bytes.
    pub fn size(&self) -> usize {
        self.body.lock().unwrap().len()
    }

    /// Append one `action_line`/`source_line` pair. If this crosses
    /// `bulk_size`, detaches the buffer and flushes it synchronously
    /// on the calling thread.
    pub fn append(&self, action_line: &str, source_line: &str) {
        let detached = {
            let mut body = self.body.lock().unwrap();
            body.push_str(action_line);
            body.push('\n');
            body.push_str(source_line);
            body.push('\n');
            if body.len() >= self.bulk_size {
                Some(std::mem::take(&mut *body))
            } else {
                None
            }
        };

        if let Some(buf) = detached {
            self.perform(buf);
        }
    }

    fn perform(&self, buf: String) {
        let _guard = self.client_lock.lock().unwrap();
        if let Err(err) = self.backend.bulk(&buf) {
            self.handle_error(err);
        }
    }

    fn handle_error(&self, err: search_client::Error) {
        match &err {
            search_client::Error::BulkErrors { .. } => {
                tracing::warn!(error = %err, "bulk request reported partial failures, dropping batch");
            }
            _ => {
                tracing::error!(error = %err, "fatal error flushing bulker");
                (self.on_fatal)(&err);
            }
        }
    }
}

impl Drop for Accumulator {
    fn drop(&mut self) {
        let remaining = std::mem::take(self.body.get_mut().unwrap());
        if !remaining.is_empty() {
            tracing::debug!(bytes = remaining.len(), "draining bulker on shutdown");
            self.perform(remaining);
        }
    }
}
