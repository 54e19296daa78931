//! The `Pipeline` facade (SPEC_FULL.md §1): owns the intake queues,
//! worker pool, bulker pool, ABI cache and filter, and exposes the
//! four entry points a host calls from its own signal-dispatch thread.

use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::thread::JoinHandle;

use abi_cache::{AbiCache, AbiRenderer};
use bulker::BulkerPool;
use intake::IntakeQueues;
use model::{docs, mappings, name::SYSTEM_ACCOUNT, now_millis, BlockState, TransactionMetadata, TransactionTrace};
use search_client::{HttpSearchClient, SearchBackend};

use crate::config::PluginConfig;
use crate::consumer::Consumer;
use crate::error::Result;
use crate::native_decode::NativeActionDecoder;
use crate::processors::{NoopSigningKeyRecoverer, Resources, SigningKeyRecoverer, StartGate};
use crate::worker_pool::WorkerPool;

/// Invoked when a fatal search-engine error (`Connection`,
/// `ResponseCode`) is observed — the host's cue to terminate the
/// embedding process, the closest analogue of `app().quit()` without
/// assuming a process-global singleton (SPEC_FULL.md §7 addendum).
pub type ShutdownRequested = Arc<dyn Fn(String) + Send + Sync>;

/// Logging-only fallback for hosts (and tests) that don't need their
/// own shutdown hook.
pub fn default_shutdown_requested() -> ShutdownRequested {
    Arc::new(|reason| tracing::error!(%reason, "fatal search engine error; host should shut down"))
}

/// Collaborators a host wires in at construction time, standing in for
/// the node SDK's own ABI-aware serializer, native action unpacker,
/// and signing-key recovery (spec.md §1's "out of scope" list).
pub struct Collaborators {
    pub renderer: Arc<dyn AbiRenderer>,
    pub native_decoder: Arc<dyn NativeActionDecoder>,
    pub signing_key_recoverer: Arc<dyn SigningKeyRecoverer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            renderer: Arc::new(abi_cache::OpaqueRenderer),
            native_decoder: Arc::new(crate::native_decode::JsonNativeDecoder),
            signing_key_recoverer: Arc::new(NoopSigningKeyRecoverer),
        }
    }
}

pub struct Pipeline {
    config: PluginConfig,
    backend: Arc<dyn SearchBackend>,
    queues: Arc<IntakeQueues>,
    pool: Arc<WorkerPool>,
    consumer_handle: Option<JoinHandle<()>>,
}

impl Pipeline {
    pub fn new(config: PluginConfig, collaborators: Collaborators, on_shutdown_requested: ShutdownRequested) -> Result<Self> {
        config.validate()?;
        let url = url::Url::parse(&config.normalized_url()).map_err(search_client::Error::from)?;
        let backend: Arc<dyn SearchBackend> =
            Arc::new(HttpSearchClient::new(vec![url], config.user.clone(), config.password.clone())?);
        Self::with_backend(config, backend, collaborators, on_shutdown_requested)
    }

    /// Constructs a `Pipeline` against an arbitrary `SearchBackend`
    /// (the in-memory fake in tests, or a real `HttpSearchClient` via
    /// [`Pipeline::new`]).
    pub fn with_backend(
        config: PluginConfig,
        backend: Arc<dyn SearchBackend>,
        collaborators: Collaborators,
        on_shutdown_requested: ShutdownRequested,
    ) -> Result<Self> {
        config.validate()?;
        let filter = Arc::new(config.build_filter()?);
        let abi_cache = Arc::new(AbiCache::new(backend.clone(), config.abi_cache_size));

        let on_shutdown_requested_for_bulker = on_shutdown_requested.clone();
        let fatal_handler: bulker::FatalHandler =
            Arc::new(move |err: &search_client::Error| on_shutdown_requested_for_bulker(err.to_string()));
        let bulkers = Arc::new(BulkerPool::with_fatal_handler(
            config.bulker_pool_size,
            config.bulk_size_bytes(),
            backend.clone(),
            fatal_handler,
        ));

        let resources = Arc::new(Resources {
            bulkers,
            abi_cache,
            renderer: collaborators.renderer,
            filter,
            native_decoder: collaborators.native_decoder,
            signing_key_recoverer: collaborators.signing_key_recoverer,
            system_account: SYSTEM_ACCOUNT,
            max_decode_time: std::time::Duration::from_millis(config.abi_serializer_max_time_ms),
            start_gate: StartGate::new(config.block_start),
            store_blocks: config.store_blocks,
            store_block_states: config.store_block_states,
            store_transactions: config.store_transactions,
            store_transaction_traces: config.store_transaction_traces,
            store_action_traces: config.store_action_traces,
            emitted: AtomicU32::new(0),
        });

        let queues = Arc::new(IntakeQueues::new(config.queue_size));
        let pool = Arc::new(WorkerPool::new(config.thread_pool_size, config.queue_size));

        let consumer = Consumer::new(queues.clone(), pool.clone(), resources);
        let consumer_handle = std::thread::Builder::new()
            .name("pipeline-consumer".to_string())
            .spawn(move || consumer.run())
            .expect("failed to spawn pipeline consumer thread");

        Ok(Self {
            config,
            backend,
            queues,
            pool,
            consumer_handle: Some(consumer_handle),
        })
    }

    /// Creates the six indices idempotently, then seeds a system
    /// account document if `accounts` is empty (SPEC_FULL.md §4
    /// addendum).
    pub fn init(&self) -> Result<()> {
        for index in docs::ALL_INDICES {
            self.backend.init_index(index, mappings::mapping_for(index))?;
        }
        if self.backend.count(docs::ACCOUNTS, None)? == 0 {
            let doc = serde_json::json!({
                "name": SYSTEM_ACCOUNT.to_display_string(),
                "createAt": now_millis(),
            });
            self.backend
                .create(docs::ACCOUNTS, &doc.to_string(), &docs::account_doc_id(SYSTEM_ACCOUNT))?;
        }
        Ok(())
    }

    /// Deletes all six indices then re-runs `init()`. Requires
    /// `index_wipe` plus the host's own replay-flag confirmation
    /// (spec.md §6).
    pub fn wipe(&self, host_replay_flags_set: bool) -> Result<()> {
        self.config.check_wipe_allowed(host_replay_flags_set)?;
        for index in docs::ALL_INDICES {
            self.backend.delete_index(index)?;
        }
        self.init()
    }

    pub fn on_accepted_block(&self, block_state: Arc<BlockState>) {
        self.queues.enqueue_block_state(block_state);
    }

    pub fn on_irreversible_block(&self, block_state: Arc<BlockState>) {
        self.queues.enqueue_irreversible_block_state(block_state);
    }

    pub fn on_accepted_transaction(&self, metadata: Arc<TransactionMetadata>) {
        self.queues.enqueue_tx_meta(metadata);
    }

    pub fn on_applied_transaction(&self, trace: Arc<TransactionTrace>) {
        self.queues.enqueue_tx_trace(trace);
    }

    /// Signals `done`, joins the consumer thread (which drains the
    /// remaining queues and worker-pool backlog on its last cycle per
    /// spec.md §5), then shuts down the worker pool, which flushes
    /// every bulker's residual buffer via `Drop` (spec.md §5, S6).
    pub fn shutdown(mut self) {
        self.queues.signal_done();
        if let Some(handle) = self.consumer_handle.take() {
            let _ = handle.join();
        }
        match Arc::try_unwrap(self.pool) {
            Ok(pool) => pool.shutdown(),
            Err(_) => tracing::error!("worker pool had outstanding references at shutdown; skipping join"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_client::InMemoryBackend;

    fn test_config() -> PluginConfig {
        serde_json::from_value(serde_json::json!({
            "url": "http://localhost:9200",
            "abi_serializer_max_time_ms": 100,
            "queue_size": 16,
            "thread_pool_size": 1,
            "bulker_pool_size": 1,
            "bulk_size_mb": 1,
        }))
        .unwrap()
    }

    #[test]
    fn init_creates_indices_and_seeds_system_account() {
        let backend = Arc::new(InMemoryBackend::new());
        let pipeline = Pipeline::with_backend(
            test_config(),
            backend.clone(),
            Collaborators::default(),
            default_shutdown_requested(),
        )
        .unwrap();

        pipeline.init().unwrap();
        let doc = backend.get_doc("accounts", &docs::account_doc_id(SYSTEM_ACCOUNT)).unwrap();
        assert_eq!(doc["name"], SYSTEM_ACCOUNT.to_display_string());

        pipeline.shutdown();
    }

    #[test]
    fn wipe_without_replay_flags_is_rejected() {
        let backend = Arc::new(InMemoryBackend::new());
        let pipeline = Pipeline::with_backend(
            test_config(),
            backend,
            Collaborators::default(),
            default_shutdown_requested(),
        )
        .unwrap();
        assert!(pipeline.wipe(false).is_err());
        pipeline.shutdown();
    }

    #[test]
    fn end_to_end_accepted_block_reaches_the_backend() {
        let backend = Arc::new(InMemoryBackend::new());
        let pipeline = Pipeline::with_backend(
            test_config(),
            backend.clone(),
            Collaborators::default(),
            default_shutdown_requested(),
        )
        .unwrap();

        let block_id = model::Id32([4u8; 32]);
        pipeline.on_accepted_block(Arc::new(BlockState {
            block_num: 1,
            block_id,
            validated: true,
            header_state: Arc::new(serde_json::json!({})),
            block: model::BlockBody {
                previous: model::Id32([0u8; 32]),
                transactions: vec![],
                rendered: Arc::new(serde_json::json!({})),
            },
        }));

        pipeline.shutdown();
        assert!(backend.get_doc("blocks", &block_id.to_hex()).is_some());
    }
}
