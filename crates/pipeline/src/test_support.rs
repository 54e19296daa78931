//! Shared fixtures for this crate's own unit tests — not part of the
//! public API, compiled only under `#[cfg(test)]`.

use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::time::Duration;

use abi_cache::{AbiCache, OpaqueRenderer};
use bulker::BulkerPool;
use filter::Filter;
use model::name::SYSTEM_ACCOUNT;
use search_client::InMemoryBackend;

use crate::native_decode::JsonNativeDecoder;
use crate::processors::{NoopSigningKeyRecoverer, Resources, StartGate};

/// A `Resources` bundle wired to a fresh in-memory backend, with
/// `filter_on_star` (admit everything) and all storage gates on.
pub fn test_resources(start_block_num: u32) -> (Resources, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    let res = Resources {
        // bulk_size=1 flushes after every single append, so tests can
        // assert `bulk_call_count()` against the number of documents
        // emitted without depending on exact JSON byte lengths.
        bulkers: Arc::new(BulkerPool::new(1, 1, backend.clone())),
        abi_cache: Arc::new(AbiCache::new(backend.clone(), 100)),
        renderer: Arc::new(OpaqueRenderer),
        filter: Arc::new(Filter::from_config(["*"], []).unwrap()),
        native_decoder: Arc::new(JsonNativeDecoder),
        signing_key_recoverer: Arc::new(NoopSigningKeyRecoverer),
        system_account: SYSTEM_ACCOUNT,
        max_decode_time: Duration::from_secs(1),
        start_gate: StartGate::new(start_block_num),
        store_blocks: true,
        store_block_states: true,
        store_transactions: true,
        store_transaction_traces: true,
        store_action_traces: true,
        emitted: AtomicU32::new(0),
    };
    (res, backend)
}
