//! The four event processors (spec.md §4.9), sharing one [`Resources`]
//! bundle of the collaborators they all push bulk operations through.

pub mod account;
pub mod applied;
pub mod block;
pub mod irreversible;
pub mod transaction;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use abi_cache::{AbiCache, AbiRenderer};
use bulker::BulkerPool;
use filter::Filter;
use model::Name;

use crate::native_decode::NativeActionDecoder;

/// Precomputed signing-key recovery is the node SDK's concern (spec.md
/// §4.9.3: "computed from the chain id with context-free and
/// allow-deferred both false") — this is the thin trait boundary a
/// host wires its own key-recovery behind when
/// `TransactionMetadata::signing_keys` wasn't already precomputed.
pub trait SigningKeyRecoverer: Send + Sync {
    fn recover(&self, rendered_transaction: &serde_json::Value) -> Vec<String>;
}

/// Recovers nothing — acceptable since a host can always precompute
/// `signing_keys` instead, and tests that don't care about this field
/// need a collaborator to plug in.
#[derive(Default)]
pub struct NoopSigningKeyRecoverer;

impl SigningKeyRecoverer for NoopSigningKeyRecoverer {
    fn recover(&self, _rendered_transaction: &serde_json::Value) -> Vec<String> {
        Vec::new()
    }
}

/// Latches `start_block_reached` the first time an accepted block's
/// `block_num` meets the configured `start_block_num` (spec.md §6, §4.9.1).
/// Every processor but the account-upsert half of `process_applied_transaction`
/// gates its side effects on this (spec.md §6's `block_start` row).
pub struct StartGate {
    start_block_num: u32,
    reached: AtomicBool,
}

impl StartGate {
    pub fn new(start_block_num: u32) -> Self {
        Self {
            start_block_num,
            reached: AtomicBool::new(start_block_num == 0),
        }
    }

    /// Only `process_accepted_block` calls this — it's the only
    /// processor carrying its own `block_num`.
    pub fn observe_accepted_block(&self, block_num: u32) -> bool {
        if block_num >= self.start_block_num {
            self.reached.store(true, Ordering::SeqCst);
        }
        self.is_reached()
    }

    pub fn is_reached(&self) -> bool {
        self.reached.load(Ordering::SeqCst)
    }
}

/// The collaborators every processor needs: the bulker pool to push
/// bulk operations through, the ABI cache/renderer to decode action
/// payloads, the filter to admit/reject action traces, the native
/// system-action decoder, and the per-index storage gates from
/// `PluginConfig`.
pub struct Resources {
    pub bulkers: Arc<BulkerPool>,
    pub abi_cache: Arc<AbiCache>,
    pub renderer: Arc<dyn AbiRenderer>,
    pub filter: Arc<Filter>,
    pub native_decoder: Arc<dyn NativeActionDecoder>,
    pub signing_key_recoverer: Arc<dyn SigningKeyRecoverer>,
    pub system_account: Name,
    pub max_decode_time: Duration,
    pub start_gate: StartGate,
    pub store_blocks: bool,
    pub store_block_states: bool,
    pub store_transactions: bool,
    pub store_transaction_traces: bool,
    pub store_action_traces: bool,
    /// Counts bulk documents this process has pushed; exposed for
    /// tests asserting processors actually emitted something (and for
    /// a host's own metrics, grounded on the same idiom as
    /// `bulker::Accumulator`'s own counters).
    pub emitted: AtomicU32,
}

impl Resources {
    fn emit(&self, op: &str, index: &str, id: &str, body: serde_json::Value) {
        let action = serde_json::json!({
            op: { "_index": index, "_type": "_doc", "_id": id, "retry_on_conflict": 100 }
        });
        match self.bulkers.get() {
            Ok(bulker) => {
                bulker.append(&action.to_string(), &body.to_string());
                self.emitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => tracing::error!(error = %err, %index, %id, "failed to obtain a bulker"),
        }
    }

    pub fn emit_update(&self, index: &str, id: &str, body: serde_json::Value) {
        self.emit("update", index, id, body);
    }

    pub fn emit_create(&self, index: &str, id: &str, body: serde_json::Value) {
        self.emit("create", index, id, body);
    }
}
