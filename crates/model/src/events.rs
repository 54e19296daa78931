//! Event inputs forwarded from the node SDK (spec.md §3).
//!
//! These types are intentionally thin: the node owns the real chain
//! types, and hands the pipeline already-decoded metadata plus opaque
//! payload bytes for anything that needs ABI-aware rendering. The
//! pipeline never mutates an event after it reaches the intake queue.

use crate::name::Name;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A 32-byte block or transaction id, rendered as lowercase hex for
/// document ids. The hex codec mirrors `models::id::Id` in the teacher
/// repo (a fixed-width byte array newtype backed by `hex::decode`/
/// `hex::encode`), just at 32 bytes instead of 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Id32(pub [u8; 32]);

impl Id32 {
    pub fn from_hex(s: &str) -> Option<Id32> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Id32(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Id32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Current wall-clock time as milliseconds since the epoch, the unit
/// every persisted `createAt`/`updateAt` field uses.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as i64
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

/// One key/weight pair of a permission's key authorities, or one
/// actor/permission pair of its controlling-account authorities. The
/// node SDK flattens `newaccount`/`updateauth` payloads into these
/// before handing them to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWeight {
    pub permission: Name,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountControl {
    pub permission: Name,
    pub actor: Name,
}

/// Decoded `newaccount` action data (system-account only).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: Name,
    pub creator: Name,
    pub owner_keys: Vec<KeyWeight>,
    pub owner_accounts: Vec<AccountControl>,
    pub active_keys: Vec<KeyWeight>,
    pub active_accounts: Vec<AccountControl>,
}

/// Decoded `updateauth` action data.
#[derive(Debug, Clone)]
pub struct UpdateAuth {
    pub account: Name,
    pub permission: Name,
    pub keys: Vec<KeyWeight>,
    pub accounts: Vec<AccountControl>,
}

/// Decoded `deleteauth` action data.
#[derive(Debug, Clone)]
pub struct DeleteAuth {
    pub account: Name,
    pub permission: Name,
}

/// Decoded `setabi` action data. `abi` is the raw packed `abi_def`
/// bytes; the ABI cache decodes it on demand.
#[derive(Debug, Clone)]
pub struct SetAbi {
    pub account: Name,
    pub abi: Vec<u8>,
}

/// One node in the action-trace tree produced by applying a
/// transaction.
#[derive(Debug, Clone)]
pub struct ActionTrace {
    pub receiver: Name,
    pub action: Name,
    pub authorization: Vec<PermissionLevel>,
    /// Opaque action payload bytes, rendered through the ABI cache.
    pub payload: Arc<[u8]>,
    pub inline_traces: Vec<ActionTrace>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Executed,
    SoftFail,
    HardFail,
    Delayed,
    Expired,
}

#[derive(Debug, Clone)]
pub struct Receipt {
    pub status: TransactionStatus,
}

/// A transaction trace: the result of applying one transaction's
/// actions against state.
#[derive(Debug, Clone)]
pub struct TransactionTrace {
    pub id: Id32,
    pub receipt: Option<Receipt>,
    /// Absent for a speculative (not-yet-produced) execution.
    pub producer_block_id: Option<Id32>,
    pub action_traces: Vec<ActionTrace>,
    /// Whole-trace payload, already rendered to JSON by the caller
    /// (mirrors `to_variant_with_abi(*t)` in the original plugin) so
    /// the processor only has to stamp `createAt` before indexing it.
    pub rendered: Arc<serde_json::Value>,
}

/// Accepted-transaction metadata (pre-execution).
#[derive(Debug, Clone)]
pub struct TransactionMetadata {
    pub id: Id32,
    /// Whole-transaction payload, pre-rendered by the caller via
    /// `to_variant_with_abi(trx)`.
    pub rendered: Arc<serde_json::Value>,
    pub signing_keys: Option<Vec<String>>,
    pub accepted: bool,
    pub implicit: bool,
    pub scheduled: bool,
}

/// One transaction receipt inside a block body — enough to derive the
/// transaction id without touching the mutating `.id()` accessor on a
/// packed transaction (spec.md §4.9.2, §9).
#[derive(Debug, Clone)]
pub enum BlockTransactionReceipt {
    /// A packed transaction; `id` was computed by the caller via
    /// unpack-then-id on a fresh copy, never the mutating accessor.
    Packed { id: Id32 },
    Id(Id32),
}

#[derive(Debug, Clone)]
pub struct BlockBody {
    pub previous: Id32,
    pub transactions: Vec<BlockTransactionReceipt>,
    /// Whole block body, pre-rendered by the caller via
    /// `to_variant_with_abi(*bs.block)`.
    pub rendered: Arc<serde_json::Value>,
}

/// Block (or irreversible-block) state, shared by `on_accepted_block`
/// and `on_irreversible_block`.
#[derive(Debug, Clone)]
pub struct BlockState {
    pub block_num: u32,
    pub block_id: Id32,
    pub validated: bool,
    /// Opaque serialized header state, stored as-is (spec.md §3).
    pub header_state: Arc<serde_json::Value>,
    pub block: BlockBody,
}
