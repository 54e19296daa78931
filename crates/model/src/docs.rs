//! Index names and document-id conventions (spec.md §3 table, §6).

use crate::events::Id32;
use crate::name::Name;

pub const ACCOUNTS: &str = "accounts";
pub const BLOCKS: &str = "blocks";
pub const BLOCK_STATES: &str = "block_states";
pub const TRANSACTIONS: &str = "transactions";
pub const TRANSACTION_TRACES: &str = "transaction_traces";
pub const ACTION_TRACES: &str = "action_traces";

/// All six indices this plugin owns, in the order `init`/`wipe`
/// operate on them.
pub const ALL_INDICES: [&str; 6] = [
    ACCOUNTS,
    BLOCKS,
    TRANSACTIONS,
    BLOCK_STATES,
    TRANSACTION_TRACES,
    ACTION_TRACES,
];

pub fn account_doc_id(name: Name) -> String {
    name.0.to_string()
}

pub fn block_doc_id(block_id: Id32) -> String {
    block_id.to_hex()
}

pub fn transaction_doc_id(trx_id: Id32) -> String {
    trx_id.to_hex()
}

/// `<trx_id>-<ordinal>`, the id of one flattened action trace
/// (spec.md §3, pre-order ordinal numbering per §4.9.4).
pub fn action_trace_doc_id(trx_id: Id32, ordinal: u32) -> String {
    format!("{}-{}", trx_id.to_hex(), ordinal)
}
