//! Shared event and document types for the chain-to-search ingestion
//! pipeline. See `SPEC_FULL.md` §3.

pub mod docs;
pub mod events;
pub mod mappings;
pub mod name;

pub use events::{
    AccountControl, ActionTrace, BlockBody, BlockState, BlockTransactionReceipt, DeleteAuth,
    Id32, KeyWeight, NewAccount, PermissionLevel, Receipt, SetAbi, TransactionMetadata,
    TransactionStatus, TransactionTrace, UpdateAuth, now_millis,
};
pub use name::Name;
