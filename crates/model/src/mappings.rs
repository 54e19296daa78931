//! Opaque index-mapping JSON templates.
//!
//! Per spec.md §1's scope note, mapping content is an external
//! collaborator's concern — these constants are supplied verbatim to
//! the search engine at index-creation time and never parsed or
//! validated by this crate. Shape and `enabled: false` choices follow
//! `examples/original_source/mappings.hpp`: heavy/opaque blobs
//! (`block`, `block_header_state`, `abi`, `actions`, `action_traces`,
//! `receipt`, `act`) are excluded from the search index to keep
//! storage cost down (spec.md §9, second Open Question).

pub const ACCOUNTS_MAPPING: &str = r#"{
  "mappings": {
    "properties": {
      "name": { "type": "text" },
      "creator": { "type": "text" },
      "account_create_time": { "type": "date" },
      "pub_keys": { "type": "nested" },
      "account_controls": { "type": "nested" },
      "abi": { "enabled": false },
      "createAt": { "type": "date" },
      "updateAt": { "type": "date" }
    }
  }
}"#;

pub const BLOCKS_MAPPING: &str = r#"{
  "mappings": {
    "properties": {
      "block_num": { "type": "long" },
      "block_id": { "type": "keyword" },
      "block": { "enabled": false },
      "irreversible": { "type": "boolean" },
      "createAt": { "type": "date" },
      "updateAt": { "type": "date" }
    }
  }
}"#;

pub const BLOCK_STATES_MAPPING: &str = r#"{
  "mappings": {
    "properties": {
      "block_num": { "type": "long" },
      "block_id": { "type": "keyword" },
      "validated": { "type": "boolean" },
      "irreversible": { "type": "boolean" },
      "block_header_state": { "enabled": false },
      "createAt": { "type": "date" },
      "updateAt": { "type": "date" }
    }
  }
}"#;

pub const TRANSACTIONS_MAPPING: &str = r#"{
  "mappings": {
    "properties": {
      "trx_id": { "type": "keyword" },
      "signing_keys": { "type": "keyword" },
      "accepted": { "type": "boolean" },
      "implicit": { "type": "boolean" },
      "scheduled": { "type": "boolean" },
      "irreversible": { "type": "boolean" },
      "block_id": { "type": "keyword" },
      "block_num": { "type": "long" },
      "actions": { "enabled": false },
      "createAt": { "type": "date" },
      "updateAt": { "type": "date" }
    }
  }
}"#;

pub const TRANSACTION_TRACES_MAPPING: &str = r#"{
  "mappings": {
    "properties": {
      "id": { "type": "keyword" },
      "receipt": { "enabled": false },
      "action_traces": { "enabled": false },
      "createAt": { "type": "date" }
    }
  }
}"#;

pub const ACTION_TRACES_MAPPING: &str = r#"{
  "mappings": {
    "properties": {
      "receipt": { "enabled": false },
      "act": { "enabled": false },
      "createAt": { "type": "date" }
    }
  }
}"#;

/// Look up the mapping body for one of `docs::ALL_INDICES`, in the
/// same order.
pub fn mapping_for(index: &str) -> &'static str {
    match index {
        crate::docs::ACCOUNTS => ACCOUNTS_MAPPING,
        crate::docs::BLOCKS => BLOCKS_MAPPING,
        crate::docs::BLOCK_STATES => BLOCK_STATES_MAPPING,
        crate::docs::TRANSACTIONS => TRANSACTIONS_MAPPING,
        crate::docs::TRANSACTION_TRACES => TRANSACTION_TRACES_MAPPING,
        crate::docs::ACTION_TRACES => ACTION_TRACES_MAPPING,
        other => panic!("no mapping registered for index {other}"),
    }
}
