//! End-to-end scenarios driven through the full `Pipeline` facade
//! (intake queues -> consumer -> worker pool -> processors -> bulker
//! -> backend), covering the scenarios spec.md §8 names S1-S6 that
//! aren't already exercised at the processor unit-test level.

use std::sync::Arc;

use model::{
    docs, ActionTrace, BlockBody, BlockState, Id32, Name, PermissionLevel, Receipt,
    TransactionStatus, TransactionTrace,
};
use pipeline::{Collaborators, PluginConfig};
use search_client::InMemoryBackend;

fn config(filter_on: Vec<String>, filter_out: Vec<String>) -> PluginConfig {
    serde_json::from_value(serde_json::json!({
        "url": "http://localhost:9200",
        "abi_serializer_max_time_ms": 200,
        "queue_size": 256,
        "thread_pool_size": 2,
        "bulker_pool_size": 2,
        "bulk_size_mb": 1,
        "filter_on": filter_on,
        "filter_out": filter_out,
    }))
    .unwrap()
}

fn action(receiver: &str, action: &str) -> ActionTrace {
    ActionTrace {
        receiver: Name::parse(receiver).unwrap(),
        action: Name::parse(action).unwrap(),
        authorization: vec![PermissionLevel {
            actor: Name::parse("alice").unwrap(),
            permission: Name::parse("active").unwrap(),
        }],
        payload: Arc::from(b"{}".to_vec().into_boxed_slice()),
        inline_traces: vec![],
    }
}

/// S4 — with `filter_on=["eosio::"]`, a trace carrying one admitted
/// action and one rejected action yields exactly one `action_traces`
/// document, at ordinal 0.
#[test]
fn s4_filter_admits_only_the_configured_receiver() {
    let backend = Arc::new(InMemoryBackend::new());
    let pipeline = pipeline::Pipeline::with_backend(
        config(vec!["eosio::".to_string()], vec![]),
        backend.clone(),
        Collaborators::default(),
        pipeline::default_shutdown_requested(),
    )
    .unwrap();

    let trx_id = Id32([9u8; 32]);
    let ttrace = Arc::new(TransactionTrace {
        id: trx_id,
        receipt: Some(Receipt { status: TransactionStatus::Executed }),
        producer_block_id: Some(Id32([1u8; 32])),
        action_traces: vec![action("eosio", "transfer"), action("other", "transfer")],
        rendered: Arc::new(serde_json::json!({})),
    });
    pipeline.on_applied_transaction(ttrace);
    pipeline.shutdown();

    assert!(backend.get_doc("action_traces", &docs::action_trace_doc_id(trx_id, 0)).is_some());
    assert!(backend.get_doc("action_traces", &docs::action_trace_doc_id(trx_id, 1)).is_none());
}

/// S6 — 500 accepted blocks fed through the four public entry points,
/// then `shutdown()`. Every block must have reached the backend by
/// the time `shutdown()` returns, and the bulker pool must have
/// flushed its residual buffer on teardown.
#[test]
fn s6_shutdown_drains_every_queued_event() {
    let backend = Arc::new(InMemoryBackend::new());
    let pipeline = pipeline::Pipeline::with_backend(
        config(vec![], vec![]),
        backend.clone(),
        Collaborators::default(),
        pipeline::default_shutdown_requested(),
    )
    .unwrap();

    fn block_id_for(i: u32) -> Id32 {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&i.to_be_bytes());
        Id32(bytes)
    }

    const N: u32 = 500;
    for i in 0..N {
        pipeline.on_accepted_block(Arc::new(BlockState {
            block_num: i,
            block_id: block_id_for(i),
            validated: true,
            header_state: Arc::new(serde_json::json!({})),
            block: BlockBody {
                previous: Id32([0u8; 32]),
                transactions: vec![],
                rendered: Arc::new(serde_json::json!({ "n": i })),
            },
        }));
    }
    pipeline.shutdown();

    for i in 0..N {
        let doc = backend.get_doc("blocks", &block_id_for(i).to_hex()).unwrap_or_else(|| panic!("missing block {i}"));
        assert_eq!(doc["block_num"], i);
    }
}

/// A full accepted_transaction -> applied_transaction round trip for
/// a plain (non-system-account) action ends up in `transactions`,
/// `transaction_traces`, and `action_traces`.
#[test]
fn accepted_and_applied_transaction_together_populate_all_three_indices() {
    let backend = Arc::new(InMemoryBackend::new());
    let pipeline = pipeline::Pipeline::with_backend(
        config(vec![], vec![]),
        backend.clone(),
        Collaborators::default(),
        pipeline::default_shutdown_requested(),
    )
    .unwrap();

    let trx_id = Id32([3u8; 32]);
    pipeline.on_accepted_transaction(Arc::new(model::TransactionMetadata {
        id: trx_id,
        rendered: Arc::new(serde_json::json!({})),
        signing_keys: Some(vec!["EOS1".to_string()]),
        accepted: true,
        implicit: false,
        scheduled: false,
    }));
    pipeline.on_applied_transaction(Arc::new(TransactionTrace {
        id: trx_id,
        receipt: Some(Receipt { status: TransactionStatus::Executed }),
        producer_block_id: Some(Id32([1u8; 32])),
        action_traces: vec![action("eosio.token", "transfer")],
        rendered: Arc::new(serde_json::json!({})),
    }));
    pipeline.shutdown();

    assert!(backend.get_doc("transactions", &trx_id.to_hex()).is_some());
    assert!(backend.get_doc("transaction_traces", &trx_id.to_hex()).is_some());
    assert!(backend.get_doc("action_traces", &docs::action_trace_doc_id(trx_id, 0)).is_some());
}

/// `init()` is idempotent: calling it twice against the same backend
/// does not re-seed a second system account or error.
#[test]
fn init_is_idempotent() {
    let backend = Arc::new(InMemoryBackend::new());
    let pipeline = pipeline::Pipeline::with_backend(
        config(vec![], vec![]),
        backend.clone(),
        Collaborators::default(),
        pipeline::default_shutdown_requested(),
    )
    .unwrap();

    pipeline.init().unwrap();
    pipeline.init().unwrap();
    assert_eq!(backend.count(docs::ACCOUNTS, None).unwrap(), 1);
    pipeline.shutdown();
}

/// `wipe()` with the host's replay flags set clears every index then
/// re-seeds the system account.
#[test]
fn wipe_with_replay_flags_clears_then_reinitializes() {
    let backend = Arc::new(InMemoryBackend::new());
    let pipeline = pipeline::Pipeline::with_backend(
        config(vec![], vec![]),
        backend.clone(),
        Collaborators::default(),
        pipeline::default_shutdown_requested(),
    )
    .unwrap();

    pipeline.init().unwrap();
    pipeline.on_accepted_block(Arc::new(BlockState {
        block_num: 1,
        block_id: Id32([2u8; 32]),
        validated: true,
        header_state: Arc::new(serde_json::json!({})),
        block: BlockBody {
            previous: Id32([0u8; 32]),
            transactions: vec![],
            rendered: Arc::new(serde_json::json!({})),
        },
    }));
    // `shutdown()` drains the consumer and worker pool, guaranteeing the
    // block upsert above has landed before `wipe()` runs.
    pipeline.shutdown();
    assert!(backend.get_doc("blocks", &Id32([2u8; 32]).to_hex()).is_some());

    let pipeline = pipeline::Pipeline::with_backend(
        config(vec![], vec![]),
        backend.clone(),
        Collaborators::default(),
        pipeline::default_shutdown_requested(),
    )
    .unwrap();
    pipeline.wipe(true).unwrap();
    assert!(backend.get_doc("blocks", &Id32([2u8; 32]).to_hex()).is_none());
    assert_eq!(backend.count(docs::ACCOUNTS, None).unwrap(), 1);
    pipeline.shutdown();
}
