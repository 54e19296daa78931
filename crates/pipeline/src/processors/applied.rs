//! `process_applied_transaction` (spec.md §4.9.4): the pre-order
//! traversal with inline-reversal, account-upsert dispatch, and
//! filtered action-trace recording.

use model::{docs, now_millis, ActionTrace, Name, TransactionStatus, TransactionTrace};

use crate::processors::account::AccountUpserts;
use crate::processors::Resources;

fn render_authorization(atrace: &ActionTrace) -> serde_json::Value {
    serde_json::Value::Array(
        atrace
            .authorization
            .iter()
            .map(|pl| {
                serde_json::json!({
                    "actor": pl.actor.to_display_string(),
                    "permission": pl.permission.to_display_string(),
                })
            })
            .collect(),
    )
}

pub fn process_applied_transaction(res: &Resources, ttrace: &TransactionTrace) {
    // Speculative execution (spec.md §7 "Speculative trace", §4.9.4
    // ingress skip, testable property 10): account upserts still run,
    // but nothing is ever recorded for action_traces/transaction_traces.
    let is_speculative = ttrace.producer_block_id.is_none();
    let status_executed = matches!(
        ttrace.receipt.as_ref().map(|r| r.status),
        Some(TransactionStatus::Executed)
    );

    let mut action_count: u32 = 0;
    let mut recorded: Vec<(u32, &ActionTrace)> = Vec::new();
    let mut account_upserts = AccountUpserts::new();

    let mut stack: Vec<&ActionTrace> = Vec::new();
    stack.extend(ttrace.action_traces.iter().rev());

    while let Some(atrace) = stack.pop() {
        if status_executed && atrace.receiver == res.system_account {
            account_upserts.observe(res, atrace);
        }

        if !is_speculative && res.start_gate.is_reached() && res.store_action_traces {
            let actors: Vec<Name> = atrace.authorization.iter().map(|pl| pl.actor).collect();
            let admitted = res.filter.include(&filter::Action {
                receiver: atrace.receiver,
                action: atrace.action,
                actors: &actors,
            });
            if admitted {
                recorded.push((action_count, atrace));
            }
        }

        action_count += 1;
        stack.extend(atrace.inline_traces.iter().rev());
    }

    // Account upserts apply regardless of start_block_reached (spec.md
    // §6 `block_start` row: "only account-upsert side effects... are
    // applied" below the start block).
    account_upserts.emit(res);

    if recorded.is_empty() {
        return;
    }

    let now = now_millis();
    let trx_id_hex = ttrace.id.to_hex();

    for (ordinal, atrace) in &recorded {
        let act = match res.abi_cache.to_variant_with_abi(
            atrace.receiver,
            atrace.action,
            &atrace.payload,
            res.renderer.as_ref(),
            res.max_decode_time,
        ) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(error = %err, trx_id = %trx_id_hex, ordinal, "dropping action trace that failed to render");
                continue;
            }
        };

        let doc = serde_json::json!({
            "trx_id": trx_id_hex,
            "receiver": atrace.receiver.to_display_string(),
            "action": atrace.action.to_display_string(),
            "authorization": render_authorization(atrace),
            "act": act,
            "createAt": now,
        });
        res.emit_create(docs::ACTION_TRACES, &docs::action_trace_doc_id(ttrace.id, *ordinal), doc);
    }

    if res.start_gate.is_reached() && res.store_transaction_traces {
        let mut doc = (*ttrace.rendered).clone();
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("id".to_string(), serde_json::json!(trx_id_hex));
            obj.insert("createAt".to_string(), serde_json::json!(now));
        }
        res.emit_create(docs::TRANSACTION_TRACES, &docs::transaction_doc_id(ttrace.id), doc);
    }
}
