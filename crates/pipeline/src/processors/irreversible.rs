//! `process_irreversible_block` (spec.md §4.9.2).

use model::{docs, now_millis, BlockState, BlockTransactionReceipt};

use crate::processors::Resources;
use crate::scripts;

fn receipt_trx_id(receipt: &BlockTransactionReceipt) -> model::Id32 {
    match receipt {
        BlockTransactionReceipt::Packed { id } => *id,
        BlockTransactionReceipt::Id(id) => *id,
    }
}

pub fn process_irreversible_block(res: &Resources, bs: &BlockState) {
    if !res.start_gate.is_reached() {
        return;
    }

    let now = now_millis();
    let block_id_hex = bs.block_id.to_hex();

    if res.store_block_states {
        let upsert = serde_json::json!({
            "block_num": bs.block_num,
            "block_id": block_id_hex,
            "validated": bs.validated,
            "block_header_state": &*bs.header_state,
            "irreversible": true,
            "createAt": now,
        });
        let params = serde_json::json!({ "validated": bs.validated, "updateAt": now });
        let body = scripts::scripted_update_body(scripts::IRREVERSIBLE_SCRIPT, params, upsert, false);
        res.emit_update(docs::BLOCK_STATES, &docs::block_doc_id(bs.block_id), body);
    }

    if res.store_blocks {
        let upsert = serde_json::json!({
            "block_num": bs.block_num,
            "block_id": block_id_hex,
            "block": &*bs.block.rendered,
            "irreversible": true,
            "createAt": now,
        });
        let params = serde_json::json!({ "validated": bs.validated, "updateAt": now });
        let body = scripts::scripted_update_body(scripts::IRREVERSIBLE_SCRIPT, params, upsert, false);
        res.emit_update(docs::BLOCKS, &docs::block_doc_id(bs.block_id), body);
    }

    if res.store_transactions {
        for receipt in &bs.block.transactions {
            let trx_id = receipt_trx_id(receipt);
            let doc = serde_json::json!({
                "irreversible": true,
                "block_id": block_id_hex,
                "block_num": bs.block_num,
                "updateAt": now,
            });
            let body = serde_json::json!({ "doc": doc, "doc_as_upsert": true });
            res.emit_update(docs::TRANSACTIONS, &docs::transaction_doc_id(trx_id), body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::block::process_accepted_block;
    use crate::test_support::test_resources;
    use model::{BlockBody, Id32};
    use std::sync::Arc;

    fn sample_bs(block_num: u32, transactions: Vec<BlockTransactionReceipt>) -> BlockState {
        BlockState {
            block_num,
            block_id: Id32([9u8; 32]),
            validated: true,
            header_state: Arc::new(serde_json::json!({ "h": 1 })),
            block: BlockBody {
                previous: Id32([0u8; 32]),
                transactions,
                rendered: Arc::new(serde_json::json!({ "b": 1 })),
            },
        }
    }

    #[test]
    fn marks_blocks_and_block_states_irreversible_and_upserts_receipted_transactions() {
        let (res, backend) = test_resources(0);
        let trx_id = Id32([3u8; 32]);
        let bs = sample_bs(10, vec![BlockTransactionReceipt::Id(trx_id)]);
        process_irreversible_block(&res, &bs);

        let doc = backend.get_doc("block_states", &Id32([9u8; 32]).to_hex()).unwrap();
        assert_eq!(doc["irreversible"], true);
        assert_eq!(doc["validated"], true);

        let doc = backend.get_doc("blocks", &Id32([9u8; 32]).to_hex()).unwrap();
        assert_eq!(doc["irreversible"], true);

        let doc = backend.get_doc("transactions", &trx_id.to_hex()).unwrap();
        assert_eq!(doc["irreversible"], true);
        assert_eq!(doc["block_num"], 10);
    }

    #[test]
    fn testable_property_5_accept_and_irreversible_commute() {
        let bs = sample_bs(1000, vec![]);

        let (res_a, backend_a) = test_resources(0);
        process_accepted_block(&res_a, &bs);
        process_irreversible_block(&res_a, &bs);
        let a = backend_a.get_doc("block_states", &bs.block_id.to_hex()).unwrap();

        let (res_b, backend_b) = test_resources(0);
        process_irreversible_block(&res_b, &bs);
        process_accepted_block(&res_b, &bs);
        let b = backend_b.get_doc("block_states", &bs.block_id.to_hex()).unwrap();

        assert_eq!(a["validated"], b["validated"]);
        assert_eq!(a["block_header_state"], b["block_header_state"]);
        assert_eq!(a["irreversible"], b["irreversible"]);
        assert_eq!(a["irreversible"], true);
    }

    #[test]
    fn below_start_block_is_a_no_op() {
        let (res, backend) = test_resources(100);
        process_irreversible_block(&res, &sample_bs(10, vec![]));
        assert_eq!(backend.bulk_call_count(), 0);
    }
}
