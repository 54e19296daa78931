//! `process_accepted_block` (spec.md §4.9.1).

use model::{docs, now_millis, BlockState};

use crate::processors::Resources;
use crate::scripts;

pub fn process_accepted_block(res: &Resources, bs: &BlockState) {
    if !res.start_gate.observe_accepted_block(bs.block_num) {
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
            "irreversible": false,
            "createAt": now,
        });
        let params = serde_json::json!({
            "block_num": bs.block_num,
            "block_id": block_id_hex,
            "validated": bs.validated,
            "block_header_state": &*bs.header_state,
            "createAt": now,
        });
        let body = scripts::scripted_update_body(scripts::BLOCK_STATE_ACCEPT_SCRIPT, params, upsert, false);
        res.emit_update(docs::BLOCK_STATES, &docs::block_doc_id(bs.block_id), body);
    }

    if res.store_blocks {
        let upsert = serde_json::json!({
            "block_num": bs.block_num,
            "block_id": block_id_hex,
            "block": &*bs.block.rendered,
            "irreversible": false,
            "createAt": now,
        });
        let params = serde_json::json!({
            "block_num": bs.block_num,
            "block_id": block_id_hex,
            "block": &*bs.block.rendered,
            "createAt": now,
        });
        let body = scripts::scripted_update_body(scripts::BLOCK_ACCEPT_SCRIPT, params, upsert, false);
        res.emit_update(docs::BLOCKS, &docs::block_doc_id(bs.block_id), body);
    }
}
