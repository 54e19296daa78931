//! `process_accepted_transaction` (spec.md §4.9.3).

use model::{docs, now_millis, TransactionMetadata};

use crate::processors::Resources;

pub fn process_accepted_transaction(res: &Resources, meta: &TransactionMetadata) {
    if !res.start_gate.is_reached() {
        return;
    }
    if !res.store_transactions {
        return;
    }

    let signing_keys = meta
        .signing_keys
        .clone()
        .unwrap_or_else(|| res.signing_key_recoverer.recover(&meta.rendered));

    let mut doc = (*meta.rendered).clone();
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("trx_id".to_string(), serde_json::json!(meta.id.to_hex()));
        obj.insert("signing_keys".to_string(), serde_json::json!(signing_keys));
        obj.insert("accepted".to_string(), serde_json::json!(meta.accepted));
        obj.insert("implicit".to_string(), serde_json::json!(meta.implicit));
        obj.insert("scheduled".to_string(), serde_json::json!(meta.scheduled));
        obj.insert("createAt".to_string(), serde_json::json!(now_millis()));
    }

    let body = serde_json::json!({ "doc": doc, "doc_as_upsert": true });
    res.emit_update(docs::TRANSACTIONS, &docs::transaction_doc_id(meta.id), body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_resources;
    use model::Id32;
    use std::sync::Arc;

    fn sample_meta(id: Id32, signing_keys: Option<Vec<String>>) -> TransactionMetadata {
        TransactionMetadata {
            id,
            rendered: Arc::new(serde_json::json!({ "actions": [] })),
            signing_keys,
            accepted: true,
            implicit: false,
            scheduled: false,
        }
    }

    #[test]
    fn upserts_with_precomputed_signing_keys() {
        let (res, backend) = test_resources(0);
        let id = Id32([1u8; 32]);
        process_accepted_transaction(&res, &sample_meta(id, Some(vec!["EOS1".to_string()])));

        let doc = backend.get_doc("transactions", &id.to_hex()).unwrap();
        assert_eq!(doc["trx_id"], id.to_hex());
        assert_eq!(doc["signing_keys"], serde_json::json!(["EOS1"]));
        assert_eq!(doc["accepted"], true);
    }

    #[test]
    fn falls_back_to_recoverer_when_signing_keys_absent() {
        let (res, backend) = test_resources(0);
        let id = Id32([2u8; 32]);
        process_accepted_transaction(&res, &sample_meta(id, None));

        let doc = backend.get_doc("transactions", &id.to_hex()).unwrap();
        // NoopSigningKeyRecoverer recovers nothing.
        assert_eq!(doc["signing_keys"], serde_json::json!([]));
    }

    #[test]
    fn below_start_block_is_a_no_op() {
        let (res, backend) = test_resources(100);
        process_accepted_transaction(&res, &sample_meta(Id32([3u8; 32]), None));
        assert_eq!(backend.bulk_call_count(), 0);
    }
}
