//! Account Upsert Protocol (spec.md §4.9.5): accumulates the four
//! system actions touching `accounts` documents into one scripted
//! update per account per transaction.

use std::collections::HashMap;

use model::name::{ACTION_DELETEAUTH, ACTION_NEWACCOUNT, ACTION_SETABI, ACTION_UPDATEAUTH};
use model::{docs, now_millis, ActionTrace, KeyWeight, Name};
use serde_json::json;

use crate::processors::Resources;
use crate::scripts::{self, AccountScript};

fn key_weight_json(kw: &KeyWeight) -> serde_json::Value {
    json!({ "permission": kw.permission.to_display_string(), "key": kw.key })
}

fn account_control_json(ac: &model::AccountControl) -> serde_json::Value {
    json!({ "permission": ac.permission.to_display_string(), "actor": ac.actor.to_display_string() })
}

/// The per-transaction `account_id → (script_text, params)` mapping
/// (spec.md §4.9.5), built incrementally as `process_applied_transaction`
/// pops traces off its stack and flushed once at the end of the
/// traversal.
#[derive(Default)]
pub struct AccountUpserts {
    by_account: HashMap<Name, AccountScript>,
}

impl AccountUpserts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspects one system-account action trace and, if it is one of
    /// the four recognized system actions and decodes successfully,
    /// appends its script fragment to the affected account's entry.
    /// Unknown actions or undecodable payloads are silently skipped
    /// (spec.md §4.9.5 tie-break: drop just this attempt).
    pub fn observe(&mut self, res: &Resources, atrace: &ActionTrace) {
        let action = atrace.action.to_display_string();
        match action.as_str() {
            ACTION_NEWACCOUNT => self.observe_newaccount(res, atrace),
            ACTION_UPDATEAUTH => self.observe_updateauth(res, atrace),
            ACTION_DELETEAUTH => self.observe_deleteauth(res, atrace),
            ACTION_SETABI => self.observe_setabi(res, atrace),
            _ => {}
        }
    }

    fn observe_newaccount(&mut self, res: &Resources, atrace: &ActionTrace) {
        let Some(na) = res.native_decoder.decode_newaccount(&atrace.payload) else {
            return;
        };
        let mut pub_keys: Vec<serde_json::Value> = na.owner_keys.iter().map(key_weight_json).collect();
        pub_keys.extend(na.active_keys.iter().map(key_weight_json));
        let mut account_controls: Vec<serde_json::Value> =
            na.owner_accounts.iter().map(account_control_json).collect();
        account_controls.extend(na.active_accounts.iter().map(account_control_json));

        let params = json!({
            "name": na.name.to_display_string(),
            "creator": na.creator.to_display_string(),
            "account_create_time": now_millis(),
            "pub_keys": pub_keys,
            "account_controls": account_controls,
            "createAt": now_millis(),
        });
        self.by_account
            .entry(na.name)
            .or_default()
            .push(scripts::NEWACCOUNT_SCRIPT, params);
    }

    fn observe_updateauth(&mut self, res: &Resources, atrace: &ActionTrace) {
        let Some(ua) = res.native_decoder.decode_updateauth(&atrace.payload) else {
            return;
        };
        let pub_keys: Vec<serde_json::Value> = ua.keys.iter().map(key_weight_json).collect();
        let account_controls: Vec<serde_json::Value> = ua.accounts.iter().map(account_control_json).collect();
        let params = json!({
            "permission": ua.permission.to_display_string(),
            "pub_keys": pub_keys,
            "account_controls": account_controls,
            "updateAt": now_millis(),
        });
        self.by_account
            .entry(ua.account)
            .or_default()
            .push(scripts::UPDATEAUTH_SCRIPT, params);
    }

    fn observe_deleteauth(&mut self, res: &Resources, atrace: &ActionTrace) {
        let Some(da) = res.native_decoder.decode_deleteauth(&atrace.payload) else {
            return;
        };
        let params = json!({
            "permission": da.permission.to_display_string(),
            "updateAt": now_millis(),
        });
        self.by_account
            .entry(da.account)
            .or_default()
            .push(scripts::DELETEAUTH_SCRIPT, params);
    }

    fn observe_setabi(&mut self, res: &Resources, atrace: &ActionTrace) {
        let Some(sa) = res.native_decoder.decode_setabi(&atrace.payload) else {
            return;
        };
        let Some(abi_def) = res.native_decoder.decode_abi_def(&sa.abi) else {
            return;
        };
        res.abi_cache.erase(sa.account);
        let params = json!({
            "name": sa.account.to_display_string(),
            "abi": abi_def,
            "updateAt": now_millis(),
        });
        self.by_account
            .entry(sa.account)
            .or_default()
            .push(scripts::SETABI_SCRIPT, params);
    }

    /// Pushes one scripted `_bulk` update per touched account —
    /// `scripted_upsert:true, upsert:{}` so a never-before-seen account
    /// still gets created (spec.md §4.9.5).
    pub fn emit(self, res: &Resources) {
        for (account, script) in self.by_account {
            if script.is_empty() {
                continue;
            }
            let (source, params) = script.build();
            let body = scripts::scripted_update_body(&source, params, json!({}), true);
            res.emit_update(docs::ACCOUNTS, &docs::account_doc_id(account), body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_resources;
    use model::Name;
    use std::sync::Arc;

    fn trace(action: &str, payload: serde_json::Value) -> ActionTrace {
        ActionTrace {
            receiver: model::name::SYSTEM_ACCOUNT,
            action: Name::parse(action).unwrap(),
            authorization: vec![],
            payload: Arc::from(payload.to_string().into_bytes().into_boxed_slice()),
            inline_traces: vec![],
        }
    }

    #[test]
    fn s1_newaccount_sets_fields_and_combined_key_arrays() {
        let (res, backend) = test_resources(0);
        let payload = json!({
            "name": "bob", "creator": "alice",
            "owner_keys": [{"permission": "owner", "key": "K1"}],
            "owner_accounts": [],
            "active_keys": [{"permission": "active", "key": "K2"}],
            "active_accounts": [],
        });
        let mut upserts = AccountUpserts::new();
        upserts.observe(&res, &trace("newaccount", payload));
        upserts.emit(&res);

        let bob = Name::parse("bob").unwrap();
        let doc = backend.get_doc("accounts", &docs::account_doc_id(bob)).unwrap();
        assert_eq!(doc["name"], "bob");
        assert_eq!(doc["creator"], "alice");
        let keys: Vec<&str> = doc["pub_keys"].as_array().unwrap().iter().map(|k| k["key"].as_str().unwrap()).collect();
        assert_eq!(keys, vec!["K1", "K2"]);
        assert_eq!(doc["account_controls"], json!([]));
    }

    #[test]
    fn s2_updateauth_replaces_only_the_matching_permission() {
        let (res, backend) = test_resources(0);
        let bob = Name::parse("bob").unwrap();

        let mut upserts = AccountUpserts::new();
        upserts.observe(
            &res,
            &trace(
                "newaccount",
                json!({
                    "name": "bob", "creator": "alice",
                    "owner_keys": [{"permission": "owner", "key": "K1"}],
                    "owner_accounts": [],
                    "active_keys": [{"permission": "active", "key": "K2"}],
                    "active_accounts": [],
                }),
            ),
        );
        upserts.emit(&res);

        let mut upserts = AccountUpserts::new();
        upserts.observe(
            &res,
            &trace(
                "updateauth",
                json!({
                    "account": "bob", "permission": "active",
                    "keys": [{"permission": "active", "key": "K3"}],
                    "accounts": [],
                }),
            ),
        );
        upserts.emit(&res);

        let doc = backend.get_doc("accounts", &docs::account_doc_id(bob)).unwrap();
        let keys: Vec<&str> = doc["pub_keys"].as_array().unwrap().iter().map(|k| k["key"].as_str().unwrap()).collect();
        assert_eq!(keys, vec!["K1", "K3"]);
    }

    #[test]
    fn multiple_actions_on_the_same_account_concatenate_into_one_update() {
        let (res, backend) = test_resources(0);
        let mut upserts = AccountUpserts::new();
        upserts.observe(
            &res,
            &trace(
                "newaccount",
                json!({
                    "name": "bob", "creator": "alice",
                    "owner_keys": [], "owner_accounts": [], "active_keys": [], "active_accounts": [],
                }),
            ),
        );
        upserts.observe(
            &res,
            &trace("deleteauth", json!({ "account": "bob", "permission": "active" })),
        );
        upserts.emit(&res);

        assert_eq!(backend.bulk_call_count(), 1);
    }

    #[test]
    fn undecodable_payload_drops_just_that_action() {
        let (res, _backend) = test_resources(0);
        let mut upserts = AccountUpserts::new();
        upserts.observe(&res, &trace("newaccount", json!("not an object")));
        assert!(upserts.by_account.is_empty());
    }
}
