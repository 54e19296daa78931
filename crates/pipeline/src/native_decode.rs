//! Native binary decoding of the four system actions' payloads
//! (`newaccount`, `updateauth`, `deleteauth`, `setabi`) is the node
//! SDK's concern (spec.md §1 — it owns `fc::raw::unpack<chain::T>` for
//! its own native C++ types), not this crate's. [`NativeActionDecoder`]
//! is the thin trait boundary a host wires its own unpacker behind;
//! [`JsonNativeDecoder`] is a JSON-payload stand-in used by this
//! crate's own tests, the same role `abi_cache::OpaqueRenderer` plays
//! for ABI-aware rendering.

use model::{AccountControl, DeleteAuth, KeyWeight, Name, NewAccount, SetAbi, UpdateAuth};

/// Decodes one system action's raw payload bytes into its native
/// struct. Returns `None` on a payload this decoder doesn't recognize
/// (spec.md §4.9.5, §7 *Decode error*) — account.rs drops just that
/// one account-upsert attempt and continues with the rest of the
/// transaction.
pub trait NativeActionDecoder: Send + Sync {
    fn decode_newaccount(&self, payload: &[u8]) -> Option<NewAccount>;
    fn decode_updateauth(&self, payload: &[u8]) -> Option<UpdateAuth>;
    fn decode_deleteauth(&self, payload: &[u8]) -> Option<DeleteAuth>;
    fn decode_setabi(&self, payload: &[u8]) -> Option<SetAbi>;
    /// Unpacks a `setabi` action's raw `abi` bytes into the `abi_def`
    /// JSON structure the `accounts` index stores (spec.md §4.9.5).
    fn decode_abi_def(&self, raw_abi: &[u8]) -> Option<serde_json::Value>;
}

/// Reads each payload as UTF-8 JSON with the same field names as the
/// corresponding `model` struct. Not a real chain codec — a
/// deterministic fixture for this crate's own tests.
#[derive(Default)]
pub struct JsonNativeDecoder;

fn key_weight(v: &serde_json::Value) -> Option<KeyWeight> {
    Some(KeyWeight {
        permission: Name::parse(v.get("permission")?.as_str()?)?,
        key: v.get("key")?.as_str()?.to_string(),
    })
}

fn account_control(v: &serde_json::Value) -> Option<AccountControl> {
    Some(AccountControl {
        permission: Name::parse(v.get("permission")?.as_str()?)?,
        actor: Name::parse(v.get("actor")?.as_str()?)?,
    })
}

fn array_of<T>(v: &serde_json::Value, field: &str, f: impl Fn(&serde_json::Value) -> Option<T>) -> Option<Vec<T>> {
    v.get(field)?.as_array()?.iter().map(f).collect()
}

impl NativeActionDecoder for JsonNativeDecoder {
    fn decode_newaccount(&self, payload: &[u8]) -> Option<NewAccount> {
        let v: serde_json::Value = serde_json::from_slice(payload).ok()?;
        Some(NewAccount {
            name: Name::parse(v.get("name")?.as_str()?)?,
            creator: Name::parse(v.get("creator")?.as_str()?)?,
            owner_keys: array_of(&v, "owner_keys", key_weight)?,
            owner_accounts: array_of(&v, "owner_accounts", account_control)?,
            active_keys: array_of(&v, "active_keys", key_weight)?,
            active_accounts: array_of(&v, "active_accounts", account_control)?,
        })
    }

    fn decode_updateauth(&self, payload: &[u8]) -> Option<UpdateAuth> {
        let v: serde_json::Value = serde_json::from_slice(payload).ok()?;
        Some(UpdateAuth {
            account: Name::parse(v.get("account")?.as_str()?)?,
            permission: Name::parse(v.get("permission")?.as_str()?)?,
            keys: array_of(&v, "keys", key_weight)?,
            accounts: array_of(&v, "accounts", account_control)?,
        })
    }

    fn decode_deleteauth(&self, payload: &[u8]) -> Option<DeleteAuth> {
        let v: serde_json::Value = serde_json::from_slice(payload).ok()?;
        Some(DeleteAuth {
            account: Name::parse(v.get("account")?.as_str()?)?,
            permission: Name::parse(v.get("permission")?.as_str()?)?,
        })
    }

    fn decode_setabi(&self, payload: &[u8]) -> Option<SetAbi> {
        let v: serde_json::Value = serde_json::from_slice(payload).ok()?;
        let account = Name::parse(v.get("account")?.as_str()?)?;
        let abi = serde_json::to_vec(v.get("abi")?).ok()?;
        Some(SetAbi { account, abi })
    }

    fn decode_abi_def(&self, raw_abi: &[u8]) -> Option<serde_json::Value> {
        serde_json::from_slice(raw_abi).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_newaccount_payload() {
        let payload = serde_json::json!({
            "name": "bob", "creator": "alice",
            "owner_keys": [{"permission": "owner", "key": "K1"}],
            "owner_accounts": [],
            "active_keys": [{"permission": "active", "key": "K2"}],
            "active_accounts": [],
        });
        let decoder = JsonNativeDecoder;
        let na = decoder.decode_newaccount(payload.to_string().as_bytes()).unwrap();
        assert_eq!(na.name, Name::parse("bob").unwrap());
        assert_eq!(na.owner_keys[0].key, "K1");
    }

    #[test]
    fn unparseable_payload_yields_none() {
        let decoder = JsonNativeDecoder;
        assert!(decoder.decode_newaccount(b"not json").is_none());
    }

    #[test]
    fn abi_def_round_trips_through_setabi() {
        let abi_def = serde_json::json!({ "version": "eosio::abi/1.1", "structs": [] });
        let payload = serde_json::json!({ "account": "eosio", "abi": abi_def });
        let decoder = JsonNativeDecoder;
        let sa = decoder.decode_setabi(payload.to_string().as_bytes()).unwrap();
        let decoded = decoder.decode_abi_def(&sa.abi).unwrap();
        assert_eq!(decoded, abi_def);
    }
}
