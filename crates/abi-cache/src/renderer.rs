use crate::schema::AbiSchema;
use model::Name;

/// The node SDK's schema-aware serializer (spec.md §4.4's
/// `to_variant_with_abi`), injected rather than implemented here —
/// decoding an arbitrary contract's binary action payload against its
/// `abi_def` is the node SDK's job, not this crate's.
pub trait AbiRenderer: Send + Sync {
    fn render(&self, schema: &AbiSchema, action: Name, payload: &[u8]) -> Result<serde_json::Value, String>;
}

/// A renderer with no real ABI decoder wired up: renders every payload
/// as its base64 encoding. Exists so tests (and a host that hasn't
/// wired its node SDK's serializer in yet) can exercise the cache's
/// own logic without a live ABI decoder.
pub struct OpaqueRenderer;

impl AbiRenderer for OpaqueRenderer {
    fn render(&self, _schema: &AbiSchema, action: Name, payload: &[u8]) -> Result<serde_json::Value, String> {
        Ok(serde_json::json!({
            "action": action.to_display_string(),
            "data_base64": base64::encode(payload),
        }))
    }
}
