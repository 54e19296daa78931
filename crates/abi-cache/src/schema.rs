/// A compiled contract schema: the `abi_def` document stored on an
/// account, as decoded from the `accounts` index (spec.md §4.4).
///
/// Binary ABI decoding of individual action payloads is delegated to
/// an injected [`crate::renderer::AbiRenderer`] — the node SDK's own
/// schema-aware serializer is the external collaborator spec.md §1
/// calls out; this crate owns caching, eviction, and the system
/// account's field specialization, not the wire codec itself.
#[derive(Debug, Clone)]
pub struct AbiSchema {
    pub abi_def: serde_json::Value,
    /// Set once `specialize_for_system_account` has rewritten
    /// `setabi.abi`'s declared type from `bytes` to `abi_def`.
    pub specialized: bool,
}

impl AbiSchema {
    /// Extracts and wraps the `abi` field of an `accounts` index
    /// document, as returned by `SearchBackend::get`.
    pub fn from_account_doc(doc: &serde_json::Value) -> Option<AbiSchema> {
        let abi_def = doc.get("abi")?.clone();
        if abi_def.is_null() {
            return None;
        }
        Some(AbiSchema {
            abi_def,
            specialized: false,
        })
    }

    /// Redefines the `abi` field of the `setabi` struct from `bytes`
    /// to `abi_def`, so that `setabi` actions on the system account
    /// render their payload as a nested structured object rather than
    /// a raw bytes blob (spec.md §4.4, testable property 9).
    pub fn specialize_for_system_account(&mut self) {
        if self.specialized {
            return;
        }
        if let Some(structs) = self.abi_def.get_mut("structs").and_then(|s| s.as_array_mut()) {
            for s in structs {
                if s.get("name").and_then(|n| n.as_str()) != Some("setabi") {
                    continue;
                }
                if let Some(fields) = s.get_mut("fields").and_then(|f| f.as_array_mut()) {
                    for field in fields {
                        if field.get("name").and_then(|n| n.as_str()) == Some("abi")
                            && field.get("type").and_then(|t| t.as_str()) == Some("bytes")
                        {
                            field["type"] = serde_json::Value::String("abi_def".to_string());
                        }
                    }
                }
            }
        }
        self.specialized = true;
    }
}
