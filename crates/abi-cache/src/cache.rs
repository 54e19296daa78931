use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use model::{docs, Name};
use search_client::SearchBackend;

use crate::error::{Error, Result};
use crate::renderer::AbiRenderer;
use crate::schema::AbiSchema;

struct Entry {
    schema: Arc<AbiSchema>,
    last_accessed: i64,
}

/// LRU-bounded cache of compiled ABI schemas, keyed by account
/// (spec.md §4.4, policy A — mandatory per SPEC_FULL.md's Open
/// Question resolution).
pub struct AbiCache {
    backend: Arc<dyn SearchBackend>,
    capacity: usize,
    system_account: Name,
    entries: RwLock<HashMap<Name, Entry>>,
}

impl AbiCache {
    pub fn new(backend: Arc<dyn SearchBackend>, capacity: usize) -> Self {
        Self::with_system_account(backend, capacity, model::name::SYSTEM_ACCOUNT)
    }

    pub fn with_system_account(backend: Arc<dyn SearchBackend>, capacity: usize, system_account: Name) -> Self {
        Self {
            backend,
            capacity,
            system_account,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-lock lookup; on hit, bumps `last_accessed` under a
    /// separate write guard.
    pub fn find(&self, account: Name) -> Option<Arc<AbiSchema>> {
        let hit = {
            let entries = self.entries.read().unwrap();
            entries.get(&account).map(|e| e.schema.clone())
        };

        if hit.is_some() {
            let mut entries = self.entries.write().unwrap();
            if let Some(e) = entries.get_mut(&account) {
                e.last_accessed = model::now_millis();
            }
        }

        hit
    }

    /// Invalidates the cached schema for `account` — called when a
    /// `setabi` action replaces it.
    pub fn erase(&self, account: Name) {
        self.entries.write().unwrap().remove(&account);
    }

    /// Evicts the entry with the smallest `last_accessed` if the
    /// cache is at or above capacity.
    fn purge(&self) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() < self.capacity {
            return;
        }
        if let Some(oldest) = entries
            .iter()
            .min_by_key(|(_, e)| e.last_accessed)
            .map(|(name, _)| *name)
        {
            entries.remove(&oldest);
        }
    }

    /// Returns the cached schema for `account`, loading it from the
    /// `accounts` index on a miss.
    pub fn get_or_load(&self, account: Name) -> Result<Arc<AbiSchema>> {
        if let Some(schema) = self.find(account) {
            return Ok(schema);
        }

        let doc = self
            .backend
            .get(docs::ACCOUNTS, &docs::account_doc_id(account))
            .map_err(|source| Error::Backend { account, source })?
            .ok_or(Error::AccountNotFound(account))?;

        let mut schema = AbiSchema::from_account_doc(&doc).ok_or(Error::MissingAbi(account))?;
        if account == self.system_account {
            schema.specialize_for_system_account();
        }

        self.purge();
        let schema = Arc::new(schema);
        self.entries.write().unwrap().insert(
            account,
            Entry {
                schema: schema.clone(),
                last_accessed: model::now_millis(),
            },
        );
        Ok(schema)
    }

    /// Loads (or reuses) `account`'s schema and renders `payload`
    /// through `renderer`, enforcing `max_decode_time` as a wall-clock
    /// budget on the render call.
    pub fn to_variant_with_abi(
        &self,
        account: Name,
        action: Name,
        payload: &[u8],
        renderer: &dyn AbiRenderer,
        max_decode_time: Duration,
    ) -> Result<serde_json::Value> {
        let schema = self.get_or_load(account)?;
        let start = Instant::now();
        let rendered = renderer
            .render(&schema, action, payload)
            .map_err(Error::Render)?;
        let elapsed = start.elapsed();
        if elapsed > max_decode_time {
            return Err(Error::DecodeTimeout {
                elapsed_ms: elapsed.as_millis(),
                max_ms: max_decode_time.as_millis() as u64,
            });
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::OpaqueRenderer;
    use model::name::SYSTEM_ACCOUNT;
    use search_client::InMemoryBackend;

    fn abi_doc() -> serde_json::Value {
        serde_json::json!({
            "name": "eosio",
            "abi": {
                "version": "eosio::abi/1.1",
                "structs": [
                    { "name": "setabi", "fields": [ { "name": "abi", "type": "bytes" } ] }
                ]
            }
        })
    }

    #[test]
    fn miss_then_hit_round_trips_through_backend() {
        let backend = Arc::new(InMemoryBackend::new());
        let account = Name::parse("eosio").unwrap();
        backend
            .index(docs::ACCOUNTS, &abi_doc().to_string(), Some(&docs::account_doc_id(account)))
            .unwrap();

        let cache = AbiCache::new(backend, 10);
        assert!(cache.find(account).is_none());
        let schema = cache.get_or_load(account).unwrap();
        assert_eq!(schema.abi_def["version"], "eosio::abi/1.1");
        assert!(cache.find(account).is_some());
    }

    #[test]
    fn missing_account_document_is_an_error() {
        let backend = Arc::new(InMemoryBackend::new());
        let cache = AbiCache::new(backend, 10);
        let account = Name::parse("ghost").unwrap();
        assert!(matches!(cache.get_or_load(account), Err(Error::AccountNotFound(_))));
    }

    #[test]
    fn system_account_schema_is_specialized_on_load() {
        let backend = Arc::new(InMemoryBackend::new());
        backend
            .index(
                docs::ACCOUNTS,
                &abi_doc().to_string(),
                Some(&docs::account_doc_id(SYSTEM_ACCOUNT)),
            )
            .unwrap();
        let cache = AbiCache::new(backend, 10);
        let schema = cache.get_or_load(SYSTEM_ACCOUNT).unwrap();
        assert_eq!(schema.abi_def["structs"][0]["fields"][0]["type"], "abi_def");
    }

    #[test]
    fn erase_forces_a_fresh_load() {
        let backend = Arc::new(InMemoryBackend::new());
        let account = Name::parse("eosio").unwrap();
        backend
            .index(docs::ACCOUNTS, &abi_doc().to_string(), Some(&docs::account_doc_id(account)))
            .unwrap();
        let cache = AbiCache::new(backend, 10);
        cache.get_or_load(account).unwrap();
        cache.erase(account);
        assert!(cache.find(account).is_none());
    }

    #[test]
    fn purge_evicts_the_least_recently_accessed_entry() {
        let backend = Arc::new(InMemoryBackend::new());
        let names: Vec<Name> = ["a", "b", "c"].iter().map(|n| Name::parse(n).unwrap()).collect();
        for n in &names {
            backend
                .index(docs::ACCOUNTS, &abi_doc().to_string(), Some(&docs::account_doc_id(*n)))
                .unwrap();
        }
        let cache = AbiCache::new(backend, 2);
        cache.get_or_load(names[0]).unwrap();
        cache.get_or_load(names[1]).unwrap();
        // Touch `a` again so `b` becomes the least-recently accessed.
        cache.find(names[0]);
        cache.get_or_load(names[2]).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.find(names[0]).is_some());
        assert!(cache.find(names[2]).is_some());
    }

    #[test]
    fn render_produces_a_json_value_via_the_injected_renderer() {
        let backend = Arc::new(InMemoryBackend::new());
        let account = Name::parse("eosio").unwrap();
        backend
            .index(docs::ACCOUNTS, &abi_doc().to_string(), Some(&docs::account_doc_id(account)))
            .unwrap();
        let cache = AbiCache::new(backend, 10);
        let action = Name::parse("transfer").unwrap();
        let rendered = cache
            .to_variant_with_abi(account, action, b"payload", &OpaqueRenderer, Duration::from_secs(1))
            .unwrap();
        assert_eq!(rendered["action"], "transfer");
    }
}
