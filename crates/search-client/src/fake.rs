//! An in-memory `SearchBackend`, used by this crate's and its
//! dependents' tests in place of a live engine.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::SearchBackend;
use crate::error::{Error, Result};

#[derive(Default)]
struct State {
    docs: HashMap<(String, String), serde_json::Value>,
    indices: HashMap<String, String>,
    /// Every NDJSON body ever passed to `bulk`/`bulk_index`, in order —
    /// lets tests assert on flush counts and contents.
    bulk_calls: Vec<String>,
}

/// A fake search engine backed by a `HashMap`, applying `_bulk`
/// action/source pairs the same way a real engine would for `index`,
/// `create`, and `update` (including scripted upserts, evaluated as a
/// best-effort JSON merge rather than real Painless).
pub struct InMemoryBackend {
    state: Mutex<State>,
    /// When set, every write fails with this error — used to exercise
    /// the fatal-shutdown path.
    pub fail_writes: Mutex<Option<String>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
            fail_writes: Mutex::new(None),
        }
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_doc(&self, index: &str, id: &str) -> Option<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .docs
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    pub fn bulk_call_count(&self) -> usize {
        self.state.lock().unwrap().bulk_calls.len()
    }

    fn check_fail(&self) -> Result<()> {
        if let Some(msg) = self.fail_writes.lock().unwrap().clone() {
            return Err(Error::ResponseCode { code: 500, body: msg });
        }
        Ok(())
    }

    /// Apply one `_bulk` NDJSON body (alternating action/source lines)
    /// against the in-memory store.
    fn apply_bulk(&self, ndjson: &str) -> Result<()> {
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        state.bulk_calls.push(ndjson.to_string());

        let mut lines = ndjson.lines();
        while let Some(action_line) = lines.next() {
            if action_line.trim().is_empty() {
                continue;
            }
            let source_line = lines.next().unwrap_or("{}");
            let action: serde_json::Value = serde_json::from_str(action_line)?;
            let source: serde_json::Value = serde_json::from_str(source_line)?;

            let (op, meta) = action
                .as_object()
                .and_then(|o| o.iter().next())
                .map(|(k, v)| (k.clone(), v.clone()))
                .ok_or_else(|| Error::BulkErrors { body: action_line.to_string() })?;
            let index = meta
                .get("_index")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let id = meta
                .get("_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            match op.as_str() {
                "index" | "create" => {
                    state.docs.insert((index, id), source);
                }
                "update" => {
                    let key = (index, id);
                    let upsert = source.get("upsert").cloned();
                    let doc = source.get("doc").cloned();
                    let doc_as_upsert = source
                        .get("doc_as_upsert")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    let scripted_upsert = source
                        .get("scripted_upsert")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    let script = source.get("script").cloned();
                    let existing = state.docs.get(&key).cloned();

                    let merged = if let Some(script) = &script {
                        // A script runs against the existing document,
                        // or (only when `scripted_upsert: true`)
                        // against the `upsert` body on first write —
                        // mirroring a real engine's scripted-update
                        // semantics (spec.md §4.9.5).
                        match (existing, &upsert) {
                            (Some(cur), _) => {
                                crate::script::eval(crate::script::source(script), crate::script::params(script), cur)
                            }
                            (None, Some(upsert_doc)) if scripted_upsert => crate::script::eval(
                                crate::script::source(script),
                                crate::script::params(script),
                                upsert_doc.clone(),
                            ),
                            (None, Some(upsert_doc)) => upsert_doc.clone(),
                            (None, None) => serde_json::json!({}),
                        }
                    } else {
                        match (existing, doc, upsert) {
                            (Some(mut cur), Some(patch), _) => {
                                merge_object(&mut cur, &patch);
                                cur
                            }
                            (None, Some(patch), _) if doc_as_upsert => patch,
                            (None, _, Some(upsert_doc)) => upsert_doc,
                            (Some(cur), None, _) => cur,
                            (None, doc, None) => doc.unwrap_or_else(|| serde_json::json!({})),
                        }
                    };
                    state.docs.insert(key, merged);
                }
                other => return Err(Error::BulkErrors { body: format!("unknown bulk op {other}") }),
            }
        }
        Ok(())
    }
}

fn merge_object(base: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (Some(base_obj), Some(patch_obj)) = (base.as_object_mut(), patch.as_object()) {
        for (k, v) in patch_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
}

impl SearchBackend for InMemoryBackend {
    fn head(&self, path: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().indices.contains_key(path))
    }

    fn index(&self, index: &str, body: &str, id: Option<&str>) -> Result<()> {
        self.check_fail()?;
        let id = id.map(|s| s.to_string()).unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(body)?;
        self.state.lock().unwrap().docs.insert((index.to_string(), id), value);
        Ok(())
    }

    fn create(&self, index: &str, body: &str, id: &str) -> Result<u16> {
        self.check_fail()?;
        let key = (index.to_string(), id.to_string());
        let mut state = self.state.lock().unwrap();
        if state.docs.contains_key(&key) {
            return Ok(409);
        }
        let value: serde_json::Value = serde_json::from_str(body)?;
        state.docs.insert(key, value);
        Ok(201)
    }

    fn get(&self, index: &str, id: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.get_doc(index, id))
    }

    fn search(&self, _index: &str, _query: &str) -> Result<serde_json::Value> {
        Ok(serde_json::json!({ "hits": { "hits": [] } }))
    }

    fn count(&self, index: &str, _query: Option<&str>) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state.docs.keys().filter(|(i, _)| i == index).count() as u64)
    }

    fn update(&self, index: &str, id: &str, body: &str) -> Result<()> {
        self.check_fail()?;
        let action = serde_json::json!({ "update": { "_index": index, "_id": id } });
        self.apply_bulk(&format!("{}\n{}", action, body))
    }

    fn delete_by_query(&self, _index: &str, _query: &str) -> Result<()> {
        Ok(())
    }

    fn delete_index(&self, index: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.indices.remove(index);
        state.docs.retain(|(i, _), _| i != index);
        Ok(())
    }

    fn create_index(&self, index: &str, mapping: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .indices
            .insert(index.to_string(), mapping.to_string());
        Ok(())
    }

    fn bulk(&self, ndjson: &str) -> Result<()> {
        self.apply_bulk(ndjson)
    }

    fn bulk_index(&self, _index: &str, ndjson: &str) -> Result<()> {
        self.apply_bulk(ndjson)
    }
}
