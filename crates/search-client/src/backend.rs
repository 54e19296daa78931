use crate::error::Result;

/// The search engine's wire protocol, as a thin synchronous interface
/// (spec.md §4.1). Kept as a trait so the pipeline's tests can swap in
/// an in-memory fake instead of driving a live HTTP engine — the
/// engine is an external collaborator (spec.md §1), not part of this
/// crate's own logic.
///
/// Every method blocks the calling thread; callers that need
/// concurrency run multiple threads against a shared `Arc<dyn
/// SearchBackend>`; the `bulker` crate does exactly that.
pub trait SearchBackend: Send + Sync {
    /// `true` on 200, `false` on 404, fails on anything else.
    fn head(&self, path: &str) -> Result<bool>;

    /// PUT-style upsert of a whole document. Requires 2xx.
    fn index(&self, index: &str, body: &str, id: Option<&str>) -> Result<()>;

    /// Idempotent creation: 2xx or 409 (already exists) both succeed;
    /// returns the raw status code either way.
    fn create(&self, index: &str, body: &str, id: &str) -> Result<u16>;

    /// `Ok(Some(_))` on 2xx, `Ok(None)` on 404 (used by the ABI cache's
    /// miss path to distinguish "no such account yet" from a hard
    /// failure), `Err` otherwise.
    fn get(&self, index: &str, id: &str) -> Result<Option<serde_json::Value>>;

    fn search(&self, index: &str, query: &str) -> Result<serde_json::Value>;

    fn count(&self, index: &str, query: Option<&str>) -> Result<u64>;

    /// POST to `<index>/_doc/<id>/_update`. Requires 2xx.
    fn update(&self, index: &str, id: &str, body: &str) -> Result<()>;

    fn delete_by_query(&self, index: &str, query: &str) -> Result<()>;

    /// 404 is tolerated (index already absent).
    fn delete_index(&self, index: &str) -> Result<()>;

    /// Creates `index` with the given mapping body if it doesn't
    /// already exist (`head`-then-PUT), mirroring the original
    /// `elastic_client::init_index`.
    fn init_index(&self, index: &str, mapping: &str) -> Result<()> {
        if !self.head(index)? {
            self.create_index(index, mapping)?;
        }
        Ok(())
    }

    fn create_index(&self, index: &str, mapping: &str) -> Result<()>;

    /// POST NDJSON to the global `_bulk` endpoint.
    fn bulk(&self, ndjson: &str) -> Result<()>;

    /// POST NDJSON to `<index>/_bulk`.
    fn bulk_index(&self, index: &str, ndjson: &str) -> Result<()>;
}
