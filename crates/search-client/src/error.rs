/// Error kinds a `SearchBackend` call can fail with (spec.md §7).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The engine was unreachable (DNS, TCP, TLS, timeout).
    #[error("search engine connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The engine answered, but outside the 2xx range this operation
    /// expects (and outside any explicitly-tolerated code, e.g. 409 on
    /// `create` or 404 on `delete_index`).
    #[error("search engine returned {code}: {body}")]
    ResponseCode { code: u16, body: String },

    /// A `_bulk` response came back 2xx but its `errors` field was
    /// `true`: some individual actions in the batch failed.
    #[error("bulk request reported partial failures: {body}")]
    BulkErrors { body: String },

    /// A 2xx body failed to parse as the expected JSON shape.
    #[error("failed to decode search engine response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A configured base URL or request path was not a valid URL.
    #[error("invalid search engine URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
