/// Errors surfaced at the `Pipeline` facade's boundary (spec.md §7).
/// Processors themselves never propagate errors to the consumer loop —
/// each wraps its body and logs, so only startup/config/lifecycle
/// failures reach here.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("plugin configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("search engine error: {0}")]
    SearchBackend(#[from] search_client::Error),

    #[error("bulker pool error: {0}")]
    Bulker(#[from] bulker::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
