/// Errors from a schema lookup or render. All of these are non-fatal
/// to the pipeline: the processor that hits one drops the single
/// action or account upsert it was working on and continues
/// (spec.md §7, *Decode error*).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("account {0} has no document yet")]
    AccountNotFound(model::Name),

    #[error("account {0} document has no usable abi field")]
    MissingAbi(model::Name),

    #[error("search engine error while loading abi for {account}: {source}")]
    Backend {
        account: model::Name,
        #[source]
        source: search_client::Error,
    },

    #[error("abi-aware render failed: {0}")]
    Render(String),

    #[error("abi-aware render exceeded its {max_ms}ms budget ({elapsed_ms}ms elapsed)")]
    DecodeTimeout { elapsed_ms: u128, max_ms: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
