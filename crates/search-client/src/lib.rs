pub mod backend;
pub mod error;
pub mod fake;
pub mod http;
mod script;

pub use backend::SearchBackend;
pub use error::{Error, Result};
pub use fake::InMemoryBackend;
pub use http::HttpSearchClient;
