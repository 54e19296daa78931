pub mod cache;
pub mod error;
pub mod renderer;
pub mod schema;

pub use cache::AbiCache;
pub use error::{Error, Result};
pub use renderer::{AbiRenderer, OpaqueRenderer};
pub use schema::AbiSchema;
