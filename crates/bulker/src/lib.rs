pub mod accumulator;
pub mod error;
pub mod pool;

pub use accumulator::{Accumulator, FatalHandler};
pub use error::{Error, Result};
pub use pool::BulkerPool;
