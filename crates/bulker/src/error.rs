/// Errors raised by the bulker pool itself, as opposed to errors the
/// underlying search engine returns (those are handled internally by
/// the accumulator and never surface here — see `Accumulator::append`).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `BulkerPool::get` was called against a pool with zero accumulators.
    #[error("bulker pool is empty")]
    EmptyPool,
}

pub type Result<T> = std::result::Result<T, Error>;
