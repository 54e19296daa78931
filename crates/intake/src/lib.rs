pub mod backpressure;
pub mod queues;

pub use backpressure::Backpressure;
pub use queues::{Drained, IntakeQueues};
