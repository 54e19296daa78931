//! A search-engine indexing pipeline for a chain's accepted blocks,
//! transactions and action traces (spec.md §1).
//!
//! [`Pipeline`] is the single entry point a host embeds: construct it
//! with a [`config::PluginConfig`] and the ABI/native-action/signing-key
//! collaborators it can't supply itself, then call `init()` once and
//! feed it events through its four `on_*` methods. Everything past
//! that point — intake queueing, worker-pool dispatch, bulk
//! accumulation, ABI caching — runs on its own threads.

pub mod config;
pub mod consumer;
pub mod error;
pub mod native_decode;
pub mod pipeline;
pub mod processors;
pub mod scripts;
pub mod worker_pool;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, PluginConfig};
pub use error::{Error, Result};
pub use native_decode::{JsonNativeDecoder, NativeActionDecoder};
pub use pipeline::{default_shutdown_requested, Collaborators, Pipeline, ShutdownRequested};
pub use processors::{NoopSigningKeyRecoverer, SigningKeyRecoverer};
