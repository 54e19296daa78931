//! `PluginConfig`: the config keys of spec.md §6, realized as a
//! `serde`-deserializable struct with a `validate()` step mirroring the
//! `EOS_ASSERT(...plugin_config_exception...)` checks in
//! `examples/original_source/elasticsearch_plugin.cpp`'s
//! `plugin_initialize`.

use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("abi_cache_size must be greater than 0")]
    AbiCacheSizeZero,

    #[error("abi_serializer_max_time_ms is required")]
    MissingAbiSerializerMaxTime,

    #[error("url is required")]
    MissingUrl,

    #[error("filter entry {0:?} is invalid: {1}")]
    InvalidFilterEntry(String, filter::Error),

    #[error("index_wipe was set without the host's replay flags also being set")]
    WipeWithoutReplay,
}

fn default_queue_size() -> usize {
    1024
}
fn default_abi_cache_size() -> usize {
    2048
}
fn default_thread_pool_size() -> usize {
    4
}
fn default_bulker_pool_size() -> usize {
    2
}
fn default_bulk_size_mb() -> usize {
    5
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    #[serde(default = "default_abi_cache_size")]
    pub abi_cache_size: usize,
    #[serde(default = "default_thread_pool_size")]
    pub thread_pool_size: usize,
    #[serde(default = "default_bulker_pool_size")]
    pub bulker_pool_size: usize,
    #[serde(default = "default_bulk_size_mb")]
    pub bulk_size_mb: usize,

    #[serde(default)]
    pub index_wipe: bool,
    #[serde(default)]
    pub block_start: u32,

    pub abi_serializer_max_time_ms: u64,

    #[serde(default = "default_true")]
    pub store_blocks: bool,
    #[serde(default = "default_true")]
    pub store_block_states: bool,
    #[serde(default = "default_true")]
    pub store_transactions: bool,
    #[serde(default = "default_true")]
    pub store_transaction_traces: bool,
    #[serde(default = "default_true")]
    pub store_action_traces: bool,

    #[serde(default)]
    pub filter_on: Vec<String>,
    #[serde(default)]
    pub filter_out: Vec<String>,
}

impl PluginConfig {
    /// Bytes threshold each bulker accumulator flushes at.
    pub fn bulk_size_bytes(&self) -> usize {
        self.bulk_size_mb * 1024 * 1024
    }

    /// Single-URL `url` (spec.md §6) normalized with a trailing `/`.
    pub fn normalized_url(&self) -> String {
        if self.url.ends_with('/') {
            self.url.clone()
        } else {
            format!("{}/", self.url)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.abi_cache_size == 0 {
            return Err(ConfigError::AbiCacheSizeZero);
        }
        if self.url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if self.abi_serializer_max_time_ms == 0 {
            return Err(ConfigError::MissingAbiSerializerMaxTime);
        }
        Ok(())
    }

    /// Builds the `Filter` this config describes, surfacing a
    /// malformed `filter_on`/`filter_out` entry as a `ConfigError`
    /// rather than the original's `EOS_ASSERT` abort.
    pub fn build_filter(&self) -> Result<filter::Filter, ConfigError> {
        filter::Filter::from_config(
            self.filter_on.iter().map(String::as_str),
            self.filter_out.iter().map(String::as_str),
        )
        .map_err(|e| ConfigError::InvalidFilterEntry(format!("{:?}/{:?}", self.filter_on, self.filter_out), e))
    }

    /// `index_wipe` is only honored alongside the host's own replay
    /// flags (spec.md §6); the host passes that confirmation in, since
    /// replay-flag plumbing is the node SDK's concern, not this
    /// crate's.
    pub fn check_wipe_allowed(&self, host_replay_flags_set: bool) -> Result<(), ConfigError> {
        if self.index_wipe && !host_replay_flags_set {
            return Err(ConfigError::WipeWithoutReplay);
        }
        Ok(())
    }
}
