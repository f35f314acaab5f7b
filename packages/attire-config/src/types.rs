use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub matching: Matching,
	#[serde(default)]
	pub statistics: Statistics,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub detector: ProviderConfig,
	pub images: ImageStoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ImageStoreConfig {
	pub api_base: String,
	pub api_key: String,
	pub bucket: String,
	pub timeout_ms: u64,
}

/// Match policy. The defaults are the domain policy; config exists so a
/// deployment can tighten the threshold without a rebuild.
#[derive(Debug, Deserialize)]
pub struct Matching {
	#[serde(default = "default_threshold")]
	pub threshold: f32,
	#[serde(default = "default_max_samples")]
	pub max_samples: u32,
}
impl Default for Matching {
	fn default() -> Self {
		Self { threshold: default_threshold(), max_samples: default_max_samples() }
	}
}

#[derive(Debug, Deserialize)]
pub struct Statistics {
	#[serde(default = "default_rollup_size")]
	pub rollup_size: u32,
	#[serde(default = "default_stale_after_days")]
	pub stale_after_days: i64,
	#[serde(default = "default_frequency_window_days")]
	pub frequency_window_days: i64,
}
impl Default for Statistics {
	fn default() -> Self {
		Self {
			rollup_size: default_rollup_size(),
			stale_after_days: default_stale_after_days(),
			frequency_window_days: default_frequency_window_days(),
		}
	}
}

fn default_threshold() -> f32 {
	0.85
}

fn default_max_samples() -> u32 {
	10
}

fn default_rollup_size() -> u32 {
	5
}

fn default_stale_after_days() -> i64 {
	30
}

fn default_frequency_window_days() -> i64 {
	30
}
