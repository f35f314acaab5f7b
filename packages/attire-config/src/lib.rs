mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, ImageStoreConfig, Matching, Postgres, ProviderConfig,
	Providers, Service, Statistics, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if !cfg.matching.threshold.is_finite() {
		return Err(Error::Validation {
			message: "matching.threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..1.0).contains(&cfg.matching.threshold) {
		return Err(Error::Validation {
			message: "matching.threshold must be at least 0.0 and below 1.0.".to_string(),
		});
	}
	if cfg.matching.max_samples == 0 {
		return Err(Error::Validation {
			message: "matching.max_samples must be greater than zero.".to_string(),
		});
	}
	if cfg.statistics.rollup_size == 0 {
		return Err(Error::Validation {
			message: "statistics.rollup_size must be greater than zero.".to_string(),
		});
	}
	if cfg.statistics.stale_after_days <= 0 {
		return Err(Error::Validation {
			message: "statistics.stale_after_days must be greater than zero.".to_string(),
		});
	}
	if cfg.statistics.frequency_window_days <= 0 {
		return Err(Error::Validation {
			message: "statistics.frequency_window_days must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("detector", &cfg.providers.detector.api_key),
		("images", &cfg.providers.images.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}
