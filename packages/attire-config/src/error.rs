use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unable to read configuration at {path:?}.")]
	ReadConfig { path: PathBuf, source: io::Error },
	#[error("Configuration at {path:?} is not valid TOML.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error("{message}")]
	Validation { message: String },
}
