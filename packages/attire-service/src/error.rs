pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<attire_storage::Error> for Error {
	fn from(err: attire_storage::Error) -> Self {
		match err {
			attire_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			attire_storage::Error::SerdeJson(inner) => Self::Storage { message: inner.to_string() },
			attire_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			attire_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}
impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
impl From<attire_domain::DimensionMismatch> for Error {
	fn from(err: attire_domain::DimensionMismatch) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
impl From<attire_domain::EmbeddingIssue> for Error {
	fn from(err: attire_domain::EmbeddingIssue) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
