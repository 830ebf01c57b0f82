pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown filter field {key}.")]
	UnknownField { key: String },
	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },
	#[error("Failed to resolve current user for {key}: {message}")]
	Resolution { key: String, message: String },
	#[error("Compilation cancelled while resolving {key}.")]
	Cancelled { key: String },
}
impl Error {
	pub fn key(&self) -> &str {
		match self {
			Self::UnknownField { key }
			| Self::InvalidValue { key, .. }
			| Self::Resolution { key, .. }
			| Self::Cancelled { key } => key,
		}
	}

	pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
		Self::InvalidValue { key: key.to_string(), message: message.into() }
	}
}
