use cs_config::Messages;
use cs_domain::{InputError, Mode};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("No {mode} input was provided.")]
	EmptyInput { mode: Mode },
	#[error("A first and a last name are required, got {input:?}.")]
	InvalidName { input: String },
	#[error("URL extraction failed: {message}")]
	UrlFetch { message: String },
	#[error("File extraction failed: {message}")]
	FileRead { message: String },
	#[error("Connection failed: {message}")]
	Connection { message: String },
	#[error("Preferences error: {message}")]
	Preferences { message: String },
	#[error("Invalid state: {message}")]
	InvalidState { message: String },
}
impl Error {
	/// Local input problems never reach the network and are shown as notifications.
	pub fn is_local(&self) -> bool {
		matches!(self, Self::EmptyInput { .. } | Self::InvalidName { .. })
	}

	/// The user-visible text for this error, taken from the injected message table.
	pub fn user_message(&self, messages: &Messages) -> String {
		match self {
			Self::EmptyInput { mode: Mode::Text } => messages.empty_query.clone(),
			Self::EmptyInput { mode: Mode::Name } => messages.empty_name.clone(),
			Self::EmptyInput { mode: Mode::Url } => messages.empty_url.clone(),
			Self::EmptyInput { mode: Mode::Pdf } => messages.empty_file.clone(),
			Self::InvalidName { .. } => messages.invalid_name.clone(),
			Self::UrlFetch { .. } => messages.url_fetch_failure.clone(),
			Self::FileRead { .. } => messages.file_read_failure.clone(),
			Self::Connection { .. } => messages.connection_failure.clone(),
			Self::Preferences { .. } | Self::InvalidState { .. } => self.to_string(),
		}
	}
}
impl From<InputError> for Error {
	fn from(err: InputError) -> Self {
		match err {
			InputError::EmptyInput { mode } => Self::EmptyInput { mode },
			InputError::InvalidName { input } => Self::InvalidName { input },
		}
	}
}
impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Preferences { message: err.to_string() }
	}
}
impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Preferences { message: err.to_string() }
	}
}
