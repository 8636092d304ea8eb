use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::params::Hyperparameters;

/// How the user supplies the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	Text,
	Name,
	Url,
	Pdf,
}
impl Mode {
	pub const ALL: [Self; 4] = [Self::Text, Self::Name, Self::Url, Self::Pdf];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Name => "name",
			Self::Url => "url",
			Self::Pdf => "pdf",
		}
	}

	/// Url and pdf input need an extraction round trip before ranking.
	pub fn needs_extraction(self) -> bool {
		matches!(self, Self::Url | Self::Pdf)
	}
}
impl FromStr for Mode {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|mode| mode.as_str().eq_ignore_ascii_case(raw.trim()))
			.ok_or_else(|| UnknownVariant(raw.to_string()))
	}
}
impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The entity type being ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
	Authors,
	Articles,
}
impl Target {
	pub const ALL: [Self; 2] = [Self::Authors, Self::Articles];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Authors => "authors",
			Self::Articles => "articles",
		}
	}
}
impl FromStr for Target {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|target| target.as_str().eq_ignore_ascii_case(raw.trim()))
			.ok_or_else(|| UnknownVariant(raw.to_string()))
	}
}
impl fmt::Display for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized value {0:?}.")]
pub struct UnknownVariant(pub String);

/// Problems detected locally, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
	#[error("No {mode} input was provided.")]
	EmptyInput { mode: Mode },
	#[error("A first and a last name are required, got {input:?}.")]
	InvalidName { input: String },
}

/// An uploaded document. The bytes are shared, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
	pub name: String,
	pub bytes: Arc<[u8]>,
}
impl FileHandle {
	pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
		Self { name: name.into(), bytes: bytes.into() }
	}

	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}
impl fmt::Debug for FileHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FileHandle").field("name", &self.name).field("len", &self.len()).finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonName {
	pub first_name: String,
	pub last_name: String,
}
impl PersonName {
	/// Takes the first and the last whitespace-separated token. Middle tokens are dropped.
	pub fn split(raw: &str) -> Result<Self, InputError> {
		let tokens: Vec<&str> = raw.split_whitespace().collect();

		match tokens.as_slice() {
			[] => Err(InputError::EmptyInput { mode: Mode::Name }),
			[_] => Err(InputError::InvalidName { input: raw.trim().to_string() }),
			[first, .., last] =>
				Ok(Self { first_name: (*first).to_string(), last_name: (*last).to_string() }),
		}
	}
}

/// The editable input of a search screen. The variant is the mode, so a file can never sit
/// alongside typed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
	Text(String),
	Name(String),
	Url(String),
	File(Option<FileHandle>),
}
impl SearchInput {
	pub fn empty(mode: Mode) -> Self {
		match mode {
			Mode::Text => Self::Text(String::new()),
			Mode::Name => Self::Name(String::new()),
			Mode::Url => Self::Url(String::new()),
			Mode::Pdf => Self::File(None),
		}
	}

	pub fn mode(&self) -> Mode {
		match self {
			Self::Text(_) => Mode::Text,
			Self::Name(_) => Mode::Name,
			Self::Url(_) => Mode::Url,
			Self::File(_) => Mode::Pdf,
		}
	}

	/// The typed text for text, name and url input.
	pub fn text(&self) -> Option<&str> {
		match self {
			Self::Text(text) | Self::Name(text) | Self::Url(text) => Some(text),
			Self::File(_) => None,
		}
	}

	/// Re-tags the input for another mode, carrying typed text across text-like modes.
	pub fn convert(self, mode: Mode) -> Self {
		if self.mode() == mode {
			return self;
		}

		let text = self.text().map(str::to_string).unwrap_or_default();

		match mode {
			Mode::Text => Self::Text(text),
			Mode::Name => Self::Name(text),
			Mode::Url => Self::Url(text),
			Mode::Pdf => Self::File(None),
		}
	}

	pub fn to_query(&self) -> Result<SearchQuery, InputError> {
		let empty = || InputError::EmptyInput { mode: self.mode() };

		match self {
			Self::Text(text) if text.trim().is_empty() => Err(empty()),
			Self::Text(text) => Ok(SearchQuery::Text { text: text.clone() }),
			Self::Name(raw) => PersonName::split(raw).map(SearchQuery::Name),
			Self::Url(url) if url.trim().is_empty() => Err(empty()),
			Self::Url(url) => Ok(SearchQuery::Url { url: url.trim().to_string() }),
			Self::File(Some(file)) => Ok(SearchQuery::File(file.clone())),
			Self::File(None) => Err(empty()),
		}
	}
}

/// A validated query, ready for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
	Text { text: String },
	Name(PersonName),
	Url { url: String },
	File(FileHandle),
}
impl SearchQuery {
	pub fn mode(&self) -> Mode {
		match self {
			Self::Text { .. } => Mode::Text,
			Self::Name(_) => Mode::Name,
			Self::Url { .. } => Mode::Url,
			Self::File(_) => Mode::Pdf,
		}
	}
}

/// What to search for and how, for one search screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
	target: Target,
	input: SearchInput,
	hyperparameters: Hyperparameters,
	advanced: bool,
}
impl SearchState {
	pub fn new(mode: Mode, target: Target, advanced: bool) -> Self {
		Self {
			target,
			input: SearchInput::empty(mode),
			hyperparameters: Hyperparameters::default(),
			advanced,
		}
	}

	pub fn mode(&self) -> Mode {
		self.input.mode()
	}

	pub fn target(&self) -> Target {
		self.target
	}

	pub fn input(&self) -> &SearchInput {
		&self.input
	}

	pub fn hyperparameters(&self) -> &Hyperparameters {
		&self.hyperparameters
	}

	pub fn advanced(&self) -> bool {
		self.advanced
	}

	pub fn query(&self) -> Result<SearchQuery, InputError> {
		self.input.to_query()
	}

	pub fn set_mode(&mut self, mode: Mode) {
		let input = std::mem::replace(&mut self.input, SearchInput::File(None));

		self.input = input.convert(mode);

		self.prune();
	}

	pub fn set_target(&mut self, target: Target) {
		self.target = target;

		self.prune();
	}

	pub fn set_advanced(&mut self, advanced: bool) {
		self.advanced = advanced;

		self.prune();
	}

	/// Replaces the typed text. Ignored while the screen is in pdf mode.
	pub fn set_text(&mut self, text: impl Into<String>) {
		match &mut self.input {
			SearchInput::Text(current) | SearchInput::Name(current) | SearchInput::Url(current) =>
				*current = text.into(),
			SearchInput::File(_) => {},
		}
	}

	/// Attaches a file, switching to pdf mode.
	pub fn set_file(&mut self, file: Option<FileHandle>) {
		if self.mode() != Mode::Pdf {
			self.set_mode(Mode::Pdf);
		}

		self.input = SearchInput::File(file);
	}

	pub fn clear_input(&mut self) {
		self.input = SearchInput::empty(self.mode());
	}

	pub fn set_param(&mut self, key: &str, value: crate::ParamValue) {
		self.hyperparameters.set(key, value);

		self.prune();
	}

	pub fn remove_param(&mut self, key: &str) {
		self.hyperparameters.remove(key);
	}

	/// Drops registered parameters that the current mode, target and advanced view do not
	/// expose. Unregistered keys are kept.
	pub fn prune(&mut self) {
		let (mode, target, advanced) = (self.mode(), self.target, self.advanced);

		self.hyperparameters.retain_active(mode, target, advanced);
	}
}
