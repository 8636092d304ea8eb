use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::search::UnknownVariant;

pub const THEME_KEY: &str = "theme";
pub const ADVANCED_KEY: &str = "advanced";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	#[default]
	Auto,
	Light,
	Dark,
}
impl Theme {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Auto => "auto",
			Self::Light => "light",
			Self::Dark => "dark",
		}
	}
}
impl FromStr for Theme {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		[Self::Auto, Self::Light, Self::Dark]
			.into_iter()
			.find(|theme| theme.as_str().eq_ignore_ascii_case(raw.trim()))
			.ok_or_else(|| UnknownVariant(raw.to_string()))
	}
}
impl fmt::Display for Theme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// User preference flags that outlive a search screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredPreferences {
	pub theme: Theme,
	pub advanced: bool,
}
impl StoredPreferences {
	/// Reads the known flags from a raw preference map, ignoring anything mistyped.
	pub fn from_map(values: &serde_json::Map<String, serde_json::Value>) -> Self {
		let theme = values
			.get(THEME_KEY)
			.and_then(|value| value.as_str())
			.and_then(|raw| raw.parse().ok())
			.unwrap_or_default();
		let advanced = values.get(ADVANCED_KEY).and_then(|value| value.as_bool()).unwrap_or(false);

		Self { theme, advanced }
	}
}
