use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::search::Target;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
	#[serde(deserialize_with = "id_string")]
	pub id: String,
	pub first_name: String,
	pub last_name: String,
	#[serde(default)]
	pub community_name: Option<String>,
	#[serde(default)]
	pub score: Option<f64>,
}
impl Author {
	pub fn display_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
	pub doi: String,
	pub title: String,
	#[serde(deserialize_with = "id_string")]
	pub author_id: String,
	#[serde(default)]
	pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RankedItems {
	Authors(Vec<Author>),
	Articles(Vec<Article>),
}

/// Opaque plot description, rendered by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot(pub Value);
impl Plot {
	/// The backend ships plots as a JSON document inside a string. Anything that does not parse
	/// is kept verbatim.
	pub fn from_json_str(raw: &str) -> Self {
		Self(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
	}
}

/// One ranked response. Zero items means "no matches"; "not searched yet" is the absence of a
/// result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
	pub items: RankedItems,
	pub plot: Option<Plot>,
}
impl ResultSet {
	pub fn kind(&self) -> Target {
		match self.items {
			RankedItems::Authors(_) => Target::Authors,
			RankedItems::Articles(_) => Target::Articles,
		}
	}

	pub fn len(&self) -> usize {
		match &self.items {
			RankedItems::Authors(authors) => authors.len(),
			RankedItems::Articles(articles) => articles.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// An author with every associated article, for the drill-down view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthorProfile {
	pub author: Author,
	#[serde(default)]
	pub articles: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
	Up,
	Down,
}
impl Vote {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Up => "up",
			Self::Down => "down",
		}
	}
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawId {
		Text(String),
		Integer(i64),
	}

	Ok(match RawId::deserialize(deserializer)? {
		RawId::Text(text) => text,
		RawId::Integer(value) => value.to_string(),
	})
}
