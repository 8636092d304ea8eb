use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub backend: Backend,
	pub extraction: Extraction,
	pub search: Search,
	#[serde(default)]
	pub preferences: PreferencesConfig,
	pub messages: Messages,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// The ranking/lookup API.
#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
	pub api_base: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub paths: BackendPaths,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendPaths {
	pub search_authors: String,
	pub search_articles: String,
	pub get_author: String,
	pub get_author_by_id: String,
	pub default_settings: String,
	pub units: String,
}
impl Default for BackendPaths {
	fn default() -> Self {
		Self {
			search_authors: "/search_authors/".to_string(),
			search_articles: "/search_articles/".to_string(),
			get_author: "/get_author/".to_string(),
			get_author_by_id: "/get_author_by_id/".to_string(),
			default_settings: "/draw_search_authors_settings/".to_string(),
			units: "/get_units/".to_string(),
		}
	}
}

/// The web service that turns URLs and uploaded PDFs into plain text and records votes.
#[derive(Debug, Clone, Deserialize)]
pub struct Extraction {
	pub api_base: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default = "default_url_path")]
	pub url_path: String,
	#[serde(default = "default_pdf_path")]
	pub pdf_path: String,
	#[serde(default = "default_votes_path")]
	pub votes_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_mode")]
	pub default_mode: String,
	#[serde(default = "default_target")]
	pub default_target: String,
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	pub request_timeout_ms: u64,
	#[serde(default)]
	pub fetch_default_settings: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesConfig {
	/// Optional. JSON file holding the theme and advanced-options flags across sessions.
	pub path: Option<String>,
}

/// User-visible text. Nothing in the core hard-codes these strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Messages {
	pub empty_query: String,
	pub empty_name: String,
	pub empty_url: String,
	pub empty_file: String,
	pub invalid_name: String,
	pub url_fetch_failure: String,
	pub file_read_failure: String,
	pub connection_failure: String,
	pub no_authors: String,
	pub no_articles: String,
	pub placeholder: String,
}

fn default_url_path() -> String {
	"/api/urls".to_string()
}

fn default_pdf_path() -> String {
	"/api/pdfs".to_string()
}

fn default_votes_path() -> String {
	"/api/votes".to_string()
}

fn default_mode() -> String {
	"text".to_string()
}

fn default_target() -> String {
	"authors".to_string()
}

fn default_top_k() -> u32 {
	10
}
