mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Backend, BackendPaths, Config, Extraction, Messages, PreferencesConfig, Search, Service,
};

use std::{fs, path::Path};

const MODES: [&str; 4] = ["text", "name", "url", "pdf"];
const TARGETS: [&str; 2] = ["authors", "articles"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (key, base) in
		[("backend.api_base", &cfg.backend.api_base), ("extraction.api_base", &cfg.extraction.api_base)]
	{
		if base.trim().is_empty() {
			return Err(Error::invalid(key, "must be non-empty"));
		}
		if !(base.starts_with("http://") || base.starts_with("https://")) {
			return Err(Error::invalid(key, "must start with http:// or https://"));
		}
	}
	for (key, timeout) in [
		("backend.timeout_ms", cfg.backend.timeout_ms),
		("extraction.timeout_ms", cfg.extraction.timeout_ms),
		("search.request_timeout_ms", cfg.search.request_timeout_ms),
	] {
		if timeout == 0 {
			return Err(Error::invalid(key, "must be greater than zero"));
		}
	}

	let paths = &cfg.backend.paths;

	for (key, path) in [
		("backend.paths.search_authors", &paths.search_authors),
		("backend.paths.search_articles", &paths.search_articles),
		("backend.paths.get_author", &paths.get_author),
		("backend.paths.get_author_by_id", &paths.get_author_by_id),
		("backend.paths.default_settings", &paths.default_settings),
		("backend.paths.units", &paths.units),
		("extraction.url_path", &cfg.extraction.url_path),
		("extraction.pdf_path", &cfg.extraction.pdf_path),
		("extraction.votes_path", &cfg.extraction.votes_path),
	] {
		if !path.starts_with('/') {
			return Err(Error::invalid(key, "must start with '/'"));
		}
	}

	if !MODES.contains(&cfg.search.default_mode.as_str()) {
		return Err(Error::invalid("search.default_mode", "must be one of text, name, url, or pdf"));
	}
	if !TARGETS.contains(&cfg.search.default_target.as_str()) {
		return Err(Error::invalid("search.default_target", "must be one of authors or articles"));
	}
	if cfg.search.default_top_k == 0 {
		return Err(Error::invalid("search.default_top_k", "must be greater than zero"));
	}

	let messages = &cfg.messages;

	for (key, text) in [
		("messages.empty_query", &messages.empty_query),
		("messages.empty_name", &messages.empty_name),
		("messages.empty_url", &messages.empty_url),
		("messages.empty_file", &messages.empty_file),
		("messages.invalid_name", &messages.invalid_name),
		("messages.url_fetch_failure", &messages.url_fetch_failure),
		("messages.file_read_failure", &messages.file_read_failure),
		("messages.connection_failure", &messages.connection_failure),
		("messages.no_authors", &messages.no_authors),
		("messages.no_articles", &messages.no_articles),
		("messages.placeholder", &messages.placeholder),
	] {
		if text.trim().is_empty() {
			return Err(Error::invalid(key, "must be non-empty"));
		}
	}

	for (key, headers) in [
		("backend.default_headers", &cfg.backend.default_headers),
		("extraction.default_headers", &cfg.extraction.default_headers),
	] {
		if headers.values().any(|value| !value.is_string()) {
			return Err(Error::invalid(key, "values must be strings"));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.preferences.path.as_deref().map(|path| path.trim().is_empty()).unwrap_or(false) {
		cfg.preferences.path = None;
	}

	cfg.backend.api_base = cfg.backend.api_base.trim().trim_end_matches('/').to_string();
	cfg.extraction.api_base = cfg.extraction.api_base.trim().trim_end_matches('/').to_string();
	cfg.search.default_mode = cfg.search.default_mode.trim().to_ascii_lowercase();
	cfg.search.default_target = cfg.search.default_target.trim().to_ascii_lowercase();
}
