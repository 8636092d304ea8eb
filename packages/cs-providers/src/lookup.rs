use serde_json::Value;

use cs_domain::{AuthorProfile, PersonName};

use crate::Result;

pub async fn get_author(cfg: &cs_config::Backend, name: &PersonName) -> Result<AuthorProfile> {
	let json = crate::post_json(
		&cfg.api_base,
		&cfg.paths.get_author,
		cfg.timeout_ms,
		&cfg.default_headers,
		name,
	)
	.await?;

	parse_profile(json)
}

pub async fn get_author_by_id(cfg: &cs_config::Backend, author_id: &str) -> Result<AuthorProfile> {
	let body = serde_json::json!({ "author_id": author_id });
	let json = crate::post_json(
		&cfg.api_base,
		&cfg.paths.get_author_by_id,
		cfg.timeout_ms,
		&cfg.default_headers,
		&body,
	)
	.await?;

	parse_profile(json)
}

fn parse_profile(json: Value) -> Result<AuthorProfile> {
	Ok(serde_json::from_value(json)?)
}
