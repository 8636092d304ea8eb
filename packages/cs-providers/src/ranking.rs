use serde_json::{Map, Value};

use cs_domain::{Article, Author, Plot, RankedItems, ResultSet};

use crate::{Error, Result};

pub async fn search_authors(
	cfg: &cs_config::Backend,
	body: &Map<String, Value>,
) -> Result<ResultSet> {
	let json = crate::post_json(
		&cfg.api_base,
		&cfg.paths.search_authors,
		cfg.timeout_ms,
		&cfg.default_headers,
		body,
	)
	.await?;

	parse_authors_response(json)
}

pub async fn search_articles(
	cfg: &cs_config::Backend,
	body: &Map<String, Value>,
) -> Result<ResultSet> {
	let json = crate::post_json(
		&cfg.api_base,
		&cfg.paths.search_articles,
		cfg.timeout_ms,
		&cfg.default_headers,
		body,
	)
	.await?;

	parse_articles_response(json)
}

fn parse_authors_response(mut json: Value) -> Result<ResultSet> {
	let plot = parse_plot(&json);
	let authors = json
		.get_mut("authors")
		.filter(|v| v.is_array())
		.map(Value::take)
		.ok_or_else(|| Error::response("Author ranking response is missing authors array."))?;
	let authors: Vec<Author> = serde_json::from_value(authors)?;

	Ok(ResultSet { items: RankedItems::Authors(authors), plot })
}

fn parse_articles_response(mut json: Value) -> Result<ResultSet> {
	let plot = parse_plot(&json);
	let articles = json
		.get_mut("articles")
		.filter(|v| v.is_array())
		.map(Value::take)
		.ok_or_else(|| Error::response("Article ranking response is missing articles array."))?;
	let articles: Vec<Article> = serde_json::from_value(articles)?;

	Ok(ResultSet { items: RankedItems::Articles(articles), plot })
}

// The service embeds the figure as a JSON document inside a string.
fn parse_plot(json: &Value) -> Option<Plot> {
	match json.get("plot_json")? {
		Value::Null => None,
		Value::String(raw) if raw.trim().is_empty() => None,
		Value::String(raw) => Some(Plot::from_json_str(raw)),
		other => Some(Plot(other.clone())),
	}
}
