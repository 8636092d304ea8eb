use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{Error, Result};

/// One draw of the server-side default hyperparameters.
pub async fn default_settings(cfg: &cs_config::Backend) -> Result<Map<String, Value>> {
	let json = crate::get_json(
		&cfg.api_base,
		&cfg.paths.default_settings,
		cfg.timeout_ms,
		&cfg.default_headers,
	)
	.await?;

	parse_settings(json)
}

/// Organisational units keyed by unit id, for `filter_unit`.
pub async fn units(cfg: &cs_config::Backend) -> Result<BTreeMap<String, String>> {
	let json =
		crate::get_json(&cfg.api_base, &cfg.paths.units, cfg.timeout_ms, &cfg.default_headers)
			.await?;

	parse_units(json)
}

fn parse_settings(json: Value) -> Result<Map<String, Value>> {
	match json {
		Value::Object(settings) => Ok(settings),
		_ => Err(Error::response("Default settings response must be an object.")),
	}
}

fn parse_units(json: Value) -> Result<BTreeMap<String, String>> {
	let Value::Object(entries) = json else {
		return Err(Error::response("Units response must be an object."));
	};
	let mut units = BTreeMap::new();

	for (id, name) in entries {
		let Value::String(name) = name else {
			return Err(Error::response(format!("Unit {id} has a non-string name.")));
		};

		units.insert(id, name);
	}

	Ok(units)
}
