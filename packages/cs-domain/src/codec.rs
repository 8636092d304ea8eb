//! The shareable address form of a [`SearchState`].
//!
//! Scalars are written as `name=value`, lists as one `name[]=value` per element. Falsy values
//! are omitted. The uploaded file is never part of the address.

use std::collections::BTreeMap;

use crate::{
	params::{self, ParamKind, ParamValue, RESERVED_KEYS},
	preferences::StoredPreferences,
	search::{Mode, SearchState, Target},
};

const ARRAY_SUFFIX: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
	Single(String),
	Many(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateDefaults {
	pub mode: Mode,
	pub target: Target,
}
impl Default for StateDefaults {
	fn default() -> Self {
		Self { mode: Mode::Text, target: Target::Authors }
	}
}

/// Splits a query string (or a whole address) into fields. Later scalars win; malformed
/// percent escapes drop the pair.
pub fn decode(address: &str) -> BTreeMap<String, Field> {
	let mut fields = BTreeMap::new();
	let without_fragment = address.split('#').next().unwrap_or_default();
	let query_string = match without_fragment.rsplit_once('?') {
		Some((_, query)) => query,
		None if without_fragment.contains('=') => without_fragment,
		None => "",
	};

	for term in query_string.split('&').filter(|term| !term.is_empty()) {
		let (raw_key, raw_value) = term.split_once('=').unwrap_or((term, ""));
		let (Some(key), Some(value)) = (unescape(raw_key), unescape(raw_value)) else {
			continue;
		};

		if let Some(array) = key.strip_suffix(ARRAY_SUFFIX) {
			let entry = fields.entry(array.to_string()).or_insert_with(|| Field::Many(Vec::new()));

			match *entry {
				Field::Many(ref mut values) => values.push(value),
				Field::Single(_) => *entry = Field::Many(vec![value]),
			}
		} else {
			fields.insert(key, Field::Single(value));
		}
	}

	fields
}

/// Joins fields in the given order, skipping empty values.
pub fn encode<'a, I>(fields: I) -> String
where
	I: IntoIterator<Item = (&'a str, &'a Field)>,
{
	let mut terms = Vec::new();

	for (key, field) in fields {
		match field {
			Field::Single(value) if !value.is_empty() =>
				terms.push(format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))),
			Field::Many(values) => {
				for value in values.iter().filter(|value| !value.is_empty()) {
					terms.push(format!(
						"{}{ARRAY_SUFFIX}={}",
						urlencoding::encode(key),
						urlencoding::encode(value)
					));
				}
			},
			Field::Single(_) => {},
		}
	}

	terms.join("&")
}

/// Builds a state from an address and the stored preferences. Never fails: unknown modes and
/// targets fall back to the defaults, mistyped parameters are dropped.
pub fn read(address: &str, prefs: &StoredPreferences, defaults: StateDefaults) -> SearchState {
	let fields = decode(address);
	let single = |key: &str| match fields.get(key) {
		Some(Field::Single(value)) => Some(value.as_str()),
		_ => None,
	};
	let mode = single("kind").and_then(|raw| raw.parse().ok()).unwrap_or(defaults.mode);
	let target = single("target").and_then(|raw| raw.parse().ok()).unwrap_or(defaults.target);
	let mut state = SearchState::new(mode, target, prefs.advanced);

	if let Some(query) = single("query") {
		state.set_text(query);
	}

	for (key, field) in &fields {
		if RESERVED_KEYS.contains(&key.as_str()) {
			continue;
		}

		let value = match (params::spec(key), field) {
			(Some(spec), Field::Many(values)) if spec.kind == ParamKind::List =>
				Some(ParamValue::List(values.clone())),
			(Some(spec), Field::Single(raw)) => spec.parse(raw),
			(Some(_), Field::Many(_)) => None,
			(None, Field::Single(raw)) => Some(ParamValue::Text(raw.clone())),
			(None, Field::Many(values)) => Some(ParamValue::List(values.clone())),
		};

		if let Some(value) = value {
			state.set_param(key, value);
		}
	}

	state.prune();

	state
}

/// Serializes mode, target, typed query and the parameters the current view exposes.
pub fn write(state: &SearchState) -> String {
	let mut fields: Vec<(String, Field)> = vec![
		("kind".to_string(), Field::Single(state.mode().as_str().to_string())),
		("target".to_string(), Field::Single(state.target().as_str().to_string())),
	];

	if let Some(text) = state.input().text() {
		fields.push(("query".to_string(), Field::Single(text.to_string())));
	}

	for (key, value) in state.hyperparameters().iter() {
		let active = params::spec(key)
			.map(|spec| spec.is_active(state.mode(), state.target(), state.advanced()))
			.unwrap_or(true);

		if !active || value.is_falsy() {
			continue;
		}

		let field = match value {
			ParamValue::List(values) => Field::Many(values.clone()),
			scalar => Field::Single(scalar.to_strings().concat()),
		};

		fields.push((key.clone(), field));
	}

	encode(fields.iter().map(|(key, field)| (key.as_str(), field)))
}

fn unescape(raw: &str) -> Option<String> {
	urlencoding::decode(&raw.replace('+', " ")).ok().map(|value| value.into_owned())
}
