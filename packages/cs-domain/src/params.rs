use std::collections::{BTreeMap, btree_map};

use serde_json::Value;

use crate::search::{Mode, Target};

const AUTHORS: &[Target] = &[Target::Authors];
const BOTH: &[Target] = &[Target::Authors, Target::Articles];

/// Every hyperparameter an options panel can expose.
pub const PARAMS: &[ParamSpec] = &[
	ParamSpec::simple("top_k", ParamKind::Integer, BOTH),
	ParamSpec::simple("n", ParamKind::Integer, AUTHORS),
	ParamSpec::simple("m", ParamKind::Integer, AUTHORS),
	ParamSpec::simple("since_year", ParamKind::Integer, BOTH),
	ParamSpec::simple("distance_threshold", ParamKind::Float, BOTH),
	ParamSpec::simple("pow", ParamKind::Float, AUTHORS),
	ParamSpec::simple("weight_results", ParamKind::Boolean, AUTHORS),
	ParamSpec::simple("with_plot", ParamKind::Boolean, BOTH),
	ParamSpec::advanced("ks", ParamKind::Float, AUTHORS),
	ParamSpec::advanced("ka", ParamKind::Float, AUTHORS),
	ParamSpec::advanced("kr", ParamKind::Float, AUTHORS),
	ParamSpec::advanced("filter_unit", ParamKind::List, AUTHORS),
];

/// Keys the address uses for the state itself rather than for hyperparameters.
pub const RESERVED_KEYS: [&str; 3] = ["kind", "target", "query"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	Integer,
	Float,
	Boolean,
	List,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
	pub name: &'static str,
	pub kind: ParamKind,
	pub targets: &'static [Target],
	pub advanced_only: bool,
}
impl ParamSpec {
	const fn simple(name: &'static str, kind: ParamKind, targets: &'static [Target]) -> Self {
		Self { name, kind, targets, advanced_only: false }
	}

	const fn advanced(name: &'static str, kind: ParamKind, targets: &'static [Target]) -> Self {
		Self { name, kind, targets, advanced_only: true }
	}

	/// Name lookups bypass ranking, so no ranking parameter applies to them.
	pub fn is_active(&self, mode: Mode, target: Target, advanced: bool) -> bool {
		mode != Mode::Name && self.targets.contains(&target) && (advanced || !self.advanced_only)
	}

	/// Parses one raw address value. Mistyped values yield `None`.
	pub fn parse(&self, raw: &str) -> Option<ParamValue> {
		let raw = raw.trim();

		match self.kind {
			ParamKind::Integer => raw.parse().ok().map(ParamValue::Integer),
			ParamKind::Float =>
				raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(ParamValue::Float),
			ParamKind::Boolean => parse_bool(raw).map(ParamValue::Boolean),
			ParamKind::List => Some(ParamValue::List(vec![raw.to_string()])),
		}
	}

	/// Converts a value of another kind, e.g. an integer given for a float parameter.
	pub fn coerce(&self, value: ParamValue) -> Option<ParamValue> {
		match (self.kind, value) {
			(ParamKind::Integer, value @ ParamValue::Integer(_))
			| (ParamKind::Float, value @ ParamValue::Float(_))
			| (ParamKind::Boolean, value @ ParamValue::Boolean(_))
			| (ParamKind::List, value @ ParamValue::List(_)) => Some(value),
			(ParamKind::List, other) => Some(ParamValue::List(other.to_strings())),
			(_, other) => match other.to_strings().as_slice() {
				[raw] => self.parse(raw),
				_ => None,
			},
		}
	}
}

pub fn spec(name: &str) -> Option<&'static ParamSpec> {
	PARAMS.iter().find(|spec| spec.name == name)
}

pub fn is_registered(name: &str) -> bool {
	spec(name).is_some()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
	Integer(i64),
	Float(f64),
	Boolean(bool),
	Text(String),
	List(Vec<String>),
}
impl ParamValue {
	/// Falsy values are never stored; setting one removes the key.
	pub fn is_falsy(&self) -> bool {
		match self {
			Self::Boolean(value) => !value,
			Self::Float(value) => !value.is_finite(),
			Self::Text(value) => value.is_empty(),
			Self::List(values) => values.iter().all(String::is_empty),
			Self::Integer(_) => false,
		}
	}

	/// Address-bar form of each element. Lists yield one entry per element.
	pub fn to_strings(&self) -> Vec<String> {
		match self {
			Self::Integer(value) => vec![value.to_string()],
			Self::Float(value) => vec![value.to_string()],
			Self::Boolean(value) => vec![value.to_string()],
			Self::Text(value) => vec![value.clone()],
			Self::List(values) => values.iter().filter(|v| !v.is_empty()).cloned().collect(),
		}
	}

	/// JSON form for request bodies. Lists use the backend's underscore-joined convention.
	pub fn to_json(&self) -> Value {
		match self {
			Self::Integer(value) => Value::from(*value),
			Self::Float(value) => Value::from(*value),
			Self::Boolean(value) => Value::Bool(*value),
			Self::Text(value) => Value::String(value.clone()),
			Self::List(values) => Value::String(values.join("_")),
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Boolean(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Integer(value) => Some(*value),
			_ => None,
		}
	}
}

/// Open, forward-compatible parameter map. Unregistered keys round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hyperparameters {
	values: BTreeMap<String, ParamValue>,
}
impl Hyperparameters {
	pub fn get(&self, key: &str) -> Option<&ParamValue> {
		self.values.get(key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn set(&mut self, key: &str, value: ParamValue) {
		if value.is_falsy() || RESERVED_KEYS.contains(&key) || key.is_empty() {
			self.values.remove(key);

			return;
		}

		let value = match spec(key) {
			Some(spec) => spec.coerce(value),
			// Unregistered keys only ever travel as text.
			None => match value {
				ParamValue::List(values) => Some(ParamValue::List(values)),
				ParamValue::Text(text) => Some(ParamValue::Text(text)),
				other => Some(ParamValue::Text(other.to_strings().concat())),
			},
		};

		match value {
			Some(ParamValue::List(values)) => {
				let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();

				if values.is_empty() {
					self.values.remove(key);
				} else {
					self.values.insert(key.to_string(), ParamValue::List(values));
				}
			},
			Some(value) if !value.is_falsy() => {
				self.values.insert(key.to_string(), value);
			},
			_ => {
				self.values.remove(key);
			},
		}
	}

	pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
		self.values.remove(key)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
		self.values.iter()
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn retain_active(&mut self, mode: Mode, target: Target, advanced: bool) {
		self.values.retain(|key, _| match spec(key) {
			Some(spec) => spec.is_active(mode, target, advanced),
			None => true,
		});
	}

	/// Registered, active parameters only, as a JSON object body fragment.
	pub fn to_request_fields(
		&self,
		mode: Mode,
		target: Target,
		advanced: bool,
	) -> serde_json::Map<String, Value> {
		self.values
			.iter()
			.filter(|(key, _)| {
				spec(key).map(|spec| spec.is_active(mode, target, advanced)).unwrap_or(false)
			})
			.map(|(key, value)| (key.clone(), value.to_json()))
			.collect()
	}
}

fn parse_bool(raw: &str) -> Option<bool> {
	match raw.to_ascii_lowercase().as_str() {
		"true" | "1" | "on" | "yes" => Some(true),
		"false" | "0" | "off" | "no" => Some(false),
		_ => None,
	}
}
