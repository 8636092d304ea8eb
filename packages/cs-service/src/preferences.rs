//! User preference flags that outlive one search screen, behind an injected capability.

use std::{
	fs,
	path::{Path, PathBuf},
	sync::Mutex,
};

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use cs_config::PreferencesConfig;
use cs_domain::StoredPreferences;

use crate::Result;

const CHANGE_CAPACITY: usize = 16;

pub trait PreferenceStore
where
	Self: Send + Sync,
{
	fn load(&self) -> Result<Map<String, Value>>;

	fn save(&self, values: &Map<String, Value>) -> Result<()>;
}

/// A JSON object on disk. A missing file reads as no preferences.
pub struct JsonFileStore {
	path: PathBuf,
}
impl JsonFileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl PreferenceStore for JsonFileStore {
	fn load(&self) -> Result<Map<String, Value>> {
		let raw = match fs::read_to_string(&self.path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
			Err(err) => return Err(err.into()),
		};

		match serde_json::from_str(&raw)? {
			Value::Object(values) => Ok(values),
			_ => Err(crate::Error::Preferences {
				message: format!("{} must hold a JSON object.", self.path.display()),
			}),
		}
	}

	fn save(&self, values: &Map<String, Value>) -> Result<()> {
		if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}

		fs::write(&self.path, serde_json::to_string_pretty(values)?)?;

		Ok(())
	}
}

#[derive(Default)]
pub struct MemoryStore {
	values: Mutex<Map<String, Value>>,
}
impl PreferenceStore for MemoryStore {
	fn load(&self) -> Result<Map<String, Value>> {
		Ok(self.values.lock().unwrap_or_else(|err| err.into_inner()).clone())
	}

	fn save(&self, values: &Map<String, Value>) -> Result<()> {
		*self.values.lock().unwrap_or_else(|err| err.into_inner()) = values.clone();

		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceChange {
	pub key: String,
	pub value: Value,
}

pub struct Preferences {
	store: Box<dyn PreferenceStore>,
	values: Mutex<Map<String, Value>>,
	changes: broadcast::Sender<PreferenceChange>,
}
impl Preferences {
	pub fn open<S>(store: S) -> Result<Self>
	where
		S: 'static + PreferenceStore,
	{
		let values = store.load()?;
		let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

		Ok(Self { store: Box::new(store), values: Mutex::new(values), changes })
	}

	pub fn in_memory() -> Self {
		let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

		Self { store: Box::new(MemoryStore::default()), values: Mutex::default(), changes }
	}

	/// File-backed when a path is configured, in-memory otherwise.
	pub fn from_config(cfg: &PreferencesConfig) -> Result<Self> {
		match cfg.path.as_deref() {
			Some(path) => Self::open(JsonFileStore::new(path)),
			None => Ok(Self::in_memory()),
		}
	}

	pub fn get(&self, key: &str) -> Option<Value> {
		self.values.lock().unwrap_or_else(|err| err.into_inner()).get(key).cloned()
	}

	/// Persists `value` and notifies subscribers. Setting the current value is a no-op.
	pub fn set(&self, key: &str, value: Value) -> Result<()> {
		{
			let mut values = self.values.lock().unwrap_or_else(|err| err.into_inner());

			if values.get(key) == Some(&value) {
				return Ok(());
			}

			let mut next = values.clone();

			next.insert(key.to_string(), value.clone());

			self.store.save(&next)?;

			*values = next;
		}

		tracing::debug!(key, "Preference changed.");

		// No subscribers is not an error.
		let _ = self.changes.send(PreferenceChange { key: key.to_string(), value });

		Ok(())
	}

	pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
		self.changes.subscribe()
	}

	pub fn stored(&self) -> StoredPreferences {
		StoredPreferences::from_map(&self.values.lock().unwrap_or_else(|err| err.into_inner()))
	}
}
