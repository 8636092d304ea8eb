use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time};

use cs_config::{Config, Extraction};
use cs_domain::{PersonName, SearchQuery};

use crate::{Error, ExtractionProvider, Result};

/// What the ranking or lookup endpoints accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
	Text(String),
	Name(PersonName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceKey {
	Url(String),
	File(blake3::Hash),
}

#[derive(Debug)]
struct Resolved {
	key: SourceKey,
	text: String,
}

/// Turns a validated query into a backend payload. Extractions are single-flight: a second
/// caller waits for the one in progress and reuses its text when the source is unchanged.
pub struct InputResolver {
	cfg: Extraction,
	extraction: Arc<dyn ExtractionProvider>,
	timeout: Duration,
	flight: Mutex<Option<Resolved>>,
}
impl InputResolver {
	pub fn new(cfg: &Config, extraction: Arc<dyn ExtractionProvider>) -> Self {
		Self {
			cfg: cfg.extraction.clone(),
			extraction,
			timeout: Duration::from_millis(cfg.search.request_timeout_ms),
			flight: Mutex::new(None),
		}
	}

	pub async fn resolve(&self, query: SearchQuery) -> Result<Payload> {
		match query {
			SearchQuery::Text { text } => Ok(Payload::Text(text)),
			SearchQuery::Name(name) => Ok(Payload::Name(name)),
			SearchQuery::Url { url } => {
				let key = SourceKey::Url(url.clone());

				self.extract(key, |err| Error::UrlFetch { message: err }, async {
					self.extraction.url_text(&self.cfg, &url).await
				})
				.await
				.map(Payload::Text)
			},
			SearchQuery::File(file) => {
				let key = SourceKey::File(blake3::hash(&file.bytes));

				self.extract(key, |err| Error::FileRead { message: err }, async {
					self.extraction.pdf_text(&self.cfg, &file).await
				})
				.await
				.map(Payload::Text)
			},
		}
	}

	async fn extract<F, Fut>(&self, key: SourceKey, fail: F, request: Fut) -> Result<String>
	where
		F: Fn(String) -> Error,
		Fut: Future<Output = cs_providers::Result<String>>,
	{
		let mut flight = self.flight.lock().await;

		if let Some(resolved) = flight.as_ref().filter(|resolved| resolved.key == key) {
			tracing::debug!("Reusing extracted text.");

			return Ok(resolved.text.clone());
		}

		let text = match time::timeout(self.timeout, request).await {
			Ok(Ok(text)) => text,
			Ok(Err(err)) => return Err(fail(err.to_string())),
			Err(_) => {
				tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Extraction timed out.");

				return Err(fail(format!(
					"No response within {} ms.",
					self.timeout.as_millis()
				)));
			},
		};

		if text.trim().is_empty() {
			return Err(fail("Extraction returned no text.".to_string()));
		}

		*flight = Some(Resolved { key, text: text.clone() });

		Ok(text)
	}
}
