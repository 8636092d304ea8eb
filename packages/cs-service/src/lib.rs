pub mod controller;
pub mod preferences;
pub mod resolver;
pub mod sink;

mod error;

pub use controller::{PlotOutcome, Phase, ResultTab, SearchController, SearchOutcome};
pub use error::{Error, Result};
pub use preferences::{JsonFileStore, MemoryStore, PreferenceChange, PreferenceStore, Preferences};
pub use resolver::{InputResolver, Payload};
pub use sink::{AddressBar, Feedback, Presentation, ResultSink};

use std::{collections::BTreeMap, future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};

use cs_config::{Backend, Extraction};
use cs_domain::{AuthorProfile, FileHandle, PersonName, ResultSet};
use cs_providers::{catalog, extraction, lookup, ranking, votes};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The ranking and lookup API.
pub trait RankingProvider
where
	Self: Send + Sync,
{
	fn search_authors<'a>(
		&'a self,
		cfg: &'a Backend,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<ResultSet>>;

	fn search_articles<'a>(
		&'a self,
		cfg: &'a Backend,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<ResultSet>>;

	fn get_author<'a>(
		&'a self,
		cfg: &'a Backend,
		name: &'a PersonName,
	) -> BoxFuture<'a, cs_providers::Result<AuthorProfile>>;

	fn get_author_by_id<'a>(
		&'a self,
		cfg: &'a Backend,
		author_id: &'a str,
	) -> BoxFuture<'a, cs_providers::Result<AuthorProfile>>;

	fn default_settings<'a>(
		&'a self,
		cfg: &'a Backend,
	) -> BoxFuture<'a, cs_providers::Result<Map<String, Value>>>;

	fn units<'a>(
		&'a self,
		cfg: &'a Backend,
	) -> BoxFuture<'a, cs_providers::Result<BTreeMap<String, String>>>;
}

/// The text-extraction and feedback web service.
pub trait ExtractionProvider
where
	Self: Send + Sync,
{
	fn url_text<'a>(
		&'a self,
		cfg: &'a Extraction,
		url: &'a str,
	) -> BoxFuture<'a, cs_providers::Result<String>>;

	fn pdf_text<'a>(
		&'a self,
		cfg: &'a Extraction,
		file: &'a FileHandle,
	) -> BoxFuture<'a, cs_providers::Result<String>>;

	fn submit_vote<'a>(
		&'a self,
		cfg: &'a Extraction,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub ranking: Arc<dyn RankingProvider>,
	pub extraction: Arc<dyn ExtractionProvider>,
}
impl Providers {
	pub fn new(ranking: Arc<dyn RankingProvider>, extraction: Arc<dyn ExtractionProvider>) -> Self {
		Self { ranking, extraction }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(HttpProviders);

		Self { ranking: provider.clone(), extraction: provider }
	}
}

struct HttpProviders;
impl RankingProvider for HttpProviders {
	fn search_authors<'a>(
		&'a self,
		cfg: &'a Backend,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<ResultSet>> {
		Box::pin(ranking::search_authors(cfg, body))
	}

	fn search_articles<'a>(
		&'a self,
		cfg: &'a Backend,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<ResultSet>> {
		Box::pin(ranking::search_articles(cfg, body))
	}

	fn get_author<'a>(
		&'a self,
		cfg: &'a Backend,
		name: &'a PersonName,
	) -> BoxFuture<'a, cs_providers::Result<AuthorProfile>> {
		Box::pin(lookup::get_author(cfg, name))
	}

	fn get_author_by_id<'a>(
		&'a self,
		cfg: &'a Backend,
		author_id: &'a str,
	) -> BoxFuture<'a, cs_providers::Result<AuthorProfile>> {
		Box::pin(lookup::get_author_by_id(cfg, author_id))
	}

	fn default_settings<'a>(
		&'a self,
		cfg: &'a Backend,
	) -> BoxFuture<'a, cs_providers::Result<Map<String, Value>>> {
		Box::pin(catalog::default_settings(cfg))
	}

	fn units<'a>(
		&'a self,
		cfg: &'a Backend,
	) -> BoxFuture<'a, cs_providers::Result<BTreeMap<String, String>>> {
		Box::pin(catalog::units(cfg))
	}
}
impl ExtractionProvider for HttpProviders {
	fn url_text<'a>(
		&'a self,
		cfg: &'a Extraction,
		url: &'a str,
	) -> BoxFuture<'a, cs_providers::Result<String>> {
		Box::pin(extraction::url_text(cfg, url))
	}

	fn pdf_text<'a>(
		&'a self,
		cfg: &'a Extraction,
		file: &'a FileHandle,
	) -> BoxFuture<'a, cs_providers::Result<String>> {
		Box::pin(extraction::pdf_text(cfg, file))
	}

	fn submit_vote<'a>(
		&'a self,
		cfg: &'a Extraction,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<()>> {
		Box::pin(votes::submit(cfg, body))
	}
}
