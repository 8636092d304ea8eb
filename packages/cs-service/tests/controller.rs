use std::{
	collections::{BTreeMap, HashMap},
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};

use serde_json::{Map, Value, json};
use tokio::sync::Notify;

use cs_config::{Backend, Config, Extraction};
use cs_domain::{
	Article, Author, AuthorProfile, FileHandle, Mode, ParamValue, PersonName, Plot, RankedItems,
	ResultSet, Target, Vote,
};
use cs_service::{
	AddressBar, BoxFuture, Error, ExtractionProvider, Feedback, Phase, PlotOutcome, Preferences,
	Presentation, Providers, RankingProvider, ResultSink, ResultTab, SearchController,
	SearchOutcome,
};

const NO_MATCH: &str = "nothing";

struct Gate {
	arrived: Notify,
	release: Notify,
}

#[derive(Default)]
struct FakeBackend {
	requests: Mutex<Vec<(&'static str, Value)>>,
	gates: Mutex<HashMap<String, Arc<Gate>>>,
	extracted: Mutex<String>,
	settings: Mutex<Map<String, Value>>,
	fail_ranking: AtomicBool,
	hang: AtomicBool,
}
impl FakeBackend {
	fn record(&self, endpoint: &'static str, body: Value) {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).push((endpoint, body));
	}

	fn requests(&self, endpoint: &str) -> Vec<Value> {
		self.requests
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.filter(|(name, _)| *name == endpoint)
			.map(|(_, body)| body.clone())
			.collect()
	}

	fn total_requests(&self) -> usize {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	/// Holds calls keyed by `key` until released.
	fn gate(&self, key: &str) -> Arc<Gate> {
		let gate = Arc::new(Gate { arrived: Notify::new(), release: Notify::new() });

		self.gates
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(key.to_string(), gate.clone());

		gate
	}

	fn set_extracted(&self, text: &str) {
		*self.extracted.lock().unwrap_or_else(|err| err.into_inner()) = text.to_string();
	}

	fn extracted(&self) -> String {
		self.extracted.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	async fn pass(&self, key: &str) {
		if self.hang.load(Ordering::SeqCst) {
			std::future::pending::<()>().await;
		}

		let gate = self.gates.lock().unwrap_or_else(|err| err.into_inner()).get(key).cloned();

		if let Some(gate) = gate {
			gate.arrived.notify_one();
			gate.release.notified().await;
		}
	}

	async fn rank(
		&self,
		endpoint: &'static str,
		target: Target,
		body: &Map<String, Value>,
	) -> cs_providers::Result<ResultSet> {
		self.record(endpoint, Value::Object(body.clone()));

		let query = body.get("query").and_then(Value::as_str).unwrap_or_default().to_string();

		self.pass(&query).await;

		if self.fail_ranking.load(Ordering::SeqCst) {
			return Err(cs_providers::Error::InvalidResponse {
				message: "Internal Server Error".to_string(),
			});
		}

		let with_plot = body.get("with_plot") == Some(&Value::Bool(true));
		let hits = if query == NO_MATCH { 0 } else { 1 };
		let items = match target {
			Target::Authors => RankedItems::Authors((0..hits).map(|_| author(&query)).collect()),
			Target::Articles => RankedItems::Articles(
				(0..hits)
					.map(|_| Article {
						doi: format!("10.1000/{}", query.len()),
						title: query.clone(),
						author_id: "1".to_string(),
						distance: Some(0.1),
					})
					.collect(),
			),
		};
		let plot = with_plot.then(|| Plot(json!({ "query": query })));

		Ok(ResultSet { items, plot })
	}
}
impl RankingProvider for FakeBackend {
	fn search_authors<'a>(
		&'a self,
		_cfg: &'a Backend,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<ResultSet>> {
		Box::pin(self.rank("search_authors", Target::Authors, body))
	}

	fn search_articles<'a>(
		&'a self,
		_cfg: &'a Backend,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<ResultSet>> {
		Box::pin(self.rank("search_articles", Target::Articles, body))
	}

	fn get_author<'a>(
		&'a self,
		_cfg: &'a Backend,
		name: &'a PersonName,
	) -> BoxFuture<'a, cs_providers::Result<AuthorProfile>> {
		Box::pin(async move {
			self.record(
				"get_author",
				json!({ "first_name": name.first_name, "last_name": name.last_name }),
			);

			Ok(AuthorProfile { author: author(&name.last_name), articles: Vec::new() })
		})
	}

	fn get_author_by_id<'a>(
		&'a self,
		_cfg: &'a Backend,
		author_id: &'a str,
	) -> BoxFuture<'a, cs_providers::Result<AuthorProfile>> {
		Box::pin(async move {
			self.record("get_author_by_id", json!({ "author_id": author_id }));

			Ok(AuthorProfile {
				author: Author { id: author_id.to_string(), ..author("Public") },
				articles: vec![json!({ "doi": "10.1000/1", "title": "On Things" })],
			})
		})
	}

	fn default_settings<'a>(
		&'a self,
		_cfg: &'a Backend,
	) -> BoxFuture<'a, cs_providers::Result<Map<String, Value>>> {
		Box::pin(async move {
			self.record("default_settings", Value::Null);

			Ok(self.settings.lock().unwrap_or_else(|err| err.into_inner()).clone())
		})
	}

	fn units<'a>(
		&'a self,
		_cfg: &'a Backend,
	) -> BoxFuture<'a, cs_providers::Result<BTreeMap<String, String>>> {
		Box::pin(async move {
			self.record("units", Value::Null);

			Ok(BTreeMap::from([("12".to_string(), "Statistics".to_string())]))
		})
	}
}
impl ExtractionProvider for FakeBackend {
	fn url_text<'a>(
		&'a self,
		_cfg: &'a Extraction,
		url: &'a str,
	) -> BoxFuture<'a, cs_providers::Result<String>> {
		Box::pin(async move {
			self.record("url_text", json!({ "url": url }));
			self.pass(url).await;

			Ok(self.extracted())
		})
	}

	fn pdf_text<'a>(
		&'a self,
		_cfg: &'a Extraction,
		file: &'a FileHandle,
	) -> BoxFuture<'a, cs_providers::Result<String>> {
		Box::pin(async move {
			self.record("pdf_text", json!({ "name": file.name }));
			self.pass(&file.name).await;

			Ok(self.extracted())
		})
	}

	fn submit_vote<'a>(
		&'a self,
		_cfg: &'a Extraction,
		body: &'a Map<String, Value>,
	) -> BoxFuture<'a, cs_providers::Result<()>> {
		Box::pin(async move {
			self.record("vote", Value::Object(body.clone()));

			Ok(())
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
	Results(ResultSet),
	Profile(AuthorProfile),
	Empty(String),
	Plot(Plot),
	Clear(String),
	Notify(String),
	Alert(String),
	ShowBusy,
	HideBusy,
	Address(String),
}

#[derive(Default)]
struct Recorder {
	events: Mutex<Vec<Event>>,
}
impl Recorder {
	fn push(&self, event: Event) {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).push(event);
	}

	fn events(&self) -> Vec<Event> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn count<F>(&self, predicate: F) -> usize
	where
		F: Fn(&Event) -> bool,
	{
		self.events().iter().filter(|event| predicate(event)).count()
	}

	fn last_address(&self) -> Option<String> {
		self.events().into_iter().rev().find_map(|event| match event {
			Event::Address(address) => Some(address),
			_ => None,
		})
	}

	fn assert_busy_balanced(&self) {
		let shown = self.count(|event| matches!(event, Event::ShowBusy));
		let hidden = self.count(|event| matches!(event, Event::HideBusy));

		assert_eq!(shown, hidden, "Busy indicator out of balance: {:?}", self.events());
	}
}
impl ResultSink for Recorder {
	fn show_results(&self, results: &ResultSet) {
		self.push(Event::Results(results.clone()));
	}

	fn show_author_profile(&self, profile: &AuthorProfile) {
		self.push(Event::Profile(profile.clone()));
	}

	fn show_empty(&self, message: &str) {
		self.push(Event::Empty(message.to_string()));
	}

	fn show_plot(&self, plot: &Plot) {
		self.push(Event::Plot(plot.clone()));
	}

	fn clear(&self, placeholder: &str) {
		self.push(Event::Clear(placeholder.to_string()));
	}
}
impl Feedback for Recorder {
	fn notify(&self, message: &str) {
		self.push(Event::Notify(message.to_string()));
	}

	fn alert(&self, message: &str) {
		self.push(Event::Alert(message.to_string()));
	}

	fn show_busy(&self) {
		self.push(Event::ShowBusy);
	}

	fn hide_busy(&self) {
		self.push(Event::HideBusy);
	}
}
impl AddressBar for Recorder {
	fn replace(&self, query_string: &str) {
		self.push(Event::Address(query_string.to_string()));
	}
}

struct Harness {
	cfg: Config,
	controller: SearchController,
	backend: Arc<FakeBackend>,
	recorder: Arc<Recorder>,
	preferences: Arc<Preferences>,
}

fn author(last_name: &str) -> Author {
	Author {
		id: last_name.len().to_string(),
		first_name: "Jane".to_string(),
		last_name: last_name.to_string(),
		community_name: None,
		score: Some(0.5),
	}
}

fn test_config() -> Config {
	cs_testkit::config("http://127.0.0.1:9", "http://127.0.0.1:9")
		.expect("Failed to build test config.")
}

fn harness(address: &str) -> Harness {
	harness_with(test_config(), Preferences::in_memory(), address)
}

fn harness_with(cfg: Config, preferences: Preferences, address: &str) -> Harness {
	let backend = Arc::new(FakeBackend::default());
	let recorder = Arc::new(Recorder::default());
	let preferences = Arc::new(preferences);
	let presentation = Presentation {
		sink: recorder.clone(),
		feedback: recorder.clone(),
		address: recorder.clone(),
	};
	let controller = SearchController::open(
		cfg.clone(),
		Providers::new(backend.clone(), backend.clone()),
		presentation,
		preferences.clone(),
		address,
	);

	Harness { cfg, controller, backend, recorder, preferences }
}

fn displayed_last_names(recorder: &Recorder) -> Vec<String> {
	recorder
		.events()
		.into_iter()
		.filter_map(|event| match event {
			Event::Results(ResultSet { items: RankedItems::Authors(authors), .. }) =>
				Some(authors.into_iter().map(|author| author.last_name).collect::<Vec<_>>()),
			_ => None,
		})
		.flatten()
		.collect()
}

#[tokio::test]
async fn empty_text_is_rejected_without_requests() {
	let h = harness("kind=text&target=authors");
	let outcome = h.controller.search().await;

	assert_eq!(outcome, SearchOutcome::Rejected(Error::EmptyInput { mode: Mode::Text }));
	assert_eq!(h.backend.total_requests(), 0);
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Notify(_))), 1);
	assert!(h.recorder.events().contains(&Event::Notify(h.cfg.messages.empty_query.clone())));
	assert_eq!(h.recorder.count(|event| matches!(event, Event::ShowBusy)), 0);
	assert_eq!(h.controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn single_token_name_is_rejected() {
	let h = harness("kind=name&query=Cher");
	let outcome = h.controller.search().await;

	assert_eq!(
		outcome,
		SearchOutcome::Rejected(Error::InvalidName { input: "Cher".to_string() })
	);
	assert_eq!(h.backend.total_requests(), 0);
	assert!(h.recorder.events().contains(&Event::Notify(h.cfg.messages.invalid_name.clone())));
}

#[tokio::test]
async fn name_mode_looks_up_first_and_last_token() {
	let h = harness("kind=name&query=Jane%20Q.%20Public&top_k=25");
	let outcome = h.controller.search().await;

	assert_eq!(outcome, SearchOutcome::Profile);
	assert_eq!(
		h.backend.requests("get_author"),
		vec![json!({ "first_name": "Jane", "last_name": "Public" })]
	);
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Profile(_))), 1);
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Results(_))), 0);
	assert_eq!(
		h.recorder.last_address().as_deref(),
		Some("kind=name&target=authors&query=Jane%20Q.%20Public")
	);
}

#[tokio::test]
async fn switching_to_name_prunes_top_k_from_address() {
	let h = harness("kind=text&query=Jane%20Public&top_k=25");

	h.controller.set_mode(Mode::Name);

	assert_eq!(
		h.recorder.last_address().as_deref(),
		Some("kind=name&target=authors&query=Jane%20Public")
	);
	assert!(!h.controller.state().hyperparameters().contains("top_k"));
}

#[tokio::test]
async fn last_search_wins() {
	let h = harness("kind=text&target=authors&query=first");
	let gate = h.backend.gate("first");
	let (first, second) = tokio::join!(h.controller.search(), async {
		gate.arrived.notified().await;

		h.controller.set_text("second");

		let outcome = h.controller.search().await;

		gate.release.notify_one();

		outcome
	});

	assert_eq!(first, SearchOutcome::Superseded);
	assert_eq!(second, SearchOutcome::Displayed { count: 1 });
	assert_eq!(displayed_last_names(&h.recorder), vec!["second".to_string()]);
	assert_eq!(h.backend.requests("search_authors").len(), 2);
	assert_eq!(h.controller.phase(), Phase::Displaying);
	assert_eq!(
		h.recorder.last_address().as_deref(),
		Some("kind=text&target=authors&query=second")
	);
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn zero_results_show_empty_message() {
	let h = harness("kind=text&target=authors&query=nothing");
	let outcome = h.controller.search().await;

	assert_eq!(outcome, SearchOutcome::Empty);
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Results(_))), 0);
	assert!(h.recorder.events().contains(&Event::Empty(h.cfg.messages.no_authors.clone())));
	assert_eq!(h.controller.phase(), Phase::Empty);
}

#[tokio::test]
async fn zero_articles_use_article_message() {
	let h = harness("kind=text&target=articles&query=nothing");

	assert_eq!(h.controller.search().await, SearchOutcome::Empty);
	assert!(h.recorder.events().contains(&Event::Empty(h.cfg.messages.no_articles.clone())));
}

#[tokio::test]
async fn busy_indicator_is_balanced_on_every_outcome() {
	let h = harness("kind=text&target=authors&query=graphs");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });

	h.controller.set_text(NO_MATCH);

	assert_eq!(h.controller.search().await, SearchOutcome::Empty);

	h.backend.fail_ranking.store(true, Ordering::SeqCst);
	h.controller.set_text("graphs");

	assert!(matches!(
		h.controller.search().await,
		SearchOutcome::Failed(Error::Connection { .. })
	));
	assert_eq!(h.recorder.count(|event| matches!(event, Event::ShowBusy)), 3);
	h.recorder.assert_busy_balanced();
	assert!(h.recorder.events().contains(&Event::Alert(h.cfg.messages.connection_failure.clone())));
	assert_eq!(h.controller.phase(), Phase::Error);
}

#[tokio::test]
async fn plot_is_fetched_once_when_plot_tab_opens() {
	let h = harness("kind=text&target=authors&query=graphs");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(h.backend.requests("search_authors")[0].get("with_plot"), None);
	assert_eq!(h.controller.select_tab(ResultTab::Plot).await, PlotOutcome::Fetched);

	let requests = h.backend.requests("search_authors");

	assert_eq!(requests.len(), 2);
	assert_eq!(requests[1].get("with_plot"), Some(&Value::Bool(true)));
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Results(_))), 1);
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Plot(_))), 1);

	assert_eq!(h.controller.select_tab(ResultTab::List).await, PlotOutcome::Hidden);
	assert_eq!(h.controller.select_tab(ResultTab::Plot).await, PlotOutcome::Cached);
	assert_eq!(h.backend.requests("search_authors").len(), 2);
	assert!(!h.recorder.last_address().unwrap_or_default().contains("with_plot"));
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn open_plot_tab_fetches_plot_after_results() {
	let h = harness("kind=text&target=articles&query=graphs");

	assert_eq!(h.controller.select_tab(ResultTab::Plot).await, PlotOutcome::Unavailable);
	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });

	let displays: Vec<Event> = h
		.recorder
		.events()
		.into_iter()
		.filter(|event| matches!(event, Event::Results(_) | Event::Plot(_)))
		.collect();

	assert_eq!(displays.len(), 2);
	assert!(matches!(displays[0], Event::Results(_)));
	assert!(matches!(displays[1], Event::Plot(_)));
	assert_eq!(h.backend.requests("search_articles").len(), 2);
}

#[tokio::test]
async fn requested_plot_needs_no_second_request() {
	let h = harness("kind=text&target=authors&query=graphs&with_plot=true");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(h.controller.select_tab(ResultTab::Plot).await, PlotOutcome::Cached);
	assert_eq!(h.backend.requests("search_authors").len(), 1);
}

#[tokio::test]
async fn stale_plot_never_lands_on_newer_results() {
	let h = harness("kind=text&target=authors&query=first");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });

	let first = h.backend.gate("first");
	let second = h.backend.gate("second");

	h.controller.set_text("second");

	let (searched, plotted) = tokio::join!(h.controller.search(), async {
		second.arrived.notified().await;

		let (plotted, ()) = tokio::join!(h.controller.select_tab(ResultTab::Plot), async {
			first.arrived.notified().await;
			// The newer search returns, then asks for its own plot.
			second.release.notify_one();
			second.arrived.notified().await;
			second.release.notify_one();

			while h.recorder.count(|event| matches!(event, Event::Plot(_))) == 0 {
				tokio::task::yield_now().await;
			}

			first.release.notify_one();
		});

		plotted
	});

	assert_eq!(searched, SearchOutcome::Displayed { count: 1 });
	assert_eq!(plotted, PlotOutcome::Superseded);

	let plots: Vec<Event> = h
		.recorder
		.events()
		.into_iter()
		.filter(|event| matches!(event, Event::Plot(_)))
		.collect();

	assert_eq!(plots, vec![Event::Plot(Plot(json!({ "query": "second" })))]);
	assert_eq!(h.controller.select_tab(ResultTab::List).await, PlotOutcome::Hidden);
	assert_eq!(h.controller.select_tab(ResultTab::Plot).await, PlotOutcome::Cached);
	assert_eq!(
		h.recorder.events().into_iter().rfind(|event| matches!(event, Event::Plot(_))),
		Some(Event::Plot(Plot(json!({ "query": "second" }))))
	);
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn votes_wait_for_pending_search() {
	let h = harness("kind=text&target=authors&query=first");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });

	let gate = h.backend.gate("second");

	h.controller.set_text("second");

	let (searched, voted) = tokio::join!(h.controller.search(), async {
		gate.arrived.notified().await;

		let voted = h.controller.vote(Vote::Up).await;

		gate.release.notify_one();

		voted
	});

	assert_eq!(searched, SearchOutcome::Displayed { count: 1 });
	assert!(matches!(voted, Err(Error::InvalidState { .. })));
	assert!(h.backend.requests("vote").is_empty());

	h.controller.vote(Vote::Up).await.expect("Vote on settled results failed.");

	assert_eq!(h.backend.requests("vote")[0].get("query"), Some(&json!("second")));
}

#[tokio::test]
async fn url_text_is_ranked() {
	let h = harness("kind=url&target=articles&query=https%3A%2F%2Fexample.org%2Fpaper");

	h.backend.set_extracted("Graph learning for proteins.");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(
		h.backend.requests("url_text"),
		vec![json!({ "url": "https://example.org/paper" })]
	);
	assert_eq!(
		h.backend.requests("search_articles")[0].get("query"),
		Some(&json!("Graph learning for proteins."))
	);
}

#[tokio::test]
async fn empty_extraction_aborts_before_ranking() {
	let h = harness("kind=url&query=https%3A%2F%2Fexample.org%2Fblank");

	h.backend.set_extracted("   ");

	assert!(matches!(h.controller.search().await, SearchOutcome::Failed(Error::UrlFetch { .. })));
	assert!(h.backend.requests("search_authors").is_empty());
	assert!(h.recorder.events().contains(&Event::Alert(h.cfg.messages.url_fetch_failure.clone())));
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn blank_pdf_extraction_is_a_file_read_failure() {
	let h = harness("kind=pdf&target=authors");

	h.backend.set_extracted("\n  \n");
	h.controller.set_file(Some(FileHandle::new("scan.pdf", b"%PDF-1.4".to_vec())));

	assert!(matches!(h.controller.search().await, SearchOutcome::Failed(Error::FileRead { .. })));
	assert_eq!(h.backend.requests("pdf_text"), vec![json!({ "name": "scan.pdf" })]);
	assert!(h.backend.requests("search_authors").is_empty());
	assert!(h.recorder.events().contains(&Event::Alert(h.cfg.messages.file_read_failure.clone())));
	assert_eq!(h.controller.phase(), Phase::Error);
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn extraction_timeouts_keep_their_source_error() {
	let cfg = cs_testkit::config_with_timeout(
		"http://127.0.0.1:9",
		"http://127.0.0.1:9",
		Duration::from_millis(50),
	)
	.expect("Failed to build test config.");
	let h = harness_with(cfg, Preferences::in_memory(), "kind=url&query=https%3A%2F%2Fslow.org");

	h.backend.hang.store(true, Ordering::SeqCst);

	assert!(matches!(h.controller.search().await, SearchOutcome::Failed(Error::UrlFetch { .. })));
	assert!(h.recorder.events().contains(&Event::Alert(h.cfg.messages.url_fetch_failure.clone())));

	h.controller.set_file(Some(FileHandle::new("slow.pdf", b"%PDF-1.4".to_vec())));

	assert!(matches!(h.controller.search().await, SearchOutcome::Failed(Error::FileRead { .. })));
	assert!(h.recorder.events().contains(&Event::Alert(h.cfg.messages.file_read_failure.clone())));
	assert!(h.backend.requests("search_authors").is_empty());
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn missing_file_is_rejected() {
	let h = harness("kind=pdf");

	assert_eq!(
		h.controller.search().await,
		SearchOutcome::Rejected(Error::EmptyInput { mode: Mode::Pdf })
	);
	assert!(h.recorder.events().contains(&Event::Notify(h.cfg.messages.empty_file.clone())));
}

#[tokio::test]
async fn concurrent_pdf_searches_extract_once() {
	let h = harness("kind=pdf&target=articles");

	h.backend.set_extracted("Extracted abstract.");
	h.controller.set_file(Some(FileHandle::new("paper.pdf", b"%PDF-1.7".to_vec())));

	let gate = h.backend.gate("paper.pdf");
	let (first, second) = tokio::join!(h.controller.search(), async {
		gate.arrived.notified().await;

		let (second, ()) = tokio::join!(h.controller.search(), async {
			gate.release.notify_one();
		});

		second
	});

	assert_eq!(first, SearchOutcome::Superseded);
	assert_eq!(second, SearchOutcome::Displayed { count: 1 });
	assert_eq!(h.backend.requests("pdf_text").len(), 1);
	assert_eq!(h.backend.requests("search_articles").len(), 1);
	assert_eq!(h.controller.address(), "kind=pdf&target=articles");
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn unchanged_file_reuses_extracted_text() {
	let h = harness("kind=pdf");

	h.backend.set_extracted("Extracted abstract.");
	h.controller.set_file(Some(FileHandle::new("paper.pdf", b"%PDF-1.7".to_vec())));

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(h.backend.requests("pdf_text").len(), 1);

	h.controller.set_file(Some(FileHandle::new("paper.pdf", b"%PDF-1.7 v2".to_vec())));

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(h.backend.requests("pdf_text").len(), 2);
}

#[tokio::test]
async fn unresponsive_backend_times_out() {
	let cfg = cs_testkit::config_with_timeout(
		"http://127.0.0.1:9",
		"http://127.0.0.1:9",
		Duration::from_millis(50),
	)
	.expect("Failed to build test config.");
	let h = harness_with(cfg, Preferences::in_memory(), "kind=text&query=graphs");

	h.backend.hang.store(true, Ordering::SeqCst);

	assert!(matches!(
		h.controller.search().await,
		SearchOutcome::Failed(Error::Connection { .. })
	));
	assert_eq!(h.controller.phase(), Phase::Error);
	assert!(h.recorder.events().contains(&Event::Alert(h.cfg.messages.connection_failure.clone())));
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn request_body_carries_active_parameters_only() {
	let h = harness("kind=text&target=articles&query=graphs&since_year=2010&pow=2&utm_source=mail");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(
		h.backend.requests("search_articles")[0],
		json!({ "query": "graphs", "since_year": 2010, "top_k": 10 })
	);
	assert!(h.controller.address().contains("utm_source=mail"));
}

#[tokio::test]
async fn votes_are_accepted_once_per_result_set() {
	let h = harness("kind=text&target=authors&query=graphs&top_k=5");

	assert!(matches!(h.controller.vote(Vote::Up).await, Err(Error::InvalidState { .. })));
	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });

	h.controller.vote(Vote::Up).await.expect("Vote failed.");

	assert_eq!(
		h.backend.requests("vote"),
		vec![json!({
			"kind": "text",
			"target": "authors",
			"query": "graphs",
			"top_k": 5,
			"vote": "up"
		})]
	);
	assert!(matches!(h.controller.vote(Vote::Down).await, Err(Error::InvalidState { .. })));
	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });

	h.controller.vote(Vote::Down).await.expect("Vote on new results failed.");

	assert_eq!(h.backend.requests("vote").len(), 2);
}

#[tokio::test]
async fn author_drill_down_shows_profile() {
	let h = harness("kind=text&query=graphs");

	assert_eq!(h.controller.search().await, SearchOutcome::Displayed { count: 1 });
	assert_eq!(h.controller.open_author("42").await, SearchOutcome::Profile);
	assert_eq!(h.backend.requests("get_author_by_id"), vec![json!({ "author_id": "42" })]);

	let Some(Event::Profile(profile)) =
		h.recorder.events().into_iter().rfind(|event| matches!(event, Event::Profile(_)))
	else {
		panic!("Expected a profile.");
	};

	assert_eq!(profile.author.id, "42");
	assert_eq!(profile.articles.len(), 1);
	assert!(matches!(h.controller.vote(Vote::Up).await, Err(Error::InvalidState { .. })));
}

#[tokio::test]
async fn blank_author_id_is_rejected() {
	let h = harness("kind=text&query=graphs");
	let outcome = h.controller.open_author("  ").await;

	assert!(matches!(outcome, SearchOutcome::Rejected(Error::InvalidState { .. })));
	assert!(h.backend.requests("get_author_by_id").is_empty());
	assert!(!h.recorder.events().contains(&Event::Notify(h.cfg.messages.empty_name.clone())));
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Notify(_))), 1);
}

#[tokio::test]
async fn default_settings_fill_missing_keys_only() {
	let h = harness("kind=text&target=authors&query=graphs&n=7");

	*h.backend.settings.lock().unwrap_or_else(|err| err.into_inner()) = match json!({
		"m": 500,
		"n": 5,
		"pow": 3.0,
		"ks": 1.0
	}) {
		Value::Object(settings) => settings,
		_ => unreachable!(),
	};

	assert_eq!(h.controller.load_default_settings().await, Ok(2));

	let state = h.controller.state();

	assert_eq!(state.hyperparameters().get("n"), Some(&ParamValue::Integer(7)));
	assert_eq!(state.hyperparameters().get("m"), Some(&ParamValue::Integer(500)));
	assert_eq!(state.hyperparameters().get("pow"), Some(&ParamValue::Float(3.0)));
	assert!(!state.hyperparameters().contains("ks"));
}

#[tokio::test]
async fn clear_resets_screen_and_drops_pending_search() {
	let h = harness("kind=text&query=graphs");
	let gate = h.backend.gate("graphs");
	let (outcome, ()) = tokio::join!(h.controller.search(), async {
		gate.arrived.notified().await;

		h.controller.clear();

		gate.release.notify_one();
	});

	assert_eq!(outcome, SearchOutcome::Superseded);
	assert_eq!(h.recorder.count(|event| matches!(event, Event::Results(_))), 0);
	assert!(h.recorder.events().contains(&Event::Clear(h.cfg.messages.placeholder.clone())));
	assert_eq!(h.controller.phase(), Phase::Idle);
	assert_eq!(h.recorder.last_address().as_deref(), Some("kind=text&target=authors"));
	h.recorder.assert_busy_balanced();
}

#[tokio::test]
async fn on_load_searches_only_with_query() {
	let idle = harness("kind=text&target=articles");

	assert_eq!(idle.controller.on_load().await, None);
	assert_eq!(idle.backend.total_requests(), 0);
	assert_eq!(idle.recorder.last_address().as_deref(), Some("kind=text&target=articles"));

	let loaded = harness("?kind=text&target=articles&query=graphs");

	assert_eq!(loaded.controller.on_load().await, Some(SearchOutcome::Displayed { count: 1 }));
}

#[tokio::test]
async fn advanced_toggle_is_remembered_and_prunes() {
	let h = harness("kind=text&query=graphs");

	h.controller.set_advanced(true).expect("Failed to enable advanced view.");
	h.controller.set_param("ks", ParamValue::Float(2.0));

	assert!(h.preferences.stored().advanced);
	assert!(h.controller.address().contains("ks=2"));

	h.controller.set_advanced(false).expect("Failed to disable advanced view.");

	assert!(!h.controller.address().contains("ks="));
	assert!(!h.preferences.stored().advanced);
}

#[tokio::test]
async fn stored_advanced_preference_seeds_state() {
	let preferences = Preferences::in_memory();

	preferences.set("advanced", Value::Bool(true)).expect("Failed to store preference.");

	let h = harness_with(test_config(), preferences, "kind=text&ks=2&kr=0");
	let state = h.controller.state();

	assert!(state.advanced());
	assert_eq!(state.hyperparameters().get("ks"), Some(&ParamValue::Float(2.0)));
	assert_eq!(state.hyperparameters().get("kr"), Some(&ParamValue::Float(0.0)));
}

#[tokio::test]
async fn units_are_listed() {
	let h = harness("");
	let units = h.controller.units().await.expect("Failed to list units.");

	assert_eq!(units.get("12").map(String::as_str), Some("Statistics"));
}
