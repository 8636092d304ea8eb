//! Sequences validation, input resolution, ranking and result dispatch for one search screen.
//!
//! Every network call is tagged with the screen's current request token. A response whose
//! token is no longer current is dropped without touching presentation, so the most recent
//! search always wins.

use std::{
	collections::BTreeMap,
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

use serde_json::{Map, Value};
use tokio::time;

use cs_config::Config;
use cs_domain::{
	AuthorProfile, FileHandle, Mode, ParamValue, ResultSet, SearchInput, SearchQuery, SearchState,
	StateDefaults, Target, Theme, Vote, codec, params, preferences,
};

use crate::{
	Error, InputResolver, Payload, Preferences, Presentation, Providers, Result, sink::BusyGuard,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Resolving,
	Requesting,
	Displaying,
	Empty,
	Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultTab {
	#[default]
	List,
	Plot,
}

/// How one `search()` (or drill-down) ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
	Displayed { count: usize },
	Profile,
	Empty,
	/// Rejected locally. Nothing was sent.
	Rejected(Error),
	Failed(Error),
	/// A newer search took over before this one finished.
	Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotOutcome {
	/// The list tab was selected.
	Hidden,
	/// A plot was fetched and shown.
	Fetched,
	/// The displayed results already carried a plot.
	Cached,
	/// No ranked results are displayed, or the backend returned none.
	Unavailable,
	Failed(Error),
	Superseded,
}

struct Displayed {
	/// The search that produced these results.
	token: u64,
	results: ResultSet,
	target: Target,
	request: Map<String, Value>,
	vote: Map<String, Value>,
	voted: bool,
}

struct Screen {
	state: SearchState,
	phase: Phase,
	tab: ResultTab,
	token: u64,
	displayed: Option<Displayed>,
}

pub struct SearchController {
	cfg: Config,
	providers: Providers,
	resolver: InputResolver,
	presentation: Presentation,
	preferences: Arc<Preferences>,
	timeout: Duration,
	screen: Mutex<Screen>,
}
impl SearchController {
	/// Builds the screen state from `address` and the stored preferences.
	pub fn open(
		cfg: Config,
		providers: Providers,
		presentation: Presentation,
		preferences: Arc<Preferences>,
		address: &str,
	) -> Self {
		let defaults = StateDefaults {
			mode: cfg.search.default_mode.parse().unwrap_or(Mode::Text),
			target: cfg.search.default_target.parse().unwrap_or(Target::Authors),
		};
		let state = codec::read(address, &preferences.stored(), defaults);
		let resolver = InputResolver::new(&cfg, providers.extraction.clone());
		let timeout = Duration::from_millis(cfg.search.request_timeout_ms);

		Self {
			cfg,
			providers,
			resolver,
			presentation,
			preferences,
			timeout,
			screen: Mutex::new(Screen {
				state,
				phase: Phase::Idle,
				tab: ResultTab::default(),
				token: 0,
				displayed: None,
			}),
		}
	}

	/// Page-load entry: optionally seeds server defaults, then searches if the address carried
	/// a query.
	pub async fn on_load(&self) -> Option<SearchOutcome> {
		if self.cfg.search.fetch_default_settings
			&& let Err(err) = self.load_default_settings().await
		{
			tracing::warn!(error = %err, "Failed to load default settings.");
		}

		let has_query = {
			let screen = self.lock();

			match screen.state.input().text() {
				Some(text) => !text.trim().is_empty(),
				None => false,
			}
		};

		self.write_address();

		if has_query { Some(self.search().await) } else { None }
	}

	pub async fn search(&self) -> SearchOutcome {
		let (token, state, query) = {
			let mut screen = self.lock();

			screen.token += 1;

			(screen.token, screen.state.clone(), screen.state.query())
		};
		let query = match query {
			Ok(query) => query,
			Err(err) => return self.reject(token, err.into()),
		};

		tracing::info!(token, mode = %query.mode(), target = %state.target(), "Search dispatched.");

		let busy = BusyGuard::show(self.presentation.feedback.as_ref());
		let outcome = self.run_search(token, &state, query).await;

		drop(busy);

		if !matches!(outcome, SearchOutcome::Superseded) {
			self.write_address();
		}

		outcome
	}

	/// Drops any pending response, empties the input and resets presentation.
	pub fn clear(&self) {
		{
			let mut screen = self.lock();

			screen.token += 1;
			screen.phase = Phase::Idle;
			screen.displayed = None;

			screen.state.clear_input();

			self.presentation.sink.clear(&self.cfg.messages.placeholder);
		}

		self.write_address();
	}

	/// Switches the result view. The plot tab fetches a plot once if the displayed results lack
	/// one; the list region is never redrawn.
	pub async fn select_tab(&self, tab: ResultTab) -> PlotOutcome {
		let (token, request, target) = {
			let mut screen = self.lock();

			screen.tab = tab;

			if tab == ResultTab::List {
				return PlotOutcome::Hidden;
			}

			let Some(displayed) = screen.displayed.as_ref() else {
				return PlotOutcome::Unavailable;
			};

			if let Some(plot) = displayed.results.plot.as_ref() {
				self.presentation.sink.show_plot(plot);

				return PlotOutcome::Cached;
			}

			(displayed.token, displayed.request.clone(), displayed.target)
		};
		let _busy = BusyGuard::show(self.presentation.feedback.as_ref());

		self.fetch_plot(token, request, target).await
	}

	/// Shows the profile of an author picked from a result list.
	pub async fn open_author(&self, author_id: &str) -> SearchOutcome {
		let token = {
			let mut screen = self.lock();

			screen.token += 1;

			screen.token
		};

		if author_id.trim().is_empty() {
			return self.reject(
				token,
				Error::InvalidState { message: "No author was selected.".to_string() },
			);
		}

		let _busy = BusyGuard::show(self.presentation.feedback.as_ref());

		self.set_phase(token, Phase::Requesting);

		let fetched = self
			.bounded(self.providers.ranking.get_author_by_id(&self.cfg.backend, author_id))
			.await;

		self.show_profile(token, fetched)
	}

	/// Records a quality vote on the displayed results. Allowed once per displayed result set;
	/// a failed submission can be retried.
	pub async fn vote(&self, vote: Vote) -> Result<()> {
		let (token, body) = {
			let mut screen = self.lock();
			let current = screen.token;
			let Some(displayed) = screen.displayed.as_mut() else {
				return Err(Error::InvalidState {
					message: "No ranked results are displayed.".to_string(),
				});
			};

			if displayed.token != current {
				return Err(Error::InvalidState {
					message: "A newer search is still pending.".to_string(),
				});
			}

			if displayed.voted {
				return Err(Error::InvalidState {
					message: "These results were already voted on.".to_string(),
				});
			}

			displayed.voted = true;

			let mut body = displayed.vote.clone();

			body.insert("vote".to_string(), Value::from(vote.as_str()));

			(displayed.token, body)
		};

		if let Err(err) =
			self.bounded(self.providers.extraction.submit_vote(&self.cfg.extraction, &body)).await
		{
			let mut screen = self.lock();

			if let Some(displayed) = screen.displayed.as_mut()
				&& displayed.token == token
			{
				displayed.voted = false;
			}

			return Err(err);
		}

		tracing::info!(token, vote = vote.as_str(), "Vote recorded.");

		Ok(())
	}

	/// Fetches the server's default hyperparameters and seeds the ones the state lacks.
	/// Returns how many keys were seeded.
	pub async fn load_default_settings(&self) -> Result<usize> {
		let settings =
			self.bounded(self.providers.ranking.default_settings(&self.cfg.backend)).await?;
		let seeded = self.update(|state| {
			let mut seeded = 0;

			for (key, value) in &settings {
				let Some(spec) = params::spec(key) else {
					continue;
				};

				if state.hyperparameters().contains(key)
					|| !spec.is_active(state.mode(), state.target(), state.advanced())
				{
					continue;
				}

				let value = match value {
					Value::Bool(flag) => ParamValue::Boolean(*flag),
					Value::Number(number) => match (number.as_i64(), number.as_f64()) {
						(Some(integer), _) => ParamValue::Integer(integer),
						(None, Some(float)) => ParamValue::Float(float),
						(None, None) => continue,
					},
					Value::String(text) => ParamValue::Text(text.clone()),
					_ => continue,
				};

				state.set_param(key, value);

				if state.hyperparameters().contains(key) {
					seeded += 1;
				}
			}

			seeded
		});

		tracing::info!(seeded, "Default settings loaded.");

		Ok(seeded)
	}

	pub async fn units(&self) -> Result<BTreeMap<String, String>> {
		self.bounded(self.providers.ranking.units(&self.cfg.backend)).await
	}

	/// Mutates the state in place, re-normalizes it and refreshes the address.
	pub fn update<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&mut SearchState) -> R,
	{
		let out = {
			let mut screen = self.lock();
			let out = f(&mut screen.state);

			screen.state.prune();

			out
		};

		self.write_address();

		out
	}

	pub fn set_mode(&self, mode: Mode) {
		self.update(|state| state.set_mode(mode));
	}

	pub fn set_target(&self, target: Target) {
		self.update(|state| state.set_target(target));
	}

	pub fn set_text(&self, text: &str) {
		self.update(|state| state.set_text(text));
	}

	pub fn set_file(&self, file: Option<FileHandle>) {
		self.update(|state| state.set_file(file));
	}

	pub fn set_param(&self, key: &str, value: ParamValue) {
		self.update(|state| state.set_param(key, value));
	}

	/// Toggles the advanced options view and remembers the choice.
	pub fn set_advanced(&self, advanced: bool) -> Result<()> {
		self.preferences.set(preferences::ADVANCED_KEY, Value::Bool(advanced))?;
		self.update(|state| state.set_advanced(advanced));

		Ok(())
	}

	pub fn set_theme(&self, theme: Theme) -> Result<()> {
		self.preferences.set(preferences::THEME_KEY, Value::from(theme.as_str()))
	}

	pub fn state(&self) -> SearchState {
		self.lock().state.clone()
	}

	pub fn phase(&self) -> Phase {
		self.lock().phase
	}

	pub fn tab(&self) -> ResultTab {
		self.lock().tab
	}

	/// The shareable query string for the current state.
	pub fn address(&self) -> String {
		codec::write(&self.lock().state)
	}

	async fn run_search(
		&self,
		token: u64,
		state: &SearchState,
		query: SearchQuery,
	) -> SearchOutcome {
		if query.mode().needs_extraction() {
			self.set_phase(token, Phase::Resolving);
		}

		let payload = match self.resolver.resolve(query).await {
			Ok(payload) => payload,
			Err(err) => return self.fail(token, err),
		};

		if !self.set_phase(token, Phase::Requesting) {
			return self.superseded(token);
		}

		match payload {
			Payload::Name(name) => {
				let fetched =
					self.bounded(self.providers.ranking.get_author(&self.cfg.backend, &name)).await;

				self.show_profile(token, fetched)
			},
			Payload::Text(text) => self.rank(token, state, text).await,
		}
	}

	async fn rank(&self, token: u64, state: &SearchState, text: String) -> SearchOutcome {
		let request = self.request_body(state, text);
		let fetched = self.request_ranking(state.target(), &request).await;
		let results = match fetched {
			Ok(results) => results,
			Err(err) => return self.fail(token, err),
		};
		let count = results.len();
		let defer_plot = {
			let mut screen = self.lock();

			if screen.token != token {
				drop(screen);

				return self.superseded(token);
			}

			if results.is_empty() {
				let message = match state.target() {
					Target::Authors => &self.cfg.messages.no_authors,
					Target::Articles => &self.cfg.messages.no_articles,
				};

				screen.phase = Phase::Empty;
				screen.displayed = None;

				self.presentation.sink.show_empty(message);

				tracing::info!(token, "Search returned no results.");

				return SearchOutcome::Empty;
			}

			screen.phase = Phase::Displaying;

			self.presentation.sink.show_results(&results);

			let defer_plot = screen.tab == ResultTab::Plot && results.plot.is_none();

			if screen.tab == ResultTab::Plot
				&& let Some(plot) = results.plot.as_ref()
			{
				self.presentation.sink.show_plot(plot);
			}

			screen.displayed = Some(Displayed {
				token,
				vote: vote_fields(state, &request),
				request: request.clone(),
				target: state.target(),
				results,
				voted: false,
			});

			defer_plot
		};

		tracing::info!(token, count, "Search results displayed.");

		if defer_plot {
			// The list is already visible; a plot failure does not change the search outcome.
			let _ = self.fetch_plot(token, request, state.target()).await;
		}

		SearchOutcome::Displayed { count }
	}

	async fn fetch_plot(
		&self,
		token: u64,
		mut request: Map<String, Value>,
		target: Target,
	) -> PlotOutcome {
		request.insert("with_plot".to_string(), Value::Bool(true));

		let fetched = self.request_ranking(target, &request).await;
		let mut screen = self.lock();
		// The plot belongs to one result set; once another replaced it the plot is dropped.
		let Some(displayed) =
			screen.displayed.as_mut().filter(|displayed| displayed.token == token)
		else {
			tracing::debug!(token, "Discarded stale plot.");

			return PlotOutcome::Superseded;
		};
		let plot = match fetched {
			Ok(results) => results.plot,
			Err(err) => {
				tracing::warn!(token, error = %err, "Plot request failed.");

				self.presentation.feedback.alert(&err.user_message(&self.cfg.messages));

				return PlotOutcome::Failed(err);
			},
		};
		let Some(plot) = plot else {
			return PlotOutcome::Unavailable;
		};

		self.presentation.sink.show_plot(&plot);

		displayed.results.plot = Some(plot);

		PlotOutcome::Fetched
	}

	async fn request_ranking(
		&self,
		target: Target,
		request: &Map<String, Value>,
	) -> Result<ResultSet> {
		match target {
			Target::Authors =>
				self.bounded(self.providers.ranking.search_authors(&self.cfg.backend, request)).await,
			Target::Articles =>
				self.bounded(self.providers.ranking.search_articles(&self.cfg.backend, request))
					.await,
		}
	}

	fn request_body(&self, state: &SearchState, text: String) -> Map<String, Value> {
		let mut body =
			state.hyperparameters().to_request_fields(state.mode(), state.target(), state.advanced());

		body.insert("query".to_string(), Value::String(text));
		body.entry("top_k").or_insert_with(|| Value::from(self.cfg.search.default_top_k));

		body
	}

	fn show_profile(&self, token: u64, fetched: Result<AuthorProfile>) -> SearchOutcome {
		let profile = match fetched {
			Ok(profile) => profile,
			Err(err) => return self.fail(token, err),
		};
		let mut screen = self.lock();

		if screen.token != token {
			drop(screen);

			return self.superseded(token);
		}

		screen.phase = Phase::Displaying;
		screen.displayed = None;

		self.presentation.sink.show_author_profile(&profile);

		tracing::info!(token, author_id = %profile.author.id, "Author profile displayed.");

		SearchOutcome::Profile
	}

	fn reject(&self, token: u64, err: Error) -> SearchOutcome {
		{
			let mut screen = self.lock();

			if screen.token == token {
				screen.phase = Phase::Idle;
			}
		}

		tracing::info!(token, error = %err, "Search rejected.");

		self.presentation.feedback.notify(&err.user_message(&self.cfg.messages));
		self.write_address();

		SearchOutcome::Rejected(err)
	}

	fn fail(&self, token: u64, err: Error) -> SearchOutcome {
		{
			let mut screen = self.lock();

			if screen.token != token {
				drop(screen);

				return self.superseded(token);
			}

			screen.phase = Phase::Error;
			screen.displayed = None;
		}

		tracing::warn!(token, error = %err, "Search failed.");

		self.presentation.feedback.alert(&err.user_message(&self.cfg.messages));

		SearchOutcome::Failed(err)
	}

	fn superseded(&self, token: u64) -> SearchOutcome {
		tracing::debug!(token, "Discarded stale response.");

		SearchOutcome::Superseded
	}

	/// Moves to `phase` if `token` is still current.
	fn set_phase(&self, token: u64, phase: Phase) -> bool {
		let mut screen = self.lock();

		if screen.token != token {
			return false;
		}

		screen.phase = phase;

		true
	}

	async fn bounded<T, Fut>(&self, request: Fut) -> Result<T>
	where
		Fut: Future<Output = cs_providers::Result<T>>,
	{
		match time::timeout(self.timeout, request).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(err)) => Err(Error::Connection { message: err.to_string() }),
			Err(_) => Err(self.timed_out()),
		}
	}

	fn timed_out(&self) -> Error {
		tracing::warn!(timeout_ms = self.cfg.search.request_timeout_ms, "Request timed out.");

		Error::Connection {
			message: format!("No response within {} ms.", self.cfg.search.request_timeout_ms),
		}
	}

	fn write_address(&self) {
		let address = self.address();

		self.presentation.address.replace(&address);
	}

	fn lock(&self) -> MutexGuard<'_, Screen> {
		self.screen.lock().unwrap_or_else(|err| err.into_inner())
	}
}

fn vote_fields(state: &SearchState, request: &Map<String, Value>) -> Map<String, Value> {
	let mut fields = request.clone();
	let query = match state.input() {
		SearchInput::File(Some(file)) => file.name.clone(),
		input => input.text().unwrap_or_default().to_string(),
	};

	fields.insert("kind".to_string(), Value::from(state.mode().as_str()));
	fields.insert("target".to_string(), Value::from(state.target().as_str()));
	fields.insert("query".to_string(), Value::String(query));

	fields
}
