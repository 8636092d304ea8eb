mod error;

pub use axum::http::StatusCode;
pub use error::{Error, Result};

use std::{
	collections::HashMap,
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{
	Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, Uri, header},
	response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::{net::TcpListener, task::JoinHandle, time};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str =
	include_str!("../../cs-config/tests/fixtures/sample_config.template.toml");

/// A canned reply for one path.
#[derive(Debug, Clone)]
pub struct Reply {
	pub status: StatusCode,
	pub content_type: &'static str,
	pub body: Vec<u8>,
	pub delay: Duration,
}
impl Reply {
	pub fn json(value: Value) -> Self {
		Self {
			status: StatusCode::OK,
			content_type: "application/json",
			body: value.to_string().into_bytes(),
			delay: Duration::ZERO,
		}
	}

	pub fn text(text: &str) -> Self {
		Self {
			status: StatusCode::OK,
			content_type: "text/plain; charset=utf-8",
			body: text.as_bytes().to_vec(),
			delay: Duration::ZERO,
		}
	}

	pub fn status(status: StatusCode) -> Self {
		Self { status, ..Self::text("") }
	}

	pub fn delayed(mut self, delay: Duration) -> Self {
		self.delay = delay;

		self
	}
}

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct Captured {
	pub path: String,
	pub content_type: Option<String>,
	pub body: Vec<u8>,
}
impl Captured {
	pub fn json(&self) -> Option<Value> {
		serde_json::from_slice(&self.body).ok()
	}
}

#[derive(Default)]
struct StubState {
	replies: Mutex<HashMap<String, Reply>>,
	captured: Mutex<Vec<Captured>>,
}

/// An HTTP server on an ephemeral local port that answers every path from a reply table and
/// records what it was sent. Unknown paths get 404.
pub struct StubServer {
	addr: SocketAddr,
	state: Arc<StubState>,
	handle: JoinHandle<()>,
}
impl StubServer {
	pub async fn start() -> Result<Self> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let state = Arc::new(StubState::default());
		let app = Router::new().fallback(answer).with_state(state.clone());
		let handle = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, app).await {
				eprintln!("Stub server stopped: {err}.");
			}
		});

		Ok(Self { addr, state, handle })
	}

	pub fn url(&self) -> String {
		format!("http://{}", self.addr)
	}

	pub fn reply(&self, path: &str, reply: Reply) {
		self.state
			.replies
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(path.to_string(), reply);
	}

	pub fn captured(&self, path: &str) -> Vec<Captured> {
		self.state
			.captured
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.filter(|request| request.path == path)
			.cloned()
			.collect()
	}

	pub fn hits(&self, path: &str) -> usize {
		self.captured(path).len()
	}

	pub fn total_hits(&self) -> usize {
		self.state.captured.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}
impl Drop for StubServer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

/// The sample configuration with both services pointed at `backend` and `extraction`.
pub fn config(backend: &str, extraction: &str) -> Result<cs_config::Config> {
	let mut cfg = cs_config::parse(SAMPLE_CONFIG_TEMPLATE_TOML)?;

	cfg.backend.api_base = backend.trim_end_matches('/').to_string();
	cfg.extraction.api_base = extraction.trim_end_matches('/').to_string();

	cs_config::validate(&cfg)?;

	Ok(cfg)
}

/// Like [`config`], with every timeout set to `timeout`.
pub fn config_with_timeout(
	backend: &str,
	extraction: &str,
	timeout: Duration,
) -> Result<cs_config::Config> {
	let mut cfg = config(backend, extraction)?;
	let millis = u64::try_from(timeout.as_millis())
		.map_err(|_| Error::Message("Timeout does not fit in milliseconds.".to_string()))?
		.max(1);

	cfg.backend.timeout_ms = millis;
	cfg.extraction.timeout_ms = millis;
	cfg.search.request_timeout_ms = millis;

	Ok(cfg)
}

async fn answer(
	State(state): State<Arc<StubState>>,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let path = uri.path().to_string();
	let content_type =
		headers.get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_string);

	state.captured.lock().unwrap_or_else(|err| err.into_inner()).push(Captured {
		path: path.clone(),
		content_type,
		body: body.to_vec(),
	});

	let reply = state.replies.lock().unwrap_or_else(|err| err.into_inner()).get(&path).cloned();
	let Some(reply) = reply else {
		return StatusCode::NOT_FOUND.into_response();
	};

	if !reply.delay.is_zero() {
		time::sleep(reply.delay).await;
	}

	(reply.status, [(header::CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}
