pub mod catalog;
pub mod extraction;
pub mod lookup;
pub mod ranking;
pub mod votes;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{HeaderMap, HeaderName},
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Builds the static headers sent with every request to a service.
pub fn request_headers(default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key:?} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) fn client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

pub(crate) fn endpoint(api_base: &str, path: &str) -> String {
	format!("{}{}", api_base.trim_end_matches('/'), path)
}

pub(crate) async fn post_json<B>(
	api_base: &str,
	path: &str,
	timeout_ms: u64,
	default_headers: &Map<String, Value>,
	body: &B,
) -> Result<Value>
where
	B: ?Sized + Serialize,
{
	let url = endpoint(api_base, path);

	tracing::debug!(%url, "Posting request.");

	let res = client(timeout_ms)?
		.post(url)
		.headers(request_headers(default_headers)?)
		.json(body)
		.send()
		.await?;

	Ok(res.error_for_status()?.json().await?)
}

pub(crate) async fn get_json(
	api_base: &str,
	path: &str,
	timeout_ms: u64,
	default_headers: &Map<String, Value>,
) -> Result<Value> {
	let url = endpoint(api_base, path);

	tracing::debug!(%url, "Fetching resource.");

	let res = client(timeout_ms)?.get(url).headers(request_headers(default_headers)?).send().await?;

	Ok(res.error_for_status()?.json().await?)
}
