use serde_json::{Map, Value};

use crate::Result;

/// Records a result-quality vote. The response body is ignored.
pub async fn submit(cfg: &cs_config::Extraction, body: &Map<String, Value>) -> Result<()> {
	let endpoint = crate::endpoint(&cfg.api_base, &cfg.votes_path);
	let res = crate::client(cfg.timeout_ms)?
		.post(endpoint)
		.headers(crate::request_headers(&cfg.default_headers)?)
		.json(body)
		.send()
		.await?;

	res.error_for_status()?;

	Ok(())
}
