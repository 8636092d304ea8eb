//! Plain-text extraction for URL and PDF input.

use reqwest::multipart::{Form, Part};

use cs_domain::FileHandle;

use crate::Result;

const PDF_MIME: &str = "application/pdf";

/// Fetches the readable text behind `url`. An empty string means nothing could be extracted.
pub async fn url_text(cfg: &cs_config::Extraction, url: &str) -> Result<String> {
	let endpoint = crate::endpoint(&cfg.api_base, &cfg.url_path);
	let body = serde_json::json!({ "url": url });

	tracing::debug!(%endpoint, "Requesting URL extraction.");

	let res = crate::client(cfg.timeout_ms)?
		.post(endpoint)
		.headers(crate::request_headers(&cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let raw = res.error_for_status()?.text().await?;

	Ok(parse_extracted_text(&raw))
}

/// Uploads `file` as the multipart `file` field and returns the extracted text.
pub async fn pdf_text(cfg: &cs_config::Extraction, file: &FileHandle) -> Result<String> {
	let endpoint = crate::endpoint(&cfg.api_base, &cfg.pdf_path);
	let part = Part::bytes(file.bytes.to_vec()).file_name(file.name.clone()).mime_str(PDF_MIME)?;
	let form = Form::new().part("file", part);

	tracing::debug!(%endpoint, bytes = file.len(), "Uploading document for extraction.");

	let res = crate::client(cfg.timeout_ms)?
		.post(endpoint)
		.headers(crate::request_headers(&cfg.default_headers)?)
		.multipart(form)
		.send()
		.await?;
	let raw = res.error_for_status()?.text().await?;

	Ok(parse_extracted_text(&raw))
}

// Some deployments answer with a JSON string rather than a bare body.
fn parse_extracted_text(raw: &str) -> String {
	let trimmed = raw.trim();

	if trimmed.starts_with('"')
		&& let Ok(text) = serde_json::from_str::<String>(trimmed)
	{
		return text.trim().to_string();
	}

	trimmed.to_string()
}
