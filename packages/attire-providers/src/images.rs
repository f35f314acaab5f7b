use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

fn client(cfg: &attire_config::ImageStoreConfig) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?)
}

/// Uploads image bytes under the given key prefix and returns the opaque blob
/// reference the store assigned.
pub async fn upload(
	cfg: &attire_config::ImageStoreConfig,
	bytes: Vec<u8>,
	prefix: &str,
) -> Result<String> {
	let url = format!("{}/buckets/{}/objects?prefix={prefix}", cfg.api_base, cfg.bucket);
	let res = client(cfg)?
		.post(url)
		.bearer_auth(&cfg.api_key)
		.header(reqwest::header::CONTENT_TYPE, "image/jpeg")
		.body(bytes)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_ref_response(json)
}

/// Deletes a blob. Deleting an already-absent blob is the store's concern;
/// callers only see transport and status failures.
pub async fn delete(cfg: &attire_config::ImageStoreConfig, image_ref: &str) -> Result<()> {
	let url = format!("{}/buckets/{}/objects/{image_ref}", cfg.api_base, cfg.bucket);

	client(cfg)?.delete(url).bearer_auth(&cfg.api_key).send().await?.error_for_status()?;

	Ok(())
}

/// Exchanges an opaque blob reference for a temporary display URL.
pub async fn resolve(cfg: &attire_config::ImageStoreConfig, image_ref: &str) -> Result<String> {
	let url = format!("{}/buckets/{}/signed-url/{image_ref}", cfg.api_base, cfg.bucket);
	let res = client(cfg)?.get(url).bearer_auth(&cfg.api_key).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_url_response(json)
}

fn parse_ref_response(json: Value) -> Result<String> {
	json.get("ref")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.ok_or_else(|| eyre::eyre!("Upload response is missing ref."))
}

fn parse_url_response(json: Value) -> Result<String> {
	json.get("url")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.ok_or_else(|| eyre::eyre!("Signed URL response is missing url."))
}
