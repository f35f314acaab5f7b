use std::time::Duration;

use base64::Engine;
use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Requests one image embedding from a multimodal embedding endpoint. The
/// provider is expected to return an already L2-normalized vector.
pub async fn embed_image(
	cfg: &attire_config::EmbeddingProviderConfig,
	image: &[u8],
) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let encoded = base64::engine::general_purpose::STANDARD.encode(image);
	let body = serde_json::json!({
		"model": cfg.model,
		"instances": [{ "image": { "bytesBase64Encoded": encoded } }],
		"parameters": { "dimension": cfg.dimensions },
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

fn parse_embedding_response(json: Value) -> Result<Vec<f32>> {
	let embedding = json
		.get("predictions")
		.and_then(|v| v.as_array())
		.and_then(|predictions| predictions.first())
		.and_then(|prediction| prediction.get("imageEmbedding"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing predictions[0].imageEmbedding."))?;
	let mut vec = Vec::with_capacity(embedding.len());

	for value in embedding {
		let number =
			value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;
		vec.push(number as f32);
	}

	Ok(vec)
}
