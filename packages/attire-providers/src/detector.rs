use std::time::Duration;

use base64::Engine;
use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// One garment the detector located, already cropped to its bounding box.
/// `garment_type` is the provider's label; callers decide which labels they
/// track.
#[derive(Clone, Debug)]
pub struct DetectedGarment {
	pub garment_type: String,
	pub crop: Vec<u8>,
	pub confidence: f32,
}

/// Asks the vision endpoint to detect and crop garments in one photo.
/// Detection and pixel cropping are a single external collaborator; the core
/// never touches image geometry.
pub async fn detect_garments(
	cfg: &attire_config::ProviderConfig,
	image: &[u8],
) -> Result<Vec<DetectedGarment>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let encoded = base64::engine::general_purpose::STANDARD.encode(image);
	let body = serde_json::json!({
		"model": cfg.model,
		"image": { "bytesBase64Encoded": encoded },
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_detection_response(json)
}

fn parse_detection_response(json: Value) -> Result<Vec<DetectedGarment>> {
	let garments = json
		.get("garments")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Detection response is missing garments array."))?;
	let mut detected = Vec::with_capacity(garments.len());

	for garment in garments {
		if !garment.get("detected").and_then(|v| v.as_bool()).unwrap_or(false) {
			continue;
		}

		let garment_type = garment
			.get("type")
			.and_then(|v| v.as_str())
			.ok_or_else(|| eyre::eyre!("Detected garment is missing type."))?
			.to_string();
		let encoded = garment
			.get("crop")
			.and_then(|c| c.get("bytesBase64Encoded"))
			.and_then(|v| v.as_str())
			.ok_or_else(|| eyre::eyre!("Detected garment is missing crop bytes."))?;
		let crop = base64::engine::general_purpose::STANDARD
			.decode(encoded)
			.map_err(|err| eyre::eyre!("Detected garment crop is not valid base64: {err}."))?;
		let confidence =
			garment.get("confidence").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;

		detected.push(DetectedGarment { garment_type, crop, confidence });
	}

	Ok(detected)
}
