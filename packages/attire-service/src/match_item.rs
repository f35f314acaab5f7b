use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AttireService, Error, Result};
use attire_domain::similarity::{self, Candidate};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRequest {
	pub embedding: Vec<f32>,
	pub garment_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchResponse {
	pub matched: bool,
	pub item_id: Option<Uuid>,
	pub similarity: Option<f32>,
	pub image_url: Option<String>,
	/// Echoed back on no-match so the caller can seed a new item without
	/// re-embedding the photo.
	pub embedding: Option<Vec<f32>>,
}

impl AttireService {
	/// Scans every sample of every item of the given type and picks the best
	/// match above the configured threshold. Brute force over the whole
	/// gallery set; a personal wardrobe is small enough that no index is
	/// warranted.
	pub async fn match_against_type(&self, req: MatchRequest) -> Result<MatchResponse> {
		let garment_type = crate::parse_garment_type(&req.garment_type)?;

		similarity::validate_embedding(&req.embedding)?;

		let items = self.stores.items.list_by_type(garment_type).await?;
		let mut candidates = Vec::new();

		for item in &items {
			for sample in &item.samples {
				candidates.push(Candidate { item_id: item.item_id, embedding: &sample.embedding });
			}
		}

		let hit = similarity::best_match(&req.embedding, &candidates, self.cfg.matching.threshold)?;
		let Some(hit) = hit else {
			return Ok(MatchResponse {
				matched: false,
				item_id: None,
				similarity: None,
				image_url: None,
				embedding: Some(req.embedding),
			});
		};
		// The winner came out of `items`, so the lookup cannot miss.
		let item = items.iter().find(|item| item.item_id == hit.item_id).ok_or_else(|| {
			Error::Storage { message: format!("Matched item {} vanished mid-scan.", hit.item_id) }
		})?;
		let image_url = match item.samples.first() {
			Some(sample) =>
				Some(self.providers.images.resolve(&self.cfg.providers.images, &sample.image_ref).await?),
			None => None,
		};

		Ok(MatchResponse {
			matched: true,
			item_id: Some(hit.item_id),
			similarity: Some(hit.score),
			image_url,
			embedding: None,
		})
	}
}
