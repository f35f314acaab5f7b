use serde::{Deserialize, Serialize};

use crate::{AttireService, MatchRequest, Result};
use attire_domain::GarmentType;

#[derive(Clone, Debug)]
pub struct ProcessPhotoRequest {
	pub image: Vec<u8>,
}

/// Manual alternative to detection: the user crops the garments themselves,
/// so only the supplied regions are processed.
#[derive(Clone, Debug)]
pub struct ProcessManualCropRequest {
	pub image: Vec<u8>,
	pub shirt_crop: Option<Vec<u8>>,
	pub pants_crop: Option<Vec<u8>>,
}

/// Per-garment result of one photo pass. Each garment type resolves
/// independently, so one type can fail while its sibling matches.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GarmentOutcome {
	Matched {
		item_id: uuid::Uuid,
		similarity: f32,
		image_url: Option<String>,
		cropped_ref: String,
		cropped_url: String,
	},
	Unmatched {
		embedding: Vec<f32>,
		cropped_ref: String,
		cropped_url: String,
	},
	Failed {
		message: String,
	},
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessPhotoResponse {
	pub original_ref: String,
	pub original_url: String,
	pub shirt: Option<GarmentOutcome>,
	pub pants: Option<GarmentOutcome>,
}

impl AttireService {
	/// Full photo pipeline: upload the original, detect garments, then embed,
	/// upload, and match each crop. Garment types resolve independently; a
	/// provider failure on one type becomes a `Failed` outcome instead of
	/// aborting the whole photo.
	pub async fn process_photo(&self, req: ProcessPhotoRequest) -> Result<ProcessPhotoResponse> {
		let images_cfg = &self.cfg.providers.images;
		let original_ref =
			self.providers.images.upload(images_cfg, req.image.clone(), "originals").await?;
		let original_url = self.providers.images.resolve(images_cfg, &original_ref).await?;
		let detected =
			self.providers.detector.detect(&self.cfg.providers.detector, &req.image).await?;
		let mut shirt = None;
		let mut pants = None;

		for garment in detected {
			// Labels outside the tracked vocabulary are ignored, not errors.
			let Some(garment_type) = GarmentType::parse(&garment.garment_type) else {
				tracing::debug!(label = garment.garment_type, "Skipping untracked garment label.");

				continue;
			};
			let slot = match garment_type {
				GarmentType::Shirt => &mut shirt,
				GarmentType::Pants => &mut pants,
			};

			if slot.is_some() {
				continue;
			}

			*slot = Some(self.garment_outcome(garment_type, &garment.crop).await);
		}

		Ok(ProcessPhotoResponse { original_ref, original_url, shirt, pants })
	}

	/// Like `process_photo`, but with user-supplied crops instead of detector
	/// output. Absent crops are simply skipped; supplied ones still resolve
	/// independently.
	pub async fn process_manual_crop(
		&self,
		req: ProcessManualCropRequest,
	) -> Result<ProcessPhotoResponse> {
		let images_cfg = &self.cfg.providers.images;
		let original_ref =
			self.providers.images.upload(images_cfg, req.image, "originals").await?;
		let original_url = self.providers.images.resolve(images_cfg, &original_ref).await?;
		let mut shirt = None;
		let mut pants = None;

		if let Some(crop) = req.shirt_crop {
			shirt = Some(self.garment_outcome(GarmentType::Shirt, &crop).await);
		}
		if let Some(crop) = req.pants_crop {
			pants = Some(self.garment_outcome(GarmentType::Pants, &crop).await);
		}

		Ok(ProcessPhotoResponse { original_ref, original_url, shirt, pants })
	}

	async fn garment_outcome(&self, garment_type: GarmentType, crop: &[u8]) -> GarmentOutcome {
		match self.resolve_garment(garment_type, crop).await {
			Ok(outcome) => outcome,
			Err(err) => {
				tracing::warn!(
					garment_type = garment_type.as_str(),
					error = %err,
					"Garment pipeline failed; other types continue."
				);

				GarmentOutcome::Failed { message: err.to_string() }
			},
		}
	}

	async fn resolve_garment(
		&self,
		garment_type: GarmentType,
		crop: &[u8],
	) -> Result<GarmentOutcome> {
		let images_cfg = &self.cfg.providers.images;
		let embedding =
			self.providers.embedding.embed_image(&self.cfg.providers.embedding, crop).await?;
		let cropped_ref =
			self.providers.images.upload(images_cfg, crop.to_vec(), "crops").await?;
		let cropped_url = self.providers.images.resolve(images_cfg, &cropped_ref).await?;
		let matched = self
			.match_against_type(MatchRequest {
				embedding,
				garment_type: garment_type.as_str().to_string(),
			})
			.await?;

		if matched.matched {
			// `match_against_type` always fills these fields on a hit.
			let (Some(item_id), Some(similarity)) = (matched.item_id, matched.similarity) else {
				return Err(crate::Error::Storage {
					message: "Match reported a hit without an item.".to_string(),
				});
			};

			return Ok(GarmentOutcome::Matched {
				item_id,
				similarity,
				image_url: matched.image_url,
				cropped_ref,
				cropped_url,
			});
		}

		Ok(GarmentOutcome::Unmatched {
			embedding: matched.embedding.unwrap_or_default(),
			cropped_ref,
			cropped_url,
		})
	}
}
