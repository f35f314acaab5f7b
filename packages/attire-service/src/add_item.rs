use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{AttireService, Result};
use attire_domain::{Sample, similarity};
use attire_storage::models::{NewItem, WearLogEntry};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddItemRequest {
	pub garment_type: String,
	/// Blob reference of the cropped garment image; becomes sample 0.
	pub cropped_ref: String,
	pub embedding: Vec<f32>,
	/// Blob reference of the original photo, recorded on the wear log when
	/// `log_wear` is set.
	pub source_ref: String,
	pub log_wear: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddItemResponse {
	pub item_id: Uuid,
}

impl AttireService {
	/// Creates a wardrobe item seeded with its first sample, optionally
	/// logging the sighting as a wear event.
	pub async fn add_item(&self, req: AddItemRequest) -> Result<AddItemResponse> {
		let garment_type = crate::parse_garment_type(&req.garment_type)?;

		similarity::validate_embedding(&req.embedding)?;

		let now = OffsetDateTime::now_utc();
		let item_id = self
			.stores
			.items
			.create(NewItem {
				garment_type,
				sample: Sample { embedding: req.embedding, image_ref: req.cropped_ref },
				created_at: now,
				last_worn: req.log_wear.then_some(now),
				wear_count: i64::from(req.log_wear),
			})
			.await?;

		if req.log_wear {
			self.stores
				.wear_logs
				.append(WearLogEntry {
					log_id: Uuid::new_v4(),
					item_id,
					garment_type,
					worn_at: now,
					confidence_score: 1.0,
					source_image_ref: req.source_ref,
				})
				.await?;
		}

		tracing::info!(%item_id, garment_type = garment_type.as_str(), "Created wardrobe item.");

		Ok(AddItemResponse { item_id })
	}
}
