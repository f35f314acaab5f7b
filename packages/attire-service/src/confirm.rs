use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{AttireService, Result};
use attire_domain::{Sample, similarity};
use attire_storage::models::{SampleAppend, WearLogEntry};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfirmRequest {
	pub item_id: Uuid,
	pub garment_type: String,
	/// Blob reference of the photo that triggered this confirmation.
	pub source_ref: String,
	/// Match confidence; absent for manual confirmations (recorded as 1.0).
	pub similarity: Option<f32>,
	pub new_embedding: Option<Vec<f32>>,
	pub new_image_ref: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfirmResponse {
	pub item_id: Uuid,
	pub wear_count: i64,
	pub last_worn: OffsetDateTime,
}

impl AttireService {
	/// Records one real-world wear event. Calling this twice means the
	/// garment was worn twice: two increments, two log entries.
	pub async fn confirm(&self, req: ConfirmRequest) -> Result<ConfirmResponse> {
		let garment_type = crate::parse_garment_type(&req.garment_type)?;
		let confidence = match req.similarity {
			Some(score) => crate::validate_confidence(score)?,
			None => 1.0,
		};
		let now = OffsetDateTime::now_utc();
		let stats = self.stores.items.record_wear(req.item_id, now).await?;

		if let (Some(embedding), Some(image_ref)) = (req.new_embedding, req.new_image_ref) {
			similarity::validate_embedding(&embedding)?;

			let sample = Sample { embedding, image_ref };
			let max_samples = self.cfg.matching.max_samples as usize;

			match self.stores.items.append_sample(req.item_id, sample, max_samples).await? {
				SampleAppend::Appended { count } => {
					tracing::debug!(item_id = %req.item_id, count, "Gallery grew by one sample.");
				},
				// Full gallery: the confirmation still counts, the gallery
				// just keeps its existing samples.
				SampleAppend::CapacityReached => {
					tracing::debug!(item_id = %req.item_id, "Gallery at capacity; sample dropped.");
				},
			}
		}

		self.stores
			.wear_logs
			.append(WearLogEntry {
				log_id: Uuid::new_v4(),
				item_id: req.item_id,
				garment_type,
				worn_at: now,
				confidence_score: confidence,
				source_image_ref: req.source_ref,
			})
			.await?;

		Ok(ConfirmResponse {
			item_id: req.item_id,
			wear_count: stats.wear_count,
			last_worn: stats.last_worn,
		})
	}
}
