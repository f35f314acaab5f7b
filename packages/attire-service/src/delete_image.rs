use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AttireService, Error, Result};
use attire_domain::gallery;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteImageRequest {
	pub item_id: Uuid,
	pub index: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteImageResponse {
	pub item_deleted: bool,
	pub remaining_samples: Option<usize>,
}

impl AttireService {
	/// Removes one sample's image. Deleting the last sample cascades: wear
	/// logs first, then the item document, then the blob — so a crash
	/// mid-sequence leaves at worst an orphaned blob, never a dangling
	/// reference. A blob-delete failure after the document mutation is
	/// logged and swallowed for the same reason.
	pub async fn delete_image(&self, req: DeleteImageRequest) -> Result<DeleteImageResponse> {
		let item = self
			.stores
			.items
			.get(req.item_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Item {} not found.", req.item_id) })?;

		if req.index >= item.samples.len() {
			let issue = gallery::InvalidIndex { index: req.index, len: item.samples.len() };

			return Err(Error::InvalidRequest { message: issue.to_string() });
		}

		let image_ref = item.samples[req.index].image_ref.clone();

		if item.samples.len() == 1 {
			let removed_logs = self.stores.wear_logs.delete_by_item(req.item_id).await?;

			self.stores.items.delete(req.item_id).await?;

			tracing::info!(
				item_id = %req.item_id,
				removed_logs,
				"Deleted item along with its last sample."
			);

			self.delete_blob(&image_ref, req.item_id).await;

			return Ok(DeleteImageResponse { item_deleted: true, remaining_samples: None });
		}

		let mut samples = item.samples;
		// Bounds were checked above; removal compacts the remaining indices.
		let remaining = gallery::remove_at(&mut samples, req.index)
			.map_err(|issue| Error::InvalidRequest { message: issue.to_string() })?;

		self.stores.items.replace_samples(req.item_id, samples).await?;
		self.delete_blob(&image_ref, req.item_id).await;

		Ok(DeleteImageResponse { item_deleted: false, remaining_samples: Some(remaining) })
	}

	async fn delete_blob(&self, image_ref: &str, item_id: Uuid) {
		if let Err(err) = self.providers.images.delete(&self.cfg.providers.images, image_ref).await
		{
			tracing::warn!(
				%item_id,
				image_ref,
				error = %err,
				"Blob delete failed; orphaned blob left behind."
			);
		}
	}
}
