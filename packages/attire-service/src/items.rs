use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{AttireService, Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemImagesResponse {
	pub item_id: Uuid,
	pub garment_type: String,
	/// Temporary display URLs, one per sample, in gallery order.
	pub image_urls: Vec<String>,
	pub image_count: usize,
	pub wear_count: i64,
	pub last_worn: Option<OffsetDateTime>,
}

impl AttireService {
	pub async fn item_images(&self, item_id: Uuid) -> Result<ItemImagesResponse> {
		let item = self
			.stores
			.items
			.get(item_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Item {item_id} not found.") })?;
		let mut image_urls = Vec::with_capacity(item.samples.len());

		for sample in &item.samples {
			let url =
				self.providers.images.resolve(&self.cfg.providers.images, &sample.image_ref).await?;

			image_urls.push(url);
		}

		Ok(ItemImagesResponse {
			item_id,
			garment_type: item.garment_type.as_str().to_string(),
			image_count: image_urls.len(),
			image_urls,
			wear_count: item.wear_count,
			last_worn: item.last_worn,
		})
	}
}
