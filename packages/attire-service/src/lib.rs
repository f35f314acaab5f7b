pub mod add_item;
pub mod confirm;
pub mod delete_image;
pub mod items;
pub mod match_item;
pub mod process_photo;
pub mod statistics;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

pub use add_item::{AddItemRequest, AddItemResponse};
pub use confirm::{ConfirmRequest, ConfirmResponse};
pub use delete_image::{DeleteImageRequest, DeleteImageResponse};
pub use items::ItemImagesResponse;
pub use match_item::{MatchRequest, MatchResponse};
pub use process_photo::{
	GarmentOutcome, ProcessManualCropRequest, ProcessPhotoRequest, ProcessPhotoResponse,
};
pub use statistics::{ItemStat, StatisticsResponse, Totals};

use attire_config::{Config, EmbeddingProviderConfig, ImageStoreConfig, ProviderConfig};
use attire_domain::GarmentType;
use attire_providers::{detector::DetectedGarment, embedding, images};
use attire_storage::{ItemStore, WearLogStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns image bytes into a normalized 1408-dim embedding.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed_image<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		image: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

/// Detects garments in a photo and hands back their crops. Detection and
/// pixel cropping are one collaborator; the core never sees geometry.
pub trait GarmentDetector
where
	Self: Send + Sync,
{
	fn detect<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		image: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<DetectedGarment>>>;
}

/// Blob storage for photos and crops. Refs are opaque strings; display URLs
/// are temporary and never persisted.
pub trait ImageStore
where
	Self: Send + Sync,
{
	fn upload<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		bytes: Vec<u8>,
		prefix: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;

	fn delete<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		image_ref: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>>;

	fn resolve<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		image_ref: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub detector: Arc<dyn GarmentDetector>,
	pub images: Arc<dyn ImageStore>,
}

/// Store handles, passed in explicitly so tests can substitute in-memory
/// fakes.
#[derive(Clone)]
pub struct Stores {
	pub items: Arc<dyn ItemStore>,
	pub wear_logs: Arc<dyn WearLogStore>,
}

pub struct AttireService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed_image<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		image: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(embedding::embed_image(cfg, image))
	}
}

impl GarmentDetector for DefaultProviders {
	fn detect<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		image: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<DetectedGarment>>> {
		Box::pin(attire_providers::detector::detect_garments(cfg, image))
	}
}

impl ImageStore for DefaultProviders {
	fn upload<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		bytes: Vec<u8>,
		prefix: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(images::upload(cfg, bytes, prefix))
	}

	fn delete<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		image_ref: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(images::delete(cfg, image_ref))
	}

	fn resolve<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		image_ref: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(images::resolve(cfg, image_ref))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		detector: Arc<dyn GarmentDetector>,
		images: Arc<dyn ImageStore>,
	) -> Self {
		Self { embedding, detector, images }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), detector: provider.clone(), images: provider }
	}
}

impl AttireService {
	pub fn new(cfg: Config, stores: Stores) -> Self {
		Self { cfg, stores, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, stores: Stores, providers: Providers) -> Self {
		Self { cfg, stores, providers }
	}
}

pub(crate) fn parse_garment_type(raw: &str) -> Result<GarmentType> {
	GarmentType::parse(raw).ok_or_else(|| Error::InvalidRequest {
		message: format!("Unknown garment type {raw:?}; expected shirt or pants."),
	})
}

pub(crate) fn validate_confidence(score: f32) -> Result<f32> {
	if !score.is_finite() || !(0.0..=1.0).contains(&score) {
		return Err(Error::InvalidRequest {
			message: format!("Confidence score must be within 0.0-1.0, got {score}."),
		});
	}

	Ok(score)
}
