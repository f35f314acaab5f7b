use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use attire_config::{
	Config, EmbeddingProviderConfig, ImageStoreConfig, Matching, Postgres, ProviderConfig,
	Service, Statistics, Storage,
};
use attire_domain::{EMBEDDING_DIM, GarmentType, Sample};
use attire_providers::detector::DetectedGarment;
use attire_service::{
	AddItemRequest, AttireService, BoxFuture, ConfirmRequest, DeleteImageRequest,
	EmbeddingProvider, Error, GarmentDetector, GarmentOutcome, ImageStore, MatchRequest,
	ProcessManualCropRequest, ProcessPhotoRequest, Providers, Stores,
};
use attire_storage::{ItemStore, WearLogStore, models::NewItem};
use attire_testkit::{MemoryItemStore, MemoryWearLogStore, angled_embedding, axis_embedding};

fn test_config() -> Config {
	Config {
		service: Service { log_level: "info".into() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://localhost/attire_test".into(), pool_max_conns: 2 },
		},
		providers: attire_config::Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "fake".into(),
				api_base: "http://embedding.invalid".into(),
				api_key: "k".into(),
				path: "/embed".into(),
				model: "multimodal".into(),
				dimensions: EMBEDDING_DIM as u32,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
			detector: ProviderConfig {
				provider_id: "fake".into(),
				api_base: "http://detector.invalid".into(),
				api_key: "k".into(),
				path: "/detect".into(),
				model: "vision".into(),
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
			images: ImageStoreConfig {
				api_base: "http://images.invalid".into(),
				api_key: "k".into(),
				bucket: "wardrobe".into(),
				timeout_ms: 1_000,
			},
		},
		matching: Matching::default(),
		statistics: Statistics::default(),
	}
}

/// Embedder keyed by crop bytes; unseen crops fail like a provider outage.
#[derive(Default)]
struct FakeEmbedder {
	by_crop: HashMap<Vec<u8>, Vec<f32>>,
}

impl EmbeddingProvider for FakeEmbedder {
	fn embed_image<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		image: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		let result = self
			.by_crop
			.get(image)
			.cloned()
			.ok_or_else(|| color_eyre::eyre::eyre!("Embedding endpoint refused the image."));

		Box::pin(async move { result })
	}
}

#[derive(Default)]
struct FakeDetector {
	garments: Vec<DetectedGarment>,
}

impl GarmentDetector for FakeDetector {
	fn detect<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_image: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<DetectedGarment>>> {
		let garments = self.garments.clone();

		Box::pin(async move { Ok(garments) })
	}
}

/// Blob store fake that hands out sequential refs and records every call.
#[derive(Default)]
struct FakeImages {
	counter: AtomicUsize,
	uploads: Mutex<Vec<String>>,
	deletes: Mutex<Vec<String>>,
}

impl ImageStore for FakeImages {
	fn upload<'a>(
		&'a self,
		_cfg: &'a ImageStoreConfig,
		_bytes: Vec<u8>,
		prefix: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		let n = self.counter.fetch_add(1, Ordering::SeqCst);
		let image_ref = format!("{prefix}/{n}");

		self.uploads.lock().unwrap().push(image_ref.clone());

		Box::pin(async move { Ok(image_ref) })
	}

	fn delete<'a>(
		&'a self,
		_cfg: &'a ImageStoreConfig,
		image_ref: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		self.deletes.lock().unwrap().push(image_ref.to_string());

		Box::pin(async move { Ok(()) })
	}

	fn resolve<'a>(
		&'a self,
		_cfg: &'a ImageStoreConfig,
		image_ref: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		let url = format!("https://signed.example/{image_ref}");

		Box::pin(async move { Ok(url) })
	}
}

struct Harness {
	service: AttireService,
	items: Arc<MemoryItemStore>,
	wear_logs: Arc<MemoryWearLogStore>,
	images: Arc<FakeImages>,
}

fn harness_with(cfg: Config, embedder: FakeEmbedder, detector: FakeDetector) -> Harness {
	let items = Arc::new(MemoryItemStore::new());
	let wear_logs = Arc::new(MemoryWearLogStore::new());
	let images = Arc::new(FakeImages::default());
	let stores = Stores { items: items.clone(), wear_logs: wear_logs.clone() };
	let providers = Providers::new(Arc::new(embedder), Arc::new(detector), images.clone());
	let service = AttireService::with_providers(cfg, stores, providers);

	Harness { service, items, wear_logs, images }
}

fn harness() -> Harness {
	harness_with(test_config(), FakeEmbedder::default(), FakeDetector::default())
}

async fn seed_item(
	harness: &Harness,
	garment_type: GarmentType,
	samples: Vec<Sample>,
) -> Uuid {
	let mut samples = samples.into_iter();
	let first = samples.next().expect("seed needs at least one sample");
	let item_id = harness
		.items
		.create(NewItem {
			garment_type,
			sample: first,
			created_at: OffsetDateTime::now_utc(),
			last_worn: None,
			wear_count: 0,
		})
		.await
		.unwrap();

	for sample in samples {
		harness.items.append_sample(item_id, sample, usize::MAX).await.unwrap();
	}

	item_id
}

fn sample(embedding: Vec<f32>, image_ref: &str) -> Sample {
	Sample { embedding, image_ref: image_ref.to_string() }
}

#[tokio::test]
async fn match_reports_the_best_sample_score_not_the_average() {
	let harness = harness();
	let item_id = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![
			sample(angled_embedding(EMBEDDING_DIM, 0, 0.60), "crops/a"),
			sample(angled_embedding(EMBEDDING_DIM, 0, 0.92), "crops/b"),
		],
	)
	.await;
	let res = harness
		.service
		.match_against_type(MatchRequest {
			embedding: axis_embedding(EMBEDDING_DIM, 0),
			garment_type: "shirt".into(),
		})
		.await
		.unwrap();

	assert!(res.matched);
	assert_eq!(res.item_id, Some(item_id));
	assert!((res.similarity.unwrap() - 0.92).abs() < 1e-5);
	assert_eq!(res.image_url.as_deref(), Some("https://signed.example/crops/a"));
	assert!(res.embedding.is_none());
}

#[tokio::test]
async fn match_with_no_items_echoes_the_embedding() {
	let harness = harness();
	let query = axis_embedding(EMBEDDING_DIM, 3);
	let res = harness
		.service
		.match_against_type(MatchRequest { embedding: query.clone(), garment_type: "pants".into() })
		.await
		.unwrap();

	assert!(!res.matched);
	assert_eq!(res.item_id, None);
	assert_eq!(res.embedding, Some(query));
}

#[tokio::test]
async fn score_exactly_at_threshold_does_not_match() {
	let harness = harness();

	seed_item(
		&harness,
		GarmentType::Shirt,
		vec![sample(angled_embedding(EMBEDDING_DIM, 0, 0.85), "crops/a")],
	)
	.await;

	let res = harness
		.service
		.match_against_type(MatchRequest {
			embedding: axis_embedding(EMBEDDING_DIM, 0),
			garment_type: "shirt".into(),
		})
		.await
		.unwrap();

	assert!(!res.matched);
}

#[tokio::test]
async fn unknown_garment_type_is_rejected() {
	let harness = harness();
	let res = harness
		.service
		.match_against_type(MatchRequest {
			embedding: axis_embedding(EMBEDDING_DIM, 0),
			garment_type: "hat".into(),
		})
		.await;

	assert!(matches!(res, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn confirming_twice_records_two_wears() {
	let harness = harness();
	let item_id = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a")],
	)
	.await;
	let request = |similarity| ConfirmRequest {
		item_id,
		garment_type: "shirt".into(),
		source_ref: "originals/1".into(),
		similarity,
		new_embedding: None,
		new_image_ref: None,
	};
	let first = harness.service.confirm(request(Some(0.91))).await.unwrap();
	let second = harness.service.confirm(request(None)).await.unwrap();

	assert_eq!(first.wear_count, 1);
	assert_eq!(second.wear_count, 2);

	let entries = harness.wear_logs.list_by_item(item_id).await.unwrap();

	assert_eq!(entries.len(), 2);
	assert!((entries[0].confidence_score - 0.91).abs() < 1e-6);
	// Manual confirmations carry full confidence.
	assert!((entries[1].confidence_score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn confirm_at_gallery_capacity_still_counts_the_wear() {
	let mut cfg = test_config();

	cfg.matching.max_samples = 2;

	let harness = harness_with(cfg, FakeEmbedder::default(), FakeDetector::default());
	let item_id = seed_item(
		&harness,
		GarmentType::Pants,
		vec![
			sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a"),
			sample(axis_embedding(EMBEDDING_DIM, 1), "crops/b"),
		],
	)
	.await;
	let res = harness
		.service
		.confirm(ConfirmRequest {
			item_id,
			garment_type: "pants".into(),
			source_ref: "originals/2".into(),
			similarity: Some(0.9),
			new_embedding: Some(axis_embedding(EMBEDDING_DIM, 2)),
			new_image_ref: Some("crops/c".into()),
		})
		.await
		.unwrap();

	assert_eq!(res.wear_count, 1);

	let item = harness.items.get(item_id).await.unwrap().unwrap();

	// The full gallery refused the new sample; nothing was evicted.
	assert_eq!(item.samples.len(), 2);
	assert_eq!(item.samples[0].image_ref, "crops/a");
	assert_eq!(item.samples[1].image_ref, "crops/b");
}

#[tokio::test]
async fn deleting_a_middle_sample_compacts_the_gallery() {
	let harness = harness();
	let item_id = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![
			sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a"),
			sample(axis_embedding(EMBEDDING_DIM, 1), "crops/b"),
			sample(axis_embedding(EMBEDDING_DIM, 2), "crops/c"),
		],
	)
	.await;
	let res = harness
		.service
		.delete_image(DeleteImageRequest { item_id, index: 1 })
		.await
		.unwrap();

	assert!(!res.item_deleted);
	assert_eq!(res.remaining_samples, Some(2));

	let item = harness.items.get(item_id).await.unwrap().unwrap();

	assert_eq!(item.samples[0].image_ref, "crops/a");
	assert_eq!(item.samples[1].image_ref, "crops/c");
	assert_eq!(harness.images.deletes.lock().unwrap().as_slice(), ["crops/b"]);
}

#[tokio::test]
async fn deleting_the_last_sample_cascades() {
	let harness = harness();
	let item_id = seed_item(
		&harness,
		GarmentType::Pants,
		vec![sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a")],
	)
	.await;

	for _ in 0..2 {
		harness
			.service
			.confirm(ConfirmRequest {
				item_id,
				garment_type: "pants".into(),
				source_ref: "originals/3".into(),
				similarity: None,
				new_embedding: None,
				new_image_ref: None,
			})
			.await
			.unwrap();
	}

	assert_eq!(harness.wear_logs.list_by_item(item_id).await.unwrap().len(), 2);

	let res = harness
		.service
		.delete_image(DeleteImageRequest { item_id, index: 0 })
		.await
		.unwrap();

	assert!(res.item_deleted);
	assert_eq!(res.remaining_samples, None);
	assert!(harness.items.get(item_id).await.unwrap().is_none());
	assert!(harness.wear_logs.list_by_item(item_id).await.unwrap().is_empty());
	assert_eq!(harness.images.deletes.lock().unwrap().as_slice(), ["crops/a"]);
}

#[tokio::test]
async fn delete_image_rejects_out_of_range_index() {
	let harness = harness();
	let item_id = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a")],
	)
	.await;
	let res = harness.service.delete_image(DeleteImageRequest { item_id, index: 5 }).await;

	assert!(matches!(res, Err(Error::InvalidRequest { .. })));
	assert!(harness.items.get(item_id).await.unwrap().is_some());
}

#[tokio::test]
async fn statistics_break_wear_count_ties_by_creation_order() {
	let harness = harness();
	let now = OffsetDateTime::now_utc();
	let a = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a")],
	)
	.await;
	let b = seed_item(
		&harness,
		GarmentType::Pants,
		vec![sample(axis_embedding(EMBEDDING_DIM, 1), "crops/b")],
	)
	.await;
	let c = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![sample(axis_embedding(EMBEDDING_DIM, 2), "crops/c")],
	)
	.await;

	for _ in 0..5 {
		harness.items.record_wear(a, now).await.unwrap();
	}
	for _ in 0..5 {
		harness.items.record_wear(b, now - Duration::days(40)).await.unwrap();
	}

	harness.items.record_wear(c, now - Duration::days(2)).await.unwrap();

	for worn_at in [now, now - Duration::days(2), now - Duration::days(40)] {
		harness
			.wear_logs
			.append(attire_storage::models::WearLogEntry {
				log_id: Uuid::new_v4(),
				item_id: a,
				garment_type: GarmentType::Shirt,
				worn_at,
				confidence_score: 1.0,
				source_image_ref: "originals/4".into(),
			})
			.await
			.unwrap();
	}

	let stats = harness.service.statistics().await.unwrap();

	// A and B tie at five wears; A was created first and stays ahead.
	assert_eq!(stats.most_worn[0].item_id, a);
	assert_eq!(stats.most_worn[0].image_url.as_deref(), Some("https://signed.example/crops/a"));
	assert_eq!(stats.most_worn[1].item_id, b);
	assert_eq!(stats.most_worn[2].item_id, c);
	assert_eq!(stats.least_worn[0].item_id, c);
	assert_eq!(stats.totals.shirts, 2);
	assert_eq!(stats.totals.pants, 1);
	assert_eq!(stats.totals.items, 3);
	assert_eq!(stats.totals.total_wears, 11);

	// B last wore 40 days ago, past the 30-day staleness cutoff.
	let stale = stats.stale_items.iter().map(|item| item.item_id).collect::<Vec<_>>();

	assert_eq!(stale, [b]);
	assert_eq!(stats.stale_items[0].image_url.as_deref(), Some("https://signed.example/crops/b"));

	// Only the two entries inside the 30-day window are counted.
	assert_eq!(stats.wear_frequency.values().sum::<u64>(), 2);
}

#[tokio::test]
async fn process_photo_keeps_going_when_one_garment_fails() {
	let shirt_crop = b"shirt-pixels".to_vec();
	let pants_crop = b"pants-pixels".to_vec();
	let mut embedder = FakeEmbedder::default();

	// Only the shirt crop embeds; the pants crop simulates a provider outage.
	embedder.by_crop.insert(shirt_crop.clone(), angled_embedding(EMBEDDING_DIM, 0, 0.95));

	let detector = FakeDetector {
		garments: vec![
			DetectedGarment { garment_type: "shirt".into(), crop: shirt_crop, confidence: 0.9 },
			DetectedGarment { garment_type: "pants".into(), crop: pants_crop, confidence: 0.8 },
		],
	};
	let harness = harness_with(test_config(), embedder, detector);
	let item_id = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a")],
	)
	.await;
	let res = harness
		.service
		.process_photo(ProcessPhotoRequest { image: b"photo-pixels".to_vec() })
		.await
		.unwrap();

	assert_eq!(res.original_ref, "originals/0");
	assert_eq!(res.original_url, "https://signed.example/originals/0");

	match res.shirt {
		Some(GarmentOutcome::Matched { item_id: matched, similarity, .. }) => {
			assert_eq!(matched, item_id);
			assert!((similarity - 0.95).abs() < 1e-5);
		},
		other => panic!("expected a shirt match, got {other:?}"),
	}
	assert!(matches!(res.pants, Some(GarmentOutcome::Failed { .. })));
}

#[tokio::test]
async fn process_photo_reports_unmatched_garments_with_their_embedding() {
	let crop = b"new-shirt".to_vec();
	let embedding = angled_embedding(EMBEDDING_DIM, 5, 0.5);
	let mut embedder = FakeEmbedder::default();

	embedder.by_crop.insert(crop.clone(), embedding.clone());

	let detector = FakeDetector {
		garments: vec![DetectedGarment {
			garment_type: "shirt".into(),
			crop,
			confidence: 0.9,
		}],
	};
	let harness = harness_with(test_config(), embedder, detector);
	let res = harness
		.service
		.process_photo(ProcessPhotoRequest { image: b"photo".to_vec() })
		.await
		.unwrap();

	match res.shirt {
		Some(GarmentOutcome::Unmatched { embedding: echoed, cropped_ref, cropped_url }) => {
			assert_eq!(echoed, embedding);
			assert_eq!(cropped_ref, "crops/1");
			assert_eq!(cropped_url, "https://signed.example/crops/1");
		},
		other => panic!("expected an unmatched shirt, got {other:?}"),
	}
	assert!(res.pants.is_none());
}

#[tokio::test]
async fn manual_crops_skip_detection_and_absent_types() {
	let shirt_crop = b"hand-cropped-shirt".to_vec();
	let mut embedder = FakeEmbedder::default();

	embedder.by_crop.insert(shirt_crop.clone(), angled_embedding(EMBEDDING_DIM, 0, 0.93));

	// No detector garments: the manual path must never consult it.
	let harness = harness_with(test_config(), embedder, FakeDetector::default());
	let item_id = seed_item(
		&harness,
		GarmentType::Shirt,
		vec![sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a")],
	)
	.await;
	let res = harness
		.service
		.process_manual_crop(ProcessManualCropRequest {
			image: b"photo-pixels".to_vec(),
			shirt_crop: Some(shirt_crop),
			pants_crop: None,
		})
		.await
		.unwrap();

	assert_eq!(res.original_ref, "originals/0");

	match res.shirt {
		Some(GarmentOutcome::Matched { item_id: matched, similarity, .. }) => {
			assert_eq!(matched, item_id);
			assert!((similarity - 0.93).abs() < 1e-5);
		},
		other => panic!("expected a shirt match, got {other:?}"),
	}
	// The skipped type stays absent rather than failing.
	assert!(res.pants.is_none());
}

#[tokio::test]
async fn add_item_with_log_wear_seeds_the_ledger() {
	let harness = harness();
	let res = harness
		.service
		.add_item(AddItemRequest {
			garment_type: "shirt".into(),
			cropped_ref: "crops/a".into(),
			embedding: axis_embedding(EMBEDDING_DIM, 0),
			source_ref: "originals/5".into(),
			log_wear: true,
		})
		.await
		.unwrap();
	let item = harness.items.get(res.item_id).await.unwrap().unwrap();

	assert_eq!(item.wear_count, 1);
	assert!(item.last_worn.is_some());
	assert_eq!(item.samples.len(), 1);

	let entries = harness.wear_logs.list_by_item(res.item_id).await.unwrap();

	assert_eq!(entries.len(), 1);
	assert!((entries[0].confidence_score - 1.0).abs() < 1e-6);
	assert_eq!(entries[0].source_image_ref, "originals/5");
}

#[tokio::test]
async fn item_images_resolves_a_url_per_sample() {
	let harness = harness();
	let item_id = seed_item(
		&harness,
		GarmentType::Pants,
		vec![
			sample(axis_embedding(EMBEDDING_DIM, 0), "crops/a"),
			sample(axis_embedding(EMBEDDING_DIM, 1), "crops/b"),
		],
	)
	.await;
	let res = harness.service.item_images(item_id).await.unwrap();

	assert_eq!(res.garment_type, "pants");
	assert_eq!(res.image_count, 2);
	assert_eq!(
		res.image_urls,
		["https://signed.example/crops/a", "https://signed.example/crops/b"]
	);

	let missing = harness.service.item_images(Uuid::new_v4()).await;

	assert!(matches!(missing, Err(Error::NotFound { .. })));
}
