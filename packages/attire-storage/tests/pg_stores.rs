//! Smoke tests for the Postgres stores against a disposable database.
//! They run only when `ATTIRE_PG_DSN` points at a reachable server.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use attire_domain::{GarmentType, Sample};
use attire_storage::{
	ItemStore, WearLogStore,
	models::{NewItem, SampleAppend, WearLogEntry},
	postgres::{Db, PgItemStore, PgWearLogStore},
};
use attire_testkit::{axis_embedding, env_dsn, with_test_db};

fn new_item(garment_type: GarmentType, axis: usize) -> NewItem {
	NewItem {
		garment_type,
		sample: Sample { embedding: axis_embedding(8, axis), image_ref: format!("crops/{axis}") },
		created_at: OffsetDateTime::now_utc(),
		last_worn: None,
		wear_count: 0,
	}
}

fn entry(item_id: Uuid, worn_at: OffsetDateTime) -> WearLogEntry {
	WearLogEntry {
		log_id: Uuid::new_v4(),
		item_id,
		garment_type: GarmentType::Shirt,
		worn_at,
		confidence_score: 0.9,
		source_image_ref: "originals/1".to_string(),
	}
}

#[tokio::test]
async fn pg_stores_round_trip() {
	let Some(base_dsn) = env_dsn() else {
		eprintln!("ATTIRE_PG_DSN is unset; skipping Postgres store tests.");

		return;
	};

	with_test_db(&base_dsn, |db| {
		let dsn = db.dsn().to_string();

		async move {
			let db = Db::connect(&attire_config::Postgres { dsn, pool_max_conns: 4 }).await?;

			db.ensure_schema().await?;
			// Re-running the script must be a no-op.
			db.ensure_schema().await?;

			let items = PgItemStore::new(&db);
			let wear_logs = PgWearLogStore::new(&db);
			let shirt = items.create(new_item(GarmentType::Shirt, 0)).await?;
			let pants = items.create(new_item(GarmentType::Pants, 1)).await?;
			let fetched = items.get(shirt).await?.expect("created item must exist");

			assert_eq!(fetched.garment_type, GarmentType::Shirt);
			assert_eq!(fetched.samples.len(), 1);
			assert_eq!(fetched.samples[0].image_ref, "crops/0");
			assert_eq!(items.list_by_type(GarmentType::Shirt).await?.len(), 1);
			assert_eq!(items.list_all().await?.len(), 2);

			// Capped append: one slot left with a cap of two, then a refusal.
			let sample = Sample { embedding: axis_embedding(8, 2), image_ref: "crops/2".into() };
			let appended = items.append_sample(shirt, sample.clone(), 2).await?;

			assert_eq!(appended, SampleAppend::Appended { count: 2 });
			assert_eq!(items.append_sample(shirt, sample, 2).await?, SampleAppend::CapacityReached);
			assert_eq!(items.get(shirt).await?.expect("item").samples.len(), 2);

			let worn_at = OffsetDateTime::now_utc();
			let stats = items.record_wear(shirt, worn_at).await?;

			assert_eq!(stats.wear_count, 1);
			assert_eq!(items.record_wear(shirt, worn_at).await?.wear_count, 2);

			wear_logs.append(entry(shirt, worn_at)).await?;
			wear_logs.append(entry(shirt, worn_at - Duration::days(40))).await?;

			assert_eq!(wear_logs.list_by_item(shirt).await?.len(), 2);
			assert_eq!(wear_logs.list_in_window(worn_at - Duration::days(30)).await?.len(), 1);

			// Positional removal persists the compacted gallery.
			let mut samples = items.get(shirt).await?.expect("item").samples;

			samples.remove(0);
			items.replace_samples(shirt, samples).await?;

			let compacted = items.get(shirt).await?.expect("item").samples;

			assert_eq!(compacted.len(), 1);
			assert_eq!(compacted[0].image_ref, "crops/2");

			// Cascade primitives: logs first, then the item.
			assert_eq!(wear_logs.delete_by_item(shirt).await?, 2);
			items.delete(shirt).await?;

			assert!(items.get(shirt).await?.is_none());
			assert!(items.get(pants).await?.is_some());

			Ok(())
		}
	})
	.await
	.expect("Postgres store round trip failed");
}

#[tokio::test]
async fn pg_stores_report_missing_items() {
	let Some(base_dsn) = env_dsn() else {
		eprintln!("ATTIRE_PG_DSN is unset; skipping Postgres store tests.");

		return;
	};

	with_test_db(&base_dsn, |db| {
		let dsn = db.dsn().to_string();

		async move {
			let db = Db::connect(&attire_config::Postgres { dsn, pool_max_conns: 2 }).await?;

			db.ensure_schema().await?;

			let items = PgItemStore::new(&db);
			let missing = Uuid::new_v4();

			assert!(items.get(missing).await?.is_none());
			assert!(items.record_wear(missing, OffsetDateTime::now_utc()).await.is_err());
			assert!(items.delete(missing).await.is_err());

			let sample = Sample { embedding: axis_embedding(8, 0), image_ref: "crops/0".into() };

			assert!(items.append_sample(missing, sample, 10).await.is_err());

			Ok(())
		}
	})
	.await
	.expect("Postgres missing-item checks failed");
}
