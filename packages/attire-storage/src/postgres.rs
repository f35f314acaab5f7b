use sqlx::{PgPool, postgres::PgPoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, ItemStore, Result, WearLogStore,
	models::{Item, NewItem, SampleAppend, WearLogEntry, WearStats},
	schema,
};
use attire_domain::{GarmentType, Sample};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &attire_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let lock_id: i64 = 9_210_417;
		// Advisory locks are held per connection. Run the whole script inside
		// one transaction so the lock releases when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in schema::SCHEMA_SQL.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}

pub struct PgItemStore {
	pool: PgPool,
}
impl PgItemStore {
	pub fn new(db: &Db) -> Self {
		Self { pool: db.pool.clone() }
	}
}

pub struct PgWearLogStore {
	pool: PgPool,
}
impl PgWearLogStore {
	pub fn new(db: &Db) -> Self {
		Self { pool: db.pool.clone() }
	}
}

#[derive(sqlx::FromRow)]
struct ItemRow {
	item_id: Uuid,
	garment_type: String,
	samples: serde_json::Value,
	created_at: OffsetDateTime,
	last_worn: Option<OffsetDateTime>,
	wear_count: i64,
}

#[derive(sqlx::FromRow)]
struct WearLogRow {
	log_id: Uuid,
	item_id: Uuid,
	garment_type: String,
	worn_at: OffsetDateTime,
	confidence_score: f32,
	source_image_ref: String,
}

fn parse_garment_type(raw: &str, item_id: Uuid) -> Result<GarmentType> {
	GarmentType::parse(raw).ok_or_else(|| {
		Error::InvalidArgument(format!("Unknown garment type {raw:?} on item {item_id}."))
	})
}

fn item_from_row(row: ItemRow) -> Result<Item> {
	let garment_type = parse_garment_type(&row.garment_type, row.item_id)?;
	let samples: Vec<Sample> = serde_json::from_value(row.samples)?;

	Ok(Item {
		item_id: row.item_id,
		garment_type,
		samples,
		created_at: row.created_at,
		last_worn: row.last_worn,
		wear_count: row.wear_count,
	})
}

fn entry_from_row(row: WearLogRow) -> Result<WearLogEntry> {
	let garment_type = parse_garment_type(&row.garment_type, row.item_id)?;

	Ok(WearLogEntry {
		log_id: row.log_id,
		item_id: row.item_id,
		garment_type,
		worn_at: row.worn_at,
		confidence_score: row.confidence_score,
		source_image_ref: row.source_image_ref,
	})
}

const SELECT_ITEM: &str = "\
SELECT item_id, garment_type, samples, created_at, last_worn, wear_count
FROM clothing_items";

impl ItemStore for PgItemStore {
	fn list_by_type(&self, garment_type: GarmentType) -> BoxFuture<'_, Result<Vec<Item>>> {
		Box::pin(async move {
			let sql = format!("{SELECT_ITEM} WHERE garment_type = $1 ORDER BY created_at, item_id");
			let rows: Vec<ItemRow> = sqlx::query_as(&sql)
				.bind(garment_type.as_str())
				.fetch_all(&self.pool)
				.await?;

			rows.into_iter().map(item_from_row).collect()
		})
	}

	fn list_all(&self) -> BoxFuture<'_, Result<Vec<Item>>> {
		Box::pin(async move {
			let sql = format!("{SELECT_ITEM} ORDER BY created_at, item_id");
			let rows: Vec<ItemRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

			rows.into_iter().map(item_from_row).collect()
		})
	}

	fn get(&self, item_id: Uuid) -> BoxFuture<'_, Result<Option<Item>>> {
		Box::pin(async move {
			let sql = format!("{SELECT_ITEM} WHERE item_id = $1");
			let row: Option<ItemRow> =
				sqlx::query_as(&sql).bind(item_id).fetch_optional(&self.pool).await?;

			row.map(item_from_row).transpose()
		})
	}

	fn create(&self, item: NewItem) -> BoxFuture<'_, Result<Uuid>> {
		Box::pin(async move {
			let item_id = Uuid::new_v4();
			let samples = serde_json::to_value(vec![item.sample])?;

			sqlx::query(
				"\
INSERT INTO clothing_items (item_id, garment_type, samples, created_at, last_worn, wear_count)
VALUES ($1, $2, $3, $4, $5, $6)",
			)
			.bind(item_id)
			.bind(item.garment_type.as_str())
			.bind(samples)
			.bind(item.created_at)
			.bind(item.last_worn)
			.bind(item.wear_count)
			.execute(&self.pool)
			.await?;

			Ok(item_id)
		})
	}

	fn record_wear(
		&self,
		item_id: Uuid,
		worn_at: OffsetDateTime,
	) -> BoxFuture<'_, Result<WearStats>> {
		Box::pin(async move {
			let row: Option<(i64, OffsetDateTime)> = sqlx::query_as(
				"\
UPDATE clothing_items
SET wear_count = wear_count + 1, last_worn = $2
WHERE item_id = $1
RETURNING wear_count, last_worn",
			)
			.bind(item_id)
			.bind(worn_at)
			.fetch_optional(&self.pool)
			.await?;
			let (wear_count, last_worn) =
				row.ok_or_else(|| Error::NotFound(format!("Item {item_id} does not exist.")))?;

			Ok(WearStats { wear_count, last_worn })
		})
	}

	fn append_sample(
		&self,
		item_id: Uuid,
		sample: Sample,
		max_samples: usize,
	) -> BoxFuture<'_, Result<SampleAppend>> {
		Box::pin(async move {
			let sample = serde_json::to_value(sample)?;
			// The length guard and the append are one statement, so two
			// concurrent confirmations cannot push the gallery past the cap.
			let count: Option<i32> = sqlx::query_scalar(
				"\
UPDATE clothing_items
SET samples = samples || $2
WHERE item_id = $1 AND jsonb_array_length(samples) < $3
RETURNING jsonb_array_length(samples)",
			)
			.bind(item_id)
			.bind(sample)
			.bind(max_samples as i32)
			.fetch_optional(&self.pool)
			.await?;

			if let Some(count) = count {
				return Ok(SampleAppend::Appended { count: count as usize });
			}

			let exists: Option<i64> =
				sqlx::query_scalar("SELECT 1::bigint FROM clothing_items WHERE item_id = $1")
					.bind(item_id)
					.fetch_optional(&self.pool)
					.await?;

			if exists.is_some() {
				Ok(SampleAppend::CapacityReached)
			} else {
				Err(Error::NotFound(format!("Item {item_id} does not exist.")))
			}
		})
	}

	fn replace_samples(
		&self,
		item_id: Uuid,
		samples: Vec<Sample>,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let samples = serde_json::to_value(samples)?;
			let result = sqlx::query("UPDATE clothing_items SET samples = $2 WHERE item_id = $1")
				.bind(item_id)
				.bind(samples)
				.execute(&self.pool)
				.await?;

			if result.rows_affected() == 0 {
				return Err(Error::NotFound(format!("Item {item_id} does not exist.")));
			}

			Ok(())
		})
	}

	fn delete(&self, item_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let result = sqlx::query("DELETE FROM clothing_items WHERE item_id = $1")
				.bind(item_id)
				.execute(&self.pool)
				.await?;

			if result.rows_affected() == 0 {
				return Err(Error::NotFound(format!("Item {item_id} does not exist.")));
			}

			Ok(())
		})
	}
}

impl WearLogStore for PgWearLogStore {
	fn append(&self, entry: WearLogEntry) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO wear_logs (log_id, item_id, garment_type, worn_at, confidence_score, source_image_ref)
VALUES ($1, $2, $3, $4, $5, $6)",
			)
			.bind(entry.log_id)
			.bind(entry.item_id)
			.bind(entry.garment_type.as_str())
			.bind(entry.worn_at)
			.bind(entry.confidence_score)
			.bind(&entry.source_image_ref)
			.execute(&self.pool)
			.await?;

			Ok(())
		})
	}

	fn list_by_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<Vec<WearLogEntry>>> {
		Box::pin(async move {
			let rows: Vec<WearLogRow> = sqlx::query_as(
				"\
SELECT log_id, item_id, garment_type, worn_at, confidence_score, source_image_ref
FROM wear_logs
WHERE item_id = $1
ORDER BY worn_at, log_id",
			)
			.bind(item_id)
			.fetch_all(&self.pool)
			.await?;

			rows.into_iter().map(entry_from_row).collect()
		})
	}

	fn list_in_window(&self, start: OffsetDateTime) -> BoxFuture<'_, Result<Vec<WearLogEntry>>> {
		Box::pin(async move {
			let rows: Vec<WearLogRow> = sqlx::query_as(
				"\
SELECT log_id, item_id, garment_type, worn_at, confidence_score, source_image_ref
FROM wear_logs
WHERE worn_at >= $1
ORDER BY worn_at, log_id",
			)
			.bind(start)
			.fetch_all(&self.pool)
			.await?;

			rows.into_iter().map(entry_from_row).collect()
		})
	}

	fn delete_by_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async move {
			let result = sqlx::query("DELETE FROM wear_logs WHERE item_id = $1")
				.bind(item_id)
				.execute(&self.pool)
				.await?;

			Ok(result.rows_affected())
		})
	}
}
