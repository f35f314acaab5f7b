pub mod models;
pub mod postgres;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

use time::OffsetDateTime;
use uuid::Uuid;

use attire_domain::{GarmentType, Sample};
use models::{Item, NewItem, SampleAppend, WearLogEntry, WearStats};

/// Handle to the item document collection. Implementations must make
/// `record_wear` an atomic increment and `append_sample` an atomic
/// check-then-append, since two confirmations may race on the same item.
pub trait ItemStore
where
	Self: Send + Sync,
{
	/// Items of one garment type in creation order.
	fn list_by_type(&self, garment_type: GarmentType) -> BoxFuture<'_, Result<Vec<Item>>>;

	/// Every item, in creation order. That order is the tie-breaker for the
	/// statistics rollups.
	fn list_all(&self) -> BoxFuture<'_, Result<Vec<Item>>>;

	fn get(&self, item_id: Uuid) -> BoxFuture<'_, Result<Option<Item>>>;

	fn create(&self, item: NewItem) -> BoxFuture<'_, Result<Uuid>>;

	/// Increments `wear_count` by one and stamps `last_worn`, atomically.
	fn record_wear(
		&self,
		item_id: Uuid,
		worn_at: OffsetDateTime,
	) -> BoxFuture<'_, Result<WearStats>>;

	/// Appends a sample only while the gallery holds fewer than
	/// `max_samples`; the capacity check and the append are one atomic step.
	fn append_sample(
		&self,
		item_id: Uuid,
		sample: Sample,
		max_samples: usize,
	) -> BoxFuture<'_, Result<SampleAppend>>;

	/// Persists a compacted gallery after a positional removal.
	fn replace_samples(
		&self,
		item_id: Uuid,
		samples: Vec<Sample>,
	) -> BoxFuture<'_, Result<()>>;

	fn delete(&self, item_id: Uuid) -> BoxFuture<'_, Result<()>>;
}

/// Handle to the wear-log collection. Entries are append-only; the only
/// deletion path is the per-item cascade.
pub trait WearLogStore
where
	Self: Send + Sync,
{
	fn append(&self, entry: WearLogEntry) -> BoxFuture<'_, Result<()>>;

	fn list_by_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<Vec<WearLogEntry>>>;

	/// Entries with `worn_at >= start`, oldest first.
	fn list_in_window(&self, start: OffsetDateTime) -> BoxFuture<'_, Result<Vec<WearLogEntry>>>;

	/// Removes every entry referencing the item; returns how many went away.
	fn delete_by_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<u64>>;
}
