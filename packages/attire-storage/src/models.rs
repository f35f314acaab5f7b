use time::OffsetDateTime;
use uuid::Uuid;

use attire_domain::{GarmentType, Sample};

/// A tracked wardrobe garment. `samples` is the item's capped gallery in
/// insertion order; a persisted item always has at least one sample.
#[derive(Clone, Debug)]
pub struct Item {
	pub item_id: Uuid,
	pub garment_type: GarmentType,
	pub samples: Vec<Sample>,
	pub created_at: OffsetDateTime,
	pub last_worn: Option<OffsetDateTime>,
	pub wear_count: i64,
}

/// Creation payload. The store assigns the id; the first sample enters the
/// gallery at index 0.
#[derive(Clone, Debug)]
pub struct NewItem {
	pub garment_type: GarmentType,
	pub sample: Sample,
	pub created_at: OffsetDateTime,
	pub last_worn: Option<OffsetDateTime>,
	pub wear_count: i64,
}

/// One confirmed wear event. Entries are immutable and reference their item
/// weakly; cascade deletion removes them with the item.
#[derive(Clone, Debug)]
pub struct WearLogEntry {
	pub log_id: Uuid,
	pub item_id: Uuid,
	pub garment_type: GarmentType,
	pub worn_at: OffsetDateTime,
	pub confidence_score: f32,
	pub source_image_ref: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WearStats {
	pub wear_count: i64,
	pub last_worn: OffsetDateTime,
}

/// Outcome of the store's atomic capped append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleAppend {
	Appended { count: usize },
	CapacityReached,
}
