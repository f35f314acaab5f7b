use std::sync::Mutex;

use time::OffsetDateTime;
use uuid::Uuid;

use attire_domain::{GarmentType, Sample};
use attire_storage::{
	BoxFuture, Error, ItemStore, Result, WearLogStore,
	models::{Item, NewItem, SampleAppend, WearLogEntry, WearStats},
};

/// In-memory `ItemStore`. Insertion order is preserved so tests observe the
/// same collection-order tie-breaking the Postgres store provides, and every
/// mutation happens under one lock, mirroring the atomic-update contract.
#[derive(Default)]
pub struct MemoryItemStore {
	items: Mutex<Vec<Item>>,
}
impl MemoryItemStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[derive(Default)]
pub struct MemoryWearLogStore {
	entries: Mutex<Vec<WearLogEntry>>,
}
impl MemoryWearLogStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

impl ItemStore for MemoryItemStore {
	fn list_by_type(&self, garment_type: GarmentType) -> BoxFuture<'_, Result<Vec<Item>>> {
		let items = lock(&self.items)
			.iter()
			.filter(|item| item.garment_type == garment_type)
			.cloned()
			.collect();

		Box::pin(async move { Ok(items) })
	}

	fn list_all(&self) -> BoxFuture<'_, Result<Vec<Item>>> {
		let items = lock(&self.items).clone();

		Box::pin(async move { Ok(items) })
	}

	fn get(&self, item_id: Uuid) -> BoxFuture<'_, Result<Option<Item>>> {
		let item = lock(&self.items).iter().find(|item| item.item_id == item_id).cloned();

		Box::pin(async move { Ok(item) })
	}

	fn create(&self, item: NewItem) -> BoxFuture<'_, Result<Uuid>> {
		let item_id = Uuid::new_v4();

		lock(&self.items).push(Item {
			item_id,
			garment_type: item.garment_type,
			samples: vec![item.sample],
			created_at: item.created_at,
			last_worn: item.last_worn,
			wear_count: item.wear_count,
		});

		Box::pin(async move { Ok(item_id) })
	}

	fn record_wear(
		&self,
		item_id: Uuid,
		worn_at: OffsetDateTime,
	) -> BoxFuture<'_, Result<WearStats>> {
		let result = {
			let mut items = lock(&self.items);

			match items.iter_mut().find(|item| item.item_id == item_id) {
				Some(item) => {
					item.wear_count += 1;
					item.last_worn = Some(worn_at);

					Ok(WearStats { wear_count: item.wear_count, last_worn: worn_at })
				},
				None => Err(Error::NotFound(format!("Item {item_id} does not exist."))),
			}
		};

		Box::pin(async move { result })
	}

	fn append_sample(
		&self,
		item_id: Uuid,
		sample: Sample,
		max_samples: usize,
	) -> BoxFuture<'_, Result<SampleAppend>> {
		let result = {
			let mut items = lock(&self.items);

			match items.iter_mut().find(|item| item.item_id == item_id) {
				Some(item) =>
					if item.samples.len() < max_samples {
						item.samples.push(sample);

						Ok(SampleAppend::Appended { count: item.samples.len() })
					} else {
						Ok(SampleAppend::CapacityReached)
					},
				None => Err(Error::NotFound(format!("Item {item_id} does not exist."))),
			}
		};

		Box::pin(async move { result })
	}

	fn replace_samples(
		&self,
		item_id: Uuid,
		samples: Vec<Sample>,
	) -> BoxFuture<'_, Result<()>> {
		let result = {
			let mut items = lock(&self.items);

			match items.iter_mut().find(|item| item.item_id == item_id) {
				Some(item) => {
					item.samples = samples;

					Ok(())
				},
				None => Err(Error::NotFound(format!("Item {item_id} does not exist."))),
			}
		};

		Box::pin(async move { result })
	}

	fn delete(&self, item_id: Uuid) -> BoxFuture<'_, Result<()>> {
		let result = {
			let mut items = lock(&self.items);
			let before = items.len();

			items.retain(|item| item.item_id != item_id);

			if items.len() == before {
				Err(Error::NotFound(format!("Item {item_id} does not exist.")))
			} else {
				Ok(())
			}
		};

		Box::pin(async move { result })
	}
}

impl WearLogStore for MemoryWearLogStore {
	fn append(&self, entry: WearLogEntry) -> BoxFuture<'_, Result<()>> {
		lock(&self.entries).push(entry);

		Box::pin(async move { Ok(()) })
	}

	fn list_by_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<Vec<WearLogEntry>>> {
		let entries = lock(&self.entries)
			.iter()
			.filter(|entry| entry.item_id == item_id)
			.cloned()
			.collect();

		Box::pin(async move { Ok(entries) })
	}

	fn list_in_window(&self, start: OffsetDateTime) -> BoxFuture<'_, Result<Vec<WearLogEntry>>> {
		let entries = lock(&self.entries)
			.iter()
			.filter(|entry| entry.worn_at >= start)
			.cloned()
			.collect();

		Box::pin(async move { Ok(entries) })
	}

	fn delete_by_item(&self, item_id: Uuid) -> BoxFuture<'_, Result<u64>> {
		let removed = {
			let mut entries = lock(&self.entries);
			let before = entries.len();

			entries.retain(|entry| entry.item_id != item_id);

			(before - entries.len()) as u64
		};

		Box::pin(async move { Ok(removed) })
	}
}
