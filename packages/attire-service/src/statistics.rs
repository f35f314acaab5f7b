use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{AttireService, Result};
use attire_domain::GarmentType;
use attire_storage::models::{Item, WearLogEntry};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemStat {
	pub item_id: Uuid,
	pub garment_type: String,
	pub wear_count: i64,
	pub last_worn: Option<OffsetDateTime>,
	pub days_since_worn: Option<i64>,
	/// Temporary display URL for the item's first sample.
	pub image_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Totals {
	pub shirts: usize,
	pub pants: usize,
	pub items: usize,
	pub total_wears: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatisticsResponse {
	pub most_worn: Vec<ItemStat>,
	pub least_worn: Vec<ItemStat>,
	pub stale_items: Vec<ItemStat>,
	pub totals: Totals,
	/// Calendar date → wear entries on that date, within the configured
	/// window.
	pub wear_frequency: BTreeMap<String, u64>,
}

impl AttireService {
	pub async fn statistics(&self) -> Result<StatisticsResponse> {
		let policy = &self.cfg.statistics;
		let now = OffsetDateTime::now_utc();
		let items = self.stores.items.list_all().await?;
		let size = policy.rollup_size as usize;
		let stale_cutoff = now - Duration::days(policy.stale_after_days);
		let mut most_worn = Vec::with_capacity(size);

		for item in rank_most_worn(&items, size) {
			most_worn.push(self.stat_for(item, now).await?);
		}

		let mut least_worn = Vec::with_capacity(size);

		for item in rank_least_worn(&items, size) {
			least_worn.push(self.stat_for(item, now).await?);
		}

		let mut stale_items = Vec::new();

		for item in items.iter().filter(|item| is_stale(item.last_worn, stale_cutoff)) {
			stale_items.push(self.stat_for(item, now).await?);
		}

		let totals = tally(&items);
		let window_start = now - Duration::days(policy.frequency_window_days);
		let entries = self.stores.wear_logs.list_in_window(window_start).await?;
		let wear_frequency = frequency_by_date(&entries);

		Ok(StatisticsResponse { most_worn, least_worn, stale_items, totals, wear_frequency })
	}

	async fn stat_for(&self, item: &Item, now: OffsetDateTime) -> Result<ItemStat> {
		let image_url = match item.samples.first() {
			Some(sample) => Some(
				self.providers.images.resolve(&self.cfg.providers.images, &sample.image_ref).await?,
			),
			None => None,
		};

		Ok(item_stat(item, now, image_url))
	}
}

/// Top of the rollup by wear count. The sort is stable, so items tied on
/// count keep their collection order with no secondary key.
fn rank_most_worn(items: &[Item], size: usize) -> Vec<&Item> {
	let mut ranked = items.iter().collect::<Vec<_>>();

	ranked.sort_by_key(|item| std::cmp::Reverse(item.wear_count));
	ranked.truncate(size);

	ranked
}

fn rank_least_worn(items: &[Item], size: usize) -> Vec<&Item> {
	let mut ranked = items.iter().collect::<Vec<_>>();

	ranked.sort_by_key(|item| item.wear_count);
	ranked.truncate(size);

	ranked
}

fn is_stale(last_worn: Option<OffsetDateTime>, cutoff: OffsetDateTime) -> bool {
	match last_worn {
		None => true,
		Some(worn) => worn < cutoff,
	}
}

/// Floor of elapsed whole days; `None` for never-worn items.
fn days_since_worn(last_worn: Option<OffsetDateTime>, now: OffsetDateTime) -> Option<i64> {
	last_worn.map(|worn| (now - worn).whole_days())
}

fn tally(items: &[Item]) -> Totals {
	let shirts = items.iter().filter(|item| item.garment_type == GarmentType::Shirt).count();
	let pants = items.iter().filter(|item| item.garment_type == GarmentType::Pants).count();

	Totals {
		shirts,
		pants,
		items: items.len(),
		total_wears: items.iter().map(|item| item.wear_count).sum(),
	}
}

/// Buckets entries by the calendar date of `worn_at` in its own offset.
fn frequency_by_date(entries: &[WearLogEntry]) -> BTreeMap<String, u64> {
	let mut by_date = BTreeMap::new();

	for entry in entries {
		*by_date.entry(entry.worn_at.date().to_string()).or_insert(0) += 1;
	}

	by_date
}

fn item_stat(item: &Item, now: OffsetDateTime, image_url: Option<String>) -> ItemStat {
	ItemStat {
		item_id: item.item_id,
		garment_type: item.garment_type.as_str().to_string(),
		wear_count: item.wear_count,
		last_worn: item.last_worn,
		days_since_worn: days_since_worn(item.last_worn, now),
		image_url,
	}
}
