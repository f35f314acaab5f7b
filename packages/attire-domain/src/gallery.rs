use serde::{Deserialize, Serialize};

/// Hard cap on reference samples per item. A full gallery refuses new samples
/// rather than evicting old ones.
pub const MAX_SAMPLES: usize = 10;

/// One (embedding, image reference) pair recorded against an item. Positions
/// are the vector indices; removal compacts, so indices are never sparse.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Sample {
	pub embedding: Vec<f32>,
	pub image_ref: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
	Appended { index: usize },
	CapacityReached,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidIndex {
	pub index: usize,
	pub len: usize,
}
impl std::fmt::Display for InvalidIndex {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Sample index {} is out of range for {} samples.", self.index, self.len)
	}
}
impl std::error::Error for InvalidIndex {}

/// Appends at the next sequential index when under `max_samples`. At capacity
/// the gallery is left untouched and the refusal is reported as an outcome,
/// not an error; the caller decides whether it is notable.
pub fn append(samples: &mut Vec<Sample>, sample: Sample, max_samples: usize) -> AppendOutcome {
	if samples.len() >= max_samples {
		return AppendOutcome::CapacityReached;
	}

	samples.push(sample);

	AppendOutcome::Appended { index: samples.len() - 1 }
}

/// Removes the sample at `index` and returns the new count. Remaining samples
/// keep their relative order and occupy indices `0..n-1` again. A count of
/// zero means the caller must cascade-delete the owning item.
pub fn remove_at(samples: &mut Vec<Sample>, index: usize) -> Result<usize, InvalidIndex> {
	if index >= samples.len() {
		return Err(InvalidIndex { index, len: samples.len() });
	}

	samples.remove(index);

	Ok(samples.len())
}
