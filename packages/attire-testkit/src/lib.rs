mod error;
mod memory;
mod pg;

pub use error::{Error, Result};
pub use memory::{MemoryItemStore, MemoryWearLogStore};
pub use pg::{TestDatabase, env_dsn, with_test_db};

/// A unit embedding with a 1.0 in one position. Two different axes score 0.0
/// against each other; the same axis scores 1.0.
pub fn axis_embedding(dim: usize, axis: usize) -> Vec<f32> {
	let mut vec = vec![0.0; dim];

	vec[axis] = 1.0;

	vec
}

/// A unit embedding whose dot product with `axis_embedding(dim, axis)` is
/// exactly `cos`. Lets tests pin similarity scores without approximation.
pub fn angled_embedding(dim: usize, axis: usize, cos: f32) -> Vec<f32> {
	let other = if axis + 1 < dim { axis + 1 } else { 0 };
	let mut vec = vec![0.0; dim];

	vec[axis] = cos;
	vec[other] = (1.0 - cos * cos).sqrt();

	vec
}
