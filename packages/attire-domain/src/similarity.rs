use uuid::Uuid;

/// Dimensionality of the image embeddings the matcher operates on.
pub const EMBEDDING_DIM: usize = 1_408;

/// Largest deviation from unit L2 norm an embedding may carry on ingestion.
pub const NORM_TOLERANCE: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DimensionMismatch {
	pub left: usize,
	pub right: usize,
}
impl std::fmt::Display for DimensionMismatch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Embedding dimensions differ: {} vs {}.", self.left, self.right)
	}
}
impl std::error::Error for DimensionMismatch {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmbeddingIssue {
	WrongDimension { actual: usize },
	NotNormalized { norm: f32 },
}
impl std::fmt::Display for EmbeddingIssue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::WrongDimension { actual } => {
				write!(f, "Embedding must have {EMBEDDING_DIM} dimensions, got {actual}.")
			},
			Self::NotNormalized { norm } => {
				write!(f, "Embedding must be L2-normalized, norm is {norm}.")
			},
		}
	}
}
impl std::error::Error for EmbeddingIssue {}

/// One gallery sample flattened into the scan list. Scan order is significant:
/// `best_match` breaks ties in favor of the earliest candidate.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
	pub item_id: Uuid,
	pub embedding: &'a [f32],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchHit {
	pub item_id: Uuid,
	pub score: f32,
}

/// Cosine similarity of two normalized vectors, clamped to [0, 1]. Callers
/// guarantee normalization; no re-normalization happens here.
pub fn score(a: &[f32], b: &[f32]) -> Result<f32, DimensionMismatch> {
	if a.len() != b.len() {
		return Err(DimensionMismatch { left: a.len(), right: b.len() });
	}

	let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();

	Ok(dot.clamp(0.0, 1.0))
}

/// Highest-scoring candidate strictly above `threshold`. The running best is
/// seeded with the threshold itself, so a score exactly at the threshold never
/// qualifies and the first of several tied maxima wins.
pub fn best_match(
	query: &[f32],
	candidates: &[Candidate<'_>],
	threshold: f32,
) -> Result<Option<MatchHit>, DimensionMismatch> {
	let mut best = None;
	let mut best_score = threshold;

	for candidate in candidates {
		let score = score(query, candidate.embedding)?;

		if score > best_score {
			best_score = score;
			best = Some(MatchHit { item_id: candidate.item_id, score });
		}
	}

	Ok(best)
}

/// All candidates scoring at least `threshold`, sorted descending. The sort is
/// stable, so equal scores keep their scan order; the result is cut to `k`.
pub fn top_k(
	query: &[f32],
	candidates: &[Candidate<'_>],
	k: usize,
	threshold: f32,
) -> Result<Vec<MatchHit>, DimensionMismatch> {
	let mut hits = Vec::new();

	for candidate in candidates {
		let score = score(query, candidate.embedding)?;

		if score >= threshold {
			hits.push(MatchHit { item_id: candidate.item_id, score });
		}
	}

	hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
	hits.truncate(k);

	Ok(hits)
}

/// Euclidean distance between two embeddings. Not used by the matching policy.
pub fn distance(a: &[f32], b: &[f32]) -> Result<f32, DimensionMismatch> {
	if a.len() != b.len() {
		return Err(DimensionMismatch { left: a.len(), right: b.len() });
	}

	let sum = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>();

	Ok(sum.sqrt())
}

/// Ingestion gate: fixed dimensionality and unit norm within tolerance.
pub fn validate_embedding(embedding: &[f32]) -> Result<(), EmbeddingIssue> {
	if embedding.len() != EMBEDDING_DIM {
		return Err(EmbeddingIssue::WrongDimension { actual: embedding.len() });
	}

	let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

	// Negated so a NaN norm fails rather than slipping through.
	if !((norm - 1.0).abs() <= NORM_TOLERANCE) {
		return Err(EmbeddingIssue::NotNormalized { norm });
	}

	Ok(())
}
