pub mod gallery;
pub mod garment;
pub mod similarity;

pub use gallery::{AppendOutcome, InvalidIndex, MAX_SAMPLES, Sample};
pub use garment::GarmentType;
pub use similarity::{Candidate, DimensionMismatch, EMBEDDING_DIM, EmbeddingIssue, MatchHit};
