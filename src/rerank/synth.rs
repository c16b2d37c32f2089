//! Mock rerank scores used when no live reranker answers.

use rand::Rng;

use super::config::MockScoreMode;
use crate::constants::MOCK_RERANK_SPREAD;

/// `clamp(embedding_score + offset, 0, 100)` with `offset` in `[-10, 10]`.
pub fn mock_rerank_score(
    mode: MockScoreMode,
    query: &str,
    passage: &str,
    index: usize,
    embedding_score: f32,
) -> f32 {
    let offset = match mode {
        MockScoreMode::Seeded => seeded_offset(query, passage, index),
        MockScoreMode::Random => rand::rng().random_range(-MOCK_RERANK_SPREAD..=MOCK_RERANK_SPREAD),
    };
    (embedding_score + offset).clamp(0.0, 100.0)
}

/// Offset in `[-10, 10]` derived from BLAKE3 of the inputs.
pub fn seeded_offset(query: &str, passage: &str, index: usize) -> f32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(query.len() as u64).to_le_bytes());
    hasher.update(query.as_bytes());
    hasher.update(&(passage.len() as u64).to_le_bytes());
    hasher.update(passage.as_bytes());
    hasher.update(&(index as u64).to_le_bytes());
    let hash = hasher.finalize();

    let mut word = [0u8; 8];
    word.copy_from_slice(&hash.as_bytes()[..8]);
    // 53 bits fit an f64 mantissa exactly.
    let unit = (u64::from_le_bytes(word) >> 11) as f64 / (1u64 << 53) as f64;

    ((unit * 2.0 - 1.0) * f64::from(MOCK_RERANK_SPREAD)) as f32
}
