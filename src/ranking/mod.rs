//! Cosine similarity and top-k passage selection.

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use crate::constants::DEFAULT_TOP_K;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("malformed ranking input: {reason}")]
    MalformedInput { reason: String },
}

pub type RankingResult<T> = Result<T, RankingError>;

/// One scored passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    pub text: String,
    /// Cosine similarity in `[-1, 1]`.
    pub similarity: f32,
    /// Position of the passage in the caller's input.
    pub original_index: usize,
}

/// `dot(a, b) / (|a| * |b|)`, or `0.0` when either vector has zero norm.
///
/// Vectors of different lengths are never truncated or padded.
///
/// ```
/// use semrank::ranking::cosine_similarity;
///
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap(), 1.0);
/// assert!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).is_err());
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> RankingResult<f32> {
    if a.len() != b.len() {
        return Err(RankingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (dot, norm_a_sq, norm_b_sq) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (av, bv)| {
            (dot + av * bv, na + av * av, nb + bv * bv)
        });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
    }
}

/// Scores every passage against `query_vec` and returns the best `min(top_k, n)`.
///
/// Order is similarity descending; equal scores keep input order and NaN sorts last.
pub fn find_most_similar<S: AsRef<str>>(
    query_vec: &[f32],
    passage_vecs: &[Vec<f32>],
    passage_texts: &[S],
    top_k: usize,
) -> RankingResult<Vec<SimilarityResult>> {
    if passage_vecs.len() != passage_texts.len() {
        return Err(RankingError::MalformedInput {
            reason: format!(
                "{} passage vectors for {} passage texts",
                passage_vecs.len(),
                passage_texts.len()
            ),
        });
    }

    let mut scored = passage_vecs
        .iter()
        .zip(passage_texts)
        .enumerate()
        .map(|(index, (vector, text))| {
            Ok(SimilarityResult {
                text: text.as_ref().to_string(),
                similarity: cosine_similarity(query_vec, vector)?,
                original_index: index,
            })
        })
        .collect::<RankingResult<Vec<_>>>()?;

    scored.sort_by(|a, b| descending_nan_last(a.similarity, b.similarity));
    scored.truncate(top_k);

    debug!(
        candidates = passage_vecs.len(),
        returned = scored.len(),
        top_k,
        "Ranked passages"
    );

    Ok(scored)
}

/// Descending order for scores with NaN placed after every number.
pub(crate) fn descending_nan_last(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Top-k ranker with a fixed `top_k`.
#[derive(Debug, Clone)]
pub struct SimilarityRanker {
    top_k: usize,
}

impl SimilarityRanker {
    pub fn new() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn rank<S: AsRef<str>>(
        &self,
        query_vec: &[f32],
        passage_vecs: &[Vec<f32>],
        passage_texts: &[S],
    ) -> RankingResult<Vec<SimilarityResult>> {
        find_most_similar(query_vec, passage_vecs, passage_texts, self.top_k)
    }
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new()
    }
}
