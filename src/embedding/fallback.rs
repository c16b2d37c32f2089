//! Deterministic n-gram hashing embedder.
//!
//! Used whenever a live provider is absent or fails. Same text and dimension always give a
//! bit-identical vector; nothing here reads the clock or an RNG.

use crate::constants::{CHAR_NGRAM_MAX, CHAR_NGRAM_MIN, WORD_NGRAM_MAX, WORD_NGRAM_MIN};
use crate::text::{char_ngrams, word_ngrams};

/// Number of dimensions each n-gram is spread across.
const SPREAD: i64 = 7;
/// Stride between the dimensions one n-gram touches.
const STRIDE: i64 = 97;

/// Builds a unit-length `dimension`-sized vector from `text`.
///
/// Text with no n-grams (empty or symbol-only) yields an all-zero vector, and a zero
/// dimension yields an empty one.
///
/// ```
/// use semrank::embedding::fallback_embedding;
///
/// let a = fallback_embedding("cat", 768);
/// let b = fallback_embedding("cat", 768);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 768);
/// ```
pub fn fallback_embedding(text: &str, dimension: usize) -> Vec<f32> {
    if dimension == 0 {
        return Vec::new();
    }

    let mut grams = char_ngrams(text, CHAR_NGRAM_MIN, CHAR_NGRAM_MAX);
    grams.extend(word_ngrams(text, WORD_NGRAM_MIN, WORD_NGRAM_MAX));

    let mut accum = vec![0.0f64; dimension];
    if !grams.is_empty() {
        let scale = (grams.len() as f64).sqrt();
        let dim = dimension as i64;

        for gram in &grams {
            let h = gram_hash(gram);
            for i in 0..SPREAD {
                let slot = (h + i * STRIDE).rem_euclid(dim) as usize;
                accum[slot] += ((h + i) as f64).sin() / scale;
            }
        }

        let norm = accum.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in &mut accum {
                *x /= norm;
            }
        }
    }

    accum.into_iter().map(|x| x as f32).collect()
}

/// `h = h * 31 + codepoint` with 32-bit signed wrap, then absolute value.
///
/// `|i32::MIN|` is not representable and saturates to `i32::MAX`.
pub(crate) fn gram_hash(gram: &str) -> i64 {
    let mut h: i32 = 0;
    for ch in gram.chars() {
        h = h.wrapping_mul(31).wrapping_add(ch as i32);
    }
    i64::from(h.checked_abs().unwrap_or(i32::MAX))
}
