//! Normalization, tokenization and lexical similarity.
//!
//! Everything here is pure and synchronous. Lengths are counted in Unicode scalar values
//! (`char`s), never bytes, so accented and non-Latin text behaves the same as ASCII.


use std::collections::HashSet;

use unicode_categories::UnicodeCategories;

/// Lowercases `text`, replaces every char outside the Unicode letter (`L*`) and decimal
/// digit (`Nd`) categories with a space, collapses runs of spaces and trims both ends.
///
/// Combining marks (`M*`) and other numerals such as `²` or `½` (`No`) count as separators.
///
/// ```
/// assert_eq!(semrank::text::normalize("  Hello,   WORLD!! "), "hello world");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());

    for ch in lowered.chars() {
        if is_word_char(ch) {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    }

    if out.ends_with(' ') {
        out.pop();
    }
    out
}

fn is_word_char(ch: char) -> bool {
    ch.is_letter() || ch.is_number_decimal_digit()
}

/// Splits normalized text into nonempty word tokens.
pub fn tokenize_words(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// All contiguous character windows of sizes `min_n..=max_n` over the normalized text.
///
/// Spaces between words are part of the stream, so n-grams may straddle word boundaries.
/// Output is grouped by size, then by position.
pub fn char_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let chars: Vec<char> = normalize(text).chars().collect();
    let mut grams = Vec::new();

    for n in min_n.max(1)..=max_n {
        if n > chars.len() {
            break;
        }
        grams.extend(chars.windows(n).map(|window| window.iter().collect::<String>()));
    }

    grams
}

/// All contiguous token windows of sizes `min_n..=max_n`, joined by single spaces.
pub fn word_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let tokens = tokenize_words(text);
    let mut grams = Vec::new();

    for n in min_n.max(1)..=max_n {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|window| window.join(" ")));
    }

    grams
}

/// Character-level Levenshtein distance.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Jaccard similarity of the two strings' character sets. Two empty strings score 1.
pub fn char_jaccard(a: &str, b: &str) -> f32 {
    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f32 / union as f32
}

/// Mean of [`char_jaccard`] and normalized edit similarity. Symmetric, in `[0, 1]`.
///
/// ```
/// use semrank::text::token_similarity;
///
/// assert_eq!(token_similarity("fox", "fox"), 1.0);
/// assert_eq!(token_similarity("the", "fox"), 0.0);
/// ```
pub fn token_similarity(a: &str, b: &str) -> f32 {
    let jaccard = char_jaccard(a, b);

    let max_len = a.chars().count().max(b.chars().count());
    let edit = if max_len == 0 {
        1.0
    } else {
        1.0 - edit_distance(a, b) as f32 / max_len as f32
    };

    (jaccard + edit) / 2.0
}
