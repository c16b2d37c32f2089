//! Token suggestions for words that have no lexical counterpart in the query.


use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::MAX_SUGGESTIONS;
use crate::text::{token_similarity, tokenize_words};

/// A text token counts as matched above this similarity to some query token.
pub const MATCH_THRESHOLD: f32 = 0.5;
/// Minimum similarity for irregular-verb forms.
pub const IRREGULAR_THRESHOLD: f32 = 0.3;
/// Minimum similarity for morphological variants.
pub const VARIANT_THRESHOLD: f32 = 0.4;
/// Minimum similarity for query tokens offered as replacements.
pub const QUERY_THRESHOLD: f32 = 0.5;

const SUFFIXES: [&str; 5] = ["ing", "ed", "er", "ly", "s"];

/// Shortest stem left after stripping a suffix.
const MIN_STEM_CHARS: usize = 2;

const IRREGULAR_VERBS: &[&[&str]] = &[
    &["be", "is", "are", "am", "was", "were", "been", "being"],
    &["have", "has", "having", "had"],
    &["do", "does", "doing", "did", "done"],
    &["go", "goes", "going", "went", "gone"],
    &["run", "runs", "running", "ran"],
    &["see", "sees", "seeing", "saw", "seen"],
    &["eat", "eats", "eating", "ate", "eaten"],
    &["write", "writes", "writing", "wrote", "written"],
    &["take", "takes", "taking", "took", "taken"],
    &["make", "makes", "making", "made"],
    &["get", "gets", "getting", "got", "gotten"],
    &["come", "comes", "coming", "came"],
    &["give", "gives", "giving", "gave", "given"],
    &["know", "knows", "knowing", "knew", "known"],
    &["think", "thinks", "thinking", "thought"],
    &["find", "finds", "finding", "found"],
    &["buy", "buys", "buying", "bought"],
    &["bring", "brings", "bringing", "brought"],
    &["begin", "begins", "beginning", "began", "begun"],
    &["swim", "swims", "swimming", "swam", "swum"],
    &["speak", "speaks", "speaking", "spoke", "spoken"],
    &["drive", "drives", "driving", "drove", "driven"],
    &["fly", "flies", "flying", "flew", "flown"],
    &["choose", "chooses", "choosing", "chose", "chosen"],
    &["break", "breaks", "breaking", "broke", "broken"],
    &["sing", "sings", "singing", "sang", "sung"],
    &["teach", "teaches", "teaching", "taught"],
    &["catch", "catches", "catching", "caught"],
    &["sleep", "sleeps", "sleeping", "slept"],
    &["leave", "leaves", "leaving", "left"],
    &["feel", "feels", "feeling", "felt"],
    &["keep", "keeps", "keeping", "kept"],
    &["tell", "tells", "telling", "told"],
    &["sell", "sells", "selling", "sold"],
    &["build", "builds", "building", "built"],
    &["send", "sends", "sending", "sent"],
    &["spend", "spends", "spending", "spent"],
    &["stand", "stands", "standing", "stood"],
    &["understand", "understands", "understanding", "understood"],
    &["fall", "falls", "falling", "fell", "fallen"],
    &["grow", "grows", "growing", "grew", "grown"],
    &["draw", "draws", "drawing", "drew", "drawn"],
    &["throw", "throws", "throwing", "threw", "thrown"],
    &["wear", "wears", "wearing", "wore", "worn"],
    &["forget", "forgets", "forgetting", "forgot", "forgotten"],
    &["hide", "hides", "hiding", "hid", "hidden"],
    &["ride", "rides", "riding", "rode", "ridden"],
    &["rise", "rises", "rising", "rose", "risen"],
    &["shake", "shakes", "shaking", "shook", "shaken"],
    &["steal", "steals", "stealing", "stole", "stolen"],
];

/// Replacement candidates for one unmatched text token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSuggestion {
    pub original_token: String,
    /// Index of the token in the tokenized text.
    pub position: usize,
    /// At most five, deduplicated, in discovery order. Never empty.
    pub suggestions: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateSource {
    IrregularVerb,
    Morphology,
    Query,
}

impl CandidateSource {
    fn label(&self) -> &'static str {
        match self {
            CandidateSource::IrregularVerb => "irregular verb forms",
            CandidateSource::Morphology => "morphological variants",
            CandidateSource::Query => "similar query terms",
        }
    }
}

/// Flags text tokens with no close query token and proposes replacements.
///
/// Returns one entry per flagged token that has at least one candidate, in text order.
///
/// ```
/// use semrank::suggest::generate_token_suggestions;
///
/// let suggestions = generate_token_suggestions("the quick fox", "quick brown fox");
/// assert_eq!(suggestions.len(), 1);
/// assert_eq!(suggestions[0].original_token, "the");
/// ```
pub fn generate_token_suggestions(text: &str, query: &str) -> Vec<TokenSuggestion> {
    let text_tokens = tokenize_words(text);
    let query_tokens = tokenize_words(query);

    let suggestions: Vec<TokenSuggestion> = text_tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| !is_matched(token, &query_tokens))
        .filter_map(|(position, token)| suggest_for(token, position, &query_tokens))
        .collect();

    debug!(
        text_tokens = text_tokens.len(),
        query_tokens = query_tokens.len(),
        flagged = suggestions.len(),
        "Generated token suggestions"
    );

    suggestions
}

fn is_matched(token: &str, query_tokens: &[String]) -> bool {
    query_tokens
        .iter()
        .any(|q| token_similarity(token, q) > MATCH_THRESHOLD)
}

fn suggest_for(token: &str, position: usize, query_tokens: &[String]) -> Option<TokenSuggestion> {
    let mut collector = Collector::new(token);

    for form in irregular_forms(token) {
        if token_similarity(token, form) > IRREGULAR_THRESHOLD {
            collector.push(form, CandidateSource::IrregularVerb);
        }
    }

    for variant in morphological_variants(token) {
        if token_similarity(token, &variant) > VARIANT_THRESHOLD {
            collector.push(&variant, CandidateSource::Morphology);
        }
    }

    for query_token in query_tokens {
        if token_similarity(token, query_token) > QUERY_THRESHOLD {
            collector.push(query_token, CandidateSource::Query);
        }
    }

    collector.finish(position)
}

/// Other forms of every irregular verb `token` belongs to.
fn irregular_forms(token: &str) -> impl Iterator<Item = &'static str> + '_ {
    IRREGULAR_VERBS
        .iter()
        .filter(move |forms| forms.contains(&token))
        .flat_map(|forms| forms.iter().copied())
        .filter(move |form| *form != token)
}

/// Stems from stripping each matching suffix, then the token and each stem with every
/// suffix appended.
fn morphological_variants(token: &str) -> Vec<String> {
    let stems: Vec<&str> = SUFFIXES
        .iter()
        .filter_map(|suffix| token.strip_suffix(suffix))
        .filter(|stem| stem.chars().count() >= MIN_STEM_CHARS)
        .collect();

    let mut variants: Vec<String> = stems.iter().map(|stem| stem.to_string()).collect();
    for base in std::iter::once(token).chain(stems.iter().copied()) {
        variants.extend(SUFFIXES.iter().map(|suffix| format!("{base}{suffix}")));
    }
    variants
}

struct Collector<'a> {
    original: &'a str,
    candidates: Vec<String>,
    sources: Vec<CandidateSource>,
}

impl<'a> Collector<'a> {
    fn new(original: &'a str) -> Self {
        Self {
            original,
            candidates: Vec::new(),
            sources: Vec::new(),
        }
    }

    fn push(&mut self, candidate: &str, source: CandidateSource) {
        if self.candidates.len() >= MAX_SUGGESTIONS
            || candidate == self.original
            || self.candidates.iter().any(|c| c == candidate)
        {
            return;
        }
        self.candidates.push(candidate.to_string());
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    fn finish(self, position: usize) -> Option<TokenSuggestion> {
        if self.candidates.is_empty() {
            return None;
        }

        let labels: Vec<&str> = self.sources.iter().map(CandidateSource::label).collect();
        Some(TokenSuggestion {
            original_token: self.original.to_string(),
            position,
            suggestions: self.candidates,
            reason: format!("no lexical match in query; candidates from {}", labels.join(", ")),
        })
    }
}
