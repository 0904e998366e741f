//! Core value types shared by the normalizer, blocking index, and scorer.
//!
//! Every type here is a plain value: NormalizedNames are owned by the
//! matcher and never mutated after construction; Candidates and
//! ScoredCandidates hold `b_id` indices rather than back-references, so
//! there is no cyclic or shared-ownership graph to reason about.
use std::collections::{BTreeMap, BTreeSet};

/// The blocking-key types a [`NormalizedName`] can contribute to the
/// inverted index, plus the non-lexical `Embedding` source tracked on a
/// [`Candidate`]. Closed enum instead of stringly keys, per the "tagged
/// variants over class hierarchies" design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyType {
    /// `k_core`: the full core string.
    Core,
    /// `k_prefix2`: first two core tokens.
    Prefix2,
    /// `k_prefix3`: first three core tokens.
    Prefix3,
    /// `k_acronym`: the resolved acronym, if any.
    Acronym,
    /// `k_first`: the first core token. Optional at query time.
    First,
}

/// The source(s) that surfaced a [`Candidate`]: any [`KeyType`] plus the
/// non-lexical embedding source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateSource {
    Key(KeyType),
    Embedding,
}

/// Diagnostic record attached to a [`NormalizedName`]; never affects
/// scoring directly, but downstream consumers (debug output, the arbiter
/// prompt) can surface it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationMeta {
    pub removed_designators: Vec<String>,
    pub removed_categories: Vec<String>,
    pub warnings: Vec<String>,
}

/// Immutable, deterministic representation of a normalized company name.
///
/// Constructed only by [`crate::normalize::normalize`]; every field is
/// derived solely from `original`, the static word-lists, and config, so
/// equal inputs under equal config always produce an equal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub original: String,
    pub normalized_text: String,
    pub raw_tokens: Vec<String>,
    pub core_tokens: Vec<String>,
    pub core_string: String,
    pub acronym: Option<String>,
    pub numeric_tokens: Vec<String>,
    pub keys: BTreeMap<KeyType, String>,
    pub meta: NormalizationMeta,
}

impl NormalizedName {
    /// The empty normalization: what degenerate input (empty string,
    /// all-punctuation) produces. Not an error — see `namematch-error`'s
    /// module docs.
    pub fn empty(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            normalized_text: String::new(),
            raw_tokens: Vec::new(),
            core_tokens: Vec::new(),
            core_string: String::new(),
            acronym: None,
            numeric_tokens: Vec::new(),
            keys: BTreeMap::new(),
            meta: NormalizationMeta::default(),
        }
    }
}

/// A B-side candidate surfaced for a given A query, with the set of keys
/// (lexical and/or embedding) that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub b_id: usize,
    pub sources: BTreeSet<CandidateSource>,
}

/// A scalar or label attached to a [`ScoredCandidate`]'s feature map.
/// Closed over the two shapes the scorer actually produces, instead of a
/// stringly/dynamic value.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Num(f32),
    Label(String),
}

impl FeatureValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FeatureValue::Num(v) => Some(*v),
            FeatureValue::Label(_) => None,
        }
    }
}

/// The result of scoring a single (A, B) pair: a score in `[0, 1]`, the
/// named feature values that produced it, and an ordered list of
/// human-readable reason tags.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub b_id: usize,
    pub score: f32,
    pub features: BTreeMap<String, FeatureValue>,
    pub reasons: Vec<String>,
}

/// Tri-band decision for a single A query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Match,
    NoMatch,
    Review,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Match => "MATCH",
            Decision::NoMatch => "NO_MATCH",
            Decision::Review => "REVIEW",
        }
    }
}

/// A single entry of [`DebugInfo::top_candidates`].
#[derive(Debug, Clone, PartialEq)]
pub struct TopCandidate {
    pub b_id: usize,
    pub score: f32,
    pub reasons: Vec<String>,
}

/// Typed replacement for the original's loosely-typed debug `dict`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    pub top_candidates: Vec<TopCandidate>,
    pub warnings: Vec<String>,
    pub candidate_count: usize,
}

/// The final, per-query result returned by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub a_id: usize,
    pub a_name: String,
    pub b_id: Option<usize>,
    pub b_name: Option<String>,
    pub decision: Decision,
    pub score: f32,
    pub runner_up_score: Option<f32>,
    pub margin: Option<f32>,
    pub used_arbiter: bool,
    pub reasons: Vec<String>,
    pub debug: DebugInfo,
}
