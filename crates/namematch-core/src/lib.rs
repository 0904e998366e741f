//! Normalization, blocking index, fuzzy similarity, and deterministic
//! scoring for company-name entity resolution.
//!
//! This crate has no async surface and no I/O beyond
//! [`wordlists::WordLists::load_from_dir`]: every other function is a
//! pure, total transformation over owned values, so it can be called
//! from sync or async callers, batch jobs, or tests without caring
//! which. The embedding index, the arbiter, and the overall per-pair
//! decision orchestration live in sibling crates (`namematch-embed`,
//! `namematch-arbiter`, `namematch`) that depend on this one.
pub mod acronyms;
pub mod designators;
pub mod fuzzy;
pub mod index;
pub mod normalize;
pub mod scoring;
pub mod types;
pub mod wordlists;

pub use acronyms::{AcronymConfig, AcronymRelation};
pub use designators::{strip_designators, strip_word_categories};
pub use index::{BlockingIndex, IndexConfig};
pub use normalize::{normalize, NormalizeConfig};
pub use scoring::{score_pair, Penalties, ScoringConfig, ScoringWeights};
pub use types::{
    Candidate, CandidateSource, Decision, DebugInfo, FeatureValue, KeyType, MatchResult,
    NormalizationMeta, NormalizedName, ScoredCandidate, TopCandidate,
};
pub use wordlists::{WordCategory, WordLists};
