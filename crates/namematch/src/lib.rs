#![allow(unused_variables, unused_imports, dead_code)]
//! namematch — company-name entity resolution
//!
//! Resolves a query list A of company-name strings against a reference
//! list B of company-name strings, returning one ranked candidate (or
//! none) per A with a {MATCH, NO_MATCH, REVIEW} decision.
//!
//! This facade crate wires together the four pure/boundary building
//! blocks that live in their own crates:
//! - [`namematch_core`]: normalization, the blocking index, fuzzy
//!   similarity primitives, and deterministic scoring. No I/O beyond
//!   loading static word-lists.
//! - [`namematch_embed`]: the optional embedding-augmented candidate
//!   index, behind an [`namematch_embed::EmbeddingProvider`] the caller
//!   supplies.
//! - [`namematch_arbiter`]: strictly-gated external arbitration for
//!   ambiguous REVIEW pairs, behind an
//!   [`namematch_arbiter::ArbiterProvider`] the caller supplies.
//! - [`Matcher`]: the orchestrator — preprocess B once, then
//!   `match_one`/`match_all` per query, in the teacher workspace's
//!   `ploke_rag::core::RagService` shape (a struct over read-only
//!   indices plus a config, with async methods at the only blocking
//!   points).
//!
//! Out of scope, by design (spec.md §1): CLI parsing, spreadsheet I/O,
//! the HTTP curation UI, concrete embedding/judge provider
//! implementations, and persistent manual-match storage. Only the
//! narrow [`ManualMatchProvider`] contract those collaborators must
//! uphold lives here.
//!
//! Quickstart
//! ```no_run
//! use namematch::{MatchConfig, Matcher};
//!
//! # async fn doc_example() {
//! let mut matcher = Matcher::new(MatchConfig::default());
//! matcher
//!     .preprocess_b(&["Apple Inc".to_string(), "Microsoft Corp".to_string()])
//!     .await
//!     .unwrap();
//! let result = matcher.match_one(0, "Apple Incorporated").await;
//! assert_eq!(result.decision, namematch_core::Decision::Match);
//! # }
//! ```
//!
//! Logging
//! - `tracing` spans/events mark the boundary calls (`preprocess_b`'s
//!   embedding build, `match_all`'s progress log, arbiter call
//!   failures); the hot per-candidate scoring path is not instrumented,
//!   matching how the teacher workspace never instruments
//!   `fusion::rrf_fuse`/`mmr_select`, only the `RagService` methods that
//!   call out.
//!
//! Concurrency
//! - [`Matcher::match_all`] processes A names sequentially and preserves
//!   input order, per spec.md §5. [`Matcher::match_all_cancellable`]
//!   additionally accepts a [`cancel::CancellationListener`] checked
//!   between (never during) A names.
use std::sync::Once;

#[cfg(not(test))]
static TRACER_INIT: Once = Once::new();

#[cfg(not(test))]
#[allow(dead_code)]
fn ensure_tracer_initialized() {
    TRACER_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_target(false).try_init();
    });
}

#[cfg(test)]
#[allow(dead_code)]
fn ensure_tracer_initialized() {
    // Tests configure tracing themselves, if at all; no-op here to
    // avoid interfering with the test harness's own subscriber.
}

pub mod cancel;
pub mod config;
pub mod manual_match;
pub mod matcher;

pub use cancel::{cancellation_token, CancellationHandle, CancellationListener};
pub use config::{CandidateConfig, MatchConfig, NormalizationConfig, Thresholds};
pub use manual_match::{ManualMatch, ManualMatchProvider, StaticManualMatchProvider};
pub use matcher::{DecisionHistogram, MatchStats, Matcher};

pub use namematch_arbiter::{Arbiter, ArbiterConfig, ArbiterProvider, ArbiterResponse, ArbiterVerdict};
pub use namematch_core::{
    AcronymConfig, BlockingIndex, Candidate, CandidateSource, Decision, DebugInfo, FeatureValue,
    IndexConfig, KeyType, MatchResult, NormalizedName, Penalties, ScoredCandidate, ScoringConfig,
    ScoringWeights, TopCandidate, WordCategory, WordLists,
};
pub use namematch_embed::{cosine_similarity, EmbeddingConfig, EmbeddingIndex, EmbeddingProvider};
pub use namematch_error::{Error, Result, Severity};
