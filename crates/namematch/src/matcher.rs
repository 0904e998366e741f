//! The orchestrator: normalize B, build indices, then for each A,
//! normalize, retrieve candidates, score, decide, and optionally
//! arbitrate. Grounded on
//! `original_source/packages/cm/src/cm/matcher.py` for orchestration
//! order and on `ploke-rag::core::RagService` for the Rust shape: a
//! struct holding read-only indices plus a config, exposing async
//! methods that call out to the only two blocking collaborators
//! (the embedding and arbiter providers).
use namematch_arbiter::{Arbiter, ArbiterProvider};
use namematch_core::{
    normalize, BlockingIndex, Decision, DebugInfo, IndexConfig, MatchResult, NormalizedName,
    ScoredCandidate, TopCandidate, WordLists,
};
use namematch_embed::{cosine_similarity, EmbeddingIndex, EmbeddingProvider};
use namematch_error::Result;
use tokio::sync::Mutex as AsyncMutex;

use crate::cancel::CancellationListener;
use crate::config::MatchConfig;
use crate::manual_match::ManualMatchProvider;

/// Per-decision counts across a [`Matcher::match_all_with_stats`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionHistogram {
    pub match_count: usize,
    pub no_match_count: usize,
    pub review_count: usize,
}

/// Aggregate telemetry for a batch run (spec.md §4.5): total (A, B)
/// comparisons scored, how many A names found no candidates at all, the
/// decision histogram, how many arbiter calls were actually made, and the
/// embedding provider's call/cache-hit counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub comparisons: usize,
    pub no_candidate_count: usize,
    pub decisions: DecisionHistogram,
    pub arbiter_calls: usize,
    pub embedding_calls: usize,
    pub embedding_cache_hits: usize,
}

/// Company-name matcher orchestrating the full pipeline. Build with
/// [`Matcher::new`] and the `with_*` builder methods, call
/// [`Matcher::preprocess_b`] once, then [`Matcher::match_one`] or
/// [`Matcher::match_all`] per query.
pub struct Matcher {
    config: MatchConfig,
    lists: WordLists,
    b_names: Vec<NormalizedName>,
    index: BlockingIndex,
    embedding_index: Option<AsyncMutex<EmbeddingIndex>>,
    embedding_provider: Option<Box<dyn EmbeddingProvider>>,
    arbiter: Arbiter,
    manual_match_provider: Option<Box<dyn ManualMatchProvider>>,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        let embedding_index = if config.embedding.enabled {
            EmbeddingIndex::new(config.embedding.clone()).ok().map(AsyncMutex::new)
        } else {
            None
        };
        let arbiter = Arbiter::new(config.arbiter, None);
        Self {
            index: BlockingIndex::new(IndexConfig {
                max_candidates_lexical: config.candidates.max_candidates_lexical,
                max_candidates_embedding: config.candidates.max_candidates_embedding,
                max_candidates_total: config.candidates.max_candidates_total,
                use_k_first: config.candidates.use_k_first,
            }),
            lists: WordLists::embedded(),
            b_names: Vec::new(),
            embedding_index,
            embedding_provider: None,
            arbiter,
            manual_match_provider: None,
            config,
        }
    }

    pub fn with_word_lists(mut self, lists: WordLists) -> Self {
        self.lists = lists;
        self
    }

    pub fn with_embedding_provider(mut self, provider: Box<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn with_arbiter_provider(mut self, provider: Box<dyn ArbiterProvider>) -> Self {
        self.arbiter = Arbiter::new(self.config.arbiter, Some(provider));
        self
    }

    pub fn with_manual_match_provider(mut self, provider: Box<dyn ManualMatchProvider>) -> Self {
        self.manual_match_provider = Some(provider);
        self
    }

    pub fn arbiter_calls_made(&self) -> usize {
        self.arbiter.calls_made()
    }

    /// Stage 0: normalize every B name and build the blocking index
    /// (and, if configured, the embedding index).
    #[tracing::instrument(skip(self, names), fields(b_count = names.len()))]
    pub async fn preprocess_b(&mut self, names: &[String]) -> Result<()> {
        let normalize_config = self.config.normalize_config();
        self.b_names = names
            .iter()
            .map(|n| normalize(n, &self.lists, &normalize_config))
            .collect();
        self.index = BlockingIndex::build(
            &self.b_names,
            IndexConfig {
                max_candidates_lexical: self.config.candidates.max_candidates_lexical,
                max_candidates_embedding: self.config.candidates.max_candidates_embedding,
                max_candidates_total: self.config.candidates.max_candidates_total,
                use_k_first: self.config.candidates.use_k_first,
            },
        );

        if let (Some(embedding_index), Some(provider)) =
            (&self.embedding_index, &self.embedding_provider)
        {
            let core_strings: Vec<String> =
                self.b_names.iter().map(|n| n.core_string.clone()).collect();
            embedding_index
                .lock()
                .await
                .build(provider.as_ref(), &core_strings)
                .await?;
        }

        Ok(())
    }

    /// Resolve the embedding ANN candidate ids and the A-side query
    /// vector, if embeddings are enabled and a vector could be produced
    /// for this query's (possibly empty) core string.
    async fn embedding_lookup(&self, a: &NormalizedName) -> (Vec<usize>, Option<Vec<f32>>) {
        let (Some(embedding_index), Some(provider)) =
            (&self.embedding_index, &self.embedding_provider)
        else {
            return (Vec::new(), None);
        };
        let mut idx = embedding_index.lock().await;
        match idx.get_or_compute(provider.as_ref(), &a.core_string).await {
            Ok(Some(vector)) => {
                let neighbors = idx.query(&vector, self.config.embedding.ann_neighbors);
                let ids = neighbors.into_iter().map(|(b_id, _)| b_id).collect();
                (ids, Some(vector))
            }
            _ => (Vec::new(), None),
        }
    }

    /// Apply the tri-band decision rule (spec.md §4.5 /
    /// `cm/matcher.py::_decide`): `score <= t_low` is NO_MATCH; `score
    /// >= t_high` with a sufficient margin (or no runner-up at all) is
    /// MATCH; everything else is REVIEW.
    fn decide(&self, best_score: f32, margin: Option<f32>) -> Decision {
        let t = self.config.thresholds;
        if best_score <= t.t_low {
            return Decision::NoMatch;
        }
        if best_score >= t.t_high && margin.map_or(true, |m| m >= t.margin) {
            return Decision::Match;
        }
        Decision::Review
    }

    /// Match a single A name against the preprocessed B index.
    pub async fn match_one(&self, a_id: usize, a_name: &str) -> MatchResult {
        if let Some(provider) = &self.manual_match_provider {
            if let Some(manual) = provider.lookup(a_name) {
                return MatchResult {
                    a_id,
                    a_name: a_name.to_string(),
                    b_id: manual.b_id,
                    b_name: Some(manual.b_name),
                    decision: Decision::Match,
                    score: 1.0,
                    runner_up_score: None,
                    margin: None,
                    used_arbiter: false,
                    reasons: vec!["manual_match".to_string()],
                    debug: DebugInfo::default(),
                };
            }
        }

        let normalize_config = self.config.normalize_config();
        let a = normalize(a_name, &self.lists, &normalize_config);

        let (embedding_candidate_ids, a_vector) = self.embedding_lookup(&a).await;
        let candidates = self.index.retrieve_candidates(&a, &embedding_candidate_ids);

        if candidates.is_empty() {
            return MatchResult {
                a_id,
                a_name: a.original.clone(),
                b_id: None,
                b_name: None,
                decision: Decision::NoMatch,
                score: 0.0,
                runner_up_score: None,
                margin: None,
                used_arbiter: false,
                reasons: vec!["no_candidates".to_string()],
                debug: DebugInfo {
                    warnings: a.meta.warnings.clone(),
                    ..DebugInfo::default()
                },
            };
        }

        let scoring_config = self.config.scoring_config();
        let mut scored: Vec<ScoredCandidate> = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let b = &self.b_names[candidate.b_id];
            let semantic = match (&self.embedding_index, &a_vector) {
                (Some(embedding_index), Some(av)) => {
                    embedding_index.lock().await.vector_for(&b.core_string).map(|bv| cosine_similarity(av, bv))
                }
                _ => None,
            };
            let mut sc = score_pair_scored(&a, b, semantic, &self.lists, &scoring_config);
            sc.b_id = candidate.b_id;
            scored.push(sc);
        }

        scored.sort_by(|x, y| {
            y.score
                .partial_cmp(&x.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(x.b_id.cmp(&y.b_id))
        });

        let debug = DebugInfo {
            top_candidates: scored
                .iter()
                .take(5)
                .map(|s| TopCandidate {
                    b_id: s.b_id,
                    score: s.score,
                    reasons: s.reasons.clone(),
                })
                .collect(),
            warnings: a.meta.warnings.clone(),
            candidate_count: candidates.len(),
        };

        let mut best = scored[0].clone();
        let mut runner_up_score = scored.get(1).map(|s| s.score);
        let margin = runner_up_score.map(|r| best.score - r);

        let mut decision = self.decide(best.score, margin);
        let mut used_arbiter = false;

        if decision == Decision::Review && self.config.arbiter.enabled {
            let top_k: Vec<&ScoredCandidate> =
                scored.iter().take(self.config.arbiter.top_k).collect();
            for (i, candidate) in top_k.iter().enumerate() {
                let candidate_runner_up = top_k.get(1).map(|s| s.score).filter(|_| i == 0).or({
                    if top_k.len() > 1 {
                        Some(top_k[1].score)
                    } else {
                        None
                    }
                });
                let b = &self.b_names[candidate.b_id];
                if self.arbiter.is_eligible(a_id, &a, b, candidate, candidate_runner_up) {
                    let (arb_decision, _response) = self
                        .arbiter
                        .arbitrate(a_id, &a, b, candidate, candidate_runner_up)
                        .await;
                    if arb_decision != Decision::Review {
                        decision = arb_decision;
                        best = (*candidate).clone();
                        runner_up_score = candidate_runner_up;
                        used_arbiter = true;
                        break;
                    }
                }
            }
        }

        // Open Question resolution (SPEC_FULL.md §3): expose b_id/b_name
        // for MATCH *or* REVIEW, not only MATCH — a REVIEW result with no
        // candidate to look at would not be actionable.
        let (b_id, b_name) = match decision {
            Decision::Match | Decision::Review => {
                (Some(best.b_id), Some(self.b_names[best.b_id].original.clone()))
            }
            Decision::NoMatch => (None, None),
        };

        MatchResult {
            a_id,
            a_name: a.original.clone(),
            b_id,
            b_name,
            decision,
            score: best.score,
            runner_up_score,
            margin,
            used_arbiter,
            reasons: best.reasons.clone(),
            debug,
        }
    }

    /// Match every A name against the preprocessed B index, in order.
    pub async fn match_all(&self, a_names: &[String]) -> Vec<MatchResult> {
        self.match_all_cancellable(a_names, None).await
    }

    /// [`Matcher::match_all`], but first batch-precomputes every A name's
    /// embedding (if embeddings are enabled) and returns the run's
    /// aggregate [`MatchStats`] alongside the per-query results, per
    /// spec.md §4.5's "aggregate statistics" contract.
    pub async fn match_all_with_stats(&self, a_names: &[String]) -> (Vec<MatchResult>, MatchStats) {
        if let (Some(embedding_index), Some(provider)) =
            (&self.embedding_index, &self.embedding_provider)
        {
            let normalize_config = self.config.normalize_config();
            let core_strings: Vec<String> = a_names
                .iter()
                .map(|n| normalize(n, &self.lists, &normalize_config).core_string)
                .collect();
            let _ = embedding_index
                .lock()
                .await
                .precompute(provider.as_ref(), &core_strings)
                .await;
        }

        let results = self.match_all(a_names).await;

        let mut stats = MatchStats::default();
        for r in &results {
            stats.comparisons += r.debug.candidate_count;
            if r.reasons.iter().any(|tag| tag == "no_candidates") {
                stats.no_candidate_count += 1;
            }
            match r.decision {
                Decision::Match => stats.decisions.match_count += 1,
                Decision::NoMatch => stats.decisions.no_match_count += 1,
                Decision::Review => stats.decisions.review_count += 1,
            }
        }
        stats.arbiter_calls = self.arbiter.calls_made();
        if let Some(embedding_index) = &self.embedding_index {
            let idx = embedding_index.lock().await;
            stats.embedding_calls = idx.external_call_count();
            stats.embedding_cache_hits = idx.cache_hit_count();
        }

        (results, stats)
    }

    /// [`Matcher::match_all`], but checked against an optional
    /// [`CancellationListener`] between (never during) A names. Returns
    /// whatever prefix of `a_names` was processed before cancellation
    /// was observed — a valid, if partial, result set per spec.md §5.
    pub async fn match_all_cancellable(
        &self,
        a_names: &[String],
        cancel: Option<&CancellationListener>,
    ) -> Vec<MatchResult> {
        let mut results = Vec::with_capacity(a_names.len());
        for (i, name) in a_names.iter().enumerate() {
            if cancel.map_or(false, |c| c.is_cancelled()) {
                tracing::info!(processed = i, total = a_names.len(), "match_all cancelled");
                break;
            }
            results.push(self.match_one(i, name).await);
            if (i + 1) % 1000 == 0 {
                tracing::info!(
                    processed = i + 1,
                    total = a_names.len(),
                    arbiter_calls = self.arbiter.calls_made(),
                    "match progress"
                );
            }
        }
        results
    }
}

// `namematch_core::score_pair` already does exactly what we need; this
// thin wrapper exists only so the closure-heavy match_one body above
// reads as "score this pair" rather than needing the fully-qualified
// path inline at every call site.
fn score_pair_scored(
    a: &NormalizedName,
    b: &NormalizedName,
    semantic_similarity: Option<f32>,
    lists: &WordLists,
    config: &namematch_core::ScoringConfig,
) -> ScoredCandidate {
    namematch_core::score_pair(a, b, semantic_similarity, lists, config)
}
