//! Inverted blocking index over normalized B-side names.
//!
//! Grounded on `bizmatch/src/bizmatch/index.py`: a `(KeyType, key string)`
//! -> set of B ids map. A query is resolved by first unioning *every*
//! lexical key it carries (tracking, per `b_id`, which key types hit
//! it), capping that union to `max_candidates_lexical`, then folding in
//! up to `max_candidates_embedding` embedding-only candidates supplied
//! by the caller, and finally capping the combined set to
//! `max_candidates_total`. Every cap breaks ties by "most contributing
//! key types wins" and then by ascending `b_id`, so the result is
//! deterministic regardless of hash-map iteration order.
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Candidate, CandidateSource, KeyType, NormalizedName};

pub const DEFAULT_LEXICAL_CAP: usize = 300;
pub const DEFAULT_EMBEDDING_CAP: usize = 200;
pub const DEFAULT_TOTAL_CAP: usize = 500;

#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    pub max_candidates_lexical: usize,
    pub max_candidates_embedding: usize,
    pub max_candidates_total: usize,
    /// Whether a query's `k_first` key (its first core token alone) is
    /// consulted during retrieval. Spec §4.2 step 1 marks `k_first` as
    /// "optional at query time" — `false` excludes it so a single common
    /// leading word (e.g. "general") doesn't flood the lexical union.
    pub use_k_first: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_candidates_lexical: DEFAULT_LEXICAL_CAP,
            max_candidates_embedding: DEFAULT_EMBEDDING_CAP,
            max_candidates_total: DEFAULT_TOTAL_CAP,
            use_k_first: true,
        }
    }
}

fn rank_and_cap(
    mut entries: Vec<(usize, BTreeSet<CandidateSource>)>,
    cap: usize,
) -> Vec<(usize, BTreeSet<CandidateSource>)> {
    entries.sort_by(|(a_id, a_src), (b_id, b_src)| {
        b_src.len().cmp(&a_src.len()).then(a_id.cmp(b_id))
    });
    entries.truncate(cap);
    entries.sort_by_key(|(b_id, _)| *b_id);
    entries
}

/// Inverted index from blocking key to the B ids that carry it.
#[derive(Debug, Clone, Default)]
pub struct BlockingIndex {
    map: BTreeMap<(KeyType, String), BTreeSet<usize>>,
    config: IndexConfig,
}

impl BlockingIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            map: BTreeMap::new(),
            config,
        }
    }

    /// Insert every blocking key of `name` under `b_id`.
    pub fn insert(&mut self, b_id: usize, name: &NormalizedName) {
        for (key_type, key) in &name.keys {
            self.map
                .entry((*key_type, key.clone()))
                .or_default()
                .insert(b_id);
        }
    }

    /// Build an index over an entire preprocessed B-side slice.
    pub fn build(names: &[NormalizedName], config: IndexConfig) -> Self {
        let mut idx = Self::new(config);
        for (b_id, name) in names.iter().enumerate() {
            idx.insert(b_id, name);
        }
        tracing::debug!(b_count = names.len(), keys = idx.len(), "blocking index built");
        idx
    }

    /// Retrieve the capped, deterministic candidate set for a query:
    /// union every lexical key the query carries, cap that union, then
    /// union in embedding-sourced candidates (already-ranked `b_id`s
    /// from an ANN lookup the caller performed), cap the total.
    pub fn retrieve_candidates(
        &self,
        query: &NormalizedName,
        embedding_candidates: &[usize],
    ) -> Vec<Candidate> {
        let mut lexical: BTreeMap<usize, BTreeSet<CandidateSource>> = BTreeMap::new();
        for (key_type, key) in &query.keys {
            if !self.config.use_k_first && *key_type == KeyType::First {
                continue;
            }
            let Some(ids) = self.map.get(&(*key_type, key.clone())) else {
                continue;
            };
            for &b_id in ids {
                lexical
                    .entry(b_id)
                    .or_default()
                    .insert(CandidateSource::Key(*key_type));
            }
        }

        let lexical_ranked = rank_and_cap(
            lexical.into_iter().collect(),
            self.config.max_candidates_lexical,
        );

        let mut combined: BTreeMap<usize, BTreeSet<CandidateSource>> =
            lexical_ranked.into_iter().collect();

        for &b_id in embedding_candidates.iter().take(self.config.max_candidates_embedding) {
            combined.entry(b_id).or_default().insert(CandidateSource::Embedding);
        }

        let final_ranked = rank_and_cap(
            combined.into_iter().collect(),
            self.config.max_candidates_total,
        );

        final_ranked
            .into_iter()
            .map(|(b_id, sources)| Candidate { b_id, sources })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
