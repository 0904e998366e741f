//! Optional dense-embedding augmentation for candidate retrieval.
//!
//! Grounded on `original_source/packages/cm/src/cm/embeddings.py`: an
//! [`EmbeddingProvider`] turns batches of normalized core strings into
//! dense vectors; an [`EmbeddingIndex`] unit-normalizes and caches them
//! on disk by exact core string, then answers top-k nearest-neighbor
//! queries with a brute-force cosine scan (this system's blocking
//! indexes stay in the low hundreds of candidates, so an approximate
//! index buys nothing an exact scan doesn't already give for free).
//!
//! The provider trait returns a manually boxed future rather than using
//! `async-trait`, matching `ploke-rag::core::Reranker`'s shape — the
//! crate closest to this one's "thin async boundary around an
//! otherwise-sync core" design in the teacher workspace.
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use namematch_error::{Error, Result};

/// Config for the optional embedding-augmentation stage (spec.md §6 /
/// `cm/config.py::EmbeddingConfig`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub enabled: bool,
    pub ann_neighbors: usize,
    pub cache_dir: PathBuf,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ann_neighbors: 100,
            cache_dir: PathBuf::from(".namematch_cache/embeddings"),
            batch_size: 250,
        }
    }
}

/// Turns batches of text into dense vectors. Implementations own their
/// own transport (HTTP client, local model runtime, ...); this crate
/// only specifies the contract and never talks to a concrete backend.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `texts` in a single batch call. The returned `Vec` must be
    /// the same length as `texts`, in the same order — a mismatch is a
    /// [`Error::Contract`] violation the caller cannot recover from.
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;
}

/// Cosine similarity between two vectors. Zero-row safe: a zero vector
/// on either side (a pathological embedding response) yields `0.0`
/// rather than dividing by zero, mirroring the original's explicit
/// zero-row guard in `_load_cache`/`cosine_similarity`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn unit_normalize(v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        v
    } else {
        v.into_iter().map(|x| x / norm).collect()
    }
}

/// Unit-norm dense vectors over B's core strings, with an on-disk cache
/// and a brute-force cosine top-k query.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    config: EmbeddingConfig,
    cache: HashMap<String, Vec<f32>>,
    b_core_strings: Vec<String>,
    cache_hits: usize,
    external_calls: usize,
}

impl EmbeddingIndex {
    /// Construct an index, loading any pre-existing on-disk cache. A
    /// missing or absent cache directory is not an error.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let mut idx = Self {
            config,
            cache: HashMap::new(),
            b_core_strings: Vec::new(),
            cache_hits: 0,
            external_calls: 0,
        };
        idx.load_cache()?;
        Ok(idx)
    }

    fn cache_path(&self) -> PathBuf {
        self.config.cache_dir.join("embedding_cache.json")
    }

    fn load_cache(&mut self) -> Result<()> {
        let path = self.cache_path();
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                self.cache = serde_json::from_str(&text)
                    .map_err(|e| Error::ConfigData(format!("{path:?}: {e}")))?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn save_cache(&self) -> Result<()> {
        if let Some(parent) = self.cache_path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(&self.cache)?;
        std::fs::write(self.cache_path(), text)?;
        Ok(())
    }

    /// Embed and cache every string in `core_strings` not already
    /// cached, batching provider calls at `config.batch_size`. Empty
    /// strings are skipped (never embedded, never queried against).
    pub async fn precompute(
        &mut self,
        provider: &dyn EmbeddingProvider,
        core_strings: &[String],
    ) -> Result<()> {
        let distinct: std::collections::BTreeSet<&String> = core_strings
            .iter()
            .filter(|s| !s.is_empty())
            .collect();
        self.cache_hits += distinct
            .iter()
            .filter(|s| self.cache.contains_key(s.as_str()))
            .count();
        let missing: Vec<String> = distinct
            .into_iter()
            .filter(|s| !self.cache.contains_key(s.as_str()))
            .cloned()
            .collect();

        for chunk in missing.chunks(self.config.batch_size.max(1)) {
            self.external_calls += 1;
            let vectors = provider.embed_batch(chunk).await?;
            if vectors.len() != chunk.len() {
                return Err(Error::Contract(format!(
                    "embedding provider returned {} vectors for a batch of {}",
                    vectors.len(),
                    chunk.len()
                )));
            }
            for (text, vector) in chunk.iter().zip(vectors) {
                self.cache.insert(text.clone(), unit_normalize(vector));
            }
        }

        if !missing.is_empty() {
            tracing::debug!(count = missing.len(), "embedding cache filled");
            self.save_cache()?;
        }
        Ok(())
    }

    /// Build the index over B: record the per-`b_id` core-string
    /// mapping and precompute every vector.
    pub async fn build(
        &mut self,
        provider: &dyn EmbeddingProvider,
        b_core_strings: &[String],
    ) -> Result<()> {
        self.b_core_strings = b_core_strings.to_vec();
        self.precompute(provider, b_core_strings).await
    }

    /// Fetch (embedding and caching on demand) the vector for a single
    /// core string, typically an A-side query. Returns `None` for an
    /// empty core string, never calling the provider for it.
    pub async fn get_or_compute(
        &mut self,
        provider: &dyn EmbeddingProvider,
        core_string: &str,
    ) -> Result<Option<Vec<f32>>> {
        if core_string.is_empty() {
            return Ok(None);
        }
        if let Some(v) = self.cache.get(core_string) {
            self.cache_hits += 1;
            return Ok(Some(v.clone()));
        }
        let batch = vec![core_string.to_string()];
        self.external_calls += 1;
        let vectors = provider.embed_batch(&batch).await?;
        let Some(vector) = vectors.into_iter().next() else {
            return Err(Error::Contract(
                "embedding provider returned an empty batch for a single-item request".into(),
            ));
        };
        let vector = unit_normalize(vector);
        self.cache.insert(core_string.to_string(), vector.clone());
        self.save_cache()?;
        Ok(Some(vector))
    }

    /// Top-k nearest B ids to `query_vector` by cosine similarity,
    /// capped at `config.ann_neighbors`, sorted by descending score and
    /// tie-broken by ascending `b_id` for determinism.
    pub fn query(&self, query_vector: &[f32], k: usize) -> Vec<(usize, f32)> {
        let k = k.min(self.config.ann_neighbors);
        let mut scored: Vec<(usize, f32)> = self
            .b_core_strings
            .iter()
            .enumerate()
            .filter_map(|(b_id, core)| {
                self.cache
                    .get(core)
                    .map(|v| (b_id, cosine_similarity(query_vector, v)))
            })
            .collect();
        scored.sort_by(|(a_id, a_score), (b_id, b_score)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a_id.cmp(b_id))
        });
        scored.truncate(k);
        scored
    }

    /// The cached unit vector for an exact core string, if one has
    /// already been computed (never triggers a provider call).
    pub fn vector_for(&self, core_string: &str) -> Option<&Vec<f32>> {
        self.cache.get(core_string)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of cache hits observed across [`Self::precompute`] and
    /// [`Self::get_or_compute`] calls, for the matcher's aggregate
    /// telemetry (spec.md §4.3).
    pub fn cache_hit_count(&self) -> usize {
        self.cache_hits
    }

    /// Number of provider `embed_batch` calls made so far (one per
    /// `precompute` chunk, one per `get_or_compute` miss).
    pub fn external_call_count(&self) -> usize {
        self.external_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubProvider {
        dim: usize,
        calls: Mutex<usize>,
    }

    impl EmbeddingProvider for StubProvider {
        fn embed_batch<'a>(
            &'a self,
            texts: &'a [String],
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>> {
            Box::pin(async move {
                *self.calls.lock().unwrap() += 1;
                Ok(texts
                    .iter()
                    .map(|t| {
                        let seed = t.bytes().map(|b| b as f32).sum::<f32>();
                        (0..self.dim).map(|i| seed + i as f32).collect()
                    })
                    .collect())
            })
        }
    }

    fn temp_cache_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("namematch-embed-test-{name}"))
    }

    #[tokio::test]
    async fn precompute_fills_cache_and_dedupes() {
        let dir = temp_cache_dir("precompute");
        let _ = std::fs::remove_dir_all(&dir);
        let provider = StubProvider { dim: 4, calls: Mutex::new(0) };
        let mut idx = EmbeddingIndex::new(EmbeddingConfig {
            cache_dir: dir.clone(),
            ..EmbeddingConfig::default()
        })
        .unwrap();
        idx.precompute(
            &provider,
            &["apple".to_string(), "apple".to_string(), "banana".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(idx.cache_len(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn query_returns_best_match_first() {
        let dir = temp_cache_dir("query");
        let _ = std::fs::remove_dir_all(&dir);
        let provider = StubProvider { dim: 4, calls: Mutex::new(0) };
        let mut idx = EmbeddingIndex::new(EmbeddingConfig {
            cache_dir: dir.clone(),
            ..EmbeddingConfig::default()
        })
        .unwrap();
        idx.build(
            &provider,
            &["apple".to_string(), "banana".to_string(), "apricot".to_string()],
        )
        .await
        .unwrap();
        let query_vec = idx
            .get_or_compute(&provider, "apple")
            .await
            .unwrap()
            .unwrap();
        let results = idx.query(&query_vec, 2);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn cosine_similarity_is_zero_row_safe() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_similarity_of_identical_unit_vectors_is_one() {
        let v = unit_normalize(vec![3.0, 4.0]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }
}
