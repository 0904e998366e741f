//! The aggregate [`MatchConfig`]: every sub-config the pipeline needs,
//! each independently `Default`-implemented with spec defaults, mirroring
//! `ploke_rag::RagConfig`'s aggregate-with-per-field-default shape.
//! Grounded on `cm/src/cm/config.py`'s dataclass tree.
use namematch_arbiter::ArbiterConfig;
use namematch_core::{AcronymConfig, NormalizeConfig, Penalties, ScoringConfig, ScoringWeights, WordCategory};
use namematch_embed::EmbeddingConfig;
use namematch_error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tri-band decision thresholds (spec.md §4.5 / `cm/config.py::Thresholds`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub t_high: f32,
    pub t_low: f32,
    pub margin: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            t_high: 0.92,
            t_low: 0.75,
            margin: 0.06,
        }
    }
}

/// Candidate-retrieval caps (spec.md §4.2 / `cm/config.py::CandidateConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateConfig {
    pub max_candidates_total: usize,
    pub max_candidates_lexical: usize,
    pub max_candidates_embedding: usize,
    pub use_k_first: bool,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            max_candidates_total: 500,
            max_candidates_lexical: 300,
            max_candidates_embedding: 200,
            use_k_first: true,
        }
    }
}

/// Normalization-pipeline knobs exposed to configuration (spec.md §4.1 /
/// `cm/config.py::NormalizationConfig`). The designator-stripping
/// `min_tokens` used on the first pass is fixed at 2 (spec invariant,
/// not user-configurable); the aggressive re-strip after category
/// stripping is always 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub strip_prefix_designators: bool,
    pub strip_categories: Vec<WordCategory>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            strip_prefix_designators: false,
            strip_categories: Vec::new(),
        }
    }
}

/// The top-level configuration for a [`crate::Matcher`]. Every field has
/// a `Default`, so `MatchConfig::default()` alone is usable; `load_toml`
/// layers an on-disk TOML file's values over those defaults (missing
/// keys fall back to `Default::default()` per field, since every
/// sub-config derives `#[serde(default)]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub weights: ScoringWeights,
    pub penalties: Penalties,
    pub thresholds: Thresholds,
    pub candidates: CandidateConfig,
    pub arbiter: ArbiterConfig,
    pub embedding: EmbeddingConfig,
    pub acronym: AcronymConfig,
    pub normalization: NormalizationConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            penalties: Penalties::default(),
            thresholds: Thresholds::default(),
            candidates: CandidateConfig::default(),
            arbiter: ArbiterConfig::default(),
            embedding: EmbeddingConfig::default(),
            acronym: AcronymConfig::default(),
            normalization: NormalizationConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Load a `MatchConfig` from a TOML file, falling back to
    /// `Default::default()` for any key the file omits.
    pub fn load_toml(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::ConfigData(e.to_string()))
    }

    pub(crate) fn normalize_config(&self) -> NormalizeConfig {
        NormalizeConfig {
            strip_prefix_designators: self.normalization.strip_prefix_designators,
            strip_categories: self.normalization.strip_categories.clone(),
            acronym_min_length: self.acronym.min_length,
            designator_min_tokens: NormalizeConfig::default().designator_min_tokens,
        }
    }

    pub(crate) fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            weights: self.weights,
            penalties: self.penalties,
            t_high: self.thresholds.t_high,
            semantic_min_core_tokens: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_thresholds() {
        let config = MatchConfig::default();
        assert_eq!(config.thresholds.t_high, 0.92);
        assert_eq!(config.thresholds.t_low, 0.75);
        assert_eq!(config.thresholds.margin, 0.06);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("namematch-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[thresholds]\nt_high = 0.8\n").unwrap();
        let config = MatchConfig::load_toml(&path).unwrap();
        assert_eq!(config.thresholds.t_high, 0.8);
        assert_eq!(config.thresholds.t_low, Thresholds::default().t_low);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
