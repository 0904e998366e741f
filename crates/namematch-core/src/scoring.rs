//! Deterministic weighted scoring of an (A, B) normalized-name pair.
//!
//! Grounded on `cm/src/cm/scoring.py`. Each named feature contributes a
//! weighted term to the final score; weights for features that cannot
//! be computed (no acronym relation on either side, semantic scoring
//! ungated) are dropped from both the numerator and the denominator, so
//! the final score always remains a properly normalized weighted
//! average rather than silently diluting toward zero.
//!
//! The semantic cap is the one invariant that is not a simple weighted
//! term: whenever the score computed *without* the semantic feature
//! (the "lexical-only score") falls short of `t_high`, the combined
//! score is clipped just under `t_high` regardless of how strong the
//! semantic signal was, so embeddings alone can never push a pair past
//! the MATCH threshold.
use std::collections::BTreeMap;

use crate::acronyms::{acronym_relation, AcronymRelation};
use crate::fuzzy::weighted_ratio;
use crate::types::{FeatureValue, NormalizedName, ScoredCandidate};
use crate::wordlists::WordLists;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub token_overlap: f32,
    pub fuzzy: f32,
    pub acronym: f32,
    pub semantic: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            token_overlap: 0.35,
            fuzzy: 0.30,
            acronym: 0.20,
            semantic: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Penalties {
    pub numeric_mismatch: f32,
    pub numeric_one_side: f32,
    pub short_name_guardrail: f32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            numeric_mismatch: 0.30,
            numeric_one_side: 0.10,
            short_name_guardrail: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub penalties: Penalties,
    /// Also consulted by the semantic cap; the full `t_low`/`margin`
    /// decision-band config lives one layer up, in the facade crate's
    /// `MatchConfig`.
    pub t_high: f32,
    pub semantic_min_core_tokens: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            penalties: Penalties::default(),
            t_high: 0.92,
            semantic_min_core_tokens: 2,
        }
    }
}

/// Tokens still present after designators are stripped back out of the
/// core set a second time (`cm/scoring.py::_effective_core`): lexical
/// agreement on "apple inc" vs "apple incorporated" shouldn't be diluted
/// by the designator tokens that safety-revert kept in `core_tokens`.
/// Falls back to the unfiltered tokens if every one of them is itself a
/// designator, so the feature never operates on an empty set.
fn effective_core(tokens: &[String], lists: &WordLists) -> Vec<String> {
    let filtered: Vec<String> = tokens
        .iter()
        .filter(|t| !lists.is_designator(t))
        .cloned()
        .collect();
    if filtered.is_empty() {
        tokens.to_vec()
    } else {
        filtered
    }
}

/// `|A ∩ B| / min(|A|, |B|)` — containment, not Jaccard: a short core
/// name fully contained in a longer one should score near 1, not be
/// diluted by the longer side's extra tokens.
fn token_overlap(a: &[String], b: &[String]) -> f32 {
    use std::collections::BTreeSet;
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let sa: BTreeSet<&String> = a.iter().collect();
    let sb: BTreeSet<&String> = b.iter().collect();
    let inter = sa.intersection(&sb).count();
    let denom = sa.len().min(sb.len());
    inter as f32 / denom as f32
}

fn acronym_score_for(relation: AcronymRelation) -> f32 {
    match relation {
        AcronymRelation::Exact => 1.0,
        AcronymRelation::Initialism => 0.9,
        AcronymRelation::Collision => 0.3,
        AcronymRelation::None => 0.0,
    }
}

/// Score a single (A, B) pair. `semantic_similarity` is `Some(cosine)`
/// only when the caller's embedding index actually produced a value for
/// this pair; it is still re-gated here on both sides having at least
/// `semantic_min_core_tokens` core tokens, independent of whether the
/// caller already gated it.
pub fn score_pair(
    a: &NormalizedName,
    b: &NormalizedName,
    semantic_similarity: Option<f32>,
    lists: &WordLists,
    config: &ScoringConfig,
) -> ScoredCandidate {
    let mut features: BTreeMap<String, FeatureValue> = BTreeMap::new();
    let mut reasons = Vec::new();

    let eff_a = effective_core(&a.core_tokens, lists);
    let eff_b = effective_core(&b.core_tokens, lists);

    let overlap = token_overlap(&eff_a, &eff_b);
    features.insert("token_overlap".into(), FeatureValue::Num(overlap));
    if overlap >= 0.8 {
        reasons.push("core_overlap_high".to_string());
    }

    let fuzzy = weighted_ratio(&eff_a.join(" "), &eff_b.join(" ")) / 100.0;
    features.insert("fuzzy_similarity".into(), FeatureValue::Num(fuzzy));
    if fuzzy >= 0.85 {
        reasons.push("fuzzy_high".to_string());
    }

    let relation = acronym_relation(
        a.acronym.as_deref(),
        &a.core_tokens,
        b.acronym.as_deref(),
        &b.core_tokens,
        lists,
    );
    let acronym_score = acronym_score_for(relation);
    features.insert("acronym_score".into(), FeatureValue::Num(acronym_score));
    features.insert(
        "acronym_relation".into(),
        FeatureValue::Label(format!("{relation:?}")),
    );
    match relation {
        AcronymRelation::Exact | AcronymRelation::Initialism => {
            reasons.push("acronym_match_strong".to_string());
        }
        AcronymRelation::Collision => {
            reasons.push("acronym_match_weak".to_string());
        }
        AcronymRelation::None => {}
    }

    let mut weighted_sum =
        overlap * config.weights.token_overlap + fuzzy * config.weights.fuzzy;
    let mut weight_total = config.weights.token_overlap + config.weights.fuzzy;

    if acronym_score > 0.0 {
        weighted_sum += acronym_score * config.weights.acronym;
        weight_total += config.weights.acronym;
    }

    let lexical_only_score = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };

    let semantic_eligible = a.core_tokens.len() >= config.semantic_min_core_tokens
        && b.core_tokens.len() >= config.semantic_min_core_tokens;

    let has_semantic = semantic_eligible && semantic_similarity.is_some();
    let raw = if let (true, Some(sim)) = (semantic_eligible, semantic_similarity) {
        features.insert("semantic_similarity".into(), FeatureValue::Num(sim));
        if sim >= 0.85 {
            reasons.push("semantic_boost".to_string());
        }
        let sum = weighted_sum + sim * config.weights.semantic;
        let total = weight_total + config.weights.semantic;
        if total > 0.0 {
            sum / total
        } else {
            0.0
        }
    } else {
        lexical_only_score
    };

    let a_numeric_nonempty = !a.numeric_tokens.is_empty();
    let b_numeric_nonempty = !b.numeric_tokens.is_empty();
    let mut numeric_penalty = 0.0;
    if a_numeric_nonempty && b_numeric_nonempty && a.numeric_tokens != b.numeric_tokens {
        numeric_penalty = config.penalties.numeric_mismatch;
        reasons.push("numeric_mismatch".to_string());
        features.insert("numeric_mismatch".into(), FeatureValue::Num(1.0));
    } else if a_numeric_nonempty != b_numeric_nonempty {
        numeric_penalty = config.penalties.numeric_one_side;
        reasons.push("numeric_one_side_only".to_string());
        features.insert("numeric_one_side_only".into(), FeatureValue::Num(1.0));
    }

    // The guardrail looks at the *original* core length, not the
    // effective (designator-stripped) one: "Go" vs "Io" is just as
    // unreliable whether or not either token happens to be a designator.
    let mut short_penalty = 0.0;
    if a.core_tokens.len().min(b.core_tokens.len()) <= 1 {
        short_penalty = config.penalties.short_name_guardrail;
        reasons.push("short_name_guardrail".to_string());
        features.insert("short_name_guardrail".into(), FeatureValue::Num(1.0));
    }

    let score0 = (raw - numeric_penalty - short_penalty).clamp(0.0, 1.0);

    let mut score = score0;
    if has_semantic && lexical_only_score < config.t_high {
        let ceiling = config.t_high - 0.01;
        let capped = score0.min(ceiling);
        if capped < score0 {
            reasons.push("semantic_capped".to_string());
        }
        score = capped;
    }

    features.insert("final_score".into(), FeatureValue::Num(score));

    ScoredCandidate {
        b_id: 0,
        score,
        features,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, NormalizeConfig};

    fn n(s: &str, lists: &WordLists) -> NormalizedName {
        normalize(s, lists, &NormalizeConfig::default())
    }

    #[test]
    fn identical_core_names_score_near_one() {
        let lists = WordLists::embedded();
        let a = n("Apple Inc.", &lists);
        let b = n("Apple Inc", &lists);
        let sc = score_pair(&a, &b, None, &lists, &ScoringConfig::default());
        assert!(sc.score > 0.9, "expected near-1 score, got {}", sc.score);
    }

    #[test]
    fn score_is_always_in_unit_range() {
        let lists = WordLists::embedded();
        let a = n("Completely Unrelated Name", &lists);
        let b = n("Another Totally Different Thing", &lists);
        let sc = score_pair(&a, &b, Some(0.99), &lists, &ScoringConfig::default());
        assert!((0.0..=1.0).contains(&sc.score));
    }

    #[test]
    fn numeric_mismatch_penalizes_score() {
        let lists = WordLists::embedded();
        let a = n("Company 2020", &lists);
        let b = n("Company 2021", &lists);
        let config = ScoringConfig::default();
        let sc = score_pair(&a, &b, None, &lists, &config);
        let base_a = n("Company 2020", &lists);
        let base_b = n("Company 2020", &lists);
        let base_sc = score_pair(&base_a, &base_b, None, &lists, &config);
        assert!(sc.score < base_sc.score);
    }

    #[test]
    fn semantic_cap_prevents_pure_embedding_match() {
        let lists = WordLists::embedded();
        let a = n("Red Fox Consulting", &lists);
        let b = n("Blue Whale Enterprises", &lists);
        let config = ScoringConfig::default();
        // Extremely high semantic similarity, but no lexical agreement at all.
        let sc = score_pair(&a, &b, Some(1.0), &lists, &config);
        assert!(
            sc.score < config.t_high,
            "semantic cap should prevent crossing t_high, got {}",
            sc.score
        );
    }

    #[test]
    fn semantic_cap_clips_to_exactly_t_high_minus_one_hundredth() {
        let lists = WordLists::embedded();
        // Partial lexical agreement (one shared token) plus a strong
        // semantic signal should land in the capped band, not merely
        // under t_high by some arbitrary amount.
        let a = n("Acme Consulting", &lists);
        let b = n("Acme Ventures", &lists);
        let config = ScoringConfig::default();
        let sc = score_pair(&a, &b, Some(1.0), &lists, &config);
        assert!(sc.score <= config.t_high - 0.01 + 1e-6);
    }

    #[test]
    fn short_name_guardrail_applies_to_single_token_cores() {
        let lists = WordLists::embedded();
        let a = n("Go", &lists);
        let b = n("Io", &lists);
        let config = ScoringConfig::default();
        let sc = score_pair(&a, &b, None, &lists, &config);
        assert!(sc.reasons.iter().any(|r| r == "short_name_guardrail"));
    }

    #[test]
    fn acronym_initialism_is_a_strong_signal() {
        let lists = WordLists::embedded();
        let a = n("IBM", &lists);
        let b = n("International Business Machines", &lists);
        let sc = score_pair(&a, &b, None, &lists, &ScoringConfig::default());
        assert!(
            sc.score > 0.5,
            "expected acronym match to score well, got {}",
            sc.score
        );
    }

    #[test]
    fn effective_core_ignores_surviving_designators_in_overlap() {
        let lists = WordLists::embedded();
        // Both sides revert to keep their designator token ("inc"/"corp"),
        // but overlap/fuzzy should still be computed on "apple" alone.
        let a = n("Apple Inc", &lists);
        let b = n("Apple Corp", &lists);
        let sc = score_pair(&a, &b, None, &lists, &ScoringConfig::default());
        assert_eq!(sc.features.get("token_overlap").unwrap().as_f32(), Some(1.0));
    }

    #[test]
    fn token_overlap_divides_by_set_cardinality_not_token_count() {
        let lists = WordLists::embedded();
        // Both sides normalize to core [johnson, and, johnson]: a repeated
        // core token must not inflate the denominator past the distinct
        // token count.
        let a = n("Johnson and Johnson", &lists);
        let b = n("Johnson & Johnson", &lists);
        let sc = score_pair(&a, &b, None, &lists, &ScoringConfig::default());
        assert_eq!(sc.features.get("token_overlap").unwrap().as_f32(), Some(1.0));
    }

    #[test]
    fn canonical_reason_tags_replace_free_text() {
        let lists = WordLists::embedded();
        let a = n("Apple Inc.", &lists);
        let b = n("Apple Inc", &lists);
        let sc = score_pair(&a, &b, None, &lists, &ScoringConfig::default());
        assert!(sc.reasons.iter().any(|r| r == "core_overlap_high"));
        assert!(sc.reasons.iter().any(|r| r == "fuzzy_high"));
    }
}
