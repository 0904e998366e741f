//! The eleven-step name-normalization pipeline (spec §4.1).
//!
//! Grounded on `cm/src/cm/normalize.py`. Pure and total: every input,
//! including the empty string and pure-punctuation strings, produces a
//! [`NormalizedName`] — never an error. Normalization is config- and
//! word-list-deterministic: the same `(original, lists, config)` triple
//! always yields bit-identical output.
use std::collections::BTreeMap;

use unicode_normalization::UnicodeNormalization;

use crate::acronyms::{
    generate_acronym, is_collision, single_token_self_acronym, whole_input_acronym,
};
use crate::designators::{strip_designators, strip_word_categories};
use crate::types::{KeyType, NormalizationMeta, NormalizedName};
use crate::wordlists::{WordCategory, WordLists};

const MAX_CATEGORY_ITERATIONS: usize = 10;

/// Normalization-relevant configuration (spec §6 `normalization`/`acronym`
/// surface). Every other sub-config lives in the facade crate's
/// `MatchConfig`; this one is narrowed to what the normalizer itself
/// consults.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    pub strip_prefix_designators: bool,
    pub strip_categories: Vec<WordCategory>,
    pub acronym_min_length: usize,
    pub designator_min_tokens: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            strip_prefix_designators: false,
            strip_categories: Vec::new(),
            acronym_min_length: 3,
            designator_min_tokens: 2,
        }
    }
}

fn nfkc_casefold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Apply the configured, ordered literal-string replacements (e.g.
/// `"&"` -> `" and "`) over the casefolded text, in file order.
fn apply_replacements(text: &str, lists: &WordLists) -> String {
    let mut out = text.to_string();
    for (from, to) in &lists.replacements {
        out = out.replace(from.as_str(), to.as_str());
    }
    out
}

/// Strip every character that is not alphanumeric, preserving order.
fn strip_non_alphanumeric(token: &str) -> String {
    token.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Per-token canonicalization (spec §4.1 step 4): alias matches replace
/// the whole token outright; everything else falls through to
/// punctuation stripping.
fn canonicalize_tokens(raw_split: &[&str], lists: &WordLists) -> Vec<String> {
    let mut out = Vec::with_capacity(raw_split.len());
    for t in raw_split {
        if let Some(canonical) = lists.designator_alias(t) {
            out.push(canonical.to_string());
        } else {
            let cleaned = strip_non_alphanumeric(t);
            if !cleaned.is_empty() {
                out.push(cleaned);
            }
        }
    }
    out
}

/// Extract every maximal run of ASCII digits from `token`, preserving
/// order; e.g. `"q3-2020"` yields `["3", "2020"]`. Mirrors
/// `re.findall(r"\d+", token)`.
fn digit_runs(token: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in token.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Run the full normalization pipeline on `original` using `lists` and
/// `config`.
pub fn normalize(original: &str, lists: &WordLists, config: &NormalizeConfig) -> NormalizedName {
    if original.trim().is_empty() {
        return NormalizedName::empty(original);
    }

    // Steps 1-2: NFKC + casefold, then literal replacements.
    let normalized_text = nfkc_casefold(original);
    let replaced = apply_replacements(&normalized_text, lists);

    // Step 3: whitespace tokenize.
    let raw_split: Vec<&str> = replaced.split_whitespace().collect();

    // Step 4: per-token canonicalization / punctuation stripping.
    let raw_tokens = canonicalize_tokens(&raw_split, lists);
    if raw_tokens.is_empty() {
        return NormalizedName::empty(original);
    }

    // Step 5: whole-input acronym detection, against the *original* text.
    let tentative_acronym = whole_input_acronym(original, config.acronym_min_length);

    // Step 6: designator stripping with safety revert.
    let (mut core_tokens, mut removed_designators) = strip_designators(
        &raw_tokens,
        lists,
        config.strip_prefix_designators,
        config.designator_min_tokens,
    );

    // Step 7: category stripping to a fixed point, bounded at 10
    // iterations; each pass re-strips designators newly exposed at
    // either end with an aggressive min_tokens=1.
    let mut removed_categories = Vec::new();
    if !config.strip_categories.is_empty() {
        for _ in 0..MAX_CATEGORY_ITERATIONS {
            let before = core_tokens.clone();

            let (after_categories, newly_removed) =
                strip_word_categories(&core_tokens, &config.strip_categories, lists);
            removed_categories.extend(newly_removed);

            let (after_designators, newly_removed_designators) = strip_designators(
                &after_categories,
                lists,
                config.strip_prefix_designators,
                1,
            );
            removed_designators.extend(newly_removed_designators);
            core_tokens = after_designators;

            if core_tokens == before {
                break;
            }
        }
    }

    // Step 8: single-token warning.
    let mut warnings = Vec::new();
    if core_tokens.len() == 1 {
        warnings.push("single_token_core".to_string());
    }

    // Step 9: numeric extraction (read-only over core_tokens).
    let numeric_tokens: Vec<String> = core_tokens.iter().flat_map(|t| digit_runs(t)).collect();

    let core_string = core_tokens.join(" ");

    // Step 10: acronym resolution.
    let mut acronym = tentative_acronym.or_else(|| {
        generate_acronym(&core_tokens, config.acronym_min_length).or_else(|| {
            single_token_self_acronym(original, &core_tokens, config.acronym_min_length)
        })
    });
    if let Some(acr) = &acronym {
        if is_collision(acr, lists) {
            warnings.push("collision_acronym".to_string());
        }
    }
    if let Some(acr) = &acronym {
        if acr.chars().count() < config.acronym_min_length || !acr.chars().all(|c| c.is_alphabetic()) {
            // Invariant: a present acronym is always >= min_length, alphabetic.
            acronym = None;
        }
    }

    // Step 11: blocking keys.
    let mut keys = BTreeMap::new();
    if !core_string.is_empty() {
        keys.insert(KeyType::Core, core_string.clone());
    }
    if core_tokens.len() >= 2 {
        keys.insert(KeyType::Prefix2, core_tokens[..2].join(" "));
    }
    if core_tokens.len() >= 3 {
        keys.insert(KeyType::Prefix3, core_tokens[..3].join(" "));
    }
    if let Some(acr) = &acronym {
        keys.insert(KeyType::Acronym, acr.clone());
    }
    if let Some(first) = core_tokens.first() {
        keys.insert(KeyType::First, first.clone());
    }

    NormalizedName {
        original: original.to_string(),
        normalized_text,
        raw_tokens,
        core_tokens,
        core_string,
        acronym,
        numeric_tokens,
        keys,
        meta: NormalizationMeta {
            removed_designators,
            removed_categories,
            warnings,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> NormalizedName {
        normalize(s, &WordLists::embedded(), &NormalizeConfig::default())
    }

    #[test]
    fn short_core_designator_strip_reverts() {
        // "apple inc" -> stripping "inc" would leave 1 token < min_tokens(2).
        let n = norm("Apple Inc.");
        assert_eq!(n.core_tokens, vec!["apple", "inc"]);
        assert!(n.meta.removed_designators.is_empty());
    }

    #[test]
    fn longer_designator_strip_succeeds() {
        let n = norm("General Electric Corp.");
        assert_eq!(n.core_tokens, vec!["general", "electric"]);
    }

    #[test]
    fn all_designator_input_reverts_atomically() {
        let n = norm("LLC Corp");
        assert_eq!(n.core_tokens, vec!["llc", "corp"]);
        assert!(n.meta.removed_designators.is_empty());
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let n = norm("   ");
        assert!(n.core_tokens.is_empty());
        assert!(n.keys.is_empty());
    }

    #[test]
    fn ampersand_becomes_and() {
        let n = norm("Johnson & Johnson");
        assert_eq!(n.core_tokens, vec!["johnson", "and", "johnson"]);
    }

    #[test]
    fn alias_canonicalization_runs_before_punctuation_stripping() {
        let n1 = norm("Apple Inc.");
        let n2 = norm("Apple Incorporated");
        assert_eq!(n1.core_tokens, n2.core_tokens);
    }

    #[test]
    fn dotted_acronym_is_recognized_directly() {
        assert_eq!(norm("I.B.M.").acronym, Some("ibm".to_string()));
    }

    #[test]
    fn bare_uppercase_acronym_is_recognized() {
        assert_eq!(norm("IBM").acronym, Some("ibm".to_string()));
    }

    #[test]
    fn spelled_out_name_generates_matching_acronym() {
        let n = norm("International Business Machines");
        assert_eq!(n.acronym, Some("ibm".to_string()));
    }

    #[test]
    fn two_token_name_has_no_generated_acronym() {
        // min_length defaults to 3; 2 core tokens is below threshold.
        let n = norm("General Electric");
        assert_eq!(n.acronym, None);
    }

    #[test]
    fn determinism_same_input_same_output() {
        let a = norm("General Electric Co.");
        let b = norm("General Electric Co.");
        assert_eq!(a, b);
    }

    #[test]
    fn numeric_tokens_are_extracted_without_removing_from_core() {
        let n = norm("Company 2020");
        assert_eq!(n.core_tokens, vec!["company", "2020"]);
        assert_eq!(n.numeric_tokens, vec!["2020"]);
    }

    #[test]
    fn digit_run_extracted_from_mixed_alnum_token() {
        let n = norm("Q3 2020 Holdings");
        assert!(n.numeric_tokens.contains(&"3".to_string()));
        assert!(n.numeric_tokens.contains(&"2020".to_string()));
    }

    #[test]
    fn category_stripping_exposes_new_trailing_designator() {
        let config = NormalizeConfig {
            strip_categories: vec![WordCategory::Location],
            ..NormalizeConfig::default()
        };
        let lists = WordLists::embedded();
        // Stripping "germany" (location) exposes "sa" as a new trailing
        // designator, which the aggressive re-strip pass then removes.
        let n = normalize("HSBC Continental Europe SA Germany", &lists, &config);
        assert_eq!(n.core_tokens, vec!["hsbc", "continental", "europe"]);
    }

    #[test]
    fn idempotent_on_its_own_core_string() {
        let n = norm("General Electric Company International");
        let lists = WordLists::embedded();
        let config = NormalizeConfig::default();
        let re = normalize(&n.core_string, &lists, &config);
        assert_eq!(re.core_tokens, n.core_tokens);
    }
}
