//! Acronym generation and acronym-vs-name relation scoring.
//!
//! Grounded on `bizmatch/src/bizmatch/acronyms.py` and the normalization
//! pipeline's steps 5 and 10 (`cm/src/cm/normalize.py`): an acronym is
//! either direct acronym-shaped input (dotted or bare initials, detected
//! against the *original*, not-yet-casefolded string) or the initial
//! letters of the core tokens, lowercased.
use crate::wordlists::WordLists;

/// How an acronym relates to the other side's core tokens, used by the
/// scorer to produce the `acronym_score` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcronymRelation {
    /// Both sides carry the identical acronym string.
    Exact,
    /// One side's acronym equals the letter-initials of the other side's
    /// core tokens (one side spelled out, the other given as initials).
    Initialism,
    /// The acronym matches but is a known collision-prone string (e.g.
    /// "us", "it") and should not be trusted as a strong signal alone.
    Collision,
    /// No relation found.
    None,
}

/// The minimum core-token count the non-acronym side must have for an
/// acronym/initialism relation to count, per spec §4.4. This is a fixed
/// constant independent of `AcronymConfig::min_length` — grounded on
/// `bizmatch/acronyms.py::acronym_relation`'s hardcoded `>= 3`.
const INITIALISM_MIN_CORE_TOKENS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AcronymConfig {
    pub min_length: usize,
}

impl Default for AcronymConfig {
    fn default() -> Self {
        Self { min_length: 3 }
    }
}

/// Step 5 of normalization: detect whole-input acronym-shaped strings
/// against the *original* (pre-fold) text — "I.B.M." or "I B M", each
/// piece a single letter, purely alphabetic once dots/spaces are
/// removed, and at least `min_length` letters long.
pub fn whole_input_acronym(original: &str, min_length: usize) -> Option<String> {
    let cleaned: String = original
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();
    if cleaned.chars().count() < min_length || !cleaned.chars().all(|c| c.is_alphabetic()) {
        return None;
    }
    let pieces: Vec<&str> = original
        .split(|c: char| c == '.' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if pieces.iter().all(|p| p.chars().count() == 1) {
        Some(cleaned.to_lowercase())
    } else {
        None
    }
}

/// Step 10, first branch: generate an acronym from the first letter of
/// each core token, provided there are at least `min_length` of them.
pub fn generate_acronym(core_tokens: &[String], min_length: usize) -> Option<String> {
    if core_tokens.len() < min_length {
        return None;
    }
    let acr: String = core_tokens
        .iter()
        .filter_map(|t| t.chars().next())
        .flat_map(|c| c.to_lowercase())
        .collect();
    if acr.chars().count() < min_length {
        None
    } else {
        Some(acr)
    }
}

/// Step 10, second branch: a lone core token that is itself acronym-shaped
/// (alphabetic, long enough, and the original — dots removed — was
/// entirely uppercase) is its own acronym.
pub fn single_token_self_acronym(
    original: &str,
    core_tokens: &[String],
    min_length: usize,
) -> Option<String> {
    let [token] = core_tokens else { return None };
    if !token.chars().all(|c| c.is_alphabetic()) || token.chars().count() < min_length {
        return None;
    }
    let original_no_dots: String = original.chars().filter(|c| *c != '.').collect();
    let trimmed = original_no_dots.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()) {
        Some(token.clone())
    } else {
        None
    }
}

pub fn is_collision(acronym: &str, lists: &WordLists) -> bool {
    lists.acronym_collisions.contains(acronym)
}

/// Determine the relation between two sides' acronyms and core tokens,
/// mirroring `bizmatch/acronyms.py::acronym_relation` exactly: direct
/// equality first, then a two-way initialism check against the *other*
/// side's core tokens (not its stored acronym), each gated on that side
/// having at least [`INITIALISM_MIN_CORE_TOKENS`] core tokens.
pub fn acronym_relation(
    a_acronym: Option<&str>,
    a_core: &[String],
    b_acronym: Option<&str>,
    b_core: &[String],
    lists: &WordLists,
) -> AcronymRelation {
    if let (Some(a), Some(b)) = (a_acronym, b_acronym) {
        if a == b {
            return if is_collision(a, lists) {
                AcronymRelation::Collision
            } else {
                AcronymRelation::Exact
            };
        }
    }

    let initials = |tokens: &[String]| -> String {
        tokens
            .iter()
            .filter_map(|t| t.chars().next())
            .flat_map(|c| c.to_lowercase())
            .collect()
    };

    if let Some(a) = a_acronym {
        if b_core.len() >= INITIALISM_MIN_CORE_TOKENS && a == initials(b_core) {
            return if is_collision(a, lists) {
                AcronymRelation::Collision
            } else {
                AcronymRelation::Initialism
            };
        }
    }

    if let Some(b) = b_acronym {
        if a_core.len() >= INITIALISM_MIN_CORE_TOKENS && b == initials(a_core) {
            return if is_collision(b, lists) {
                AcronymRelation::Collision
            } else {
                AcronymRelation::Initialism
            };
        }
    }

    AcronymRelation::None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn generates_acronym_from_three_or_more_tokens() {
        assert_eq!(
            generate_acronym(&toks("international business machines"), 3),
            Some("ibm".to_string())
        );
    }

    #[test]
    fn below_min_length_tokens_has_no_acronym() {
        assert_eq!(generate_acronym(&toks("general electric"), 3), None);
    }

    #[test]
    fn whole_input_detects_dotted_acronym() {
        assert_eq!(whole_input_acronym("I.B.M.", 3), Some("ibm".to_string()));
        assert_eq!(whole_input_acronym("I B M", 3), Some("ibm".to_string()));
        assert_eq!(whole_input_acronym("Apple Inc", 3), None);
    }

    #[test]
    fn single_token_self_acronym_requires_uppercase_original() {
        assert_eq!(
            single_token_self_acronym("IBM", &toks("ibm"), 3),
            Some("ibm".to_string())
        );
        assert_eq!(single_token_self_acronym("Apple", &toks("apple"), 3), None);
    }

    #[test]
    fn exact_relation_for_matching_multi_token_acronyms() {
        let lists = WordLists::embedded();
        assert_eq!(
            acronym_relation(
                Some("ibm"),
                &toks("international business machines"),
                Some("ibm"),
                &toks("international business machines"),
                &lists
            ),
            AcronymRelation::Exact
        );
    }

    #[test]
    fn initialism_relation_when_one_side_is_a_bare_acronym() {
        let lists = WordLists::embedded();
        assert_eq!(
            acronym_relation(
                Some("ibm"),
                &toks("ibm"),
                None,
                &toks("international business machines"),
                &lists
            ),
            AcronymRelation::Initialism
        );
    }

    #[test]
    fn initialism_requires_at_least_three_core_tokens() {
        let lists = WordLists::embedded();
        assert_eq!(
            acronym_relation(Some("ge"), &toks("ge"), None, &toks("general electric"), &lists),
            AcronymRelation::None
        );
    }

    #[test]
    fn collision_relation_for_known_ambiguous_acronyms() {
        let lists = WordLists::embedded();
        assert_eq!(
            acronym_relation(Some("us"), &toks("us"), Some("us"), &toks("us"), &lists),
            AcronymRelation::Collision
        );
    }
}
