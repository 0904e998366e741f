//! The manual-match short-circuit (spec §4.5.b).
//!
//! Grounded on `original_source/packages/cm/src/cm/manual_matches.py`'s
//! `get_a_to_b_map`: a curated name -> (b_name, optional b_id) lookup,
//! consulted before normalization so a previously-confirmed pair never
//! has to pass back through the scorer. Only the lookup contract is
//! implemented here — the JSON persistence, the `add_match`/
//! `remove_match` curation API, and the HTTP UI that drives them stay
//! out of scope, per spec.md.
use std::collections::HashMap;

/// A single curated match: the canonical B name a given A name resolves
/// to, plus its `b_id` in the current B index, if known.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualMatch {
    pub b_name: String,
    pub b_id: Option<usize>,
}

/// Consulted as the very first step of [`crate::Matcher::match_one`].
/// Implementations may back this with a file, a database, or (as in
/// [`StaticManualMatchProvider`]) an in-memory map.
pub trait ManualMatchProvider: Send + Sync {
    fn lookup(&self, a_name: &str) -> Option<ManualMatch>;
}

/// A simple in-memory [`ManualMatchProvider`] over an exact A-name map,
/// sufficient for tests and for callers that load their own curated
/// list some other way before constructing a [`crate::Matcher`].
#[derive(Debug, Clone, Default)]
pub struct StaticManualMatchProvider {
    matches: HashMap<String, ManualMatch>,
}

impl StaticManualMatchProvider {
    pub fn new(matches: HashMap<String, ManualMatch>) -> Self {
        Self { matches }
    }
}

impl ManualMatchProvider for StaticManualMatchProvider {
    fn lookup(&self, a_name: &str) -> Option<ManualMatch> {
        self.matches.get(a_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_name_hit_returns_the_curated_match() {
        let mut matches = HashMap::new();
        matches.insert(
            "Acme Corp".to_string(),
            ManualMatch {
                b_name: "Acme Corporation".to_string(),
                b_id: Some(7),
            },
        );
        let provider = StaticManualMatchProvider::new(matches);
        assert_eq!(
            provider.lookup("Acme Corp"),
            Some(ManualMatch {
                b_name: "Acme Corporation".to_string(),
                b_id: Some(7),
            })
        );
    }

    #[test]
    fn miss_returns_none() {
        let provider = StaticManualMatchProvider::default();
        assert_eq!(provider.lookup("Anything"), None);
    }
}
