//! Static word-list loading: legal designators, per-category stopword
//! sets, acronym collisions, and alias/replacement maps.
//!
//! Every list is optional at the filesystem level: a missing file yields
//! an empty set rather than an error, mirroring `designators.py`'s
//! behavior of tolerating a stripped-down install. A malformed file
//! (bad JSON/UTF-8) *is* a [`namematch_error::Error::ConfigData`].
use std::collections::{HashMap, HashSet};
use std::path::Path;

use namematch_error::{Error, Result};

const DESIGNATORS_GLOBAL: &str = include_str!("../data/designators_global.txt");
const CATEGORY_LOCATION: &str = include_str!("../data/category_location.txt");
const CATEGORY_INSTITUTION: &str = include_str!("../data/category_institution.txt");
const CATEGORY_STOPWORD: &str = include_str!("../data/category_stopword.txt");
const ACRONYM_COLLISIONS: &str = include_str!("../data/acronym_collision.txt");
const DESIGNATOR_ALIASES: &str = include_str!("../data/designator_aliases.json");
const REPLACEMENTS: &str = include_str!("../data/replacements.json");

/// The word categories strippable by [`crate::designators::strip_word_categories`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WordCategory {
    Location,
    Institution,
    Stopword,
}

impl WordCategory {
    pub fn all() -> [WordCategory; 3] {
        [
            WordCategory::Location,
            WordCategory::Institution,
            WordCategory::Stopword,
        ]
    }
}

/// All static lexical data the normalizer and acronym logic consult.
/// Built once (typically via [`WordLists::embedded`]) and shared
/// read-only across every `normalize` call.
#[derive(Debug, Clone, Default)]
pub struct WordLists {
    pub designators: HashSet<String>,
    pub categories: HashMap<WordCategory, HashSet<String>>,
    pub acronym_collisions: HashSet<String>,
    pub designator_aliases: HashMap<String, String>,
    pub replacements: Vec<(String, String)>,
}

fn parse_lines(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn read_lines_from(path: &Path) -> Result<HashSet<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(parse_lines(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(e) => Err(Error::from(e)),
    }
}

fn read_json_map_from(path: &Path) -> Result<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            serde_json::from_str(&text).map_err(|e| Error::ConfigData(format!("{path:?}: {e}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(Error::from(e)),
    }
}

/// Parse an ordered JSON object into a `Vec` preserving file order. The
/// literal-substring replacement pass is spec'd as "replay-deterministic"
/// over the order the replacements appear in `replacements.json`, which a
/// `HashMap` cannot preserve; `serde_json::Value`'s object map does (the
/// `preserve_order` feature backs it with an index map).
fn ordered_pairs_from_str(text: &str) -> Result<Vec<(String, String)>> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::ConfigData(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| Error::ConfigData("expected a JSON object".to_string()))?;
    Ok(obj
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect())
}

fn read_ordered_pairs_from(path: &Path) -> Result<Vec<(String, String)>> {
    match std::fs::read_to_string(path) {
        Ok(text) => ordered_pairs_from_str(&text).map_err(|e| match e {
            Error::ConfigData(msg) => Error::ConfigData(format!("{path:?}: {msg}")),
            other => other,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(Error::from(e)),
    }
}

impl WordLists {
    /// The word-lists compiled into the binary. Used whenever no
    /// `wordlists_dir` override is configured; always available, never
    /// fails.
    pub fn embedded() -> Self {
        let mut categories = HashMap::new();
        categories.insert(WordCategory::Location, parse_lines(CATEGORY_LOCATION));
        categories.insert(
            WordCategory::Institution,
            parse_lines(CATEGORY_INSTITUTION),
        );
        categories.insert(WordCategory::Stopword, parse_lines(CATEGORY_STOPWORD));

        let designator_aliases: HashMap<String, String> =
            serde_json::from_str(DESIGNATOR_ALIASES).unwrap_or_default();
        let replacement_pairs = ordered_pairs_from_str(REPLACEMENTS).unwrap_or_default();

        Self {
            designators: parse_lines(DESIGNATORS_GLOBAL),
            categories,
            acronym_collisions: parse_lines(ACRONYM_COLLISIONS),
            designator_aliases,
            replacements: replacement_pairs,
        }
    }

    /// Load word-lists from a directory, falling back to an empty set for
    /// any file that is absent. Directory layout mirrors the embedded
    /// file names: `designators_global.txt`, `category_<name>.txt`,
    /// `acronym_collision.txt`, `designator_aliases.json`,
    /// `replacements.json`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut categories = HashMap::new();
        categories.insert(
            WordCategory::Location,
            read_lines_from(&dir.join("category_location.txt"))?,
        );
        categories.insert(
            WordCategory::Institution,
            read_lines_from(&dir.join("category_institution.txt"))?,
        );
        categories.insert(
            WordCategory::Stopword,
            read_lines_from(&dir.join("category_stopword.txt"))?,
        );

        Ok(Self {
            designators: read_lines_from(&dir.join("designators_global.txt"))?,
            categories,
            acronym_collisions: read_lines_from(&dir.join("acronym_collision.txt"))?,
            designator_aliases: read_json_map_from(&dir.join("designator_aliases.json"))?,
            replacements: read_ordered_pairs_from(&dir.join("replacements.json"))?,
        })
    }

    pub fn category(&self, cat: WordCategory) -> &HashSet<String> {
        static EMPTY: std::sync::OnceLock<HashSet<String>> = std::sync::OnceLock::new();
        self.categories
            .get(&cat)
            .unwrap_or_else(|| EMPTY.get_or_init(HashSet::new))
    }

    pub fn is_designator(&self, token: &str) -> bool {
        self.designators.contains(token)
    }

    /// Alias-map lookup that distinguishes "matched" from "unchanged",
    /// needed by per-token canonicalization (spec §4.1 step 4): a token
    /// that matches the alias map is replaced outright; one that doesn't
    /// falls through to punctuation stripping instead.
    pub fn designator_alias(&self, token: &str) -> Option<&str> {
        self.designator_aliases.get(token).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_lists_are_nonempty() {
        let wl = WordLists::embedded();
        assert!(wl.is_designator("inc"));
        assert!(!wl.category(WordCategory::Stopword).is_empty());
    }

    #[test]
    fn missing_dir_files_yield_empty_sets_not_errors() {
        let dir = std::env::temp_dir().join("namematch-core-empty-wordlists-test");
        let _ = std::fs::create_dir_all(&dir);
        let wl = WordLists::load_from_dir(&dir).expect("missing files are not an error");
        assert!(wl.designators.is_empty());
        assert!(wl.designator_aliases.is_empty());
    }
}
