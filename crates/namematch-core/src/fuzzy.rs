//! Fuzzy string similarity primitives.
//!
//! The original scorer calls `rapidfuzz.fuzz.WRatio`; this module
//! reimplements the same composite from first principles on top of
//! `strsim`'s edit-distance primitive: gated alternates (`partial_ratio`,
//! `token_sort_ratio`, `token_set_ratio`) only take over when the two
//! strings differ enough in length to make the base ratio unreliable,
//! combined the way `fuzzywuzzy`/`rapidfuzz` combine them. Every
//! primitive returns a score in `[0.0, 100.0]`, matching the upstream
//! library's convention; the scorer divides by 100 itself.

/// Basic Levenshtein-distance ratio: `100 * (1 - dist / max_len)`.
pub fn ratio(a: &str, b: &str) -> f32 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 100.0;
    }
    let dist = strsim::levenshtein(a, b);
    100.0 * (1.0 - dist as f32 / max_len as f32)
}

/// Best ratio of the shorter string against any equal-length window of
/// the longer string — rewards strings where one is a substring-ish
/// fragment of the other.
pub fn partial_ratio(a: &str, b: &str) -> f32 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_chars: Vec<char> = shorter.chars().collect();
    let long_chars: Vec<char> = longer.chars().collect();
    if short_chars.is_empty() {
        return 100.0;
    }
    if long_chars.len() <= short_chars.len() {
        return ratio(shorter, longer);
    }
    let window = short_chars.len();
    let mut best = 0.0f32;
    for start in 0..=(long_chars.len() - window) {
        let slice: String = long_chars[start..start + window].iter().collect();
        let r = ratio(shorter, &slice);
        if r > best {
            best = r;
        }
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio of the two strings after sorting each one's whitespace tokens,
/// neutralizing word-order differences ("Johnson Johnson and" vs
/// "and Johnson Johnson").
pub fn token_sort_ratio(a: &str, b: &str) -> f32 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Token-set variant: compares the intersection and the two
/// symmetric-difference remainders, taking the best of three
/// combinations. Robust to one side having extra qualifier tokens.
pub fn token_set_ratio(a: &str, b: &str) -> f32 {
    use std::collections::BTreeSet;
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection: Vec<&str> = ta.intersection(&tb).copied().collect();
    let only_a: Vec<&str> = ta.difference(&tb).copied().collect();
    let only_b: Vec<&str> = tb.difference(&ta).copied().collect();

    let sorted_join = |v: &[&str]| {
        let mut v = v.to_vec();
        v.sort_unstable();
        v.join(" ")
    };

    let inter_str = sorted_join(&intersection);
    let combined_a = if inter_str.is_empty() {
        sorted_join(&only_a)
    } else if only_a.is_empty() {
        inter_str.clone()
    } else {
        format!("{inter_str} {}", sorted_join(&only_a))
    };
    let combined_b = if inter_str.is_empty() {
        sorted_join(&only_b)
    } else if only_b.is_empty() {
        inter_str.clone()
    } else {
        format!("{inter_str} {}", sorted_join(&only_b))
    };

    let r1 = ratio(&inter_str, &combined_a);
    let r2 = ratio(&inter_str, &combined_b);
    let r3 = ratio(&combined_a, &combined_b);
    r1.max(r2).max(r3)
}

/// Composite "weighted ratio": the plain ratio, raised by the
/// length-gated alternates when the two strings differ enough in
/// length for those alternates to be meaningful. Mirrors
/// `rapidfuzz.fuzz.WRatio`'s blending: partial-ratio results are
/// discounted (0.9/0.95) since they intentionally ignore unmatched
/// tail content.
pub fn weighted_ratio(a: &str, b: &str) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let len_a = a.chars().count() as f32;
    let len_b = b.chars().count() as f32;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let base = ratio(a, b);

    if len_ratio < 1.5 {
        let tsr = token_sort_ratio(a, b);
        let tser = token_set_ratio(a, b);
        return base.max(tsr).max(tser);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.95 };
    let partial = partial_ratio(a, b) * partial_scale;
    let partial_sort = token_sort_ratio(a, b) * partial_scale;
    let partial_set = token_set_ratio(a, b) * partial_scale;

    base.max(partial).max(partial_sort).max(partial_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(ratio("apple", "apple"), 100.0);
        assert_eq!(weighted_ratio("apple", "apple"), 100.0);
    }

    #[test]
    fn empty_strings_score_100() {
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn completely_different_strings_score_low() {
        assert!(ratio("apple", "zzzzz") < 30.0);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        assert_eq!(
            token_sort_ratio("johnson and johnson", "and johnson johnson"),
            100.0
        );
    }

    #[test]
    fn token_set_ignores_extra_qualifier_words() {
        let r = token_set_ratio("acme holdings group", "acme holdings");
        assert!(r > 85.0, "expected high token_set_ratio, got {r}");
    }

    #[test]
    fn weighted_ratio_is_symmetric_in_practice() {
        let a = weighted_ratio("general electric", "general electric co");
        let b = weighted_ratio("general electric co", "general electric");
        assert!((a - b).abs() < 1.0);
    }
}
