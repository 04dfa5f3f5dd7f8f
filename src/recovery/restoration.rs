//! # Character Restoration
//!
//! Undoes common OCR character confusions (digits read for letters, `rn`
//! read for `m`...) and fuzzy matches the restored variants.

use std::collections::HashSet;

use crate::fuzzy::algorithms::normalize;
use crate::fuzzy::{Dictionary, FuzzyTextMatcher, MatchAlgorithm, MatchCandidate};

/// Discount applied to matches of restored text
pub const RESTORATION_FACTOR: f32 = 0.95;

/// Upper bound on generated variants per query
pub const MAX_VARIANTS: usize = 32;

/// OCR reading and the text it most likely stood for. Multi-character
/// confusions come first so they are not split by single-character rules.
pub const CONFUSIONS: &[(&str, &str)] = &[
    ("rn", "m"),
    ("vv", "w"),
    ("cl", "d"),
    ("0", "o"),
    ("1", "l"),
    ("1", "i"),
    ("5", "s"),
    ("8", "b"),
    ("|", "l"),
    ("$", "s"),
    ("@", "a"),
];

/// Restored spellings of `text`, excluding `text` itself
///
/// Every confusion is applied to all occurrences at once, on top of every
/// variant produced so far, in [`CONFUSIONS`] order.
pub fn restoration_variants(text: &str, max_variants: usize) -> Vec<String> {
    let original = normalize(text);
    let mut variants = vec![original.clone()];
    let mut seen: HashSet<String> = HashSet::from([original]);

    'rules: for (from, to) in CONFUSIONS {
        let current = variants.len();
        for index in 0..current {
            if !variants[index].contains(from) {
                continue;
            }
            let restored = variants[index].replace(from, to);
            if seen.insert(restored.clone()) {
                variants.push(restored);
                if variants.len() > max_variants {
                    break 'rules;
                }
            }
        }
    }

    variants.remove(0);
    variants.truncate(max_variants);
    variants
}

/// Fuzzy matches of every restored variant, discounted by
/// [`RESTORATION_FACTOR`]
pub fn restoration_candidates(
    text: &str,
    dictionary: &Dictionary,
    matcher: &FuzzyTextMatcher,
) -> Vec<MatchCandidate> {
    restoration_variants(text, MAX_VARIANTS)
        .iter()
        .flat_map(|variant| matcher.find_matches(variant, dictionary, 0.0))
        .map(|candidate| {
            MatchCandidate::new(
                candidate.label,
                candidate.confidence * RESTORATION_FACTOR,
                MatchAlgorithm::CharRestoration,
                candidate.matched_field,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_confusions() {
        assert_eq!(restoration_variants("Zyrtec", MAX_VARIANTS), Vec::<String>::new());
        assert_eq!(restoration_variants("Metforrnin", MAX_VARIANTS), vec!["metformin"]);
        assert_eq!(restoration_variants("c|aritin", MAX_VARIANTS), vec!["claritin"]);
    }

    #[test]
    fn test_combined_confusions() {
        let variants = restoration_variants("1ipit0r", MAX_VARIANTS);
        assert!(variants.contains(&"lipitor".to_string()));
        assert!(variants.contains(&"iipitor".to_string()));
        assert!(!variants.contains(&"1ipit0r".to_string()));
    }

    #[test]
    fn test_variant_limit() {
        let variants = restoration_variants("0 1 5 8 | $ @ rn vv cl", 4);
        assert_eq!(variants.len(), 4);
    }

    #[test]
    fn test_candidates_are_discounted() {
        let dictionary = Dictionary::new(
            ["Lipitor"],
            Vec::<(String, String)>::new(),
            Vec::<(String, Vec<String>)>::new(),
        );
        let candidates = restoration_candidates("1ipit0r", &dictionary, &FuzzyTextMatcher::new());

        let best = candidates
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .unwrap();
        assert_eq!(best.label, "Lipitor");
        assert_eq!(best.algorithm, "char_restoration");
        assert!((best.confidence - RESTORATION_FACTOR).abs() < 1e-6);
    }
}
