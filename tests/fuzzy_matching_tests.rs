//! # Fuzzy Matching Tests
//!
//! Dictionary matching of damaged medication names.


use medpack_vision::fuzzy::{
    edit_similarity, jaccard_similarity, Dictionary, FuzzyTextMatcher, MatcherConfig,
    RecommendedAction,
};
use test_helpers::{augmentin_dictionary, matcher_with_threshold};

#[test]
fn test_typo_of_brand_surfaces_brand_and_generic() {
    let matcher = matcher_with_threshold(75);
    let matches = matcher.find_matches("augmentn", &augmentin_dictionary(), 0.0);

    assert_eq!(matches[0].label, "Augmentin");
    assert!(matches[0].confidence >= 0.85);

    let generic = matches
        .iter()
        .find(|m| m.label == "Amoxicillin 500mg")
        .expect("generic should be reachable through the brand alias");
    assert_eq!(generic.confidence, 0.85);
    assert_eq!(generic.algorithm, "brand_alias");
    assert_eq!(generic.matched_field, "generic");
}

#[test]
fn test_exact_match_ignores_thresholds() {
    let matcher = matcher_with_threshold(100);
    let matches = matcher.find_matches("  Augmentin ", &augmentin_dictionary(), 0.0);

    assert_eq!(matches[0].label, "Augmentin");
    assert_eq!(matches[0].confidence, 1.0);
    assert_eq!(
        RecommendedAction::for_confidence(matches[0].confidence),
        RecommendedAction::AutoAccept
    );
}

#[test]
fn test_results_are_sorted_and_capped() {
    let config = MatcherConfig {
        category_thresholds: Default::default(),
        default_threshold: 0,
        max_alternatives: 2,
    };
    let matcher = FuzzyTextMatcher::with_config(config).unwrap();
    let dictionary = Dictionary::with_defaults();

    let matches = matcher.find_matches("ibuprofen 200mg", &dictionary, 0.0);
    assert!(matches.len() <= 3);
    assert!(matches
        .windows(2)
        .all(|pair| pair[0].confidence >= pair[1].confidence));
    assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.confidence)));
}

#[test]
fn test_unrelated_query_finds_nothing() {
    let matcher = FuzzyTextMatcher::new();
    assert!(matcher
        .find_matches("qqqq", &augmentin_dictionary(), 0.0)
        .is_empty());
    assert!(matcher
        .find_matches("augmentin", &Dictionary::default(), 0.0)
        .is_empty());
}

#[test]
fn test_similarity_measures_are_symmetric() {
    let pairs = [
        ("augmentin", "augmentn"),
        ("lisinopril", "l1sin0pril"),
        ("", "paracetamol"),
    ];
    for (a, b) in pairs {
        assert_eq!(edit_similarity(a, b), edit_similarity(b, a));
        assert_eq!(jaccard_similarity(a, b), jaccard_similarity(b, a));
    }
    assert_eq!(edit_similarity("", ""), 1.0);
}

#[test]
fn test_dictionary_from_json() {
    let json = r#"{
        "names": ["Lipitor 20mg", "Atorvastatin 20mg"],
        "brand_aliases": { "Lipitor": "atorvastatin" },
        "category_keywords": { "cholesterol": ["atorvastatin", "lipitor"] }
    }"#;
    let dictionary = Dictionary::from_json_str(json).unwrap();
    assert_eq!(dictionary.len(), 2);
    assert_eq!(dictionary.category_of("Atorvastatin 20mg"), "cholesterol");

    let matches = FuzzyTextMatcher::new().find_matches("lipitor", &dictionary, 0.0);
    let labels: Vec<&str> = matches.iter().map(|m| m.label.as_str()).collect();
    assert!(labels.contains(&"Lipitor 20mg"));
    assert!(labels.contains(&"Atorvastatin 20mg"));
}

#[test]
fn test_malformed_dictionary_json_is_rejected() {
    assert!(Dictionary::from_json_str("{ not json").is_err());
}
