//! # Recovery Tests
//!
//! End-to-end name recovery with doubles for the OCR provider.


use medpack_vision::fuzzy::{Dictionary, FuzzyTextMatcher, RecommendedAction};
use medpack_vision::index::{ItemMetadata, VisualMatchIndex};
use medpack_vision::ocr_errors::OcrError;
use medpack_vision::recovery::{
    RecoveryConfig, RecoveryContext, RecoveryMethod, RecoveryMode, RecoveryOrchestrator,
    RecoveryStrategy, UNRECOGNIZED_TEXT,
};
use test_helpers::{augmentin_dictionary, calls, package_image, solid_image, MockOcrProvider};

fn orchestrator(dictionary: Dictionary) -> RecoveryOrchestrator {
    RecoveryOrchestrator::new(dictionary, FuzzyTextMatcher::new(), RecoveryConfig::default())
        .unwrap()
}

fn strategies_of(method: &RecoveryMethod) -> &[RecoveryStrategy] {
    match method {
        RecoveryMethod::Recovered(strategies) => strategies,
        other => panic!("expected a recovered result, got {}", other),
    }
}

#[test]
fn test_confident_ocr_skips_remaining_strategies() {
    let ocr = MockOcrProvider::returning("Augmentin", 1.0);
    let counter = ocr.call_counter();
    let mut recovery = orchestrator(augmentin_dictionary()).with_ocr_provider(Box::new(ocr));

    let photo = solid_image(32, 32, [200, 200, 200]);
    let result = recovery.recover(Some(&photo), "aug", &RecoveryContext::new(), RecoveryMode::Balanced);

    assert_eq!(result.recovered_text, "Augmentin");
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.strategies_run, vec![RecoveryStrategy::EnhancedOcr]);
    assert!(result.early_exit);
    assert_eq!(strategies_of(&result.method), &[RecoveryStrategy::EnhancedOcr]);
    assert!(result
        .alternatives
        .iter()
        .any(|alt| alt.label == "Amoxicillin 500mg"));
    assert_eq!(calls(&counter), 1);
}

#[test]
fn test_fast_mode_exact_text_never_calls_ocr() {
    let ocr = MockOcrProvider::returning("Amoxicillin 500mg", 1.0);
    let counter = ocr.call_counter();
    let mut recovery = orchestrator(augmentin_dictionary()).with_ocr_provider(Box::new(ocr));

    let photo = solid_image(32, 32, [200, 200, 200]);
    let result = recovery.recover(Some(&photo), "augmentin", &RecoveryContext::new(), RecoveryMode::Fast);

    assert_eq!(result.recovered_text, "Augmentin");
    assert_eq!(result.strategies_run, vec![RecoveryStrategy::PatternCompletion]);
    assert!(result.early_exit);
    assert_eq!(calls(&counter), 0);
}

#[test]
fn test_ocr_failure_falls_through_to_later_strategies() {
    let ocr = MockOcrProvider::failing(OcrError::Extraction("engine crashed".to_string()));
    let counter = ocr.call_counter();
    let mut recovery = orchestrator(augmentin_dictionary()).with_ocr_provider(Box::new(ocr));

    let photo = solid_image(32, 32, [200, 200, 200]);
    let result = recovery.recover(Some(&photo), "augmentn", &RecoveryContext::new(), RecoveryMode::Balanced);

    assert_eq!(result.recovered_text, "Augmentin");
    assert!(result.confidence <= 0.9);
    assert_eq!(result.strategies_run.len(), 4);
    assert!(!result.early_exit);
    assert!(strategies_of(&result.method).contains(&RecoveryStrategy::PatternCompletion));
    assert_eq!(calls(&counter), 1);
    assert_eq!(recovery.circuit_breaker().failure_count(), 1);
}

#[test]
fn test_repeated_ocr_failures_open_the_breaker() {
    let config = RecoveryConfig {
        ocr_breaker_threshold: 2,
        ..Default::default()
    };
    let ocr = MockOcrProvider::failing(OcrError::Timeout("no answer".to_string()));
    let counter = ocr.call_counter();
    let mut recovery =
        RecoveryOrchestrator::new(augmentin_dictionary(), FuzzyTextMatcher::new(), config)
            .unwrap()
            .with_ocr_provider(Box::new(ocr));

    let photo = solid_image(32, 32, [200, 200, 200]);
    for _ in 0..4 {
        let result = recovery.recover(Some(&photo), "qqqq", &RecoveryContext::new(), RecoveryMode::Balanced);
        assert_eq!(result.method, RecoveryMethod::Failed);
    }

    assert_eq!(calls(&counter), 2);
    assert!(recovery.circuit_breaker().is_open());
}

#[test]
fn test_visual_only_finds_catalogued_package() {
    let index = VisualMatchIndex::in_memory();
    index
        .add_image(&solid_image(160, 120, [128, 128, 128]), ItemMetadata::named("Blank"), false)
        .unwrap();
    index
        .add_image(&package_image(160, 120, [200, 30, 40]), ItemMetadata::named("Augmentin"), false)
        .unwrap();

    let config = RecoveryConfig {
        visual_min_score: 0.0,
        ..Default::default()
    };
    let mut recovery =
        RecoveryOrchestrator::new(augmentin_dictionary(), FuzzyTextMatcher::new(), config)
            .unwrap()
            .with_index(index);

    let photo = package_image(160, 120, [200, 30, 40]);
    let result = recovery.recover(Some(&photo), "", &RecoveryContext::new(), RecoveryMode::VisualOnly);

    assert_eq!(result.recovered_text, "Augmentin");
    assert_eq!(strategies_of(&result.method), &[RecoveryStrategy::VisualSimilarity]);
}

#[test]
fn test_visual_only_without_photo_reports_no_visual_match() {
    let mut recovery = orchestrator(augmentin_dictionary()).with_index(VisualMatchIndex::in_memory());
    let result = recovery.recover(None, "", &RecoveryContext::new(), RecoveryMode::VisualOnly);

    assert_eq!(result.method, RecoveryMethod::NoVisualMatch);
    assert_eq!(result.recovered_text, UNRECOGNIZED_TEXT);
}

#[test]
fn test_comprehensive_mode_restores_confused_characters() {
    let dictionary = Dictionary::new(
        ["Lisinopril", "Amoxicillin 500mg"],
        Vec::<(String, String)>::new(),
        Vec::<(String, Vec<String>)>::new(),
    );
    let mut recovery = orchestrator(dictionary);

    let result = recovery.recover(None, "L1sin0pril", &RecoveryContext::new(), RecoveryMode::Comprehensive);

    assert_eq!(result.recovered_text, "Lisinopril");
    assert!((result.confidence - 0.95).abs() < 1e-6);
    assert_eq!(result.strategies_run.len(), 5);
    assert!(strategies_of(&result.method).contains(&RecoveryStrategy::MlCharacterRestoration));
}

#[test]
fn test_context_and_recent_results_recover_unknown_names() {
    let mut recovery = orchestrator(augmentin_dictionary());
    let context = RecoveryContext::new().with_expected_names(["Zyrtec 10mg"]);

    let first = recovery.recover(None, "zyrtek 10mg", &context, RecoveryMode::Balanced);
    assert_eq!(first.recovered_text, "Zyrtec 10mg");
    assert_eq!(strategies_of(&first.method), &[RecoveryStrategy::ContextAware]);
    assert_eq!(recovery.recent_results().len(), 1);

    // No hints this time; the earlier result is remembered
    let second = recovery.recover(None, "zyrtek 10mg", &RecoveryContext::new(), RecoveryMode::Balanced);
    assert_eq!(second.recovered_text, "Zyrtec 10mg");
    assert_eq!(second.alternatives.len(), 0);

    recovery.clear_recent_results();
    let third = recovery.recover(None, "zyrtek 10mg", &RecoveryContext::new(), RecoveryMode::Balanced);
    assert_eq!(third.method, RecoveryMethod::Failed);
    assert_eq!(third.recovered_text, "zyrtek 10mg");
}

#[test]
fn test_failed_recovery_recommends_rescan() {
    let mut recovery = orchestrator(augmentin_dictionary());
    let result = recovery.recover(None, "   ", &RecoveryContext::new(), RecoveryMode::Balanced);

    assert!(!result.is_success());
    assert_eq!(result.recovered_text, UNRECOGNIZED_TEXT);
    assert_eq!(result.confidence, 0.1);
    assert_eq!(result.recommended_action(), RecommendedAction::Rescan);
    assert!(recovery.recent_results().is_empty());
}

#[test]
fn test_every_mode_returns_bounded_non_empty_results() {
    let modes = [
        RecoveryMode::Fast,
        RecoveryMode::Balanced,
        RecoveryMode::Comprehensive,
        RecoveryMode::VisualOnly,
    ];
    let inputs = ["", "aug", "amox?cillin", "qqqq", "augmentin", "5OOmg"];
    let photo = package_image(64, 64, [30, 120, 200]);

    for mode in modes {
        let ocr = MockOcrProvider::returning("Augrnentin", 0.6);
        let mut recovery = orchestrator(Dictionary::with_defaults()).with_ocr_provider(Box::new(ocr));
        for partial in inputs {
            let result = recovery.recover(Some(&photo), partial, &RecoveryContext::new(), mode);
            assert!(
                (0.0..=1.0).contains(&result.confidence),
                "{} / {:?}: {}",
                mode,
                partial,
                result.confidence
            );
            assert!(!result.recovered_text.is_empty());
            assert!(result.alternatives.len() <= 4);
            assert!(!result.strategies_run.is_empty());
        }
    }
}

#[test]
fn test_punctuated_text_still_reaches_the_fuzzy_matcher() {
    let mut recovery = orchestrator(augmentin_dictionary());

    let result = recovery.recover(None, "Augmentin.", &RecoveryContext::new(), RecoveryMode::Fast);
    assert_eq!(result.recovered_text, "Augmentin");
    assert!(result.is_success());

    let result = recovery.recover(None, "Amoxicillin 0.5g", &RecoveryContext::new(), RecoveryMode::Fast);
    assert_eq!(result.recovered_text, "Amoxicillin 500mg");
    assert!(strategies_of(&result.method).contains(&RecoveryStrategy::PatternCompletion));
}
