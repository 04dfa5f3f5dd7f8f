//! # Feature Extraction Tests
//!
//! End-to-end tests of the feature extractor on synthetic package images.


use medpack_vision::features::{basic_stats, FeatureConfig, FeatureExtractor, FeatureFamily};
use test_helpers::{noise_image, package_image, solid_image};

#[test]
fn test_package_image_yields_every_family() {
    let extractor = FeatureExtractor::new();
    let set = extractor.extract(&package_image(160, 120, [200, 30, 40]));

    for family in FeatureFamily::DESCRIPTOR_FAMILIES {
        let vector = set.get(family).unwrap_or_else(|| panic!("missing {}", family));
        assert_eq!(vector.values.len(), family.expected_len(), "{}", family);
        assert!((0.0..=1.0).contains(&vector.confidence), "{}", family);
        assert!(vector.values.iter().all(|v| v.is_finite()), "{}", family);
    }
    // No family failed, so no fallback
    assert!(!set.contains(FeatureFamily::BasicStats));
}

#[test]
fn test_extraction_is_deterministic() {
    let extractor = FeatureExtractor::new();
    let image = noise_image(64, 64, 7);
    assert_eq!(extractor.extract(&image), extractor.extract(&image));
}

#[test]
fn test_all_black_image() {
    let image = solid_image(64, 64, [0, 0, 0]);
    let set = FeatureExtractor::new().extract(&image);

    let edge = set.get(FeatureFamily::Edge).unwrap();
    assert!(edge.confidence < 0.01, "edge confidence {}", edge.confidence);

    let color = set.get(FeatureFamily::Color).unwrap();
    assert!(color.confidence < 0.01, "color confidence {}", color.confidence);

    let stats = basic_stats(&image);
    assert_eq!(stats.values, vec![0.0, 0.0, 1.0]);
    assert_eq!(stats.confidence, 0.5);
}

#[test]
fn test_tiny_image_falls_back_to_basic_stats() {
    let set = FeatureExtractor::new().extract(&solid_image(2, 2, [120, 80, 40]));

    assert_eq!(set.families(), vec![FeatureFamily::BasicStats]);
    let stats = set.get(FeatureFamily::BasicStats).unwrap();
    assert_eq!(stats.values.len(), 3);
    assert_eq!(stats.values[2], 1.0);
}

#[test]
fn test_empty_image_is_never_an_empty_set() {
    let set = FeatureExtractor::new().extract(&solid_image(0, 0, [0, 0, 0]));
    assert!(!set.is_empty());
    assert!(set.contains(FeatureFamily::BasicStats));
}

#[test]
fn test_noise_has_richer_texture_than_flat_color() {
    let extractor = FeatureExtractor::new();
    let flat = extractor.extract(&solid_image(64, 64, [90, 90, 90]));
    let noisy = extractor.extract(&noise_image(64, 64, 11));

    let flat_texture = flat.get(FeatureFamily::Texture).unwrap().confidence;
    let noisy_texture = noisy.get(FeatureFamily::Texture).unwrap().confidence;
    assert!(noisy_texture > flat_texture);

    let noisy_color = noisy.get(FeatureFamily::Color).unwrap().confidence;
    let flat_color = flat.get(FeatureFamily::Color).unwrap().confidence;
    assert!(noisy_color > flat_color);
}

#[test]
fn test_larger_min_dimension_drops_families() {
    let config = FeatureConfig {
        min_dimension: 100,
        ..Default::default()
    };
    let extractor = FeatureExtractor::with_config(config).unwrap();
    let set = extractor.extract(&package_image(80, 80, [30, 120, 200]));

    assert_eq!(set.families(), vec![FeatureFamily::BasicStats]);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = FeatureConfig {
        texture_sample_stride: 0,
        ..Default::default()
    };
    assert!(FeatureExtractor::with_config(config).is_err());
}
