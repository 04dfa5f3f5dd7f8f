//! # Visual Index Tests
//!
//! Reference catalogue operations on synthetic package photos.


use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use medpack_vision::features::{FeatureExtractor, FeatureFamily, FeatureSet, FeatureVector};
use medpack_vision::index::{
    content_hash, load_snapshot, save_snapshot, IndexConfig, InMemoryReferenceStore, ItemId,
    ItemMetadata, NewReferenceItem, ReferenceItem, ReferenceStore, VisualMatchIndex,
};
use medpack_vision::AppResult;
use tempfile::TempDir;
use test_helpers::{package_image, solid_image};

#[test]
fn test_identical_photo_ranks_first() {
    let index = VisualMatchIndex::in_memory();
    index
        .add_image(&solid_image(160, 120, [128, 128, 128]), ItemMetadata::named("Blank"), false)
        .unwrap();
    index
        .add_image(
            &package_image(160, 120, [200, 30, 40]),
            ItemMetadata::named("Augmentin").with_brand("GSK"),
            false,
        )
        .unwrap();

    let results = index
        .find_similar_to_image(&package_image(160, 120, [200, 30, 40]), 0.0, 5)
        .unwrap();

    assert_eq!(results[0].0.name, "Augmentin");
    assert_eq!(results[0].0.brand.as_deref(), Some("GSK"));
    assert!(results
        .windows(2)
        .all(|pair| pair[0].1 >= pair[1].1));
    assert!(results.iter().all(|(_, score)| (0.0..=1.0).contains(score)));
}

#[test]
fn test_duplicate_photo_is_stored_once() {
    let index = VisualMatchIndex::in_memory();
    let photo = package_image(96, 96, [30, 120, 200]);

    let first = index.add_image(&photo, ItemMetadata::named("Zyrtec"), false).unwrap();
    let second = index.add_image(&photo, ItemMetadata::named("Zyrtec 10mg"), false).unwrap();

    assert_eq!(first, second);
    assert_eq!(index.len().unwrap(), 1);
    assert_eq!(index.find_exact(&content_hash(&photo)).unwrap().unwrap().name, "Zyrtec");
}

#[test]
fn test_snapshot_round_trip_preserves_search() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("index.json");

    let index = VisualMatchIndex::in_memory();
    index
        .add_image(&package_image(96, 96, [200, 30, 40]), ItemMetadata::named("Augmentin"), false)
        .unwrap();
    index
        .add_image(&solid_image(96, 96, [10, 10, 10]), ItemMetadata::named("Blank"), false)
        .unwrap();
    assert_eq!(save_snapshot(index.store(), &path).unwrap(), 2);

    let store: Arc<dyn ReferenceStore> = Arc::new(load_snapshot(&path).unwrap());
    let restored =
        VisualMatchIndex::new(store, FeatureExtractor::new(), IndexConfig::default()).unwrap();

    let query = package_image(96, 96, [200, 30, 40]);
    let before = index.find_similar_to_image(&query, 0.0, 5).unwrap();
    let after = restored.find_similar_to_image(&query, 0.0, 5).unwrap();

    let names = |results: &[(medpack_vision::ReferenceItem, f32)]| {
        results.iter().map(|(item, _)| item.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&before), names(&after));
    for ((_, a), (_, b)) in before.iter().zip(&after) {
        assert!((a - b).abs() < 1e-6);
    }

    // New ids continue after the restored ones
    let id = restored
        .add_image(&package_image(96, 96, [30, 120, 200]), ItemMetadata::named("Zyrtec"), false)
        .unwrap();
    assert_eq!(id, 3);
}

#[test]
fn test_import_directory() {
    let dir = TempDir::new().unwrap();
    package_image(64, 64, [200, 30, 40])
        .save(dir.path().join("amoxicillin_500mg.png"))
        .unwrap();
    package_image(64, 64, [30, 120, 200])
        .save(dir.path().join("zyrtec.png"))
        .unwrap();
    // Same pixels as the first file
    package_image(64, 64, [200, 30, 40])
        .save(dir.path().join("zz_copy.png"))
        .unwrap();
    std::fs::write(dir.path().join("broken.png"), b"not an image").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let index = VisualMatchIndex::in_memory();
    let report = index.import_directory(dir.path()).unwrap();

    assert_eq!(report.imported.len(), 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("broken.png"));

    assert_eq!(index.find_by_name("Amoxicillin 500mg").unwrap().len(), 1);
    assert_eq!(index.find_by_name("zyrtec").unwrap().len(), 1);
}

#[test]
fn test_import_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let index = VisualMatchIndex::in_memory();
    assert!(index.import_directory(&dir.path().join("missing")).is_err());
}

#[test]
fn test_shared_store_sees_index_writes() {
    let store: Arc<dyn ReferenceStore> = Arc::new(InMemoryReferenceStore::new());
    let index = VisualMatchIndex::new(
        Arc::clone(&store),
        FeatureExtractor::new(),
        IndexConfig::default(),
    )
    .unwrap();

    index
        .add_image(&package_image(64, 64, [200, 30, 40]), ItemMetadata::named("Advil"), false)
        .unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.get_by_name("ADVIL").unwrap().len(), 1);
}

/// Store whose hash lookups are slow, like a remote backend
struct SlowLookupStore {
    inner: InMemoryReferenceStore,
}

impl ReferenceStore for SlowLookupStore {
    fn insert(&self, item: NewReferenceItem) -> AppResult<ReferenceItem> {
        self.inner.insert(item)
    }

    fn get(&self, id: ItemId) -> AppResult<Option<ReferenceItem>> {
        self.inner.get(id)
    }

    fn get_by_hash(&self, content_hash: &str) -> AppResult<Option<ReferenceItem>> {
        thread::sleep(Duration::from_millis(5));
        self.inner.get_by_hash(content_hash)
    }

    fn get_all(&self) -> AppResult<Vec<ReferenceItem>> {
        self.inner.get_all()
    }

    fn get_by_name(&self, name: &str) -> AppResult<Vec<ReferenceItem>> {
        self.inner.get_by_name(name)
    }

    fn remove(&self, id: ItemId) -> AppResult<Option<ReferenceItem>> {
        self.inner.remove(id)
    }

    fn len(&self) -> AppResult<usize> {
        self.inner.len()
    }
}

#[test]
fn test_concurrent_adds_store_a_hash_once() {
    let store: Arc<dyn ReferenceStore> = Arc::new(SlowLookupStore {
        inner: InMemoryReferenceStore::new(),
    });
    let index = Arc::new(
        VisualMatchIndex::new(Arc::clone(&store), FeatureExtractor::new(), IndexConfig::default())
            .unwrap(),
    );

    let writers = 4;
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|n| {
            let index = Arc::clone(&index);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let features: FeatureSet = vec![FeatureVector::new(
                    FeatureFamily::BasicStats,
                    vec![0.5, 0.2, 1.0],
                    0.5,
                    "basic_stats",
                )]
                .into_iter()
                .collect();
                let item = NewReferenceItem::new(
                    ItemMetadata::named(format!("Advil {}", n)),
                    "same-pixels",
                    features,
                );
                barrier.wait();
                index.add(item, false).unwrap()
            })
        })
        .collect();

    let ids: Vec<ItemId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(store.len().unwrap(), 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
}
