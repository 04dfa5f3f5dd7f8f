//! # Visual Match Index
//!
//! Stores reference feature sets and answers "top-K most similar" queries by
//! scoring every stored item against the query.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::item::{content_hash, ItemId, ItemMetadata, NewReferenceItem, ReferenceItem};
use super::store::{InMemoryReferenceStore, ReferenceStore};
use crate::errors::{error_logging, AppError, AppResult};
use crate::features::{FeatureExtractor, FeatureSet};
use crate::observability::metrics::{
    record_index_mutation, record_index_query_metrics, record_index_size,
};
use crate::similarity::SimilarityScorer;

/// Configuration for index ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Whether batch imports keep images whose content hash is already stored
    pub allow_duplicates: bool,
    /// Lowercase file extensions picked up by directory imports
    pub import_extensions: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            allow_duplicates: false,
            import_extensions: ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.import_extensions.is_empty() {
            return Err(AppError::Config(
                "At least one import extension must be configured".to_string(),
            ));
        }
        if self
            .import_extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(AppError::Config(
                "Import extensions must be non-empty and given without a leading dot".to_string(),
            ));
        }
        Ok(())
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.import_extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}

/// Outcome of a directory import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Ids of newly stored items, in file name order
    pub imported: Vec<ItemId>,
    /// Files whose content was already stored
    pub duplicates: usize,
    /// Files that could not be read or decoded, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// A stored item ranked against a query
pub type ScoredItem = (ReferenceItem, f32);

/// Nearest-neighbour search over reference feature sets
///
/// Mutations go through one writer lock held across the duplicate check and
/// the insert, so a content hash is stored once even under concurrent adds.
pub struct VisualMatchIndex {
    store: Arc<dyn ReferenceStore>,
    extractor: FeatureExtractor,
    scorer: SimilarityScorer,
    config: IndexConfig,
    writer: Mutex<()>,
}

impl VisualMatchIndex {
    /// Create an index over `store`
    pub fn new(
        store: Arc<dyn ReferenceStore>,
        extractor: FeatureExtractor,
        config: IndexConfig,
    ) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            extractor,
            scorer: SimilarityScorer::new(),
            config,
            writer: Mutex::new(()),
        })
    }

    /// Index backed by a fresh in-memory store and default settings
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryReferenceStore::new()),
            extractor: FeatureExtractor::new(),
            scorer: SimilarityScorer::new(),
            config: IndexConfig::default(),
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &dyn ReferenceStore {
        self.store.as_ref()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn len(&self) -> AppResult<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        self.store.is_empty()
    }

    /// Add a reference item
    ///
    /// # Arguments
    ///
    /// * `item` - The item to store
    /// * `allow_duplicates` - Store the item even if its content hash exists
    ///
    /// # Returns
    ///
    /// Returns the new item's id, or the id of the first stored item with
    /// the same content hash when duplicates are not allowed
    pub fn add(&self, item: NewReferenceItem, allow_duplicates: bool) -> AppResult<ItemId> {
        self.add_tracked(item, allow_duplicates).map(|(id, _)| id)
    }

    /// Hash an image, extract its features and add it in one call
    pub fn add_image(
        &self,
        image: &DynamicImage,
        metadata: ItemMetadata,
        allow_duplicates: bool,
    ) -> AppResult<ItemId> {
        self.add_image_tracked(image, metadata, allow_duplicates)
            .map(|(id, _)| id)
    }

    /// Returns the id and whether a new record was created
    fn add_tracked(&self, item: NewReferenceItem, allow_duplicates: bool) -> AppResult<(ItemId, bool)> {
        let _writer = self.writer.lock();

        if !allow_duplicates {
            if let Some(existing) = self.store.get_by_hash(&item.content_hash)? {
                trace!(
                    target: "visual_index",
                    existing_id = existing.id,
                    name = %item.metadata.name,
                    "Duplicate content hash, returning existing item"
                );
                record_index_mutation("duplicate");
                return Ok((existing.id, false));
            }
        }

        let name = item.metadata.name.clone();
        let stored = self.store.insert(item).inspect_err(|e| {
            error_logging::log_storage_error(e, "insert", None, Some(&name));
        })?;

        record_index_mutation("inserted");
        record_index_size(self.store.len()?);
        debug!(target: "visual_index", id = stored.id, name = %stored.name, "Added reference item");
        Ok((stored.id, true))
    }

    fn add_image_tracked(
        &self,
        image: &DynamicImage,
        metadata: ItemMetadata,
        allow_duplicates: bool,
    ) -> AppResult<(ItemId, bool)> {
        let hash = content_hash(image);

        // Skip extraction when the result would be discarded; add_tracked
        // repeats the check under the writer lock
        if !allow_duplicates {
            if let Some(existing) = self.store.get_by_hash(&hash)? {
                record_index_mutation("duplicate");
                return Ok((existing.id, false));
            }
        }

        let features = self.extractor.extract(image);
        self.add_tracked(NewReferenceItem::new(metadata, hash, features), allow_duplicates)
    }

    /// Import every supported image in `dir` (non-recursive)
    ///
    /// Files are processed in name order. The item name is the file stem
    /// with `_` replaced by spaces. Unreadable images are reported in the
    /// returned [`ImportReport`] instead of aborting the import.
    pub fn import_directory(&self, dir: &Path) -> AppResult<ImportReport> {
        let entries = fs::read_dir(dir).inspect_err(|e| {
            error_logging::log_filesystem_error(e, "read_import_dir", dir.to_str())
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && self.config.accepts(path))
            .collect();
        paths.sort();

        let mut report = ImportReport::default();
        for path in paths {
            let image = match image::open(&path) {
                Ok(image) => image,
                Err(e) => {
                    warn!(target: "visual_index", path = %path.display(), error = %e, "Skipping unreadable image");
                    report.failed.push((path, e.to_string()));
                    continue;
                }
            };

            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| stem.replace('_', " ").trim().to_string())
                .unwrap_or_default();
            if name.is_empty() {
                report.failed.push((path, "file name is not valid UTF-8".to_string()));
                continue;
            }

            match self.add_image_tracked(&image, ItemMetadata::named(name), self.config.allow_duplicates) {
                Ok((id, true)) => report.imported.push(id),
                Ok((_, false)) => report.duplicates += 1,
                Err(e) => report.failed.push((path, e.to_string())),
            }
        }

        debug!(
            target: "visual_index",
            dir = %dir.display(),
            imported = report.imported.len(),
            duplicates = report.duplicates,
            failed = report.failed.len(),
            "Directory import completed"
        );
        Ok(report)
    }

    /// Rank stored items by similarity to `query`
    ///
    /// Every stored item is scored; items scoring at least `min_score` are
    /// sorted by descending score, ties keeping insertion order, and the
    /// first `max_results` are returned.
    pub fn find_similar(
        &self,
        query: &FeatureSet,
        min_score: f32,
        max_results: usize,
    ) -> AppResult<Vec<ScoredItem>> {
        if !min_score.is_finite() {
            return Err(AppError::Validation(
                "Minimum similarity score must be a finite number".to_string(),
            ));
        }

        let start = Instant::now();
        let items = self.store.get_all()?;
        let scanned = items.len();

        // Parallel scan; collect keeps the insertion order for the stable sort
        let scores: Vec<f32> = items
            .par_iter()
            .map(|item| self.scorer.score(query, &item.features))
            .collect();

        let mut ranked: Vec<ScoredItem> = items
            .into_iter()
            .zip(scores)
            .filter(|(_, score)| *score >= min_score)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(max_results);

        let duration = start.elapsed();
        record_index_query_metrics(duration, scanned, ranked.len());
        debug!(
            target: "visual_index",
            scanned,
            returned = ranked.len(),
            min_score,
            duration_ms = duration.as_millis(),
            "Similarity query completed"
        );
        Ok(ranked)
    }

    /// Extract features from `image` and run [`find_similar`](Self::find_similar)
    pub fn find_similar_to_image(
        &self,
        image: &DynamicImage,
        min_score: f32,
        max_results: usize,
    ) -> AppResult<Vec<ScoredItem>> {
        let query = self.extractor.extract(image);
        self.find_similar(&query, min_score, max_results)
    }

    /// Items with the given name, ignoring case
    pub fn find_by_name(&self, name: &str) -> AppResult<Vec<ReferenceItem>> {
        self.store.get_by_name(name)
    }

    /// The stored item whose pixels hash to `content_hash`
    pub fn find_exact(&self, content_hash: &str) -> AppResult<Option<ReferenceItem>> {
        self.store.get_by_hash(content_hash)
    }

    pub fn remove(&self, id: ItemId) -> AppResult<Option<ReferenceItem>> {
        let _writer = self.writer.lock();
        self.remove_locked(id)
    }

    fn remove_locked(&self, id: ItemId) -> AppResult<Option<ReferenceItem>> {
        let removed = self.store.remove(id).inspect_err(|e| {
            error_logging::log_storage_error(e, "remove", Some(id), None);
        })?;
        if removed.is_some() {
            record_index_mutation("removed");
            record_index_size(self.store.len()?);
        }
        Ok(removed)
    }

    /// Drop every item whose content hash was already seen earlier
    ///
    /// # Returns
    ///
    /// Returns the number of removed items
    pub fn consolidate(&self) -> AppResult<usize> {
        let _writer = self.writer.lock();
        let mut seen = HashSet::new();
        let mut removed = 0usize;

        for item in self.store.get_all()? {
            if !seen.insert(item.content_hash.clone()) && self.remove_locked(item.id)?.is_some() {
                removed += 1;
            }
        }

        debug!(target: "visual_index", removed, "Consolidated reference items");
        Ok(removed)
    }
}

impl std::fmt::Debug for VisualMatchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualMatchIndex")
            .field("items", &self.store.len().ok())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureFamily, FeatureVector};
    use image::{Rgb, RgbImage};

    fn stats_item(name: &str, hash: &str, values: [f32; 3]) -> NewReferenceItem {
        let features: FeatureSet = vec![FeatureVector::new(
            FeatureFamily::BasicStats,
            values.to_vec(),
            1.0,
            "basic_stats",
        )]
        .into_iter()
        .collect();
        NewReferenceItem::new(ItemMetadata::named(name), hash, features)
    }

    #[test]
    fn test_duplicate_hash_returns_existing_id() {
        let index = VisualMatchIndex::in_memory();
        let first = index.add(stats_item("Advil", "same", [0.5, 0.1, 1.0]), false).unwrap();
        let second = index.add(stats_item("Advil copy", "same", [0.5, 0.1, 1.0]), false).unwrap();

        assert_eq!(first, second);
        assert_eq!(index.len().unwrap(), 1);

        let third = index.add(stats_item("Advil copy", "same", [0.5, 0.1, 1.0]), true).unwrap();
        assert_ne!(first, third);
        assert_eq!(index.len().unwrap(), 2);
    }

    #[test]
    fn test_find_similar_bounds_and_ties() {
        let index = VisualMatchIndex::in_memory();
        // Cosine similarity: identical direction ties at 1.0
        index.add(stats_item("First", "a", [1.0, 0.0, 0.0]), false).unwrap();
        index.add(stats_item("Orthogonal", "b", [0.0, 1.0, 0.0]), false).unwrap();
        index.add(stats_item("Second", "c", [2.0, 0.0, 0.0]), false).unwrap();

        let query: FeatureSet = vec![FeatureVector::new(
            FeatureFamily::BasicStats,
            vec![1.0, 0.0, 0.0],
            1.0,
            "basic_stats",
        )]
        .into_iter()
        .collect();

        let results = index.find_similar(&query, 0.5, 10).unwrap();
        let names: Vec<_> = results.iter().map(|(item, _)| item.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert!(results.iter().all(|(_, score)| *score >= 0.5 && *score <= 1.0));

        assert_eq!(index.find_similar(&query, 0.0, 1).unwrap().len(), 1);
        assert!(index.find_similar(&query, 0.5, 0).unwrap().is_empty());
        assert!(index.find_similar(&query, f32::NAN, 3).is_err());
    }

    #[test]
    fn test_add_image_skips_duplicate_pixels() {
        let index = VisualMatchIndex::in_memory();
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(32, 32, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, 90])
        }));

        let first = index.add_image(&image, ItemMetadata::named("Zyrtec"), false).unwrap();
        let second = index.add_image(&image, ItemMetadata::named("Zyrtec"), false).unwrap();
        assert_eq!(first, second);

        let stored = index.find_exact(&content_hash(&image)).unwrap().unwrap();
        assert_eq!(stored.name, "Zyrtec");
        assert!(!stored.features.is_empty());
    }

    #[test]
    fn test_consolidate_drops_later_duplicates() {
        let index = VisualMatchIndex::in_memory();
        index.add(stats_item("A", "x", [1.0, 0.0, 0.0]), true).unwrap();
        index.add(stats_item("B", "y", [1.0, 0.0, 0.0]), true).unwrap();
        index.add(stats_item("A again", "x", [1.0, 0.0, 0.0]), true).unwrap();

        assert_eq!(index.consolidate().unwrap(), 1);
        let names: Vec<_> = index
            .store()
            .get_all()
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(index.consolidate().unwrap(), 0);
    }

    #[test]
    fn test_remove_and_find_by_name() {
        let index = VisualMatchIndex::in_memory();
        let id = index.add(stats_item("Lipitor", "l", [1.0, 0.0, 0.0]), false).unwrap();

        assert_eq!(index.find_by_name("lipitor").unwrap().len(), 1);
        assert!(index.remove(id).unwrap().is_some());
        assert!(index.find_by_name("lipitor").unwrap().is_empty());
        assert!(index.remove(id).unwrap().is_none());
    }

    #[test]
    fn test_index_config_validation() {
        assert!(IndexConfig::default().validate().is_ok());

        let config = IndexConfig {
            import_extensions: vec![".png".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = IndexConfig {
            import_extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
