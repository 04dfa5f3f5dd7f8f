//! # Reference Index
//!
//! Catalogued package images, their storage backends and similarity search.

pub mod item;
pub mod persistence;
pub mod store;
pub mod visual_index;

pub use item::{
    content_hash, CaptureAngle, ItemId, ItemMetadata, LightingCondition, NewReferenceItem,
    PackageCondition, ReferenceItem,
};
pub use persistence::{load_snapshot, save_snapshot};
pub use store::{InMemoryReferenceStore, ReferenceStore};
pub use visual_index::{ImportReport, IndexConfig, ScoredItem, VisualMatchIndex};
