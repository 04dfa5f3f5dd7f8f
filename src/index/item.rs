//! # Reference Items
//!
//! Catalogued package images and the metadata recorded with them.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{AppError, AppResult};
use crate::features::FeatureSet;

/// Identifier assigned by the reference store
pub type ItemId = u64;

/// Physical state of the photographed package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PackageCondition {
    #[default]
    Intact,
    Damaged,
    Partial,
    Worn,
}

/// Side of the package facing the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureAngle {
    #[default]
    Front,
    Back,
    Side,
    Top,
    Tilted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightingCondition {
    #[default]
    Normal,
    Bright,
    Dim,
    Glare,
    Mixed,
}

/// Descriptive metadata supplied when cataloguing an image
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub name: String,
    pub brand: Option<String>,
    pub condition: PackageCondition,
    pub angle: CaptureAngle,
    pub lighting: LightingCondition,
}

impl ItemMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// An item ready for insertion, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReferenceItem {
    pub metadata: ItemMetadata,
    pub content_hash: String,
    pub features: FeatureSet,
}

impl NewReferenceItem {
    pub fn new(metadata: ItemMetadata, content_hash: impl Into<String>, features: FeatureSet) -> Self {
        Self {
            metadata,
            content_hash: content_hash.into(),
            features,
        }
    }

    /// Reject items without a name, hash or features
    pub fn validate(&self) -> AppResult<()> {
        if self.metadata.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Reference item name cannot be empty".to_string(),
            ));
        }
        if self.content_hash.trim().is_empty() {
            return Err(AppError::Validation(
                "Reference item content hash cannot be empty".to_string(),
            ));
        }
        if self.features.is_empty() {
            return Err(AppError::Validation(format!(
                "Reference item '{}' has no features",
                self.metadata.name
            )));
        }
        Ok(())
    }
}

/// A stored reference item. Features are computed once at ingestion and
/// never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: ItemId,
    pub name: String,
    pub brand: Option<String>,
    pub condition: PackageCondition,
    pub angle: CaptureAngle,
    pub lighting: LightingCondition,
    pub content_hash: String,
    pub features: FeatureSet,
    pub created_at: DateTime<Utc>,
}

impl ReferenceItem {
    /// Materialize `item` under `id`, stamped now
    pub fn from_new(id: ItemId, item: NewReferenceItem) -> Self {
        let NewReferenceItem {
            metadata,
            content_hash,
            features,
        } = item;
        Self {
            id,
            name: metadata.name,
            brand: metadata.brand,
            condition: metadata.condition,
            angle: metadata.angle,
            lighting: metadata.lighting,
            content_hash,
            features,
            created_at: Utc::now(),
        }
    }
}

/// SHA-256 over the width, height (little-endian u32) and RGBA bytes, as
/// lowercase hex.
pub fn content_hash(image: &DynamicImage) -> String {
    let rgba = image.to_rgba8();
    let mut hasher = Sha256::new();
    hasher.update(rgba.width().to_le_bytes());
    hasher.update(rgba.height().to_le_bytes());
    hasher.update(rgba.as_raw());
    format!("{:x}", hasher.finalize())
}
