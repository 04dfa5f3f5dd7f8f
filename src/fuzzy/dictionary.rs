//! # Medication Name Dictionary
//!
//! Candidate names, brand to generic aliases and category keyword lists.
//! Built in code, from the bundled defaults, or from a JSON document of the
//! form:
//!
//! ```json
//! {
//!   "names": ["Amoxicillin 500mg", "Augmentin"],
//!   "brand_aliases": { "augmentin": "amoxicillin/clavulanate" },
//!   "category_keywords": { "antibiotics": ["amoxicillin"] }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{error_logging, AppError, AppResult};

use super::algorithms::normalize;

/// Category of entries matching no keyword.
pub const UNCLASSIFIED: &str = "unclassified";

/// One dictionary name with its derived lookup data
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryEntry {
    /// Name as it should be reported
    pub name: String,
    /// Normalized (lowercase) form used for matching
    pub normalized: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DictionaryDocument {
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    brand_aliases: BTreeMap<String, String>,
    #[serde(default)]
    category_keywords: BTreeMap<String, Vec<String>>,
}

/// Names the fuzzy matcher searches
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
    brand_aliases: BTreeMap<String, String>,
    category_keywords: BTreeMap<String, Vec<String>>,
}

impl Dictionary {
    /// Build a dictionary. Names that normalize to the same text are kept
    /// once, first occurrence wins.
    pub fn new(
        names: impl IntoIterator<Item = impl Into<String>>,
        brand_aliases: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
        category_keywords: impl IntoIterator<Item = (impl Into<String>, Vec<String>)>,
    ) -> Self {
        let brand_aliases: BTreeMap<String, String> = brand_aliases
            .into_iter()
            .map(|(brand, generic)| {
                let (brand, generic): (String, String) = (brand.into(), generic.into());
                (normalize(&brand), normalize(&generic))
            })
            .filter(|(brand, generic)| !brand.is_empty() && !generic.is_empty())
            .collect();
        let category_keywords: BTreeMap<String, Vec<String>> = category_keywords
            .into_iter()
            .map(|(category, keywords)| {
                let keywords = keywords
                    .iter()
                    .map(|k| normalize(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                let category: String = category.into();
                (normalize(&category), keywords)
            })
            .collect();

        let mut dictionary = Self {
            entries: Vec::new(),
            brand_aliases,
            category_keywords,
        };
        for name in names {
            dictionary.push_name(name.into());
        }
        dictionary
    }

    /// Dictionary with the bundled medication names, aliases and categories
    pub fn with_defaults() -> Self {
        let keywords = DEFAULT_CATEGORY_KEYWORDS.iter().map(|(category, words)| {
            (
                category.to_string(),
                words.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            )
        });
        Self::new(
            DEFAULT_NAMES.iter().copied(),
            DEFAULT_BRAND_ALIASES.iter().copied(),
            keywords,
        )
    }

    /// Parse a JSON dictionary document
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let document: DictionaryDocument = serde_json::from_str(json)?;
        Ok(Self::new(
            document.names,
            document.brand_aliases,
            document.category_keywords,
        ))
    }

    /// Load a JSON dictionary document from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            error_logging::log_filesystem_error(&e, "read_dictionary", path.to_str());
            AppError::FileSystem(format!("cannot read dictionary {}: {}", path.display(), e))
        })?;
        let dictionary = Self::from_json_str(&contents)?;

        tracing::debug!(
            target: "fuzzy_matching",
            path = %path.display(),
            entries = dictionary.len(),
            aliases = dictionary.brand_aliases.len(),
            "Dictionary loaded"
        );
        Ok(dictionary)
    }

    /// Serialize to the JSON document format
    pub fn to_json_string(&self) -> AppResult<String> {
        let document = DictionaryDocument {
            names: self.entries.iter().map(|e| e.name.clone()).collect(),
            brand_aliases: self.brand_aliases.clone(),
            category_keywords: self.category_keywords.clone(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Add a name, returning false when it is already present
    pub fn add_name(&mut self, name: impl Into<String>) -> bool {
        self.push_name(name.into())
    }

    fn push_name(&mut self, name: String) -> bool {
        let name = name.trim().to_string();
        let normalized = normalize(&name);
        if normalized.is_empty() || self.entries.iter().any(|e| e.normalized == normalized) {
            return false;
        }
        let category = self.category_of(&normalized);
        self.entries.push(DictionaryEntry {
            name,
            normalized,
            category,
        });
        true
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Brand (normalized) to generic name
    pub fn brand_aliases(&self) -> &BTreeMap<String, String> {
        &self.brand_aliases
    }

    /// Entry whose normalized name equals `name` after normalization
    pub fn find(&self, name: &str) -> Option<&DictionaryEntry> {
        let normalized = normalize(name);
        self.entries.iter().find(|e| e.normalized == normalized)
    }

    /// Category by keyword membership, then through a contained brand's
    /// generic name, else unclassified.
    pub fn category_of(&self, text: &str) -> String {
        let normalized = normalize(text);
        if let Some(category) = self.keyword_category(&normalized) {
            return category;
        }
        self.brand_aliases
            .iter()
            .filter(|(brand, _)| normalized.contains(brand.as_str()))
            .find_map(|(_, generic)| self.keyword_category(generic))
            .unwrap_or_else(|| UNCLASSIFIED.to_string())
    }

    fn keyword_category(&self, normalized: &str) -> Option<String> {
        self.category_keywords
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k.as_str())))
            .map(|(category, _)| category.clone())
    }
}

const DEFAULT_NAMES: &[&str] = &[
    "Amoxicillin 500mg",
    "Amoxicillin 250mg",
    "Augmentin",
    "Azithromycin 250mg",
    "Ciprofloxacin 500mg",
    "Doxycycline 100mg",
    "Cephalexin 500mg",
    "Ibuprofen 400mg",
    "Ibuprofen 200mg",
    "Paracetamol 500mg",
    "Acetaminophen 500mg",
    "Aspirin 100mg",
    "Naproxen 250mg",
    "Tylenol",
    "Advil",
    "Metformin 500mg",
    "Metformin 850mg",
    "Glipizide 5mg",
    "Insulin Glargine",
    "Glucophage",
    "Lisinopril 10mg",
    "Amlodipine 5mg",
    "Losartan 50mg",
    "Metoprolol 50mg",
    "Hydrochlorothiazide 25mg",
    "Norvasc",
    "Atorvastatin 20mg",
    "Simvastatin 20mg",
    "Rosuvastatin 10mg",
    "Lipitor",
    "Crestor",
    "Omeprazole 20mg",
    "Cetirizine 10mg",
    "Loratadine 10mg",
];

const DEFAULT_BRAND_ALIASES: &[(&str, &str)] = &[
    ("augmentin", "amoxicillin/clavulanate"),
    ("amoxil", "amoxicillin"),
    ("zithromax", "azithromycin"),
    ("cipro", "ciprofloxacin"),
    ("tylenol", "acetaminophen"),
    ("panadol", "paracetamol"),
    ("advil", "ibuprofen"),
    ("motrin", "ibuprofen"),
    ("aleve", "naproxen"),
    ("glucophage", "metformin"),
    ("lantus", "insulin glargine"),
    ("zestril", "lisinopril"),
    ("norvasc", "amlodipine"),
    ("cozaar", "losartan"),
    ("lipitor", "atorvastatin"),
    ("zocor", "simvastatin"),
    ("crestor", "rosuvastatin"),
    ("prilosec", "omeprazole"),
    ("zyrtec", "cetirizine"),
    ("claritin", "loratadine"),
];

const DEFAULT_CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "antibiotics",
        &[
            "amoxicillin",
            "azithromycin",
            "ciprofloxacin",
            "doxycycline",
            "cephalexin",
            "clavulanate",
            "penicillin",
        ],
    ),
    (
        "analgesics",
        &["ibuprofen", "paracetamol", "acetaminophen", "aspirin", "naproxen"],
    ),
    ("diabetes", &["metformin", "glipizide", "insulin"]),
    (
        "hypertension",
        &[
            "lisinopril",
            "amlodipine",
            "losartan",
            "metoprolol",
            "hydrochlorothiazide",
        ],
    ),
    ("cholesterol", &["atorvastatin", "simvastatin", "rosuvastatin"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Dictionary {
        Dictionary::new(
            ["Amoxicillin 500mg", "Augmentin"],
            [("Augmentin", "amoxicillin/clavulanate")],
            [("antibiotics", vec!["amoxicillin".to_string()])],
        )
    }

    #[test]
    fn test_categories_from_keywords_and_aliases() {
        let dictionary = scenario();
        assert_eq!(dictionary.category_of("Amoxicillin 500mg"), "antibiotics");
        // Through the alias generic name
        assert_eq!(dictionary.category_of("Augmentin"), "antibiotics");
        assert_eq!(dictionary.category_of("Vitamin C"), UNCLASSIFIED);
    }

    #[test]
    fn test_duplicate_names_are_ignored() {
        let mut dictionary = scenario();
        assert!(!dictionary.add_name("  augmentin "));
        assert!(dictionary.add_name("Cipro"));
        assert_eq!(dictionary.len(), 3);
        assert!(!dictionary.add_name("   "));
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{
            "names": ["Lipitor", "Atorvastatin 20mg"],
            "brand_aliases": {"Lipitor": "Atorvastatin"},
            "category_keywords": {"cholesterol": ["atorvastatin"]}
        }"#;
        let dictionary = Dictionary::from_json_str(json).expect("dictionary should parse");
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.brand_aliases().get("lipitor").map(String::as_str), Some("atorvastatin"));
        assert_eq!(dictionary.find("LIPITOR").map(|e| e.category.as_str()), Some("cholesterol"));

        let restored = Dictionary::from_json_str(&dictionary.to_json_string().unwrap()).unwrap();
        assert_eq!(restored.entries(), dictionary.entries());
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        assert!(matches!(
            Dictionary::from_json_str("{not json"),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_defaults_are_categorized() {
        let dictionary = Dictionary::with_defaults();
        assert!(!dictionary.is_empty());
        assert_eq!(dictionary.find("Metformin 500mg").unwrap().category, "diabetes");
        assert_eq!(dictionary.find("Lipitor").unwrap().category, "cholesterol");
    }
}
