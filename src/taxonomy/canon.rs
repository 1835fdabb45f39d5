//! On-disk form of the reference taxonomy.
//!
//! The canon is a TOML document. These structs mirror it one-to-one; all
//! cross-referencing and integrity checking happens in [`super::Taxonomy`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Canon compiled into the binary.
pub const BUNDLED_CANON: &str = include_str!("../../config/taxonomy/canon.toml");

/// Root of a canon document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonDocument {
    pub meta: CanonMeta,

    /// Keyed by category label. Missing labels fail the integrity check.
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryEntry>,

    /// Phylum name to member items.
    pub phyla: BTreeMap<String, Vec<String>>,

    /// Alternate spelling to canonical item name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    #[serde(default)]
    pub deprecated: BTreeMap<String, DeprecatedEntry>,

    /// Lowercase brand name to the two category labels it spans.
    #[serde(default)]
    pub dual_anchor_brands: BTreeMap<String, Vec<String>>,

    /// Keyed by cohort label.
    pub cohorts: BTreeMap<String, CohortEntry>,

    /// Keyed by lineage label.
    #[serde(default)]
    pub lineages: BTreeMap<String, LineageEntry>,

    /// Keyed by region label.
    #[serde(default)]
    pub regions: BTreeMap<String, RegionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryEntry {
    pub anchors: Vec<String>,
    #[serde(default)]
    pub hot: Vec<String>,
    pub pool: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeprecatedEntry {
    pub reason: String,
    #[serde(default)]
    pub replacement: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohortEntry {
    pub segments: Vec<NamedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineageEntry {
    pub expressions: Vec<NamedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionEntry {
    pub markets: Vec<String>,
}

impl CanonDocument {
    /// Parse a canon document from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::TaxonomyParse {
            message: e.message().to_string(),
            source: Some(e),
        })
    }
}

/// SHA-256 of the canon text, hex encoded.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
