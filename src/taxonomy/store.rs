//! Immutable, indexed view of the canon.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::canon::{self, CanonDocument, CanonMeta, NamedEntry, BUNDLED_CANON};
use super::types::{normalize_name, Category, Cohort, Labelled, Lineage, Region};
use crate::error::{Error, Result};

/// Segments each generational cohort must carry.
pub const SEGMENTS_PER_COHORT: usize = 8;

/// Separator between cohort and segment in a generational name.
pub const COHORT_SEPARATOR: char = '\u{2013}';

/// A blocked name and what to use instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deprecation {
    pub name: String,
    pub reason: String,
    pub replacement: Option<String>,
}

/// One generational segment, e.g. "Gen Z–Cloud Life".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationalSegment {
    pub cohort: Cohort,
    pub name: String,
    pub description: String,
}

/// One cultural expression within a lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CulturalExpression {
    pub lineage: Lineage,
    pub name: String,
    pub description: String,
}

/// Headline counts for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyStats {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub items: usize,
    pub categories: usize,
    pub phyla: usize,
    pub aliases: usize,
    pub deprecated: usize,
    pub generational_segments: usize,
    pub cultural_expressions: usize,
    pub markets: usize,
}

#[derive(Debug)]
struct ItemRecord {
    name: String,
    phylum: usize,
}

#[derive(Debug, Default)]
struct CategoryPool {
    anchors: Vec<String>,
    members: Vec<usize>,
    member_set: HashSet<usize>,
    hot: HashSet<usize>,
}

/// The reference taxonomy: category pools, phyla, aliases, the deprecated
/// set, dual-anchor brands and the generational/cultural/geographic pools.
///
/// Built once and shared read-only; nothing here mutates after load.
#[derive(Debug)]
pub struct Taxonomy {
    meta: CanonMeta,
    fingerprint: String,
    items: Vec<ItemRecord>,
    by_key: HashMap<String, usize>,
    alias_count: usize,
    pools: BTreeMap<Category, CategoryPool>,
    phyla: Vec<String>,
    deprecated: HashMap<String, Deprecation>,
    brands: HashMap<String, Vec<Category>>,
    cohorts: BTreeMap<Cohort, Vec<GenerationalSegment>>,
    segment_keys: HashMap<String, (Cohort, usize)>,
    lineages: BTreeMap<Lineage, Vec<CulturalExpression>>,
    regions: BTreeMap<Region, Vec<String>>,
    anchor_keys: HashSet<String>,
}

impl Taxonomy {
    // ─────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────

    /// Load the canon compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_CANON)
    }

    /// Load a canon file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::IoRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loading taxonomy file");
        Self::from_toml_str(&text)
    }

    /// Load from the configured path, or the bundled canon when unset.
    pub fn load_or_bundled(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(Path::new(p)),
            None => Self::bundled(),
        }
    }

    /// Parse and index canon text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let doc = CanonDocument::parse(text)?;
        let taxonomy = Self::from_document(doc, canon::fingerprint(text))?;
        info!(
            canon = %taxonomy.meta.name,
            version = %taxonomy.meta.version,
            fingerprint = %&taxonomy.fingerprint[..12],
            items = taxonomy.items.len(),
            "Taxonomy loaded"
        );
        Ok(taxonomy)
    }

    fn from_document(doc: CanonDocument, fingerprint: String) -> Result<Self> {
        // Phyla first: every item gets exactly one.
        let mut phyla = Vec::with_capacity(doc.phyla.len());
        let mut phylum_of: HashMap<&str, usize> = HashMap::new();
        for (idx, (phylum, members)) in doc.phyla.iter().enumerate() {
            phyla.push(phylum.clone());
            for member in members {
                if let Some(prev) = phylum_of.insert(member.as_str(), idx) {
                    return Err(Error::taxonomy(format!(
                        "'{}' is listed under both '{}' and '{}'",
                        member, doc_phylum(&phyla, prev), phylum
                    )));
                }
            }
        }

        let mut categories: BTreeMap<Category, _> = BTreeMap::new();
        for (label, entry) in &doc.categories {
            let category = Category::from_label(label)
                .ok_or_else(|| Error::taxonomy(format!("unknown category '{}'", label)))?;
            categories.insert(category, entry);
        }
        for category in Category::all() {
            if !categories.contains_key(category) {
                return Err(Error::taxonomy(format!("category '{}' has no pool", category)));
            }
        }

        let mut taxonomy = Taxonomy {
            meta: doc.meta.clone(),
            fingerprint,
            items: Vec::new(),
            by_key: HashMap::new(),
            alias_count: 0,
            pools: BTreeMap::new(),
            phyla,
            deprecated: HashMap::new(),
            brands: HashMap::new(),
            cohorts: BTreeMap::new(),
            segment_keys: HashMap::new(),
            lineages: BTreeMap::new(),
            regions: BTreeMap::new(),
            anchor_keys: HashSet::new(),
        };

        // Items in category order, then phylum-only items.
        for (&category, entry) in &categories {
            let mut pool = CategoryPool {
                anchors: entry.anchors.clone(),
                ..Default::default()
            };
            if pool.anchors.is_empty() {
                return Err(Error::taxonomy(format!("category '{}' has no anchor label", category)));
            }
            for name in &entry.pool {
                let phylum = *phylum_of.get(name.as_str()).ok_or_else(|| {
                    Error::taxonomy(format!("'{}' in {} has no phylum", name, category))
                })?;
                let idx = taxonomy.intern(name, phylum)?;
                if pool.member_set.insert(idx) {
                    pool.members.push(idx);
                }
            }
            for name in &entry.hot {
                let idx = taxonomy
                    .index_of(name)
                    .filter(|idx| pool.member_set.contains(idx))
                    .ok_or_else(|| {
                        Error::taxonomy(format!("hot item '{}' is not in the {} pool", name, category))
                    })?;
                pool.hot.insert(idx);
            }
            for anchor in &pool.anchors {
                taxonomy.anchor_keys.insert(normalize_name(anchor));
            }
            taxonomy.pools.insert(category, pool);
        }
        for (phylum_idx, members) in doc.phyla.values().enumerate() {
            for name in members {
                if taxonomy.index_of(name).is_none() {
                    taxonomy.intern(name, phylum_idx)?;
                }
            }
        }

        for (alias, target) in &doc.aliases {
            let idx = taxonomy.index_of(target).ok_or_else(|| {
                Error::taxonomy(format!("alias '{}' targets unknown item '{}'", alias, target))
            })?;
            let key = normalize_name(alias);
            match taxonomy.by_key.get(&key) {
                Some(&existing) if existing != idx => {
                    return Err(Error::taxonomy(format!(
                        "alias '{}' collides with '{}'",
                        alias, taxonomy.items[existing].name
                    )));
                }
                Some(_) => {}
                None => {
                    taxonomy.by_key.insert(key, idx);
                }
            }
            taxonomy.alias_count += 1;
        }

        for (name, entry) in &doc.deprecated {
            if taxonomy.index_of(name).is_some() {
                return Err(Error::taxonomy(format!(
                    "deprecated name '{}' is also a canonical item",
                    name
                )));
            }
            let replacement = match &entry.replacement {
                Some(r) => Some(
                    taxonomy
                        .resolve(r)
                        .ok_or_else(|| {
                            Error::taxonomy(format!(
                                "replacement '{}' for '{}' is not a canonical item",
                                r, name
                            ))
                        })?
                        .to_string(),
                ),
                None => None,
            };
            taxonomy.deprecated.insert(
                normalize_name(name),
                Deprecation {
                    name: name.clone(),
                    reason: entry.reason.clone(),
                    replacement,
                },
            );
        }

        for (brand, labels) in &doc.dual_anchor_brands {
            let mut spanned = Vec::with_capacity(2);
            for label in labels {
                let category = Category::from_label(label).ok_or_else(|| {
                    Error::taxonomy(format!("brand '{}' names unknown category '{}'", brand, label))
                })?;
                if !spanned.contains(&category) {
                    spanned.push(category);
                }
            }
            if spanned.len() != 2 {
                return Err(Error::taxonomy(format!(
                    "dual-anchor brand '{}' must span exactly two categories",
                    brand
                )));
            }
            taxonomy.brands.insert(normalize_name(brand), spanned);
        }

        for (label, entry) in &doc.cohorts {
            let cohort = Cohort::from_label(label)
                .ok_or_else(|| Error::taxonomy(format!("unknown cohort '{}'", label)))?;
            if entry.segments.len() != SEGMENTS_PER_COHORT {
                return Err(Error::taxonomy(format!(
                    "cohort '{}' has {} segments, expected {}",
                    cohort,
                    entry.segments.len(),
                    SEGMENTS_PER_COHORT
                )));
            }
            let segments: Vec<GenerationalSegment> = entry
                .segments
                .iter()
                .map(|s| GenerationalSegment {
                    cohort,
                    name: format!("{}{}{}", cohort.label(), COHORT_SEPARATOR, s.name),
                    description: s.description.clone(),
                })
                .collect();
            for (pos, segment) in segments.iter().enumerate() {
                taxonomy.segment_keys.insert(normalize_name(&segment.name), (cohort, pos));
            }
            taxonomy.cohorts.insert(cohort, segments);
        }
        for cohort in Cohort::all() {
            if !taxonomy.cohorts.contains_key(cohort) {
                return Err(Error::taxonomy(format!("cohort '{}' is missing", cohort)));
            }
        }

        for (label, entry) in &doc.lineages {
            let lineage = Lineage::from_label(label)
                .ok_or_else(|| Error::taxonomy(format!("unknown lineage '{}'", label)))?;
            let expressions = expressions_for(lineage, &entry.expressions);
            taxonomy.lineages.insert(lineage, expressions);
        }

        for (label, entry) in &doc.regions {
            let region = Region::from_label(label)
                .ok_or_else(|| Error::taxonomy(format!("unknown region '{}'", label)))?;
            taxonomy.regions.insert(region, entry.markets.clone());
        }

        Ok(taxonomy)
    }

    fn intern(&mut self, name: &str, phylum: usize) -> Result<usize> {
        let key = normalize_name(name);
        if let Some(&idx) = self.by_key.get(&key) {
            if self.items[idx].name != name {
                return Err(Error::taxonomy(format!(
                    "'{}' and '{}' normalize to the same name",
                    self.items[idx].name, name
                )));
            }
            return Ok(idx);
        }
        let idx = self.items.len();
        self.items.push(ItemRecord {
            name: name.to_string(),
            phylum,
        });
        self.by_key.insert(key, idx);
        Ok(idx)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.by_key.get(&normalize_name(name)).copied()
    }

    // ─────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────

    /// Canon name and version.
    pub fn meta(&self) -> &CanonMeta {
        &self.meta
    }

    /// Hex SHA-256 of the canon text this taxonomy was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Resolve a name or alias to the canonical item name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.index_of(name).map(|idx| self.items[idx].name.as_str())
    }

    /// Phylum of an item (by any accepted spelling).
    pub fn phylum_of(&self, name: &str) -> Option<&str> {
        self.index_of(name)
            .map(|idx| self.phyla[self.items[idx].phylum].as_str())
    }

    /// Deprecation record for a blocked name.
    pub fn deprecation(&self, name: &str) -> Option<&Deprecation> {
        self.deprecated.get(&normalize_name(name))
    }

    pub fn is_deprecated(&self, name: &str) -> bool {
        self.deprecation(name).is_some()
    }

    /// All blocked names, alphabetically.
    pub fn deprecated(&self) -> Vec<&Deprecation> {
        let mut all: Vec<_> = self.deprecated.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Whether the name is an anchor label of any category.
    pub fn is_anchor_label(&self, name: &str) -> bool {
        self.anchor_keys.contains(&normalize_name(name))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    // ─────────────────────────────────────────────────────────────
    // Categories
    // ─────────────────────────────────────────────────────────────

    /// Items of a category pool in canon order.
    pub fn pool(&self, category: Category) -> impl Iterator<Item = &str> + '_ {
        self.pools
            .get(&category)
            .into_iter()
            .flat_map(|pool| pool.members.iter())
            .map(move |&idx| self.items[idx].name.as_str())
    }

    pub fn pool_len(&self, category: Category) -> usize {
        self.pools.get(&category).map_or(0, |p| p.members.len())
    }

    /// Whether a canonical item belongs to the category pool.
    pub fn in_pool(&self, category: Category, name: &str) -> bool {
        match (self.pools.get(&category), self.index_of(name)) {
            (Some(pool), Some(idx)) => pool.member_set.contains(&idx),
            _ => false,
        }
    }

    /// Whether the item is flagged as overused in this category.
    pub fn is_hot(&self, category: Category, name: &str) -> bool {
        match (self.pools.get(&category), self.index_of(name)) {
            (Some(pool), Some(idx)) => pool.hot.contains(&idx),
            _ => false,
        }
    }

    /// Hot items of a category in pool order.
    pub fn hot_items(&self, category: Category) -> Vec<&str> {
        self.pool(category)
            .filter(|name| self.is_hot(category, name))
            .collect()
    }

    pub fn anchors(&self, category: Category) -> &[String] {
        self.pools.get(&category).map_or(&[], |p| p.anchors.as_slice())
    }

    /// Categories a brand spans under the dual-anchor rule; empty when the
    /// brand is not configured.
    pub fn brand_categories(&self, brand: &str) -> &[Category] {
        self.brands
            .get(&normalize_name(brand))
            .map_or(&[], |c| c.as_slice())
    }

    // ─────────────────────────────────────────────────────────────
    // Phyla
    // ─────────────────────────────────────────────────────────────

    pub fn phyla(&self) -> &[String] {
        &self.phyla
    }

    /// Members of a phylum in canon order.
    pub fn phylum_members(&self, phylum: &str) -> Vec<&str> {
        let Some(pos) = self.phyla.iter().position(|p| p == phylum) else {
            return Vec::new();
        };
        self.items
            .iter()
            .filter(|item| item.phylum == pos)
            .map(|item| item.name.as_str())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Generational / Cultural / Geographic
    // ─────────────────────────────────────────────────────────────

    pub fn segments(&self, cohort: Cohort) -> &[GenerationalSegment] {
        self.cohorts.get(&cohort).map_or(&[], |s| s.as_slice())
    }

    /// Resolve a generational name such as "Gen Z - Cloud Life".
    pub fn resolve_segment(&self, name: &str) -> Option<&GenerationalSegment> {
        let (cohort, pos) = *self.segment_keys.get(&normalize_name(name))?;
        self.cohorts.get(&cohort).and_then(|s| s.get(pos))
    }

    pub fn expressions(&self, lineage: Lineage) -> &[CulturalExpression] {
        self.lineages.get(&lineage).map_or(&[], |e| e.as_slice())
    }

    pub fn markets(&self, region: Region) -> &[String] {
        self.regions.get(&region).map_or(&[], |m| m.as_slice())
    }

    /// Local-culture markets whose base name contains the hint or is
    /// contained by it ("Boston" and "greater boston area" both find
    /// "Boston Culture"), in region order.
    pub fn find_markets(&self, hint: &str) -> Vec<&str> {
        let wanted = hint.trim().to_lowercase();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.regions
            .values()
            .flatten()
            .filter(|market| {
                let base = market.trim_end_matches(" Culture").to_lowercase();
                base.contains(&wanted) || wanted.contains(&base)
            })
            .map(String::as_str)
            .collect()
    }

    pub fn stats(&self) -> TaxonomyStats {
        TaxonomyStats {
            name: self.meta.name.clone(),
            version: self.meta.version.clone(),
            fingerprint: self.fingerprint.clone(),
            items: self.items.len(),
            categories: self.pools.len(),
            phyla: self.phyla.len(),
            aliases: self.alias_count,
            deprecated: self.deprecated.len(),
            generational_segments: self.cohorts.values().map(Vec::len).sum(),
            cultural_expressions: self.lineages.values().map(Vec::len).sum(),
            markets: self.regions.values().map(Vec::len).sum(),
        }
    }
}

fn doc_phylum(phyla: &[String], idx: usize) -> &str {
    phyla.get(idx).map_or("?", String::as_str)
}

fn expressions_for(lineage: Lineage, entries: &[NamedEntry]) -> Vec<CulturalExpression> {
    entries
        .iter()
        .map(|e| CulturalExpression {
            lineage,
            name: e.name.clone(),
            description: e.description.clone(),
        })
        .collect()
}
