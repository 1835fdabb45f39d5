//! Reference taxonomy: the static data every governance decision is checked
//! against.
//!
//! Loaded once (bundled canon or a configured file), indexed, and shared
//! read-only behind an `Arc` for the life of the process.

pub mod canon;
pub mod store;
pub mod types;

pub use canon::{CanonMeta, BUNDLED_CANON};
pub use store::{
    CulturalExpression, Deprecation, GenerationalSegment, Taxonomy, TaxonomyStats,
    COHORT_SEPARATOR, SEGMENTS_PER_COHORT,
};
pub use types::{normalize_name, Category, Cohort, Labelled, Lineage, Region};
