//! Request and output contract of the governance engine.
//!
//! Field names serialize in camelCase to match the JSON the generation
//! pipeline exchanges with the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::taxonomy::{Category, Cohort};

// ─────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────

/// Overlay pools the caller explicitly asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRequest {
    /// Attach cultural expressions
    #[serde(default)]
    pub cultural: bool,

    /// Attach geographic (DMA) segments
    #[serde(default)]
    pub geographic: bool,

    /// Restrict the cultural overlay to one lineage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<String>,

    /// Market or region hints for the geographic overlay
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markets: Vec<String>,
}

impl OverlayRequest {
    pub fn wants_cultural(&self) -> bool {
        self.cultural || self.lineage.is_some()
    }

    pub fn wants_geographic(&self) -> bool {
        self.geographic || !self.markets.is_empty()
    }

    pub fn wants_any(&self) -> bool {
        self.wants_cultural() || self.wants_geographic()
    }
}

/// One governance request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceRequest {
    /// Already-inferred category
    pub category: Category,

    /// Candidate names, typically from a generative source
    #[serde(default)]
    pub candidate_names: Vec<String>,

    /// Brand name for the dual-anchor lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_key: Option<String>,

    /// Explicit dual-anchor partner, overriding the brand lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_category: Option<Category>,

    #[serde(default)]
    pub requested_overlays: OverlayRequest,

    /// Core item count (configured default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<usize>,

    /// Cohorts whose generational pick is highlighted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlight_cohorts: Vec<Cohort>,

    /// Preferred generational segments, honoured per cohort when valid
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generational_candidates: Vec<String>,
}

impl GovernanceRequest {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            candidate_names: Vec::new(),
            brand_key: None,
            partner_category: None,
            requested_overlays: OverlayRequest::default(),
            target_count: None,
            highlight_cohorts: Vec::new(),
            generational_candidates: Vec::new(),
        }
    }

    pub fn with_candidates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand_key = Some(brand.into());
        self
    }

    pub fn with_partner(mut self, partner: Category) -> Self {
        self.partner_category = Some(partner);
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target_count = Some(target);
        self
    }

    pub fn with_overlays(mut self, overlays: OverlayRequest) -> Self {
        self.requested_overlays = overlays;
        self
    }

    pub fn with_highlight_cohorts(mut self, cohorts: Vec<Cohort>) -> Self {
        self.highlight_cohorts = cohorts;
        self
    }
}

// ─────────────────────────────────────────────────────────────────
// Validation Outcome
// ─────────────────────────────────────────────────────────────────

/// Why a candidate was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Name resolves to nothing in the taxonomy
    NotFound,
    /// Name is on the blocked list
    Deprecated { replacement: Option<String> },
    /// Canonical item outside every active category pool
    CategoryMismatch,
    /// Anchor label or generational segment submitted as a core item
    NotCoreItem,
}

impl Rejection {
    pub fn reason(&self) -> RejectionReason {
        match self {
            Rejection::NotFound => RejectionReason::NotFound,
            Rejection::Deprecated { .. } => RejectionReason::Deprecated,
            Rejection::CategoryMismatch => RejectionReason::CategoryMismatch,
            Rejection::NotCoreItem => RejectionReason::NotCoreItem,
        }
    }

    pub fn replacement(&self) -> Option<&str> {
        match self {
            Rejection::Deprecated { replacement } => replacement.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Deprecated {
                replacement: Some(r),
            } => write!(f, "deprecated (use '{}')", r),
            other => write!(f, "{}", other.reason()),
        }
    }
}

/// Serializable tag of a [`Rejection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionReason {
    NotFound,
    Deprecated,
    CategoryMismatch,
    NotCoreItem,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NotFound => write!(f, "not found"),
            RejectionReason::Deprecated => write!(f, "deprecated"),
            RejectionReason::CategoryMismatch => write!(f, "category mismatch"),
            RejectionReason::NotCoreItem => write!(f, "not a core item"),
        }
    }
}

/// A candidate that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedItem {
    pub name: String,
    pub phylum: String,
}

pub type ValidationResult = std::result::Result<ValidatedItem, Rejection>;

// ─────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────

/// One core portfolio item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub name: String,
    pub phylum: String,
}

impl From<ValidatedItem> for PortfolioEntry {
    fn from(item: ValidatedItem) -> Self {
        Self {
            name: item.name,
            phylum: item.phylum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Core,
    Generational,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: HighlightKind,
}

impl Highlight {
    pub fn core(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: HighlightKind::Core,
        }
    }

    pub fn generational(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: HighlightKind::Generational,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandTier {
    High,
    Low,
}

/// Insight item with its percentage band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub name: String,
    pub band: u8,
    pub tier: BandTier,
}

/// One generational segment per cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationalPick {
    pub cohort: Cohort,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlays {
    pub cultural: Vec<String>,
    pub geographic: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub name: String,
    pub reason: RejectionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl RejectedCandidate {
    pub fn new(name: impl Into<String>, rejection: &Rejection) -> Self {
        Self {
            name: name.into(),
            reason: rejection.reason(),
            replacement: rejection.replacement().map(str::to_string),
        }
    }
}

/// Degraded-but-valid signal: the pool could not fill the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub requested: usize,
    pub delivered: usize,
}

/// Shaped output of one governed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernedProgram {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub category: Category,
    pub portfolio: Vec<PortfolioEntry>,
    pub anchors: Vec<String>,
    pub generational: Vec<GenerationalPick>,
    pub highlights: Vec<Highlight>,
    pub insights: Vec<Insight>,
    pub overlays: Option<Overlays>,
    pub rejected: Vec<RejectedCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<Shortfall>,
}

impl GovernedProgram {
    /// Core items, then anchors, then generational picks.
    pub fn full_portfolio(&self) -> Vec<&str> {
        self.portfolio
            .iter()
            .map(|e| e.name.as_str())
            .chain(self.anchors.iter().map(String::as_str))
            .chain(self.generational.iter().map(|g| g.name.as_str()))
            .collect()
    }

    pub fn core_names(&self) -> Vec<&str> {
        self.portfolio.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn highlight_names(&self) -> Vec<&str> {
        self.highlights.iter().map(|h| h.name.as_str()).collect()
    }
}
