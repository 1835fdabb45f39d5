//! Persona governance: validation, rotation-aware portfolio building,
//! highlight and insight selection, and overlay shaping.
//!
//! Every selection step is a pure function of the taxonomy, a
//! [`RecencyView`](crate::rotation::RecencyView) and the request; the
//! [`GovernanceEngine`] wraps them with ledger locking and commit.

pub mod engine;
pub mod generational;
pub mod highlights;
pub mod insights;
pub mod overlays;
pub mod planner;
pub mod portfolio;
pub mod types;
pub mod validate;

pub use engine::GovernanceEngine;
pub use insights::BandAssigner;
pub use planner::{plan, Plan};
pub use portfolio::PortfolioBuild;
pub use types::{
    BandTier, GenerationalPick, GovernanceRequest, GovernedProgram, Highlight, HighlightKind,
    Insight, OverlayRequest, Overlays, PortfolioEntry, RejectedCandidate, Rejection,
    RejectionReason, Shortfall, ValidatedItem, ValidationResult,
};
pub use validate::CategoryScope;
