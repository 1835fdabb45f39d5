//! Persona governor library
//!
//! Selects, validates and diversifies personas from a curated taxonomy into
//! bounded, non-repetitive, category-consistent programs.

pub mod cli;
pub mod config;
pub mod error;
pub mod governance;
pub mod logging;
pub mod rotation;
pub mod taxonomy;

pub use config::GovernorConfig;
pub use error::{Error, ErrorCode, Result};
pub use governance::{GovernanceEngine, GovernanceRequest, GovernedProgram};
pub use rotation::RotationLedger;
pub use taxonomy::{Category, Cohort, Taxonomy};
