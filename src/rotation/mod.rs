//! Rotation pressure: bounded recency histories and the penalty they imply.

pub mod history;
pub mod ledger;
pub mod penalty;

pub use history::RotationHistory;
pub use ledger::{
    LedgerSnapshot, LedgerTxn, PoolStats, PoolType, RecencyView, RotationCommit, RotationLedger,
};
pub use penalty::PenaltyCurve;
