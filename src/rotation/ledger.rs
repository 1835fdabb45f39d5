//! Process-wide rotation ledger.
//!
//! One history per pool type, each behind its own mutex. A governed request
//! takes every pool lock up front (always in [`PoolType::all`] order), plans
//! against that frozen view and then either commits its picks or drops the
//! transaction untouched.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::history::RotationHistory;
use super::penalty::PenaltyCurve;
use crate::config::RotationSettings;

// ─────────────────────────────────────────────────────────────────
// Pool Type
// ─────────────────────────────────────────────────────────────────

/// Rotation pools with independent windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
    /// Core portfolio items.
    Core,
    /// Core items surfaced as highlights.
    Highlight,
    /// Generational segments.
    Generational,
}

impl PoolType {
    /// Lock acquisition order.
    pub fn all() -> [PoolType; 3] {
        [PoolType::Core, PoolType::Highlight, PoolType::Generational]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolType::Core => "core",
            PoolType::Highlight => "highlight",
            PoolType::Generational => "generational",
        }
    }
}

impl std::fmt::Display for PoolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────
// Read Interface
// ─────────────────────────────────────────────────────────────────

/// Read-only recency view used by the planners.
pub trait RecencyView {
    /// Weight multiplier in `[0, 1]`; 1.0 when the name is not in the pool's
    /// history. `hot` marks an item flagged as overused for the request's
    /// category.
    fn penalty(&self, pool: PoolType, name: &str, hot: bool) -> f64;
}

/// Names to append per pool once a plan succeeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RotationCommit {
    pub core: Vec<String>,
    pub highlight: Vec<String>,
    pub generational: Vec<String>,
}

impl RotationCommit {
    pub fn push(&mut self, pool: PoolType, name: impl Into<String>) {
        match pool {
            PoolType::Core => self.core.push(name.into()),
            PoolType::Highlight => self.highlight.push(name.into()),
            PoolType::Generational => self.generational.push(name.into()),
        }
    }

    pub fn entries(&self, pool: PoolType) -> &[String] {
        match pool {
            PoolType::Core => &self.core,
            PoolType::Highlight => &self.highlight,
            PoolType::Generational => &self.generational,
        }
    }

    pub fn is_empty(&self) -> bool {
        PoolType::all().iter().all(|p| self.entries(*p).is_empty())
    }

    pub fn len(&self) -> usize {
        PoolType::all().iter().map(|p| self.entries(*p).len()).sum()
    }
}

/// Fill level of one pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub pool: PoolType,
    pub len: usize,
    pub window: usize,
}

// ─────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────

/// Shared recency state across all requests.
#[derive(Debug)]
pub struct RotationLedger {
    core: Mutex<RotationHistory>,
    highlight: Mutex<RotationHistory>,
    generational: Mutex<RotationHistory>,
    curve: PenaltyCurve,
}

impl RotationLedger {
    pub fn new(settings: &RotationSettings) -> Self {
        Self {
            core: Mutex::new(RotationHistory::new(settings.core_window)),
            highlight: Mutex::new(RotationHistory::new(settings.highlight_window)),
            generational: Mutex::new(RotationHistory::new(settings.generational_window)),
            curve: PenaltyCurve::from_settings(settings),
        }
    }

    fn slot(&self, pool: PoolType) -> &Mutex<RotationHistory> {
        match pool {
            PoolType::Core => &self.core,
            PoolType::Highlight => &self.highlight,
            PoolType::Generational => &self.generational,
        }
    }

    /// Append one name to a pool.
    pub fn record(&self, pool: PoolType, name: &str) {
        self.slot(pool).lock().record(name);
    }

    /// Current penalty for one name.
    pub fn penalty(&self, pool: PoolType, name: &str, hot: bool) -> f64 {
        let history = self.slot(pool).lock();
        self.curve.multiplier(history.age_of(name), history.window(), hot)
    }

    /// Lock every pool for a plan-then-commit sequence.
    pub fn begin(&self) -> LedgerTxn<'_> {
        LedgerTxn {
            core: self.core.lock(),
            highlight: self.highlight.lock(),
            generational: self.generational.lock(),
            curve: &self.curve,
        }
    }

    /// Detached copy of all pools.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let txn = self.begin();
        LedgerSnapshot {
            core: txn.core.clone(),
            highlight: txn.highlight.clone(),
            generational: txn.generational.clone(),
            curve: self.curve,
        }
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        PoolType::all()
            .into_iter()
            .map(|pool| {
                let history = self.slot(pool).lock();
                PoolStats {
                    pool,
                    len: history.len(),
                    window: history.window(),
                }
            })
            .collect()
    }
}

impl Default for RotationLedger {
    fn default() -> Self {
        Self::new(&RotationSettings::default())
    }
}

// ─────────────────────────────────────────────────────────────────
// Transaction
// ─────────────────────────────────────────────────────────────────

/// Exclusive hold on every pool. Dropping without [`LedgerTxn::commit`]
/// leaves the ledger unchanged.
pub struct LedgerTxn<'a> {
    core: MutexGuard<'a, RotationHistory>,
    highlight: MutexGuard<'a, RotationHistory>,
    generational: MutexGuard<'a, RotationHistory>,
    curve: &'a PenaltyCurve,
}

impl LedgerTxn<'_> {
    fn history(&self, pool: PoolType) -> &RotationHistory {
        match pool {
            PoolType::Core => &*self.core,
            PoolType::Highlight => &*self.highlight,
            PoolType::Generational => &*self.generational,
        }
    }

    fn history_mut(&mut self, pool: PoolType) -> &mut RotationHistory {
        match pool {
            PoolType::Core => &mut *self.core,
            PoolType::Highlight => &mut *self.highlight,
            PoolType::Generational => &mut *self.generational,
        }
    }

    /// Append the plan's picks and release the locks.
    pub fn commit(mut self, commit: &RotationCommit) {
        for pool in PoolType::all() {
            let history = self.history_mut(pool);
            for name in commit.entries(pool) {
                history.record(name);
            }
        }
        debug!(
            core = commit.core.len(),
            highlight = commit.highlight.len(),
            generational = commit.generational.len(),
            "Rotation committed"
        );
    }
}

impl RecencyView for LedgerTxn<'_> {
    fn penalty(&self, pool: PoolType, name: &str, hot: bool) -> f64 {
        let history = self.history(pool);
        self.curve.multiplier(history.age_of(name), history.window(), hot)
    }
}

// ─────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────

/// Owned, unshared copy of the ledger state.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    core: RotationHistory,
    highlight: RotationHistory,
    generational: RotationHistory,
    curve: PenaltyCurve,
}

impl LedgerSnapshot {
    /// Empty histories sized per settings.
    pub fn empty(settings: &RotationSettings) -> Self {
        Self {
            core: RotationHistory::new(settings.core_window),
            highlight: RotationHistory::new(settings.highlight_window),
            generational: RotationHistory::new(settings.generational_window),
            curve: PenaltyCurve::from_settings(settings),
        }
    }

    fn history(&self, pool: PoolType) -> &RotationHistory {
        match pool {
            PoolType::Core => &self.core,
            PoolType::Highlight => &self.highlight,
            PoolType::Generational => &self.generational,
        }
    }

    pub fn record(&mut self, pool: PoolType, name: &str) {
        match pool {
            PoolType::Core => self.core.record(name),
            PoolType::Highlight => self.highlight.record(name),
            PoolType::Generational => self.generational.record(name),
        };
    }

    pub fn apply(&mut self, commit: &RotationCommit) {
        for pool in PoolType::all() {
            for name in commit.entries(pool) {
                self.record(pool, name);
            }
        }
    }

    pub fn len(&self, pool: PoolType) -> usize {
        self.history(pool).len()
    }
}

impl RecencyView for LedgerSnapshot {
    fn penalty(&self, pool: PoolType, name: &str, hot: bool) -> f64 {
        let history = self.history(pool);
        self.curve.multiplier(history.age_of(name), history.window(), hot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RotationSettings {
        RotationSettings {
            core_window: 4,
            highlight_window: 3,
            generational_window: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_pools_are_independent() {
        let ledger = RotationLedger::new(&settings());
        ledger.record(PoolType::Core, "Planner");

        assert!(ledger.penalty(PoolType::Core, "Planner", false) < 1.0);
        assert_eq!(ledger.penalty(PoolType::Highlight, "Planner", false), 1.0);
        assert_eq!(ledger.penalty(PoolType::Generational, "Planner", false), 1.0);
    }

    #[test]
    fn test_txn_commit_applies() {
        let ledger = RotationLedger::new(&settings());
        let txn = ledger.begin();
        assert_eq!(txn.penalty(PoolType::Core, "Chef", false), 1.0);

        let mut commit = RotationCommit::default();
        commit.push(PoolType::Core, "Chef");
        commit.push(PoolType::Generational, "Gen Z\u{2013}Gossip");
        txn.commit(&commit);

        assert!(ledger.penalty(PoolType::Core, "Chef", false) < 1.0);
        assert!(ledger.penalty(PoolType::Generational, "Gen Z\u{2013}Gossip", false) < 1.0);
    }

    #[test]
    fn test_txn_drop_discards() {
        let ledger = RotationLedger::new(&settings());
        {
            let _txn = ledger.begin();
        }
        assert!(ledger.stats().iter().all(|s| s.len == 0));
    }

    #[test]
    fn test_snapshot_detached() {
        let ledger = RotationLedger::new(&settings());
        ledger.record(PoolType::Highlight, "Gamer");
        let mut snapshot = ledger.snapshot();
        snapshot.record(PoolType::Highlight, "Creator");

        assert_eq!(snapshot.len(PoolType::Highlight), 2);
        assert_eq!(ledger.penalty(PoolType::Highlight, "Creator", false), 1.0);
    }

    #[test]
    fn test_window_eviction_restores_weight() {
        let ledger = RotationLedger::new(&settings());
        ledger.record(PoolType::Generational, "a");
        ledger.record(PoolType::Generational, "b");
        ledger.record(PoolType::Generational, "c");
        assert_eq!(ledger.penalty(PoolType::Generational, "a", false), 1.0);
    }

    #[test]
    fn test_commit_len() {
        let mut commit = RotationCommit::default();
        assert!(commit.is_empty());
        commit.push(PoolType::Core, "x");
        commit.push(PoolType::Highlight, "x");
        assert_eq!(commit.len(), 2);
        assert_eq!(commit.entries(PoolType::Highlight), ["x".to_string()]);
    }

    #[test]
    fn test_stats_report_windows() {
        let ledger = RotationLedger::new(&settings());
        let stats = ledger.stats();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].window, 4);
        assert_eq!(stats[2].window, 2);
    }
}
