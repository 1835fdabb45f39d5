//! Core portfolio assembly: validate, rank, backfill under the phylum cap.

use std::collections::HashMap;

use tracing::debug;

use super::types::{PortfolioEntry, RejectedCandidate, Shortfall, ValidatedItem};
use super::validate::{validate, CategoryScope};
use crate::rotation::{PoolType, RecencyView};
use crate::taxonomy::Taxonomy;

/// Stable sort by descending weight; equal weights keep their input order.
pub(crate) fn rank_by<T>(items: Vec<T>, weight: impl Fn(&T) -> f64) -> Vec<T> {
    let mut weighted: Vec<(f64, T)> = items.into_iter().map(|i| (weight(&i), i)).collect();
    weighted.sort_by(|a, b| b.0.total_cmp(&a.0));
    weighted.into_iter().map(|(_, item)| item).collect()
}

/// Result of one portfolio build.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioBuild {
    pub items: Vec<PortfolioEntry>,
    pub rejected: Vec<RejectedCandidate>,
    pub requested: usize,
    /// Items that came from the pool rather than the candidate list
    pub backfilled: usize,
}

impl PortfolioBuild {
    pub fn is_short(&self) -> bool {
        self.items.len() < self.requested
    }

    pub fn shortfall(&self) -> Option<Shortfall> {
        self.is_short().then(|| Shortfall {
            requested: self.requested,
            delivered: self.items.len(),
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Accepts items until the target is met, refusing any item whose phylum
/// already holds `cap` slots.
struct DiversitySelector {
    target: usize,
    cap: usize,
    picked: Vec<PortfolioEntry>,
    per_phylum: HashMap<String, usize>,
}

impl DiversitySelector {
    fn new(target: usize, cap: usize) -> Self {
        Self {
            target,
            cap,
            picked: Vec::with_capacity(target),
            per_phylum: HashMap::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.picked.len() >= self.target
    }

    fn contains(&self, name: &str) -> bool {
        self.picked.iter().any(|e| e.name == name)
    }

    fn offer(&mut self, item: ValidatedItem) -> bool {
        if self.is_full() || self.contains(&item.name) {
            return false;
        }
        let used = self.per_phylum.get(&item.phylum).copied().unwrap_or(0);
        if used >= self.cap {
            return false;
        }
        self.per_phylum.insert(item.phylum.clone(), used + 1);
        self.picked.push(item.into());
        true
    }

    fn fill(&mut self, ranked: Vec<ValidatedItem>) {
        for item in ranked {
            if self.is_full() {
                break;
            }
            self.offer(item);
        }
    }
}

/// Greedy portfolio build over a frozen recency view.
///
/// Valid candidates are taken first, best core weight first. Any gap is then
/// backfilled from the scope's pool the same way, with ties resolved by canon
/// order. Weight is the core-pool rotation penalty; the phylum cap is a hard
/// exclusion applied as items are accepted.
pub fn build_portfolio<V: RecencyView + ?Sized>(
    taxonomy: &Taxonomy,
    scope: &CategoryScope,
    view: &V,
    candidates: &[String],
    target: usize,
    phylum_cap: usize,
) -> PortfolioBuild {
    let weight = |item: &ValidatedItem| {
        view.penalty(PoolType::Core, &item.name, scope.is_hot(taxonomy, &item.name))
    };

    let mut validated: Vec<ValidatedItem> = Vec::new();
    let mut rejected = Vec::new();
    for name in candidates {
        match validate(taxonomy, scope, name) {
            Ok(item) => {
                if !validated.iter().any(|v| v.name == item.name) {
                    validated.push(item);
                }
            }
            Err(rejection) => {
                debug!(candidate = %name, reason = %rejection, "Candidate rejected");
                rejected.push(RejectedCandidate::new(name.trim(), &rejection));
            }
        }
    }

    let mut selector = DiversitySelector::new(target, phylum_cap);
    selector.fill(rank_by(validated, &weight));
    let from_candidates = selector.picked.len();

    if !selector.is_full() {
        let backfill: Vec<ValidatedItem> = scope
            .pool(taxonomy)
            .into_iter()
            .filter(|name| !selector.contains(name))
            .filter_map(|name| {
                taxonomy.phylum_of(name).map(|phylum| ValidatedItem {
                    name: name.to_string(),
                    phylum: phylum.to_string(),
                })
            })
            .collect();
        selector.fill(rank_by(backfill, &weight));
    }

    let items = selector.picked;
    PortfolioBuild {
        backfilled: items.len() - from_candidates,
        items,
        rejected,
        requested: target,
    }
}
