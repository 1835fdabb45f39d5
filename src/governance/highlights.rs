//! Core highlight selection.

use super::portfolio::rank_by;
use super::types::PortfolioEntry;
use super::validate::CategoryScope;
use crate::rotation::{PoolType, RecencyView};
use crate::taxonomy::Taxonomy;

/// Leading highlights that must come from distinct phyla.
const DISTINCT_PHYLUM_LEAD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRules {
    pub count: usize,
    pub hot_cap: usize,
}

/// Pick core highlights from a built portfolio.
///
/// Entries are ranked by highlight-pool penalty (portfolio order on ties).
/// The first pass keeps the leading picks on distinct phyla; a second pass
/// fills any gap without that rule. The hot-item cap holds in both passes.
pub fn select_core_highlights<V: RecencyView + ?Sized>(
    taxonomy: &Taxonomy,
    scope: &CategoryScope,
    view: &V,
    portfolio: &[PortfolioEntry],
    rules: HighlightRules,
) -> Vec<PortfolioEntry> {
    let ranked = rank_by(portfolio.iter().collect(), |entry: &&PortfolioEntry| {
        view.penalty(
            PoolType::Highlight,
            &entry.name,
            scope.is_hot(taxonomy, &entry.name),
        )
    });

    let mut chosen: Vec<&PortfolioEntry> = Vec::with_capacity(rules.count);
    let mut hot_used = 0;
    for distinct_phyla in [true, false] {
        for entry in ranked.iter().copied() {
            if chosen.len() >= rules.count {
                break;
            }
            if chosen.iter().any(|c| c.name == entry.name) {
                continue;
            }
            let hot = scope.is_hot(taxonomy, &entry.name);
            if hot && hot_used >= rules.hot_cap {
                continue;
            }
            if distinct_phyla
                && chosen.len() < DISTINCT_PHYLUM_LEAD
                && chosen.iter().any(|c| c.phylum == entry.phylum)
            {
                continue;
            }
            if hot {
                hot_used += 1;
            }
            chosen.push(entry);
        }
    }

    chosen.into_iter().cloned().collect()
}
