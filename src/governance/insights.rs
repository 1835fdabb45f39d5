//! Insight selection and percentage bands.

use sha2::{Digest, Sha256};

use super::portfolio::rank_by;
use super::types::{BandTier, Insight, PortfolioEntry};
use super::validate::CategoryScope;
use crate::config::InsightSettings;
use crate::rotation::{PoolType, RecencyView};
use crate::taxonomy::Taxonomy;

/// Assigns high/low percentage bands.
///
/// Fixed values come from configuration; unset values are derived from the
/// SHA-256 of the item name so the same item always lands on the same band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandAssigner {
    high_range: (u8, u8),
    low_range: (u8, u8),
    min_separation: u8,
    high: Option<u8>,
    low: Option<u8>,
}

impl BandAssigner {
    pub fn from_settings(settings: &InsightSettings) -> Self {
        Self {
            high_range: (settings.high_range[0], settings.high_range[1]),
            low_range: (settings.low_range[0], settings.low_range[1]),
            min_separation: settings.min_separation,
            high: settings.high,
            low: settings.low,
        }
    }

    fn sample(name: &str, (lo, hi): (u8, u8)) -> u8 {
        let digest = Sha256::digest(name.as_bytes());
        let span = u16::from(hi.saturating_sub(lo)) + 1;
        lo + (u16::from(digest[0]) % span) as u8
    }

    pub fn high_band(&self, name: &str) -> u8 {
        self.high
            .unwrap_or_else(|| Self::sample(name, self.high_range))
    }

    /// Low band for `name`, lowered (never below the low floor) until it sits
    /// at least `min_separation` under `high`.
    pub fn low_band(&self, name: &str, high: u8) -> u8 {
        let low = self.low.unwrap_or_else(|| Self::sample(name, self.low_range));
        let ceiling = high.saturating_sub(self.min_separation);
        if low > ceiling {
            ceiling.max(self.low_range.0)
        } else {
            low
        }
    }

    /// First name gets the high band, the rest low bands.
    pub fn assign(&self, names: &[&str]) -> Vec<Insight> {
        let Some((first, rest)) = names.split_first() else {
            return Vec::new();
        };
        let high = self.high_band(first);
        let mut insights = vec![Insight {
            name: first.to_string(),
            band: high,
            tier: BandTier::High,
        }];
        insights.extend(rest.iter().map(|name| Insight {
            name: name.to_string(),
            band: self.low_band(name, high),
            tier: BandTier::Low,
        }));
        insights
    }
}

impl Default for BandAssigner {
    fn default() -> Self {
        Self::from_settings(&InsightSettings::default())
    }
}

/// Pick insight items from the portfolio, never touching the highlight set.
///
/// Returns fewer than `count` items when the highlight set leaves too few
/// eligible entries.
pub fn select_insights<V: RecencyView + ?Sized>(
    taxonomy: &Taxonomy,
    scope: &CategoryScope,
    view: &V,
    portfolio: &[PortfolioEntry],
    highlight_names: &[&str],
    count: usize,
    bands: &BandAssigner,
) -> Vec<Insight> {
    let eligible: Vec<&PortfolioEntry> = portfolio
        .iter()
        .filter(|e| !highlight_names.contains(&e.name.as_str()))
        .collect();
    let ranked = rank_by(eligible, |entry: &&PortfolioEntry| {
        view.penalty(
            PoolType::Highlight,
            &entry.name,
            scope.is_hot(taxonomy, &entry.name),
        )
    });
    let names: Vec<&str> = ranked
        .iter()
        .take(count)
        .map(|e| e.name.as_str())
        .collect();
    bands.assign(&names)
}
