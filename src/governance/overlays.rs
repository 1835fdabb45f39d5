//! Cultural and geographic overlays, attached only on explicit request.

use tracing::warn;

use super::types::{OverlayRequest, Overlays};
use crate::error::Result;
use crate::taxonomy::{Labelled, Lineage, Region, Taxonomy};

/// Resolve the requested overlays; `None` when nothing was asked for.
pub fn resolve_overlays(taxonomy: &Taxonomy, request: &OverlayRequest) -> Result<Option<Overlays>> {
    if !request.wants_any() {
        return Ok(None);
    }

    let cultural = if request.wants_cultural() {
        cultural_overlay(taxonomy, request.lineage.as_deref())?
    } else {
        Vec::new()
    };
    let geographic = if request.wants_geographic() {
        geographic_overlay(taxonomy, &request.markets)
    } else {
        Vec::new()
    };

    Ok(Some(Overlays {
        cultural,
        geographic,
    }))
}

/// All expressions of one lineage, or the lead expression of every lineage.
fn cultural_overlay(taxonomy: &Taxonomy, lineage: Option<&str>) -> Result<Vec<String>> {
    let names = match lineage {
        Some(label) => {
            let lineage: Lineage = label.parse()?;
            taxonomy
                .expressions(lineage)
                .iter()
                .map(|e| e.name.clone())
                .collect()
        }
        None => Lineage::all()
            .iter()
            .filter_map(|l| taxonomy.expressions(*l).first())
            .map(|e| e.name.clone())
            .collect(),
    };
    Ok(names)
}

/// Region hints expand to every market of the region; other hints match
/// markets by name. No hints yields the lead market of every region.
fn geographic_overlay(taxonomy: &Taxonomy, hints: &[String]) -> Vec<String> {
    let mut markets: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !markets.iter().any(|m| m == name) {
            markets.push(name.to_string());
        }
    };

    if hints.is_empty() {
        for region in Region::all() {
            if let Some(first) = taxonomy.markets(*region).first() {
                push(first);
            }
        }
    }

    for hint in hints {
        if let Some(region) = Region::from_label(hint) {
            for market in taxonomy.markets(region) {
                push(market);
            }
        } else {
            let found = taxonomy.find_markets(hint);
            if found.is_empty() {
                warn!(hint = %hint, "Market hint matched nothing");
            }
            for market in found {
                push(market);
            }
        }
    }

    markets
}
