//! Pure request planning over a frozen recency view.
//!
//! Nothing here touches shared state: the plan carries the rotation commit
//! the caller applies once it decides to keep the result.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::generational::{generational_highlights, pick_generational};
use super::highlights::{select_core_highlights, HighlightRules};
use super::insights::{select_insights, BandAssigner};
use super::overlays::resolve_overlays;
use super::portfolio::build_portfolio;
use super::types::{GovernanceRequest, GovernedProgram, Highlight};
use super::validate::CategoryScope;
use crate::config::{GovernanceSettings, MAX_TARGET_COUNT};
use crate::error::{Error, Result};
use crate::rotation::{PoolType, RecencyView, RotationCommit};
use crate::taxonomy::Taxonomy;

/// A fully shaped program plus the rotation records it implies.
#[derive(Debug, Clone)]
pub struct Plan {
    pub program: GovernedProgram,
    pub commit: RotationCommit,
}

/// Run validate, build, generational, highlights, insights and overlays.
pub fn plan<V: RecencyView + ?Sized>(
    taxonomy: &Taxonomy,
    settings: &GovernanceSettings,
    bands: &BandAssigner,
    view: &V,
    request: &GovernanceRequest,
) -> Result<Plan> {
    let target = request.target_count.unwrap_or(settings.target_count);
    if target == 0 || target > MAX_TARGET_COUNT {
        return Err(Error::invalid_request(format!(
            "targetCount must be between 1 and {}, got {}",
            MAX_TARGET_COUNT, target
        )));
    }

    let scope = CategoryScope::resolve(
        taxonomy,
        request.category,
        request.brand_key.as_deref(),
        request.partner_category,
    );

    let build = build_portfolio(
        taxonomy,
        &scope,
        view,
        &request.candidate_names,
        target,
        settings.phylum_cap(target),
    );
    if build.items.is_empty() {
        return Err(Error::PoolExhausted {
            category: request.category,
            requested: target,
        });
    }
    let shortfall = build.shortfall();
    if let Some(short) = shortfall {
        warn!(
            category = %request.category,
            requested = short.requested,
            delivered = short.delivered,
            "Portfolio short of target"
        );
    }

    let generational = pick_generational(taxonomy, view, &request.generational_candidates);

    let core_highlights = select_core_highlights(
        taxonomy,
        &scope,
        view,
        &build.items,
        HighlightRules {
            count: settings.highlight_count,
            hot_cap: settings.hot_highlight_cap(request.category),
        },
    );
    let generational_highlighted =
        generational_highlights(view, &generational, &request.highlight_cohorts);

    let highlights: Vec<Highlight> = core_highlights
        .iter()
        .map(|e| Highlight::core(&e.name))
        .chain(generational_highlighted.iter().map(|g| Highlight::generational(&g.name)))
        .collect();
    let highlight_names: Vec<&str> = highlights.iter().map(|h| h.name.as_str()).collect();

    let insights = select_insights(
        taxonomy,
        &scope,
        view,
        &build.items,
        &highlight_names,
        settings.insight_count,
        bands,
    );

    let overlays = resolve_overlays(taxonomy, &request.requested_overlays)?;

    let mut commit = RotationCommit::default();
    for entry in &build.items {
        commit.push(PoolType::Core, &entry.name);
    }
    for entry in &core_highlights {
        commit.push(PoolType::Highlight, &entry.name);
    }
    for pick in &generational {
        commit.push(PoolType::Generational, &pick.name);
    }

    debug!(
        category = %request.category,
        dual = scope.is_dual(),
        core = build.items.len(),
        backfilled = build.backfilled,
        rejected = build.rejected.len(),
        highlights = highlights.len(),
        insights = insights.len(),
        "Plan ready"
    );

    let program = GovernedProgram {
        request_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        category: request.category,
        anchors: scope.anchors(taxonomy, settings.max_anchors),
        portfolio: build.items,
        generational,
        highlights,
        insights,
        overlays,
        rejected: build.rejected,
        shortfall,
    };

    Ok(Plan { program, commit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotationSettings;
    use crate::governance::types::HighlightKind;
    use crate::rotation::LedgerSnapshot;
    use crate::taxonomy::{Category, Cohort, Labelled};

    fn run(request: &GovernanceRequest) -> Result<Plan> {
        let tax = Taxonomy::bundled().unwrap();
        let view = LedgerSnapshot::empty(&RotationSettings::default());
        plan(
            &tax,
            &GovernanceSettings::default(),
            &BandAssigner::default(),
            &view,
            request,
        )
    }

    #[test]
    fn test_plan_shape() {
        let plan = run(&GovernanceRequest::new(Category::Cpg)).unwrap();
        let program = &plan.program;
        assert_eq!(program.portfolio.len(), 15);
        assert_eq!(program.anchors, vec!["RJM CPG".to_string()]);
        assert_eq!(program.generational.len(), 4);
        assert_eq!(program.highlights.len(), 4);
        assert_eq!(
            program
                .highlights
                .iter()
                .filter(|h| h.kind == HighlightKind::Generational)
                .count(),
            1
        );
        assert_eq!(program.insights.len(), 2);
        assert!(program.overlays.is_none());
        assert!(program.shortfall.is_none());

        assert_eq!(plan.commit.core.len(), 15);
        assert_eq!(plan.commit.highlight.len(), 3);
        assert_eq!(plan.commit.generational.len(), 4);
    }

    #[test]
    fn test_highlight_cohorts_widen_highlight_set() {
        let request = GovernanceRequest::new(Category::Auto)
            .with_highlight_cohorts(vec![Cohort::GenZ, Cohort::GenX, Cohort::Boomer]);
        let plan = run(&request).unwrap();
        assert_eq!(plan.program.highlights.len(), 6);
    }

    #[test]
    fn test_invalid_target_rejected() {
        let err = run(&GovernanceRequest::new(Category::Cpg).with_target(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        let err = run(&GovernanceRequest::new(Category::Cpg).with_target(MAX_TARGET_COUNT + 1))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_travel_caps_hot_highlights_at_one() {
        let tax = Taxonomy::bundled().unwrap();
        let hot: Vec<String> = tax
            .hot_items(Category::TravelHospitality)
            .into_iter()
            .map(str::to_string)
            .collect();
        let request = GovernanceRequest::new(Category::TravelHospitality).with_candidates(hot);
        let plan = run(&request).unwrap();
        let hot_highlights = plan
            .program
            .highlights
            .iter()
            .filter(|h| tax.is_hot(Category::TravelHospitality, &h.name))
            .count();
        assert_eq!(hot_highlights, 1);
    }

    fn empty_pool_canon() -> String {
        let mut text = String::from(
            "[meta]\nname = \"empty\"\nversion = \"1\"\n\n[phyla]\n\"Solo\" = [\"Loner\"]\n",
        );
        for cohort in Cohort::all() {
            text.push_str(&format!(
                "\n[cohorts.\"{}\"]\nsegments = [{}]\n",
                cohort.label(),
                (1..=8)
                    .map(|n| format!("{{ name = \"S{}\" }}", n))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        for category in Category::all() {
            text.push_str(&format!(
                "\n[categories.\"{}\"]\nanchors = [\"RJM {}\"]\npool = []\n",
                category.label(),
                category.label()
            ));
        }
        text
    }

    #[test]
    fn test_empty_pool_is_pool_exhausted() {
        let tax = Taxonomy::from_toml_str(&empty_pool_canon()).unwrap();
        let view = LedgerSnapshot::empty(&RotationSettings::default());
        let err = plan(
            &tax,
            &GovernanceSettings::default(),
            &BandAssigner::default(),
            &view,
            &GovernanceRequest::new(Category::Auto).with_candidates(["Loner"]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::PoolExhausted {
                category: Category::Auto,
                requested: 15
            }
        ));
    }

    #[test]
    fn test_short_pool_is_degraded_not_error() {
        let tax = Taxonomy::bundled().unwrap();
        let view = LedgerSnapshot::empty(&RotationSettings::default());
        let pool_len = tax.pool_len(Category::HealthPharma);
        let plan = plan(
            &tax,
            &GovernanceSettings::default(),
            &BandAssigner::default(),
            &view,
            &GovernanceRequest::new(Category::HealthPharma).with_target(pool_len + 5),
        )
        .unwrap();
        let short = plan.program.shortfall.unwrap();
        assert_eq!(short.requested, pool_len + 5);
        assert!(short.delivered < short.requested);
        assert_eq!(short.delivered, plan.program.portfolio.len());
    }
}
