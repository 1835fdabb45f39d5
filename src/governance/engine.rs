//! Governance engine: the request-facing entry point.
//!
//! The engine itself holds no per-request state. Each operation takes the
//! ledger's pool locks, plans against that frozen view and commits the
//! resulting rotation records only when the operation succeeds.

use std::sync::Arc;

use tracing::{debug, info, info_span};

use super::generational::{generational_highlights, pick_generational};
use super::highlights::{select_core_highlights, HighlightRules};
use super::insights::{select_insights, BandAssigner};
use super::planner::{plan, Plan};
use super::portfolio::{build_portfolio, PortfolioBuild};
use super::types::{
    GovernanceRequest, GovernedProgram, Highlight, Insight, PortfolioEntry, ValidationResult,
};
use super::validate::{validate, CategoryScope};
use crate::config::{GovernanceSettings, GovernorConfig, MAX_TARGET_COUNT};
use crate::error::{Error, Result};
use crate::rotation::{PoolType, RotationCommit, RotationLedger};
use crate::taxonomy::{Category, Cohort, Taxonomy};

/// Validates, builds and shapes persona programs against a shared taxonomy
/// and rotation ledger.
#[derive(Debug, Clone)]
pub struct GovernanceEngine {
    taxonomy: Arc<Taxonomy>,
    ledger: Arc<RotationLedger>,
    settings: GovernanceSettings,
    bands: BandAssigner,
}

impl GovernanceEngine {
    pub fn new(taxonomy: Arc<Taxonomy>, ledger: Arc<RotationLedger>, config: &GovernorConfig) -> Self {
        Self {
            taxonomy,
            ledger,
            settings: config.governance.clone(),
            bands: BandAssigner::from_settings(&config.insights),
        }
    }

    /// Check the configuration, load the configured taxonomy and start
    /// with an empty ledger.
    pub fn from_config(config: &GovernorConfig) -> Result<Self> {
        config.validate()?;
        let taxonomy = Taxonomy::load_or_bundled(config.taxonomy.path.as_deref())?;
        let ledger = RotationLedger::new(&config.rotation);
        Ok(Self::new(Arc::new(taxonomy), Arc::new(ledger), config))
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    pub fn ledger(&self) -> &Arc<RotationLedger> {
        &self.ledger
    }

    pub fn settings(&self) -> &GovernanceSettings {
        &self.settings
    }

    // ─────────────────────────────────────────────────────────────
    // Single Operations
    // ─────────────────────────────────────────────────────────────

    /// Validate one name for a single category.
    pub fn validate(&self, name: &str, category: Category) -> ValidationResult {
        validate(&self.taxonomy, &CategoryScope::single(category), name)
    }

    /// Validate one name, widening eligibility for a dual-anchor brand.
    pub fn validate_for_brand(
        &self,
        name: &str,
        category: Category,
        brand: Option<&str>,
    ) -> ValidationResult {
        validate(&self.taxonomy, &self.scope(category, brand), name)
    }

    fn scope(&self, category: Category, brand: Option<&str>) -> CategoryScope {
        CategoryScope::resolve(&self.taxonomy, category, brand, None)
    }

    /// Build a core portfolio and record it in the core pool.
    ///
    /// A short build is returned as-is; only an empty one is an error.
    pub fn build_portfolio(
        &self,
        category: Category,
        candidates: &[String],
        target: usize,
    ) -> Result<PortfolioBuild> {
        self.build_portfolio_for_brand(category, None, candidates, target)
    }

    /// [`build_portfolio`](Self::build_portfolio) drawing from every pool
    /// of a dual-anchor brand.
    pub fn build_portfolio_for_brand(
        &self,
        category: Category,
        brand: Option<&str>,
        candidates: &[String],
        target: usize,
    ) -> Result<PortfolioBuild> {
        if target == 0 || target > MAX_TARGET_COUNT {
            return Err(Error::invalid_request(format!(
                "target must be between 1 and {}, got {}",
                MAX_TARGET_COUNT, target
            )));
        }
        let scope = self.scope(category, brand);
        let txn = self.ledger.begin();
        let build = build_portfolio(
            &self.taxonomy,
            &scope,
            &txn,
            candidates,
            target,
            self.settings.phylum_cap(target),
        );
        if build.items.is_empty() {
            return Err(Error::PoolExhausted {
                category,
                requested: target,
            });
        }

        let mut commit = RotationCommit::default();
        for entry in &build.items {
            commit.push(PoolType::Core, &entry.name);
        }
        txn.commit(&commit);
        Ok(build)
    }

    /// Pick core highlights plus generational highlights and record them.
    pub fn select_highlights(
        &self,
        category: Category,
        portfolio: &[PortfolioEntry],
        cohorts: &[Cohort],
    ) -> Vec<Highlight> {
        self.select_highlights_for_brand(category, None, portfolio, cohorts)
    }

    /// Highlights where hotness counts under every pool of the brand.
    pub fn select_highlights_for_brand(
        &self,
        category: Category,
        brand: Option<&str>,
        portfolio: &[PortfolioEntry],
        cohorts: &[Cohort],
    ) -> Vec<Highlight> {
        let scope = self.scope(category, brand);
        let txn = self.ledger.begin();
        let core = select_core_highlights(
            &self.taxonomy,
            &scope,
            &txn,
            portfolio,
            HighlightRules {
                count: self.settings.highlight_count,
                hot_cap: self.settings.hot_highlight_cap(category),
            },
        );
        let picks = pick_generational(&self.taxonomy, &txn, &[]);
        let generational = generational_highlights(&txn, &picks, cohorts);

        let mut commit = RotationCommit::default();
        for entry in &core {
            commit.push(PoolType::Highlight, &entry.name);
        }
        for pick in &generational {
            commit.push(PoolType::Generational, &pick.name);
        }
        txn.commit(&commit);

        core.iter()
            .map(|e| Highlight::core(&e.name))
            .chain(generational.iter().map(|g| Highlight::generational(&g.name)))
            .collect()
    }

    /// Pick insight items disjoint from `highlights`. Read-only.
    pub fn select_insights(
        &self,
        category: Category,
        portfolio: &[PortfolioEntry],
        highlights: &[Highlight],
        count: usize,
    ) -> Vec<Insight> {
        self.select_insights_for_brand(category, None, portfolio, highlights, count)
    }

    pub fn select_insights_for_brand(
        &self,
        category: Category,
        brand: Option<&str>,
        portfolio: &[PortfolioEntry],
        highlights: &[Highlight],
        count: usize,
    ) -> Vec<Insight> {
        let scope = self.scope(category, brand);
        let names: Vec<&str> = highlights.iter().map(|h| h.name.as_str()).collect();
        let txn = self.ledger.begin();
        select_insights(
            &self.taxonomy,
            &scope,
            &txn,
            portfolio,
            &names,
            count,
            &self.bands,
        )
    }

    // ─────────────────────────────────────────────────────────────
    // Full Pipeline
    // ─────────────────────────────────────────────────────────────

    /// Plan without committing, against the ledger's current state.
    pub fn preview(&self, request: &GovernanceRequest) -> Result<Plan> {
        let txn = self.ledger.begin();
        plan(&self.taxonomy, &self.settings, &self.bands, &txn, request)
    }

    /// Run the full pipeline and commit its rotation records.
    ///
    /// Pool locks are held from planning through commit, so concurrent
    /// requests never plan against a state another request is about to
    /// change. On error the ledger is left untouched.
    pub fn govern(&self, request: &GovernanceRequest) -> Result<GovernedProgram> {
        let _span = info_span!(
            "govern",
            category = %request.category,
            brand = request.brand_key.as_deref().unwrap_or("-"),
            candidates = request.candidate_names.len()
        )
        .entered();
        let txn = self.ledger.begin();
        let Plan { program, commit } =
            plan(&self.taxonomy, &self.settings, &self.bands, &txn, request)?;
        txn.commit(&commit);

        info!(
            request_id = %program.request_id,
            category = %program.category,
            portfolio = program.portfolio.len(),
            anchors = program.anchors.len(),
            highlights = program.highlights.len(),
            insights = program.insights.len(),
            rejected = program.rejected.len(),
            "Program governed"
        );
        for rejected in &program.rejected {
            debug!(
                request_id = %program.request_id,
                candidate = %rejected.name,
                reason = %rejected.reason,
                "Candidate excluded"
            );
        }
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::types::Rejection;

    fn engine() -> GovernanceEngine {
        GovernanceEngine::from_config(&GovernorConfig::default()).unwrap()
    }

    fn total_recorded(engine: &GovernanceEngine) -> usize {
        engine.ledger().stats().iter().map(|s| s.len).sum()
    }

    #[test]
    fn test_validate_single_and_brand() {
        let engine = engine();
        assert!(engine.validate("Bargain Hunter", Category::Cpg).is_ok());
        assert_eq!(
            engine.validate("Bargain Hunter", Category::LuxuryFashion),
            Err(Rejection::CategoryMismatch)
        );
        // L'Oréal spans CPG and Luxury & Fashion.
        assert!(engine
            .validate_for_brand("Bargain Hunter", Category::LuxuryFashion, Some("L'Oréal"))
            .is_ok());
    }

    #[test]
    fn test_build_portfolio_commits_core_only() {
        let engine = engine();
        let build = engine.build_portfolio(Category::Auto, &[], 15).unwrap();
        assert_eq!(build.items.len(), 15);
        let stats = engine.ledger().stats();
        assert_eq!(stats[0].len, 15);
        assert_eq!(stats[1].len, 0);
        assert_eq!(stats[2].len, 0);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = GovernorConfig::default();
        config.insights.min_separation = 15;
        assert!(matches!(
            GovernanceEngine::from_config(&config),
            Err(Error::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_brand_steps_draw_from_brand_pools() {
        let engine = engine();
        let taxonomy = engine.taxonomy().clone();
        let brand_only: Vec<String> = taxonomy
            .pool(Category::RetailECommerce)
            .filter(|name| !taxonomy.in_pool(Category::Cpg, name))
            .take(3)
            .map(str::to_string)
            .collect();
        assert_eq!(brand_only.len(), 3);

        let plain = engine.build_portfolio(Category::Cpg, &brand_only, 15).unwrap();
        assert_eq!(plain.rejected.len(), 3);

        let build = engine
            .build_portfolio_for_brand(Category::Cpg, Some("Nike"), &brand_only, 15)
            .unwrap();
        assert!(build.rejected.is_empty());
        for name in &brand_only {
            assert!(build.items.iter().any(|e| &e.name == name));
        }

        let highlights =
            engine.select_highlights_for_brand(Category::Cpg, Some("Nike"), &build.items, &[]);
        let insights = engine.select_insights_for_brand(
            Category::Cpg,
            Some("Nike"),
            &build.items,
            &highlights,
            2,
        );
        assert_eq!(insights.len(), 2);
        for insight in &insights {
            assert!(highlights.iter().all(|h| h.name != insight.name));
        }
    }

    #[test]
    fn test_build_portfolio_rejects_zero_target() {
        let engine = engine();
        assert!(engine.build_portfolio(Category::Auto, &[], 0).is_err());
        assert_eq!(total_recorded(&engine), 0);
    }

    #[test]
    fn test_select_highlights_twice_rotates_top_pick() {
        let engine = engine();
        let build = engine.build_portfolio(Category::Cpg, &[], 15).unwrap();

        let first = engine.select_highlights(Category::Cpg, &build.items, &[]);
        let second = engine.select_highlights(Category::Cpg, &build.items, &[]);
        assert_eq!(first.len(), 4);
        assert_ne!(first[0].name, second[0].name);
        assert_ne!(first[3].name, second[3].name);
    }

    #[test]
    fn test_select_insights_is_read_only() {
        let engine = engine();
        let build = engine.build_portfolio(Category::Cpg, &[], 15).unwrap();
        let highlights = engine.select_highlights(Category::Cpg, &build.items, &[]);
        let before = total_recorded(&engine);

        let insights = engine.select_insights(Category::Cpg, &build.items, &highlights, 2);
        assert_eq!(insights.len(), 2);
        for insight in &insights {
            assert!(highlights.iter().all(|h| h.name != insight.name));
        }
        assert_eq!(total_recorded(&engine), before);
    }

    #[test]
    fn test_govern_commits_and_failure_does_not() {
        let engine = engine();
        let bad = GovernanceRequest::new(Category::Cpg).with_target(0);
        assert!(engine.govern(&bad).is_err());
        assert_eq!(total_recorded(&engine), 0);

        let program = engine.govern(&GovernanceRequest::new(Category::Cpg)).unwrap();
        assert_eq!(program.portfolio.len(), 15);
        let stats = engine.ledger().stats();
        assert_eq!(stats[0].len, 15);
        assert_eq!(stats[1].len, 3);
        assert_eq!(stats[2].len, 4);
    }

    #[test]
    fn test_preview_does_not_commit() {
        let engine = engine();
        let plan = engine.preview(&GovernanceRequest::new(Category::Qsr)).unwrap();
        assert_eq!(plan.program.anchors.len(), 2);
        assert_eq!(total_recorded(&engine), 0);
    }
}
