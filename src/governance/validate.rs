//! Candidate validation against the taxonomy.

use tracing::debug;

use super::types::{Rejection, ValidatedItem, ValidationResult};
use crate::taxonomy::{Category, Taxonomy};

/// Categories one request may draw from: the primary plus every category
/// of a dual-anchor brand (or one explicit partner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScope {
    categories: Vec<Category>,
    /// Categories whose lead anchor labels the output; empty for a plain
    /// single-category request.
    anchored: Vec<Category>,
}

impl CategoryScope {
    pub fn single(primary: Category) -> Self {
        Self {
            categories: vec![primary],
            anchored: Vec::new(),
        }
    }

    /// Resolve the scope for a request. An explicit partner wins over the
    /// brand lookup; brands outside the configured list add nothing.
    ///
    /// A brand's categories are all kept even when the primary is none of
    /// them, and its anchors are the brand's own.
    pub fn resolve(
        taxonomy: &Taxonomy,
        primary: Category,
        brand: Option<&str>,
        partner: Option<Category>,
    ) -> Self {
        let mut anchored: Vec<Category> = match (partner, brand) {
            (Some(partner), _) => vec![primary, partner],
            (None, Some(brand)) => taxonomy.brand_categories(brand).to_vec(),
            (None, None) => Vec::new(),
        };
        if anchored.len() == 1 {
            anchored.insert(0, primary);
        }

        let mut scope = Self::single(primary);
        for category in &anchored {
            if !scope.categories.contains(category) {
                scope.categories.push(*category);
            }
        }
        if scope.is_dual() {
            for category in anchored {
                if !scope.anchored.contains(&category) {
                    scope.anchored.push(category);
                }
            }
            debug!(
                primary = %primary,
                categories = ?scope.categories,
                "Dual-anchor scope"
            );
        }
        scope
    }

    pub fn primary(&self) -> Category {
        self.categories[0]
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_dual(&self) -> bool {
        self.categories.len() > 1
    }

    /// Item is eligible under any active category.
    pub fn contains(&self, taxonomy: &Taxonomy, name: &str) -> bool {
        self.categories.iter().any(|c| taxonomy.in_pool(*c, name))
    }

    /// Item is hot in any active category.
    pub fn is_hot(&self, taxonomy: &Taxonomy, name: &str) -> bool {
        self.categories.iter().any(|c| taxonomy.is_hot(*c, name))
    }

    /// Eligible items: the primary pool in canon order, then each further
    /// category's items not already listed.
    pub fn pool<'t>(&self, taxonomy: &'t Taxonomy) -> Vec<&'t str> {
        let mut pool: Vec<&str> = Vec::new();
        for category in &self.categories {
            for name in taxonomy.pool(*category) {
                if !pool.contains(&name) {
                    pool.push(name);
                }
            }
        }
        pool
    }

    /// Anchor labels to attach. A single category contributes all of its
    /// anchors; a dual scope contributes the lead anchor of each anchored
    /// category.
    pub fn anchors(&self, taxonomy: &Taxonomy, max_anchors: usize) -> Vec<String> {
        let mut anchors: Vec<String> = Vec::new();
        if self.anchored.is_empty() {
            anchors.extend(taxonomy.anchors(self.primary()).iter().cloned());
        } else {
            for category in &self.anchored {
                if let Some(anchor) = taxonomy.anchors(*category).first() {
                    if !anchors.contains(anchor) {
                        anchors.push(anchor.clone());
                    }
                }
            }
        }
        anchors.truncate(max_anchors);
        anchors
    }
}

/// Validate one submitted name.
///
/// Order: blocked list, then resolution (anchor labels and generational
/// segments resolve but are not core items), then pool membership.
pub fn validate(taxonomy: &Taxonomy, scope: &CategoryScope, name: &str) -> ValidationResult {
    let submitted = name.trim();
    if submitted.is_empty() {
        return Err(Rejection::NotFound);
    }

    if let Some(dep) = taxonomy.deprecation(submitted) {
        return Err(Rejection::Deprecated {
            replacement: dep.replacement.clone(),
        });
    }

    let Some(canonical) = taxonomy.resolve(submitted) else {
        if taxonomy.is_anchor_label(submitted) || taxonomy.resolve_segment(submitted).is_some() {
            return Err(Rejection::NotCoreItem);
        }
        return Err(Rejection::NotFound);
    };

    if !scope.contains(taxonomy, canonical) {
        return Err(Rejection::CategoryMismatch);
    }

    let Some(phylum) = taxonomy.phylum_of(canonical) else {
        return Err(Rejection::CategoryMismatch);
    };

    Ok(ValidatedItem {
        name: canonical.to_string(),
        phylum: phylum.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Taxonomy {
        Taxonomy::bundled().unwrap()
    }

    #[test]
    fn test_valid_item_returns_canonical_and_phylum() {
        let tax = taxonomy();
        let scope = CategoryScope::single(Category::Cpg);
        let item = validate(&tax, &scope, "budget minded").unwrap();
        assert_eq!(item.name, "Budget-Minded");
        assert_eq!(Some(item.phylum.as_str()), tax.phylum_of("Budget-Minded"));
    }

    #[test]
    fn test_unknown_and_empty_names() {
        let tax = taxonomy();
        let scope = CategoryScope::single(Category::Cpg);
        assert_eq!(validate(&tax, &scope, "Unknown Thing"), Err(Rejection::NotFound));
        assert_eq!(validate(&tax, &scope, "   "), Err(Rejection::NotFound));
    }

    #[test]
    fn test_deprecated_checked_first() {
        let tax = taxonomy();
        let scope = CategoryScope::single(Category::Cpg);
        assert_eq!(
            validate(&tax, &scope, "Culture Maven"),
            Err(Rejection::Deprecated {
                replacement: Some("Culture Connoisseur".to_string())
            })
        );
        assert_eq!(
            validate(&tax, &scope, "Party Animal"),
            Err(Rejection::Deprecated { replacement: None })
        );
    }

    #[test]
    fn test_category_mismatch() {
        let tax = taxonomy();
        let scope = CategoryScope::single(Category::LuxuryFashion);
        assert_eq!(
            validate(&tax, &scope, "Bargain Hunter"),
            Err(Rejection::CategoryMismatch)
        );
        // phylum-only item
        assert_eq!(
            validate(&tax, &scope, "Boston Strong"),
            Err(Rejection::CategoryMismatch)
        );
    }

    #[test]
    fn test_anchor_and_segment_are_not_core() {
        let tax = taxonomy();
        let scope = CategoryScope::single(Category::Auto);
        assert_eq!(validate(&tax, &scope, "RJM Auto"), Err(Rejection::NotCoreItem));
        assert_eq!(
            validate(&tax, &scope, "Gen Z - Cloud Life"),
            Err(Rejection::NotCoreItem)
        );
    }

    #[test]
    fn test_dual_scope_widens_eligibility() {
        let tax = taxonomy();
        let single = CategoryScope::single(Category::SportsFitness);
        let dual = CategoryScope::resolve(&tax, Category::SportsFitness, Some("Nike"), None);
        assert!(dual.is_dual());
        assert_eq!(
            dual.categories(),
            [Category::SportsFitness, Category::RetailECommerce]
        );

        let retail_only = tax
            .pool(Category::RetailECommerce)
            .find(|name| !tax.in_pool(Category::SportsFitness, name))
            .unwrap();
        assert_eq!(
            validate(&tax, &single, retail_only),
            Err(Rejection::CategoryMismatch)
        );
        assert!(validate(&tax, &dual, retail_only).is_ok());
    }

    #[test]
    fn test_explicit_partner_overrides_brand() {
        let tax = taxonomy();
        let scope = CategoryScope::resolve(&tax, Category::Cpg, Some("Nike"), Some(Category::HealthPharma));
        assert_eq!(scope.categories(), [Category::Cpg, Category::HealthPharma]);

        let same = CategoryScope::resolve(&tax, Category::Cpg, None, Some(Category::Cpg));
        assert!(!same.is_dual());
    }

    #[test]
    fn test_unknown_brand_stays_single() {
        let tax = taxonomy();
        let scope = CategoryScope::resolve(&tax, Category::Auto, Some("Acme Widgets"), None);
        assert!(!scope.is_dual());
    }

    #[test]
    fn test_anchors_single_and_dual() {
        let tax = taxonomy();
        let qsr = CategoryScope::single(Category::Qsr);
        assert_eq!(qsr.anchors(&tax, 2), tax.anchors(Category::Qsr).to_vec());
        assert_eq!(qsr.anchors(&tax, 1).len(), 1);

        let dual = CategoryScope::resolve(&tax, Category::SportsFitness, Some("Nike"), None);
        let anchors = dual.anchors(&tax, 2);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0], tax.anchors(Category::SportsFitness)[0]);
        assert_eq!(anchors[1], tax.anchors(Category::RetailECommerce)[0]);
    }

    #[test]
    fn test_dual_pool_is_deduplicated_union() {
        let tax = taxonomy();
        let dual = CategoryScope::resolve(&tax, Category::SportsFitness, Some("Nike"), None);
        let pool = dual.pool(&tax);
        let primary: Vec<&str> = tax.pool(Category::SportsFitness).collect();
        assert_eq!(&pool[..primary.len()], primary.as_slice());

        let mut seen = std::collections::HashSet::new();
        assert!(pool.iter().all(|name| seen.insert(*name)));
        assert!(pool.len() > primary.len());
    }

    #[test]
    fn test_brand_outside_primary_keeps_both_brand_categories() {
        let tax = taxonomy();
        let scope = CategoryScope::resolve(&tax, Category::Cpg, Some("Nike"), None);
        assert_eq!(
            scope.categories(),
            [Category::Cpg, Category::SportsFitness, Category::RetailECommerce]
        );
        assert_eq!(
            scope.anchors(&tax, 2),
            vec![
                tax.anchors(Category::SportsFitness)[0].clone(),
                tax.anchors(Category::RetailECommerce)[0].clone(),
            ]
        );

        let pool = scope.pool(&tax);
        for category in scope.categories() {
            assert!(tax.pool(*category).all(|name| pool.contains(&name)));
        }
        let retail_only = tax
            .pool(Category::RetailECommerce)
            .find(|name| {
                !tax.in_pool(Category::Cpg, name) && !tax.in_pool(Category::SportsFitness, name)
            })
            .unwrap();
        assert!(validate(&tax, &scope, retail_only).is_ok());
    }
}
