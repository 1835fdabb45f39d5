//! Fixed enumerations of the reference taxonomy.
//!
//! Categories, generational cohorts, cultural lineages and market regions are
//! closed sets. Their labels double as TOML keys in the canon and as the wire
//! form in JSON requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A closed set of labelled values.
pub trait Labelled: Sized + Copy + 'static {
    /// Canonical display label, as used in the canon file.
    fn label(&self) -> &'static str;

    /// All values in canonical order.
    fn all() -> &'static [Self];

    /// Look a value up by label, ignoring case and punctuation.
    fn from_label(s: &str) -> Option<Self> {
        let wanted = label_key(s);
        if wanted.is_empty() {
            return None;
        }
        Self::all().iter().copied().find(|v| label_key(v.label()) == wanted)
    }
}

/// Lowercase alphanumerics only: "Retail & E-Commerce" and "retail-ecommerce" agree.
fn label_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lookup key for item and segment names.
///
/// Lowercases, turns hyphens and en/em dashes into spaces, drops apostrophes
/// and double quotes, and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    let spaced: String = name
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '"' | '\u{201C}' | '\u{201D}'))
        .map(|c| if matches!(c, '-' | '\u{2013}' | '\u{2014}') { ' ' } else { c })
        .collect();
    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ─────────────────────────────────────────────────────────────────
// Category
// ─────────────────────────────────────────────────────────────────

/// Advertising vertical. Owns an item pool and anchor labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Auto", alias = "auto")]
    Auto,
    #[serde(rename = "QSR", alias = "qsr")]
    Qsr,
    #[serde(rename = "Culinary & Dining", alias = "culinary-dining")]
    CulinaryDining,
    #[serde(rename = "Retail & E-Commerce", alias = "retail-ecommerce")]
    RetailECommerce,
    #[serde(rename = "CPG", alias = "cpg")]
    Cpg,
    #[serde(rename = "Finance & Insurance", alias = "finance-insurance")]
    FinanceInsurance,
    #[serde(rename = "Tech & Wireless", alias = "tech-wireless")]
    TechWireless,
    #[serde(rename = "Entertainment", alias = "entertainment")]
    Entertainment,
    #[serde(rename = "Travel & Hospitality", alias = "travel-hospitality")]
    TravelHospitality,
    #[serde(rename = "Health & Pharma", alias = "health-pharma")]
    HealthPharma,
    #[serde(rename = "Home & DIY", alias = "home-diy")]
    HomeDiy,
    #[serde(rename = "Luxury & Fashion", alias = "luxury-fashion")]
    LuxuryFashion,
    #[serde(rename = "Alcohol & Spirits", alias = "alcohol-spirits")]
    AlcoholSpirits,
    #[serde(rename = "Sports & Fitness", alias = "sports-fitness")]
    SportsFitness,
}

impl Labelled for Category {
    fn label(&self) -> &'static str {
        match self {
            Category::Auto => "Auto",
            Category::Qsr => "QSR",
            Category::CulinaryDining => "Culinary & Dining",
            Category::RetailECommerce => "Retail & E-Commerce",
            Category::Cpg => "CPG",
            Category::FinanceInsurance => "Finance & Insurance",
            Category::TechWireless => "Tech & Wireless",
            Category::Entertainment => "Entertainment",
            Category::TravelHospitality => "Travel & Hospitality",
            Category::HealthPharma => "Health & Pharma",
            Category::HomeDiy => "Home & DIY",
            Category::LuxuryFashion => "Luxury & Fashion",
            Category::AlcoholSpirits => "Alcohol & Spirits",
            Category::SportsFitness => "Sports & Fitness",
        }
    }

    fn all() -> &'static [Category] {
        &[
            Category::Auto,
            Category::Qsr,
            Category::CulinaryDining,
            Category::RetailECommerce,
            Category::Cpg,
            Category::FinanceInsurance,
            Category::TechWireless,
            Category::Entertainment,
            Category::TravelHospitality,
            Category::HealthPharma,
            Category::HomeDiy,
            Category::LuxuryFashion,
            Category::AlcoholSpirits,
            Category::SportsFitness,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────
// Generational Cohort
// ─────────────────────────────────────────────────────────────────

/// Generational cohort, oldest last. Each owns eight segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cohort {
    #[serde(rename = "Gen Z", alias = "gen-z")]
    GenZ,
    #[serde(rename = "Millennial", alias = "millennial")]
    Millennial,
    #[serde(rename = "Gen X", alias = "gen-x")]
    GenX,
    #[serde(rename = "Boomer", alias = "boomer")]
    Boomer,
}

impl Labelled for Cohort {
    fn label(&self) -> &'static str {
        match self {
            Cohort::GenZ => "Gen Z",
            Cohort::Millennial => "Millennial",
            Cohort::GenX => "Gen X",
            Cohort::Boomer => "Boomer",
        }
    }

    fn all() -> &'static [Cohort] {
        &[Cohort::GenZ, Cohort::Millennial, Cohort::GenX, Cohort::Boomer]
    }

    fn from_label(s: &str) -> Option<Self> {
        match label_key(s).as_str() {
            "genz" => Some(Cohort::GenZ),
            "millennial" | "millennials" | "geny" => Some(Cohort::Millennial),
            "genx" => Some(Cohort::GenX),
            "boomer" | "boomers" | "babyboomer" | "babyboomers" => Some(Cohort::Boomer),
            _ => None,
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Cohort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cohort::from_label(s).ok_or_else(|| Error::UnknownCohort(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────
// Cultural Lineage
// ─────────────────────────────────────────────────────────────────

/// Multicultural lineage grouping for the cultural overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lineage {
    #[serde(rename = "Black American")]
    BlackAmerican,
    #[serde(rename = "Latino / Hispanic")]
    LatinoHispanic,
    #[serde(rename = "AAPI")]
    Aapi,
    #[serde(rename = "South Asian / Desi")]
    SouthAsianDesi,
    #[serde(rename = "MENA")]
    Mena,
    #[serde(rename = "Hybrid / Global")]
    HybridGlobal,
}

impl Labelled for Lineage {
    fn label(&self) -> &'static str {
        match self {
            Lineage::BlackAmerican => "Black American",
            Lineage::LatinoHispanic => "Latino / Hispanic",
            Lineage::Aapi => "AAPI",
            Lineage::SouthAsianDesi => "South Asian / Desi",
            Lineage::Mena => "MENA",
            Lineage::HybridGlobal => "Hybrid / Global",
        }
    }

    fn all() -> &'static [Lineage] {
        &[
            Lineage::BlackAmerican,
            Lineage::LatinoHispanic,
            Lineage::Aapi,
            Lineage::SouthAsianDesi,
            Lineage::Mena,
            Lineage::HybridGlobal,
        ]
    }

    fn from_label(s: &str) -> Option<Self> {
        let key = label_key(s);
        let found = Self::all().iter().copied().find(|v| label_key(v.label()) == key);
        found.or(match key.as_str() {
            "black" | "africanamerican" => Some(Lineage::BlackAmerican),
            "latino" | "latina" | "latinx" | "hispanic" => Some(Lineage::LatinoHispanic),
            "asianamerican" | "asian" => Some(Lineage::Aapi),
            "southasian" | "desi" => Some(Lineage::SouthAsianDesi),
            "middleeastern" => Some(Lineage::Mena),
            "hybrid" | "global" | "multicultural" => Some(Lineage::HybridGlobal),
            _ => None,
        })
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Lineage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lineage::from_label(s).ok_or_else(|| Error::UnknownLineage(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────
// Market Region
// ─────────────────────────────────────────────────────────────────

/// Fixed market grouping of local-culture DMA segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Northeast")]
    Northeast,
    #[serde(rename = "Mid-Atlantic")]
    MidAtlantic,
    #[serde(rename = "Southeast")]
    Southeast,
    #[serde(rename = "Midwest")]
    Midwest,
    #[serde(rename = "South Central")]
    SouthCentral,
    #[serde(rename = "Mountain West")]
    MountainWest,
    #[serde(rename = "Pacific")]
    Pacific,
}

impl Labelled for Region {
    fn label(&self) -> &'static str {
        match self {
            Region::Northeast => "Northeast",
            Region::MidAtlantic => "Mid-Atlantic",
            Region::Southeast => "Southeast",
            Region::Midwest => "Midwest",
            Region::SouthCentral => "South Central",
            Region::MountainWest => "Mountain West",
            Region::Pacific => "Pacific",
        }
    }

    fn all() -> &'static [Region] {
        &[
            Region::Northeast,
            Region::MidAtlantic,
            Region::Southeast,
            Region::Midwest,
            Region::SouthCentral,
            Region::MountainWest,
            Region::Pacific,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
