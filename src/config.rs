//! Configuration system for the persona governor
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (PERSONA_GOV_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::taxonomy::{Category, Labelled};

/// Bounds every configured insight band must stay inside.
pub const HIGH_BAND_LIMITS: (u8, u8) = (33, 42);
pub const LOW_BAND_LIMITS: (u8, u8) = (21, 32);

/// Largest portfolio a single request may ask for.
pub const MAX_TARGET_COUNT: usize = 100;

/// Main governor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Portfolio shaping rules
    pub governance: GovernanceSettings,

    /// Rotation windows and penalty curve
    pub rotation: RotationSettings,

    /// Insight band ranges
    pub insights: InsightSettings,

    /// Taxonomy source
    pub taxonomy: TaxonomySettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Portfolio shaping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceSettings {
    /// Core items per portfolio
    pub target_count: usize,

    /// Core highlights per program
    pub highlight_count: usize,

    /// Insight items per program
    pub insight_count: usize,

    /// Largest share of the target any one phylum may hold
    pub dominance_cap: f64,

    /// Hot items allowed among core highlights
    pub max_hot_highlights: usize,

    /// Per-category overrides of `max_hot_highlights`, keyed by category label
    pub hot_highlight_overrides: BTreeMap<String, usize>,

    /// Anchor labels attached per program
    pub max_anchors: usize,
}

/// Rotation ledger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// History window for core items
    pub core_window: usize,

    /// History window for highlighted items
    pub highlight_window: usize,

    /// History window for generational segments
    pub generational_window: usize,

    /// Multiplier for the most recent item (non-hot)
    pub recency_floor: f64,

    /// Extra multiplier applied to hot items present in history
    pub hot_multiplier: f64,

    /// Lowest multiplier a hot item can reach
    pub hot_floor: f64,
}

/// Insight band settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// Inclusive range for the high band
    pub high_range: [u8; 2],

    /// Inclusive range for the low band
    pub low_range: [u8; 2],

    /// Minimum points between high and low
    pub min_separation: u8,

    /// Fixed high band (sampled per item when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<u8>,

    /// Fixed low band (sampled per item when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<u8>,
}

/// Taxonomy source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomySettings {
    /// Canon file path (bundled canon when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for GovernanceSettings {
    fn default() -> Self {
        let mut hot_highlight_overrides = BTreeMap::new();
        hot_highlight_overrides.insert(Category::TravelHospitality.label().to_string(), 1);
        Self {
            target_count: 15,
            highlight_count: 3,
            insight_count: 2,
            dominance_cap: 0.35,
            max_hot_highlights: 2,
            hot_highlight_overrides,
            max_anchors: 2,
        }
    }
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            core_window: 200,
            highlight_window: 40,
            generational_window: 60,
            recency_floor: 0.5,
            hot_multiplier: 0.6,
            hot_floor: 0.25,
        }
    }
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            high_range: [HIGH_BAND_LIMITS.0, HIGH_BAND_LIMITS.1],
            low_range: [LOW_BAND_LIMITS.0, LOW_BAND_LIMITS.1],
            min_separation: 5,
            high: None,
            low: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl GovernanceSettings {
    /// Most items one phylum may contribute to a portfolio of `target` items.
    pub fn phylum_cap(&self, target: usize) -> usize {
        ((self.dominance_cap * target as f64).floor() as usize).max(1)
    }

    /// Hot highlight limit for a category.
    pub fn hot_highlight_cap(&self, category: Category) -> usize {
        self.hot_highlight_overrides
            .iter()
            .find(|(label, _)| Category::from_label(label) == Some(category))
            .map_or(self.max_hot_highlights, |(_, cap)| *cap)
    }
}

impl GovernorConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|source| Error::IoRead {
                path: path.clone(),
                source,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", path.display(), e.message()),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("persona-governor.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("persona-governor").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".persona-governor").join("config.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/persona-governor/config.toml"),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Governance settings
        if let Some(n) = env_parse("PERSONA_GOV_TARGET_COUNT") {
            self.governance.target_count = n;
        }
        if let Some(n) = env_parse("PERSONA_GOV_HIGHLIGHT_COUNT") {
            self.governance.highlight_count = n;
        }
        if let Some(n) = env_parse("PERSONA_GOV_INSIGHT_COUNT") {
            self.governance.insight_count = n;
        }
        if let Some(n) = env_parse("PERSONA_GOV_DOMINANCE_CAP") {
            self.governance.dominance_cap = n;
        }

        // Rotation settings
        if let Some(n) = env_parse("PERSONA_GOV_CORE_WINDOW") {
            self.rotation.core_window = n;
        }
        if let Some(n) = env_parse("PERSONA_GOV_HIGHLIGHT_WINDOW") {
            self.rotation.highlight_window = n;
        }
        if let Some(n) = env_parse("PERSONA_GOV_GENERATIONAL_WINDOW") {
            self.rotation.generational_window = n;
        }
        if let Some(n) = env_parse("PERSONA_GOV_RECENCY_FLOOR") {
            self.rotation.recency_floor = n;
        }
        if let Some(n) = env_parse("PERSONA_GOV_HOT_MULTIPLIER") {
            self.rotation.hot_multiplier = n;
        }

        // Insight settings
        if let Some(n) = env_parse("PERSONA_GOV_INSIGHT_HIGH") {
            self.insights.high = Some(n);
        }
        if let Some(n) = env_parse("PERSONA_GOV_INSIGHT_LOW") {
            self.insights.low = Some(n);
        }

        // Taxonomy settings
        if let Ok(val) = std::env::var("PERSONA_GOV_TAXONOMY_PATH") {
            self.taxonomy.path = Some(val);
        }

        // Logging settings
        if let Ok(val) = std::env::var("PERSONA_GOV_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("PERSONA_GOV_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("PERSONA_GOV_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref path) = self.taxonomy.path {
            self.taxonomy.path = Some(expand_path(path));
        }
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let gov = &self.governance;
        if gov.target_count == 0 || gov.target_count > MAX_TARGET_COUNT {
            return Err(Error::config_field_invalid(
                "governance.target_count",
                format!("target_count must be between 1 and {}", MAX_TARGET_COUNT),
            ));
        }
        if !(gov.dominance_cap > 0.0 && gov.dominance_cap <= 1.0) {
            return Err(Error::config_field_invalid(
                "governance.dominance_cap",
                "dominance_cap must be in (0, 1]",
            ));
        }
        if gov.max_anchors == 0 {
            return Err(Error::config_field_invalid(
                "governance.max_anchors",
                "max_anchors must be at least 1",
            ));
        }
        for label in gov.hot_highlight_overrides.keys() {
            if Category::from_label(label).is_none() {
                return Err(Error::config_field_invalid(
                    "governance.hot_highlight_overrides",
                    format!("unknown category '{}'", label),
                ));
            }
        }

        let rot = &self.rotation;
        if rot.core_window == 0 || rot.highlight_window == 0 || rot.generational_window == 0 {
            return Err(Error::config_field_invalid(
                "rotation",
                "rotation windows must be at least 1",
            ));
        }
        for (field, value) in [
            ("rotation.recency_floor", rot.recency_floor),
            ("rotation.hot_multiplier", rot.hot_multiplier),
            ("rotation.hot_floor", rot.hot_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config_field_invalid(field, format!("{} must be in [0, 1]", field)));
            }
        }

        self.insights.validate()?;

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

impl InsightSettings {
    fn validate(&self) -> Result<()> {
        let [high_min, high_max] = self.high_range;
        let [low_min, low_max] = self.low_range;
        if high_min > high_max || high_min < HIGH_BAND_LIMITS.0 || high_max > HIGH_BAND_LIMITS.1 {
            return Err(Error::config_field_invalid(
                "insights.high_range",
                format!("high_range must lie within {:?}", HIGH_BAND_LIMITS),
            ));
        }
        if low_min > low_max || low_min < LOW_BAND_LIMITS.0 || low_max > LOW_BAND_LIMITS.1 {
            return Err(Error::config_field_invalid(
                "insights.low_range",
                format!("low_range must lie within {:?}", LOW_BAND_LIMITS),
            ));
        }
        if high_min.saturating_sub(low_min) < self.min_separation {
            return Err(Error::config_field_invalid(
                "insights.min_separation",
                "high_range and low_range cannot satisfy min_separation",
            ));
        }
        if let Some(high) = self.high {
            if !(high_min..=high_max).contains(&high) {
                return Err(Error::config_field_invalid("insights.high", "high is outside high_range"));
            }
        }
        if let Some(low) = self.low {
            if !(low_min..=low_max).contains(&low) {
                return Err(Error::config_field_invalid("insights.low", "low is outside low_range"));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.parse().ok())
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".persona-governor")
                .join("config.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| Error::IoWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|source| Error::IoWrite {
        path: config_path.clone(),
        source,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# Persona Governor Configuration

[governance]
# Core items per portfolio
target_count = 15

# Core highlights per program
highlight_count = 3

# Insight items per program
insight_count = 2

# Largest share of the portfolio any one phylum may hold (rounded down)
dominance_cap = 0.35

# Hot items allowed among core highlights
max_hot_highlights = 2

# Anchor labels attached per program
max_anchors = 2

[governance.hot_highlight_overrides]
"Travel & Hospitality" = 1

[rotation]
# History windows per pool
core_window = 200
highlight_window = 40
generational_window = 60

# Multiplier for the most recently used item
recency_floor = 0.5

# Extra multiplier for hot items, and how low they may go
hot_multiplier = 0.6
hot_floor = 0.25

[insights]
# Inclusive band ranges (percent)
high_range = [33, 42]
low_range = [21, 32]

# Minimum points between high and low
min_separation = 5

# Fixed values (sampled per item when unset)
# high = 38
# low = 27

[taxonomy]
# Canon file (bundled canon when unset)
# path = "~/.persona-governor/canon.toml"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.persona-governor/logs/governor.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = GovernorConfig::default();
        assert_eq!(config.governance.target_count, 15);
        assert_eq!(config.rotation.core_window, 200);
        assert_eq!(config.rotation.generational_window, 60);
        assert_eq!(config.rotation.highlight_window, 40);
        assert_eq!(config.logging.level, "info");
        assert!(config.taxonomy.path.is_none());
    }

    #[test]
    fn test_phylum_cap() {
        let gov = GovernanceSettings::default();
        assert_eq!(gov.phylum_cap(15), 5);
        assert_eq!(gov.phylum_cap(10), 3);
        assert_eq!(gov.phylum_cap(1), 1);
    }

    #[test]
    fn test_hot_highlight_cap() {
        let gov = GovernanceSettings::default();
        assert_eq!(gov.hot_highlight_cap(Category::TravelHospitality), 1);
        assert_eq!(gov.hot_highlight_cap(Category::Cpg), 2);
    }

    #[test]
    fn test_env_override() {
        env::set_var("PERSONA_GOV_TARGET_COUNT", "12");
        env::set_var("PERSONA_GOV_INSIGHT_HIGH", "40");
        env::set_var("PERSONA_GOV_LOG_LEVEL", "debug");

        let mut config = GovernorConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.governance.target_count, 12);
        assert_eq!(config.insights.high, Some(40));
        assert_eq!(config.logging.level, "debug");

        env::remove_var("PERSONA_GOV_TARGET_COUNT");
        env::remove_var("PERSONA_GOV_INSIGHT_HIGH");
        env::remove_var("PERSONA_GOV_LOG_LEVEL");
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(GovernorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_target_count() {
        let mut config = GovernorConfig::default();
        config.governance.target_count = 0;
        assert!(config.validate().is_err());
        config.governance.target_count = MAX_TARGET_COUNT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_dominance_cap() {
        let mut config = GovernorConfig::default();
        config.governance.dominance_cap = 0.0;
        assert!(config.validate().is_err());
        config.governance.dominance_cap = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_unknown_override_category() {
        let mut config = GovernorConfig::default();
        config.governance.hot_highlight_overrides.insert("Pets".to_string(), 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_band_ranges() {
        let mut config = GovernorConfig::default();
        config.insights.high_range = [30, 42];
        assert!(config.validate().is_err());

        let mut config = GovernorConfig::default();
        config.insights.low_range = [21, 35];
        assert!(config.validate().is_err());

        let mut config = GovernorConfig::default();
        config.insights.min_separation = 13;
        assert!(config.validate().is_err());

        let mut config = GovernorConfig::default();
        config.insights.high = Some(45);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = GovernorConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_floor_range() {
        let mut config = GovernorConfig::default();
        config.rotation.hot_floor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = GovernorConfig::default();
        config.taxonomy.path = Some("~/canon.toml".to_string());
        config.expand_paths();
        assert!(!config.taxonomy.path.unwrap().contains('~'));
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = GovernorConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: GovernorConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.governance.target_count, parsed.governance.target_count);
        assert_eq!(config.insights.high_range, parsed.insights.high_range);
        assert_eq!(
            parsed.governance.hot_highlight_overrides.get("Travel & Hospitality"),
            Some(&1)
        );
    }

    #[test]
    fn test_generated_default_parses() {
        let parsed: GovernorConfig = toml::from_str(&generate_default_config()).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.governance.dominance_cap, 0.35);
    }

    #[test]
    fn test_parse_config_file() {
        let config_str = r#"
[governance]
target_count = 10
dominance_cap = 0.3

[rotation]
core_window = 50

[insights]
high = 40
low = 30

[logging]
level = "debug"
"#;

        let config: GovernorConfig = toml::from_str(config_str).unwrap();

        assert_eq!(config.governance.target_count, 10);
        assert_eq!(config.governance.highlight_count, 3);
        assert_eq!(config.rotation.core_window, 50);
        assert_eq!(config.rotation.highlight_window, 40);
        assert_eq!(config.insights.high, Some(40));
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }
}
