//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the persona governor.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::{Error, Result};
use crate::governance::{GovernanceRequest, OverlayRequest};
use crate::taxonomy::{Category, Cohort};

/// Persona Governor - taxonomy-driven persona portfolio governance
///
/// Validates candidate personas against the canon, builds diversified,
/// rotation-aware portfolios and shapes them into highlight and insight sets.
#[derive(Parser, Debug)]
#[command(name = "persona-governor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Govern a persona program for one request
    Govern(GovernArgs),

    /// Check a single name against a category
    Validate {
        /// Persona name (aliases and spelling variants accepted)
        name: String,

        /// Category label, e.g. "CPG" or "Retail & E-Commerce"
        #[arg(short = 'C', long)]
        category: String,

        /// Brand name for the dual-anchor lookup
        #[arg(short, long)]
        brand: Option<String>,

        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_GOV_CONFIG")]
        config: Option<String>,
    },

    /// Inspect the reference taxonomy
    Taxonomy {
        #[command(subcommand)]
        subcommand: TaxonomySubcommand,

        /// Print JSON instead of text
        #[arg(long, global = true)]
        json: bool,

        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_GOV_CONFIG", global = true)]
        config: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Arguments of the `govern` command
#[derive(Args, Debug, Clone, Default)]
pub struct GovernArgs {
    /// Category label (required unless --request supplies one)
    #[arg(short = 'C', long, required_unless_present = "request")]
    pub category: Option<String>,

    /// Candidate persona name (repeatable)
    #[arg(short = 'n', long = "candidate")]
    pub candidates: Vec<String>,

    /// JSON request file; flags given alongside override or extend it
    #[arg(short, long)]
    pub request: Option<String>,

    /// Brand name for the dual-anchor lookup
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Explicit dual-anchor partner category
    #[arg(long)]
    pub partner_category: Option<String>,

    /// Core item count
    #[arg(short, long)]
    pub target: Option<usize>,

    /// Cohort whose generational pick is highlighted (repeatable)
    #[arg(long = "cohort")]
    pub cohorts: Vec<String>,

    /// Preferred generational segment, e.g. "Gen Z–Cloud Life" (repeatable)
    #[arg(long = "generational")]
    pub generational: Vec<String>,

    /// Attach the cultural overlay
    #[arg(long)]
    pub cultural: bool,

    /// Restrict the cultural overlay to one lineage
    #[arg(long)]
    pub lineage: Option<String>,

    /// Attach the geographic overlay
    #[arg(long)]
    pub geographic: bool,

    /// Market or region hint for the geographic overlay (repeatable)
    #[arg(long = "market")]
    pub markets: Vec<String>,

    /// Run the same request N times against one ledger
    #[arg(long, default_value = "1")]
    pub repeat: u32,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, env = "PERSONA_GOV_CONFIG")]
    pub config: Option<String>,
}

impl GovernArgs {
    /// Merge the request file (if any) with the command-line flags.
    pub fn to_request(&self) -> Result<GovernanceRequest> {
        let mut request = match &self.request {
            Some(path) => {
                let path = PathBuf::from(path);
                let text = fs::read_to_string(&path).map_err(|source| Error::IoRead {
                    path: path.clone(),
                    source,
                })?;
                let mut request: GovernanceRequest = serde_json::from_str(&text)?;
                if let Some(label) = &self.category {
                    request.category = label.parse()?;
                }
                request
            }
            None => {
                let label = self
                    .category
                    .as_deref()
                    .ok_or_else(|| Error::invalid_request("a category is required"))?;
                GovernanceRequest::new(label.parse::<Category>()?)
            }
        };

        request.candidate_names.extend(self.candidates.iter().cloned());
        if self.brand.is_some() {
            request.brand_key = self.brand.clone();
        }
        if let Some(label) = &self.partner_category {
            request.partner_category = Some(label.parse()?);
        }
        if self.target.is_some() {
            request.target_count = self.target;
        }
        for label in &self.cohorts {
            let cohort: Cohort = label.parse()?;
            if !request.highlight_cohorts.contains(&cohort) {
                request.highlight_cohorts.push(cohort);
            }
        }
        request
            .generational_candidates
            .extend(self.generational.iter().cloned());

        let overlays: &mut OverlayRequest = &mut request.requested_overlays;
        overlays.cultural |= self.cultural;
        overlays.geographic |= self.geographic;
        if self.lineage.is_some() {
            overlays.lineage = self.lineage.clone();
        }
        overlays.markets.extend(self.markets.iter().cloned());

        Ok(request)
    }
}

/// Taxonomy subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum TaxonomySubcommand {
    /// List categories with pool sizes and anchors
    Categories,

    /// List a category pool in canon order
    Pool {
        /// Category label
        category: String,
    },

    /// List phyla with member counts
    Phyla,

    /// List generational cohorts and their segments
    Cohorts,

    /// List cultural lineages and their expressions
    Lineages,

    /// List market regions and their DMA segments
    Regions,

    /// List deprecated names and replacements
    Deprecated,

    /// Show canon version, fingerprint and counts
    Stats,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn verify_cli() {
        // Verifies that the CLI definition is valid
        Cli::command().debug_assert();
    }

    fn govern_args(args: &[&str]) -> GovernArgs {
        let mut argv = vec!["persona-governor", "govern"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Govern(args) => args,
            _ => panic!("Expected Govern command"),
        }
    }

    #[test]
    fn test_govern_command() {
        let args = govern_args(&[
            "--category",
            "CPG",
            "-n",
            "Budget-Minded",
            "--candidate",
            "Culture Maven",
            "--target",
            "12",
        ]);
        assert_eq!(args.category.as_deref(), Some("CPG"));
        assert_eq!(args.candidates, vec!["Budget-Minded", "Culture Maven"]);
        assert_eq!(args.target, Some(12));
        assert_eq!(args.repeat, 1);
        assert!(!args.json);
    }

    #[test]
    fn test_govern_requires_category_or_request() {
        assert!(Cli::try_parse_from(["persona-governor", "govern"]).is_err());
        assert!(Cli::try_parse_from(["persona-governor", "govern", "--request", "r.json"]).is_ok());
    }

    #[test]
    fn test_govern_args_to_request() {
        let args = govern_args(&[
            "-C",
            "sports-fitness",
            "--brand",
            "Nike",
            "--cohort",
            "gen z",
            "--cohort",
            "Gen Z",
            "--cultural",
            "--market",
            "Boston",
        ]);
        let request = args.to_request().unwrap();
        assert_eq!(request.category, Category::SportsFitness);
        assert_eq!(request.brand_key.as_deref(), Some("Nike"));
        assert_eq!(request.highlight_cohorts, vec![Cohort::GenZ]);
        assert!(request.requested_overlays.cultural);
        assert_eq!(request.requested_overlays.markets, vec!["Boston"]);
    }

    #[test]
    fn test_govern_args_unknown_category() {
        let args = govern_args(&["-C", "B2B"]);
        assert!(matches!(args.to_request(), Err(Error::UnknownCategory(_))));
    }

    #[test]
    fn test_govern_args_merge_request_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("request.json");
        fs::write(
            &path,
            r#"{"category": "CPG", "candidateNames": ["Planner"], "targetCount": 10}"#,
        )
        .unwrap();

        let args = govern_args(&[
            "--request",
            path.to_str().unwrap(),
            "-n",
            "Gifter",
            "--geographic",
        ]);
        let request = args.to_request().unwrap();
        assert_eq!(request.category, Category::Cpg);
        assert_eq!(request.candidate_names, vec!["Planner", "Gifter"]);
        assert_eq!(request.target_count, Some(10));
        assert!(request.requested_overlays.geographic);
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["persona-governor", "validate", "Budget Minded", "-C", "CPG"]);
        match cli.command {
            Commands::Validate {
                name,
                category,
                brand,
                ..
            } => {
                assert_eq!(name, "Budget Minded");
                assert_eq!(category, "CPG");
                assert!(brand.is_none());
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_taxonomy_pool() {
        let cli = Cli::parse_from(["persona-governor", "taxonomy", "pool", "Auto", "--json"]);
        match cli.command {
            Commands::Taxonomy {
                subcommand: TaxonomySubcommand::Pool { category },
                json,
                ..
            } => {
                assert_eq!(category, "Auto");
                assert!(json);
            }
            _ => panic!("Expected Taxonomy Pool command"),
        }
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["persona-governor", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["persona-governor", "-vv", "taxonomy", "stats"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::parse_from(["persona-governor", "-q", "taxonomy", "stats"]);
        assert!(cli.quiet);
    }
}
