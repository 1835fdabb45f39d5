//! Persona Governor - command-line entry point
//!
//! Loads configuration and the canon, then validates, governs or lists
//! taxonomy content. Program output goes to stdout, logs to stderr.

use clap::Parser;
use serde_json::json;
use tracing::{debug, error, info};

use persona_governor::cli::{Cli, Commands, ConfigSubcommand, GovernArgs, TaxonomySubcommand};
use persona_governor::config::{self, GovernorConfig};
use persona_governor::error::{Error, Result};
use persona_governor::governance::{GovernanceEngine, GovernedProgram, HighlightKind};
use persona_governor::logging;
use persona_governor::taxonomy::{Category, Cohort, Labelled, Lineage, Region, Taxonomy};

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    // Log guards live inside `run`, so file output is flushed before exiting
    match run(cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprint!("{}", e.format_for_terminal());
            std::process::exit(e.exit_code());
        }
    }
}

/// Execute one command and return the process exit code.
fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Config { subcommand } => {
            // Config commands use minimal logging
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)?;
            Ok(0)
        }
        Commands::Taxonomy {
            subcommand,
            json,
            config,
        } => {
            logging::init_simple(tracing::Level::WARN)?;
            let cfg = GovernorConfig::load(config.as_deref())?;
            let taxonomy = Taxonomy::load_or_bundled(cfg.taxonomy.path.as_deref())?;
            handle_taxonomy_command(&taxonomy, subcommand, json)?;
            Ok(0)
        }
        Commands::Validate {
            name,
            category,
            brand,
            config,
        } => {
            let cfg = GovernorConfig::load(config.as_deref())?;
            let _guards = logging::init_logging(&cfg.logging, cli.verbose, cli.quiet)?;
            run_validate(&cfg, &name, &category, brand.as_deref())
        }
        Commands::Govern(args) => {
            let cfg = GovernorConfig::load(args.config.as_deref())?;
            let _guards = logging::init_logging(&cfg.logging, cli.verbose, cli.quiet)?;
            run_govern(&cfg, &args)?;
            Ok(0)
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Governance Commands
// ─────────────────────────────────────────────────────────────────

/// Returns exit code 1 when the name is rejected.
fn run_validate(cfg: &GovernorConfig, name: &str, category: &str, brand: Option<&str>) -> Result<i32> {
    let category: Category = category.parse()?;
    let engine = GovernanceEngine::from_config(cfg)?;

    match engine.validate_for_brand(name, category, brand) {
        Ok(item) => {
            println!("✓ {} ({}) is valid for {}", item.name, item.phylum, category);
            Ok(0)
        }
        Err(rejection) => {
            info!(name = name.trim(), category = %category, "Name rejected: {}", rejection);
            println!("✗ {}: {}", name.trim(), rejection);
            Ok(1)
        }
    }
}

fn run_govern(cfg: &GovernorConfig, args: &GovernArgs) -> Result<()> {
    if args.repeat == 0 {
        return Err(Error::invalid_request("--repeat must be at least 1"));
    }
    let request = args.to_request()?;
    let engine = GovernanceEngine::from_config(cfg)?;
    debug!(
        fingerprint = %engine.taxonomy().fingerprint(),
        repeat = args.repeat,
        "Engine ready"
    );

    let mut programs = Vec::with_capacity(args.repeat as usize);
    for run in 0..args.repeat {
        match engine.govern(&request) {
            Ok(program) => programs.push(program),
            Err(e) => {
                error!(run, retryable = e.is_retryable(), "{}", e.format_for_log());
                return Err(e);
            }
        }
    }

    if args.json {
        let out = if programs.len() == 1 {
            serde_json::to_string_pretty(&programs[0])?
        } else {
            serde_json::to_string_pretty(&programs)?
        };
        println!("{}", out);
    } else {
        for (i, program) in programs.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_program(program);
        }
    }

    let stats = engine.ledger().stats();
    info!(
        runs = programs.len(),
        core = stats[0].len,
        highlight = stats[1].len,
        generational = stats[2].len,
        "Ledger state"
    );
    Ok(())
}

fn print_program(program: &GovernedProgram) {
    println!("Program {} ({})", program.request_id, program.category);

    println!("\nPortfolio ({}):", program.portfolio.len());
    for (i, entry) in program.portfolio.iter().enumerate() {
        println!("  {:>2}. {:<32} [{}]", i + 1, entry.name, entry.phylum);
    }

    println!("\nAnchors: {}", program.anchors.join(", "));

    println!("\nGenerational:");
    for pick in &program.generational {
        println!("  {:<14} {}", pick.cohort.label(), pick.name);
    }

    println!("\nHighlights:");
    for highlight in &program.highlights {
        let kind = match highlight.kind {
            HighlightKind::Core => "core",
            HighlightKind::Generational => "generational",
        };
        println!("  * {} ({})", highlight.name, kind);
    }

    println!("\nInsights:");
    for insight in &program.insights {
        println!("  * {} {}%", insight.name, insight.band);
    }

    if let Some(overlays) = &program.overlays {
        if !overlays.cultural.is_empty() {
            println!("\nCultural: {}", overlays.cultural.join(", "));
        }
        if !overlays.geographic.is_empty() {
            println!("\nGeographic: {}", overlays.geographic.join(", "));
        }
    }

    if !program.rejected.is_empty() {
        println!("\nRejected:");
        for rejected in &program.rejected {
            match &rejected.replacement {
                Some(replacement) => println!(
                    "  - {}: {} (use '{}')",
                    rejected.name, rejected.reason, replacement
                ),
                None => println!("  - {}: {}", rejected.name, rejected.reason),
            }
        }
    }

    if let Some(short) = program.shortfall {
        println!(
            "\nShortfall: delivered {} of {} requested",
            short.delivered, short.requested
        );
    }
}

// ─────────────────────────────────────────────────────────────────
// Taxonomy Commands
// ─────────────────────────────────────────────────────────────────

fn handle_taxonomy_command(
    taxonomy: &Taxonomy,
    subcommand: TaxonomySubcommand,
    as_json: bool,
) -> Result<()> {
    let value = match subcommand {
        TaxonomySubcommand::Categories => {
            let rows: Vec<_> = Category::all()
                .iter()
                .map(|c| {
                    json!({
                        "category": c.label(),
                        "pool": taxonomy.pool_len(*c),
                        "hot": taxonomy.hot_items(*c).len(),
                        "anchors": taxonomy.anchors(*c),
                    })
                })
                .collect();
            if !as_json {
                for c in Category::all() {
                    println!(
                        "{:<28} {:>3} items  {:>2} hot  {}",
                        c.label(),
                        taxonomy.pool_len(*c),
                        taxonomy.hot_items(*c).len(),
                        taxonomy.anchors(*c).join(", ")
                    );
                }
            }
            json!(rows)
        }
        TaxonomySubcommand::Pool { category } => {
            let category: Category = category.parse()?;
            let rows: Vec<_> = taxonomy
                .pool(category)
                .map(|name| {
                    json!({
                        "name": name,
                        "phylum": taxonomy.phylum_of(name),
                        "hot": taxonomy.is_hot(category, name),
                    })
                })
                .collect();
            if !as_json {
                for name in taxonomy.pool(category) {
                    let marker = if taxonomy.is_hot(category, name) { " *" } else { "" };
                    println!(
                        "{:<32} {}{}",
                        name,
                        taxonomy.phylum_of(name).unwrap_or("?"),
                        marker
                    );
                }
            }
            json!({ "category": category.label(), "items": rows })
        }
        TaxonomySubcommand::Phyla => {
            let rows: Vec<_> = taxonomy
                .phyla()
                .iter()
                .map(|p| json!({ "phylum": p, "members": taxonomy.phylum_members(p) }))
                .collect();
            if !as_json {
                for phylum in taxonomy.phyla() {
                    println!("{:<28} {:>3}", phylum, taxonomy.phylum_members(phylum).len());
                }
            }
            json!(rows)
        }
        TaxonomySubcommand::Cohorts => {
            let rows: Vec<_> = Cohort::all()
                .iter()
                .map(|c| json!({ "cohort": c.label(), "segments": taxonomy.segments(*c) }))
                .collect();
            if !as_json {
                for cohort in Cohort::all() {
                    println!("{}:", cohort.label());
                    for segment in taxonomy.segments(*cohort) {
                        println!("  {}", segment.name);
                    }
                }
            }
            json!(rows)
        }
        TaxonomySubcommand::Lineages => {
            let rows: Vec<_> = Lineage::all()
                .iter()
                .map(|l| json!({ "lineage": l.label(), "expressions": taxonomy.expressions(*l) }))
                .collect();
            if !as_json {
                for lineage in Lineage::all() {
                    println!("{}:", lineage.label());
                    for expression in taxonomy.expressions(*lineage) {
                        println!("  {}", expression.name);
                    }
                }
            }
            json!(rows)
        }
        TaxonomySubcommand::Regions => {
            let rows: Vec<_> = Region::all()
                .iter()
                .map(|r| json!({ "region": r.label(), "markets": taxonomy.markets(*r) }))
                .collect();
            if !as_json {
                for region in Region::all() {
                    let markets = taxonomy.markets(*region);
                    println!("{} ({}):", region.label(), markets.len());
                    for market in markets {
                        println!("  {}", market);
                    }
                }
            }
            json!(rows)
        }
        TaxonomySubcommand::Deprecated => {
            let deprecated = taxonomy.deprecated();
            if !as_json {
                for entry in &deprecated {
                    match &entry.replacement {
                        Some(replacement) => {
                            println!("{:<28} -> {:<28} {}", entry.name, replacement, entry.reason)
                        }
                        None => println!("{:<28}    {:<28} {}", entry.name, "", entry.reason),
                    }
                }
            }
            json!(deprecated)
        }
        TaxonomySubcommand::Stats => {
            let stats = taxonomy.stats();
            if !as_json {
                println!("Canon:        {} v{}", stats.name, stats.version);
                println!("Fingerprint:  {}", stats.fingerprint);
                println!("Items:        {}", stats.items);
                println!("Categories:   {}", stats.categories);
                println!("Phyla:        {}", stats.phyla);
                println!("Aliases:      {}", stats.aliases);
                println!("Deprecated:   {}", stats.deprecated);
                println!("Generational: {}", stats.generational_segments);
                println!("Cultural:     {}", stats.cultural_expressions);
                println!("Markets:      {}", stats.markets);
            }
            json!(stats)
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────

fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = GovernorConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let created = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", created.display());
        }
        ConfigSubcommand::Validate { config } => {
            let path = config.as_deref();
            match GovernorConfig::load(path) {
                Ok(_) => {
                    println!("Configuration is valid.");
                }
                Err(e) => {
                    eprint!("{}", e.format_for_terminal());
                    std::process::exit(e.exit_code());
                }
            }
        }
    }

    Ok(())
}
