//! BuildGuard CLI - PC build compatibility checks from the command line.

use anyhow::{bail, Context};
use buildguard::config::{VocabularyConfig, VocabularyPreset};
use buildguard::{
    connect, default_rules, normalize, parse_delimited_list, parse_json_list, BuildGuardConfig,
    BuildGuardCore, CatalogConfig, RuleOutcome, ValidationResult,
};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "buildguard")]
#[command(about = "PC build compatibility checker backed by a hardware catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a list of parts against the catalog
    Check {
        /// Part names, one per argument
        #[arg(value_name = "NAME")]
        names: Vec<String>,

        /// Parts as a JSON array of strings
        #[arg(long, value_name = "ARRAY", conflicts_with_all = ["names", "list"])]
        json: Option<String>,

        /// Parts as a single '|'-delimited string
        #[arg(long, value_name = "PARTS", conflicts_with = "names")]
        list: Option<String>,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code when the run has findings at this level
        #[arg(long, value_enum, default_value = "error")]
        fail_on: FailOn,

        /// Treat two parts of the same category as an error
        #[arg(long)]
        strict: bool,

        /// Only run the given rule (repeatable)
        #[arg(long = "rule", value_name = "ID")]
        rules: Vec<String>,
    },

    /// List available compatibility rules
    Rules {
        /// Show rule descriptions and required categories
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the catalog lookup key for each name
    Normalize {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },
}

/// Where the catalog lives and how it names attributes.
#[derive(Args)]
struct CatalogArgs {
    /// Configuration file (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use a JSON catalog document instead of Neo4j
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    #[arg(long, value_name = "URL", env = "BUILDGUARD_NEO4J_URI")]
    neo4j_uri: Option<String>,

    #[arg(long, value_name = "USER", env = "BUILDGUARD_NEO4J_USER")]
    neo4j_user: Option<String>,

    #[arg(long, value_name = "PASSWORD", env = "BUILDGUARD_NEO4J_PASSWORD", hide_env_values = true)]
    neo4j_password: Option<String>,

    #[arg(long, value_name = "NAME", env = "BUILDGUARD_NEO4J_DATABASE")]
    neo4j_database: Option<String>,

    /// Use the Spanish attribute names of the legacy product graph
    #[arg(long)]
    legacy_vocabulary: bool,

    /// Per-call catalog timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl CatalogArgs {
    fn load_config(&self) -> anyhow::Result<BuildGuardConfig> {
        let mut config = match &self.config {
            Some(path) => BuildGuardConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => BuildGuardConfig::default(),
        };

        if let Some(path) = &self.catalog {
            config.catalog = CatalogConfig::Memory { path: path.clone() };
        } else if self.has_neo4j_overrides() {
            if !matches!(config.catalog, CatalogConfig::Neo4j(_)) {
                config.catalog = CatalogConfig::Neo4j(Default::default());
            }
            if let CatalogConfig::Neo4j(neo4j) = &mut config.catalog {
                if let Some(uri) = &self.neo4j_uri {
                    neo4j.uri = uri.clone();
                }
                if let Some(user) = &self.neo4j_user {
                    neo4j.user = user.clone();
                }
                if let Some(password) = &self.neo4j_password {
                    neo4j.password = password.clone();
                }
                if let Some(database) = &self.neo4j_database {
                    neo4j.database = database.clone();
                }
            }
        }

        if self.legacy_vocabulary {
            config.vocabulary = VocabularyConfig::Preset(VocabularyPreset::Legacy);
        }
        if let Some(secs) = self.timeout {
            if secs == 0 {
                bail!("--timeout must be greater than zero");
            }
            config.call_timeout_secs = secs;
        }
        Ok(config)
    }

    fn has_neo4j_overrides(&self) -> bool {
        self.neo4j_uri.is_some()
            || self.neo4j_user.is_some()
            || self.neo4j_password.is_some()
            || self.neo4j_database.is_some()
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// Bracket-tagged lines for logs and plain terminals
    Tags,
    /// The full result as JSON
    Json,
}

#[derive(Clone, ValueEnum)]
enum FailOn {
    /// Any failed rule
    Error,
    /// Failed rules, skipped rules or input diagnostics
    Warning,
    /// Always exit 0 once the run completes
    Never,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Check {
            names,
            json,
            list,
            catalog,
            format,
            fail_on,
            strict,
            rules,
        } => {
            let input = Input { names, json, list };
            handle_check(input, &catalog, &format, &fail_on, strict, rules).await
        }
        Commands::Rules { verbose } => {
            handle_rules(verbose);
            0
        }
        Commands::Normalize { names } => {
            for name in &names {
                println!("{}", normalize(name));
            }
            0
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct Input {
    names: Vec<String>,
    json: Option<String>,
    list: Option<String>,
}

impl Input {
    fn components(self) -> anyhow::Result<Vec<String>> {
        if let Some(raw) = self.json {
            return parse_json_list(&raw).context("--json must be a JSON array of part names");
        }
        if let Some(raw) = self.list {
            return parse_delimited_list(&raw).context("--list must name at least one part");
        }
        let names: Vec<String> = self
            .names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            bail!("no parts given; pass names, --json or --list");
        }
        Ok(names)
    }
}

async fn handle_check(
    input: Input,
    catalog: &CatalogArgs,
    format: &OutputFormat,
    fail_on: &FailOn,
    strict: bool,
    rules: Vec<String>,
) -> i32 {
    match run_check(input, catalog, strict, rules).await {
        Ok(result) => {
            if let Err(e) = output_result(&result, format) {
                eprintln!("Error: {:#}", e);
                return 1;
            }
            if should_fail(&result, fail_on) {
                1
            } else {
                0
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn run_check(
    input: Input,
    catalog_args: &CatalogArgs,
    strict: bool,
    rules: Vec<String>,
) -> anyhow::Result<ValidationResult> {
    let names = input.components()?;
    let config = catalog_args.load_config()?;

    let mut options = config.validation_options();
    options.strict_mode |= strict;
    options.rules = rules;

    let known = default_rules();
    if let Some(id) = options
        .rules
        .iter()
        .find(|id| !known.iter().any(|rule| &rule.id == *id))
    {
        bail!("unknown rule '{}'; see `buildguard rules`", id);
    }

    let catalog = connect(&config.catalog).context("opening catalog")?;
    let result = BuildGuardCore::validate(&names, catalog.as_ref(), options)
        .await
        .with_context(|| format!("validating against {} catalog", catalog.name()))?;
    Ok(result)
}

fn should_fail(result: &ValidationResult, fail_on: &FailOn) -> bool {
    match fail_on {
        FailOn::Error => !result.is_valid(),
        FailOn::Warning => !result.is_valid() || result.has_warnings(),
        FailOn::Never => false,
    }
}

fn output_result(result: &ValidationResult, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => output_human(result),
        OutputFormat::Tags => output_tags(result),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }
    Ok(())
}

fn output_human(result: &ValidationResult) {
    println!("Parts checked:");
    for name in &result.components {
        println!("  - {}", name);
    }

    if !result.diagnostics.is_empty() {
        println!();
        for diagnostic in &result.diagnostics {
            println!("⚠ {}", diagnostic.message());
        }
    }

    println!("\n🔍 Validation details:");
    for outcome in &result.report.outcomes {
        match &outcome.outcome {
            RuleOutcome::Pass(message) => println!("✔ {}", message),
            RuleOutcome::Skip(message) => println!("⚠ {}", message),
            RuleOutcome::Fail(_) => {}
        }
    }

    if result.is_valid() {
        println!("\n✅ Valid build - no incompatibilities found.");
    } else {
        println!("\n❌ Invalid build:");
        for error in &result.report.errors {
            println!(" - {}", error);
        }
    }
}

fn output_tags(result: &ValidationResult) {
    for diagnostic in &result.diagnostics {
        println!("[WARN] {}", diagnostic.message());
    }
    for outcome in &result.report.outcomes {
        match &outcome.outcome {
            RuleOutcome::Pass(message) => println!("[OK] {}", message),
            RuleOutcome::Skip(message) => println!("[WARN] {}", message),
            RuleOutcome::Fail(_) => {}
        }
    }
    for error in &result.report.errors {
        println!("[ERROR] {}", error);
    }
    if result.is_valid() {
        println!("[VALID] No incompatibilities found.");
    } else {
        println!("[INVALID] {} incompatibilities found.", result.report.errors.len());
    }
}

fn handle_rules(verbose: bool) {
    println!("Available compatibility rules:\n");

    for rule in default_rules() {
        println!("  {}", rule.id);
        println!("    {}", rule.label);
        if verbose {
            println!("    {}", rule.description);
            let requires: Vec<String> = rule.requires.iter().map(|c| c.to_string()).collect();
            println!("    Requires: {}", requires.join(", "));
        }
        println!();
    }
}
