//! gridform CLI - check and calculate formula fields

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use gridform::prelude::*;
use gridform::{
    builtin_functions, evaluate, format_value, parse, parse_date, record_from_str,
    record_to_json, EvaluationContext,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridform")]
#[command(author, version, about = "Formula field checker and calculator")]
struct Cli {
    /// Log registry activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a formula and list the fields it reads
    Check {
        /// Formula source, e.g. "{Price} * {Quantity}"
        formula: String,
    },

    /// Evaluate a formula against a record
    Eval {
        /// Formula source
        formula: String,

        /// Record as a JSON object (default: empty record)
        #[arg(short, long)]
        record: Option<PathBuf>,

        /// Display format: number, currency, percentage, date, datetime, text
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Decimal places for numeric formats
        #[arg(short, long, default_value = "2")]
        decimals: u32,

        /// Instant used by TODAY()/NOW() (default: current time)
        #[arg(long)]
        now: Option<String>,
    },

    /// Calculate every formula field of a record
    Calc {
        /// Formula field configuration (JSON)
        #[arg(long)]
        fields: PathBuf,

        /// Record as a JSON object
        #[arg(short, long)]
        record: PathBuf,

        /// Print the updated record as JSON instead of a field listing
        #[arg(long)]
        json: bool,

        /// Instant used by TODAY()/NOW() (default: current time)
        #[arg(long)]
        now: Option<String>,
    },

    /// Show the calculation order and dependents of each formula field
    Deps {
        /// Formula field configuration (JSON)
        #[arg(long)]
        fields: PathBuf,
    },

    /// List the built-in functions
    Functions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { formula } => check(&formula),
        Commands::Eval {
            formula,
            record,
            format,
            decimals,
            now,
        } => eval(&formula, record.as_deref(), &format, decimals, now.as_deref()),
        Commands::Calc {
            fields,
            record,
            json,
            now,
        } => calc(&fields, &record, json, now.as_deref()),
        Commands::Deps { fields } => deps(&fields),
        Commands::Functions => list_functions(),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn check(formula: &str) -> Result<()> {
    let result = parse(formula);

    match &result.error {
        None => {
            println!("Valid formula");
            if let Some(ast) = &result.ast {
                println!("Parsed as: {}", ast);
            }
        }
        Some(err) => println!("Invalid formula: {}", err),
    }

    if !result.dependencies.is_empty() {
        let deps: Vec<&str> = result.dependencies.iter().map(String::as_str).collect();
        println!("Dependencies: {}", deps.join(", "));
    }

    if !result.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn eval(
    formula: &str,
    record_path: Option<&Path>,
    format: &str,
    decimals: u32,
    now: Option<&str>,
) -> Result<()> {
    let format: DisplayFormat = format.parse()?;
    let record = match record_path {
        Some(path) => load_record(path)?,
        None => Record::new(),
    };

    let (ast, _) = parse(formula)
        .into_result()
        .context("Failed to parse formula")?;

    let mut ctx = EvaluationContext::new(&record);
    if let Some(now) = parse_now(now)? {
        ctx = ctx.with_now(now);
    }

    let value = evaluate(&ast, &ctx).context("Failed to evaluate formula")?;
    println!("{}", format_value(&value, format, decimals));
    Ok(())
}

fn calc(fields_path: &Path, record_path: &Path, json: bool, now: Option<&str>) -> Result<()> {
    let registry = load_registry(fields_path)?;
    let mut record = load_record(record_path)?;

    let options = CalculationOptions {
        now: parse_now(now)?,
        ..Default::default()
    };
    let report = registry.calculate_all_with_options(&mut record, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&record_to_json(&record))?);
    } else {
        let width = report
            .results
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);

        for (name, result) in &report.results {
            match &result.error {
                None => println!("{:width$}  {}", name, result.formatted_value),
                Some(err) => println!("{:width$}  {} ({})", name, result.formatted_value, err),
            }
        }
    }

    eprintln!(
        "Calculated {} fields ({} errors)",
        report.fields_calculated, report.errors
    );
    Ok(())
}

fn deps(fields_path: &Path) -> Result<()> {
    let registry = load_registry(fields_path)?;

    println!("Calculation order:");
    for (i, name) in registry.calculation_order().iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }

    println!();
    println!("Fields:");
    for config in registry.iter() {
        let reads: Vec<&str> = config.dependencies.iter().map(String::as_str).collect();
        println!("  {} = {}", config.name, config.formula);
        println!("    reads: {}", reads.join(", "));

        let dependents = registry.dependents_of(&config.name);
        if !dependents.is_empty() {
            println!("    read by: {}", dependents.join(", "));
        }
    }
    Ok(())
}

fn list_functions() -> Result<()> {
    let functions = builtin_functions();

    for name in functions.names() {
        let Some(def) = functions.get(name) else {
            continue;
        };
        let arity = match def.max_args {
            Some(max) if max == def.min_args => format!("{}", max),
            Some(max) => format!("{}-{}", def.min_args, max),
            None => format!("{}+", def.min_args),
        };
        println!("{:12} {:8} {:?}", name, arity, def.category);
    }
    Ok(())
}

fn load_registry(path: &Path) -> Result<FormulaFieldRegistry> {
    let registry = FormulaFieldRegistry::load(path)
        .with_context(|| format!("Failed to load formula fields from '{}'", path.display()))?;
    debug!(path = %path.display(), fields = registry.len(), "loaded formula fields");
    Ok(registry)
}

fn load_record(path: &Path) -> Result<Record> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    record_from_str(&json).with_context(|| format!("Invalid record in '{}'", path.display()))
}

fn parse_now(now: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match now {
        None => Ok(None),
        Some(s) => match parse_date(s) {
            Some(d) => Ok(Some(d)),
            None => bail!("Invalid --now value '{}': expected a date or RFC 3339 time", s),
        },
    }
}
