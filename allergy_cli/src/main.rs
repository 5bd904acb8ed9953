use allergy_core::config::{TablesConfig, TablesFormat};
use allergy_core::source::open_source;
use allergy_core::*;
use clap::{Parser, Subcommand};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "allergy-risk")]
#[command(about = "Food allergy risk classification from label text and symptoms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $XDG_CONFIG_HOME/allergy-risk/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Risk tables: a TOML bundle or a directory of CSV sheets
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Risk table format (toml, csv); inferred from the path when omitted
    #[arg(long, global = true)]
    format: Option<TablesFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the allergy risk of a label
    Classify {
        /// Label text (reads stdin when neither --text nor --text-file is given)
        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,

        /// Read label text from a file
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Registered allergen (repeatable); defaults to the profile in the config
        #[arg(long = "allergen")]
        allergens: Vec<String>,

        /// Reported symptom system, e.g. respiratory (repeatable)
        #[arg(long = "symptom")]
        symptoms: Vec<String>,

        /// Symptoms appeared quickly after eating
        #[arg(long)]
        fast_onset: bool,

        /// The label claims to be free of the allergen
        #[arg(long)]
        free_label: bool,

        /// Product name recorded in the report
        #[arg(long)]
        food_name: Option<String>,

        /// Print the analysis report as JSON
        #[arg(long)]
        json: bool,

        /// Show which rules fired
        #[arg(long)]
        explain: bool,
    },

    /// Check the risk tables and list every rule or entry that would be skipped
    Validate,
}

fn main() -> ExitCode {
    // Initialize logging
    allergy_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Assessment unavailable: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let tables_config = TablesConfig {
        path: cli.tables.or(config.tables.path.clone()),
        format: cli.format.or(config.tables.format),
    };

    match cli.command {
        Commands::Classify {
            text,
            text_file,
            allergens,
            symptoms,
            fast_onset,
            free_label,
            food_name,
            json,
            explain,
        } => {
            let text = read_label_text(text, text_file)?;
            let user_allergens = if allergens.is_empty() {
                config.profile.allergens.clone()
            } else {
                allergens
            };

            let request = AnalysisRequest {
                text,
                user_allergens,
                symptoms,
                options: AnalysisOptions {
                    fast_onset,
                    free_label,
                },
            };
            cmd_classify(&tables_config, &request, food_name, json, explain)
        }
        Commands::Validate => cmd_validate(&tables_config),
    }
}

fn read_label_text(text: Option<String>, text_file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = text_file {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        tracing::warn!("No label text given; classifying symptoms only");
        return Ok(String::new());
    }
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn cmd_classify(
    tables_config: &TablesConfig,
    request: &AnalysisRequest,
    food_name: Option<String>,
    json: bool,
    explain: bool,
) -> Result<ExitCode> {
    let tables = load_configured_tables(tables_config)?;
    let classification = classify_detailed(&tables, request);
    let report = AnalysisReport::new(&classification.verdict, &request.symptoms, food_name);

    if json {
        let mut value = serde_json::to_value(&report)?;
        if explain {
            value["rules"] = serde_json::to_value(&classification.outcome)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        display_report(&report);
        if explain {
            display_outcome(&classification.outcome);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(tables_config: &TablesConfig) -> Result<ExitCode> {
    let issues = match open_source(tables_config)? {
        Some(source) => {
            let tables = source.load_tables()?;
            println!(
                "{} allergen(s), {} symptom weight(s), {} usable rule(s)",
                tables.catalog.len(),
                tables.weights.len(),
                tables.rules.len()
            );
            source.lint()?
        }
        None => {
            println!("No risk tables configured; checking built-in defaults");
            get_default_tables().catalog.validate()
        }
    };

    if issues.is_empty() {
        println!("✓ Risk tables are valid");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Found {} problem(s):", issues.len());
    for issue in &issues {
        println!("  - {}", issue);
    }
    Ok(ExitCode::FAILURE)
}

fn display_report(report: &AnalysisReport) {
    println!();
    if let Some(ref name) = report.food_name {
        println!("  {}", name);
    }
    println!("  Risk level: {}", report.final_risk);
    println!("  Score: {}", report.total_score);

    if report.detected_allergens.is_empty() {
        println!("  Detected allergens: none");
    } else {
        let names: Vec<&str> = report.detected_allergens.iter().map(String::as_str).collect();
        println!("  Detected allergens: {}", names.join(", "));
    }
    println!();
}

fn display_outcome(outcome: &RuleOutcome) {
    if outcome.fallback_applied {
        println!("  No rule fired; default score table applied");
        return;
    }

    println!("  Rules fired:");
    for matched in &outcome.matched {
        match &matched.keyword_label {
            Some(label) if !label.is_empty() => println!(
                "  → #{} {} [{}] → {}",
                matched.index, matched.condition, label, matched.risk_level
            ),
            _ => println!(
                "  → #{} {} → {}",
                matched.index, matched.condition, matched.risk_level
            ),
        }
    }
}
