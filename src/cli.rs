use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigResult, MutationConfig};
use crate::generate::{Facts, generate_mutants};
use crate::operators::{CATALOG, Operator};
use crate::options::{LineCol, Options};
use crate::out::write_all;
use crate::report::{print_all_mutants, print_operator_counts};
use crate::run_report::GenerationReport;
use crate::ui::Ui;

const EXIT_ERROR: i32 = 1;

/// Top-level CLI arguments for the `cxx-mutant` binary.
#[derive(Debug, Parser)]
#[command(
    name = "cxx-mutant",
    version,
    about = "Source-level mutant generation for C and C++"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands supported by `cxx-mutant`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the mutation operators with their default domain and range.
    Operators,

    /// Generate mutants for one translation unit.
    Generate {
        /// Fact file exported by the compiler front end.
        #[arg(long)]
        facts: PathBuf,

        /// Run only this operator (repeatable, case-insensitive).
        #[arg(long = "operator", value_name = "NAME")]
        operators: Vec<String>,

        /// JSON file with per-operator domain and range settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Start of the mutation region, as LINE:COL.
        #[arg(long, value_name = "LINE:COL")]
        range_start: Option<LineCol>,

        /// End of the mutation region, as LINE:COL.
        #[arg(long, value_name = "LINE:COL")]
        range_end: Option<LineCol>,

        /// Keep only the first N mutants (deterministic order).
        #[arg(long)]
        limit: Option<usize>,

        /// Emit a machine-readable JSON report to stdout.
        #[arg(long)]
        json: bool,

        /// Write mutants.json, diffs and mutated sources into this directory.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print every generated mutant.
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

/// Install the stderr subscriber; `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json_and_exit(report: &GenerationReport, exit_code: i32) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize report to json")?;
    println!("{json}");
    std::process::exit(exit_code);
}

/// Parse CLI arguments and dispatch the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Operators => {
            print_catalog(&Ui::new(false));
            Ok(())
        }

        Command::Generate {
            facts,
            operators,
            config,
            range_start,
            range_end,
            limit,
            json,
            out,
            verbose,
        } => {
            let options = Options {
                facts,
                operators,
                config,
                range_start,
                range_end,
                mutant_limit: limit,
                json_output: json,
                out_dir: out,
                verbose,
            };
            generate(options)
        }
    }
}

fn load_operators(options: &Options) -> ConfigResult<Vec<Operator>> {
    let mut config = match &options.config {
        Some(path) => MutationConfig::load(path)?,
        None => MutationConfig::default(),
    };
    config.add_names(&options.operators);
    config.build()
}

fn generate(options: Options) -> Result<()> {
    let json = options.json_output;
    let mut ui = Ui::new(json);

    ui.title("cxx-mutant: generate");
    ui.line(format!("facts: {:?}", options.facts));

    // Configuration is validated before anything is loaded or traversed.
    let operators = match load_operators(&options) {
        Ok(ops) => ops,
        Err(e) => {
            if json {
                let report = GenerationReport::failure(options.facts, e.to_string());
                return print_json_and_exit(&report, EXIT_ERROR);
            }

            ui.error(format!("configuration error: {e}"));
            return Err(e.into());
        }
    };

    let facts = match Facts::load(&options.facts) {
        Ok(f) => f,
        Err(e) => {
            if json {
                let report = GenerationReport::failure(options.facts, format!("{e:#}"));
                return print_json_and_exit(&report, EXIT_ERROR);
            }

            ui.error(format!("failed to load fact file {:?}", options.facts));
            return Err(e);
        }
    };

    let region = facts.region(options.range_start, options.range_end)?;
    info!(?region, "mutation region");

    let generation = generate_mutants(&facts.tu, &facts.source, &operators, region);
    let generated = generation.mutants.len();

    let mut mutants = generation.mutants;
    if let Some(limit) = options.mutant_limit {
        mutants.truncate(limit);
    }

    let report = GenerationReport::success(
        facts.path.clone(),
        facts.source.relative_path().to_path_buf(),
        generated,
        generation.duplicates,
        generation.counts,
        mutants,
    );

    if let Some(dir) = &options.out_dir {
        write_all(dir, &facts.source, &report)?;
    }

    if json {
        let json = serde_json::to_string_pretty(&report).context("serialize report to json")?;
        println!("{json}");
        return Ok(());
    }

    ui.line(format!("source: {}", facts.source.disk_path.display()));
    ui.line(format!("generated {generated} mutants"));

    if generated == 0 {
        ui.warn("no mutants generated");
        return Ok(());
    }

    if report.mutants.len() < generated {
        ui.line(format!("kept {} mutants (of {generated})", report.mutants.len()));
    }

    print_operator_counts(&ui, &report.operators);

    if options.verbose {
        print_all_mutants(&mut ui, &facts.source, &report.mutants);
    }

    if let Some(dir) = &options.out_dir {
        ui.line(format!("outputs written to {}", dir.display()));
    }

    Ok(())
}

/// Print the operator catalog.
fn print_catalog(ui: &Ui) {
    ui.title("--- mutation operators ---");
    for spec in CATALOG {
        ui.line(format!("{:<10} {}", spec.name, spec.summary));

        if !spec.default_domain.is_empty() {
            ui.line(format!("           domain: {}", spec.default_domain.join(" ")));
        }
        if !spec.default_range.is_empty() {
            ui.line(format!("           range:  {}", spec.default_range.join(" ")));
        }
    }
}
