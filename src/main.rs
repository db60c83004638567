mod ast;
mod cli;
mod config;
mod context;
mod database;
mod generate;
mod mutant;
mod operators;
mod options;
mod out;
mod patch;
mod report;
mod run_report;
mod source;
mod span;
mod symbols;
#[cfg(test)]
mod testkit;
mod ui;

/// Entry point for the `cxx-mutant` binary.
fn main() -> anyhow::Result<()> {
    cli::run()
}
