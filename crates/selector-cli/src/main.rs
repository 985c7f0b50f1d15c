//! A thin driver over `selector-engine`: parse a query, print its rule
//! tree, round-trip it through `querify`, or evaluate it against JSON
//! subject fixtures. Transport and discovery (finding real subjects,
//! delivering the action) are out of scope — this is a debugging and
//! scripting aid for the engine itself.

mod fixtures;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use selector_engine::Registry;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "selector", about = "Fleet target-selection query tool", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a query and print its rule tree (debug form).
    Parse { query: String },

    /// Parse a query and print it back out via `querify`.
    Querify { query: String },

    /// Filter a pool of subjects against a query (optimistic, three-valued).
    Filter {
        query: String,
        /// JSON file holding an array of subject fixtures.
        #[arg(long)]
        subjects: PathBuf,
    },

    /// Match a query against a single subject (exact, boolean).
    Match {
        query: String,
        /// JSON file holding one subject fixture.
        #[arg(long)]
        subject: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let registry = Registry::standard();

    match cli.command {
        Command::Parse { query } => {
            let rule = registry.parse(&query).context("parsing query")?;
            println!("{rule:?}");
        }
        Command::Querify { query } => {
            let rule = registry.parse(&query).context("parsing query")?;
            println!("{}", registry.querify(&rule));
        }
        Command::Filter { query, subjects } => {
            let rule = registry.parse(&query).context("parsing query")?;
            let subjects = fixtures::load_many(&subjects)?;
            let outcome = rule.filter(&subjects).context("filtering subjects")?;
            let report = selector_core::FilterReport::new(&subjects, outcome);
            for subject in report.matched() {
                println!("matched\t{}", subject.id.as_deref().unwrap_or("<no id>"));
            }
            for subject in report.uncertain() {
                println!("uncertain\t{}", subject.id.as_deref().unwrap_or("<no id>"));
            }
        }
        Command::Match { query, subject } => {
            let rule = registry.parse(&query).context("parsing query")?;
            let subject = fixtures::load_one(&subject)?;
            println!("{}", rule.is_match(&subject).context("matching subject")?);
        }
    }

    Ok(())
}
