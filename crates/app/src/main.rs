//! Varkit - Main Entry Point
//!
//! Command-line front end over a file-backed variable registry.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "varkit", version, about = "Named variables and ${name} substitution")]
struct Cli {
    /// Preference file holding the value variables
    #[arg(long, global = true, env = "VARKIT_STORE")]
    store: Option<PathBuf>,

    /// Registry settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Contribution manifest to load at startup
    #[arg(long, global = true)]
    contributions: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Expand every ${name} reference in an expression
    Substitute(SubstituteArgs),

    /// Check an expression without resolving anything
    Validate {
        /// Expression to check
        expression: String,
    },

    /// Add a value variable or update an existing one
    Set(SetArgs),

    /// Remove value variables
    Unset {
        /// Names to remove
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List registered variables
    List,

    /// List the built-in dynamic variables
    Builtins,
}

#[derive(Debug, Args)]
struct SubstituteArgs {
    /// Expression to expand
    expression: String,

    /// Expand undefined variables to nothing instead of failing
    #[arg(long)]
    lenient: bool,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Variable name
    name: String,

    /// New value
    value: String,

    /// Description to store with the variable
    #[arg(long)]
    description: Option<String>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let paths = commands::Paths {
        store: cli.store,
        settings: cli.settings,
        contributions: cli.contributions,
    };
    let output = commands::run(&paths, cli.command)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
