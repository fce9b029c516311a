//! CLI application for quotation package generation.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{cci, config, extract, generate};

/// quotegen - Generate supplier quotation packages from reference documents
#[derive(Parser)]
#[command(name = "quotegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a quotation and package it with the reference document
    Generate(generate::GenerateArgs),

    /// Extract fields from one or more reference PDFs
    Extract(extract::ExtractArgs),

    /// Derive the CCI for a bank account
    Cci(cci::CciArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate(args) => generate::run(args, cli.config.as_deref()),
        Commands::Extract(args) => extract::run(args),
        Commands::Cci(args) => cci::run(args),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}
