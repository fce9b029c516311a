//! Generate command - render a quotation and package it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use quotegen_core::extraction::ReferenceText;
use quotegen_core::models::quotation::{FormFields, QuotationRequest};
use quotegen_core::pipeline::{QuotationGenerator, QuotationInput};

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Reference (TDR) PDF
    #[arg(short, long)]
    reference: PathBuf,

    /// Signature image (PNG or JPEG)
    #[arg(short, long)]
    signature: PathBuf,

    /// Supplier data as JSON
    #[arg(long)]
    request: PathBuf,

    /// Template to render (default: from config)
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Output archive
    #[arg(short, long, default_value = "cotizacion.zip")]
    output: PathBuf,

    /// Quotation date, YYYY-MM-DD (default: today, or the request's date)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Also store the signature in the archive
    #[arg(long)]
    include_signature: bool,

    /// Print the extraction and render report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: GenerateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(template) = &args.template {
        config.template.path = template.clone();
    }
    if args.include_signature {
        config.package.include_signature = true;
    }

    let request = read_request(&args.request)?;
    let issues = request.validate();
    if !issues.is_empty() {
        eprintln!("{}", style("Request is incomplete:").red());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        anyhow::bail!("{} problem(s) in {}", issues.len(), args.request.display());
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading template...");
    pb.set_position(10);
    let generator = QuotationGenerator::from_config(&config)
        .with_context(|| format!("cannot load template {}", config.template.path.display()))?;

    pb.set_message("Reading reference...");
    pb.set_position(30);
    let reference = fs::read(&args.reference)
        .with_context(|| format!("cannot read {}", args.reference.display()))?;
    let signature = fs::read(&args.signature)
        .with_context(|| format!("cannot read {}", args.signature.display()))?;
    let text = ReferenceText::from_pdf(&reference)?;
    debug!("Reference text: {} chars", text.len());

    pb.set_message("Rendering quotation...");
    pb.set_position(60);
    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let form = FormFields::from_request(&request, today);
    let input = QuotationInput {
        reference: &reference,
        signature: &signature,
        form: &form,
    };
    let generated = generator.generate_from_text(&text, &input)?;

    pb.set_message("Writing archive...");
    pb.set_position(90);
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, &generated.archive)?;
    pb.finish_with_message("Done");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&generated.summary())?);
    }

    for field in generated.fields.missing() {
        eprintln!("{} {} not found in reference", style("⚠").yellow(), field);
    }
    for warning in &generated.report.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    println!(
        "{} Quotation written to {}",
        style("✓").green(),
        args.output.display()
    );
    info!("Generated in {:?}", start.elapsed());

    Ok(())
}

fn read_request(path: &Path) -> anyhow::Result<QuotationRequest> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid request in {}", path.display()))
}
