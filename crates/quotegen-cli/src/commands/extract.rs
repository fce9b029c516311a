//! Extract command - run the field extractor over reference PDFs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error, warn};

use quotegen_core::extraction::{ExtractedFields, ReferenceText, extract_fields};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Result of processing a single file.
#[derive(Serialize)]
struct ExtractResult {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<ExtractedFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let outcome = extract_file(&path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(fields) => {
                let missing = fields.missing();
                if !missing.is_empty() {
                    warn!("{}: not found: {}", path.display(), missing.join(", "));
                }
                results.push(ExtractResult {
                    path,
                    fields: Some(fields),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ExtractResult {
                        path,
                        fields: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Extraction failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }
    pb.finish_and_clear();

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&results)?,
        OutputFormat::Csv => format_csv(&results)?,
        OutputFormat::Text => format_text(&results),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    debug!(
        "Processed {} files ({} failed) in {:?}",
        results.len(),
        failed,
        start.elapsed()
    );

    Ok(())
}

fn extract_file(path: &Path) -> anyhow::Result<ExtractedFields> {
    let data = fs::read(path)?;
    let text = ReferenceText::from_pdf(&data)?;
    if text.is_empty() {
        anyhow::bail!("No text extracted from PDF");
    }
    Ok(extract_fields(&text))
}

fn format_csv(results: &[ExtractResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "filename",
        "status",
        "servicio",
        "armada",
        "dias",
        "missing",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(fields) = &result.fields {
            wtr.write_record([
                filename,
                "success",
                &fields.servicio.value,
                &fields.armada.value,
                &fields.dias.value,
                &fields.missing().join(";"),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(results: &[ExtractResult]) -> String {
    let mut output = String::new();

    for result in results {
        output.push_str(&format!("{}\n", result.path.display()));
        match (&result.fields, &result.error) {
            (Some(fields), _) => {
                output.push_str(&format!("  Servicio: {}\n", fields.servicio.value));
                output.push_str(&format!("  Pago:     {}\n", fields.armada.value));
                let dias = match fields.days() {
                    Some(days) => format!("{} días calendario", days),
                    None => style(&fields.dias.value).yellow().to_string(),
                };
                output.push_str(&format!("  Días:     {}\n", dias));
            }
            (None, Some(error)) => output.push_str(&format!("  Error: {}\n", error)),
            (None, None) => {}
        }
        output.push('\n');
    }

    output
}
