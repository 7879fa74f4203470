//! Analyze command - check the vehicle/tire combinations of one document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use kbacheck_core::models::filter_results;
use kbacheck_core::{
    AnalysisReport, ApprovalStatus, CodeGlossary, DocumentAnalyzer, ExtractionSource, KbaConfig,
    ValidationResult, VehicleRecord,
};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (PDF or extracted text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Only show vehicles whose name contains this text
    #[arg(long, default_value = "")]
    vehicle: String,

    /// Only show tire sizes containing this text
    #[arg(long, default_value = "")]
    tire: String,

    /// Use the rule-based parser even if the AI classifier is enabled
    #[arg(long)]
    no_ai: bool,

    /// Accept PDFs without KBA/ABE markers on the first page
    #[arg(long)]
    skip_validity_check: bool,
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

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

/// Serialized view of a report after filtering.
#[derive(Serialize)]
struct ReportOutput<'a> {
    source: ExtractionSource,
    vehicles: Vec<&'a VehicleRecord>,
    results: Vec<&'a ValidationResult>,
    warnings: &'a [String],
}

/// A vehicle with its filtered results.
struct VehicleView<'a> {
    vehicle: &'a VehicleRecord,
    results: Vec<&'a ValidationResult>,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, args.no_ai, args.skip_validity_check);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analyzing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Analyzing document...");

    // The AI client blocks, so the whole pipeline runs off the async runtime.
    let input = args.input.clone();
    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<AnalysisReport> {
        let analyzer = DocumentAnalyzer::from_config(&config)?;
        let mut glossary = super::open_glossary(&config);
        analyze_file(&input, &analyzer, &mut glossary)
    })
    .await??;

    pb.finish_and_clear();

    for warning in &report.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let output = format_report(&report, &args.vehicle, &args.tire, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Apply command-line switches on top of the loaded configuration.
pub fn apply_overrides(config: &mut KbaConfig, no_ai: bool, skip_validity_check: bool) {
    if no_ai {
        config.classifier.enabled = false;
    }
    if skip_validity_check {
        config.pdf.require_approval_markers = false;
    }
}

/// Analyze a PDF or plain-text document.
pub fn analyze_file(
    path: &Path,
    analyzer: &DocumentAnalyzer,
    glossary: &mut CodeGlossary,
) -> anyhow::Result<AnalysisReport> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            Ok(analyzer.analyze_pdf(&data, glossary)?)
        }
        "txt" => {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                anyhow::bail!("Text file is empty: {}", path.display());
            }
            Ok(analyzer.analyze_text(&text, glossary))
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

pub fn format_report(
    report: &AnalysisReport,
    vehicle_search: &str,
    tire_search: &str,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let views = vehicle_views(report, vehicle_search, tire_search);
    let results: Vec<&ValidationResult> = views
        .iter()
        .flat_map(|view| view.results.iter().copied())
        .collect();

    match format {
        OutputFormat::Json => {
            let output = ReportOutput {
                source: report.source,
                vehicles: views.iter().map(|view| view.vehicle).collect(),
                results,
                warnings: &report.warnings,
            };
            Ok(serde_json::to_string_pretty(&output)?)
        }
        OutputFormat::Csv => format_csv(&results),
        OutputFormat::Text => Ok(format_text(report.source, &views, results.len())),
    }
}

/// Pair each vehicle with its results and apply the search filters.
///
/// Results are laid out vehicle by vehicle, one per tire entry. A vehicle is
/// dropped when its name does not match, or when a tire search is given and
/// none of its tires match.
fn vehicle_views<'a>(
    report: &'a AnalysisReport,
    vehicle_search: &str,
    tire_search: &str,
) -> Vec<VehicleView<'a>> {
    let vehicle_search = vehicle_search.to_lowercase();
    let mut remaining = report.results.as_slice();
    let mut views = Vec::new();

    for vehicle in &report.vehicles {
        let (own, rest) = remaining.split_at(vehicle.tires.len().min(remaining.len()));
        remaining = rest;

        if !vehicle_search.is_empty() && !vehicle.name.to_lowercase().contains(&vehicle_search) {
            continue;
        }
        let results = filter_results(own, "", tire_search);
        if !tire_search.is_empty() && results.is_empty() {
            continue;
        }
        views.push(VehicleView { vehicle, results });
    }

    views
}

fn format_csv(results: &[&ValidationResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "vehicle",
        "tire_size",
        "status",
        "status_label",
        "dimensional_warnings",
        "restrictions",
        "notes",
        "tire_combinations",
    ])?;

    for result in results {
        let combinations: Vec<&str> = result
            .tire_combinations
            .iter()
            .map(|c| c.code.as_str())
            .collect();

        wtr.write_record([
            result.vehicle_name.as_str(),
            result.tire_size.as_str(),
            result.status.as_str(),
            result.status.german_label(),
            &result.dimensional_warnings.join("; "),
            &result.restrictions.join("; "),
            &result.notes.join("; "),
            &combinations.join("; "),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(
    source: ExtractionSource,
    views: &[VehicleView<'_>],
    combinations: usize,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Source: {}\n", source.as_str()));
    output.push_str(&format!("Vehicles: {}\n", views.len()));
    output.push_str(&format!("Combinations: {}\n", combinations));

    for view in views {
        let vehicle = view.vehicle;
        output.push('\n');
        output.push_str(&format!("{}\n", vehicle.name));

        for (attribute, value) in &vehicle.attributes {
            output.push_str(&format!("  {}: {}\n", attribute.label(), value));
        }
        for combination in &vehicle.tire_combinations {
            output.push_str(&format!(
                "  Kombination {}: {}\n",
                combination.code, combination.description
            ));
        }

        for result in &view.results {
            output.push_str(&format!(
                "  {:<14} {}\n",
                result.tire_size,
                result.status.german_label()
            ));
            if !result.dimensional_warnings.is_empty() {
                output.push_str(&format!(
                    "    Warnings: {}\n",
                    result.dimensional_warnings.join(", ")
                ));
            }
            for restriction in &result.restrictions {
                output.push_str(&format!("    Auflage: {}\n", restriction));
            }
            for note in &result.notes {
                output.push_str(&format!("    Hinweis: {}\n", note));
            }
            for combination in &result.tire_combinations {
                output.push_str(&format!("    Kombination: {}\n", combination.code));
            }
        }
    }

    output
}

/// Count results per status, in `ApprovalStatus` order.
pub fn status_counts(results: &[ValidationResult]) -> [usize; 4] {
    let mut counts = [0; 4];
    for result in results {
        let index = match result.status {
            ApprovalStatus::Approved => 0,
            ApprovalStatus::ApprovedWithRestrictions => 1,
            ApprovalStatus::ReviewRequired => 2,
            ApprovalStatus::NotApproved => 3,
        };
        counts[index] += 1;
    }
    counts
}
