//! Templates command - learn code descriptions from reference documents.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use kbacheck_core::{LearnStats, TemplateLearner};

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// Learn codes from one or more reference documents (PDF or text)
    Learn(LearnArgs),

    /// Clear the glossary and re-learn all stored templates
    Reload,

    /// List learned templates
    List,
}

#[derive(Args)]
struct LearnArgs {
    /// Reference documents
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Template name (only with a single file, default: file name)
    #[arg(short, long)]
    name: Option<String>,
}

pub async fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    match args.command {
        TemplatesCommand::Learn(learn_args) => learn(learn_args, &config),
        TemplatesCommand::Reload => reload(&config),
        TemplatesCommand::List => list(&config),
    }
}

fn learn(args: LearnArgs, config: &kbacheck_core::KbaConfig) -> anyhow::Result<()> {
    if args.name.is_some() && args.files.len() > 1 {
        anyhow::bail!("--name can only be used with a single file");
    }

    let mut glossary = super::open_glossary(config);
    let mut learner =
        TemplateLearner::new(&mut glossary).with_template_dir(&config.glossary.template_dir);

    let pb = ProgressBar::new(args.files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut total = LearnStats::default();
    for path in &args.files {
        let name = match &args.name {
            Some(name) => name.clone(),
            None => path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("template")
                .to_string(),
        };
        pb.set_message(name.clone());

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let stats = match extension.as_str() {
            "pdf" => learner.learn_from_pdf(&fs::read(path)?, &name)?,
            "txt" => learner.learn_from_text(&fs::read_to_string(path)?, &name)?,
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        };
        info!("{}: {:?}", name, stats);

        total.new += stats.new;
        total.updated += stats.updated;
        total.unchanged += stats.unchanged;
        pb.inc(1);
    }

    pb.finish_and_clear();

    println!(
        "{} Learned {} templates: {} new, {} updated, {} unchanged codes",
        style("✓").green(),
        args.files.len(),
        style(total.new).green(),
        style(total.updated).yellow(),
        total.unchanged
    );
    println!(
        "   Glossary now holds {} codes",
        learner.glossary().len()
    );

    Ok(())
}

fn reload(config: &kbacheck_core::KbaConfig) -> anyhow::Result<()> {
    let mut glossary = super::open_glossary(config);
    let mut learner =
        TemplateLearner::new(&mut glossary).with_template_dir(&config.glossary.template_dir);

    let report = learner.reload_all()?;

    println!(
        "{} Reloaded {} templates: {} new, {} updated codes",
        style("✓").green(),
        report.processed.len(),
        report.stats.new,
        report.stats.updated
    );

    if !report.failed.is_empty() {
        println!();
        println!("{}", style("Failed templates:").red());
        for (name, error) in &report.failed {
            println!("  - {}: {}", name, error);
        }
    }

    Ok(())
}

fn list(config: &kbacheck_core::KbaConfig) -> anyhow::Result<()> {
    let glossary = super::open_glossary(config);
    let templates = glossary.learned_templates();

    if templates.is_empty() {
        println!(
            "{} No templates learned yet. Run 'kbacheck templates learn <file>' first.",
            style("ℹ").blue()
        );
        return Ok(());
    }

    println!("Learned templates:");
    for template in templates {
        println!("  - {}", template);
    }
    println!();
    println!(
        "{} restrictions, {} notes",
        glossary.database().restrictions.len(),
        glossary.database().notes.len()
    );

    Ok(())
}
