//! Glossary command - inspect learned code descriptions.

use clap::{Args, Subcommand, ValueEnum};
use console::style;

use kbacheck_core::models::CodeCategory;
use kbacheck_core::{classify_code, CodeEntry};

/// Arguments for the glossary command.
#[derive(Args)]
pub struct GlossaryArgs {
    #[command(subcommand)]
    command: GlossaryCommand,
}

#[derive(Subcommand)]
enum GlossaryCommand {
    /// List stored codes
    List {
        /// Only list one category
        #[arg(long, value_enum)]
        category: Option<CategoryFilter>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the description of a code
    Describe {
        /// Code, e.g. "A12"
        code: String,
    },

    /// Classify codes by their shape
    Classify {
        /// Codes to classify
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CategoryFilter {
    Restrictions,
    Notes,
}

impl CategoryFilter {
    fn category(self) -> CodeCategory {
        match self {
            Self::Restrictions => CodeCategory::Restriction,
            Self::Notes => CodeCategory::Note,
        }
    }
}

pub async fn run(args: GlossaryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        GlossaryCommand::Classify { codes } => {
            for code in &codes {
                println!("{}\t{}", code, classify_code(code));
            }
            Ok(())
        }
        GlossaryCommand::List { category, json } => {
            let config = super::load_config(config_path)?;
            list(&config, category, json)
        }
        GlossaryCommand::Describe { code } => {
            let config = super::load_config(config_path)?;
            let glossary = super::open_glossary(&config);
            match glossary.describe(&code) {
                Some(description) => {
                    println!("{} ({}): {}", code, classify_code(&code), description);
                    Ok(())
                }
                None => anyhow::bail!("Unknown code: {}", code),
            }
        }
    }
}

fn list(
    config: &kbacheck_core::KbaConfig,
    filter: Option<CategoryFilter>,
    json: bool,
) -> anyhow::Result<()> {
    let glossary = super::open_glossary(config);

    let categories = match filter {
        Some(filter) => vec![filter.category()],
        None => vec![CodeCategory::Restriction, CodeCategory::Note],
    };
    let entries: Vec<CodeEntry> = categories
        .into_iter()
        .flat_map(|category| glossary.entries(category))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{} Glossary is empty.", style("ℹ").blue());
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{} {:<12} {}",
            style(format!("{:<8}", entry.code.code)).bold(),
            entry.code.category.as_str(),
            entry.description
        );
    }

    Ok(())
}
