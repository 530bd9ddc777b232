//! Inspect subcommand: summarize a downloaded JSON publication

use crate::taxonomy;
use crate::Categories;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use super::languages::OutputFormat;
use super::CliError;

/// Parse a downloaded JSON publication and print what it contains
#[derive(Parser, Debug)]
pub struct InspectCommand {
    /// Publication file (JSON format)
    pub file: PathBuf,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

impl InspectCommand {
    /// Execute the inspect command
    pub fn execute(&self) -> Result<(), CliError> {
        let document = taxonomy::parse_file(&self.file)?;
        println!("{}", summarize(&document, self.format)?);
        Ok(())
    }
}

/// Summary of `document`: language, as-of date and node counts per level
pub fn summarize(document: &Categories, format: OutputFormat) -> Result<String, CliError> {
    let levels = document.level_counts();
    match format {
        OutputFormat::Json => {
            let levels: Vec<_> = levels
                .iter()
                .map(|(level, count)| json!({ "level": level, "count": count }))
                .collect();
            serde_json::to_string_pretty(&json!({
                "language_code": document.language_code,
                "date_utc": document.date_utc,
                "categories": document.node_count(),
                "levels": levels,
            }))
            .map_err(CliError::from)
        }
        OutputFormat::Human => {
            let mut out = format!(
                "Language:   {}\nAs of:      {}\nCategories: {}",
                document.language_code,
                document.date_utc,
                document.node_count()
            );
            for (level, count) in levels {
                out.push_str(&format!("\n  level {level}: {count}"));
            }
            Ok(out)
        }
    }
}
