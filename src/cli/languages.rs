//! CLI command for listing the languages the registry publishes in

use crate::catalog::{CatalogService, GpcHttpClient};
use crate::Language;
use clap::Args;
use serde_json::json;

use super::CliError;

/// Languages subcommand
#[derive(Debug, Args)]
pub struct LanguagesCommand {
    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl LanguagesCommand {
    /// Fetch the language list from the registry and print it
    pub async fn execute(&self) -> Result<(), CliError> {
        self.execute_with(&GpcHttpClient::new()).await
    }

    /// Print the language list of `catalog`
    pub async fn execute_with<C>(&self, catalog: &C) -> Result<(), CliError>
    where
        C: CatalogService + ?Sized,
    {
        let languages = catalog.list_languages().await?;
        println!("{}", render(&languages, self.format)?);
        Ok(())
    }
}

/// Render `languages` in `format`
pub fn render(languages: &[Language], format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = languages
                .iter()
                .map(|l| {
                    json!({
                        "language_id": l.language_id,
                        "language_code": l.language_code,
                        "country_code": l.country_code,
                        "culture": l.culture,
                        "language_name": l.language_name,
                        "free_to_download": l.free_to_download,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows).map_err(CliError::from)
        }
        OutputFormat::Human => {
            let mut out = format!("Found {} languages:\n", languages.len());
            for l in languages {
                out.push_str(&format!(
                    "\n{:>4} | {:<4} | {:<8} | {}",
                    l.language_id, l.language_code, l.culture, l.language_name
                ));
            }
            Ok(out)
        }
    }
}
