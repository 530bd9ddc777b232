//! CLI command implementations

pub mod download;
pub mod error;
pub mod inspect;
pub mod languages;

pub use download::{Cli, Commands, DownloadArgs};
pub use error::CliError;
pub use inspect::InspectCommand;
pub use languages::{LanguagesCommand, OutputFormat};
