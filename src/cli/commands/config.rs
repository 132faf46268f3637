//! Config command implementation.

use crate::cli::args::{ConfigCommands, OutputFormat};
use crate::config::{Config, Paths};
use crate::error::VetboxError;
use crate::output::to_json;

/// Execute config subcommands
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written.
pub fn config(
    paths: &Paths,
    cmd: ConfigCommands,
    format: OutputFormat,
) -> Result<String, VetboxError> {
    match cmd {
        ConfigCommands::Show => {
            let config = Config::load_from_path(&paths.config_file)?;
            match format {
                OutputFormat::Json => to_json(&config),
                OutputFormat::Pretty => Ok(format!(
                    "# {}\n{}",
                    paths.config_file.display(),
                    serde_yaml::to_string(&config)?
                )),
            }
        }
        ConfigCommands::Init { force } => {
            if paths.config_file.exists() && !force {
                return Err(VetboxError::Config(format!(
                    "{} already exists, use --force to overwrite",
                    paths.config_file.display()
                )));
            }
            paths.ensure_dirs()?;
            Config::default().save_to_path(&paths.config_file)?;

            match format {
                OutputFormat::Json => to_json(&serde_json::json!({
                    "written": paths.config_file.display().to_string(),
                })),
                OutputFormat::Pretty => Ok(format!(
                    "Wrote default configuration to {}",
                    paths.config_file.display()
                )),
            }
        }
    }
}
