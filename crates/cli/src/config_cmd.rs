//! `mailmatch config`: locate, create and inspect the settings file.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use mailmatch_config::Settings;

use crate::{load_settings, CliError};

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Print the settings file location
    Path,

    /// Write a commented settings file with the defaults
    #[command(after_help = "\
Examples:
  mailmatch config init
  mailmatch config init --force
  mailmatch --config ./team.json config init")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings as JSON
    Show,
}

pub(crate) fn cmd_config(explicit: Option<&Path>, cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Path => {
            println!("{}", settings_path(explicit).display());
            Ok(())
        }
        ConfigCommands::Init { force } => {
            let path = settings_path(explicit);
            Settings::write_default_file(&path, force)?;
            log::info!("wrote default settings to {}", path.display());
            eprintln!("wrote {}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let settings = load_settings(explicit)?;
            let json = serde_json::to_string_pretty(&settings).map_err(CliError::json)?;
            println!("{json}");
            Ok(())
        }
    }
}

fn settings_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(Settings::config_path)
}
