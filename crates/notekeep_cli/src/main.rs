//! notekeep command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, load configuration and start logging.
//! - Print one human-readable line per error and exit non-zero.

mod commands;
mod editor;

use clap::{Parser, Subcommand};
use notekeep_core::{default_log_level, init_logging, Config, LogSettings};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "notekeep",
    version,
    about = "Keep notes without caring where they live"
)]
struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Mirror debug logs to stderr
    #[arg(long, global = true, hide = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a note from an argument or from the editor
    New(commands::NewArgs),
    /// Edit a note in the editor
    #[command(alias = "edit")]
    Mod(commands::ModArgs),
    /// Print the content of a note
    Cat(commands::TargetArgs),
    /// List notes, most recently updated first
    Ls(commands::LsArgs),
    /// Remove one or more notes
    Rm(commands::RmArgs),
    /// Rename the tag of a note
    Tag(commands::TagArgs),
    /// Show or change configuration
    Config(commands::ConfigArgs),
    /// List keys currently claimed by edit sessions
    Locks,
    /// Drop an edit claim left behind by a crashed session
    Unlock(commands::UnlockArgs),
    /// Print version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = match cli.config.clone().map(Ok).unwrap_or_else(Config::default_path) {
        Ok(path) => path,
        Err(err) => return fail(&err),
    };
    let config = match Config::load_or_init(&config_path) {
        Ok(config) => config,
        Err(err) => return fail(&err),
    };

    let level = if cli.debug {
        "debug".to_string()
    } else {
        config
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string())
    };
    if let Err(err) =
        LogSettings::new(&level, &config.log_dir, cli.debug).and_then(init_logging)
    {
        eprintln!("error: unable to start logging: {err}");
        return ExitCode::FAILURE;
    }

    let context = commands::Context {
        config,
        config_path,
    };
    match commands::run(cli.command, &context) {
        Ok(()) => {
            log::debug!("event=process_exit module=cli status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=process_exit module=cli status=error error={err}");
            fail(err.as_ref())
        }
    }
}

fn fail(err: &dyn std::error::Error) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::FAILURE
}
