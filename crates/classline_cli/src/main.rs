//! ClassLine command-line entry point.
//!
//! # Responsibility
//! - Replay schedule plans through `classline_core` and print derived views.
//! - Expose the duration codec for quick manual checks.

mod plan;

use clap::{Parser, Subcommand};
use classline_core::{
    core_version, default_log_level, format_absolute_time, init_logging, parse_duration,
    ScheduleError,
};
use log::error;
use plan::Plan;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "classline", about = "Build and inspect class timelines")]
struct Args {
    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON plan and print each slot with its absolute interval.
    Render { plan: PathBuf },
    /// Parse an `H:MM:SS` duration into seconds.
    Duration { value: String },
    /// Format absolute seconds as `第 d 天 HH:MM:SS`.
    Format { seconds: u64 },
    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_deref() {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(args.cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cmd: Command) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Render { plan } => {
            let service = Plan::load(&plan)?.replay()?;
            let view = service.derive_view().map_err(ScheduleError::from)?;
            if view.is_empty() {
                println!("(empty timeline)");
                return Ok(());
            }
            for item in &view {
                println!("{}  {}", item.name, item.display_range());
            }
            if let Some(last) = view.last() {
                println!("total {}s", last.end);
            }
        }
        Command::Duration { value } => {
            println!("{}", parse_duration(&value)?);
        }
        Command::Format { seconds } => {
            println!("{}", format_absolute_time(seconds));
        }
        Command::Version => {
            println!("classline_core version={}", core_version());
        }
    }
    Ok(())
}
