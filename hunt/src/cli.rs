//! CLI argument parsing for the hunt binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

/// Level used when neither the CLI nor the config names one
pub const DEFAULT_LOG_LEVEL: Level = Level::INFO;

#[derive(Parser, Debug)]
#[command(name = "hunt")]
#[command(author, version, about = "Location-driven treasure hunt", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Hunt definition file (overrides config)
    #[arg(long, global = true)]
    pub hunt: Option<PathBuf>,

    /// Progress file (overrides config)
    #[arg(long, global = true)]
    pub progress: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List waypoints and current progress
    Show,

    /// Begin monitoring the next waypoint
    Start,

    /// Report entering a waypoint's region
    Enter {
        /// Trigger identifier of the region
        #[arg(required = true)]
        id: String,
    },

    /// Report leaving a waypoint's region
    Exit {
        /// Trigger identifier of the region
        #[arg(required = true)]
        id: String,
    },

    /// Resume from the index carried by a notification
    Resume {
        #[arg(required = true)]
        index: usize,
    },

    /// Restart the hunt from the first waypoint
    Reset,

    /// Replay a YAML list of positions through a simulated monitor
    Simulate {
        /// Track file: a list of {latitude, longitude}
        #[arg(required = true)]
        track: PathBuf,

        /// Seconds between positions
        #[arg(short, long, default_value = "10")]
        interval: u32,
    },
}

/// Pick the log level: CLI `--log-level` > config `log_level` > INFO.
///
/// Unknown names fall back to the default with a warning on stderr.
pub fn resolve_log_level(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Level {
    match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => Level::TRACE,
        Some("DEBUG") => Level::DEBUG,
        Some("INFO") | None => Level::INFO,
        Some("WARN") | Some("WARNING") => Level::WARN,
        Some("ERROR") => Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to {}", other, DEFAULT_LOG_LEVEL);
            DEFAULT_LOG_LEVEL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_to_info() {
        assert_eq!(resolve_log_level(None, None), Level::INFO);
        assert_eq!(resolve_log_level(Some("verbose"), None), Level::INFO);
    }

    #[test]
    fn test_log_level_priority() {
        assert_eq!(resolve_log_level(None, Some("debug")), Level::DEBUG);
        assert_eq!(resolve_log_level(Some("error"), Some("debug")), Level::ERROR);
        assert_eq!(resolve_log_level(Some("Warning"), None), Level::WARN);
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from(["hunt", "-l", "debug", "simulate", "track.yml"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Simulate { interval: 10, .. }));
    }
}
