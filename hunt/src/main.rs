//! hunt - treasure hunt driver
//!
//! CLI entry point; every command reloads progress, applies one operation and saves.

use std::path::Path;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use treasurehunt::cli::{Cli, Command, resolve_log_level};
use treasurehunt::config::Config;
use treasurehunt::{
    AdvanceResult, ConsoleNotifier, Coordinate, Hunt, HuntSession, ProgressStore, RegionMonitor, SharedTracker, SimulatedMonitor,
    Tracker, Transition, TransitionEvent,
};

type Session = HuntSession<SimulatedMonitor, ConsoleNotifier<std::io::Stdout>>;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let level = resolve_log_level(cli_log_level, config_log_level);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn load_hunt(cli: &Cli, config: &Config) -> Result<Arc<Hunt>> {
    let hunt = match cli.hunt.as_ref().or(config.hunt_path.as_ref()) {
        Some(path) => Hunt::load(path).context(format!("Failed to load hunt from {}", path.display()))?,
        None => Hunt::default_hunt(),
    };
    Ok(Arc::new(hunt))
}

fn open_session(hunt: Arc<Hunt>, store: &ProgressStore, config: &Config) -> Result<Session> {
    let cursor = store.load().context("Failed to read progress")?.unwrap_or(0);
    let tracker = Tracker::resume(hunt, cursor).context("Saved progress does not fit this hunt")?;
    Ok(HuntSession::new(
        SharedTracker::new(tracker),
        SimulatedMonitor::new(),
        ConsoleNotifier::stdout(),
        config.region.clone(),
    ))
}

fn print_advance(hunt: &Hunt, result: &AdvanceResult, session: &Session) {
    if let AdvanceResult::MonitorWaypoint { index, waypoint } = result {
        let radius = session.monitor().watched().map(|r| r.radius_meters).unwrap_or_default();
        println!(
            "{} Seeking waypoint {}/{} within {} m of {}",
            "→".cyan(),
            index + 1,
            hunt.len(),
            radius,
            waypoint.position
        );
        if let Some(hint) = hunt.hint_for(*index) {
            println!("  {}", hint.italic());
        }
    }
}

fn cmd_show(hunt: &Hunt, session: &Session) {
    let cursor = session.tracker().current_index();
    for (i, wp) in hunt.waypoints().iter().enumerate() {
        let marker = if i < cursor {
            "✓".green()
        } else if i == cursor {
            "→".cyan()
        } else {
            " ".normal()
        };
        println!("{} {:>2}. {} {}", marker, i + 1, wp.id.yellow(), wp.position.to_string().dimmed());
    }
    match hunt.hint_for(cursor) {
        Some(hint) => println!("Hint: {}", hint),
        None => println!("{}", hunt.final_message().green()),
    }
}

fn cmd_start(hunt: &Hunt, session: &mut Session) -> Result<()> {
    match session.start()? {
        Some(result) => print_advance(hunt, &result, session),
        None => println!("Already monitoring"),
    }
    Ok(())
}

fn cmd_transition(hunt: &Hunt, session: &mut Session, transition: Transition, id: String) -> Result<()> {
    let before = session.tracker().current_index();
    session.handle(&TransitionEvent::new(transition, id))?;
    if session.tracker().current_index() != before {
        cmd_start(hunt, session)?;
    }
    Ok(())
}

fn cmd_simulate(hunt: Arc<Hunt>, config: &Config, track_path: &Path, interval: u32) -> Result<()> {
    let content = std::fs::read_to_string(track_path).context(format!("Failed to read track {}", track_path.display()))?;
    let track: Vec<Coordinate> = serde_yaml::from_str(&content).context("Failed to parse track")?;

    let mut session = HuntSession::new(
        SharedTracker::new(Tracker::new(hunt.clone())),
        SimulatedMonitor::new(),
        ConsoleNotifier::stdout(),
        config.region.clone(),
    );
    let summary = session.replay(&track, Utc::now(), TimeDelta::seconds(i64::from(interval)))?;

    println!(
        "Replayed {} positions: {}/{} waypoints found{}",
        summary.positions,
        summary.final_index,
        hunt.len(),
        if summary.complete { " (complete)".green() } else { "".normal() }
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let hunt = load_hunt(&cli, &config)?;
    info!(waypoints = hunt.len(), "hunt starting");

    let progress_path = cli.progress.clone().unwrap_or_else(|| config.storage.progress_path.clone());
    let store = ProgressStore::open(&progress_path).context("Failed to open progress store")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Show => {
            let session = open_session(hunt.clone(), &store, &config)?;
            cmd_show(&hunt, &session);
        }
        Command::Start => {
            let mut session = open_session(hunt.clone(), &store, &config)?;
            cmd_start(&hunt, &mut session)?;
            store.save(session.tracker().current_index())?;
        }
        Command::Enter { id } => {
            let mut session = open_session(hunt.clone(), &store, &config)?;
            cmd_transition(&hunt, &mut session, Transition::Enter, id)?;
            store.save(session.tracker().current_index())?;
        }
        Command::Exit { id } => {
            let mut session = open_session(hunt.clone(), &store, &config)?;
            cmd_transition(&hunt, &mut session, Transition::Exit, id)?;
        }
        Command::Resume { index } => {
            let mut session = open_session(hunt.clone(), &store, &config)?;
            if let Some(result) = session.resume(index)? {
                print_advance(&hunt, &result, &session);
            }
            store.save(session.tracker().current_index())?;
        }
        Command::Reset => {
            store.clear()?;
            let mut session = open_session(hunt.clone(), &store, &config)?;
            session.reset()?;
            println!("{} Hunt reset", "✓".green());
        }
        Command::Simulate { track, interval } => {
            cmd_simulate(hunt, &config, &track, interval)?;
        }
    }

    Ok(())
}
