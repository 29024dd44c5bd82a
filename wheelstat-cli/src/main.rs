mod display;
mod interactive;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wheelstat_analysis::analyze;
use wheelstat_analysis::config::AnalysisConfig;
use wheelstat_db::db::{
    clear_history, count_events, db_path, delete_last_event, fetch_history, fetch_last_events,
    insert_events, migrate, open_db, replace_history,
};
use wheelstat_db::models::{validate_outcome, Event, Outcome};
use wheelstat_db::rusqlite::Connection;
use wheelstat_db::storage::{load_json, save_json};
use crate::display::{
    display_events, display_import_summary, display_recommendations, display_report,
    display_statistics,
};

#[derive(Parser)]
#[command(name = "wheelstat", about = "Money wheel spin history analyzer")]
struct Cli {
    /// Analysis configuration file (JSON); defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// History database (default: ./data/wheelstat.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record one or more spins, oldest first
    Add {
        /// Outcome values (e.g. 2 10 5)
        #[arg(required = true)]
        outcomes: Vec<u8>,
    },

    /// Remove the most recent spin
    Undo,

    /// List the last spins
    List {
        /// Number of spins to show
        #[arg(short, long, default_value = "20")]
        last: u32,
    },

    /// Show outcome, transition and streak statistics
    Stats,

    /// Score every outcome and recommend the next picks
    Analyze {
        /// Print the whole report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the history to a JSON file
    Export {
        /// Destination file
        #[arg(short, long, default_value = "wheelstat-export.json")]
        output: PathBuf,
    },

    /// Replace the history with the content of a JSON export
    Import {
        /// Source file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Delete the whole history
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the effective analysis configuration
    Config,

    /// Print the database path
    DbPath,

    /// Interactive mode (REPL)
    Interactive,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let config = AnalysisConfig::load(path)?;
            info!(path = %path.display(), alphabet = %config.alphabet, "loaded analysis config");
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    if let Command::Config = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let path = cli.db.unwrap_or_else(db_path);
    if let Command::DbPath = cli.command {
        println!("{}", path.display());
        return Ok(());
    }

    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Add { outcomes } => cmd_add(&conn, &config, &outcomes),
        Command::Undo => cmd_undo(&conn, &config),
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats => cmd_stats(&conn, &config),
        Command::Analyze { json } => cmd_analyze(&conn, &config, json),
        Command::Export { output } => cmd_export(&conn, &output),
        Command::Import { file } => cmd_import(&conn, &config, &file),
        Command::Clear { yes } => cmd_clear(&conn, yes),
        Command::Interactive => interactive::run_interactive(&conn, &config),
        Command::Config | Command::DbPath => Ok(()),
    }
}

fn cmd_add(conn: &Connection, config: &AnalysisConfig, values: &[u8]) -> Result<()> {
    let outcomes = values
        .iter()
        .map(|&v| validate_outcome(v, &config.alphabet))
        .collect::<Result<Vec<_>>>()?;
    record_spins(conn, config, &outcomes)
}

/// Persists the spins as one batch, then shows the refreshed recommendations.
pub(crate) fn record_spins(conn: &Connection, config: &AnalysisConfig, outcomes: &[Outcome]) -> Result<()> {
    let events: Vec<Event> = outcomes.iter().map(|&o| Event::new(o)).collect();
    insert_events(conn, &events).context("Could not record the spins")?;
    for event in &events {
        info!(id = %event.id, outcome = %event.outcome, "spin recorded");
    }

    let history = fetch_history(conn)?;
    println!("Recorded {} spin(s), {} in history.", outcomes.len(), history.len());

    let report = analyze(&history, config);
    display_recommendations(&report.recommendations);
    Ok(())
}

pub(crate) fn cmd_undo(conn: &Connection, config: &AnalysisConfig) -> Result<()> {
    match delete_last_event(conn)? {
        Some(event) => {
            println!("Removed spin {} ({}).", event.outcome, event.id);
            let history = fetch_history(conn)?;
            let report = analyze(&history, config);
            display_recommendations(&report.recommendations);
        }
        None => println!("History is empty, nothing to undo."),
    }
    Ok(())
}

pub(crate) fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_events(conn)?;
    let events = fetch_last_events(conn, last)?;
    let first_index = (n as usize).saturating_sub(events.len()) + 1;
    display_events(&events, first_index);
    Ok(())
}

pub(crate) fn cmd_stats(conn: &Connection, config: &AnalysisConfig) -> Result<()> {
    let history = fetch_history(conn)?;
    if history.is_empty() {
        println!("History is empty. Record spins first: wheelstat add <outcome>...");
        return Ok(());
    }
    let report = analyze(&history, config);
    display_statistics(&report);
    Ok(())
}

pub(crate) fn cmd_analyze(conn: &Connection, config: &AnalysisConfig, json: bool) -> Result<()> {
    let history = fetch_history(conn)?;
    let report = analyze(&history, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("(Empty history: every score is neutral.)");
    }
    display_report(&report);
    Ok(())
}

fn cmd_export(conn: &Connection, output: &Path) -> Result<()> {
    let history = fetch_history(conn)?;
    save_json(output, &history)?;
    println!("Exported {} spins to {}", history.len(), output.display());
    Ok(())
}

fn cmd_import(conn: &Connection, config: &AnalysisConfig, file: &Path) -> Result<()> {
    let result = load_json(file, &config.alphabet)?;
    let stored = replace_history(conn, &result.events)
        .context("Could not store the imported history")?;
    display_import_summary(&result, stored);
    Ok(())
}

fn cmd_clear(conn: &Connection, yes: bool) -> Result<()> {
    if !yes {
        let confirm = prompt("Delete the whole history? (y/n) : ")?;
        if confirm.to_lowercase() != "y" {
            println!("Cancelled.");
            return Ok(());
        }
    }
    let removed = clear_history(conn)?;
    println!("Removed {} spins.", removed);
    Ok(())
}

pub(crate) fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Read error")?;
    if read == 0 {
        anyhow::bail!("End of input");
    }
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["wheelstat", "add", "2", "10"]).unwrap();
        match cli.command {
            Command::Add { outcomes } => assert_eq!(outcomes, vec![2, 10]),
            _ => panic!("expected add"),
        }
        assert!(Cli::try_parse_from(["wheelstat", "add"]).is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from(["wheelstat", "analyze", "--json", "--db", "x.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert!(matches!(cli.command, Command::Analyze { json: true }));
    }

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_record_then_undo() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let config = AnalysisConfig::default();

        cmd_add(&conn, &config, &[2, 5, 5]).unwrap();
        assert_eq!(count_events(&conn).unwrap(), 3);
        assert!(cmd_add(&conn, &config, &[2, 4]).is_err());
        assert_eq!(count_events(&conn).unwrap(), 3);

        cmd_undo(&conn, &config).unwrap();
        let history = fetch_history(&conn).unwrap();
        let outcomes: Vec<u8> = history.iter().map(|e| e.outcome.value()).collect();
        assert_eq!(outcomes, vec![2, 5]);
    }

    #[test]
    fn test_failed_batch_records_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let config = AnalysisConfig::default();
        conn.execute_batch(
            "CREATE TRIGGER reject_ten BEFORE INSERT ON events WHEN NEW.outcome = 10
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        ).unwrap();

        assert!(cmd_add(&conn, &config, &[2, 3, 10]).is_err());
        assert_eq!(count_events(&conn).unwrap(), 0);
        cmd_add(&conn, &config, &[2, 3]).unwrap();
        assert_eq!(count_events(&conn).unwrap(), 2);
    }
}
