use anyhow::Result;
use wheelstat_analysis::config::AnalysisConfig;
use wheelstat_db::models::{Alphabet, Outcome};
use wheelstat_db::rusqlite::Connection;

use crate::prompt;

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Record(Vec<Outcome>),
    Undo,
    Stats,
    Recommend,
    History,
    Help,
    Quit,
}

/// A line of outcome values records spins; anything else is a command.
fn parse_command(input: &str, alphabet: &Alphabet) -> Option<InteractiveCommand> {
    let input = input.trim().to_lowercase();

    let values: Option<Vec<Outcome>> = input
        .split_whitespace()
        .map(|s| s.parse::<u8>().ok().map(Outcome).filter(|&o| alphabet.contains(o)))
        .collect();
    if let Some(outcomes) = values {
        if !outcomes.is_empty() {
            return Some(InteractiveCommand::Record(outcomes));
        }
    }

    match input.as_str() {
        "undo" | "u" => Some(InteractiveCommand::Undo),
        "stats" | "s" => Some(InteractiveCommand::Stats),
        "recs" | "r" | "analyze" => Some(InteractiveCommand::Recommend),
        "hist" | "history" | "h" => Some(InteractiveCommand::History),
        "help" | "?" => Some(InteractiveCommand::Help),
        "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu(alphabet: &Alphabet) {
    println!();
    println!("── Interactive mode ──");
    println!("  {}     Record one or more spins", alphabet);
    println!("  undo     Remove the last spin");
    println!("  recs     Scores and recommendations");
    println!("  stats    Full statistics");
    println!("  hist     Last spins");
    println!("  help     This menu");
    println!("  quit     Leave");
    println!();
}

pub fn run_interactive(conn: &Connection, config: &AnalysisConfig) -> Result<()> {
    println!("Welcome to wheelstat interactive mode!");
    display_menu(&config.alphabet);

    loop {
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        let result = match parse_command(&input, &config.alphabet) {
            Some(InteractiveCommand::Quit) => {
                println!("Bye!");
                break;
            }
            Some(InteractiveCommand::Record(outcomes)) => super::record_spins(conn, config, &outcomes),
            Some(InteractiveCommand::Undo) => super::cmd_undo(conn, config),
            Some(InteractiveCommand::Stats) => super::cmd_stats(conn, config),
            Some(InteractiveCommand::Recommend) => super::cmd_analyze(conn, config, false),
            Some(InteractiveCommand::History) => super::cmd_list(conn, 20),
            Some(InteractiveCommand::Help) => {
                display_menu(&config.alphabet);
                Ok(())
            }
            None => {
                println!("Unknown command: '{}'. Type an outcome ({}) or 'help'.", input, config.alphabet);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("Error: {e:#}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outcomes() {
        let alphabet = Alphabet::wheel();
        assert_eq!(
            parse_command("10", &alphabet),
            Some(InteractiveCommand::Record(vec![Outcome(10)]))
        );
        assert_eq!(
            parse_command(" 2 3  5 ", &alphabet),
            Some(InteractiveCommand::Record(vec![Outcome(2), Outcome(3), Outcome(5)]))
        );
    }

    #[test]
    fn test_parse_rejects_values_off_the_wheel() {
        let alphabet = Alphabet::wheel();
        assert_eq!(parse_command("4", &alphabet), None);
        assert_eq!(parse_command("2 4", &alphabet), None);
        assert_eq!(parse_command("300", &alphabet), None);
    }

    #[test]
    fn test_parse_command_by_name() {
        let alphabet = Alphabet::wheel();
        assert_eq!(parse_command("undo", &alphabet), Some(InteractiveCommand::Undo));
        assert_eq!(parse_command("stats", &alphabet), Some(InteractiveCommand::Stats));
        assert_eq!(parse_command("recs", &alphabet), Some(InteractiveCommand::Recommend));
        assert_eq!(parse_command("hist", &alphabet), Some(InteractiveCommand::History));
        assert_eq!(parse_command("help", &alphabet), Some(InteractiveCommand::Help));
        assert_eq!(parse_command("quit", &alphabet), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_case_insensitive() {
        let alphabet = Alphabet::wheel();
        assert_eq!(parse_command("QUIT", &alphabet), Some(InteractiveCommand::Quit));
        assert_eq!(parse_command("Undo", &alphabet), Some(InteractiveCommand::Undo));
        assert_eq!(parse_command("EXIT", &alphabet), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_unknown() {
        let alphabet = Alphabet::wheel();
        assert_eq!(parse_command("foo", &alphabet), None);
        assert_eq!(parse_command("", &alphabet), None);
        assert_eq!(parse_command("2 undo", &alphabet), None);
    }

    #[test]
    fn test_parse_respects_custom_alphabet() {
        let alphabet = Alphabet::new(&[1, 4]).unwrap();
        assert_eq!(
            parse_command("4", &alphabet),
            Some(InteractiveCommand::Record(vec![Outcome(4)]))
        );
        assert_eq!(parse_command("10", &alphabet), None);
    }
}
