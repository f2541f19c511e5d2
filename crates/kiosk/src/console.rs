// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive station console for `kiosk serve`.
//!
//! Reads commands with readline history and runs them against the live
//! store. The loop blocks on stdin, so `serve` runs it on a blocking thread.

use std::sync::Arc;

use colored::Colorize;
use kiosk_core::{KioskError, ServiceId, StationId, StationStatus};
use kiosk_queue::QueueStore;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;

use crate::commands::{self, Action};

const HELP: &str = "\
commands:
  issue <service>             issue a ticket
  call <station> <service>    call the next waiting ticket
  complete <station>          mark the current ticket served
  skip <station>              mark the current ticket skipped
  open <station>              open a station
  close <station>             close a station (its ticket returns to the queue)
  status                      show the queue
  help                        show this list
  quit                        leave the console";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Run(Action),
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (verb.to_ascii_lowercase().as_str(), args) {
        ("issue", [service]) => ConsoleCommand::Run(Action::Issue {
            service: ServiceId::new(*service),
        }),
        ("call", [station, service]) => ConsoleCommand::Run(Action::Call {
            station: StationId::new(*station),
            service: ServiceId::new(*service),
        }),
        ("complete" | "done", [station]) => ConsoleCommand::Run(Action::Complete {
            station: StationId::new(*station),
        }),
        ("skip", [station]) => ConsoleCommand::Run(Action::Skip {
            station: StationId::new(*station),
        }),
        ("open", [station]) => ConsoleCommand::Run(Action::SetStatus {
            station: StationId::new(*station),
            status: StationStatus::Open,
        }),
        ("close", [station]) => ConsoleCommand::Run(Action::SetStatus {
            station: StationId::new(*station),
            status: StationStatus::Closed,
        }),
        ("status", []) => ConsoleCommand::Run(Action::Status),
        ("help" | "?", _) => ConsoleCommand::Help,
        ("quit" | "exit", []) => ConsoleCommand::Quit,
        (
            "issue" | "call" | "complete" | "done" | "skip" | "open" | "close" | "status" | "quit"
            | "exit",
            _,
        ) => return Err(format!("wrong arguments for `{verb}`; type `help`")),
        _ => return Err(format!("unknown command `{verb}`; type `help`")),
    };
    Ok(Some(command))
}

/// Run the console until `quit`, Ctrl+C, Ctrl+D, or `cancel`.
pub fn run_console(
    store: Arc<QueueStore>,
    site: &str,
    cancel: CancellationToken,
) -> Result<(), KioskError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| KioskError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{site} queue console").bold().green());
    println!("Type {} for commands, {} to exit.\n", "help".yellow(), "quit".yellow());

    let prompt = format!("{}> ", "kiosk".green());
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match rl.readline(&prompt) {
            Ok(line) => {
                if cancel.is_cancelled() {
                    break;
                }
                let command = match parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        eprintln!("{}", message.yellow());
                        continue;
                    }
                };
                let _ = rl.add_history_entry(line.trim());

                match command {
                    ConsoleCommand::Quit => break,
                    ConsoleCommand::Help => println!("{HELP}"),
                    ConsoleCommand::Run(action) => match commands::execute(&store, action) {
                        Ok(outcome) => println!("{}", commands::render(&outcome, &store, crate::display::use_color())),
                        Err(e) if e.is_user_facing() => eprintln!("{}", e.to_string().yellow()),
                        Err(e) => eprintln!("{}: {e}", "error".red()),
                    },
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(line: &str) -> Action {
        match parse_line(line) {
            Ok(Some(ConsoleCommand::Run(action))) => action,
            other => panic!("expected an action for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn parses_station_commands() {
        assert_eq!(
            run("call w1 enrollment"),
            Action::Call {
                station: StationId::new("w1"),
                service: ServiceId::new("enrollment"),
            }
        );
        assert_eq!(
            run("  CLOSE   w2 "),
            Action::SetStatus {
                station: StationId::new("w2"),
                status: StationStatus::Closed,
            }
        );
        assert_eq!(
            run("done w1"),
            Action::Complete {
                station: StationId::new("w1")
            }
        );
        assert_eq!(run("status"), Action::Status);
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn control_words() {
        assert_eq!(parse_line("quit"), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(parse_line("exit"), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(parse_line("help"), Ok(Some(ConsoleCommand::Help)));
    }

    #[test]
    fn argument_mistakes_are_reported() {
        let err = parse_line("call w1").unwrap_err();
        assert!(err.contains("wrong arguments for `call`"));
        let err = parse_line("serve w1").unwrap_err();
        assert!(err.contains("unknown command `serve`"));
    }
}
