//! Interactive REPL.
//!
//! The REPL is both the definition editor and the simulation control panel.

use crate::commands::{
    follow, format_json, format_outcome, format_snapshot, format_table, layout_json,
};
use colored::Colorize;
use dfasim_core::{parse_list, DefinitionWarning, SimulationStatus, Snapshot, State, Surface};
use dfasim_player::Session;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::Path;

const HELP_TEXT: &str = r#"
Definition:
  states <a,b,c>                Replace the state set
  alphabet <0,1>                Replace the alphabet
  initial <state>               Set the initial state
  accepting <a,b>               Replace the accepting set
  toggle <state>                Toggle whether a state accepts
  set <from> <symbol> <to>      Assign one transition
  show                          Show the definition and the current step
  table                         Show the transition table
  validate                      List definition problems
  load <preset|file.json>       Replace the definition

Simulation:
  test <input>                  Start a run (auto-plays if enabled)
  play                          Auto-play a paused run until it finishes
  step, forward                 Step forward once
  back                          Step back once
  pause                         Pause auto-play
  resume                        Resume auto-play in the background
  stop                          Discard the run
  speed <ms>                    Set the auto-play delay (100-1000)

Output:
  layout [width height]         Print state positions as JSON
  export                        Print the definition as JSON

  quit, exit                    Exit the REPL
"#;

pub async fn run(mut session: Session) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "dfasim".bold().cyan());
    println!(
        "Loaded automaton with {} states over {{{}}}",
        session.automaton().states().len(),
        session
            .automaton()
            .alphabet()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".dfasim_history"))
        .unwrap_or_else(|_| ".dfasim_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", "dfasim>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&mut session, line).await {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    session.player().stop();

    Ok(())
}

async fn execute_repl_command(
    session: &mut Session,
    line: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
        None => (line.to_lowercase(), ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match cmd.as_str() {
        "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(None),

        // ===== Definition =====
        "states" => {
            if rest.is_empty() {
                return Ok(Some(join_states(session.automaton().states())));
            }
            let warnings = session.edit(|a| a.set_states(parse_list(rest)));
            Ok(Some(edited(warnings, session)))
        }

        "alphabet" => {
            if rest.is_empty() {
                let symbols: Vec<&str> = session
                    .automaton()
                    .alphabet()
                    .iter()
                    .map(|s| s.as_str())
                    .collect();
                return Ok(Some(symbols.join(", ")));
            }
            let warnings = session.edit(|a| a.set_alphabet(parse_list(rest)));
            Ok(Some(edited(warnings, session)))
        }

        "initial" => {
            if args.is_empty() {
                return Ok(Some(session.automaton().initial_state().to_string()));
            }
            let warnings = session.edit(|a| a.set_initial_state(args[0]));
            Ok(Some(edited(warnings, session)))
        }

        "accepting" => {
            if rest.is_empty() {
                return Ok(Some(join_states(session.automaton().accepting_states())));
            }
            let warnings = session.edit(|a| a.set_accepting_states(parse_list(rest)));
            Ok(Some(edited(warnings, session)))
        }

        "toggle" => {
            if args.is_empty() {
                return Ok(Some("Usage: toggle <state>".to_string()));
            }
            let state = State::from(args[0]);
            match session.edit(|a| a.toggle_accepting(&state)) {
                Some(true) => Ok(Some(format!("{} now accepts", state.as_str().cyan()))),
                Some(false) => Ok(Some(format!(
                    "{} no longer accepts",
                    state.as_str().cyan()
                ))),
                None => Ok(Some(format!("Unknown state: {}", state).yellow().to_string())),
            }
        }

        "set" => {
            if args.len() != 3 {
                return Ok(Some("Usage: set <from> <symbol> <to>".to_string()));
            }
            session.edit(|a| a.set_transition(args[0], args[1], args[2]))?;
            Ok(Some(format!(
                "{} --{}--> {}",
                args[0],
                args[1].yellow(),
                args[2].cyan()
            )))
        }

        "show" => {
            let mut output = format_table(session.automaton());
            if session.is_stale() {
                output.push_str(&format!(
                    "{}\n",
                    "(edited since the last run started)".dimmed()
                ));
            }
            output.push('\n');
            let frame = session.frame();
            output.push_str(&format_snapshot(&frame.snapshot));
            if !frame.traversed.is_empty() {
                output.push_str("\nPath:");
                for edge in frame.traversed {
                    output.push_str(&format!("\n  {} --{}--> {}", edge.from, edge.symbol, edge.to));
                }
            }
            Ok(Some(output))
        }

        "table" => Ok(Some(format_table(session.automaton()))),

        "validate" => {
            let warnings = session.automaton().validate();
            if warnings.is_empty() {
                return Ok(Some("Definition is valid".green().to_string()));
            }
            Ok(Some(format_warnings(&warnings)))
        }

        "load" => {
            if args.is_empty() {
                return Ok(Some("Usage: load <preset|file.json>".to_string()));
            }
            if args[0].ends_with(".json") {
                session.load_file(Path::new(args[0]))?;
            } else {
                session.load_preset(args[0])?;
            }
            Ok(Some(format!(
                "{} {}\n{}",
                "Loaded".green(),
                args[0].cyan(),
                format_table(session.automaton())
            )))
        }

        // ===== Simulation =====
        "test" => {
            let snapshot = session.test(rest)?;
            if snapshot.status == SimulationStatus::Running {
                println!("{}", format_snapshot(&snapshot));
                let snapshot = follow(session.player()).await;
                return Ok(Some(summary(&snapshot)));
            }
            Ok(Some(format_snapshot(&snapshot)))
        }

        "play" => {
            let player = session.player();
            if player.snapshot().status == SimulationStatus::Paused {
                player.resume()?;
            }
            if player.snapshot().status != SimulationStatus::Running {
                return Ok(Some("Nothing to play; start a run with 'test <input>'".to_string()));
            }
            let snapshot = follow(player).await;
            Ok(Some(summary(&snapshot)))
        }

        "step" | "forward" | "s" => {
            let snapshot = session.player().step_forward()?;
            Ok(Some(format_snapshot(&snapshot)))
        }

        "back" | "b" => {
            let snapshot = session.player().step_back()?;
            Ok(Some(format_snapshot(&snapshot)))
        }

        "pause" => Ok(Some(format_snapshot(&session.player().pause()))),

        "resume" => {
            let snapshot = session.player().resume()?;
            Ok(Some(format!(
                "{} (use 'show' to check progress)",
                format_snapshot(&snapshot)
            )))
        }

        "stop" => {
            session.player().stop();
            Ok(Some("Stopped".dimmed().to_string()))
        }

        "speed" => {
            let Some(ms) = args.first() else {
                let speed = session.player().with_engine(|engine| engine.speed());
                return Ok(Some(format!("{} ms", speed.as_millis())));
            };
            let speed = session.player().set_speed(ms.parse()?);
            Ok(Some(format!("Speed set to {} ms", speed.as_millis())))
        }

        // ===== Output =====
        "layout" => {
            if args.len() == 2 {
                session.resize(Surface::new(args[0].parse()?, args[1].parse()?));
            }
            Ok(Some(format_json(&layout_json(&session.frame()))))
        }

        "export" => Ok(Some(format_json(&session.automaton().to_json()?))),

        _ => Ok(Some(format!(
            "Unknown command: {}. Type 'help' for help.",
            cmd
        ))),
    }
}

fn summary(snapshot: &Snapshot) -> String {
    match snapshot.status {
        SimulationStatus::Completed => format!(
            "{} after {} steps",
            format_outcome(&snapshot.outcome),
            snapshot.cursor
        ),
        _ => format_snapshot(snapshot),
    }
}

fn edited(warnings: Vec<DefinitionWarning>, session: &Session) -> String {
    let mut output = format_table(session.automaton());
    if !warnings.is_empty() {
        output.push_str(&format_warnings(&warnings));
    }
    output
}

fn format_warnings(warnings: &[DefinitionWarning]) -> String {
    warnings
        .iter()
        .map(|w| format!("{}: {}", "Warning".yellow(), w))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_states(states: &[State]) -> String {
    states
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfasim_core::{Automaton, Outcome};
    use dfasim_player::config::Config as SimConfig;

    fn manual_session() -> Session {
        let mut config = SimConfig::default();
        config.simulation.autoplay = false;
        Session::new(Automaton::default(), &config).unwrap()
    }

    #[tokio::test]
    async fn test_edit_commands() {
        let mut session = manual_session();

        execute_repl_command(&mut session, "states q0, q1, q2, q3")
            .await
            .unwrap();
        assert_eq!(session.automaton().states().len(), 4);

        execute_repl_command(&mut session, "set q3 0 q1").await.unwrap();
        assert_eq!(
            session
                .automaton()
                .transition(&State::from("q3"), &"0".into())
                .map(|s| s.as_str()),
            Some("q1")
        );

        let err = execute_repl_command(&mut session, "set q9 0 q1").await;
        assert!(err.is_err());

        execute_repl_command(&mut session, "toggle q3").await.unwrap();
        assert!(session.automaton().is_accepting(&State::from("q3")));
    }

    #[tokio::test]
    async fn test_simulation_commands() {
        let mut session = manual_session();

        execute_repl_command(&mut session, "test 10").await.unwrap();
        for _ in 0..3 {
            execute_repl_command(&mut session, "step").await.unwrap();
        }
        assert_eq!(session.player().snapshot().outcome, Outcome::Accepted);

        execute_repl_command(&mut session, "back").await.unwrap();
        let snapshot = session.player().snapshot();
        assert_eq!(snapshot.cursor, 1);
        assert_eq!(snapshot.outcome, Outcome::Pending);

        execute_repl_command(&mut session, "stop").await.unwrap();
        assert_eq!(session.player().snapshot().status, SimulationStatus::Idle);
    }

    #[tokio::test]
    async fn test_layout_and_show_use_frame() {
        colored::control::set_override(false);
        let mut session = manual_session();

        let output = execute_repl_command(&mut session, "layout 400 200")
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["height"], serde_json::json!(200.0));
        assert_eq!(value["states"][0]["state"], serde_json::json!("q0"));
        assert_eq!(session.surface(), Surface::new(400.0, 200.0));

        execute_repl_command(&mut session, "test 10").await.unwrap();
        execute_repl_command(&mut session, "step").await.unwrap();
        let output = execute_repl_command(&mut session, "show")
            .await
            .unwrap()
            .unwrap();
        assert!(output.contains("Path:\n  q0 --1--> q1"));
    }

    #[tokio::test]
    async fn test_empty_test_input() {
        let mut session = manual_session();
        let err = execute_repl_command(&mut session, "test").await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_quit() {
        let mut session = manual_session();
        assert!(execute_repl_command(&mut session, "quit")
            .await
            .unwrap()
            .is_none());
    }
}
