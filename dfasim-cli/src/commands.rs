//! Command execution.

use crate::Commands;
use colored::Colorize;
use dfasim_core::presets::PRESET_NAMES;
use dfasim_core::{Automaton, Outcome, SimulationStatus, Snapshot, Surface};
use dfasim_player::{Frame, Player, Session};
use serde_json::{json, Value};

/// Executes a command and returns the formatted output.
pub async fn execute(
    session: &mut Session,
    cmd: Commands,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl => unreachable!(),

        Commands::Run { input } => {
            session.set_autoplay(true);
            let snapshot = session.test(&input)?;
            println!("{}", format_snapshot(&snapshot));
            let snapshot = follow(session.player()).await;
            Ok(format_outcome(&snapshot.outcome))
        }

        Commands::Check { input } => {
            let evaluation = session.automaton().evaluate(&input);
            Ok(format!(
                "{} (state {} after {} steps)",
                format_outcome(&evaluation.outcome),
                evaluation.final_state.as_str().cyan(),
                evaluation.steps
            ))
        }

        Commands::Layout { width, height } => {
            let surface = Surface::new(
                width.unwrap_or(session.surface().width),
                height.unwrap_or(session.surface().height),
            );
            session.resize(surface);
            Ok(format_json(&layout_json(&session.frame())))
        }

        Commands::Export => Ok(format_json(&session.automaton().to_json()?)),

        Commands::Presets => Ok(PRESET_NAMES
            .iter()
            .map(|name| format!("  {}", name.cyan()))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Prints every snapshot the player publishes until auto-play stops.
///
/// Ctrl+C pauses the run.
pub async fn follow(player: &Player) -> Snapshot {
    let mut rx = player.subscribe();
    rx.borrow_and_update();

    loop {
        if player.snapshot().status != SimulationStatus::Running {
            break;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if snapshot.cursor > 0 || snapshot.outcome.is_terminal() {
                    println!("{}", format_snapshot(&snapshot));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                player.pause();
                eprintln!("{}", "Paused".yellow());
                break;
            }
        }
    }

    player.snapshot()
}

/// One line describing the frame at the cursor.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let Some(current) = &snapshot.current else {
        return "No simulation".dimmed().to_string();
    };

    let step = match &snapshot.active_edge {
        Some(edge) => format!(
            "{} --{}--> {}",
            edge.from,
            edge.symbol.as_str().yellow(),
            edge.to.as_str().cyan()
        ),
        None => format!("start at {}", current.state.as_str().cyan()),
    };

    let mut line = format!(
        "[{}/{}] {}  {}{}",
        snapshot.cursor,
        snapshot.trace_len.saturating_sub(1),
        step,
        current.consumed.green(),
        current.remaining.dimmed()
    );
    if snapshot.outcome.is_terminal() {
        line.push_str(&format!("  {}", format_outcome(&snapshot.outcome)));
    } else if snapshot.status == SimulationStatus::Paused {
        line.push_str(&format!("  {}", "(paused)".dimmed()));
    }
    line
}

pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Accepted => "ACCEPTED".green().bold().to_string(),
        Outcome::Rejected => "REJECTED".red().bold().to_string(),
        Outcome::SymbolError(_) => outcome.to_string().yellow().to_string(),
        Outcome::Pending => "pending".dimmed().to_string(),
    }
}

/// Transition table with `->` marking the initial state and `*` accepting ones.
pub fn format_table(automaton: &Automaton) -> String {
    let width = automaton
        .states()
        .iter()
        .map(|s| s.as_str().len())
        .chain(automaton.alphabet().iter().map(|s| s.len()))
        .max()
        .unwrap_or(1)
        .max(5);

    let mut output = format!("{:4}{:width$}", "", "δ", width = width);
    for symbol in automaton.alphabet() {
        output.push_str(&format!(" | {:width$}", symbol.as_str(), width = width));
    }
    output.push('\n');

    for state in automaton.states() {
        let marker = match (
            state == automaton.initial_state(),
            automaton.is_accepting(state),
        ) {
            (true, true) => "->*",
            (true, false) => "-> ",
            (false, true) => "  *",
            (false, false) => "   ",
        };
        output.push_str(&format!("{} {:width$}", marker, state.as_str(), width = width));
        for symbol in automaton.alphabet() {
            let target = automaton
                .transition(state, symbol)
                .map(|s| s.as_str())
                .unwrap_or("?");
            output.push_str(&format!(" | {:width$}", target, width = width));
        }
        output.push('\n');
    }
    output
}

/// State positions of a frame as JSON, in declaration order.
pub fn layout_json(frame: &Frame) -> Value {
    let states: Vec<Value> = frame
        .states
        .iter()
        .filter_map(|state| {
            frame.positions.get(state).map(|p| {
                json!({"state": state.as_str(), "x": p.x, "y": p.y, "angle": p.angle})
            })
        })
        .collect();
    json!({
        "width": frame.surface.width,
        "height": frame.surface.height,
        "states": states,
    })
}

pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfasim_core::presets;
    use dfasim_player::Config;

    #[tokio::test]
    async fn test_layout_json_order() {
        let mut session = Session::new(presets::ends_with_01(), &Config::default()).unwrap();
        session.resize(Surface::new(800.0, 600.0));
        let value = layout_json(&session.frame());

        let states = value["states"].as_array().unwrap();
        let names: Vec<&str> = states.iter().map(|s| s["state"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["s", "s0", "s01"]);
        assert_eq!(states[0]["angle"], json!(0.0));
        assert_eq!(value["width"], json!(800.0));
    }

    #[tokio::test]
    async fn test_layout_command_resizes_session() {
        let mut session = Session::new(Automaton::default(), &Config::default()).unwrap();
        let cmd = Commands::Layout {
            width: Some(400.0),
            height: None,
        };
        let output = execute(&mut session, cmd).await.unwrap();

        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["width"], json!(400.0));
        assert_eq!(session.surface().width, 400.0);
        assert_eq!(value["states"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_format_table() {
        colored::control::set_override(false);
        let table = format_table(&presets::even_ones());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("->*"));
        assert!(lines[1].contains("odd"));
        assert!(lines[2].starts_with("   "));
    }

    #[test]
    fn test_format_snapshot_idle() {
        colored::control::set_override(false);
        assert_eq!(format_snapshot(&Snapshot::default()), "No simulation");
    }
}
