//! Built-in example automata.

use crate::definition::{Automaton, FillPolicy, State};
use crate::error::CoreError;

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &["default", "even-ones", "ends-with-01"];

/// Looks up a preset by name.
pub fn preset(name: &str) -> Result<Automaton, CoreError> {
    match name {
        "default" => Ok(default_automaton()),
        "even-ones" => Ok(even_ones()),
        "ends-with-01" => Ok(ends_with_01()),
        _ => Err(CoreError::UnknownPreset {
            name: name.to_string(),
        }),
    }
}

/// Three states over `{0, 1}`, accepting in `q2`.
pub fn default_automaton() -> Automaton {
    build(
        &["q0", "q1", "q2"],
        &["0", "1"],
        &[
            ("q0", "0", "q0"),
            ("q0", "1", "q1"),
            ("q1", "0", "q2"),
            ("q1", "1", "q0"),
            ("q2", "0", "q1"),
            ("q2", "1", "q2"),
        ],
        "q0",
        &["q2"],
    )
}

/// Binary strings with an even number of 1s.
pub fn even_ones() -> Automaton {
    build(
        &["even", "odd"],
        &["0", "1"],
        &[
            ("even", "0", "even"),
            ("even", "1", "odd"),
            ("odd", "0", "odd"),
            ("odd", "1", "even"),
        ],
        "even",
        &["even"],
    )
}

/// Binary strings ending in `01`.
pub fn ends_with_01() -> Automaton {
    build(
        &["s", "s0", "s01"],
        &["0", "1"],
        &[
            ("s", "0", "s0"),
            ("s", "1", "s"),
            ("s0", "0", "s0"),
            ("s0", "1", "s01"),
            ("s01", "0", "s0"),
            ("s01", "1", "s"),
        ],
        "s",
        &["s01"],
    )
}

fn build(
    states: &[&str],
    alphabet: &[&str],
    cells: &[(&str, &str, &str)],
    initial: &str,
    accepting: &[&str],
) -> Automaton {
    let mut automaton = Automaton::empty(FillPolicy::FirstState);
    automaton.set_states(states.iter().copied());
    automaton.set_alphabet(alphabet.iter().copied());
    for (from, symbol, to) in cells {
        let result = automaton.set_transition(*from, *symbol, *to);
        debug_assert!(result.is_ok(), "preset cell {} --{}--> {}", from, symbol, to);
    }
    automaton.set_initial_state(State::from(initial));
    automaton.set_accepting_states(accepting.iter().copied());
    automaton
}
