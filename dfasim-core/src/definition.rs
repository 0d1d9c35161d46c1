//! Automaton definition types.
//!
//! Definitions use the JSON document shape of the editor's export:
//!
//! ```json
//! {
//!   "type": "dfa",
//!   "states": ["q0", "q1", "q2"],
//!   "alphabet": ["0", "1"],
//!   "transitions": {
//!     "q0": {"0": "q0", "1": "q1"},
//!     "q1": {"0": "q2", "1": "q0"},
//!     "q2": {"0": "q1", "1": "q2"}
//!   },
//!   "initialState": "q0",
//!   "acceptingStates": ["q2"]
//! }
//! ```
//!
//! An [`Automaton`] is edited in place. Every edit leaves the transition
//! function total over the declared states and alphabet; inconsistencies the
//! editor is allowed to leave behind for a while (an undeclared initial or
//! accepting state) are returned as [`DefinitionWarning`]s instead of errors.

use crate::error::{CoreError, DefinitionWarning};
use crate::trace::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// A state identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An alphabet symbol. Usually one character, but not required to be.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the symbol in bytes of input it consumes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Picks the placeholder target for transition cells created by an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Point new cells at the first declared state (self-loop if none).
    #[default]
    FirstState,
    /// Point new cells back at the row's own state.
    SelfLoop,
}

impl FillPolicy {
    /// Returns the default target for a cell in `row`, given the declared states.
    pub fn target(&self, states: &[State], row: &State) -> State {
        match self {
            FillPolicy::FirstState => states.first().unwrap_or(row).clone(),
            FillPolicy::SelfLoop => row.clone(),
        }
    }
}

/// How the next piece of input matches the alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolMatch<'a> {
    /// The longest alphabet symbol that prefixes the input.
    Known(&'a Symbol),
    /// The next character, which starts no alphabet symbol.
    Unknown(&'a str),
    /// No input left.
    End,
}

/// Result of folding the transition function over a whole input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// State reached before the input ended or an unknown symbol was met.
    pub final_state: State,
    /// Terminal outcome (never `Pending`).
    pub outcome: Outcome,
    /// Number of symbols consumed.
    pub steps: usize,
}

/// Raw automaton definition as exported/imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatonRaw {
    /// Automaton kind; only `"dfa"` is accepted.
    #[serde(rename = "type")]
    pub kind: String,

    pub states: Vec<String>,

    #[serde(default)]
    pub alphabet: Vec<String>,

    /// Transition table as `state -> symbol -> target`.
    #[serde(default)]
    pub transitions: BTreeMap<String, BTreeMap<String, String>>,

    #[serde(default)]
    pub initial_state: String,

    #[serde(default)]
    pub accepting_states: Vec<String>,
}

/// An editable deterministic finite automaton.
#[derive(Debug, Clone, PartialEq)]
pub struct Automaton {
    /// Declared states, in declaration order.
    states: Vec<State>,

    /// Declared symbols, in declaration order.
    alphabet: Vec<Symbol>,

    /// Transitions indexed by (from_state, symbol) -> to_state.
    transitions: HashMap<(State, Symbol), State>,

    initial: State,

    /// Accepting states, in the order they were given. Set semantics.
    accepting: Vec<State>,

    fill_policy: FillPolicy,
}

impl Default for Automaton {
    fn default() -> Self {
        crate::presets::default_automaton()
    }
}

impl Automaton {
    /// Creates an automaton with no states and no symbols.
    pub fn empty(fill_policy: FillPolicy) -> Self {
        Self {
            states: Vec::new(),
            alphabet: Vec::new(),
            transitions: HashMap::new(),
            initial: State::default(),
            accepting: Vec::new(),
            fill_policy,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn alphabet(&self) -> &[Symbol] {
        &self.alphabet
    }

    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    pub fn accepting_states(&self) -> &[State] {
        &self.accepting
    }

    pub fn fill_policy(&self) -> FillPolicy {
        self.fill_policy
    }

    pub fn set_fill_policy(&mut self, policy: FillPolicy) {
        self.fill_policy = policy;
    }

    /// Returns true if the given state is declared.
    pub fn has_state(&self, state: &State) -> bool {
        self.states.contains(state)
    }

    /// Returns true if the given symbol is declared.
    pub fn has_symbol(&self, symbol: &Symbol) -> bool {
        self.alphabet.contains(symbol)
    }

    /// Returns true if the given state is accepting.
    pub fn is_accepting(&self, state: &State) -> bool {
        self.accepting.contains(state)
    }

    /// Looks up a transition cell.
    pub fn transition(&self, state: &State, symbol: &Symbol) -> Option<&State> {
        self.transitions.get(&(state.clone(), symbol.clone()))
    }

    /// Returns the target of a transition the total-function invariant
    /// guarantees to exist.
    ///
    /// # Panics
    ///
    /// Panics if the cell is missing: that means an edit broke the invariant.
    pub fn next_state(&self, state: &State, symbol: &Symbol) -> &State {
        self.transition(state, symbol).unwrap_or_else(|| {
            panic!(
                "transition function is not total: no cell for ('{}', '{}')",
                state, symbol
            )
        })
    }

    /// Matches the start of `remaining` against the alphabet.
    ///
    /// The longest matching symbol wins, so multi-character symbols are
    /// consumed whole.
    pub fn match_symbol<'a>(&'a self, remaining: &'a str) -> SymbolMatch<'a> {
        if remaining.is_empty() {
            return SymbolMatch::End;
        }

        let longest = self
            .alphabet
            .iter()
            .filter(|s| !s.is_empty() && remaining.starts_with(s.as_str()))
            .max_by_key(|s| s.len());

        match longest {
            Some(symbol) => SymbolMatch::Known(symbol),
            None => {
                let end = remaining
                    .char_indices()
                    .nth(1)
                    .map(|(i, _)| i)
                    .unwrap_or(remaining.len());
                SymbolMatch::Unknown(&remaining[..end])
            }
        }
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Replaces the state set.
    ///
    /// New rows are filled with the fill-policy target, rows for removed
    /// states are dropped, and cells that pointed at a removed state are
    /// re-targeted. The initial state moves to the first state if it was
    /// removed; accepting states are filtered to the new set.
    pub fn set_states<I, S>(&mut self, new_states: I) -> Vec<DefinitionWarning>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (states, warnings) = normalize_list(new_states);
        let states: Vec<State> = states.into_iter().map(State).collect();
        let keep: HashSet<&State> = states.iter().collect();

        self.transitions
            .retain(|(from, _), _| keep.contains(from));

        for state in &states {
            for symbol in &self.alphabet {
                let key = (state.clone(), symbol.clone());
                let target = self.fill_policy.target(&states, state);
                let cell = self.transitions.entry(key).or_insert_with(|| target.clone());
                if !keep.contains(&*cell) {
                    tracing::debug!(
                        "Re-targeting {} --{}--> {} to {}",
                        state,
                        symbol,
                        cell,
                        target
                    );
                    *cell = target;
                }
            }
        }

        if !keep.contains(&self.initial) {
            if let Some(first) = states.first() {
                self.initial = first.clone();
            }
        }

        self.accepting.retain(|s| keep.contains(s));
        self.states = states;

        log_warnings(&warnings);
        warnings
    }

    /// Replaces the alphabet, adding default columns for new symbols and
    /// dropping columns for removed ones.
    pub fn set_alphabet<I, S>(&mut self, new_alphabet: I) -> Vec<DefinitionWarning>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (symbols, warnings) = normalize_list(new_alphabet);
        let alphabet: Vec<Symbol> = symbols.into_iter().map(Symbol).collect();
        let keep: HashSet<&Symbol> = alphabet.iter().collect();

        self.transitions.retain(|(_, symbol), _| keep.contains(symbol));

        for state in &self.states {
            for symbol in &alphabet {
                let target = self.fill_policy.target(&self.states, state);
                self.transitions
                    .entry((state.clone(), symbol.clone()))
                    .or_insert(target);
            }
        }

        self.alphabet = alphabet;

        log_warnings(&warnings);
        warnings
    }

    /// Assigns the initial state.
    ///
    /// The assignment is unconditional; an undeclared state is reported and
    /// is corrected by the next [`set_states`](Self::set_states).
    pub fn set_initial_state(&mut self, state: impl Into<State>) -> Vec<DefinitionWarning> {
        let state = state.into();
        let mut warnings = Vec::new();
        if !self.has_state(&state) {
            warnings.push(DefinitionWarning::InitialNotDeclared {
                state: state.0.clone(),
            });
        }
        self.initial = state;

        log_warnings(&warnings);
        warnings
    }

    /// Replaces the accepting set.
    ///
    /// Undeclared entries are kept and reported; the next
    /// [`set_states`](Self::set_states) filters them out.
    pub fn set_accepting_states<I, S>(&mut self, list: I) -> Vec<DefinitionWarning>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (accepting, mut warnings) = normalize_list(list);
        let accepting: Vec<State> = accepting.into_iter().map(State).collect();
        for state in &accepting {
            if !self.has_state(state) {
                warnings.push(DefinitionWarning::AcceptingNotDeclared {
                    state: state.0.clone(),
                });
            }
        }
        self.accepting = accepting;

        log_warnings(&warnings);
        warnings
    }

    /// Assigns one transition cell.
    pub fn set_transition(
        &mut self,
        from: impl Into<State>,
        symbol: impl Into<Symbol>,
        to: impl Into<State>,
    ) -> Result<(), CoreError> {
        let (from, symbol, to) = (from.into(), symbol.into(), to.into());

        for state in [&from, &to] {
            if !self.has_state(state) {
                return Err(CoreError::UnknownState {
                    state: state.0.clone(),
                });
            }
        }
        if !self.has_symbol(&symbol) {
            return Err(CoreError::UnknownSymbol { symbol: symbol.0 });
        }

        self.transitions.insert((from, symbol), to);
        Ok(())
    }

    /// Adds a single state. Returns false if it was already declared.
    pub fn add_state(&mut self, state: impl Into<State>) -> bool {
        let state = state.into();
        if state.as_str().trim().is_empty() || self.has_state(&state) {
            return false;
        }

        let mut states = self.states.clone();
        states.push(state);
        self.set_states(states.into_iter().map(|s| s.0));
        true
    }

    /// Removes a single state. Returns false if it was not declared.
    pub fn remove_state(&mut self, state: &State) -> bool {
        if !self.has_state(state) {
            return false;
        }

        let states: Vec<String> = self
            .states
            .iter()
            .filter(|s| *s != state)
            .map(|s| s.0.clone())
            .collect();
        self.set_states(states);
        true
    }

    /// Adds a single symbol. Returns false if it was already declared.
    pub fn add_symbol(&mut self, symbol: impl Into<Symbol>) -> bool {
        let symbol = symbol.into();
        if symbol.as_str().trim().is_empty() || self.has_symbol(&symbol) {
            return false;
        }

        let mut alphabet = self.alphabet.clone();
        alphabet.push(symbol);
        self.set_alphabet(alphabet.into_iter().map(|s| s.0));
        true
    }

    /// Removes a single symbol. Returns false if it was not declared.
    pub fn remove_symbol(&mut self, symbol: &Symbol) -> bool {
        if !self.has_symbol(symbol) {
            return false;
        }

        let alphabet: Vec<String> = self
            .alphabet
            .iter()
            .filter(|s| *s != symbol)
            .map(|s| s.0.clone())
            .collect();
        self.set_alphabet(alphabet);
        true
    }

    /// Flips the accepting flag of a declared state.
    ///
    /// Returns the new flag, or `None` if the state is not declared.
    pub fn toggle_accepting(&mut self, state: &State) -> Option<bool> {
        if !self.has_state(state) {
            return None;
        }

        if let Some(pos) = self.accepting.iter().position(|s| s == state) {
            self.accepting.remove(pos);
            Some(false)
        } else {
            self.accepting.push(state.clone());
            Some(true)
        }
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Lists every inconsistency in the current definition.
    pub fn validate(&self) -> Vec<DefinitionWarning> {
        let mut warnings = Vec::new();

        if self.states.is_empty() {
            warnings.push(DefinitionWarning::NoStates);
        } else if !self.has_state(&self.initial) {
            warnings.push(DefinitionWarning::InitialNotDeclared {
                state: self.initial.0.clone(),
            });
        }

        for state in &self.accepting {
            if !self.has_state(state) {
                warnings.push(DefinitionWarning::AcceptingNotDeclared {
                    state: state.0.clone(),
                });
            }
        }

        for state in &self.states {
            for symbol in &self.alphabet {
                match self.transition(state, symbol) {
                    None => warnings.push(DefinitionWarning::MissingTransition {
                        state: state.0.clone(),
                        symbol: symbol.0.clone(),
                    }),
                    Some(target) if !self.has_state(target) => {
                        warnings.push(DefinitionWarning::DanglingTarget {
                            state: state.0.clone(),
                            symbol: symbol.0.clone(),
                            target: target.0.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        warnings
    }

    /// Fails with the first inconsistency if the automaton cannot be simulated.
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        match self.validate().into_iter().next() {
            Some(warning) => Err(CoreError::InvalidDefinition {
                reason: warning.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Folds the transition function over `input` from the initial state.
    pub fn evaluate(&self, input: &str) -> Evaluation {
        let mut state = &self.initial;
        let mut rest = input;
        let mut steps = 0;

        loop {
            match self.match_symbol(rest) {
                SymbolMatch::End => {
                    let outcome = if self.is_accepting(state) {
                        Outcome::Accepted
                    } else {
                        Outcome::Rejected
                    };
                    return Evaluation {
                        final_state: state.clone(),
                        outcome,
                        steps,
                    };
                }
                SymbolMatch::Unknown(symbol) => {
                    return Evaluation {
                        final_state: state.clone(),
                        outcome: Outcome::SymbolError(symbol.to_string()),
                        steps,
                    };
                }
                SymbolMatch::Known(symbol) => {
                    state = self.next_state(state, symbol);
                    rest = &rest[symbol.len()..];
                    steps += 1;
                }
            }
        }
    }

    /// Returns a crc32c fingerprint of the definition.
    pub fn checksum(&self) -> String {
        let raw = self.to_raw();
        let mut crc = 0u32;
        let mut feed = |part: &str| {
            crc = crc32c::crc32c_append(crc, part.as_bytes());
            crc = crc32c::crc32c_append(crc, &[0]);
        };

        for state in &raw.states {
            feed(state);
        }
        feed("|");
        for symbol in &raw.alphabet {
            feed(symbol);
        }
        feed("|");
        for (from, row) in &raw.transitions {
            for (symbol, to) in row {
                feed(from);
                feed(symbol);
                feed(to);
            }
        }
        feed("|");
        feed(&raw.initial_state);
        for state in &raw.accepting_states {
            feed(state);
        }

        format!("{:08x}", crc)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Builds an automaton from raw parts, filling missing cells.
    pub fn from_raw(raw: AutomatonRaw, fill_policy: FillPolicy) -> Result<Self, CoreError> {
        if raw.kind != "dfa" {
            return Err(CoreError::InvalidDefinition {
                reason: format!("expected type 'dfa', got '{}'", raw.kind),
            });
        }

        let mut automaton = Self::empty(fill_policy);
        automaton.set_states(raw.states);
        automaton.set_alphabet(raw.alphabet);

        for (from, row) in raw.transitions {
            for (symbol, to) in row {
                automaton
                    .set_transition(from.as_str(), symbol.as_str(), to.as_str())
                    .map_err(|e| CoreError::InvalidDefinition {
                        reason: format!("transition {} --{}--> {}: {}", from, symbol, to, e),
                    })?;
            }
        }

        if !raw.initial_state.is_empty() {
            automaton.set_initial_state(raw.initial_state);
        }
        automaton.set_accepting_states(raw.accepting_states);

        if let Some(warning) = automaton
            .validate()
            .into_iter()
            .find(|w| !matches!(w, DefinitionWarning::NoStates))
        {
            return Err(CoreError::InvalidDefinition {
                reason: warning.to_string(),
            });
        }

        Ok(automaton)
    }

    /// Parses an automaton from a JSON document.
    pub fn from_json(json: &serde_json::Value, fill_policy: FillPolicy) -> Result<Self, CoreError> {
        let raw: AutomatonRaw = serde_json::from_value(json.clone())?;
        Self::from_raw(raw, fill_policy)
    }

    /// Parses an automaton from JSON text.
    pub fn from_json_str(text: &str, fill_policy: FillPolicy) -> Result<Self, CoreError> {
        let raw: AutomatonRaw = serde_json::from_str(text)?;
        Self::from_raw(raw, fill_policy)
    }

    /// Returns the raw definition.
    pub fn to_raw(&self) -> AutomatonRaw {
        let mut transitions: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for ((from, symbol), to) in &self.transitions {
            transitions
                .entry(from.0.clone())
                .or_default()
                .insert(symbol.0.clone(), to.0.clone());
        }

        AutomatonRaw {
            kind: "dfa".to_string(),
            states: self.states.iter().map(|s| s.0.clone()).collect(),
            alphabet: self.alphabet.iter().map(|s| s.0.clone()).collect(),
            transitions,
            initial_state: self.initial.0.clone(),
            accepting_states: self.accepting.iter().map(|s| s.0.clone()).collect(),
        }
    }

    /// Returns the definition as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        Ok(serde_json::to_value(self.to_raw())?)
    }
}

/// Splits comma-separated editor text into trimmed, non-empty entries.
pub fn parse_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trims entries, drops blanks, and keeps the first occurrence of duplicates.
fn normalize_list<I, S>(items: I) -> (Vec<String>, Vec<DefinitionWarning>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut warnings = Vec::new();

    for item in items {
        let item: String = item.into();
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_string()) {
            out.push(item.to_string());
        } else {
            warnings.push(DefinitionWarning::DuplicateEntry {
                entry: item.to_string(),
            });
        }
    }

    (out, warnings)
}

fn log_warnings(warnings: &[DefinitionWarning]) {
    for warning in warnings {
        tracing::warn!("Definition: {}", warning);
    }
}
