//! This module defines the core data structures shared by the compiler and the execution
//! engine: tape symbols, the compiled automaton model, execution results, and error types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::diagnostic::Diagnostic;

/// Label of the absorbing accepting state.
pub const ACCEPT: &str = "accept";
/// Label of the absorbing rejecting state.
pub const REJECT: &str = "reject";
/// Keyword naming the blank symbol in source text and in serialized models.
pub const BLANK: &str = "blank";
/// Character used for the blank symbol in tape strings (input and tape windows).
pub const INPUT_BLANK_SYMBOL: char = '_';
/// The maximum allowed size for a TML program in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The default step budget for a run.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// A tape symbol: a letter of the program's alphabet or the implicit blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    Letter(char),
    Blank,
}

impl Symbol {
    /// Converts a tape-string character, mapping `_` to the blank symbol.
    pub fn from_input(c: char) -> Self {
        if c == INPUT_BLANK_SYMBOL {
            Symbol::Blank
        } else {
            Symbol::Letter(c)
        }
    }

    /// The character used for this symbol in tape strings.
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Letter(c) => *c,
            Symbol::Blank => INPUT_BLANK_SYMBOL,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Letter(c) => write!(f, "{c}"),
            Symbol::Blank => f.write_str(BLANK),
        }
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == BLANK {
            return Ok(Symbol::Blank);
        }

        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() || c.is_ascii_digit() => {
                Ok(Symbol::Letter(c))
            }
            _ => Err(format!("invalid tape symbol \"{value}\"")),
        }
    }
}

/// The direction a head moves after a transition. An absent direction keeps the head in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// The head offset applied by this direction.
    pub fn offset(&self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// A single transition of the compiled machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Label of the state entered after the transition.
    pub next: String,
    /// Symbol written under the head before moving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<Symbol>,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<Direction>,
}

impl Transition {
    pub fn to(next: impl Into<String>) -> Self {
        Self {
            next: next.into(),
            write: None,
            movement: None,
        }
    }
}

/// A compiled state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum State {
    /// One unconditional transition, taken whatever symbol is read.
    Constant(Transition),
    /// One transition per matched symbol.
    Variable {
        transitions: BTreeMap<Symbol, Transition>,
    },
}

impl State {
    /// Iterates over every transition leaving this state.
    pub fn transitions(&self) -> Box<dyn Iterator<Item = &Transition> + '_> {
        match self {
            State::Constant(transition) => Box::new(std::iter::once(transition)),
            State::Variable { transitions } => Box::new(transitions.values()),
        }
    }
}

/// A compiled Turing machine.
///
/// The model is immutable once produced by the compiler and may be shared by any number of
/// executions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automaton {
    /// The tape letters, in declaration order. The blank symbol is implicit.
    pub alphabet: Vec<char>,
    /// Label of the state the machine starts in.
    pub initial_state: String,
    pub states: BTreeMap<String, State>,
}

impl Automaton {
    pub fn state(&self, label: &str) -> Option<&State> {
        self.states.get(label)
    }

    /// Total number of transitions across all states.
    pub fn transition_count(&self) -> usize {
        self.states.values().map(|state| state.transitions().count()).sum()
    }

    /// Whether `symbol` may appear on this machine's tape.
    pub fn accepts_symbol(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::Blank => true,
            Symbol::Letter(c) => self.alphabet.contains(&c),
        }
    }
}

/// Returns true for the reserved `accept` and `reject` labels.
pub fn is_terminal(label: &str) -> bool {
    label == ACCEPT || label == REJECT
}

/// A snapshot of a running machine after a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub label: String,
    pub head: i64,
    pub symbol: Symbol,
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine performed a transition and can continue.
    Continue(Configuration),
    /// The machine cannot make any further transition.
    Halt(Halt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    Accept,
    Reject,
    Err(RuntimeFault),
}

/// Errors that abort a run without affecting the compiled model.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuntimeFault {
    /// A variable state has no transition for the symbol under the head.
    #[error("No transition defined for state {state} and symbol {symbol}")]
    UndefinedTransition { state: String, symbol: Symbol },
    /// The machine entered a label that is neither terminal nor defined.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Accept,
    Reject,
    /// The step budget was exhausted before reaching a terminal label.
    Timeout,
    Fault(RuntimeFault),
}

/// The result of running a machine with a step budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub outcome: Outcome,
    /// The written part of the tape, with `_` for blank cells.
    pub final_tape_window: String,
    pub step_count: usize,
}

/// Represents the errors surfaced by the crate's public API.
#[derive(Debug, Error)]
pub enum TmlError {
    /// A lex, syntax or compile error positioned in the source text.
    #[error(transparent)]
    Diagnostic(#[from] Diagnostic),
    /// An input tape contains a symbol outside the machine's alphabet.
    #[error("Invalid input symbol '{0}'")]
    InvalidInput(char),
    /// A model failed validation.
    #[error("Model validation error: {0}")]
    ValidationError(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}
