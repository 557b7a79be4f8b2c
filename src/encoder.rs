//! This module converts compiled automata to and from their JSON form, so that a model can be
//! stored or handed to another process and executed later.

use crate::types::{is_terminal, Automaton, State, TmlError};

/// Encodes an automaton as pretty-printed JSON.
///
/// Format:
/// ```json
/// { "alphabet": ["0", "1"], "initialState": "main0",
///   "states": { "main0": { "kind": "constant", "next": "accept", "move": "right" } } }
/// ```
pub fn encode(automaton: &Automaton) -> Result<String, TmlError> {
    Ok(serde_json::to_string_pretty(automaton)?)
}

/// Decodes an automaton from JSON and validates it.
///
/// # Returns
///
/// * `Ok(Automaton)` if the JSON is well-formed and every label it references is defined.
/// * `Err(TmlError::Serialization)` if the JSON does not describe an automaton.
/// * `Err(TmlError::ValidationError)` if the automaton is inconsistent.
pub fn decode(input: &str) -> Result<Automaton, TmlError> {
    let automaton: Automaton = serde_json::from_str(input)?;
    validate(&automaton)?;
    Ok(automaton)
}

/// Checks that a model can be executed: the alphabet is made of distinct letters, the initial
/// state exists, and every transition targets a defined or terminal label with symbols from
/// the alphabet.
pub fn validate(automaton: &Automaton) -> Result<(), TmlError> {
    for (i, letter) in automaton.alphabet.iter().enumerate() {
        if !(letter.is_ascii_lowercase() || letter.is_ascii_digit()) {
            return Err(TmlError::ValidationError(format!(
                "Invalid alphabet letter '{letter}'"
            )));
        }
        if automaton.alphabet[..i].contains(letter) {
            return Err(TmlError::ValidationError(format!(
                "Duplicate alphabet letter '{letter}'"
            )));
        }
    }

    let defined = |label: &str| is_terminal(label) || automaton.states.contains_key(label);

    if !defined(automaton.initial_state.as_str()) {
        return Err(TmlError::ValidationError(format!(
            "Invalid initial state: {}",
            automaton.initial_state
        )));
    }

    let mut undefined: Vec<&str> = automaton
        .states
        .values()
        .flat_map(|state| state.transitions())
        .map(|transition| transition.next.as_str())
        .filter(|next| !defined(*next))
        .collect();
    undefined.sort_unstable();
    undefined.dedup();

    if !undefined.is_empty() {
        return Err(TmlError::ValidationError(format!(
            "Transitions reference undefined states: {undefined:?}"
        )));
    }

    for (label, state) in &automaton.states {
        if let State::Variable { transitions } = state {
            if let Some(symbol) = transitions.keys().find(|s| !automaton.accepts_symbol(**s)) {
                return Err(TmlError::ValidationError(format!(
                    "State {label} matches symbol {symbol} outside the alphabet"
                )));
            }
        }
        if let Some(symbol) = state
            .transitions()
            .filter_map(|transition| transition.write)
            .find(|symbol| !automaton.accepts_symbol(*symbol))
        {
            return Err(TmlError::ValidationError(format!(
                "State {label} writes symbol {symbol} outside the alphabet"
            )));
        }
    }

    Ok(())
}
