//! Bundled demo programs, compiled on first use and kept in a process-wide registry.

use crate::compiler::compile_source;
use crate::types::{Automaton, TmlError};
use std::sync::RwLock;
use tracing::warn;

// Default embedded programs
const PROGRAM_TEXTS: [(&str, &str); 5] = [
    ("Divisible by 2", include_str!("../demos/is-div2.tml")),
    ("Binary increment", include_str!("../demos/binary-increment.tml")),
    ("Unary even", include_str!("../demos/unary-even.tml")),
    ("Only ones", include_str!("../demos/only-ones.tml")),
    ("Erase", include_str!("../demos/erase.tml")),
];

/// A bundled program together with its compiled form.
#[derive(Debug, Clone)]
pub struct BundledProgram {
    pub name: &'static str,
    pub source: &'static str,
    pub automaton: Automaton,
}

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<BundledProgram>> = RwLock::new(Vec::new());
}

pub struct ProgramManager;

impl ProgramManager {
    /// Compiles the embedded programs into the registry. Loading twice is a no-op.
    pub fn load() -> Result<(), TmlError> {
        let mut programs = PROGRAMS
            .write()
            .map_err(|_| TmlError::FileError("Failed to acquire write lock".to_string()))?;
        if !programs.is_empty() {
            return Ok(());
        }

        for (name, source) in PROGRAM_TEXTS {
            match compile_source(source) {
                Ok(automaton) => programs.push(BundledProgram {
                    name,
                    source,
                    automaton,
                }),
                Err(e) => warn!(name, error = %e, "failed to compile bundled program"),
            }
        }

        Ok(())
    }

    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        if let Err(e) = Self::load() {
            warn!(error = %e, "failed to load bundled programs");
        }

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<BundledProgram, TmlError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TmlError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| TmlError::ValidationError(format!("Program index {} out of range", index)))
    }

    /// Get a program by its name, ignoring case.
    pub fn get_program_by_name(name: &str) -> Result<BundledProgram, TmlError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TmlError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| TmlError::ValidationError(format!("Program '{}' not found", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<&'static str> {
        if let Err(e) = Self::load() {
            warn!(error = %e, "failed to load bundled programs");
        }

        PROGRAMS
            .read()
            .map(|programs| programs.iter().map(|program| program.name).collect())
            .unwrap_or_default()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TmlError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name,
            initial_state: program.automaton.initial_state.clone(),
            alphabet: program.automaton.alphabet.iter().collect(),
            state_count: program.automaton.states.len(),
            transition_count: program.automaton.transition_count(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: &'static str,
    pub initial_state: String,
    pub alphabet: String,
    pub state_count: usize,
    pub transition_count: usize,
}
