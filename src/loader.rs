//! This module provides the `ProgramLoader` struct, responsible for loading and compiling TML
//! programs from files, directories and strings.

use crate::compiler::compile_source;
use crate::types::{Automaton, TmlError, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of TML programs.
pub const PROGRAM_EXTENSION: &str = "tml";

/// `ProgramLoader` is a utility struct for loading TML programs.
/// It provides methods to load programs from individual files, from string content,
/// and to discover and load all `.tml` files within a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Reads the source text of a program, enforcing `MAX_PROGRAM_SIZE`.
    pub fn read_source(path: &Path) -> Result<String, TmlError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TmlError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if content.len() > MAX_PROGRAM_SIZE {
            return Err(TmlError::FileError(format!(
                "Program {} is too large ({} bytes, at most {} allowed)",
                path.display(),
                content.len(),
                MAX_PROGRAM_SIZE
            )));
        }

        Ok(content)
    }

    /// Loads and compiles a single program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Automaton)` if the file is successfully read and compiled.
    /// * `Err(TmlError::FileError)` if the file cannot be read or is too large.
    /// * `Err(TmlError::Diagnostic)` if the file content is not a valid program.
    pub fn load_program(path: &Path) -> Result<Automaton, TmlError> {
        let content = Self::read_source(path)?;
        debug!(path = %path.display(), "loading program");

        Self::load_program_from_string(&content)
    }

    /// Compiles a program from the provided string content.
    pub fn load_program_from_string(content: &str) -> Result<Automaton, TmlError> {
        Ok(compile_source(content)?)
    }

    /// Loads all `.tml` programs from a given directory.
    ///
    /// Directories and files with another extension are skipped. Each element of the result
    /// is either the path and compiled automaton, or the error that prevented loading it.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Automaton), TmlError>> {
        if !directory.exists() {
            return vec![Err(TmlError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TmlError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => {
                    return vec![Err(TmlError::FileError(format!(
                        "Failed to read directory entry: {}",
                        e
                    )))]
                }
            }
        }
        paths.sort();

        paths
            .into_iter()
            .filter(|path| {
                !path.is_dir() && path.extension().is_some_and(|ext| ext == PROGRAM_EXTENSION)
            })
            .map(|path| Self::load_program(&path).map(|automaton| (path, automaton)))
            .collect()
    }
}
