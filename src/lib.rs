//! This crate provides the core of the Turing Machine Language (TML): a lexer and parser with
//! positioned diagnostics, a compiler lowering the block-structured source into a flat
//! transition table, and an execution engine stepping a tape through that table.

pub mod analyzer;
pub mod ast;
pub mod compiler;
pub mod diagnostic;
pub mod encoder;
pub mod lexer;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod types;

/// Re-exports the `analyze` function from the analyzer module.
pub use analyzer::analyze;
/// Re-exports the compiler entry points.
pub use compiler::{compile, compile_source};
/// Re-exports the diagnostic types shared by every front-end stage.
pub use diagnostic::{Diagnostic, DiagnosticKind, Span};
/// Re-exports the JSON encoding functions from the encoder module.
pub use encoder::{decode, encode};
/// Re-exports the `tokenize` function and token types from the lexer module.
pub use lexer::{tokenize, Token, TokenKind};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct and the one-shot `run` function from the machine module.
pub use machine::{run, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `BundledProgram`, `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{BundledProgram, ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the automaton model and execution types from the types module.
pub use types::{
    Automaton, Configuration, Direction, Halt, Outcome, RunResult, RuntimeFault, State, Step,
    Symbol, TmlError, Transition, MAX_EXECUTION_STEPS, MAX_PROGRAM_SIZE,
};
