//! This module lowers a parsed program into an `Automaton`.
//!
//! Each module owns a zero-based label counter. Labels are allocated in source pre-order:
//! a switch block takes its label before the blocks chained inside its if cases. Lowering is
//! done in two phases per module. Block sizes fix every label up front, then the
//! transitions are written into a table indexed by label number, which lets a while case
//! target its enclosing switch before the switch state is complete.

use crate::analyzer::analyze;
use crate::ast::{BasicBlock, Block, Case, Flow, Module, Program, SwitchBlock};
use crate::diagnostic::Diagnostic;
use crate::parser::parse;
use crate::types::{Automaton, State, Transition, ACCEPT, REJECT};
use std::collections::BTreeMap;
use tracing::debug;

/// Compiles a parsed program into an automaton.
///
/// The program is analyzed first; see [`analyze`] for the checks performed.
///
/// # Returns
///
/// * `Ok(Automaton)` with one state per block.
/// * `Err(Diagnostic)` with a `CompileError` if the program is inconsistent.
pub fn compile(program: &Program) -> Result<Automaton, Diagnostic> {
    analyze(program)?;

    let first = program.modules.first().ok_or_else(|| {
        Diagnostic::compile(
            "A program should have at least one module",
            program.alphabet.span,
        )
    })?;

    let mut states = BTreeMap::new();
    for module in &program.modules {
        for (label, state) in ModuleBuilder::new(module).build() {
            if states.contains_key(&label) {
                return Err(Diagnostic::compile(
                    format!("The label \"{label}\" is defined more than once"),
                    module.identifier.span,
                ));
            }
            states.insert(label, state);
        }
    }

    let automaton = Automaton {
        alphabet: program.alphabet.values(),
        initial_state: label(&first.identifier.name, 0),
        states,
    };
    debug!(
        states = automaton.states.len(),
        transitions = automaton.transition_count(),
        initial = %automaton.initial_state,
        "compiled program"
    );

    Ok(automaton)
}

/// Parses and compiles source text in one go.
pub fn compile_source(input: &str) -> Result<Automaton, Diagnostic> {
    compile(&parse(input)?)
}

fn label(module: &str, index: usize) -> String {
    format!("{module}{index}")
}

/// Number of labels a block consumes.
fn block_size(block: &Block) -> usize {
    match block {
        Block::Basic(_) => 1,
        Block::Switch(switch) => 1 + switch
            .cases
            .iter()
            .map(|case| match case {
                Case::If(case) => sequence_size(&case.rest),
                Case::While(_) => 0,
            })
            .sum::<usize>(),
    }
}

fn sequence_size(blocks: &[Block]) -> usize {
    blocks.iter().map(block_size).sum()
}

/// Lowers the blocks of one module into a table indexed by block number.
struct ModuleBuilder<'a> {
    module: &'a Module,
    slots: Vec<Option<State>>,
}

impl<'a> ModuleBuilder<'a> {
    fn new(module: &'a Module) -> Self {
        Self {
            module,
            slots: vec![None; sequence_size(&module.blocks)],
        }
    }

    fn label(&self, index: usize) -> String {
        label(&self.module.identifier.name, index)
    }

    fn build(mut self) -> Vec<(String, State)> {
        let module = self.module;
        self.lower_sequence(&module.blocks, 0);

        let name = &module.identifier.name;
        self.slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, state)| state.map(|state| (label(name, index), state)))
            .collect()
    }

    /// Lowers `blocks` starting at label `base`. The last block of a sequence falls through
    /// to `reject`, whether the sequence is a module body or an if-case body.
    fn lower_sequence(&mut self, blocks: &'a [Block], base: usize) {
        let mut index = base;
        for (position, block) in blocks.iter().enumerate() {
            let next_index = index + block_size(block);

            match block {
                Block::Basic(block) => {
                    let fallthrough = if position + 1 < blocks.len() {
                        self.label(next_index)
                    } else {
                        REJECT.to_string()
                    };
                    self.slots[index] = Some(State::Constant(transition(block, fallthrough)));
                }
                Block::Switch(switch) => self.lower_switch(switch, index),
            }

            index = next_index;
        }
    }

    fn lower_switch(&mut self, switch: &'a SwitchBlock, index: usize) {
        let own = self.label(index);
        let mut transitions = BTreeMap::new();
        let mut cursor = index + 1;

        for case in &switch.cases {
            let change = match case {
                Case::While(case) => Transition {
                    next: own.clone(),
                    write: case.body.write.as_ref().map(|write| write.symbol),
                    movement: case.body.movement,
                },
                Case::If(case) => {
                    let fallthrough = if case.rest.is_empty() {
                        REJECT.to_string()
                    } else {
                        self.label(cursor)
                    };
                    self.lower_sequence(&case.rest, cursor);
                    cursor += sequence_size(&case.rest);

                    transition(&case.first, fallthrough)
                }
            };

            for symbol in case.symbols() {
                transitions.insert(symbol.symbol, change.clone());
            }
        }

        self.slots[index] = Some(State::Variable { transitions });
    }
}

/// The transition of a basic block: its explicit flow command, or `fallthrough`.
fn transition(block: &BasicBlock, fallthrough: String) -> Transition {
    let next = match &block.flow {
        Some(Flow::Goto(target)) => label(&target.name, 0),
        Some(Flow::Accept) => ACCEPT.to_string(),
        Some(Flow::Reject) => REJECT.to_string(),
        None => fallthrough,
    };

    Transition {
        next,
        write: block.write.as_ref().map(|write| write.symbol),
        movement: block.movement,
    }
}
