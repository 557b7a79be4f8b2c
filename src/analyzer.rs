//! This module provides semantic checks run on a parsed program before it is lowered.
//! The grammar already enforces the structural invariants; the checks here cover what
//! can only be known once the whole program is read: declared modules and the alphabet.

use crate::ast::{Block, Case, Flow, Program, SymbolRef};
use crate::diagnostic::Diagnostic;
use crate::types::Symbol;
use std::collections::HashSet;

/// Analyzes a parsed program for errors that survive parsing.
///
/// The checks run in source order and the first failure is returned as a `CompileError`:
/// - every alphabet letter is declared once,
/// - every module identifier is declared once,
/// - every `goto` names a declared module,
/// - every symbol used by a case or a `changeto` is `blank` or part of the alphabet,
/// - within a switch, a symbol is matched by at most one case.
pub fn analyze(program: &Program) -> Result<(), Diagnostic> {
    let mut alphabet = HashSet::new();
    for letter in &program.alphabet.letters {
        if !alphabet.insert(letter.value) {
            return Err(Diagnostic::compile(
                format!("Duplicate letter \"{}\" in the alphabet", letter.value),
                letter.span,
            ));
        }
    }

    let mut modules = HashSet::new();
    for module in &program.modules {
        if !modules.insert(module.identifier.name.as_str()) {
            return Err(Diagnostic::compile(
                format!("Duplicate module \"{}\"", module.identifier.name),
                module.identifier.span,
            ));
        }
    }

    let context = Context { alphabet, modules };
    for module in &program.modules {
        context.check_blocks(&module.blocks)?;
    }

    Ok(())
}

struct Context<'a> {
    alphabet: HashSet<char>,
    modules: HashSet<&'a str>,
}

impl Context<'_> {
    fn check_blocks(&self, blocks: &[Block]) -> Result<(), Diagnostic> {
        for block in blocks {
            match block {
                Block::Basic(block) => {
                    self.check_write(block.write.as_ref())?;
                    self.check_flow(block.flow.as_ref())?;
                }
                Block::Switch(switch) => {
                    let mut matched = HashSet::new();
                    for case in &switch.cases {
                        for symbol in case.symbols() {
                            self.check_symbol(symbol)?;
                            if !matched.insert(symbol.symbol) {
                                return Err(Diagnostic::compile(
                                    format!(
                                        "The value \"{}\" is already handled by another case",
                                        symbol.symbol
                                    ),
                                    symbol.span,
                                ));
                            }
                        }

                        match case {
                            Case::While(case) => self.check_write(case.body.write.as_ref())?,
                            Case::If(case) => {
                                self.check_write(case.first.write.as_ref())?;
                                self.check_flow(case.first.flow.as_ref())?;
                                self.check_blocks(&case.rest)?;
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn check_write(&self, write: Option<&SymbolRef>) -> Result<(), Diagnostic> {
        match write {
            Some(symbol) => self.check_symbol(symbol),
            None => Ok(()),
        }
    }

    fn check_symbol(&self, symbol: &SymbolRef) -> Result<(), Diagnostic> {
        match symbol.symbol {
            Symbol::Letter(c) if !self.alphabet.contains(&c) => Err(Diagnostic::compile(
                format!("The value \"{c}\" is not part of the alphabet"),
                symbol.span,
            )),
            _ => Ok(()),
        }
    }

    fn check_flow(&self, flow: Option<&Flow>) -> Result<(), Diagnostic> {
        match flow {
            Some(Flow::Goto(target)) if !self.modules.contains(target.name.as_str()) => {
                Err(Diagnostic::compile(
                    format!("Module \"{}\" is not defined", target.name),
                    target.span,
                ))
            }
            _ => Ok(()),
        }
    }
}
