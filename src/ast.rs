//! Syntax tree produced by the parser.
//!
//! Blocks and cases are closed sum types so that every later pass matches on all of them.
//! Nodes keep the span of the source they came from for diagnostics.

use crate::diagnostic::Span;
use crate::types::{Direction, Symbol};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub alphabet: Alphabet,
    /// Never empty.
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    /// Never empty.
    pub letters: Vec<Letter>,
    pub span: Span,
}

impl Alphabet {
    pub fn values(&self) -> Vec<char> {
        self.letters.iter().map(|letter| letter.value).collect()
    }
}

/// A letter declared in the alphabet.
#[derive(Debug, Clone, PartialEq)]
pub struct Letter {
    pub value: char,
    pub span: Span,
}

/// A symbol referenced by a case or a `changeto` command.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRef {
    pub symbol: Symbol,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub identifier: Identifier,
    /// Never empty.
    pub blocks: Vec<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Basic(BasicBlock),
    Switch(SwitchBlock),
}

/// `[changeto <symbol>] [move <direction>] [<flow>]`, with at least one command present.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub write: Option<SymbolRef>,
    pub movement: Option<Direction>,
    pub flow: Option<Flow>,
    pub span: Span,
}

/// A basic block without flow command, the only body a while case accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreBlock {
    pub write: Option<SymbolRef>,
    pub movement: Option<Direction>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Goto(Identifier),
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchBlock {
    /// Never empty.
    pub cases: Vec<Case>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Case {
    If(IfCase),
    While(WhileCase),
}

impl Case {
    pub fn symbols(&self) -> &[SymbolRef] {
        match self {
            Case::If(case) => &case.symbols,
            Case::While(case) => &case.symbols,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfCase {
    pub symbols: Vec<SymbolRef>,
    /// The branch target taken when one of `symbols` is read.
    pub first: BasicBlock,
    /// Blocks reached by fallthrough from `first`.
    pub rest: Vec<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileCase {
    pub symbols: Vec<SymbolRef>,
    pub body: CoreBlock,
    pub span: Span,
}
