//! This module provides the recursive-descent parser for TML programs.
//! It consumes the token stream produced by the lexer and builds an `ast::Program`, stopping
//! at the first malformed construct with a positioned `SyntaxError` diagnostic.

use crate::{
    ast::{
        Alphabet, BasicBlock, Block, Case, CoreBlock, Flow, Identifier, IfCase, Letter, Module,
        Program, SwitchBlock, SymbolRef, WhileCase,
    },
    diagnostic::{Diagnostic, Span},
    lexer::{tokenize, Token, TokenKind},
    types::{Direction, Symbol, BLANK},
};

/// Parses the given source text into a syntax tree.
///
/// This is the main entry point for reading TML programs. Parsing stops at the first error;
/// there is no recovery.
///
/// # Returns
///
/// * `Ok(Program)` if the input is a well-formed program.
/// * `Err(Diagnostic)` with a `LexError` or `SyntaxError` otherwise.
pub fn parse(input: &str) -> Result<Program, Diagnostic> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(Diagnostic::syntax("Empty file", Span::empty_file()));
    }

    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let alphabet = self.parse_alphabet()?;
        if self.peek().is_none() {
            return Err(Diagnostic::syntax(
                "A program should have at least one module",
                alphabet.span,
            ));
        }

        let mut modules = Vec::new();
        while self.peek().is_some() {
            modules.push(self.parse_module()?);
        }

        Ok(Program { alphabet, modules })
    }

    /// `alphabet = { <letter> (, <letter>)* }`
    fn parse_alphabet(&mut self) -> Result<Alphabet, Diagnostic> {
        let start = self.expect("alphabet")?;
        self.expect("=")?;
        self.expect("{")?;

        if self.peek_is("}") {
            let close = self.advance()?;
            return Err(Diagnostic::syntax(
                "The alphabet must have at least one letter",
                start.span.to(&close.span),
            ));
        }

        let mut letters = vec![self.parse_letter()?];
        loop {
            let token = self.advance()?;
            match token.text.as_str() {
                "," => letters.push(self.parse_letter()?),
                "}" => {
                    return Ok(Alphabet {
                        letters,
                        span: start.span.to(&token.span),
                    })
                }
                _ => return Err(expected(&token, "}")),
            }
        }
    }

    fn parse_letter(&mut self) -> Result<Letter, Diagnostic> {
        let token = self.advance()?;
        Ok(Letter {
            value: letter_value(&token)?,
            span: token.span,
        })
    }

    /// A letter or `blank`.
    fn parse_symbol(&mut self) -> Result<SymbolRef, Diagnostic> {
        let token = self.advance()?;
        let symbol = if token.is(BLANK) {
            Symbol::Blank
        } else {
            Symbol::Letter(letter_value(&token)?)
        };

        Ok(SymbolRef {
            symbol,
            span: token.span,
        })
    }

    fn parse_symbol_list(&mut self) -> Result<Vec<SymbolRef>, Diagnostic> {
        let mut symbols = vec![self.parse_symbol()?];
        while self.peek_is(",") {
            self.advance()?;
            symbols.push(self.parse_symbol()?);
        }

        Ok(symbols)
    }

    fn parse_identifier(&mut self) -> Result<Identifier, Diagnostic> {
        let token = self.advance()?;
        let valid = token.kind == TokenKind::Word
            && token.text.starts_with(|c: char| c.is_ascii_alphabetic());
        if !valid {
            return Err(Diagnostic::syntax(
                format!("Invalid identifier \"{}\"", token.text),
                token.span,
            ));
        }

        Ok(Identifier {
            name: token.text,
            span: token.span,
        })
    }

    /// `module <identifier> { <block>+ }`
    fn parse_module(&mut self) -> Result<Module, Diagnostic> {
        let start = self.expect("module")?;
        let identifier = self.parse_identifier()?;
        self.expect("{")?;

        if self.peek_is("}") {
            let close = self.advance()?;
            return Err(Diagnostic::syntax(
                "A module must have at least one block/command",
                start.span.to(&close.span),
            ));
        }

        let (blocks, close) = self.parse_blocks()?;
        Ok(Module {
            identifier,
            blocks,
            span: start.span.to(&close.span),
        })
    }

    /// Parses blocks up to and including the closing brace of the enclosing construct.
    fn parse_blocks(&mut self) -> Result<(Vec<Block>, Token), Diagnostic> {
        let mut blocks = Vec::new();
        loop {
            if self.peek().is_none() {
                return Err(self.end_of_file());
            }
            if self.peek_is("}") {
                return Ok((blocks, self.advance()?));
            }
            blocks.push(self.parse_block()?);
        }
    }

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        let keyword = self.peek().map(|token| token.text.as_str());
        match keyword {
            Some("switch") => Ok(Block::Switch(self.parse_switch()?)),
            Some("if") | Some("while") => Ok(Block::Switch(self.parse_implicit_switch()?)),
            _ => Ok(Block::Basic(self.parse_basic_block()?)),
        }
    }

    /// `[changeto <symbol>] [move <direction>] [goto <identifier> | accept | reject]`
    fn parse_basic_block(&mut self) -> Result<BasicBlock, Diagnostic> {
        let start = self.position;
        let write = self.parse_write()?;
        let movement = self.parse_move()?;

        let keyword = self.peek().map(|token| token.text.as_str());
        let flow = match keyword {
            Some("goto") => {
                self.advance()?;
                Some(Flow::Goto(self.parse_identifier()?))
            }
            Some("accept") => {
                self.advance()?;
                Some(Flow::Accept)
            }
            Some("reject") => {
                self.advance()?;
                Some(Flow::Reject)
            }
            _ => None,
        };

        if write.is_none() && movement.is_none() && flow.is_none() {
            return Err(self.invalid_command("basic"));
        }

        Ok(BasicBlock {
            write,
            movement,
            flow,
            span: self.span_since(start),
        })
    }

    /// `[changeto <symbol>] [move <direction>]`
    fn parse_core_block(&mut self) -> Result<CoreBlock, Diagnostic> {
        let start = self.position;
        let write = self.parse_write()?;
        let movement = self.parse_move()?;

        if write.is_none() && movement.is_none() {
            return Err(self.invalid_command("core"));
        }

        Ok(CoreBlock {
            write,
            movement,
            span: self.span_since(start),
        })
    }

    fn parse_write(&mut self) -> Result<Option<SymbolRef>, Diagnostic> {
        if !self.peek_is("changeto") {
            return Ok(None);
        }
        self.advance()?;
        self.parse_symbol().map(Some)
    }

    fn parse_move(&mut self) -> Result<Option<Direction>, Diagnostic> {
        if !self.peek_is("move") {
            return Ok(None);
        }
        self.advance()?;

        let token = self.advance()?;
        match token.text.as_str() {
            "left" => Ok(Some(Direction::Left)),
            "right" => Ok(Some(Direction::Right)),
            _ => Err(Diagnostic::syntax(
                format!("Invalid direction \"{}\"", token.text),
                token.span,
            )),
        }
    }

    /// `switch tapehead { <case>+ }`
    fn parse_switch(&mut self) -> Result<SwitchBlock, Diagnostic> {
        let start = self.expect("switch")?;
        self.expect("tapehead")?;
        self.expect("{")?;

        if self.peek_is("}") {
            let close = self.advance()?;
            return Err(Diagnostic::syntax(
                "A switch block must have at least one case",
                start.span.to(&close.span),
            ));
        }

        let mut cases = Vec::new();
        loop {
            let token = self.peek().cloned().ok_or_else(|| self.end_of_file())?;
            match token.text.as_str() {
                "}" => {
                    self.advance()?;
                    return Ok(SwitchBlock {
                        cases,
                        span: start.span.to(&token.span),
                    });
                }
                "if" => cases.push(Case::If(self.parse_if()?)),
                "while" => cases.push(Case::While(self.parse_while()?)),
                _ => {
                    return Err(Diagnostic::syntax(
                        format!("Unexpected start of case: \"{}\"", token.text),
                        token.span,
                    ))
                }
            }
        }
    }

    /// A run of consecutive cases written directly as a block.
    fn parse_implicit_switch(&mut self) -> Result<SwitchBlock, Diagnostic> {
        let start = self.position;
        let mut cases = Vec::new();
        loop {
            let keyword = self.peek().map(|token| token.text.as_str());
            match keyword {
                Some("if") => cases.push(Case::If(self.parse_if()?)),
                Some("while") => cases.push(Case::While(self.parse_while()?)),
                _ => break,
            }
        }

        Ok(SwitchBlock {
            cases,
            span: self.span_since(start),
        })
    }

    /// `if <symbols> { <basic block> <block>* }`
    fn parse_if(&mut self) -> Result<IfCase, Diagnostic> {
        let start = self.expect("if")?;
        if self.peek_is("{") {
            return Err(Diagnostic::syntax(
                "An if case must apply to at least one letter",
                start.span,
            ));
        }

        let symbols = self.parse_symbol_list()?;
        self.expect("{")?;

        if self.peek_is("}") {
            let close = self.advance()?;
            return Err(Diagnostic::syntax(
                "An if case must have at least one command",
                start.span.to(&close.span),
            ));
        }

        let first = self.parse_basic_block()?;
        let (rest, close) = self.parse_blocks()?;

        Ok(IfCase {
            symbols,
            first,
            rest,
            span: start.span.to(&close.span),
        })
    }

    /// `while <symbols> { <core block> }`
    fn parse_while(&mut self) -> Result<WhileCase, Diagnostic> {
        let start = self.expect("while")?;
        if self.peek_is("{") {
            return Err(Diagnostic::syntax(
                "A while case must apply to at least one letter",
                start.span,
            ));
        }

        let symbols = self.parse_symbol_list()?;
        self.expect("{")?;

        if self.peek_is("}") {
            return Err(Diagnostic::syntax(
                "A while case must have at least one command",
                start.span,
            ));
        }

        let body = self.parse_core_block()?;
        let close = self.advance()?;
        if !close.is("}") {
            return Err(Diagnostic::syntax(
                "A while case cannot have more than one core block",
                close.span,
            ));
        }

        Ok(WhileCase {
            symbols,
            body,
            span: start.span.to(&close.span),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_is(&self, text: &str) -> bool {
        self.peek().is_some_and(|token| token.is(text))
    }

    /// Consumes the next token, failing at the end of input.
    fn advance(&mut self) -> Result<Token, Diagnostic> {
        let token = self.peek().cloned().ok_or_else(|| self.end_of_file())?;
        self.position += 1;
        Ok(token)
    }

    fn expect(&mut self, text: &str) -> Result<Token, Diagnostic> {
        let token = self.advance()?;
        if !token.is(text) {
            return Err(expected(&token, text));
        }
        Ok(token)
    }

    /// Reported at the last token of the input.
    fn end_of_file(&self) -> Diagnostic {
        let span = self
            .tokens
            .last()
            .map(|token| token.span)
            .unwrap_or_else(Span::empty_file);
        Diagnostic::syntax("Unexpected end of file", span)
    }

    fn invalid_command(&self, kind: &str) -> Diagnostic {
        match self.peek() {
            Some(token) => Diagnostic::syntax(
                format!("Invalid {kind} command \"{}\"", token.text),
                token.span,
            ),
            None => self.end_of_file(),
        }
    }

    /// The region covered by the tokens consumed since `start`.
    fn span_since(&self, start: usize) -> Span {
        let first = &self.tokens[start].span;
        let last = &self.tokens[self.position.max(start + 1) - 1].span;
        first.to(last)
    }
}

fn expected(token: &Token, text: &str) -> Diagnostic {
    Diagnostic::syntax(
        format!("Expected value \"{}\" to be \"{}\"", token.text, text),
        token.span,
    )
}

/// Validates a single-character letter: length first, then character class.
fn letter_value(token: &Token) -> Result<char, Diagnostic> {
    let mut chars = token.text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() || c.is_ascii_digit() => Ok(c),
        (Some(_), None) => Err(Diagnostic::syntax(
            format!(
                "The value \"{}\" must be a lowercase character or a number",
                token.text
            ),
            token.span,
        )),
        _ => Err(Diagnostic::syntax(
            format!("The value \"{}\" must have length 1", token.text),
            token.span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;

    fn error(input: &str) -> String {
        let result = parse(input);
        assert!(result.is_err(), "expected a diagnostic for {input:?}");
        result.unwrap_err().to_string()
    }

    const IS_DIV2: &str = r#"// checks whether a binary number is divisible by 2
alphabet = {0, 1}
module isDiv2 {
    while 0, 1 {
        move right
    } if blank {
        move left
        if 0 {
            accept
        } if 1, blank {
            reject
        }
    }
}"#;

    #[test]
    fn test_parse_is_div2() {
        let program = parse(IS_DIV2).unwrap();

        assert_eq!(program.alphabet.values(), vec!['0', '1']);
        assert_eq!(program.modules.len(), 1);

        let module = &program.modules[0];
        assert_eq!(module.identifier.name, "isDiv2");
        assert_eq!(module.blocks.len(), 1);

        let Block::Switch(switch) = &module.blocks[0] else {
            panic!("expected a switch block");
        };
        assert_eq!(switch.cases.len(), 2);

        let Case::While(while_case) = &switch.cases[0] else {
            panic!("expected a while case");
        };
        assert_eq!(while_case.body.movement, Some(Direction::Right));
        assert_eq!(
            while_case
                .symbols
                .iter()
                .map(|s| s.symbol)
                .collect::<Vec<_>>(),
            vec![Symbol::Letter('0'), Symbol::Letter('1')]
        );

        let Case::If(if_case) = &switch.cases[1] else {
            panic!("expected an if case");
        };
        assert_eq!(if_case.symbols[0].symbol, Symbol::Blank);
        assert_eq!(if_case.first.movement, Some(Direction::Left));
        assert_eq!(if_case.rest.len(), 1);
        assert!(matches!(&if_case.rest[0], Block::Switch(s) if s.cases.len() == 2));
    }

    #[test]
    fn test_parse_basic_block_commands() {
        let input = r#"alphabet = {a, b}
module main {
    changeto b move left goto other
    move right
    changeto blank
    reject
}
module other {
    accept
}"#;
        let program = parse(input).unwrap();
        let blocks = &program.modules[0].blocks;
        // Line breaks do not end a block: `changeto blank` and `reject` form the third one.
        assert_eq!(blocks.len(), 3);

        let Block::Basic(first) = &blocks[0] else {
            panic!("expected a basic block");
        };
        assert_eq!(first.write.as_ref().unwrap().symbol, Symbol::Letter('b'));
        assert_eq!(first.movement, Some(Direction::Left));
        assert!(matches!(&first.flow, Some(Flow::Goto(id)) if id.name == "other"));
        assert_eq!(first.span, Span::new(3, 4, 5, 36));

        let Block::Basic(second) = &blocks[1] else {
            panic!("expected a basic block");
        };
        assert_eq!(second.movement, Some(Direction::Right));
        assert_eq!(second.flow, None);

        let Block::Basic(third) = &blocks[2] else {
            panic!("expected a basic block");
        };
        assert_eq!(third.write.as_ref().unwrap().symbol, Symbol::Blank);
        assert_eq!(third.movement, None);
        assert_eq!(third.flow, Some(Flow::Reject));
        assert_eq!(third.span, Span::new(5, 7, 5, 11));
    }

    #[test]
    fn test_parse_explicit_switch() {
        let input = r#"alphabet = {a}
module main {
    switch tapehead {
        if a { move right }
        while blank { changeto a }
    }
}"#;
        let program = parse(input).unwrap();
        let Block::Switch(switch) = &program.modules[0].blocks[0] else {
            panic!("expected a switch block");
        };
        assert_eq!(switch.cases.len(), 2);
        assert_eq!(switch.span, Span::new(3, 7, 5, 6));
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(error(""), "Ln 1:2, Col 1:1- Empty file.");
        assert_eq!(error("\n  // only a comment\n"), "Ln 1:2, Col 1:1- Empty file.");
    }

    #[test]
    fn test_missing_alphabet() {
        assert_eq!(
            error("module main {}"),
            "Ln 1:2, Col 1:7- Expected value \"module\" to be \"alphabet\"."
        );
    }

    #[test]
    fn test_empty_alphabet() {
        assert_eq!(
            error("alphabet = {}"),
            "Ln 1:2, Col 1:14- The alphabet must have at least one letter."
        );
    }

    #[test]
    fn test_invalid_letter_in_alphabet() {
        assert_eq!(
            error("alphabet = {.}"),
            "Ln 1:2, Col 13:14- The value \".\" must be a lowercase character or a number."
        );
    }

    #[test]
    fn test_alphabet_letter_length() {
        assert_eq!(
            error("alphabet = {ab}"),
            "Ln 1:2, Col 13:15- The value \"ab\" must have length 1."
        );
    }

    #[test]
    fn test_alphabet_without_commas() {
        assert_eq!(
            error("alphabet = {a b c}"),
            "Ln 1:2, Col 15:16- Expected value \"b\" to be \"}\"."
        );
    }

    #[test]
    fn test_incomplete_bracket() {
        assert_eq!(
            error("alphabet = {a, b}\nmodule main {"),
            "Ln 2:3, Col 13:14- Unexpected end of file."
        );
    }

    #[test]
    fn test_no_modules() {
        assert_eq!(
            error("alphabet = {a, b}"),
            "Ln 1:2, Col 1:18- A program should have at least one module."
        );
    }

    #[test]
    fn test_empty_module() {
        assert_eq!(
            error("alphabet = {a, b}\nmodule main {}"),
            "Ln 2:3, Col 1:15- A module must have at least one block/command."
        );
    }

    #[test]
    fn test_invalid_direction() {
        let input = "alphabet = {a, b}\nmodule main {\n    move up\n}";
        assert_eq!(error(input), "Ln 3:4, Col 10:12- Invalid direction \"up\".");
    }

    #[test]
    fn test_invalid_command() {
        let input = "alphabet = {a, b}\nmodule main {\n    stop\n}";
        assert_eq!(error(input), "Ln 3:4, Col 5:9- Invalid basic command \"stop\".");
    }

    #[test]
    fn test_invalid_core_command() {
        let input = r#"alphabet = {a, b}
module main {
    switch tapehead {
        while a, b {
            accept
        }
    }
}"#;
        assert_eq!(
            error(input),
            "Ln 5:6, Col 13:19- Invalid core command \"accept\"."
        );
    }

    #[test]
    fn test_while_without_letter() {
        let input = r#"alphabet = {a, b}
module main {
    switch tapehead {
        while {}
    }
}"#;
        assert_eq!(
            error(input),
            "Ln 4:5, Col 9:14- A while case must apply to at least one letter."
        );
    }

    #[test]
    fn test_while_without_command() {
        let input = r#"alphabet = {a, b}
module main {
    switch tapehead {
        while a {}
    }
}"#;
        assert_eq!(
            error(input),
            "Ln 4:5, Col 9:14- A while case must have at least one command."
        );
    }

    #[test]
    fn test_while_with_multiple_blocks() {
        let input = r#"alphabet = {a, b}
module main {
    switch tapehead {
        while blank {
            move left
            move right
        }
    }
}"#;
        assert_eq!(
            error(input),
            "Ln 6:7, Col 13:17- A while case cannot have more than one core block."
        );
    }

    #[test]
    fn test_empty_switch() {
        let input = "alphabet = {a, b}\nmodule main {\n    switch tapehead {}\n}";
        assert_eq!(
            error(input),
            "Ln 3:4, Col 5:23- A switch block must have at least one case."
        );
    }

    #[test]
    fn test_if_without_letter() {
        let input = r#"alphabet = {a, b}
module main {
    switch tapehead {
        if {}
    }
}"#;
        assert_eq!(
            error(input),
            "Ln 4:5, Col 9:11- An if case must apply to at least one letter."
        );
    }

    #[test]
    fn test_if_without_body() {
        let input = r#"alphabet = {a, b}
module main {
    switch tapehead {
        if a {

        }
    }
}"#;
        assert_eq!(
            error(input),
            "Ln 4:7, Col 9:10- An if case must have at least one command."
        );
    }

    #[test]
    fn test_invalid_case() {
        let input = r#"alphabet = {a, b}
module main {
    switch tapehead {
        when x {
            move right
        }
    }
}"#;
        assert_eq!(
            error(input),
            "Ln 4:5, Col 9:13- Unexpected start of case: \"when\"."
        );
    }

    #[test]
    fn test_invalid_identifier() {
        let input = "alphabet = {a}\nmodule accept {\n    reject\n}";
        assert_eq!(error(input), "Ln 2:3, Col 8:14- Invalid identifier \"accept\".");
    }

    #[test]
    fn test_symbol_list_requires_commas() {
        let input = "alphabet = {a, b}\nmodule main {\n    if a b { accept }\n}";
        assert_eq!(error(input), "Ln 3:4, Col 10:11- Expected value \"b\" to be \"{\".");
    }

    #[test]
    fn test_diagnostic_fields() {
        let diagnostic = parse("alphabet = {ab}").unwrap_err();

        assert_eq!(diagnostic.kind, DiagnosticKind::SyntaxError);
        assert_eq!(diagnostic.message, "The value \"ab\" must have length 1");
        assert_eq!(diagnostic.start_line(), 1);
        assert_eq!(diagnostic.end_line(), 2);
        assert_eq!(diagnostic.start_column(), 13);
        assert_eq!(diagnostic.end_column(), 15);
    }
}
