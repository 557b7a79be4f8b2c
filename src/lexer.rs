//! This module turns TML source text into a position-tagged token stream, utilizing the `pest` crate.
//! The token grammar lives in `grammar.pest`; block structure is left to the parser.

use crate::diagnostic::{Diagnostic, Span};
use pest::{error::LineColLocation, iterators::Pair, Parser as PestParser};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the TML token grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TmlLexer;

/// Reserved words of the language. They are never accepted as identifiers.
pub const KEYWORDS: [&str; 14] = [
    "alphabet", "module", "switch", "tapehead", "if", "while", "move", "left", "right",
    "changeto", "goto", "accept", "reject", "blank",
];

/// The lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    /// Identifiers and symbol literals.
    Word,
    /// One of `{ } , =`.
    Punctuation,
    /// Any other single character.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

/// Splits `input` into tokens, skipping whitespace and comments.
///
/// # Returns
///
/// * `Ok(Vec<Token>)` with every token in source order (possibly empty).
/// * `Err(Diagnostic)` with a `LexError` if a block comment is never closed.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Diagnostic> {
    let pairs = TmlLexer::parse(Rule::tokens, input).map_err(|e| {
        let (line, column) = match e.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        Diagnostic::lex(e.variant.message(), Span::new(line, line + 1, column, column + 1))
    })?;

    let mut tokens = Vec::new();
    for pair in pairs.flat_map(|pair| pair.into_inner()) {
        let kind = match pair.as_rule() {
            Rule::word if KEYWORDS.contains(&pair.as_str()) => TokenKind::Keyword,
            Rule::word => TokenKind::Word,
            Rule::punctuation => TokenKind::Punctuation,
            Rule::other => TokenKind::Other,
            Rule::unterminated_comment => {
                return Err(Diagnostic::lex("Unterminated comment", span_of(&pair)))
            }
            _ => continue, // EOI
        };

        tokens.push(Token {
            kind,
            text: pair.as_str().to_string(),
            span: span_of(&pair),
        });
    }

    Ok(tokens)
}

/// Converts a pest span into a diagnostic span.
fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    let (start_line, start_column) = span.start_pos().line_col();
    let (end_line, end_column) = span.end_pos().line_col();

    Span::new(start_line, end_line + 1, start_column, end_column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_alphabet() {
        let tokens = tokenize("alphabet = {a, b}").unwrap();

        assert_eq!(texts(&tokens), vec!["alphabet", "=", "{", "a", ",", "b", "}"]);
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Punctuation);
        assert_eq!(tokens[3].kind, TokenKind::Word);
    }

    #[test]
    fn test_token_positions() {
        let tokens = tokenize("alphabet = {a, b}\nmodule main {").unwrap();

        assert_eq!(tokens[0].span, Span::new(1, 2, 1, 9));
        assert_eq!(tokens[7].span, Span::new(2, 3, 1, 7));
        assert_eq!(tokens.last().unwrap().span, Span::new(2, 3, 13, 14));
    }

    #[test]
    fn test_other_characters_are_single_tokens() {
        let tokens = tokenize("{.ab}").unwrap();

        assert_eq!(texts(&tokens), vec!["{", ".", "ab", "}"]);
        assert_eq!(tokens[1].kind, TokenKind::Other);
        assert_eq!(tokens[1].span, Span::new(1, 2, 2, 3));
    }

    #[test]
    fn test_comments_are_skipped() {
        let input = "// checks something\nmodule /* inline */ main";
        let tokens = tokenize(input).unwrap();

        assert_eq!(texts(&tokens), vec!["module", "main"]);
        assert_eq!(tokens[1].span, Span::new(2, 3, 21, 25));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("  \n\t // nothing\n").unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_comment() {
        let error = tokenize("module /* open").unwrap_err();

        assert_eq!(error.kind, crate::diagnostic::DiagnosticKind::LexError);
        assert_eq!(error.to_string(), "Ln 1:2, Col 8:15- Unterminated comment.");
    }
}
