///
/// Parser Module - nom-based Token Parsing
///
/// Parses the token stream of a plugin script into a Program.
///
/// The parser is structured as follows:
/// - input: TokenStream type for nom integration
/// - combinators: Reusable token-matching combinators
/// - expressions: Expression parsing with Pratt precedence
/// - statements: Statement and block parsing
///
/// Entry points: parse() over tokens, parse_source() over script text.
/// Parsing continues past errors so a script reports every syntax error
/// at once; after an error the parser resynchronizes at the next `;` or
/// `}`.
///

mod combinators;
mod expressions;
mod input;
mod statements;

pub use combinators::{PError, PErrorKind};
pub use input::TokenStream;

use lasso::Rodeo;
use nom::InputTake;

use crate::ast::Program;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::source::{Span, Spanned};

use combinators::{is_eof, peek_token};
use statements::parse_statement;

pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn into_result(self) -> Result<Program, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(self.errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

pub fn parse_source(source: &str) -> ParseResult {
    let (tokens, interner) = tokenize(source);
    parse(&tokens, source, &interner)
}

pub fn parse(tokens: &[Token], source: &str, interner: &Rodeo) -> ParseResult {
    let mut statements = Vec::with_capacity(32);
    let mut errors = Vec::new();
    let mut input = TokenStream::new(tokens, source, interner);

    let start_span = input.current_span();

    while !is_eof(input) {
        match parse_statement(input) {
            Ok((rest, stmt)) => {
                statements.push(stmt);
                input = rest;
            }
            Err(e) => {
                let (span, message) = match &e {
                    nom::Err::Error(pe) | nom::Err::Failure(pe) => {
                        (pe.input.current_span(), pe.kind.message(peek_token(pe.input)))
                    }
                    nom::Err::Incomplete(_) => (input.current_span(), "incomplete input".to_string()),
                };
                errors.push(ParseError::new(message, span));

                let failed_at = match &e {
                    nom::Err::Error(pe) | nom::Err::Failure(pe) => pe.input,
                    nom::Err::Incomplete(_) => input,
                };
                input = synchronize(input, failed_at);
            }
        }
    }

    let end_span = statements.last().map(|s| s.span()).unwrap_or(start_span);

    ParseResult {
        program: Program::new(statements, start_span.merge(end_span)),
        errors,
    }
}

/// Skip past the next statement boundary at or after the failure point.
/// Always consumes at least one token so the loop makes progress.
fn synchronize<'a>(input: TokenStream<'a>, failed_at: TokenStream<'a>) -> TokenStream<'a> {
    let consumed = input.tokens.len() - failed_at.tokens.len();
    let mut rest = input.take_split(consumed.max(1)).0;
    if consumed == 0 && matches!(input.first().map(|t| t.kind), Some(TokenKind::Semicolon | TokenKind::RBrace)) {
        return rest;
    }
    while let Some(tok) = rest.first() {
        match tok.kind {
            TokenKind::Eof => break,
            TokenKind::Semicolon | TokenKind::RBrace => return rest.take_split(1).0,
            _ => rest = rest.take_split(1).0,
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let result = parse_source("");
        assert!(result.errors.is_empty());
        assert!(result.program.statements.is_empty());
    }

    #[test]
    fn test_parse_plugin_script() {
        let source = r#"
            // build helpers
            var dirs = ["ding", "dong"];
            fn make_all(list) {
                for (d in list) {
                    fubsy.mkdir(d);
                }
            }
            make_all(dirs);
            result = "42";
        "#;
        let result = parse_source(source);
        assert!(result.errors.is_empty(), "Errors: {:?}", result.errors);
        assert_eq!(result.program.statements.len(), 4);
        assert_eq!(result.program.functions().count(), 1);
    }

    #[test]
    fn test_reports_every_error() {
        let result = parse_source("a = ;\nb = 2;\nc = );");
        assert_eq!(result.errors.len(), 2, "Errors: {:?}", result.errors);
        assert_eq!(result.program.statements.len(), 1);
    }

    #[test]
    fn test_error_message_names_found_token() {
        let result = parse_source("x = 1");
        assert_eq!(result.errors.len(), 1);
        insta::assert_snapshot!(result.errors[0].message, @"expected `;`, found end of input");
    }

    #[test]
    fn test_nul_in_string_literal() {
        let result = parse_source("x = \"a\0b\";");
        assert_eq!(result.errors[0].message, "string literal contains a NUL byte");
    }

    #[test]
    fn test_integer_overflow() {
        let result = parse_source("x = 99999999999999999999;");
        assert_eq!(result.errors[0].message, "integer literal out of range");
    }

    #[test]
    fn test_deep_nesting_is_a_parse_error() {
        let source = format!("x = {}1{};", "(".repeat(200), ")".repeat(200));
        let result = parse_source(&source);
        assert_eq!(result.errors.len(), 1, "Errors: {:?}", result.errors);
        insta::assert_snapshot!(result.errors[0].message, @"code nested too deeply (limit is 48 levels)");

        let source = format!("x = {}1;", "-".repeat(200));
        assert_eq!(parse_source(&source).errors.len(), 1);

        let source = format!("{}{}", "{ ".repeat(200), "} ".repeat(200));
        assert!(!parse_source(&source).errors.is_empty());
    }

    #[test]
    fn test_nesting_below_limit_parses() {
        let source = format!("x = {}1{};\ny = [[[[2]]]];", "(".repeat(40), ")".repeat(40));
        let result = parse_source(&source);
        assert!(result.errors.is_empty(), "Errors: {:?}", result.errors);
        assert_eq!(result.program.statements.len(), 2);
    }
}
