//!
//! Base Combinators for Token Parsing
//!
//! Reusable nom combinators for matching tokens, keywords, identifiers and
//! literals. Literal combinators do their own validation and fail with
//! `nom::Err::Failure`, which stops backtracking at the bad literal.
//!

use std::ffi::{CStr, CString};
use std::rc::Rc;

use nom::error::{ErrorKind, ParseError};
use nom::{IResult, InputTake};

use crate::ast::Ident;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::source::Span;

use super::input::TokenStream;

pub type PResult<'a, O> = IResult<TokenStream<'a>, O, PError<'a>>;

/// Deepest expression or block nesting the parser accepts.
pub const MAX_NESTING: u32 = 48;

#[derive(Debug, Clone)]
pub struct PError<'a> {
    pub input: TokenStream<'a>,
    pub kind: PErrorKind,
}

impl<'a> PError<'a> {
    pub fn new(input: TokenStream<'a>, kind: PErrorKind) -> Self {
        Self { input, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PErrorKind {
    Expected(TokenKind),
    ExpectedKeyword(Keyword),
    ExpectedIdent,
    ExpectedExpr,
    ExpectedStatement,
    InvalidNumber,
    NulInString,
    TooDeep,
    Nom(ErrorKind),
}

impl PErrorKind {
    /// Human-readable message given the token actually found.
    pub fn message(&self, found: Option<TokenKind>) -> String {
        let found = found.map(describe).unwrap_or("end of input");
        match self {
            PErrorKind::Expected(kind) => format!("expected {}, found {}", describe(*kind), found),
            PErrorKind::ExpectedKeyword(kw) => {
                format!("expected {}, found {}", describe(TokenKind::Keyword(*kw)), found)
            }
            PErrorKind::ExpectedIdent => format!("expected identifier, found {}", found),
            PErrorKind::ExpectedExpr => format!("expected expression, found {}", found),
            PErrorKind::ExpectedStatement => format!("expected statement, found {}", found),
            PErrorKind::InvalidNumber => "integer literal out of range".to_string(),
            PErrorKind::NulInString => "string literal contains a NUL byte".to_string(),
            PErrorKind::TooDeep => format!("code nested too deeply (limit is {} levels)", MAX_NESTING),
            PErrorKind::Nom(kind) => format!("unexpected {} ({:?})", found, kind),
        }
    }
}

/// Run `parser` one nesting level deeper.
///
/// Past `MAX_NESTING` this fails without backtracking. The remaining
/// input comes back at the caller's depth.
pub fn nested<'a, O, F>(input: TokenStream<'a>, parser: F) -> PResult<'a, O>
where
    F: FnOnce(TokenStream<'a>) -> PResult<'a, O>,
{
    if input.depth >= MAX_NESTING {
        return Err(nom::Err::Failure(PError::new(input, PErrorKind::TooDeep)));
    }
    let (rest, output) = parser(input.with_depth(input.depth + 1))?;
    Ok((rest.with_depth(input.depth), output))
}

pub fn describe(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Ident => "identifier",
        TokenKind::IntLit => "integer",
        TokenKind::StringLit => "string",
        TokenKind::Keyword(kw) => match kw {
            Keyword::Fn => "`fn`",
            Keyword::Var => "`var`",
            Keyword::If => "`if`",
            Keyword::Else => "`else`",
            Keyword::While => "`while`",
            Keyword::For => "`for`",
            Keyword::In => "`in`",
            Keyword::Break => "`break`",
            Keyword::Continue => "`continue`",
            Keyword::Return => "`return`",
            Keyword::Throw => "`throw`",
            Keyword::Try => "`try`",
            Keyword::Catch => "`catch`",
            Keyword::Not => "`not`",
            Keyword::And => "`and`",
            Keyword::Or => "`or`",
            Keyword::True => "`true`",
            Keyword::False => "`false`",
            Keyword::None => "`none`",
        },
        TokenKind::Plus => "`+`",
        TokenKind::Minus => "`-`",
        TokenKind::Star => "`*`",
        TokenKind::Slash => "`/`",
        TokenKind::Percent => "`%`",
        TokenKind::Bang => "`!`",
        TokenKind::Eq => "`=`",
        TokenKind::EqEq => "`==`",
        TokenKind::NotEq => "`!=`",
        TokenKind::Lt => "`<`",
        TokenKind::LtEq => "`<=`",
        TokenKind::Gt => "`>`",
        TokenKind::GtEq => "`>=`",
        TokenKind::AndAnd => "`&&`",
        TokenKind::PipePipe => "`||`",
        TokenKind::Dot => "`.`",
        TokenKind::Comma => "`,`",
        TokenKind::Semicolon => "`;`",
        TokenKind::LParen => "`(`",
        TokenKind::RParen => "`)`",
        TokenKind::LBrace => "`{`",
        TokenKind::RBrace => "`}`",
        TokenKind::LBracket => "`[`",
        TokenKind::RBracket => "`]`",
        TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment => "whitespace",
        TokenKind::Error => "invalid token",
        TokenKind::Eof => "end of input",
    }
}

impl<'a> ParseError<TokenStream<'a>> for PError<'a> {
    fn from_error_kind(input: TokenStream<'a>, kind: ErrorKind) -> Self {
        PError {
            input,
            kind: PErrorKind::Nom(kind),
        }
    }

    fn append(_input: TokenStream<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

pub fn token(kind: TokenKind) -> impl Fn(TokenStream) -> PResult<Token> {
    move |input: TokenStream| match input.first() {
        Some(tok) if tok.kind == kind => {
            let (rest, _) = input.take_split(1);
            Ok((rest, *tok))
        }
        _ => Err(nom::Err::Error(PError::new(input, PErrorKind::Expected(kind)))),
    }
}

pub fn keyword(kw: Keyword) -> impl Fn(TokenStream) -> PResult<Token> {
    move |input: TokenStream| match input.first() {
        Some(tok) if tok.kind == TokenKind::Keyword(kw) => {
            let (rest, _) = input.take_split(1);
            Ok((rest, *tok))
        }
        _ => Err(nom::Err::Error(PError::new(input, PErrorKind::ExpectedKeyword(kw)))),
    }
}

pub fn ident(input: TokenStream) -> PResult<Ident> {
    match input.first() {
        Some(Token {
            kind: TokenKind::Ident,
            span,
            symbol: Some(symbol),
        }) => {
            let (rest, _) = input.take_split(1);
            Ok((rest, Ident::new(input.resolve(*symbol), *span)))
        }
        _ => Err(nom::Err::Error(PError::new(input, PErrorKind::ExpectedIdent))),
    }
}

pub fn int_lit(input: TokenStream) -> PResult<(i64, Span)> {
    match input.first() {
        Some(tok) if tok.kind == TokenKind::IntLit => {
            let text = input.span_text(tok.span).replace('_', "");
            match text.parse::<i64>() {
                Ok(value) => {
                    let (rest, _) = input.take_split(1);
                    Ok((rest, (value, tok.span)))
                }
                Err(_) => Err(nom::Err::Failure(PError::new(input, PErrorKind::InvalidNumber))),
            }
        }
        _ => Err(nom::Err::Error(PError::new(input, PErrorKind::Expected(TokenKind::IntLit)))),
    }
}

pub fn string_lit(input: TokenStream) -> PResult<(Rc<CStr>, Span)> {
    match input.first() {
        Some(Token {
            kind: TokenKind::StringLit,
            span,
            symbol: Some(symbol),
        }) => match CString::new(input.resolve(*symbol)) {
            Ok(text) => {
                let (rest, _) = input.take_split(1);
                Ok((rest, (Rc::from(text.as_c_str()), *span)))
            }
            Err(_) => Err(nom::Err::Failure(PError::new(input, PErrorKind::NulInString))),
        },
        _ => Err(nom::Err::Error(PError::new(input, PErrorKind::Expected(TokenKind::StringLit)))),
    }
}

pub fn peek_token(input: TokenStream) -> Option<TokenKind> {
    input.first().map(|t| t.kind)
}

pub fn check(kind: TokenKind) -> impl Fn(TokenStream) -> bool {
    move |input: TokenStream| input.first().map(|t| t.kind == kind).unwrap_or(false)
}

pub fn check_keyword(kw: Keyword) -> impl Fn(TokenStream) -> bool {
    move |input: TokenStream| {
        input
            .first()
            .map(|t| t.kind == TokenKind::Keyword(kw))
            .unwrap_or(false)
    }
}

pub fn is_eof(input: TokenStream) -> bool {
    input.is_empty() || input.first().map(|t| t.kind == TokenKind::Eof).unwrap_or(true)
}
