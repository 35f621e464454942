//!
//! Lexer Module - Script Tokenization
//!
//! Turns plugin script text into the token stream the parser consumes.
//!
//! Key design decisions:
//! - Identifiers and string literal contents are interned via lasso::Spur
//! - Whitespace and comments are dropped here; the parser never sees trivia
//! - Malformed input becomes an Error token so the parser can report it
//!   with a span instead of the lexer failing outright
//!
//! Token categories:
//! - Keywords: fn, var, if, else, while, for, in, try, catch, throw, ...
//! - Identifiers: user-defined names
//! - Literals: integers, double-quoted strings
//! - Operators: + - * / % == != < <= > >= && || ! =
//! - Delimiters: ( ) { } [ ] , ; .
//!

use crate::source::Span;
use lasso::{Rodeo, Spur};
use memchr::{memchr, memchr2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub symbol: Option<Spur>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            symbol: None,
        }
    }

    pub fn with_symbol(kind: TokenKind, span: Span, symbol: Spur) -> Self {
        Self {
            kind,
            span,
            symbol: Some(symbol),
        }
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline
        )
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    IntLit,
    StringLit,

    Keyword(Keyword),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    AndAnd,
    PipePipe,

    Dot,
    Comma,
    Semicolon,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Whitespace,
    Newline,
    Comment,

    Error,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Fn,
    Var,
    If,
    Else,
    While,
    For,
    In,
    Break,
    Continue,
    Return,
    Throw,
    Try,
    Catch,
    Not,
    And,
    Or,
    True,
    False,
    None,
}

impl Keyword {
    fn from_ident(text: &str) -> Option<Keyword> {
        let kw = match text {
            "fn" => Keyword::Fn,
            "var" => Keyword::Var,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "return" => Keyword::Return,
            "throw" => Keyword::Throw,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "not" => Keyword::Not,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "none" => Keyword::None,
            _ => return None,
        };
        Some(kw)
    }
}

pub fn tokenize(source: &str) -> (Vec<Token>, Rodeo) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize_all();
    (tokens, lexer.interner)
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    interner: Rodeo,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner: Rodeo::default(),
        }
    }

    fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_eof() {
            let token = self.next_token();
            if !token.is_trivia() {
                tokens.push(token);
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.pos as u32, self.pos as u32),
        ));

        tokens
    }

    #[inline(always)]
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline(always)]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline(always)]
    fn advance_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek_byte() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos as u32;

        let Some(b) = self.advance_byte() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match b {
            b' ' | b'\t' | b'\r' => {
                while matches!(self.peek_byte(), Some(b' ' | b'\t' | b'\r')) {
                    self.pos += 1;
                }
                TokenKind::Whitespace
            }

            b'\n' => TokenKind::Newline,

            b'/' if self.peek_byte() == Some(b'/') => {
                match memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos += offset,
                    None => self.pos = self.bytes.len(),
                }
                TokenKind::Comment
            }
            b'/' if self.peek_byte() == Some(b'*') => {
                self.pos += 1;
                self.scan_block_comment()
            }
            b'/' => TokenKind::Slash,

            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'%' => TokenKind::Percent,

            b'=' if self.eat(b'=') => TokenKind::EqEq,
            b'=' => TokenKind::Eq,
            b'!' if self.eat(b'=') => TokenKind::NotEq,
            b'!' => TokenKind::Bang,
            b'<' if self.eat(b'=') => TokenKind::LtEq,
            b'<' => TokenKind::Lt,
            b'>' if self.eat(b'=') => TokenKind::GtEq,
            b'>' => TokenKind::Gt,
            b'&' if self.eat(b'&') => TokenKind::AndAnd,
            b'|' if self.eat(b'|') => TokenKind::PipePipe,

            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,

            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'"' => self.scan_string(),

            b'0'..=b'9' => self.scan_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_ident_or_keyword(start),

            // Skip the rest of a multi-byte character so spans stay on char boundaries
            _ if b > 127 => {
                while matches!(self.peek_byte(), Some(0x80..=0xBF)) {
                    self.pos += 1;
                }
                TokenKind::Error
            }

            _ => TokenKind::Error,
        };

        let end = self.pos as u32;
        let span = Span::new(start, end);

        match kind {
            TokenKind::Ident => {
                let text = &self.source[start as usize..end as usize];
                Token::with_symbol(kind, span, self.interner.get_or_intern(text))
            }
            TokenKind::StringLit => {
                let raw = &self.source[(start as usize + 1)..(end as usize - 1)];
                let text = unescape(raw);
                Token::with_symbol(kind, span, self.interner.get_or_intern(text.as_ref()))
            }
            _ => Token::new(kind, span),
        }
    }

    fn scan_block_comment(&mut self) -> TokenKind {
        while let Some(offset) = memchr(b'*', &self.bytes[self.pos..]) {
            self.pos += offset + 1;
            if self.eat(b'/') {
                return TokenKind::Comment;
            }
        }
        self.pos = self.bytes.len();
        TokenKind::Error
    }

    fn scan_string(&mut self) -> TokenKind {
        loop {
            match memchr2(b'"', b'\\', &self.bytes[self.pos..]) {
                Some(offset) => {
                    if let Some(nl) = memchr(b'\n', &self.bytes[self.pos..self.pos + offset]) {
                        self.pos += nl;
                        return TokenKind::Error;
                    }
                    self.pos += offset;
                    if self.bytes[self.pos] == b'"' {
                        self.pos += 1;
                        return TokenKind::StringLit;
                    }
                    // Backslash: skip it and the escaped byte
                    self.pos += 1;
                    if self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                None => {
                    match memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(nl) => self.pos += nl,
                        None => self.pos = self.bytes.len(),
                    }
                    return TokenKind::Error;
                }
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        while matches!(self.peek_byte(), Some(b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        TokenKind::IntLit
    }

    fn scan_ident_or_keyword(&mut self, start: u32) -> TokenKind {
        while matches!(
            self.peek_byte(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.pos += 1;
        }
        let text = &self.source[start as usize..self.pos];
        match Keyword::from_ident(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        }
    }
}

fn unescape(raw: &str) -> std::borrow::Cow<'_, str> {
    if !raw.contains('\\') {
        return std::borrow::Cow::Borrowed(raw);
    }

    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    std::borrow::Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = tokenize(source);
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("+ - * / % == != < <= > >= && || ! ="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::AndAnd,
                TokenKind::PipePipe,
                TokenKind::Bang,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("fn var try catch throw none"),
            vec![
                TokenKind::Keyword(Keyword::Fn),
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Keyword(Keyword::Try),
                TokenKind::Keyword(Keyword::Catch),
                TokenKind::Keyword(Keyword::Throw),
                TokenKind::Keyword(Keyword::None),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_string_escapes() {
        let (tokens, interner) = tokenize(r#""a\tb\"c""#);
        assert_eq!(tokens[0].kind, TokenKind::StringLit);
        let symbol = tokens[0].symbol.unwrap();
        assert_eq!(interner.resolve(&symbol), "a\tb\"c");
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert_eq!(kinds("\"abc\nx"), vec![TokenKind::Error, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(
            kinds("x // line\n/* block\n * more */ y"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
        assert_eq!(kinds("/* open"), vec![TokenKind::Error, TokenKind::Eof]);
    }

    #[test]
    fn test_identifiers_share_symbols() {
        let (tokens, _) = tokenize("fubsy.mkdir fubsy");
        assert_eq!(tokens[0].symbol, tokens[3].symbol);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }
}
