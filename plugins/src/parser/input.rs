///
/// TokenStream Input Type for nom
///
/// Wraps a slice of tokens together with the interner that owns their
/// symbols, so combinators can resolve identifier and string text as
/// they build the tree.
///

use std::iter::Enumerate;
use std::slice::Iter;

use lasso::{Rodeo, Spur};
use nom::{InputIter, InputLength, InputTake, Needed, Slice};

use crate::lexer::Token;
use crate::source::Span;

#[derive(Debug, Clone, Copy)]
pub struct TokenStream<'a> {
    pub tokens: &'a [Token],
    pub source: &'a str,
    pub interner: &'a Rodeo,
    /// Expression and block nesting at this point of the parse.
    pub depth: u32,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token], source: &'a str, interner: &'a Rodeo) -> Self {
        Self {
            tokens,
            source,
            interner,
            depth: 0,
        }
    }

    pub fn span_text(&self, span: Span) -> &'a str {
        &self.source[span.start as usize..span.end as usize]
    }

    pub fn resolve(&self, symbol: Spur) -> &'a str {
        self.interner.resolve(&symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn first(&self) -> Option<&'a Token> {
        self.tokens.first()
    }

    pub fn current_span(&self) -> Span {
        self.tokens.first().map(|t| t.span).unwrap_or(Span::dummy())
    }

    pub fn with_depth(self, depth: u32) -> Self {
        Self { depth, ..self }
    }

    fn with_tokens(&self, tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            source: self.source,
            interner: self.interner,
            depth: self.depth,
        }
    }
}

impl<'a> InputLength for TokenStream<'a> {
    fn input_len(&self) -> usize {
        self.tokens.len()
    }
}

impl<'a> InputTake for TokenStream<'a> {
    fn take(&self, count: usize) -> Self {
        self.with_tokens(&self.tokens[..count])
    }

    fn take_split(&self, count: usize) -> (Self, Self) {
        let (prefix, suffix) = self.tokens.split_at(count);
        (self.with_tokens(suffix), self.with_tokens(prefix))
    }
}

impl<'a> InputIter for TokenStream<'a> {
    type Item = &'a Token;
    type Iter = Enumerate<Self::IterElem>;
    type IterElem = Iter<'a, Token>;

    fn iter_indices(&self) -> Self::Iter {
        self.tokens.iter().enumerate()
    }

    fn iter_elements(&self) -> Self::IterElem {
        self.tokens.iter()
    }

    fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(Self::Item) -> bool,
    {
        self.tokens.iter().position(predicate)
    }

    fn slice_index(&self, count: usize) -> Result<usize, Needed> {
        if self.tokens.len() >= count {
            Ok(count)
        } else {
            Err(Needed::new(count - self.tokens.len()))
        }
    }
}

impl<'a> Slice<std::ops::RangeFrom<usize>> for TokenStream<'a> {
    fn slice(&self, range: std::ops::RangeFrom<usize>) -> Self {
        self.with_tokens(&self.tokens[range])
    }
}

impl<'a> Slice<std::ops::RangeTo<usize>> for TokenStream<'a> {
    fn slice(&self, range: std::ops::RangeTo<usize>) -> Self {
        self.with_tokens(&self.tokens[range])
    }
}

impl<'a> Slice<std::ops::Range<usize>> for TokenStream<'a> {
    fn slice(&self, range: std::ops::Range<usize>) -> Self {
        self.with_tokens(&self.tokens[range])
    }
}

impl<'a> Slice<std::ops::RangeFull> for TokenStream<'a> {
    fn slice(&self, _: std::ops::RangeFull) -> Self {
        *self
    }
}
