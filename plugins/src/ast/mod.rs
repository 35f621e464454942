///
/// Abstract Syntax Tree Module
///
/// The tree produced by the parser and walked by the interpreter.
///
/// Module structure:
/// - operators: Binary and unary operators with Pratt precedence
/// - expressions: Expression node types and literals
/// - statements: Statement node types and blocks
///
/// Names are resolved out of the lexer's interner while parsing, so a tree
/// owns all of its text and can outlive the token stream. Function bodies
/// are reference-counted because a function value keeps its declaration
/// alive after the program that defined it has finished running.
///

pub mod expressions;
pub mod operators;
pub mod statements;

pub use expressions::*;
pub use operators::*;
pub use statements::*;

use std::rc::Rc;

use crate::source::{Span, Spanned};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: Rc<str>,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<Rc<str>>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl Spanned for Ident {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Program {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Self { statements, span }
    }

    /// Functions declared at the top level, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Function(decl) => Some(decl.as_ref()),
            _ => None,
        })
    }
}

impl Spanned for Program {
    fn span(&self) -> Span {
        self.span
    }
}
