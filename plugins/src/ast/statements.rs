///
/// Statement AST Nodes
///
/// Blocks do not introduce scopes; only function calls do. A `var`
/// declaration binds in the current frame, and a plain assignment updates
/// whichever frame already holds the name.
///

use std::rc::Rc;

use crate::source::{Span, Spanned};

use super::expressions::Expression;
use super::Ident;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Var(VarStmt),
    Assign(AssignStmt),
    Function(Rc<FunctionDecl>),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Try(TryStmt),
    Break(Span),
    Continue(Span),
    Expression(ExprStmt),
    Block(Block),
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        match self {
            Statement::Var(s) => s.span,
            Statement::Assign(s) => s.span,
            Statement::Function(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Throw(s) => s.span,
            Statement::If(s) => s.span,
            Statement::While(s) => s.span,
            Statement::For(s) => s.span,
            Statement::Try(s) => s.span,
            Statement::Break(span) | Statement::Continue(span) => *span,
            Statement::Expression(s) => s.span,
            Statement::Block(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarStmt {
    pub name: Ident,
    pub init: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Ident,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_branch: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    ElseIf(Box<IfStmt>),
    Else(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub var: Ident,
    pub iterable: Expression,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Block,
    pub catch_var: Ident,
    pub handler: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expression,
    pub span: Span,
}
