///
/// Statement Parser
///
/// Parses statements using nom combinators.
///

use std::rc::Rc;

use nom::multi::separated_list0;
use nom::Slice;

use crate::ast::*;
use crate::lexer::{Keyword, TokenKind};
use crate::source::{Span, Spanned};

use super::combinators::*;
use super::expressions::parse_expression;
use super::input::TokenStream;

pub fn parse_statement(input: TokenStream) -> PResult<Statement> {
    match peek_token(input) {
        Some(TokenKind::Keyword(Keyword::Var)) => parse_var_stmt(input),
        Some(TokenKind::Keyword(Keyword::Fn)) => parse_function(input),
        Some(TokenKind::Keyword(Keyword::Return)) => parse_return_stmt(input),
        Some(TokenKind::Keyword(Keyword::Throw)) => parse_throw_stmt(input),
        Some(TokenKind::Keyword(Keyword::Break)) => parse_break_stmt(input),
        Some(TokenKind::Keyword(Keyword::Continue)) => parse_continue_stmt(input),
        Some(TokenKind::Keyword(Keyword::If)) => {
            let (input, stmt) = parse_if_stmt(input)?;
            Ok((input, Statement::If(stmt)))
        }
        Some(TokenKind::Keyword(Keyword::While)) => parse_while_stmt(input),
        Some(TokenKind::Keyword(Keyword::For)) => parse_for_stmt(input),
        Some(TokenKind::Keyword(Keyword::Try)) => parse_try_stmt(input),
        Some(TokenKind::LBrace) => {
            let (input, block) = parse_block(input)?;
            Ok((input, Statement::Block(block)))
        }
        Some(TokenKind::Eof) | None => Err(nom::Err::Error(PError::new(
            input,
            PErrorKind::ExpectedStatement,
        ))),
        _ => parse_expr_or_assign_stmt(input),
    }
}

pub fn parse_block(input: TokenStream) -> PResult<Block> {
    nested(input, parse_block_body)
}

fn parse_block_body(input: TokenStream) -> PResult<Block> {
    let (mut input, start) = token(TokenKind::LBrace)(input)?;
    let mut statements = Vec::new();

    while !check(TokenKind::RBrace)(input) && !is_eof(input) {
        let (rest, stmt) = parse_statement(input)?;
        statements.push(stmt);
        input = rest;
    }

    let (input, end) = token(TokenKind::RBrace)(input)?;
    Ok((
        input,
        Block {
            statements,
            span: start.span.merge(end.span),
        },
    ))
}

fn parse_var_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Var)(input)?;
    let (input, name) = ident(input)?;
    let (input, _) = token(TokenKind::Eq)(input)?;
    let (input, init) = parse_expression(input)?;
    let (input, end) = token(TokenKind::Semicolon)(input)?;

    Ok((
        input,
        Statement::Var(VarStmt {
            name,
            init,
            span: start.span.merge(end.span),
        }),
    ))
}

fn parse_function(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Fn)(input)?;
    let (input, name) = ident(input)?;
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, params) = separated_list0(token(TokenKind::Comma), ident)(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;
    let (input, body) = parse_block(input)?;
    let span = start.span.merge(body.span);

    Ok((
        input,
        Statement::Function(Rc::new(FunctionDecl {
            name,
            params,
            body,
            span,
        })),
    ))
}

fn parse_return_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Return)(input)?;

    let (input, value) = if check(TokenKind::Semicolon)(input) {
        (input, None)
    } else {
        let (input, expr) = parse_expression(input)?;
        (input, Some(expr))
    };

    let (input, end) = token(TokenKind::Semicolon)(input)?;

    Ok((
        input,
        Statement::Return(ReturnStmt {
            value,
            span: start.span.merge(end.span),
        }),
    ))
}

fn parse_throw_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Throw)(input)?;
    let (input, value) = parse_expression(input)?;
    let (input, end) = token(TokenKind::Semicolon)(input)?;

    Ok((
        input,
        Statement::Throw(ThrowStmt {
            value,
            span: start.span.merge(end.span),
        }),
    ))
}

fn parse_break_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Break)(input)?;
    let (input, end) = token(TokenKind::Semicolon)(input)?;
    Ok((input, Statement::Break(start.span.merge(end.span))))
}

fn parse_continue_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Continue)(input)?;
    let (input, end) = token(TokenKind::Semicolon)(input)?;
    Ok((input, Statement::Continue(start.span.merge(end.span))))
}

fn parse_condition(input: TokenStream) -> PResult<Expression> {
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, condition) = parse_expression(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;
    Ok((input, condition))
}

/// `if` with any number of `else if` arms, parsed in a loop so long
/// chains do not nest.
fn parse_if_stmt(input: TokenStream) -> PResult<IfStmt> {
    let (mut input, first) = parse_if_arm(input)?;
    let mut arms = Vec::new();
    let mut else_block = None;

    while check_keyword(Keyword::Else)(input) {
        let (rest, _) = keyword(Keyword::Else)(input)?;
        if check_keyword(Keyword::If)(rest) {
            let (rest, arm) = parse_if_arm(rest)?;
            arms.push(arm);
            input = rest;
        } else {
            let (rest, block) = parse_block(rest)?;
            else_block = Some(block);
            input = rest;
            break;
        }
    }

    let mut else_branch = else_block.map(ElseBranch::Else);
    for arm in arms.into_iter().rev() {
        else_branch = Some(ElseBranch::ElseIf(Box::new(arm.into_stmt(else_branch))));
    }
    Ok((input, first.into_stmt(else_branch)))
}

struct IfArm {
    start: Span,
    condition: Expression,
    then_branch: Block,
}

impl IfArm {
    fn into_stmt(self, else_branch: Option<ElseBranch>) -> IfStmt {
        let end_span = match &else_branch {
            Some(ElseBranch::ElseIf(stmt)) => stmt.span,
            Some(ElseBranch::Else(block)) => block.span,
            None => self.then_branch.span,
        };
        IfStmt {
            condition: self.condition,
            then_branch: self.then_branch,
            else_branch,
            span: self.start.merge(end_span),
        }
    }
}

fn parse_if_arm(input: TokenStream) -> PResult<IfArm> {
    let (input, start) = keyword(Keyword::If)(input)?;
    let (input, condition) = parse_condition(input)?;
    let (input, then_branch) = parse_block(input)?;
    Ok((
        input,
        IfArm {
            start: start.span,
            condition,
            then_branch,
        },
    ))
}

fn parse_while_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::While)(input)?;
    let (input, condition) = parse_condition(input)?;
    let (input, body) = parse_block(input)?;
    let span = start.span.merge(body.span);

    Ok((
        input,
        Statement::While(WhileStmt {
            condition,
            body,
            span,
        }),
    ))
}

fn parse_for_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::For)(input)?;
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, var) = ident(input)?;
    let (input, _) = keyword(Keyword::In)(input)?;
    let (input, iterable) = parse_expression(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;
    let (input, body) = parse_block(input)?;
    let span = start.span.merge(body.span);

    Ok((
        input,
        Statement::For(ForStmt {
            var,
            iterable,
            body,
            span,
        }),
    ))
}

fn parse_try_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Try)(input)?;
    let (input, body) = parse_block(input)?;
    let (input, _) = keyword(Keyword::Catch)(input)?;
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, catch_var) = ident(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;
    let (input, handler) = parse_block(input)?;
    let span = start.span.merge(handler.span);

    Ok((
        input,
        Statement::Try(TryStmt {
            body,
            catch_var,
            handler,
            span,
        }),
    ))
}

fn parse_expr_or_assign_stmt(input: TokenStream) -> PResult<Statement> {
    if check(TokenKind::Ident)(input) && check(TokenKind::Eq)(input.slice(1..)) {
        let (input, target) = ident(input)?;
        let (input, _) = token(TokenKind::Eq)(input)?;
        let (input, value) = parse_expression(input)?;
        let (input, end) = token(TokenKind::Semicolon)(input)?;
        let span = target.span.merge(end.span);
        return Ok((input, Statement::Assign(AssignStmt { target, value, span })));
    }

    let (input, expr) = parse_expression(input)?;
    let (input, end) = token(TokenKind::Semicolon)(input)?;
    let span = expr.span().merge(end.span);
    Ok((input, Statement::Expression(ExprStmt { expr, span })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_stmt_str(source: &str) -> Statement {
        let (tokens, interner) = tokenize(source);
        let input = TokenStream::new(&tokens, source, &interner);
        let (rest, stmt) = parse_statement(input).unwrap();
        assert!(is_eof(rest), "trailing tokens in {:?}", source);
        stmt
    }

    #[test]
    fn test_assignment_vs_expression() {
        assert!(matches!(parse_stmt_str("result = \"42\";"), Statement::Assign(_)));
        assert!(matches!(parse_stmt_str("a == b;"), Statement::Expression(_)));
    }

    #[test]
    fn test_function_declaration() {
        let Statement::Function(decl) = parse_stmt_str("fn greet(who, greeting) { return who; }") else {
            panic!("expected function");
        };
        assert_eq!(&*decl.name.name, "greet");
        assert_eq!(decl.params.len(), 2);
        assert_eq!(decl.body.statements.len(), 1);
    }

    #[test]
    fn test_else_if_chain() {
        let Statement::If(stmt) = parse_stmt_str("if (a) { } else if (b) { } else { x = 1; }") else {
            panic!("expected if");
        };
        let Some(ElseBranch::ElseIf(inner)) = stmt.else_branch else {
            panic!("expected else-if");
        };
        assert!(matches!(inner.else_branch, Some(ElseBranch::Else(_))));
    }

    #[test]
    fn test_try_catch() {
        let Statement::Try(stmt) = parse_stmt_str("try { fubsy.remove(\"x\"); } catch (e) { println(e); }") else {
            panic!("expected try");
        };
        assert_eq!(&*stmt.catch_var.name, "e");
    }

    #[test]
    fn test_for_in() {
        assert!(matches!(parse_stmt_str("for (d in dirs) { continue; }"), Statement::For(_)));
    }
}
