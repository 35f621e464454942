///
/// Expression Parser
///
/// Parses expressions using nom combinators with Pratt-style precedence.
///

use nom::branch::alt;
use nom::combinator::map;
use nom::multi::separated_list0;
use nom::InputTake;

use crate::ast::*;
use crate::lexer::{Keyword, TokenKind};
use crate::source::Spanned;

use super::combinators::*;
use super::input::TokenStream;

pub fn parse_expression(input: TokenStream) -> PResult<Expression> {
    nested(input, |input| pratt_expr(input, 0))
}

fn pratt_expr(input: TokenStream, min_prec: u8) -> PResult<Expression> {
    let (mut input, mut left) = parse_unary(input)?;

    loop {
        let Some(op) = peek_binary_op(input) else {
            break;
        };

        let prec = op.precedence();
        if prec < min_prec {
            break;
        }

        let (rest, _) = input.take_split(1);
        let (rest, right) = pratt_expr(rest, prec + 1)?;
        input = rest;

        let span = left.span().merge(right.span());
        left = Expression::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        });
    }

    Ok((input, left))
}

fn peek_binary_op(input: TokenStream) -> Option<BinaryOp> {
    let op = match peek_token(input)? {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AndAnd | TokenKind::Keyword(Keyword::And) => BinaryOp::And,
        TokenKind::PipePipe | TokenKind::Keyword(Keyword::Or) => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

fn parse_unary(input: TokenStream) -> PResult<Expression> {
    let start_span = input.current_span();

    let op = match peek_token(input) {
        Some(TokenKind::Minus) => Some(UnaryOp::Neg),
        Some(TokenKind::Bang) | Some(TokenKind::Keyword(Keyword::Not)) => Some(UnaryOp::Not),
        _ => None,
    };

    if let Some(op) = op {
        let (input, _) = input.take_split(1);
        let (input, operand) = nested(input, parse_unary)?;
        let span = start_span.merge(operand.span());
        return Ok((
            input,
            Expression::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
                span,
            }),
        ));
    }

    parse_postfix(input)
}

fn parse_postfix(input: TokenStream) -> PResult<Expression> {
    let (mut input, mut expr) = parse_atom(input)?;

    loop {
        let (rest, next) = match peek_token(input) {
            Some(TokenKind::LParen) => parse_call(input, expr)?,
            Some(TokenKind::LBracket) => parse_index(input, expr)?,
            Some(TokenKind::Dot) => parse_member(input, expr)?,
            _ => break,
        };
        input = rest;
        expr = next;
    }

    Ok((input, expr))
}

fn parse_call(input: TokenStream, callee: Expression) -> PResult<Expression> {
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, args) = separated_list0(token(TokenKind::Comma), parse_expression)(input)?;
    let (input, end) = token(TokenKind::RParen)(input)?;
    let span = callee.span().merge(end.span);
    Ok((
        input,
        Expression::Call(CallExpr {
            callee: Box::new(callee),
            args,
            span,
        }),
    ))
}

fn parse_index(input: TokenStream, object: Expression) -> PResult<Expression> {
    let (input, _) = token(TokenKind::LBracket)(input)?;
    let (input, index) = parse_expression(input)?;
    let (input, end) = token(TokenKind::RBracket)(input)?;
    let span = object.span().merge(end.span);
    Ok((
        input,
        Expression::Index(IndexExpr {
            object: Box::new(object),
            index: Box::new(index),
            span,
        }),
    ))
}

fn parse_member(input: TokenStream, object: Expression) -> PResult<Expression> {
    let (input, _) = token(TokenKind::Dot)(input)?;
    let (input, member) = ident(input)?;
    let span = object.span().merge(member.span);
    Ok((
        input,
        Expression::Member(MemberExpr {
            object: Box::new(object),
            member,
            span,
        }),
    ))
}

fn parse_atom(input: TokenStream) -> PResult<Expression> {
    let result = alt((
        parse_int_literal,
        parse_string_literal,
        parse_bool_literal,
        parse_none_literal,
        parse_identifier,
        parse_grouped,
        parse_list,
    ))(input);

    match result {
        Err(nom::Err::Error(_)) => Err(nom::Err::Error(PError::new(input, PErrorKind::ExpectedExpr))),
        other => other,
    }
}

fn parse_int_literal(input: TokenStream) -> PResult<Expression> {
    let (input, (value, span)) = int_lit(input)?;
    Ok((
        input,
        Expression::Literal(LiteralExpr {
            value: Literal::Int(value),
            span,
        }),
    ))
}

fn parse_string_literal(input: TokenStream) -> PResult<Expression> {
    let (input, (text, span)) = string_lit(input)?;
    Ok((
        input,
        Expression::Literal(LiteralExpr {
            value: Literal::Str(text),
            span,
        }),
    ))
}

fn parse_bool_literal(input: TokenStream) -> PResult<Expression> {
    alt((
        map(keyword(Keyword::True), |t| {
            Expression::Literal(LiteralExpr {
                value: Literal::Bool(true),
                span: t.span,
            })
        }),
        map(keyword(Keyword::False), |t| {
            Expression::Literal(LiteralExpr {
                value: Literal::Bool(false),
                span: t.span,
            })
        }),
    ))(input)
}

fn parse_none_literal(input: TokenStream) -> PResult<Expression> {
    let (input, tok) = keyword(Keyword::None)(input)?;
    Ok((
        input,
        Expression::Literal(LiteralExpr {
            value: Literal::None,
            span: tok.span,
        }),
    ))
}

fn parse_identifier(input: TokenStream) -> PResult<Expression> {
    let (input, name) = ident(input)?;
    Ok((
        input,
        Expression::Identifier(IdentExpr {
            span: name.span,
            ident: name,
        }),
    ))
}

fn parse_grouped(input: TokenStream) -> PResult<Expression> {
    let (input, start) = token(TokenKind::LParen)(input)?;
    let (input, inner) = parse_expression(input)?;
    let (input, end) = token(TokenKind::RParen)(input)?;
    Ok((
        input,
        Expression::Grouped(GroupedExpr {
            inner: Box::new(inner),
            span: start.span.merge(end.span),
        }),
    ))
}

fn parse_list(input: TokenStream) -> PResult<Expression> {
    let (input, start) = token(TokenKind::LBracket)(input)?;
    let (input, elements) = separated_list0(token(TokenKind::Comma), parse_expression)(input)?;
    let (input, end) = token(TokenKind::RBracket)(input)?;
    Ok((
        input,
        Expression::List(ListExpr {
            elements,
            span: start.span.merge(end.span),
        }),
    ))
}
