//! Expression builders
//!
//! One function per precedence level, loosest first:
//!
//! ```text
//! conditional   a if b else c
//! or / and
//! not           prefix `not`
//! comparison    == != < <= > >= in, not in
//! test          is [not] name
//! filter        | name(args)
//! additive      + - ~
//! multiplicative * / // %
//! power         **
//! unary         + - ~ prefix
//! postfix       .attr [index] (args)
//! primary       names, literals, lists, parentheses
//! ```
//!
//! Binary levels are left-associative, `**` included.

use crate::grammar::ast::nodes::*;
use crate::grammar::builders::atomic::{make_expr, parse_dotted_name, parse_literal, Parser};
use crate::grammar::builders::helpers::{
    expect, nested, parse_call_arguments, skip_if, unexpected_token_error,
};
use crate::grammar::keywords::Keyword;
use crate::syntax::error::SyntaxResult;
use crate::tokens::TokenKind;

/// expression ::= conditional
pub fn parse_expression(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    nested(parser, "expression", parse_conditional)
}

/// Expression without a trailing `if ... else ...`, for places where `if`
/// belongs to the enclosing tag (`{% for x in items if x %}`)
pub fn parse_expression_no_conditional(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    nested(parser, "expression", parse_or)
}

fn binary(parser: &dyn Parser<'_>, op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    let line = left.line;
    make_expr(
        parser,
        ExprKind::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    )
}

// === BOOLEAN LEVELS ===

/// conditional ::= or ("if" or ("else" conditional)?)*
fn parse_conditional(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut expr = parse_or(parser)?;

    while parser.current().is_keyword(Keyword::If) {
        parser.advance();
        let condition = parse_or(parser)?;
        let else_expr = if parser.current().is_keyword(Keyword::Else) {
            parser.advance();
            Some(Box::new(nested(parser, "conditional", parse_conditional)?))
        } else {
            None
        };

        let line = expr.line;
        expr = make_expr(
            parser,
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(expr),
                else_expr,
            },
            line,
        );
    }

    Ok(expr)
}

fn parse_or(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut left = parse_and(parser)?;
    while parser.current().is_keyword(Keyword::Or) {
        parser.advance();
        let right = parse_and(parser)?;
        left = binary(parser, BinaryOperator::Or, left, right);
    }
    Ok(left)
}

fn parse_and(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut left = parse_not(parser)?;
    while parser.current().is_keyword(Keyword::And) {
        parser.advance();
        let right = parse_not(parser)?;
        left = binary(parser, BinaryOperator::And, left, right);
    }
    Ok(left)
}

fn parse_not(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let token = parser.current();
    if !token.is_keyword(Keyword::Not) {
        return parse_comparison(parser);
    }

    parser.advance();
    let operand = nested(parser, "not", parse_not)?;
    Ok(make_expr(
        parser,
        ExprKind::UnaryOp {
            op: UnaryOperator::Not,
            operand: Box::new(operand),
        },
        token.line(),
    ))
}

// === COMPARISON AND TESTS ===

fn parse_comparison(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut left = parse_test(parser)?;

    loop {
        let current = parser.current();
        let op = match current.kind {
            TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge
            | TokenKind::Keyword(Keyword::In) => BinaryOperator::from_token(current.kind),
            TokenKind::Keyword(Keyword::Not) if parser.peek(1).is_keyword(Keyword::In) => {
                parser.advance();
                Some(BinaryOperator::NotIn)
            }
            _ => None,
        };

        let Some(op) = op else { break };
        parser.advance();
        let right = parse_test(parser)?;
        left = binary(parser, op, left, right);
    }

    Ok(left)
}

/// test ::= filter ("is" "not"? name test_args?)*
fn parse_test(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut value = parse_filter(parser)?;

    while parser.current().is_keyword(Keyword::Is) {
        parser.advance();
        let negated = skip_if(parser, TokenKind::Keyword(Keyword::Not));
        let name = parse_test_name(parser)?;

        let (args, kwargs) = if parser.current().is(TokenKind::LParen) {
            parse_call_arguments(parser)?
        } else if starts_bare_test_argument(parser.current().kind) {
            let arg = parse_unary(parser)?;
            (vec![arg], Vec::new())
        } else {
            (Vec::new(), Vec::new())
        };

        let line = value.line;
        value = make_expr(
            parser,
            ExprKind::Test {
                value: Box::new(value),
                name,
                args,
                kwargs,
                negated,
            },
            line,
        );
    }

    Ok(value)
}

/// Test names are names or the literal words `true`, `false` and `none`
fn parse_test_name(parser: &mut dyn Parser<'_>) -> SyntaxResult<Identifier> {
    let token = parser.current();
    match token.kind {
        TokenKind::Boolean | TokenKind::Null => {
            parser.advance();
            Ok(token.text.to_lowercase())
        }
        TokenKind::Keyword(Keyword::In) => {
            parser.advance();
            Ok(token.text.to_string())
        }
        _ => parse_dotted_name(parser),
    }
}

/// `x is divisibleby 3` takes one argument without parentheses
fn starts_bare_test_argument(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Name
            | TokenKind::String
            | TokenKind::Integer
            | TokenKind::Float
            | TokenKind::Boolean
            | TokenKind::Null
            | TokenKind::LBracket
    )
}

// === FILTERS ===

/// filter ::= additive ("|" name call_args?)*
fn parse_filter(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let value = parse_additive(parser)?;
    parse_filter_chain(parser, value)
}

/// Apply every `| name(args)` following `value`
pub fn parse_filter_chain(parser: &mut dyn Parser<'_>, mut value: Expr) -> SyntaxResult<Expr> {
    while parser.current().is(TokenKind::Pipe) {
        parser.advance();
        let call = parse_filter_call(parser)?;
        let line = value.line;
        value = make_expr(
            parser,
            ExprKind::Filter {
                value: Box::new(value),
                name: call.name,
                args: call.args,
                kwargs: call.kwargs,
            },
            line,
        );
    }
    Ok(value)
}

/// One link of a filter chain: `name call_args?`
pub fn parse_filter_call(parser: &mut dyn Parser<'_>) -> SyntaxResult<FilterCall> {
    let name = parse_dotted_name(parser)?;
    let (args, kwargs) = if parser.current().is(TokenKind::LParen) {
        parse_call_arguments(parser)?
    } else {
        (Vec::new(), Vec::new())
    };
    Ok(FilterCall { name, args, kwargs })
}

// === ARITHMETIC ===

fn parse_additive(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut left = parse_multiplicative(parser)?;
    loop {
        let op = match parser.current().kind {
            TokenKind::Add => BinaryOperator::Add,
            TokenKind::Sub => BinaryOperator::Sub,
            TokenKind::Tilde => BinaryOperator::Concat,
            _ => break,
        };
        parser.advance();
        let right = parse_multiplicative(parser)?;
        left = binary(parser, op, left, right);
    }
    Ok(left)
}

fn parse_multiplicative(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut left = parse_power(parser)?;
    loop {
        let op = match parser.current().kind {
            TokenKind::Mul => BinaryOperator::Mul,
            TokenKind::Div => BinaryOperator::Div,
            TokenKind::FloorDiv => BinaryOperator::FloorDiv,
            TokenKind::Mod => BinaryOperator::Mod,
            _ => break,
        };
        parser.advance();
        let right = parse_power(parser)?;
        left = binary(parser, op, left, right);
    }
    Ok(left)
}

fn parse_power(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let mut left = parse_unary(parser)?;
    while parser.current().is(TokenKind::Pow) {
        parser.advance();
        let right = parse_unary(parser)?;
        left = binary(parser, BinaryOperator::Pow, left, right);
    }
    Ok(left)
}

fn parse_unary(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let token = parser.current();
    let op = match token.kind {
        TokenKind::Sub => UnaryOperator::Neg,
        TokenKind::Add => UnaryOperator::Pos,
        TokenKind::Tilde => UnaryOperator::Invert,
        _ => {
            let primary = parse_primary(parser)?;
            return parse_postfix(parser, primary);
        }
    };

    parser.advance();
    let operand = nested(parser, "unary", parse_unary)?;
    Ok(make_expr(
        parser,
        ExprKind::UnaryOp {
            op,
            operand: Box::new(operand),
        },
        token.line(),
    ))
}

// === PRIMARY AND POSTFIX ===

fn parse_primary(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let token = parser.current();
    match token.kind {
        TokenKind::Name => {
            parser.advance();
            Ok(make_expr(
                parser,
                ExprKind::Name(token.text.to_string()),
                token.line(),
            ))
        }
        kind if kind.is_literal() => parse_literal(parser),
        TokenKind::LParen => {
            parser.advance();
            let expr = parse_expression(parser)?;
            expect(parser, TokenKind::RParen, "')'")?;
            Ok(expr)
        }
        TokenKind::LBracket => parse_list(parser),
        _ => Err(unexpected_token_error(&token, "expression")),
    }
}

/// list ::= "[" (expression ("," expression)* ","?)? "]"
fn parse_list(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let open = expect(parser, TokenKind::LBracket, "'['")?;

    let mut items = Vec::new();
    while !parser.current().is(TokenKind::RBracket) {
        if !items.is_empty() {
            expect(parser, TokenKind::Comma, "',' or ']'")?;
            if parser.current().is(TokenKind::RBracket) {
                break;
            }
        }
        items.push(parse_expression(parser)?);
    }
    parser.advance();

    Ok(make_expr(parser, ExprKind::ListLiteral(items), open.line()))
}

fn parse_postfix(parser: &mut dyn Parser<'_>, mut expr: Expr) -> SyntaxResult<Expr> {
    loop {
        let line = expr.line;
        let token = parser.current();
        let kind = match token.kind {
            TokenKind::Dot => {
                parser.advance();
                let attr = parser.current();
                match attr.kind {
                    // `items.0` indexes like `items[0]`
                    TokenKind::Integer => {
                        let index = parse_literal(parser)?;
                        ExprKind::GetItem {
                            value: Box::new(expr),
                            index: Box::new(index),
                        }
                    }
                    _ => match attr.word() {
                        Some(word) => {
                            parser.advance();
                            ExprKind::GetAttr {
                                value: Box::new(expr),
                                attr: word.to_string(),
                            }
                        }
                        None => return Err(unexpected_token_error(&attr, "attribute name")),
                    },
                }
            }
            TokenKind::LBracket => {
                parser.advance();
                let index = parse_subscript(parser)?;
                expect(parser, TokenKind::RBracket, "']'")?;
                ExprKind::GetItem {
                    value: Box::new(expr),
                    index: Box::new(index),
                }
            }
            TokenKind::LParen => {
                let (args, kwargs) = parse_call_arguments(parser)?;
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                    kwargs,
                }
            }
            _ => return Ok(expr),
        };
        expr = make_expr(parser, kind, line);
    }
}

/// subscript ::= expression | expression? ":" expression? (":" expression?)?
fn parse_subscript(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let line = parser.current().line();

    let start = if parser.current().is(TokenKind::Colon) {
        None
    } else {
        let expr = parse_expression(parser)?;
        if !parser.current().is(TokenKind::Colon) {
            return Ok(expr);
        }
        Some(Box::new(expr))
    };

    parser.advance();
    let stop = parse_slice_part(parser)?;
    let step = if skip_if(parser, TokenKind::Colon) {
        parse_slice_part(parser)?
    } else {
        None
    };

    Ok(make_expr(parser, ExprKind::Slice { start, stop, step }, line))
}

fn parse_slice_part(parser: &mut dyn Parser<'_>) -> SyntaxResult<Option<Box<Expr>>> {
    match parser.current().kind {
        TokenKind::Colon | TokenKind::RBracket => Ok(None),
        _ => Ok(Some(Box::new(parse_expression(parser)?))),
    }
}
