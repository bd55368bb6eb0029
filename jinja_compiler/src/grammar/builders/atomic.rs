//! Parser interface and atomic builders
//!
//! Builders are free functions over `&mut dyn Parser`, so the statement
//! builders, the expression ladder and extensions all drive the same cursor.
//! This module holds the trait plus the leaf productions: names and literals.

use crate::grammar::ast::nodes::*;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::tokens::{Token, TokenKind};

/// Cursor and dispatch surface the builders expect
pub trait Parser<'src> {
    // === BASIC NAVIGATION ===
    fn current(&self) -> Token<'src>;
    fn peek(&self, offset: usize) -> Token<'src>;
    /// Consume the current token and return it
    fn advance(&mut self) -> Token<'src>;

    // === CHECKPOINTS ===
    fn save_position(&self) -> usize;
    fn restore_position(&mut self, position: usize);

    // === CONTEXT ===
    fn source_name(&self) -> Option<String>;

    /// Enter a nested construct. Fails once the nesting limit is reached.
    fn enter(&mut self, construct: &'static str) -> SyntaxResult<()>;
    fn leave(&mut self);

    /// Parse one statement at the cursor. `Ok(None)` means the tokens were
    /// consumed without producing a node (comments, declined extension tags).
    fn parse_statement(&mut self) -> SyntaxResult<Option<Stmt>>;
}

pub(crate) fn make_expr(parser: &dyn Parser<'_>, kind: ExprKind, line: usize) -> Expr {
    Expr::new(kind, line, parser.source_name())
}

pub(crate) fn make_stmt(parser: &dyn Parser<'_>, kind: StmtKind, line: usize) -> Stmt {
    Stmt::new(kind, line, parser.source_name())
}

// === NAMES ===

/// identifier ::= NAME
pub fn parse_identifier(parser: &mut dyn Parser<'_>) -> SyntaxResult<Identifier> {
    let token = parser.current();
    match token.kind {
        TokenKind::Name => {
            parser.advance();
            Ok(token.text.to_string())
        }
        _ => Err(SyntaxError::unexpected_token(&token, "name")),
    }
}

/// Filter and test names may be dotted: `| ns.upper`
pub fn parse_dotted_name(parser: &mut dyn Parser<'_>) -> SyntaxResult<Identifier> {
    let mut name = parse_identifier(parser)?;
    while parser.current().is(TokenKind::Dot) && parser.peek(1).is(TokenKind::Name) {
        parser.advance();
        name.push('.');
        name.push_str(parser.advance().text);
    }
    Ok(name)
}

// === LITERALS ===

/// literal ::= STRING+ | INTEGER | FLOAT | BOOLEAN | NULL
///
/// Adjacent string literals are joined into one value.
pub fn parse_literal(parser: &mut dyn Parser<'_>) -> SyntaxResult<Expr> {
    let token = parser.current();
    let line = token.line();

    let kind = match token.kind {
        TokenKind::String => {
            let mut value = String::new();
            while parser.current().is(TokenKind::String) {
                value.push_str(&unescape_string(parser.advance().text));
            }
            return Ok(make_expr(parser, ExprKind::StringLiteral(value), line));
        }
        TokenKind::Integer => ExprKind::IntegerLiteral(parse_integer(&token)?),
        TokenKind::Float => ExprKind::FloatLiteral(parse_float(&token)?),
        TokenKind::Boolean => ExprKind::BooleanLiteral(token.text == "true"),
        TokenKind::Null => ExprKind::NullLiteral,
        _ => return Err(SyntaxError::unexpected_token(&token, "literal")),
    };

    parser.advance();
    Ok(make_expr(parser, kind, line))
}

/// Integers that do not fit in an `i64` are rejected
pub fn parse_integer(token: &Token) -> SyntaxResult<i64> {
    token
        .text
        .parse::<i64>()
        .map_err(|e| SyntaxError::invalid_literal(token.text, &e.to_string(), token.span()))
}

pub fn parse_float(token: &Token) -> SyntaxResult<f64> {
    let value = token
        .text
        .parse::<f64>()
        .map_err(|e| SyntaxError::invalid_literal(token.text, &e.to_string(), token.span()))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(SyntaxError::invalid_literal(
            token.text,
            "float literal is out of range",
            token.span(),
        ))
    }
}

/// Decode the raw text of a string token, quotes included.
///
/// `\n`, `\t`, `\r`, `\\` and escaped quotes are translated; any other escape
/// is kept as written. An unterminated literal (no closing quote) decodes to
/// everything after the opening quote.
pub fn unescape_string(raw: &str) -> String {
    let mut chars = raw.chars();
    let quote = match chars.next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return raw.to_string(),
    };

    let mut value = String::with_capacity(raw.len());
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(c @ ('\\' | '\'' | '"')) => value.push(c),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => value.push('\\'),
            },
            c if c == quote => break,
            c => value.push(c),
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Position;
    use assert_matches::assert_matches;

    fn token(kind: TokenKind, text: &str) -> Token<'_> {
        Token::new(kind, text, Position::start(), None)
    }

    #[test]
    fn test_unescape_known_sequences() {
        assert_eq!(unescape_string(r#"'a\nb'"#), "a\nb");
        assert_eq!(unescape_string(r#""tab\there""#), "tab\there");
        assert_eq!(unescape_string(r#"'it\'s'"#), "it's");
        assert_eq!(unescape_string(r#"'back\\slash'"#), "back\\slash");
    }

    #[test]
    fn test_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape_string(r#"'\d+'"#), "\\d+");
    }

    #[test]
    fn test_unescape_unterminated() {
        assert_eq!(unescape_string("'abc }}"), "abc }}");
        assert_eq!(unescape_string("'"), "");
    }

    #[test]
    fn test_integer_overflow_is_invalid_literal() {
        assert_eq!(parse_integer(&token(TokenKind::Integer, "1000")).unwrap(), 1000);
        let err = parse_integer(&token(TokenKind::Integer, "99999999999999999999")).unwrap_err();
        assert_matches!(err, SyntaxError::InvalidLiteral { .. });
    }

    #[test]
    fn test_float_out_of_range() {
        assert_eq!(parse_float(&token(TokenKind::Float, "2.5")).unwrap(), 2.5);
        assert_matches!(
            parse_float(&token(TokenKind::Float, "1e999")),
            Err(SyntaxError::InvalidLiteral { .. })
        );
    }
}
