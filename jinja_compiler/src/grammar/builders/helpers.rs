//! Helper functions shared by the statement and expression builders

use crate::grammar::ast::nodes::*;
use crate::grammar::builders::atomic::{parse_identifier, Parser};
use crate::grammar::builders::expressions::parse_expression;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::tokens::{Token, TokenKind};

/// Consume a token of `kind` or fail describing `expected`
pub fn expect<'src>(
    parser: &mut dyn Parser<'src>,
    kind: TokenKind,
    expected: &str,
) -> SyntaxResult<Token<'src>> {
    let token = parser.current();
    if token.is(kind) {
        Ok(parser.advance())
    } else {
        Err(unexpected_token_error(&token, expected))
    }
}

/// Consume a name or keyword spelled `word`
pub fn expect_word(parser: &mut dyn Parser<'_>, word: &str) -> SyntaxResult<()> {
    let token = parser.current();
    if token.is_word(word) {
        parser.advance();
        Ok(())
    } else {
        Err(unexpected_token_error(&token, &format!("'{}'", word)))
    }
}

pub fn expect_block_end<'src>(parser: &mut dyn Parser<'src>) -> SyntaxResult<Token<'src>> {
    expect(parser, TokenKind::BlockEnd, "end of block tag")
}

pub fn skip_if(parser: &mut dyn Parser<'_>, kind: TokenKind) -> bool {
    if parser.current().is(kind) {
        parser.advance();
        true
    } else {
        false
    }
}

pub fn skip_word(parser: &mut dyn Parser<'_>, word: &str) -> bool {
    if parser.current().is_word(word) {
        parser.advance();
        true
    } else {
        false
    }
}

pub fn unexpected_token_error(token: &Token, expected: &str) -> SyntaxError {
    SyntaxError::unexpected_token(token, expected)
}

/// Run `f` one nesting level deeper, failing past the depth limit
pub fn nested<'src, T>(
    parser: &mut dyn Parser<'src>,
    construct: &'static str,
    f: impl FnOnce(&mut dyn Parser<'src>) -> SyntaxResult<T>,
) -> SyntaxResult<T> {
    parser.enter(construct)?;
    let result = f(parser);
    parser.leave();
    result
}

/// True when the cursor sits on `{% word` for one of `words`
pub fn at_tag<'src>(parser: &dyn Parser<'src>, words: &[&str]) -> Option<&'src str> {
    if !parser.current().is(TokenKind::BlockBegin) {
        return None;
    }
    parser
        .peek(1)
        .word()
        .filter(|word| words.contains(word))
}

/// Parse statements until a tag named in `end_words` opens.
///
/// Consumes the `{%` and the matched word, leaving the cursor on the rest of
/// that tag. Running out of input reports the block opened at `open` as
/// unclosed.
pub fn parse_body_until<'src>(
    parser: &mut dyn Parser<'src>,
    tag: &str,
    open: &Token<'src>,
    end_words: &[&str],
) -> SyntaxResult<(Vec<Stmt>, &'src str)> {
    let mut body = Vec::new();
    loop {
        if let Some(word) = at_tag(parser, end_words) {
            parser.advance();
            parser.advance();
            return Ok((body, word));
        }
        if parser.current().is(TokenKind::Eof) {
            return Err(SyntaxError::unclosed_block(tag, end_words, open.span()));
        }
        if let Some(stmt) = parser.parse_statement()? {
            body.push(stmt);
        }
    }
}

/// Body of a block that closes with a single `{% end_word %}`
pub fn parse_closed_body<'src>(
    parser: &mut dyn Parser<'src>,
    tag: &str,
    open: &Token<'src>,
    end_word: &str,
) -> SyntaxResult<Vec<Stmt>> {
    let (body, _) = parse_body_until(parser, tag, open, &[end_word])?;
    expect_block_end(parser)?;
    Ok(body)
}

/// Parse `(a, b=1, c=d)` starting at the opening parenthesis.
///
/// Keyword arguments must follow every positional argument. A trailing
/// comma is accepted.
pub fn parse_call_arguments(
    parser: &mut dyn Parser<'_>,
) -> SyntaxResult<(Vec<Expr>, Vec<KeywordArg>)> {
    expect(parser, TokenKind::LParen, "'('")?;

    let mut args = Vec::new();
    let mut kwargs = Vec::new();

    while !parser.current().is(TokenKind::RParen) {
        if !args.is_empty() || !kwargs.is_empty() {
            expect(parser, TokenKind::Comma, "',' or ')'")?;
            if parser.current().is(TokenKind::RParen) {
                break;
            }
        }

        if parser.current().is(TokenKind::Name) && parser.peek(1).is(TokenKind::Assign) {
            let name = parse_identifier(parser)?;
            parser.advance();
            let value = parse_expression(parser)?;
            kwargs.push(KeywordArg { name, value });
        } else {
            let start = parser.current();
            let value = parse_expression(parser)?;
            if !kwargs.is_empty() {
                return Err(SyntaxError::grammar_violation(
                    "positional argument follows keyword argument",
                    start.span(),
                ));
            }
            args.push(value);
        }
    }

    parser.advance();
    Ok((args, kwargs))
}

/// Parse `(a, b=default)` parameter lists for macros and call blocks
pub fn parse_signature(parser: &mut dyn Parser<'_>) -> SyntaxResult<Vec<MacroParam>> {
    expect(parser, TokenKind::LParen, "'('")?;

    let mut params: Vec<MacroParam> = Vec::new();
    while !parser.current().is(TokenKind::RParen) {
        if !params.is_empty() {
            expect(parser, TokenKind::Comma, "',' or ')'")?;
            if parser.current().is(TokenKind::RParen) {
                break;
            }
        }

        let token = parser.current();
        let name = parse_identifier(parser)?;
        if params.iter().any(|p| p.name == name) {
            return Err(SyntaxError::grammar_violation(
                &format!("duplicate parameter '{}'", name),
                token.span(),
            ));
        }

        let default = if skip_if(parser, TokenKind::Assign) {
            Some(parse_expression(parser)?)
        } else {
            None
        };
        params.push(MacroParam { name, default });
    }

    parser.advance();
    Ok(params)
}

/// Assignment targets: `a`, `a, b` or `(a, b)`
pub fn parse_assign_targets(parser: &mut dyn Parser<'_>) -> SyntaxResult<Vec<Identifier>> {
    let parenthesized = skip_if(parser, TokenKind::LParen);

    let mut targets = vec![parse_identifier(parser)?];
    while skip_if(parser, TokenKind::Comma) {
        if !parser.current().is(TokenKind::Name) {
            break;
        }
        targets.push(parse_identifier(parser)?);
    }

    if parenthesized {
        expect(parser, TokenKind::RParen, "')'")?;
    }
    Ok(targets)
}

/// Optional `with context` / `without context` modifier
pub fn parse_context_modifier(parser: &mut dyn Parser<'_>, default: bool) -> SyntaxResult<bool> {
    let current = parser.current();
    let with = match current.word() {
        Some("with") => true,
        Some("without") => false,
        _ => return Ok(default),
    };

    if !parser.peek(1).is_word("context") {
        return Ok(default);
    }

    parser.advance();
    parser.advance();
    Ok(with)
}

/// Skip to just past the end of the current tag, or to the next tag opener
pub fn skip_tag(parser: &mut dyn Parser<'_>) {
    loop {
        let token = parser.current();
        match token.kind {
            TokenKind::BlockEnd | TokenKind::VariableEnd | TokenKind::CommentEnd => {
                parser.advance();
                return;
            }
            kind if kind.is_statement_boundary() => return,
            _ => {
                parser.advance();
            }
        }
    }
}
