//! Statement builders
//!
//! Tag builders are entered with the `{%` already consumed (passed in as
//! `open`) and the cursor on the tag word. Each one consumes through the
//! closing `%}` of its last tag.

use crate::grammar::ast::nodes::*;
use crate::grammar::ast::visitor::NameUsage;
use crate::grammar::builders::atomic::{make_stmt, parse_identifier, Parser};
use crate::grammar::builders::expressions::{
    parse_expression, parse_expression_no_conditional, parse_filter_call,
};
use crate::grammar::builders::helpers::{
    expect, expect_block_end, expect_word, parse_assign_targets, parse_body_until,
    parse_closed_body, parse_context_modifier, parse_signature, skip_if, skip_word,
};
use crate::grammar::keywords::Keyword;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::tokens::{Token, TokenKind};

// === TEMPLATE DATA ===

/// Consecutive data tokens become one plain-output node
pub fn parse_plain_output(parser: &mut dyn Parser<'_>) -> SyntaxResult<Stmt> {
    let first = parser.current();
    let mut content = String::new();
    while parser.current().is(TokenKind::Data) {
        content.push_str(parser.advance().text);
    }
    if content.is_empty() && !first.is(TokenKind::Data) {
        return Err(SyntaxError::unexpected_token(&first, "template data"));
    }
    Ok(make_stmt(parser, StmtKind::PlainOutput { content }, first.line()))
}

/// `{{ expression }}`
pub fn parse_variable_output(parser: &mut dyn Parser<'_>) -> SyntaxResult<Stmt> {
    let open = expect(parser, TokenKind::VariableBegin, "'{{'")?;
    let expr = parse_expression(parser)?;
    expect(parser, TokenKind::VariableEnd, "end of variable tag")?;
    Ok(make_stmt(parser, StmtKind::VariableOutput { expr }, open.line()))
}

/// `{% raw %}...{% endraw %}` arrives from the lexer as RawBegin, data, RawEnd
pub fn parse_raw_block(parser: &mut dyn Parser<'_>) -> SyntaxResult<Stmt> {
    let open = expect(parser, TokenKind::RawBegin, "raw block")?;
    let mut content = String::new();
    while parser.current().is(TokenKind::Data) {
        content.push_str(parser.advance().text);
    }

    if !skip_if(parser, TokenKind::RawEnd) {
        return Err(SyntaxError::unclosed_block("raw", &["endraw"], open.span()));
    }
    Ok(make_stmt(parser, StmtKind::PlainOutput { content }, open.line()))
}

/// Comments produce no node
pub fn skip_comment(parser: &mut dyn Parser<'_>) {
    match parser.current().kind {
        TokenKind::LineComment => {
            parser.advance();
        }
        TokenKind::CommentBegin => {
            parser.advance();
            skip_if(parser, TokenKind::Comment);
            skip_if(parser, TokenKind::CommentEnd);
        }
        _ => {}
    }
}

// === CONTROL FLOW ===

/// for ::= "for" targets "in" iterable ("if" filter)? "recursive"? body ("else" body)? "endfor"
pub fn parse_for<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::For), "'for'")?;
    let targets = parse_assign_targets(parser)?;
    expect(parser, TokenKind::Keyword(Keyword::In), "'in'")?;
    let iter = parse_expression_no_conditional(parser)?;

    let filter = if skip_if(parser, TokenKind::Keyword(Keyword::If)) {
        Some(parse_expression(parser)?)
    } else {
        None
    };
    let recursive = skip_word(parser, "recursive");
    expect_block_end(parser)?;

    let (body, end) = parse_body_until(parser, "for", open, &["endfor", "else"])?;
    expect_block_end(parser)?;

    let else_body = if end == "else" {
        parse_closed_body(parser, "for", open, "endfor")?
    } else {
        Vec::new()
    };

    Ok(make_stmt(
        parser,
        StmtKind::For {
            targets,
            iter,
            filter,
            recursive,
            body,
            else_body,
        },
        open.line(),
    ))
}

/// if ::= "if" expr body ("elif" expr body)* ("else" body)? "endif"
pub fn parse_if<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    const BRANCH_ENDS: [&str; 3] = ["elif", "else", "endif"];

    expect(parser, TokenKind::Keyword(Keyword::If), "'if'")?;
    let condition = parse_expression(parser)?;
    expect_block_end(parser)?;

    let (body, mut end) = parse_body_until(parser, "if", open, &BRANCH_ENDS)?;
    let mut elif_branches = Vec::new();
    let mut else_body = Vec::new();

    loop {
        match end {
            "elif" => {
                let condition = parse_expression(parser)?;
                expect_block_end(parser)?;
                let (body, next) = parse_body_until(parser, "if", open, &BRANCH_ENDS)?;
                elif_branches.push(ElifBranch { condition, body });
                end = next;
            }
            "else" => {
                expect_block_end(parser)?;
                else_body = parse_closed_body(parser, "if", open, "endif")?;
                break;
            }
            _ => {
                expect_block_end(parser)?;
                break;
            }
        }
    }

    Ok(make_stmt(
        parser,
        StmtKind::If {
            condition,
            body,
            elif_branches,
            else_body,
        },
        open.line(),
    ))
}

/// `continue`, `break` and `debug` take no arguments
pub fn parse_simple_tag<'src>(
    parser: &mut dyn Parser<'src>,
    open: &Token<'src>,
) -> SyntaxResult<Stmt> {
    let tag = parser.advance();
    let kind = match tag.kind {
        TokenKind::Keyword(Keyword::Continue) => StmtKind::Continue,
        TokenKind::Keyword(Keyword::Break) => StmtKind::Break,
        TokenKind::Keyword(Keyword::Debug) => StmtKind::DebugStmt,
        _ => return Err(SyntaxError::unexpected_token(&tag, "'continue', 'break' or 'debug'")),
    };
    expect_block_end(parser)?;
    Ok(make_stmt(parser, kind, open.line()))
}

/// `{% do expr %}`
pub fn parse_do<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Do), "'do'")?;
    let expr = parse_expression(parser)?;
    expect_block_end(parser)?;
    Ok(make_stmt(parser, StmtKind::ExprStmt { expr }, open.line()))
}

// === ASSIGNMENT AND SCOPES ===

/// set ::= "set" targets "=" expr | "set" name body "endset"
pub fn parse_set<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Set), "'set'")?;
    let targets = parse_assign_targets(parser)?;

    if skip_if(parser, TokenKind::Assign) {
        let value = parse_expression(parser)?;
        expect_block_end(parser)?;
        return Ok(make_stmt(
            parser,
            StmtKind::Set {
                targets,
                value: Some(value),
                body: Vec::new(),
            },
            open.line(),
        ));
    }

    if targets.len() != 1 {
        return Err(SyntaxError::grammar_violation(
            "block assignment takes exactly one target",
            parser.current().span(),
        ));
    }
    expect_block_end(parser)?;
    let body = parse_closed_body(parser, "set", open, "endset")?;

    Ok(make_stmt(
        parser,
        StmtKind::Set {
            targets,
            value: None,
            body,
        },
        open.line(),
    ))
}

/// with ::= "with" (name "=" expr ("," name "=" expr)*)? body "endwith"
pub fn parse_with<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::With), "'with'")?;

    let mut assignments = Vec::new();
    while !parser.current().is(TokenKind::BlockEnd) {
        if !assignments.is_empty() {
            expect(parser, TokenKind::Comma, "',' or end of block tag")?;
        }
        let name = parse_identifier(parser)?;
        expect(parser, TokenKind::Assign, "'='")?;
        let value = parse_expression(parser)?;
        assignments.push((name, value));
    }
    expect_block_end(parser)?;
    let body = parse_closed_body(parser, "with", open, "endwith")?;

    Ok(make_stmt(parser, StmtKind::With { assignments, body }, open.line()))
}

/// `{% filter upper | truncate(10) %}...{% endfilter %}`
pub fn parse_filter_block<'src>(
    parser: &mut dyn Parser<'src>,
    open: &Token<'src>,
) -> SyntaxResult<Stmt> {
    expect_word(parser, "filter")?;

    let mut filters = vec![parse_filter_call(parser)?];
    while skip_if(parser, TokenKind::Pipe) {
        filters.push(parse_filter_call(parser)?);
    }
    expect_block_end(parser)?;
    let body = parse_closed_body(parser, "filter", open, "endfilter")?;

    Ok(make_stmt(parser, StmtKind::FilterBlock { filters, body }, open.line()))
}

pub fn parse_autoescape<'src>(
    parser: &mut dyn Parser<'src>,
    open: &Token<'src>,
) -> SyntaxResult<Stmt> {
    expect_word(parser, "autoescape")?;
    let enabled = parse_expression(parser)?;
    expect_block_end(parser)?;
    let body = parse_closed_body(parser, "autoescape", open, "endautoescape")?;

    Ok(make_stmt(parser, StmtKind::Autoescape { enabled, body }, open.line()))
}

// === TEMPLATE STRUCTURE ===

/// block ::= "block" name ("scoped" | "required")* body "endblock" name?
pub fn parse_block<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Block), "'block'")?;
    let name = parse_identifier(parser)?;

    let mut scoped = false;
    let mut required = false;
    loop {
        if skip_word(parser, "scoped") {
            scoped = true;
        } else if skip_word(parser, "required") {
            required = true;
        } else {
            break;
        }
    }
    expect_block_end(parser)?;

    let (body, _) = parse_body_until(parser, "block", open, &["endblock"])?;
    let trailing = parser.current();
    if trailing.is(TokenKind::Name) {
        if trailing.text != name {
            return Err(SyntaxError::grammar_violation(
                &format!("endblock names '{}' but closes block '{}'", trailing.text, name),
                trailing.span(),
            ));
        }
        parser.advance();
    }
    expect_block_end(parser)?;

    Ok(make_stmt(
        parser,
        StmtKind::Block {
            name,
            scoped,
            required,
            body,
        },
        open.line(),
    ))
}

pub fn parse_extends<'src>(
    parser: &mut dyn Parser<'src>,
    open: &Token<'src>,
) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Extends), "'extends'")?;
    let template = parse_expression(parser)?;
    expect_block_end(parser)?;
    Ok(make_stmt(parser, StmtKind::Extends { template }, open.line()))
}

/// include ::= "include" expr ("ignore" "missing")? context_modifier?
pub fn parse_include<'src>(
    parser: &mut dyn Parser<'src>,
    open: &Token<'src>,
) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Include), "'include'")?;
    let template = parse_expression(parser)?;

    let ignore_missing = if skip_word(parser, "ignore") {
        expect_word(parser, "missing")?;
        true
    } else {
        false
    };
    let with_context = parse_context_modifier(parser, true)?;
    expect_block_end(parser)?;

    Ok(make_stmt(
        parser,
        StmtKind::Include {
            template,
            with_context,
            ignore_missing,
        },
        open.line(),
    ))
}

/// import ::= "import" expr "as" name context_modifier?
pub fn parse_import<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Import), "'import'")?;
    let template = parse_expression(parser)?;
    expect_word(parser, "as")?;
    let alias = parse_identifier(parser)?;
    let with_context = parse_context_modifier(parser, false)?;
    expect_block_end(parser)?;

    Ok(make_stmt(
        parser,
        StmtKind::Import {
            template,
            alias,
            with_context,
        },
        open.line(),
    ))
}

/// from ::= "from" expr "import" name ("as" name)? ("," name ("as" name)?)* context_modifier?
pub fn parse_from_import<'src>(
    parser: &mut dyn Parser<'src>,
    open: &Token<'src>,
) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::From), "'from'")?;
    let template = parse_expression(parser)?;
    expect(parser, TokenKind::Keyword(Keyword::Import), "'import'")?;

    let mut names = Vec::new();
    loop {
        if at_context_modifier(parser) {
            break;
        }
        let token = parser.current();
        let name = parse_identifier(parser)?;
        if name.starts_with('_') {
            return Err(SyntaxError::grammar_violation(
                &format!("names starting with an underscore cannot be imported: '{}'", name),
                token.span(),
            ));
        }
        let alias = if skip_word(parser, "as") {
            Some(parse_identifier(parser)?)
        } else {
            None
        };
        names.push(ImportName { name, alias });

        if !skip_if(parser, TokenKind::Comma) {
            break;
        }
    }

    if names.is_empty() {
        return Err(SyntaxError::unexpected_token(&parser.current(), "name to import"));
    }
    let with_context = parse_context_modifier(parser, false)?;
    expect_block_end(parser)?;

    Ok(make_stmt(
        parser,
        StmtKind::FromImport {
            template,
            names,
            with_context,
        },
        open.line(),
    ))
}

fn at_context_modifier(parser: &dyn Parser<'_>) -> bool {
    matches!(parser.current().word(), Some("with" | "without")) && parser.peek(1).is_word("context")
}

// === MACROS AND CALLS ===

/// macro ::= "macro" name signature body "endmacro" name?
///
/// `catch_varargs` / `catch_kwargs` record whether the body mentions the
/// implicit `varargs` / `kwargs` names anywhere.
pub fn parse_macro<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Macro), "'macro'")?;
    let name = parse_identifier(parser)?;
    let params = parse_signature(parser)?;
    expect_block_end(parser)?;

    let (body, _) = parse_body_until(parser, "macro", open, &["endmacro"])?;
    if parser.current().is_word(&name) {
        parser.advance();
    }
    expect_block_end(parser)?;

    let usage = NameUsage::scan(&body);
    Ok(make_stmt(
        parser,
        StmtKind::Macro {
            name,
            params,
            catch_varargs: usage.references("varargs"),
            catch_kwargs: usage.references("kwargs"),
            body,
        },
        open.line(),
    ))
}

/// call ::= "call" signature? call_expr (body "endcall")?
///
/// With a matching `endcall` further on, the tag opens a call block;
/// without one it is a bare call statement.
pub fn parse_call<'src>(parser: &mut dyn Parser<'src>, open: &Token<'src>) -> SyntaxResult<Stmt> {
    expect(parser, TokenKind::Keyword(Keyword::Call), "'call'")?;
    let params = if parser.current().is(TokenKind::LParen) {
        parse_signature(parser)?
    } else {
        Vec::new()
    };

    let call_token = parser.current();
    let call = parse_expression(parser)?;
    if !matches!(call.kind, ExprKind::Call { .. }) {
        return Err(SyntaxError::grammar_violation(
            "call tag requires a call expression",
            call_token.span(),
        ));
    }
    expect_block_end(parser)?;

    if !has_matching_endcall(parser) {
        if !params.is_empty() {
            return Err(SyntaxError::unclosed_block("call", &["endcall"], open.span()));
        }
        return Ok(make_stmt(parser, StmtKind::Call { call }, open.line()));
    }

    let body = parse_closed_body(parser, "call", open, "endcall")?;
    Ok(make_stmt(
        parser,
        StmtKind::CallBlock { call, params, body },
        open.line(),
    ))
}

/// Scan ahead for the `endcall` that closes the current tag, counting
/// nested `call` tags. The cursor is left where it started.
fn has_matching_endcall(parser: &mut dyn Parser<'_>) -> bool {
    let start = parser.save_position();
    let mut depth = 0usize;
    let mut found = false;

    while !parser.current().is(TokenKind::Eof) {
        let token = parser.advance();
        if !token.is(TokenKind::BlockBegin) {
            continue;
        }
        match parser.current().word() {
            Some("call") => depth += 1,
            Some("endcall") if depth == 0 => {
                found = true;
                break;
            }
            Some("endcall") => depth -= 1,
            _ => {}
        }
    }

    parser.restore_position(start);
    found
}

#[cfg(test)]
mod tests {
    use crate::config::SyntaxConfig;
    use crate::grammar::ast::nodes::*;
    use crate::lexical;
    use crate::syntax::{SyntaxError, TemplateParser};
    use assert_matches::assert_matches;

    fn parse(source: &str) -> Template {
        let config = SyntaxConfig::default();
        let tokens = lexical::tokenize(source, &config);
        TemplateParser::new(tokens).parse().expect("parse")
    }

    fn parse_err(source: &str) -> SyntaxError {
        let config = SyntaxConfig::default();
        let tokens = lexical::tokenize(source, &config);
        let mut parser = TemplateParser::new(tokens);
        parser.parse().expect("parse");
        parser
            .recovered_errors()
            .first()
            .cloned()
            .expect("expected a recovered error")
    }

    fn only(template: &Template) -> &StmtKind {
        assert_eq!(template.body.len(), 1, "body: {:?}", template.body);
        &template.body[0].kind
    }

    #[test]
    fn test_for_with_else() {
        let template = parse("{% for x in items %}{{ x }}{% else %}none{% endfor %}");
        assert_matches!(only(&template), StmtKind::For { targets, body, else_body, recursive: false, filter: None, .. } => {
            assert_eq!(targets, &vec!["x".to_string()]);
            assert_eq!(body.len(), 1);
            assert_matches!(&else_body[0].kind, StmtKind::PlainOutput { content } if content == "none");
        });
    }

    #[test]
    fn test_for_with_filter_and_recursive() {
        let template = parse("{% for k, v in pairs if v recursive %}{% endfor %}");
        assert_matches!(only(&template), StmtKind::For { targets, filter: Some(filter), recursive: true, iter, .. } => {
            assert_eq!(targets.len(), 2);
            assert_eq!(filter.as_name(), Some("v"));
            assert_eq!(iter.as_name(), Some("pairs"));
        });
    }

    #[test]
    fn test_if_elif_else_chain() {
        let template = parse("{% if a %}1{% elif b %}2{% elif c %}3{% else %}4{% endif %}");
        assert_matches!(only(&template), StmtKind::If { condition, elif_branches, else_body, .. } => {
            assert_eq!(condition.as_name(), Some("a"));
            assert_eq!(elif_branches.len(), 2);
            assert_eq!(elif_branches[1].condition.as_name(), Some("c"));
            assert_eq!(else_body.len(), 1);
        });
    }

    #[test]
    fn test_set_inline_and_block_forms() {
        let template = parse("{% set a, b = pair %}{% set body %}text{% endset %}");
        assert_matches!(&template.body[0].kind, StmtKind::Set { targets, value: Some(_), .. } if targets.len() == 2);
        assert_matches!(&template.body[1].kind, StmtKind::Set { value: None, body, .. } if body.len() == 1);
    }

    #[test]
    fn test_block_flags_and_trailing_name() {
        let template = parse("{% block content scoped required %}x{% endblock content %}");
        assert_matches!(only(&template), StmtKind::Block { name, scoped: true, required: true, .. } if name == "content");

        let err = parse_err("{% block a %}{% endblock b %}");
        assert_matches!(err, SyntaxError::GrammarViolation { .. });
    }

    #[test]
    fn test_include_modifiers() {
        let template = parse("{% include 'a.html' ignore missing without context %}");
        assert_matches!(only(&template), StmtKind::Include { with_context: false, ignore_missing: true, .. });

        let template = parse("{% include name %}");
        assert_matches!(only(&template), StmtKind::Include { with_context: true, ignore_missing: false, .. });
    }

    #[test]
    fn test_imports() {
        let template = parse("{% import 'forms.html' as forms with context %}");
        assert_matches!(only(&template), StmtKind::Import { alias, with_context: true, .. } if alias == "forms");

        let template = parse("{% from 'forms.html' import input as field, label %}");
        assert_matches!(only(&template), StmtKind::FromImport { names, with_context: false, .. } => {
            assert_eq!(names[0], ImportName { name: "input".into(), alias: Some("field".into()) });
            assert_eq!(names[1], ImportName { name: "label".into(), alias: None });
        });

        let err = parse_err("{% from 'x' import _private %}");
        assert_matches!(err, SyntaxError::GrammarViolation { .. });
    }

    #[test]
    fn test_macro_signature_and_flags() {
        let template = parse(
            "{% macro input(name, type='text') %}{{ varargs }}{{ name }}{% endmacro input %}",
        );
        assert_matches!(only(&template), StmtKind::Macro { name, params, catch_varargs: true, catch_kwargs: false, .. } => {
            assert_eq!(name, "input");
            assert_eq!(params.len(), 2);
            assert!(params[0].default.is_none());
            assert_matches!(params[1].default.as_ref().map(|d| &d.kind), Some(ExprKind::StringLiteral(s)) if s == "text");
        });

        let err = parse_err("{% macro m(a, a) %}{% endmacro %}");
        assert_matches!(err, SyntaxError::GrammarViolation { .. });
    }

    #[test]
    fn test_macro_flags_ignore_assignment_targets() {
        let template = parse("{% macro m() %}{% set varargs = 1 %}{% endmacro %}");
        assert_matches!(only(&template), StmtKind::Macro { catch_varargs: false, catch_kwargs: false, .. });

        let template = parse("{% macro m() %}{% set varargs = 1 %}{{ varargs }}{% endmacro %}");
        assert_matches!(only(&template), StmtKind::Macro { catch_varargs: true, catch_kwargs: false, .. });
    }

    #[test]
    fn test_macro_flags_skip_nested_scopes() {
        let template =
            parse("{% macro m() %}{% macro n() %}{{ kwargs }}{% endmacro %}{% endmacro %}");
        assert_matches!(only(&template), StmtKind::Macro { catch_kwargs: false, body, .. } => {
            assert_matches!(&body[0].kind, StmtKind::Macro { catch_kwargs: true, .. });
        });

        let template = parse(
            "{% macro m() %}{% call(x) f(varargs) %}{{ kwargs }}{% endcall %}{% endmacro %}",
        );
        assert_matches!(only(&template), StmtKind::Macro { catch_varargs: true, catch_kwargs: false, .. });
    }

    #[test]
    fn test_call_block_and_bare_call() {
        let template = parse("{% call(user) list(users) %}{{ user }}{% endcall %}");
        assert_matches!(only(&template), StmtKind::CallBlock { params, body, .. } => {
            assert_eq!(params[0].name, "user");
            assert_eq!(body.len(), 1);
        });

        let template = parse("{% call render() %}after");
        assert_matches!(&template.body[0].kind, StmtKind::Call { .. });
        assert_matches!(&template.body[1].kind, StmtKind::PlainOutput { content } if content == "after");
    }

    #[test]
    fn test_nested_call_blocks_pair_with_their_own_endcall() {
        let template = parse("{% call a() %}{% call b() %}x{% endcall %}{% endcall %}");
        assert_matches!(only(&template), StmtKind::CallBlock { body, .. } => {
            assert_matches!(&body[0].kind, StmtKind::CallBlock { body, .. } if body.len() == 1);
        });
    }

    #[test]
    fn test_call_requires_call_expression() {
        let err = parse_err("{% call name %}{% endcall %}");
        assert_matches!(err, SyntaxError::GrammarViolation { .. });
    }

    #[test]
    fn test_with_filter_autoescape() {
        let template = parse("{% with a = 1, b = x %}{{ a }}{% endwith %}");
        assert_matches!(only(&template), StmtKind::With { assignments, .. } => {
            assert_eq!(assignments[0].0, "a");
            assert_eq!(assignments[1].1.as_name(), Some("x"));
        });

        let template = parse("{% filter upper | replace('a', 'b') %}text{% endfilter %}");
        assert_matches!(only(&template), StmtKind::FilterBlock { filters, .. } => {
            assert_eq!(filters[0].name, "upper");
            assert_eq!(filters[1].args.len(), 2);
        });

        let template = parse("{% autoescape false %}x{% endautoescape %}");
        assert_matches!(only(&template), StmtKind::Autoescape { enabled, .. } => {
            assert_matches!(enabled.kind, ExprKind::BooleanLiteral(false));
        });
    }

    #[test]
    fn test_simple_tags_in_loop() {
        let template =
            parse("{% for x in y %}{% do x.append(1) %}{% continue %}{% break %}{% debug %}{% endfor %}");
        assert_matches!(only(&template), StmtKind::For { body, .. } => {
            assert_matches!(body[0].kind, StmtKind::ExprStmt { .. });
            assert_matches!(body[1].kind, StmtKind::Continue);
            assert_matches!(body[2].kind, StmtKind::Break);
            assert_matches!(body[3].kind, StmtKind::DebugStmt);
        });
    }

    #[test]
    fn test_raw_block_is_plain_output() {
        let template = parse("{% raw %}{{ not parsed }}{% endraw %}");
        assert_matches!(only(&template), StmtKind::PlainOutput { content } if content == "{{ not parsed }}");
    }

    #[test]
    fn test_unclosed_for_reports_open_tag() {
        let err = parse_err("{% for x in y %}body");
        assert_matches!(&err, SyntaxError::UnclosedBlock { tag, .. } if tag == "for");
        assert_eq!(err.position().line, 1);
        assert_eq!(err.position().column, 1);
    }
}
