//! Template parser with top-level error recovery
//!
//! The parser owns the token stream and implements the builders' [`Parser`]
//! trait. Statement errors propagate out of nested bodies untouched and are
//! only caught by the top-level loop in [`TemplateParser::parse`], which
//! records them and resynchronizes at the next tag opener.

use crate::config::compile_time::syntax::*;
use crate::grammar::ast::nodes::{Stmt, Template};
use crate::grammar::builders::blocks::*;
use crate::grammar::builders::helpers::{nested, skip_tag};
use crate::grammar::builders::Parser;
use crate::logging::codes;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::syntax::extensions::{ExtensionRegistry, CLOSING_TAGS};
use crate::tokens::{Token, TokenKind, TokenStream};
use crate::{log_classified_error, log_debug, log_error, log_success};
use std::collections::VecDeque;

pub struct TemplateParser<'src, 'ext> {
    tokens: TokenStream<'src>,
    source_name: Option<String>,
    extensions: Option<&'ext ExtensionRegistry>,
    context_stack: Vec<&'static str>,
    error_history: VecDeque<SyntaxError>,
    parse_depth: usize,
}

impl<'src, 'ext> TemplateParser<'src, 'ext> {
    /// The template name is taken from the tokens when the lexer was given one
    pub fn new(tokens: TokenStream<'src>) -> Self {
        let source_name = tokens.current().source_name.map(str::to_string);
        log_debug!("Creating template parser", "tokens" => tokens.len());

        Self {
            tokens,
            source_name,
            extensions: None,
            context_stack: Vec::new(),
            error_history: VecDeque::new(),
            parse_depth: 0,
        }
    }

    pub fn with_extensions(mut self, extensions: &'ext ExtensionRegistry) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Parse the whole stream into a template.
    ///
    /// Recoverable errors are logged, kept in the error history and skipped;
    /// only a nesting-depth overflow aborts the parse. Calling `parse` again
    /// starts over from the first token.
    pub fn parse(&mut self) -> SyntaxResult<Template> {
        self.tokens.restore_position(0);
        self.error_history.clear();
        self.context_stack.clear();
        self.parse_depth = 0;

        log_debug!("Starting template parse",
            "template" => self.display_name(),
            "tokens" => self.tokens.len()
        );

        let mut body = Vec::new();
        while !self.current().is(TokenKind::Eof) {
            if let Some(word) = self.stray_closing_tag() {
                self.reject_stray_tag(word);
                continue;
            }

            let start = self.save_position();
            match self.parse_statement() {
                Ok(Some(stmt)) => body.push(stmt),
                Ok(None) => {}
                Err(error) if error.is_recoverable() => {
                    self.record_error(error);
                    self.recover(start);
                }
                Err(error) => {
                    log_classified_error!(error.error_code(), "Template parse aborted",
                        span = error.span()
                    );
                    return Err(error);
                }
            }
        }

        let template = Template::new(body, self.source_name.clone());
        log_success!(codes::success::AST_CONSTRUCTION_COMPLETE,
            "Template parse completed",
            "template" => self.display_name(),
            "statements" => template.statement_count(),
            "recovered_errors" => self.error_history.len()
        );
        Ok(template)
    }

    /// Errors skipped by the last `parse`, oldest first
    pub fn recovered_errors(&self) -> Vec<SyntaxError> {
        self.error_history.iter().cloned().collect()
    }

    pub fn error_count(&self) -> usize {
        self.error_history.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.error_history.is_empty()
    }

    /// Construct names from the outermost in, e.g. `for > if > expression`
    pub fn current_context(&self) -> String {
        self.context_stack.join(" > ")
    }

    fn display_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or("<template>")
    }

    // === RECOVERY ===

    fn record_error(&mut self, error: SyntaxError) {
        log_error!(error.error_code(), &error.to_string(),
            span = error.span(),
            "template" => self.display_name(),
            "recoverable" => error.is_recoverable()
        );

        if self.error_history.len() >= MAX_ERROR_HISTORY {
            self.error_history.pop_front();
        }
        self.error_history.push_back(error);
    }

    /// Skip to the next tag opener. A statement that failed without
    /// consuming anything is skipped by at least one token.
    fn recover(&mut self, start: usize) {
        if self.save_position() == start {
            self.advance();
        }
        while !self.current().kind.is_statement_boundary() {
            self.advance();
        }
    }

    fn is_closing_word(&self, word: &str) -> bool {
        if CLOSING_TAGS.contains(&word) {
            return true;
        }
        word.starts_with("end") && !self.extensions.is_some_and(|ext| ext.handles_tag(word))
    }

    /// `{% endif %}` and friends at the top level, with no block to close
    fn stray_closing_tag(&self) -> Option<&'src str> {
        if !self.current().is(TokenKind::BlockBegin) {
            return None;
        }
        self.peek(1).word().filter(|word| self.is_closing_word(word))
    }

    /// Record a stray closing tag and drop just that tag, keeping whatever
    /// follows it
    fn reject_stray_tag(&mut self, word: &str) {
        self.advance();
        let tag = self.current();
        self.record_error(SyntaxError::grammar_violation(
            &format!("unexpected '{}' with no open block", word),
            tag.span(),
        ));
        skip_tag(self);
    }

    // === DISPATCH ===

    fn parse_block_tag(&mut self) -> SyntaxResult<Option<Stmt>> {
        let open = self.advance();
        let tag = self.current();
        let Some(word) = tag.word() else {
            return Err(SyntaxError::unexpected_token(&tag, "tag name"));
        };

        let stmt = match word {
            "for" => nested(self, "for", |p| parse_for(p, &open))?,
            "if" => nested(self, "if", |p| parse_if(p, &open))?,
            "set" => nested(self, "set", |p| parse_set(p, &open))?,
            "block" => nested(self, "block", |p| parse_block(p, &open))?,
            "extends" => nested(self, "extends", |p| parse_extends(p, &open))?,
            "include" => nested(self, "include", |p| parse_include(p, &open))?,
            "import" => nested(self, "import", |p| parse_import(p, &open))?,
            "from" => nested(self, "from", |p| parse_from_import(p, &open))?,
            "macro" => nested(self, "macro", |p| parse_macro(p, &open))?,
            "call" => nested(self, "call", |p| parse_call(p, &open))?,
            "with" => nested(self, "with", |p| parse_with(p, &open))?,
            "filter" => nested(self, "filter", |p| parse_filter_block(p, &open))?,
            "autoescape" => nested(self, "autoescape", |p| parse_autoescape(p, &open))?,
            "do" => nested(self, "do", |p| parse_do(p, &open))?,
            "continue" | "break" | "debug" => parse_simple_tag(self, &open)?,
            word if self.is_closing_word(word) => {
                return Err(SyntaxError::grammar_violation(
                    &format!("unexpected '{}' with no matching open block", word),
                    tag.span(),
                ))
            }
            word => return self.parse_extension_tag(word, &open),
        };

        Ok(Some(stmt))
    }

    fn parse_extension_tag(
        &mut self,
        word: &str,
        open: &Token<'src>,
    ) -> SyntaxResult<Option<Stmt>> {
        let tag = self.current();
        let Some(extension) = self.extensions.and_then(|ext| ext.find(word)) else {
            return Err(SyntaxError::unknown_tag(word, tag.span()));
        };

        let start = self.save_position();
        match nested(self, "extension", |p| extension.parse_tag(p, open))? {
            Some(_) if self.save_position() == start => Err(SyntaxError::extension_failure(
                extension.name(),
                &format!("tag '{}' was not consumed", word),
                tag.span(),
            )),
            Some(stmt) => Ok(Some(stmt)),
            None => {
                log_debug!("Extension declined tag",
                    "extension" => extension.name(),
                    "tag" => word
                );
                self.restore_position(start);
                skip_tag(self);
                Ok(None)
            }
        }
    }
}

impl<'src> Parser<'src> for TemplateParser<'src, '_> {
    fn current(&self) -> Token<'src> {
        self.tokens.current()
    }

    fn peek(&self, offset: usize) -> Token<'src> {
        self.tokens.peek(offset)
    }

    fn advance(&mut self) -> Token<'src> {
        self.tokens.next()
    }

    fn save_position(&self) -> usize {
        self.tokens.save_position()
    }

    fn restore_position(&mut self, position: usize) {
        self.tokens.restore_position(position);
    }

    fn source_name(&self) -> Option<String> {
        self.source_name.clone()
    }

    fn enter(&mut self, construct: &'static str) -> SyntaxResult<()> {
        if self.parse_depth >= MAX_PARSE_DEPTH {
            return Err(SyntaxError::max_recursion_depth(
                MAX_PARSE_DEPTH,
                self.current().span(),
            ));
        }

        self.parse_depth += 1;
        if self.context_stack.len() < MAX_CONTEXT_STACK_DEPTH {
            self.context_stack.push(construct);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.parse_depth = self.parse_depth.saturating_sub(1);
        self.context_stack.truncate(self.parse_depth);
    }

    fn parse_statement(&mut self) -> SyntaxResult<Option<Stmt>> {
        let token = self.current();
        match token.kind {
            TokenKind::Data => parse_plain_output(self).map(Some),
            TokenKind::VariableBegin => nested(self, "output", parse_variable_output).map(Some),
            TokenKind::BlockBegin => self.parse_block_tag(),
            TokenKind::RawBegin => parse_raw_block(self).map(Some),
            TokenKind::CommentBegin | TokenKind::LineComment => {
                skip_comment(self);
                Ok(None)
            }
            _ => Err(SyntaxError::unexpected_token(&token, "template data or tag")),
        }
    }
}
