//! Delimiter-driven template lexer
//!
//! The lexer walks the source once and produces the full token vector up
//! front. It never fails: malformed input degrades to `Data` tokens or
//! partial literals, and anything suspicious is recorded as a
//! [`LexicalError`] diagnostic instead of being returned as an error.

use crate::config::compile_time::lexical::LINE_PREFIX_INDENT_BUDGET;
use crate::config::runtime::{LexicalPreferences, SyntaxConfig};
use crate::grammar::keywords::{classify_literal_word, Keyword, LiteralWord};
use crate::logging::codes;
use crate::tokens::{Token, TokenKind, TokenStream};
use crate::utils::{Position, Span};
use crate::{log_debug, log_success, log_warning};
use std::collections::HashMap;

/// Problems the lexer tolerates but reports
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexicalError {
    #[error("Unterminated string literal starting at {position}")]
    UnterminatedString { position: Position },

    #[error("Unterminated comment starting at {position}")]
    UnterminatedComment { position: Position },

    #[error("Raw block opened at {position} is never closed")]
    UnterminatedRaw { position: Position },

    #[error("Unexpected character '{character}' at {position}")]
    UnexpectedCharacter { character: char, position: Position },
}

impl LexicalError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexicalError::UnterminatedString { .. } => codes::lexical::UNTERMINATED_STRING,
            LexicalError::UnterminatedComment { .. } => codes::lexical::UNTERMINATED_COMMENT,
            LexicalError::UnterminatedRaw { .. } => codes::lexical::UNTERMINATED_RAW_BLOCK,
            LexicalError::UnexpectedCharacter { .. } => codes::lexical::UNEXPECTED_CHARACTER,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            LexicalError::UnterminatedString { position }
            | LexicalError::UnterminatedComment { position }
            | LexicalError::UnterminatedRaw { position }
            | LexicalError::UnexpectedCharacter { position, .. } => *position,
        }
    }

    fn is_unterminated(&self) -> bool {
        !matches!(self, LexicalError::UnexpectedCharacter { .. })
    }
}

/// Counters gathered over one `tokenize` call
#[derive(Debug, Default, Clone)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub data_tokens: usize,
    pub tag_count: usize,
    pub name_tokens: usize,
    pub keyword_tokens: usize,
    pub literal_tokens: usize,
    pub operator_tokens: usize,
    pub whitespace_tokens: usize,
    pub comment_count: usize,
    pub line_count: usize,
    pub unterminated_literals: usize,
    pub unexpected_characters: usize,

    // Only filled when detailed metrics are enabled
    pub tokens_by_kind: HashMap<TokenKind, usize>,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, token: &Token, preferences: &LexicalPreferences) {
        self.total_tokens += 1;

        match token.kind {
            TokenKind::Data => self.data_tokens += 1,
            TokenKind::BlockBegin
            | TokenKind::VariableBegin
            | TokenKind::RawBegin
            | TokenKind::CommentBegin => self.tag_count += 1,
            TokenKind::Name => self.name_tokens += 1,
            TokenKind::Keyword(_) => self.keyword_tokens += 1,
            TokenKind::Whitespace => self.whitespace_tokens += 1,
            TokenKind::Comment | TokenKind::LineComment => self.comment_count += 1,
            kind if kind.is_literal() => self.literal_tokens += 1,
            kind if kind.is_operator() => self.operator_tokens += 1,
            _ => {}
        }

        if preferences.collect_detailed_metrics {
            *self.tokens_by_kind.entry(token.kind).or_insert(0) += 1;
        }
    }

    pub(crate) fn record_diagnostic(&mut self, diagnostic: &LexicalError) {
        if diagnostic.is_unterminated() {
            self.unterminated_literals += 1;
        } else {
            self.unexpected_characters += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerState {
    Initial,
    InBlock,
    InVariable,
    InComment,
    InRaw,
}

/// A complete `{% word %}` tag matched at one position
#[derive(Debug, Clone, Copy)]
struct TagMatch {
    len: usize,
    strip_before: bool,
    strip_after: bool,
}

#[derive(Debug, Clone, Copy)]
enum Opening {
    Block { len: usize, strip: bool },
    Raw(TagMatch),
    Variable { len: usize, strip: bool },
    Comment { len: usize, strip: bool },
    LineStatement { len: usize },
    LineComment { len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartDelimiter {
    Block,
    Variable,
    Comment,
}

/// Template lexer over one source buffer
pub struct Lexer<'src, 'cfg> {
    source: &'src str,
    source_name: Option<&'src str>,
    config: &'cfg SyntaxConfig,
    preferences: LexicalPreferences,
    /// Start delimiters, longest first
    starts: Vec<(&'cfg str, StartDelimiter)>,

    state: LexerState,
    cursor: Position,
    tokens: Vec<Token<'src>>,
    metrics: LexicalMetrics,
    diagnostics: Vec<LexicalError>,

    strip_leading_whitespace: bool,
    trim_next_newline: bool,
    in_line_statement: bool,
    bracket_depth: usize,
    raw_start: Position,
    comment_start: Position,
}

impl<'src, 'cfg> Lexer<'src, 'cfg> {
    pub fn new(source: &'src str, config: &'cfg SyntaxConfig) -> Self {
        let mut starts = vec![
            (config.block_start.as_str(), StartDelimiter::Block),
            (config.variable_start.as_str(), StartDelimiter::Variable),
            (config.comment_start.as_str(), StartDelimiter::Comment),
        ];
        starts.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            source,
            source_name: None,
            config,
            preferences: LexicalPreferences::default(),
            starts,
            state: LexerState::Initial,
            cursor: Position::start(),
            tokens: Vec::new(),
            metrics: LexicalMetrics::default(),
            diagnostics: Vec::new(),
            strip_leading_whitespace: false,
            trim_next_newline: false,
            in_line_statement: false,
            bracket_depth: 0,
            raw_start: Position::start(),
            comment_start: Position::start(),
        }
    }

    pub fn with_source_name(mut self, name: &'src str) -> Self {
        self.source_name = Some(name);
        self
    }

    pub fn with_preferences(mut self, preferences: LexicalPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn diagnostics(&self) -> &[LexicalError] {
        &self.diagnostics
    }

    pub fn state(&self) -> LexerState {
        self.state
    }

    /// Scan the whole source. The returned vector always ends with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token<'src>> {
        self.reset();

        log_debug!("Starting lexical analysis",
            "bytes" => self.source.len(),
            "line_statement_prefix" => self.config.line_statement_prefix.as_deref().unwrap_or("-")
        );

        while self.cursor.offset < self.source.len() {
            match self.state {
                LexerState::Initial => self.lex_initial(),
                LexerState::InBlock | LexerState::InVariable => self.lex_tag(),
                LexerState::InComment => self.lex_comment(),
                LexerState::InRaw => self.lex_raw(),
            }
        }

        self.finish();

        let tokens = std::mem::take(&mut self.tokens);
        for token in &tokens {
            self.metrics.record_token(token, &self.preferences);
        }
        self.metrics.line_count = self.cursor.line;

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
            "tokens" => tokens.len(),
            "lines" => self.metrics.line_count,
            "diagnostics" => self.diagnostics.len()
        );

        tokens
    }

    pub fn tokenize_stream(&mut self) -> TokenStream<'src> {
        TokenStream::new(self.tokenize())
    }

    fn reset(&mut self) {
        self.state = LexerState::Initial;
        self.cursor = Position::start();
        self.tokens.clear();
        self.metrics = LexicalMetrics::default();
        self.diagnostics.clear();
        self.strip_leading_whitespace = false;
        self.trim_next_newline = false;
        self.in_line_statement = false;
        self.bracket_depth = 0;
    }

    // === CURSOR HELPERS ===

    fn rest(&self) -> &'src str {
        &self.source[self.cursor.offset..]
    }

    fn emit(&mut self, kind: TokenKind, len: usize) {
        let start = self.cursor.offset;
        let text = &self.source[start..start + len];
        self.tokens
            .push(Token::new(kind, text, self.cursor, self.source_name));
        self.cursor = self.cursor.advance_str(text);
    }

    fn skip(&mut self, len: usize) {
        let start = self.cursor.offset;
        self.cursor = self.cursor.advance_str(&self.source[start..start + len]);
    }

    fn report(&mut self, diagnostic: LexicalError) {
        let span = Span::point(diagnostic.position());
        let message = diagnostic.to_string();

        if diagnostic.is_unterminated() {
            if self.preferences.warn_on_unterminated {
                log_warning!(code = diagnostic.error_code(), &message, span = span);
            }
        } else {
            log_warning!(code = diagnostic.error_code(), &message, span = span);
        }

        self.metrics.record_diagnostic(&diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// `{%-` and friends: drop trailing whitespace from the preceding data
    fn strip_trailing_data(&mut self) {
        if let Some(last) = self.tokens.last_mut() {
            if last.kind == TokenKind::Data {
                let text = last.text;
                let trimmed = text.trim_end();
                if trimmed.is_empty() {
                    self.tokens.pop();
                } else {
                    last.text = trimmed;
                }
            }
        }
    }

    fn leading_whitespace_len(text: &str) -> usize {
        text.len() - text.trim_start().len()
    }

    // === INITIAL STATE ===

    fn lex_initial(&mut self) {
        if self.trim_next_newline {
            self.trim_next_newline = false;
            let rest = self.rest();
            if rest.starts_with("\r\n") {
                self.skip(2);
            } else if rest.starts_with('\n') {
                self.skip(1);
            }
            return;
        }

        if self.strip_leading_whitespace {
            self.strip_leading_whitespace = false;
            let len = Self::leading_whitespace_len(self.rest());
            self.skip(len);
            return;
        }

        if let Some(opening) = self.match_opening(self.cursor.offset) {
            self.open(opening);
            return;
        }

        let start = self.cursor.offset;
        let end = self
            .rest()
            .char_indices()
            .skip(1)
            .map(|(i, _)| start + i)
            .find(|&at| self.match_opening(at).is_some())
            .unwrap_or(self.source.len());

        self.emit(TokenKind::Data, end - start);
    }

    fn match_opening(&self, at: usize) -> Option<Opening> {
        if let Some(opening) = self.match_line_prefix(at) {
            return Some(opening);
        }

        let rest = &self.source[at..];
        for &(delimiter, kind) in &self.starts {
            if !rest.starts_with(delimiter) {
                continue;
            }

            let strip = rest[delimiter.len()..].starts_with('-');
            let len = delimiter.len() + usize::from(strip);

            return Some(match kind {
                StartDelimiter::Block => match self.match_tag_word(rest, "raw") {
                    Some(tag) => Opening::Raw(tag),
                    None => Opening::Block { len, strip },
                },
                StartDelimiter::Variable => Opening::Variable { len, strip },
                StartDelimiter::Comment => Opening::Comment { len, strip },
            });
        }

        None
    }

    /// Line prefixes only count at the start of a line, after at most
    /// `LINE_PREFIX_INDENT_BUDGET` columns of spaces or tabs.
    fn match_line_prefix(&self, at: usize) -> Option<Opening> {
        let statement = self.config.line_statement_prefix.as_deref();
        let comment = self.config.line_comment_prefix.as_deref();
        if statement.is_none() && comment.is_none() {
            return None;
        }

        if at > 0 && self.source.as_bytes()[at - 1] != b'\n' {
            return None;
        }

        let rest = &self.source[at..];
        let indent = rest
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        if indent > LINE_PREFIX_INDENT_BUDGET {
            return None;
        }
        let after = &rest[indent..];

        let statement_len = statement.filter(|p| after.starts_with(p)).map(str::len);
        let comment_len = comment.filter(|p| after.starts_with(p)).map(str::len);

        match (statement_len, comment_len) {
            (Some(s), Some(c)) if s > c => Some(Opening::LineStatement { len: indent + s }),
            (Some(s), None) => Some(Opening::LineStatement { len: indent + s }),
            (_, Some(_)) => {
                let line_len = after.find('\n').unwrap_or(after.len());
                let line_len = if after[..line_len].ends_with('\r') {
                    line_len - 1
                } else {
                    line_len
                };
                Some(Opening::LineComment {
                    len: indent + line_len,
                })
            }
            (None, None) => None,
        }
    }

    /// Match `<block_start>[-] word [-]<block_end>` at the start of `text`
    fn match_tag_word(&self, text: &str, word: &str) -> Option<TagMatch> {
        let block_start = self.config.block_start.as_str();
        let block_end = self.config.block_end.as_str();

        let mut rest = text.strip_prefix(block_start)?;
        let mut len = block_start.len();

        let strip_before = rest.starts_with('-');
        if strip_before {
            rest = &rest[1..];
            len += 1;
        }

        let ws = Self::leading_whitespace_len(rest);
        rest = rest[ws..].strip_prefix(word)?;
        len += ws + word.len();

        let ws = Self::leading_whitespace_len(rest);
        rest = &rest[ws..];
        len += ws;

        let strip_after = rest.starts_with('-') && rest[1..].starts_with(block_end);
        if strip_after {
            rest = &rest[1..];
            len += 1;
        }

        rest.strip_prefix(block_end)?;
        len += block_end.len();

        Some(TagMatch {
            len,
            strip_before,
            strip_after,
        })
    }

    fn open(&mut self, opening: Opening) {
        match opening {
            Opening::Block { len, strip } => {
                if strip {
                    self.strip_trailing_data();
                }
                self.emit(TokenKind::BlockBegin, len);
                self.state = LexerState::InBlock;
            }
            Opening::Raw(tag) => {
                if tag.strip_before {
                    self.strip_trailing_data();
                }
                self.raw_start = self.cursor;
                self.emit(TokenKind::RawBegin, tag.len);
                self.strip_leading_whitespace = tag.strip_after;
                self.state = LexerState::InRaw;
            }
            Opening::Variable { len, strip } => {
                if strip {
                    self.strip_trailing_data();
                }
                self.emit(TokenKind::VariableBegin, len);
                self.state = LexerState::InVariable;
            }
            Opening::Comment { len, strip } => {
                if strip {
                    self.strip_trailing_data();
                }
                self.comment_start = self.cursor;
                self.emit(TokenKind::CommentBegin, len);
                self.state = LexerState::InComment;
            }
            Opening::LineStatement { len } => {
                self.emit(TokenKind::BlockBegin, len);
                self.state = LexerState::InBlock;
                self.in_line_statement = true;
                self.bracket_depth = 0;
            }
            Opening::LineComment { len } => {
                self.emit(TokenKind::LineComment, len);
            }
        }
    }

    // === TAG STATES ===

    fn lex_tag(&mut self) {
        let rest = self.rest();

        if self.in_line_statement && self.bracket_depth == 0 && rest.starts_with('\n') {
            self.emit(TokenKind::BlockEnd, 1);
            self.close_tag();
            return;
        }

        let (end_delimiter, end_kind) = match self.state {
            LexerState::InBlock => (self.config.block_end.as_str(), TokenKind::BlockEnd),
            _ => (self.config.variable_end.as_str(), TokenKind::VariableEnd),
        };

        let stripped_end = rest
            .strip_prefix('-')
            .is_some_and(|r| r.starts_with(end_delimiter));
        if stripped_end || rest.starts_with(end_delimiter) {
            let is_block = self.state == LexerState::InBlock;
            self.emit(end_kind, end_delimiter.len() + usize::from(stripped_end));
            self.strip_leading_whitespace = stripped_end;
            if is_block && self.config.trim_blocks && !self.in_line_statement {
                self.trim_next_newline = true;
            }
            self.close_tag();
            return;
        }

        let Some(ch) = rest.chars().next() else {
            return;
        };

        match ch {
            c if c.is_whitespace() => {
                let len = if self.in_line_statement && self.bracket_depth == 0 {
                    rest.find(|c: char| !c.is_whitespace() || c == '\n')
                        .unwrap_or(rest.len())
                } else {
                    Self::leading_whitespace_len(rest)
                };
                self.emit(TokenKind::Whitespace, len);
            }
            '\'' | '"' => self.lex_string(ch),
            '0'..='9' => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_name(),
            _ => self.lex_symbol(ch),
        }
    }

    fn close_tag(&mut self) {
        self.state = LexerState::Initial;
        self.in_line_statement = false;
        self.bracket_depth = 0;
    }

    /// Backslash escapes are kept verbatim; an unterminated string runs to
    /// the end of the source.
    fn lex_string(&mut self, quote: char) {
        let start = self.cursor;
        let rest = self.rest();

        let mut escaped = false;
        let mut end = None;
        for (i, c) in rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
                continue;
            }
            if c == '\\' {
                escaped = true;
            } else if c == quote {
                end = Some(i + c.len_utf8());
                break;
            }
        }

        match end {
            Some(len) => self.emit(TokenKind::String, len),
            None => {
                self.emit(TokenKind::String, rest.len());
                self.report(LexicalError::UnterminatedString { position: start });
            }
        }
    }

    fn lex_number(&mut self) {
        let bytes = self.rest().as_bytes();
        let digits_from = |from: usize| {
            bytes[from..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
        };

        let mut len = digits_from(0);
        let mut kind = TokenKind::Integer;

        if bytes.get(len) == Some(&b'.') {
            let fraction = digits_from(len + 1);
            if fraction > 0 {
                len += 1 + fraction;
                kind = TokenKind::Float;
            }
        }

        if matches!(bytes.get(len), Some(b'e' | b'E')) {
            let mut exponent_start = len + 1;
            if matches!(bytes.get(exponent_start), Some(b'+' | b'-')) {
                exponent_start += 1;
            }
            let exponent = digits_from(exponent_start);
            if exponent > 0 {
                len = exponent_start + exponent;
                kind = TokenKind::Float;
            }
        }

        self.emit(kind, len);
    }

    fn lex_name(&mut self) {
        let rest = self.rest();
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let word = &rest[..len];

        let kind = if let Some(keyword) = Keyword::from_str(word) {
            TokenKind::Keyword(keyword)
        } else {
            match classify_literal_word(word) {
                Some(LiteralWord::Boolean(_)) => TokenKind::Boolean,
                Some(LiteralWord::Null) => TokenKind::Null,
                None => TokenKind::Name,
            }
        };

        self.emit(kind, len);
    }

    fn lex_symbol(&mut self, ch: char) {
        let rest = self.rest();

        let two = rest.get(..2).and_then(TokenKind::from_symbol);
        let (kind, len) = match two {
            Some(kind) => (Some(kind), 2),
            None => (
                rest.get(..ch.len_utf8()).and_then(TokenKind::from_symbol),
                ch.len_utf8(),
            ),
        };

        match kind {
            Some(kind) => {
                match kind {
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                        self.bracket_depth += 1
                    }
                    TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                        self.bracket_depth = self.bracket_depth.saturating_sub(1)
                    }
                    _ => {}
                }
                self.emit(kind, len);
            }
            None => {
                let position = self.cursor;
                self.emit(TokenKind::Data, len);
                self.report(LexicalError::UnexpectedCharacter {
                    character: ch,
                    position,
                });
            }
        }
    }

    // === COMMENT AND RAW STATES ===

    fn lex_comment(&mut self) {
        let rest = self.rest();
        let end_delimiter = self.config.comment_end.as_str();

        match rest.find(end_delimiter) {
            Some(index) => {
                let strip = rest[..index].ends_with('-');
                let body_len = index - usize::from(strip);
                self.emit(TokenKind::Comment, body_len);
                self.emit(
                    TokenKind::CommentEnd,
                    end_delimiter.len() + usize::from(strip),
                );
                self.strip_leading_whitespace = strip;
                self.trim_next_newline = self.config.trim_blocks;
            }
            None => {
                self.emit(TokenKind::Comment, rest.len());
                self.report(LexicalError::UnterminatedComment {
                    position: self.comment_start,
                });
            }
        }

        self.state = LexerState::Initial;
    }

    fn lex_raw(&mut self) {
        if self.strip_leading_whitespace {
            self.strip_leading_whitespace = false;
            let len = Self::leading_whitespace_len(self.rest());
            self.skip(len);
            return;
        }

        let rest = self.rest();
        let end = rest
            .match_indices(self.config.block_start.as_str())
            .find_map(|(index, _)| {
                self.match_tag_word(&rest[index..], "endraw")
                    .map(|tag| (index, tag))
            });

        match end {
            Some((index, tag)) => {
                if index > 0 {
                    self.emit(TokenKind::Data, index);
                }
                if tag.strip_before {
                    self.strip_trailing_data();
                }
                self.emit(TokenKind::RawEnd, tag.len);
                self.strip_leading_whitespace = tag.strip_after;
                self.trim_next_newline = self.config.trim_blocks;
            }
            None => {
                self.emit(TokenKind::Data, rest.len());
                self.report(LexicalError::UnterminatedRaw {
                    position: self.raw_start,
                });
            }
        }

        self.state = LexerState::Initial;
    }

    /// Close whatever is still open at the end of the source and append `Eof`
    fn finish(&mut self) {
        match self.state {
            LexerState::InComment => {
                self.emit(TokenKind::Comment, 0);
                self.report(LexicalError::UnterminatedComment {
                    position: self.comment_start,
                });
            }
            LexerState::InRaw => {
                self.report(LexicalError::UnterminatedRaw {
                    position: self.raw_start,
                });
            }
            LexerState::InBlock if self.in_line_statement => {
                self.emit(TokenKind::BlockEnd, 0);
            }
            _ => {}
        }
        self.close_tag();

        self.emit(TokenKind::Eof, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn lex(source: &str) -> Vec<Token<'_>> {
        let config = SyntaxConfig::default();
        Lexer::new(source, &config).tokenize()
    }

    fn lex_with<'a>(source: &'a str, config: &SyntaxConfig) -> Vec<Token<'a>> {
        Lexer::new(source, config).tokenize()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens
            .iter()
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Whitespace)
            .collect()
    }

    fn texts<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_plain_data_is_single_token() {
        let tokens = lex("Hello, world!\nNo tags here.");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Data);
        assert_eq!(tokens[0].text, "Hello, world!\nNo tags here.");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_variable_tag() {
        let tokens = lex("Hello {{ name }}!");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Data,
                TokenKind::VariableBegin,
                TokenKind::Name,
                TokenKind::VariableEnd,
                TokenKind::Data,
                TokenKind::Eof,
            ]
        );
        assert_eq!(texts(&tokens), vec!["Hello ", "{{", "name", "}}", "!", ""]);
    }

    #[test]
    fn test_tokenization_is_lossless() {
        let source = "<ul>\n{% for item in items if item.ok %}\n  <li>{{ item.name | upper }}</li>\n{% endfor %}{# done #}</ul>";
        let tokens = lex(source);
        let rebuilt: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_positions_are_one_indexed() {
        let tokens = lex("ab\n{{ x }}");
        let name = tokens.iter().find(|t| t.kind == TokenKind::Name).unwrap();
        assert_eq!(name.line(), 2);
        assert_eq!(name.column(), 4);
        assert_eq!(name.position.offset, 6);
    }

    #[test]
    fn test_keywords_and_literal_words() {
        let tokens = lex("{{ None none null true false endset for }}");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::VariableBegin,
                TokenKind::Null,
                TokenKind::Name,
                TokenKind::Null,
                TokenKind::Boolean,
                TokenKind::Boolean,
                TokenKind::Name,
                TokenKind::Keyword(Keyword::For),
                TokenKind::VariableEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("{{ 42 3.14 1e3 2.5E-2 7. }}");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::VariableBegin,
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Integer,
                TokenKind::Dot,
                TokenKind::VariableEnd,
                TokenKind::Eof,
            ]
        );
        assert_eq!(texts(&tokens)[4], "2.5E-2");
    }

    #[test]
    fn test_two_character_operators_win() {
        let tokens = lex("{{ a ** b // c == d != e <= f >= g < h = i }}");
        let ops: Vec<TokenKind> = kinds(&tokens)
            .into_iter()
            .filter(|k| k.is_operator())
            .collect();
        assert_eq!(
            ops,
            vec![
                TokenKind::Pow,
                TokenKind::FloorDiv,
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Lt,
                TokenKind::Assign,
            ]
        );
    }

    #[test]
    fn test_strings_keep_escapes_verbatim() {
        let tokens = lex(r#"{{ 'it\'s' "a\"b" }}"#);
        let strings: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::String)
            .map(|t| t.text)
            .collect();
        assert_eq!(strings, vec![r"'it\'s'", r#""a\"b""#]);
    }

    #[test]
    fn test_unterminated_string_spans_to_end() {
        let config = SyntaxConfig::default();
        let mut lexer = Lexer::new("{{ 'abc }}", &config);
        let tokens = lexer.tokenize();

        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::VariableBegin, TokenKind::String, TokenKind::Eof]
        );
        assert_eq!(tokens[2].text, "'abc }}");
        assert_matches!(
            lexer.diagnostics(),
            [LexicalError::UnterminatedString { position }] if position.column == 4
        );
        assert_eq!(lexer.metrics().unterminated_literals, 1);
    }

    #[test]
    fn test_raw_block() {
        let tokens = lex("{% raw %}{{ not_a_var }}{% endraw %}");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::RawBegin,
                TokenKind::Data,
                TokenKind::RawEnd,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            texts(&tokens),
            vec!["{% raw %}", "{{ not_a_var }}", "{% endraw %}", ""]
        );
    }

    #[test]
    fn test_raw_requires_exact_word() {
        let tokens = lex("{% rawish %}");
        assert_eq!(tokens[0].kind, TokenKind::BlockBegin);
        assert_eq!(tokens[2].text, "rawish");
    }

    #[test]
    fn test_unclosed_raw_emits_rest_as_data() {
        let config = SyntaxConfig::default();
        let mut lexer = Lexer::new("{% raw %}abc {{ x }}", &config);
        let tokens = lexer.tokenize();

        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::RawBegin, TokenKind::Data, TokenKind::Eof]
        );
        assert_eq!(tokens[1].text, "abc {{ x }}");
        assert_matches!(lexer.diagnostics(), [LexicalError::UnterminatedRaw { .. }]);
    }

    #[test]
    fn test_comment_tokens() {
        let tokens = lex("{# hi #}x{##}");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::CommentBegin,
                TokenKind::Comment,
                TokenKind::CommentEnd,
                TokenKind::Data,
                TokenKind::CommentBegin,
                TokenKind::Comment,
                TokenKind::CommentEnd,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[1].text, " hi ");
        assert_eq!(tokens[5].text, "");
    }

    #[test]
    fn test_unterminated_comment() {
        let config = SyntaxConfig::default();
        let mut lexer = Lexer::new("a{# never closed", &config);
        let tokens = lexer.tokenize();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Data,
                TokenKind::CommentBegin,
                TokenKind::Comment,
                TokenKind::Eof
            ]
        );
        assert_matches!(
            lexer.diagnostics(),
            [LexicalError::UnterminatedComment { position }] if position.offset == 1
        );
    }

    #[test]
    fn test_whitespace_control_markers() {
        let tokens = lex("a  {%- if x -%}  b\n{{- y }}");
        assert_eq!(
            texts(&tokens),
            vec!["a", "{%-", "if", "x", "-%}", "b", "{{-", "y", "}}", ""]
        );
    }

    #[test]
    fn test_trim_blocks() {
        let config = SyntaxConfig::default().with_trim_blocks(true);
        let tokens = lex_with("{% if x %}\nA\n{% endif %}\nB{{ y }}\nC", &config);
        let data: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Data)
            .map(|t| t.text)
            .collect();
        assert_eq!(data, vec!["A\n", "B", "\nC"]);
    }

    #[test]
    fn test_line_statements() {
        let config = SyntaxConfig::default().with_line_statement_prefix("#");
        let tokens = lex_with("# for x in y\n  {{ x }}\n  # endfor\n", &config);

        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::BlockBegin,
                TokenKind::Keyword(Keyword::For),
                TokenKind::Name,
                TokenKind::Keyword(Keyword::In),
                TokenKind::Name,
                TokenKind::BlockEnd,
                TokenKind::Data,
                TokenKind::VariableBegin,
                TokenKind::Name,
                TokenKind::VariableEnd,
                TokenKind::Data,
                TokenKind::BlockBegin,
                TokenKind::Keyword(Keyword::EndFor),
                TokenKind::BlockEnd,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].text, "#");
        assert_eq!(texts(&tokens)[11], "  #");
        assert_eq!(texts(&tokens)[5], "\n");
    }

    #[test]
    fn test_line_statement_spans_lines_inside_brackets() {
        let config = SyntaxConfig::default().with_line_statement_prefix("%");
        let tokens = lex_with("% set x = [1,\n 2]\n", &config);
        let ends = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::BlockEnd)
            .count();
        assert_eq!(ends, 1);
        assert_eq!(tokens[tokens.len() - 2].kind, TokenKind::BlockEnd);
    }

    #[test]
    fn test_line_statement_at_end_of_source_is_closed() {
        let config = SyntaxConfig::default().with_line_statement_prefix("#");
        let tokens = lex_with("# break", &config);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::BlockBegin,
                TokenKind::Keyword(Keyword::Break),
                TokenKind::BlockEnd,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_line_prefix_respects_indent_budget() {
        let config = SyntaxConfig::default().with_line_statement_prefix("#");
        let deep = format!("{}# break", " ".repeat(LINE_PREFIX_INDENT_BUDGET + 1));
        let tokens = lex_with(&deep, &config);
        assert_eq!(kinds(&tokens), vec![TokenKind::Data, TokenKind::Eof]);

        let mid_line = lex_with("a # break", &config);
        assert_eq!(kinds(&mid_line), vec![TokenKind::Data, TokenKind::Eof]);
    }

    #[test]
    fn test_line_comments() {
        let config = SyntaxConfig::default()
            .with_line_statement_prefix("#")
            .with_line_comment_prefix("##");
        let tokens = lex_with("a\n## note\nb", &config);
        assert_eq!(
            texts(&tokens),
            vec!["a\n", "## note", "\nb", ""]
        );
        assert_eq!(tokens[1].kind, TokenKind::LineComment);
    }

    #[test]
    fn test_custom_delimiters() {
        let config = SyntaxConfig {
            block_start: "<%".to_string(),
            block_end: "%>".to_string(),
            variable_start: "<<".to_string(),
            variable_end: ">>".to_string(),
            comment_start: "<#".to_string(),
            comment_end: "#>".to_string(),
            ..SyntaxConfig::default()
        };
        let tokens = lex_with("{{ x }}<< a > b >><% if c %>", &config);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Data,
                TokenKind::VariableBegin,
                TokenKind::Name,
                TokenKind::Gt,
                TokenKind::Name,
                TokenKind::VariableEnd,
                TokenKind::BlockBegin,
                TokenKind::Keyword(Keyword::If),
                TokenKind::Name,
                TokenKind::BlockEnd,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].text, "{{ x }}");
    }

    #[test]
    fn test_unexpected_character_degrades_to_data() {
        let config = SyntaxConfig::default();
        let mut lexer = Lexer::new("{{ a $ b }}", &config);
        let tokens = lexer.tokenize();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::VariableBegin,
                TokenKind::Name,
                TokenKind::Data,
                TokenKind::Name,
                TokenKind::VariableEnd,
                TokenKind::Eof,
            ]
        );
        assert_matches!(
            lexer.diagnostics(),
            [LexicalError::UnexpectedCharacter { character: '$', .. }]
        );
        assert_eq!(lexer.metrics().unexpected_characters, 1);
    }

    #[test]
    fn test_metrics_and_repeatable_tokenize() {
        let config = SyntaxConfig::default();
        let mut lexer = Lexer::new("{% if a %}{{ 1 + b }}{% endif %}", &config);
        let first = lexer.tokenize();
        let second = lexer.tokenize();
        assert_eq!(first, second);

        let metrics = lexer.metrics();
        assert_eq!(metrics.tag_count, 3);
        assert_eq!(metrics.keyword_tokens, 2);
        assert_eq!(metrics.literal_tokens, 1);
        assert_eq!(metrics.operator_tokens, 1);
        assert_eq!(metrics.total_tokens, first.len());
    }
}
