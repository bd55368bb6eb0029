//! Cursor over a lexed token vector
//!
//! The stream keeps every token the lexer produced (including whitespace
//! inside tags) and walks only the significant ones. The vector always ends
//! with an `Eof` token, and reads past the end return that token, so callers
//! never see an out-of-bounds position.

use crate::tokens::token::{Token, TokenKind};
use crate::utils::Position;

#[derive(Debug, Clone)]
pub struct TokenStream<'src> {
    /// All tokens, in source order
    all_tokens: Vec<Token<'src>>,
    /// Indices into all_tokens for significant (non-whitespace) tokens
    significant_indices: Vec<usize>,
    /// Current position in significant_indices
    position: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(mut tokens: Vec<Token<'src>>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (position, source_name) = tokens
                .last()
                .map(|t| (t.position.advance_str(t.text), t.source_name))
                .unwrap_or((Position::start(), None));
            tokens.push(Token::new(TokenKind::Eof, "", position, source_name));
        }

        let significant_indices = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.kind.is_significant())
            .map(|(i, _)| i)
            .collect();

        Self {
            all_tokens: tokens,
            significant_indices,
            position: 0,
        }
    }

    // === CORE NAVIGATION ===

    /// The token under the cursor
    pub fn current(&self) -> Token<'src> {
        self.peek(0)
    }

    /// Consume the current token and return it
    pub fn next(&mut self) -> Token<'src> {
        let token = self.current();
        if self.has_next() {
            self.position += 1;
        }
        token
    }

    /// Look `offset` significant tokens ahead of the cursor
    pub fn peek(&self, offset: usize) -> Token<'src> {
        let index = (self.position + offset).min(self.significant_indices.len() - 1);
        self.all_tokens[self.significant_indices[index]]
    }

    /// True while the cursor has not reached the final `Eof`
    pub fn has_next(&self) -> bool {
        self.position + 1 < self.significant_indices.len()
    }

    // === CHECKPOINTS ===

    pub fn save_position(&self) -> usize {
        self.position
    }

    pub fn restore_position(&mut self, saved_position: usize) {
        self.position = saved_position.min(self.significant_indices.len() - 1);
    }

    // === INSPECTION ===

    /// Every token, including whitespace inside tags
    pub fn all_tokens(&self) -> &[Token<'src>] {
        &self.all_tokens
    }

    /// Number of significant tokens, `Eof` included
    pub fn len(&self) -> usize {
        self.significant_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Significant tokens around the cursor, for error reporting
    pub fn context_snippet(&self, radius: usize) -> Vec<Token<'src>> {
        let start = self.position.saturating_sub(radius);
        let end = (self.position + radius + 1).min(self.significant_indices.len());

        self.significant_indices[start..end]
            .iter()
            .map(|&i| self.all_tokens[i])
            .collect()
    }
}

/// Builds token vectors by hand, computing positions from the pushed text
#[derive(Debug)]
pub struct TokenStreamBuilder<'src> {
    tokens: Vec<Token<'src>>,
    current_position: Position,
    source_name: Option<&'src str>,
}

impl<'src> TokenStreamBuilder<'src> {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            current_position: Position::start(),
            source_name: None,
        }
    }

    pub fn with_source_name(mut self, name: &'src str) -> Self {
        self.source_name = Some(name);
        self
    }

    pub fn push_token(mut self, kind: TokenKind, text: &'src str) -> Self {
        let start = self.current_position;
        self.tokens
            .push(Token::new(kind, text, start, self.source_name));
        self.current_position = start.advance_str(text);
        self
    }

    pub fn build(self) -> TokenStream<'src> {
        TokenStream::new(self.tokens)
    }
}

impl Default for TokenStreamBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
