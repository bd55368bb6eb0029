//! Syntax errors raised while building the template tree
//!
//! Every variant carries the span of the offending token and maps to a
//! logging code. All of them except `MaxRecursionDepth` are recovered from
//! by the top-level statement loop.

use crate::logging::{codes, Code};
use crate::tokens::{Token, TokenKind};
use crate::utils::{Position, Span};

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unexpected {found} at {span}: expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unexpected end of template at {span}: expected {expected}")]
    UnexpectedEndOfTemplate { expected: String, span: Span },

    #[error("Unknown tag '{tag}' at {span}")]
    UnknownTag { tag: String, span: Span },

    #[error("Unclosed '{tag}' block opened at {span}: expected {expected}")]
    UnclosedBlock {
        tag: String,
        expected: String,
        span: Span,
    },

    #[error("Invalid literal '{literal}' at {span}: {message}")]
    InvalidLiteral {
        literal: String,
        message: String,
        span: Span,
    },

    #[error("{message} at {span}")]
    GrammarViolation { message: String, span: Span },

    #[error("Maximum nesting depth {depth} exceeded at {span}")]
    MaxRecursionDepth { depth: usize, span: Span },

    #[error("Extension '{extension}' failed at {span}: {message}")]
    ExtensionFailure {
        extension: String,
        message: String,
        span: Span,
    },
}

impl SyntaxError {
    /// Error for `token` where `expected` was required. Running into `Eof`
    /// reports an unexpected end of template instead.
    pub fn unexpected_token(token: &Token, expected: &str) -> Self {
        if token.kind == TokenKind::Eof {
            return Self::UnexpectedEndOfTemplate {
                expected: expected.to_string(),
                span: token.span(),
            };
        }

        let found = match token.kind {
            TokenKind::Name
            | TokenKind::Keyword(_)
            | TokenKind::Integer
            | TokenKind::Float
            | TokenKind::Boolean
            | TokenKind::Null => format!("'{}'", token.text),
            kind => kind.describe().to_string(),
        };

        Self::UnexpectedToken {
            expected: expected.to_string(),
            found,
            span: token.span(),
        }
    }

    pub fn unknown_tag(tag: &str, span: Span) -> Self {
        Self::UnknownTag {
            tag: tag.to_string(),
            span,
        }
    }

    pub fn unclosed_block(tag: &str, end_words: &[&str], span: Span) -> Self {
        let expected = end_words
            .iter()
            .map(|w| format!("'{}'", w))
            .collect::<Vec<_>>()
            .join(" or ");
        Self::UnclosedBlock {
            tag: tag.to_string(),
            expected,
            span,
        }
    }

    pub fn invalid_literal(literal: &str, message: &str, span: Span) -> Self {
        Self::InvalidLiteral {
            literal: literal.to_string(),
            message: message.to_string(),
            span,
        }
    }

    pub fn grammar_violation(message: &str, span: Span) -> Self {
        Self::GrammarViolation {
            message: message.to_string(),
            span,
        }
    }

    pub fn max_recursion_depth(depth: usize, span: Span) -> Self {
        Self::MaxRecursionDepth { depth, span }
    }

    pub fn extension_failure(extension: &str, message: &str, span: Span) -> Self {
        Self::ExtensionFailure {
            extension: extension.to_string(),
            message: message.to_string(),
            span,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::UnexpectedEndOfTemplate { .. } => codes::syntax::UNEXPECTED_END_OF_TEMPLATE,
            Self::UnknownTag { .. } => codes::syntax::UNKNOWN_TAG,
            Self::UnclosedBlock { .. } => codes::syntax::UNCLOSED_BLOCK,
            Self::InvalidLiteral { .. } => codes::syntax::INVALID_LITERAL,
            Self::GrammarViolation { .. } => codes::syntax::GRAMMAR_VIOLATION,
            Self::MaxRecursionDepth { .. } => codes::syntax::MAX_RECURSION_DEPTH,
            Self::ExtensionFailure { .. } => codes::syntax::EXTENSION_FAILURE,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEndOfTemplate { span, .. }
            | Self::UnknownTag { span, .. }
            | Self::UnclosedBlock { span, .. }
            | Self::InvalidLiteral { span, .. }
            | Self::GrammarViolation { span, .. }
            | Self::MaxRecursionDepth { span, .. }
            | Self::ExtensionFailure { span, .. } => *span,
        }
    }

    pub fn position(&self) -> Position {
        self.span().start()
    }

    pub fn line(&self) -> usize {
        self.position().line
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn token(kind: TokenKind, text: &str) -> Token<'_> {
        Token::new(kind, text, Position::new(4, 1, 5), None)
    }

    #[test]
    fn test_unexpected_token_describes_found_token() {
        let err = SyntaxError::unexpected_token(&token(TokenKind::BlockEnd, "%}"), "expression");
        assert_matches!(&err, SyntaxError::UnexpectedToken { found, .. } if found == "end of block tag");
        assert_eq!(err.position().column, 5);
        assert_eq!(err.error_code(), codes::syntax::UNEXPECTED_TOKEN);

        let err = SyntaxError::unexpected_token(&token(TokenKind::Name, "foo"), "'='");
        assert!(err.to_string().contains("'foo'"));
    }

    #[test]
    fn test_eof_becomes_unexpected_end() {
        let err = SyntaxError::unexpected_token(&token(TokenKind::Eof, ""), "'%}'");
        assert_matches!(err, SyntaxError::UnexpectedEndOfTemplate { .. });
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_recursion_depth_is_not_recoverable() {
        let err = SyntaxError::max_recursion_depth(128, Span::default());
        assert!(!err.is_recoverable());
        assert!(err.requires_halt());
        assert_eq!(err.severity(), "High");
    }

    #[test]
    fn test_unclosed_block_lists_end_words() {
        let err = SyntaxError::unclosed_block("for", &["endfor", "else"], Span::default());
        assert_eq!(err.error_code(), codes::syntax::UNCLOSED_BLOCK);
        assert!(err.to_string().contains("'endfor' or 'else'"));
    }
}
