//! Lexical analysis for template sources
//!
//! [`Lexer`] turns source text plus a [`SyntaxConfig`] into a token vector.
//! The helpers here cover the common one-shot cases.

pub mod analyzer;

use crate::config::compile_time::lexical::LINE_PREFIX_INDENT_BUDGET;
use crate::config::runtime::{LexicalPreferences, SyntaxConfig};
use crate::logging::codes;
use crate::tokens::TokenStream;

pub use analyzer::{LexerState, Lexer, LexicalError, LexicalMetrics};

/// Tokenize an anonymous template
pub fn tokenize<'src>(source: &'src str, config: &SyntaxConfig) -> TokenStream<'src> {
    Lexer::new(source, config).tokenize_stream()
}

/// Tokenize a template whose tokens carry `name` for diagnostics
pub fn tokenize_named<'src>(
    source: &'src str,
    name: &'src str,
    config: &SyntaxConfig,
) -> TokenStream<'src> {
    Lexer::new(source, config)
        .with_source_name(name)
        .tokenize_stream()
}

/// Tokenize and hand back the diagnostics and metrics alongside the stream
pub fn tokenize_with_preferences<'src>(
    source: &'src str,
    name: Option<&'src str>,
    config: &SyntaxConfig,
    preferences: LexicalPreferences,
) -> (TokenStream<'src>, Vec<LexicalError>, LexicalMetrics) {
    let mut lexer = Lexer::new(source, config).with_preferences(preferences);
    if let Some(name) = name {
        lexer = lexer.with_source_name(name);
    }

    let stream = lexer.tokenize_stream();
    (
        stream,
        lexer.diagnostics().to_vec(),
        lexer.metrics().clone(),
    )
}

/// Check that every lexical code has registry metadata
pub fn init_lexical_analysis_logging() -> Result<(), String> {
    let lexical_codes = [
        codes::lexical::UNEXPECTED_CHARACTER,
        codes::lexical::UNTERMINATED_STRING,
        codes::lexical::UNTERMINATED_COMMENT,
        codes::lexical::UNTERMINATED_RAW_BLOCK,
    ];

    for code in &lexical_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    crate::log_debug!("Lexical analysis initialized",
        "line_prefix_indent_budget" => LINE_PREFIX_INDENT_BUDGET
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenKind;

    #[test]
    fn test_tokenize_named_sets_source_name() {
        let config = SyntaxConfig::default();
        let stream = tokenize_named("{{ x }}", "page.html", &config);
        assert!(stream
            .all_tokens()
            .iter()
            .all(|t| t.source_name == Some("page.html")));
    }

    #[test]
    fn test_stream_skips_whitespace() {
        let config = SyntaxConfig::default();
        let mut stream = tokenize("{{  x  }}", &config);
        assert_eq!(stream.next().kind, TokenKind::VariableBegin);
        assert_eq!(stream.next().kind, TokenKind::Name);
        assert_eq!(stream.next().kind, TokenKind::VariableEnd);
        assert_eq!(stream.current().kind, TokenKind::Eof);
    }

    #[test]
    fn test_tokenize_with_preferences_returns_diagnostics() {
        let config = SyntaxConfig::default();
        let preferences = LexicalPreferences {
            collect_detailed_metrics: true,
            warn_on_unterminated: false,
        };
        let (_, diagnostics, metrics) =
            tokenize_with_preferences("{{ 'x", None, &config, preferences);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(metrics.tokens_by_kind.get(&TokenKind::String), Some(&1));
    }

    #[test]
    fn test_lexical_codes_registered() {
        assert!(init_lexical_analysis_logging().is_ok());
    }
}
