//! Syntax analysis: token stream to template tree
//!
//! [`TemplateParser`] drives the grammar builders and recovers from
//! statement-level errors at the top level of a template. The free functions
//! below are the one-shot entry points.

pub mod error;
pub mod extensions;
pub mod parser;

pub use crate::grammar::ast::nodes::Template;
pub use error::{SyntaxError, SyntaxResult};
pub use extensions::{is_builtin_tag, Extension, ExtensionRegistry, BUILTIN_TAGS, CLOSING_TAGS};
pub use parser::TemplateParser;

use crate::logging::codes;
use crate::tokens::TokenStream;
use crate::{log_debug, log_error};

/// Parse a token stream, failing on the first recorded error.
///
/// Use [`parse_template_with_extensions`] to keep the partial tree and the
/// recovered errors instead.
pub fn parse_template(tokens: TokenStream<'_>) -> SyntaxResult<Template> {
    log_debug!("Starting syntax analysis", "tokens" => tokens.len());

    let mut parser = TemplateParser::new(tokens);
    let template = parser.parse()?;

    match parser.recovered_errors().into_iter().next() {
        Some(first) => {
            log_error!(first.error_code(), "Syntax analysis failed",
                span = first.span(),
                "errors" => parser.error_count()
            );
            Err(first)
        }
        None => Ok(template),
    }
}

/// Parse with custom tags enabled, returning the tree together with every
/// error the parser recovered from
pub fn parse_template_with_extensions(
    tokens: TokenStream<'_>,
    extensions: &ExtensionRegistry,
) -> SyntaxResult<(Template, Vec<SyntaxError>)> {
    log_debug!("Starting syntax analysis",
        "tokens" => tokens.len(),
        "extensions" => extensions.len()
    );

    let mut parser = TemplateParser::new(tokens).with_extensions(extensions);
    let template = parser.parse()?;
    Ok((template, parser.recovered_errors()))
}

/// Check that every syntax code is registered
pub fn init_syntax_logging() -> Result<(), String> {
    let syntax_codes = [
        codes::syntax::UNEXPECTED_TOKEN,
        codes::syntax::UNEXPECTED_END_OF_TEMPLATE,
        codes::syntax::UNKNOWN_TAG,
        codes::syntax::UNCLOSED_BLOCK,
        codes::syntax::INVALID_LITERAL,
        codes::syntax::GRAMMAR_VIOLATION,
        codes::syntax::EXTENSION_FAILURE,
        codes::syntax::MAX_RECURSION_DEPTH,
    ];

    for code in &syntax_codes {
        if codes::get_description(code.as_str()) == "Unknown error" {
            return Err(format!(
                "Syntax error code {} has no description",
                code.as_str()
            ));
        }
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Syntax error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    log_debug!("Syntax analysis initialized", "codes" => syntax_codes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runtime::SyntaxConfig;
    use crate::grammar::ast::nodes::{Stmt, StmtKind};
    use crate::lexical::tokenize;
    use crate::tokens::{TokenKind, TokenStreamBuilder};
    use assert_matches::assert_matches;

    #[test]
    fn test_module_initialization() {
        assert!(init_syntax_logging().is_ok());
    }

    #[test]
    fn test_parse_template_success() {
        let config = SyntaxConfig::default();
        let template = parse_template(tokenize("Hi {{ name }}!", &config)).unwrap();
        assert_eq!(template.body.len(), 3);
        assert_matches!(template.body[1], Stmt { kind: StmtKind::VariableOutput { .. }, .. });
    }

    #[test]
    fn test_parse_template_reports_first_error() {
        let config = SyntaxConfig::default();
        let err = parse_template(tokenize("{% bogus %}{{ }}", &config)).unwrap_err();
        assert_matches!(err, SyntaxError::UnknownTag { ref tag, .. } if tag == "bogus");
    }

    #[test]
    fn test_parse_with_extensions_keeps_partial_tree() {
        let config = SyntaxConfig::default();
        let registry = ExtensionRegistry::new();
        let (template, errors) =
            parse_template_with_extensions(tokenize("a{% bogus %}{# next #}b", &config), &registry)
                .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(template.body.len(), 2);
    }

    #[test]
    fn test_hand_built_stream() {
        let tokens = TokenStreamBuilder::new()
            .push_token(TokenKind::Data, "plain")
            .build();
        let template = parse_template(tokens).unwrap();
        assert_eq!(template.body.len(), 1);
    }
}
