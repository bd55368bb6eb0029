//! Source text to template tree in one call (config -> lexical -> syntax)

mod error;
mod result;

pub use error::PipelineError;
pub use result::CompiledTemplate;

use crate::config::RuntimeConfig;
use crate::logging;
use crate::syntax::{ExtensionRegistry, TemplateParser};
use std::path::Path;
use std::time::Instant;

/// Compile a template held in memory.
///
/// Lexical diagnostics and recoverable syntax errors are collected on the
/// result; only invalid configuration and a nesting-depth overflow fail the
/// call.
pub fn compile_source<'src>(
    source: &'src str,
    name: Option<&'src str>,
    config: &RuntimeConfig,
    extensions: Option<&ExtensionRegistry>,
) -> Result<CompiledTemplate, PipelineError> {
    let start_time = Instant::now();
    let display_name = name.unwrap_or("<template>");

    logging::with_template_context(display_name, || -> Result<CompiledTemplate, PipelineError> {
        config.syntax.validate()?;

        crate::log_info!("Compiling template",
            "template" => display_name,
            "bytes" => source.len()
        );

        let (tokens, lexical_diagnostics, lexical_metrics) =
            crate::lexical::tokenize_with_preferences(
                source,
                name,
                &config.syntax,
                config.lexical.clone(),
            );
        let token_count = tokens.len();

        let mut parser = TemplateParser::new(tokens);
        if let Some(registry) = extensions {
            parser = parser.with_extensions(registry);
        }
        let template = parser.parse()?;

        let result = CompiledTemplate {
            template,
            lexical_diagnostics,
            lexical_metrics,
            syntax_errors: parser.recovered_errors(),
            token_count,
            processing_duration: start_time.elapsed(),
        };

        result.log_success(display_name);
        Ok(result)
    })
}

/// Read and compile a template file. The path becomes the source name.
pub fn compile_file(
    path: &Path,
    config: &RuntimeConfig,
    extensions: Option<&ExtensionRegistry>,
) -> Result<CompiledTemplate, PipelineError> {
    let source = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path.display().to_string();
    compile_source(&source, Some(&name), config, extensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyntaxConfig;
    use crate::grammar::ast::nodes::StmtKind;
    use crate::syntax::SyntaxError;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_compile_clean_template() {
        let config = RuntimeConfig::default();
        let result = compile_source(
            "{% for x in items %}{{ x|upper }}{% endfor %}",
            Some("list.html"),
            &config,
            None,
        )
        .unwrap();

        assert!(result.is_clean());
        assert_eq!(result.template.source_name.as_deref(), Some("list.html"));
        assert_matches!(result.template.body[0].kind, StmtKind::For { .. });
        assert!(result.token_count > 0);
    }

    #[test]
    fn test_compile_collects_recovered_errors() {
        let config = RuntimeConfig::default();
        let result = compile_source("{% if %}x{% endif %}tail", None, &config, None).unwrap();

        assert!(!result.is_clean());
        assert_eq!(result.syntax_errors.len(), 2);
        assert_eq!(result.diagnostic_count(), 2);
    }

    #[test]
    fn test_compile_collects_lexical_diagnostics() {
        let config = RuntimeConfig::default();
        let result = compile_source("{{ 'open }}", None, &config, None).unwrap();
        assert!(!result.lexical_diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RuntimeConfig {
            syntax: SyntaxConfig {
                variable_start: "{%".to_string(),
                ..SyntaxConfig::default()
            },
            ..RuntimeConfig::default()
        };

        let err = compile_source("x", None, &config, None).unwrap_err();
        assert_matches!(err, PipelineError::Config(_));
    }

    #[test]
    fn test_compile_file_uses_path_as_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Hello {{{{ name }}}}").unwrap();

        let config = RuntimeConfig::default();
        let result = compile_file(file.path(), &config, None).unwrap();

        let expected = file.path().display().to_string();
        assert_eq!(result.template.source_name.as_deref(), Some(expected.as_str()));
        assert_eq!(result.template.body.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let config = RuntimeConfig::default();
        let err = compile_file(Path::new("/no/such/template.html"), &config, None).unwrap_err();
        assert_matches!(err, PipelineError::Io { .. });
    }

    #[test]
    fn test_depth_overflow_fails_compile() {
        let config = RuntimeConfig::default();
        let source = format!(
            "{{{{ {} }}}}",
            "- ".repeat(crate::config::compile_time::syntax::MAX_PARSE_DEPTH + 5) + "1"
        );
        let err = compile_source(&source, None, &config, None).unwrap_err();
        assert_matches!(err.syntax_error(), Some(SyntaxError::MaxRecursionDepth { .. }));
    }

    #[test]
    fn test_json_summary() {
        let config = RuntimeConfig::default();
        let result = compile_source("{{ a }}{% bad %}", Some("t"), &config, None).unwrap();
        let json = result.to_json();

        assert_eq!(json["source_name"], "t");
        assert_eq!(json["syntax_errors"][0]["code"], "E042");
        assert!(json["body"].is_array());
    }
}
