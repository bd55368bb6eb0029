use crate::grammar::ast::nodes::Template;
use crate::lexical::{LexicalError, LexicalMetrics};
use crate::syntax::SyntaxError;
use std::time::Duration;

/// Everything one compilation produced
#[derive(Debug)]
pub struct CompiledTemplate {
    pub template: Template,
    pub lexical_diagnostics: Vec<LexicalError>,
    pub lexical_metrics: LexicalMetrics,
    /// Errors the parser recovered from, oldest first
    pub syntax_errors: Vec<SyntaxError>,
    pub token_count: usize,
    pub processing_duration: Duration,
}

impl CompiledTemplate {
    pub fn is_clean(&self) -> bool {
        self.lexical_diagnostics.is_empty() && self.syntax_errors.is_empty()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.lexical_diagnostics.len() + self.syntax_errors.len()
    }

    pub fn log_success(&self, name: &str) {
        crate::log_success!(
            crate::logging::codes::success::TEMPLATE_COMPILED,
            "Template compilation finished",
            "template" => name,
            "statements" => self.template.statement_count(),
            "tokens" => self.token_count,
            "diagnostics" => self.diagnostic_count(),
            "duration_ms" => format!("{:.2}", self.processing_duration.as_secs_f64() * 1000.0)
        );
    }

    /// Summary suitable for machine consumption
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "source_name": self.template.source_name,
            "statements": self.template.statement_count(),
            "tokens": self.token_count,
            "lines": self.lexical_metrics.line_count,
            "lexical_diagnostics": self
                .lexical_diagnostics
                .iter()
                .map(|d| serde_json::json!({
                    "code": d.error_code().as_str(),
                    "message": d.to_string(),
                }))
                .collect::<Vec<_>>(),
            "syntax_errors": self
                .syntax_errors
                .iter()
                .map(|e| serde_json::json!({
                    "code": e.error_code().as_str(),
                    "line": e.line(),
                    "message": e.to_string(),
                }))
                .collect::<Vec<_>>(),
            "body": self.template.body,
        })
    }
}
