//! Error and success codes with classification metadata
//!
//! Single source of truth for every code the compiler logs, plus the lookup
//! functions used by events and errors to classify them.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Configuration loading error codes
pub mod config {
    use super::Code;

    pub const CONFIG_FILE_UNREADABLE: Code = Code::new("E005");
    pub const INVALID_CONFIG_FORMAT: Code = Code::new("E006");
    pub const INVALID_DELIMITERS: Code = Code::new("E007");
}

/// Lexical diagnostics. The lexer never fails, so these are logged as
/// warnings and attached to the lexer's diagnostic list.
pub mod lexical {
    use super::Code;

    pub const UNEXPECTED_CHARACTER: Code = Code::new("E020");
    pub const UNTERMINATED_STRING: Code = Code::new("E021");
    pub const UNTERMINATED_COMMENT: Code = Code::new("E022");
    pub const UNTERMINATED_RAW_BLOCK: Code = Code::new("E023");
}

pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const UNEXPECTED_END_OF_TEMPLATE: Code = Code::new("E041");
    pub const UNKNOWN_TAG: Code = Code::new("E042");
    pub const UNCLOSED_BLOCK: Code = Code::new("E043");
    pub const INVALID_LITERAL: Code = Code::new("E044");
    pub const GRAMMAR_VIOLATION: Code = Code::new("E045");
    pub const EXTENSION_FAILURE: Code = Code::new("E046");
    pub const MAX_RECURSION_DEPTH: Code = Code::new("E087");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const CONFIG_LOADED: Code = Code::new("I006");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const AST_CONSTRUCTION_COMPLETE: Code = Code::new("I040");
    pub const TEMPLATE_COMPILED: Code = Code::new("I041");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal compiler error",
                "File a bug report with the template that triggered it",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or compiler initialization failure",
                "Check configuration and environment variables",
            ),
            // Configuration
            ErrorMetadata::new(
                "E005",
                "Configuration",
                Severity::High,
                false,
                true,
                "Configuration file could not be read",
                "Check the configuration path and its permissions",
            ),
            ErrorMetadata::new(
                "E006",
                "Configuration",
                Severity::High,
                false,
                true,
                "Configuration file is not valid TOML",
                "Fix the TOML syntax reported in the message",
            ),
            ErrorMetadata::new(
                "E007",
                "Configuration",
                Severity::High,
                false,
                true,
                "Delimiter configuration is ambiguous or empty",
                "Use distinct, non-empty start delimiters",
            ),
            // Lexical
            ErrorMetadata::new(
                "E020",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Unexpected character inside a tag",
                "Remove the character or quote it inside a string literal",
            ),
            ErrorMetadata::new(
                "E021",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "String literal is not terminated",
                "Add the matching closing quote",
            ),
            ErrorMetadata::new(
                "E022",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Comment is not terminated",
                "Close the comment with the comment end delimiter",
            ),
            ErrorMetadata::new(
                "E023",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Raw block has no matching endraw",
                "Add an endraw tag after the raw content",
            ),
            // Syntax
            ErrorMetadata::new(
                "E040",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Unexpected token",
                "Check the tag or expression near the reported position",
            ),
            ErrorMetadata::new(
                "E041",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Template ended in the middle of a construct",
                "Close every open tag and block",
            ),
            ErrorMetadata::new(
                "E042",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Unknown block tag",
                "Check the tag name or register an extension that handles it",
            ),
            ErrorMetadata::new(
                "E043",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Block tag is never closed",
                "Add the matching end tag",
            ),
            ErrorMetadata::new(
                "E044",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Literal cannot be represented",
                "Use a smaller number or a string",
            ),
            ErrorMetadata::new(
                "E045",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Construct violates the template grammar",
                "Review the tag arguments",
            ),
            ErrorMetadata::new(
                "E046",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Extension failed to parse its tag",
                "Check the extension's tag syntax",
            ),
            ErrorMetadata::new(
                "E087",
                "Syntax",
                Severity::High,
                false,
                true,
                "Template nesting exceeds the maximum parse depth",
                "Reduce nesting or raise max_parse_depth in the build profile",
            ),
        ];

        entries.into_iter().map(|meta| (meta.code, meta)).collect()
    })
}

// ============================================================================
// LOOKUP FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|m| m.description)
        .unwrap_or("Unknown error")
}

pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|m| m.severity)
        .unwrap_or(Severity::Low)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|m| m.recoverable)
        .unwrap_or(true)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_metadata(code)
        .map(|m| m.requires_halt)
        .unwrap_or(false)
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|m| m.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    match get_error_metadata(code) {
        Some(m) => m.category,
        None if code.starts_with('I') => "Success",
        None => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_code_has_metadata() {
        let codes = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            config::CONFIG_FILE_UNREADABLE,
            config::INVALID_CONFIG_FORMAT,
            config::INVALID_DELIMITERS,
            lexical::UNEXPECTED_CHARACTER,
            lexical::UNTERMINATED_STRING,
            lexical::UNTERMINATED_COMMENT,
            lexical::UNTERMINATED_RAW_BLOCK,
            syntax::UNEXPECTED_TOKEN,
            syntax::UNEXPECTED_END_OF_TEMPLATE,
            syntax::UNKNOWN_TAG,
            syntax::UNCLOSED_BLOCK,
            syntax::INVALID_LITERAL,
            syntax::GRAMMAR_VIOLATION,
            syntax::EXTENSION_FAILURE,
            syntax::MAX_RECURSION_DEPTH,
        ];

        for code in codes {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_classification() {
        assert!(is_recoverable(syntax::UNEXPECTED_TOKEN.as_str()));
        assert!(!is_recoverable(syntax::MAX_RECURSION_DEPTH.as_str()));
        assert!(requires_halt(system::INTERNAL_ERROR.as_str()));
        assert_eq!(get_category(lexical::UNTERMINATED_STRING.as_str()), "Lexical");
        assert_eq!(get_category(success::TOKENIZATION_COMPLETE.as_str()), "Success");
        assert_eq!(get_severity("E999"), Severity::Low);
        assert_eq!(get_description("E999"), "Unknown error");
    }
}
