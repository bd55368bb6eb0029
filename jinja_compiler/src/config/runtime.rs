// RUNTIME PREFERENCES AND TEMPLATE SYNTAX

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::logging::{codes, Code};

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid delimiter configuration: {message}")]
    InvalidDelimiters { message: String },
}

impl ConfigError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Io { .. } => codes::config::CONFIG_FILE_UNREADABLE,
            Self::Parse(_) => codes::config::INVALID_CONFIG_FORMAT,
            Self::InvalidDelimiters { .. } => codes::config::INVALID_DELIMITERS,
        }
    }
}

/// Delimiter strings and line prefixes that drive the lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    pub block_start: String,
    pub block_end: String,
    pub variable_start: String,
    pub variable_end: String,
    pub comment_start: String,
    pub comment_end: String,

    /// Prefix that turns the rest of a line into a block tag
    pub line_statement_prefix: Option<String>,

    /// Prefix that turns the rest of a line into a comment
    pub line_comment_prefix: Option<String>,

    /// Drop the first newline after a block tag
    pub trim_blocks: bool,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            block_start: "{%".to_string(),
            block_end: "%}".to_string(),
            variable_start: "{{".to_string(),
            variable_end: "}}".to_string(),
            comment_start: "{#".to_string(),
            comment_end: "#}".to_string(),
            line_statement_prefix: None,
            line_comment_prefix: None,
            trim_blocks: false,
        }
    }
}

impl SyntaxConfig {
    pub fn with_line_statement_prefix(mut self, prefix: &str) -> Self {
        self.line_statement_prefix = Some(prefix.to_string());
        self
    }

    pub fn with_line_comment_prefix(mut self, prefix: &str) -> Self {
        self.line_comment_prefix = Some(prefix.to_string());
        self
    }

    pub fn with_trim_blocks(mut self, trim_blocks: bool) -> Self {
        self.trim_blocks = trim_blocks;
        self
    }

    /// Reject delimiter sets the lexer cannot tell apart
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delimiters = [
            ("block_start", &self.block_start),
            ("block_end", &self.block_end),
            ("variable_start", &self.variable_start),
            ("variable_end", &self.variable_end),
            ("comment_start", &self.comment_start),
            ("comment_end", &self.comment_end),
        ];

        for (name, value) in delimiters {
            if value.is_empty() {
                return Err(ConfigError::InvalidDelimiters {
                    message: format!("{} must not be empty", name),
                });
            }
            if value.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidDelimiters {
                    message: format!("{} must not contain whitespace", name),
                });
            }
        }

        let starts = [&self.block_start, &self.variable_start, &self.comment_start];
        for (i, a) in starts.iter().enumerate() {
            for b in starts.iter().skip(i + 1) {
                if a == b {
                    return Err(ConfigError::InvalidDelimiters {
                        message: format!("start delimiter '{}' is used twice", a),
                    });
                }
            }
        }

        for (name, prefix) in [
            ("line_statement_prefix", &self.line_statement_prefix),
            ("line_comment_prefix", &self.line_comment_prefix),
        ] {
            if matches!(prefix, Some(p) if p.trim().is_empty()) {
                return Err(ConfigError::InvalidDelimiters {
                    message: format!("{} must not be blank", name),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Whether to count tokens per kind
    pub collect_detailed_metrics: bool,

    /// Whether to log a warning for unterminated strings, comments and raw blocks
    pub warn_on_unterminated: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            collect_detailed_metrics: env::var(env_vars::LEXICAL_DETAILED_METRICS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            warn_on_unterminated: env::var(env_vars::LEXICAL_WARN_UNTERMINATED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Emit JSON lines instead of plain text
    pub use_structured_logging: bool,

    pub enable_console_logging: bool,

    pub min_log_level: LogLevel,

    /// Attach the template name to every event
    pub include_template_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Warning),
            include_template_context: env::var(env_vars::LOGGING_INCLUDE_TEMPLATE_CONTEXT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables and CLI flags)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Everything a compilation can be configured with at runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub syntax: SyntaxConfig,
    pub lexical: LexicalPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse and validate a TOML document. Missing tables and keys fall back
    /// to their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(content)?;
        config.syntax.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Lexical
    pub const LEXICAL_DETAILED_METRICS: &str = "JINJA_LEXICAL_DETAILED_METRICS";
    pub const LEXICAL_WARN_UNTERMINATED: &str = "JINJA_LEXICAL_WARN_UNTERMINATED";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "JINJA_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "JINJA_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "JINJA_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_TEMPLATE_CONTEXT: &str = "JINJA_LOGGING_INCLUDE_TEMPLATE_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("WARN"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("2"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_default_syntax_is_valid() {
        let syntax = SyntaxConfig::default();
        assert_eq!(syntax.block_start, "{%");
        assert_eq!(syntax.comment_end, "#}");
        assert!(syntax.validate().is_ok());
    }

    #[test]
    fn test_duplicate_start_delimiters_rejected() {
        let syntax = SyntaxConfig {
            variable_start: "{%".to_string(),
            ..SyntaxConfig::default()
        };
        assert_matches!(syntax.validate(), Err(ConfigError::InvalidDelimiters { .. }));

        let blank_prefix = SyntaxConfig::default().with_line_statement_prefix("  ");
        assert_matches!(blank_prefix.validate(), Err(ConfigError::InvalidDelimiters { .. }));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r##"
            [syntax]
            variable_start = "${"
            variable_end = "}"
            line_statement_prefix = "#"

            [logging]
            min_log_level = "debug"
            "##,
        )
        .unwrap();

        assert_eq!(config.syntax.variable_start, "${");
        assert_eq!(config.syntax.block_start, "{%");
        assert_eq!(config.syntax.line_statement_prefix.as_deref(), Some("#"));
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let err = RuntimeConfig::from_toml_str("[syntax\nblock_start = 1").unwrap_err();
        assert_matches!(err, ConfigError::Parse(_));
        assert_eq!(err.error_code(), codes::config::INVALID_CONFIG_FORMAT);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[syntax]\ntrim_blocks = true").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert!(config.syntax.trim_blocks);

        let missing = RuntimeConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert_matches!(missing, Err(ConfigError::Io { .. }));
    }
}
