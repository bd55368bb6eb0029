use crate::config::ConfigError;
use crate::logging::{codes, Code};
use crate::syntax::SyntaxError;
use std::path::PathBuf;

/// Pipeline processing errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration failed: {0}")]
    Config(#[from] ConfigError),

    #[error("Syntax analysis failed: {0}")]
    SyntaxAnalysis(#[from] SyntaxError),

    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Config(error) => error.error_code(),
            Self::SyntaxAnalysis(error) => error.error_code(),
            Self::Io { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    /// The parser error behind this failure, if any
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            Self::SyntaxAnalysis(error) => Some(error),
            _ => None,
        }
    }
}
