// Internal modules
pub mod config;
pub mod grammar;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use grammar::ast::nodes::Template;
pub use pipeline::{compile_file, compile_source, CompiledTemplate, PipelineError};
pub use syntax::{Extension, ExtensionRegistry, SyntaxError, TemplateParser};
