//! Shared source-location utilities used by the lexer, parser and CLI.

pub mod span;

pub use span::{Position, SourceMap, Span};
