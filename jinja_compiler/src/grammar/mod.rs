//! Template grammar: keywords, syntax tree and the builders that produce it

pub mod ast;
pub mod builders;
pub mod keywords;

pub use ast::{nodes::*, AstVisitor, NameUsage};
pub use builders::Parser;
pub use keywords::{is_reserved_keyword, Keyword};
