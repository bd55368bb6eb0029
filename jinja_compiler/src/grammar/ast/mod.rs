//! Syntax tree types and traversal

pub mod nodes;
pub mod visitor;

pub use nodes::*;
pub use visitor::{walk_body, walk_expr, walk_stmt, AstVisitor, NameUsage};
