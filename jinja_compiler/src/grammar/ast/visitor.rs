//! Read-only traversal over the syntax tree

use super::nodes::{Expr, ExprKind, StmtKind, Stmt, Template};
use std::collections::BTreeSet;

/// Override `visit_*` to hook a node kind; call the matching `walk_*` to
/// keep descending.
pub trait AstVisitor {
    fn visit_template(&mut self, template: &Template) {
        walk_body(self, &template.body);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_body<V: AstVisitor + ?Sized>(visitor: &mut V, body: &[Stmt]) {
    for stmt in body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: AstVisitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::PlainOutput { .. }
        | StmtKind::DebugStmt
        | StmtKind::Continue
        | StmtKind::Break => {}
        StmtKind::VariableOutput { expr } | StmtKind::ExprStmt { expr } => visitor.visit_expr(expr),
        StmtKind::For {
            iter,
            filter,
            body,
            else_body,
            ..
        } => {
            visitor.visit_expr(iter);
            if let Some(filter) = filter {
                visitor.visit_expr(filter);
            }
            walk_body(visitor, body);
            walk_body(visitor, else_body);
        }
        StmtKind::If {
            condition,
            body,
            elif_branches,
            else_body,
        } => {
            visitor.visit_expr(condition);
            walk_body(visitor, body);
            for branch in elif_branches {
                visitor.visit_expr(&branch.condition);
                walk_body(visitor, &branch.body);
            }
            walk_body(visitor, else_body);
        }
        StmtKind::Set { value, body, .. } => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
            walk_body(visitor, body);
        }
        StmtKind::Block { body, .. } => walk_body(visitor, body),
        StmtKind::Extends { template }
        | StmtKind::Include { template, .. }
        | StmtKind::Import { template, .. }
        | StmtKind::FromImport { template, .. } => visitor.visit_expr(template),
        StmtKind::Macro { params, body, .. } => {
            for default in params.iter().filter_map(|p| p.default.as_ref()) {
                visitor.visit_expr(default);
            }
            walk_body(visitor, body);
        }
        StmtKind::Call { call } => visitor.visit_expr(call),
        StmtKind::CallBlock { call, params, body } => {
            visitor.visit_expr(call);
            for default in params.iter().filter_map(|p| p.default.as_ref()) {
                visitor.visit_expr(default);
            }
            walk_body(visitor, body);
        }
        StmtKind::With { assignments, body } => {
            for (_, value) in assignments {
                visitor.visit_expr(value);
            }
            walk_body(visitor, body);
        }
        StmtKind::FilterBlock { filters, body } => {
            for filter in filters {
                for arg in &filter.args {
                    visitor.visit_expr(arg);
                }
                for kwarg in &filter.kwargs {
                    visitor.visit_expr(&kwarg.value);
                }
            }
            walk_body(visitor, body);
        }
        StmtKind::Autoescape { enabled, body } => {
            visitor.visit_expr(enabled);
            walk_body(visitor, body);
        }
        StmtKind::Extension { args, body, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
            walk_body(visitor, body);
        }
    }
}

pub fn walk_expr<V: AstVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Name(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::IntegerLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::BooleanLiteral(_)
        | ExprKind::NullLiteral => {}
        ExprKind::ListLiteral(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        ExprKind::BinaryOp { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::UnaryOp { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            visitor.visit_expr(then_expr);
            visitor.visit_expr(condition);
            if let Some(else_expr) = else_expr {
                visitor.visit_expr(else_expr);
            }
        }
        ExprKind::Call {
            callee,
            args,
            kwargs,
        } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
            for kwarg in kwargs {
                visitor.visit_expr(&kwarg.value);
            }
        }
        ExprKind::Filter {
            value,
            args,
            kwargs,
            ..
        }
        | ExprKind::Test {
            value,
            args,
            kwargs,
            ..
        } => {
            visitor.visit_expr(value);
            for arg in args {
                visitor.visit_expr(arg);
            }
            for kwarg in kwargs {
                visitor.visit_expr(&kwarg.value);
            }
        }
        ExprKind::GetAttr { value, .. } => visitor.visit_expr(value),
        ExprKind::GetItem { value, index } => {
            visitor.visit_expr(value);
            visitor.visit_expr(index);
        }
        ExprKind::Slice { start, stop, step } => {
            for part in [start, stop, step].into_iter().flatten() {
                visitor.visit_expr(part);
            }
        }
    }
}

/// Collects the `Name` expressions a macro body reads.
///
/// Purely syntactic. Assignment targets are not reads, so a local
/// `{% set varargs = 1 %}` alone records nothing, but any later
/// `{{ varargs }}` is recorded even though it reads the local. Bodies of
/// nested macros and call blocks are skipped since they have their own
/// `varargs` / `kwargs`; their call expressions and parameter defaults are
/// still scanned.
#[derive(Debug, Default)]
pub struct NameUsage {
    referenced: BTreeSet<String>,
}

impl NameUsage {
    pub fn scan(body: &[Stmt]) -> Self {
        let mut usage = Self::default();
        walk_body(&mut usage, body);
        usage
    }

    pub fn references(&self, name: &str) -> bool {
        self.referenced.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.referenced.iter().map(String::as_str)
    }
}

impl AstVisitor for NameUsage {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Macro { params, .. } => {
                for default in params.iter().filter_map(|p| p.default.as_ref()) {
                    self.visit_expr(default);
                }
            }
            StmtKind::CallBlock { call, params, .. } => {
                self.visit_expr(call);
                for default in params.iter().filter_map(|p| p.default.as_ref()) {
                    self.visit_expr(default);
                }
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::Name(name) = &expr.kind {
            self.referenced.insert(name.clone());
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::nodes::{BinaryOperator, KeywordArg};

    fn name(n: &str) -> Expr {
        Expr::new(ExprKind::Name(n.to_string()), 1, None)
    }

    fn output(expr: Expr) -> Stmt {
        Stmt::new(StmtKind::VariableOutput { expr }, 1, None)
    }

    #[test]
    fn test_name_usage_finds_nested_names() {
        let call = Expr::new(
            ExprKind::Call {
                callee: Box::new(name("f")),
                args: vec![name("a")],
                kwargs: vec![KeywordArg {
                    name: "k".into(),
                    value: name("kwargs"),
                }],
            },
            1,
            None,
        );
        let body = vec![Stmt::new(
            StmtKind::For {
                targets: vec!["x".into()],
                iter: name("items"),
                filter: None,
                recursive: false,
                body: vec![output(call)],
                else_body: vec![],
            },
            1,
            None,
        )];

        let usage = NameUsage::scan(&body);
        assert!(usage.references("kwargs"));
        assert!(usage.references("items"));
        assert!(!usage.references("varargs"));
        assert!(!usage.references("k"));
        assert_eq!(usage.names().count(), 4);
    }

    #[test]
    fn test_custom_visitor_counts_binary_ops() {
        struct BinaryCounter(usize);
        impl AstVisitor for BinaryCounter {
            fn visit_expr(&mut self, expr: &Expr) {
                if matches!(expr.kind, ExprKind::BinaryOp { .. }) {
                    self.0 += 1;
                }
                walk_expr(self, expr);
            }
        }

        let sum = Expr::new(
            ExprKind::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(name("a")),
                right: Box::new(Expr::new(
                    ExprKind::BinaryOp {
                        op: BinaryOperator::Mul,
                        left: Box::new(name("b")),
                        right: Box::new(name("c")),
                    },
                    1,
                    None,
                )),
            },
            1,
            None,
        );
        let template = Template::new(vec![output(sum)], None);

        let mut counter = BinaryCounter(0);
        counter.visit_template(&template);
        assert_eq!(counter.0, 2);
    }
}
