//! Syntax tree produced by the template parser
//!
//! Every statement and expression is a tagged variant carrying its own
//! payload, plus the source line and optional template name it came from.
//! Children are owned `Box`/`Vec` values: a node is only built once all of
//! its children parsed, so a failed parse drops partial subtrees on its own.
//!
//! All nodes are serde-serializable so a cache or renderer can persist them.

use crate::grammar::keywords::Keyword;
use crate::tokens::TokenKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiers follow `[A-Za-z_][A-Za-z0-9_]*`
pub type Identifier = String;

// === OPERATORS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    /// `~` string concatenation
    Concat,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    // Logical
    And,
    Or,
}

impl BinaryOperator {
    /// Operator for a symbolic token. Word operators (`and`, `in`, ...) are
    /// handled by the parser's precedence levels directly.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Add => Self::Add,
            TokenKind::Sub => Self::Sub,
            TokenKind::Mul => Self::Mul,
            TokenKind::Div => Self::Div,
            TokenKind::FloorDiv => Self::FloorDiv,
            TokenKind::Mod => Self::Mod,
            TokenKind::Pow => Self::Pow,
            TokenKind::Tilde => Self::Concat,
            TokenKind::Eq => Self::Eq,
            TokenKind::Ne => Self::Ne,
            TokenKind::Lt => Self::Lt,
            TokenKind::Le => Self::Le,
            TokenKind::Gt => Self::Gt,
            TokenKind::Ge => Self::Ge,
            TokenKind::Keyword(Keyword::In) => Self::In,
            TokenKind::Keyword(Keyword::And) => Self::And,
            TokenKind::Keyword(Keyword::Or) => Self::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Concat => "~",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::In | Self::NotIn
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// `+x`
    Pos,
    /// `-x`
    Neg,
    /// `~x`
    Invert,
    /// `not x`
    Not,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pos => "+",
            Self::Neg => "-",
            Self::Invert => "~",
            Self::Not => "not",
        }
    }
}

// === EXPRESSIONS ===

/// `name=value` argument in a call, filter or test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordArg {
    pub name: Identifier,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Name(Identifier),
    StringLiteral(String),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BooleanLiteral(bool),
    NullLiteral,
    ListLiteral(Vec<Expr>),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// `then_expr if condition else else_expr`
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Option<Box<Expr>>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<KeywordArg>,
    },
    /// `value | name(args)`
    Filter {
        value: Box<Expr>,
        name: Identifier,
        args: Vec<Expr>,
        kwargs: Vec<KeywordArg>,
    },
    /// `value is [not] name(args)`
    Test {
        value: Box<Expr>,
        name: Identifier,
        args: Vec<Expr>,
        kwargs: Vec<KeywordArg>,
        negated: bool,
    },
    GetAttr {
        value: Box<Expr>,
        attr: Identifier,
    },
    /// `value[index]`; `index` is a `Slice` for `value[a:b:c]`
    GetItem {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize, source_name: Option<String>) -> Self {
        Self {
            kind,
            line,
            source_name,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::StringLiteral(_)
                | ExprKind::IntegerLiteral(_)
                | ExprKind::FloatLiteral(_)
                | ExprKind::BooleanLiteral(_)
                | ExprKind::NullLiteral
        )
    }

    /// Short variant name used in summaries
    pub fn variant_name(&self) -> &'static str {
        match self.kind {
            ExprKind::Name(_) => "Name",
            ExprKind::StringLiteral(_) => "StringLiteral",
            ExprKind::IntegerLiteral(_) => "IntegerLiteral",
            ExprKind::FloatLiteral(_) => "FloatLiteral",
            ExprKind::BooleanLiteral(_) => "BooleanLiteral",
            ExprKind::NullLiteral => "NullLiteral",
            ExprKind::ListLiteral(_) => "ListLiteral",
            ExprKind::BinaryOp { .. } => "BinaryOp",
            ExprKind::UnaryOp { .. } => "UnaryOp",
            ExprKind::Conditional { .. } => "Conditional",
            ExprKind::Call { .. } => "Call",
            ExprKind::Filter { .. } => "Filter",
            ExprKind::Test { .. } => "Test",
            ExprKind::GetAttr { .. } => "GetAttr",
            ExprKind::GetItem { .. } => "GetItem",
            ExprKind::Slice { .. } => "Slice",
        }
    }
}

// === STATEMENTS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElifBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

/// One name in `from x import a as b, c`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportName {
    pub name: Identifier,
    pub alias: Option<Identifier>,
}

/// Macro or call-block parameter with an optional default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroParam {
    pub name: Identifier,
    pub default: Option<Expr>,
}

/// One filter application in `{% filter a | b(1) %}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCall {
    pub name: Identifier,
    pub args: Vec<Expr>,
    pub kwargs: Vec<KeywordArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    PlainOutput {
        content: String,
    },
    VariableOutput {
        expr: Expr,
    },
    For {
        targets: Vec<Identifier>,
        iter: Expr,
        filter: Option<Expr>,
        recursive: bool,
        body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    If {
        condition: Expr,
        body: Vec<Stmt>,
        elif_branches: Vec<ElifBranch>,
        else_body: Vec<Stmt>,
    },
    /// `value` is `None` for the block form `{% set x %}...{% endset %}`
    Set {
        targets: Vec<Identifier>,
        value: Option<Expr>,
        body: Vec<Stmt>,
    },
    Block {
        name: Identifier,
        scoped: bool,
        required: bool,
        body: Vec<Stmt>,
    },
    Extends {
        template: Expr,
    },
    Include {
        template: Expr,
        with_context: bool,
        ignore_missing: bool,
    },
    Import {
        template: Expr,
        alias: Identifier,
        with_context: bool,
    },
    FromImport {
        template: Expr,
        names: Vec<ImportName>,
        with_context: bool,
    },
    Macro {
        name: Identifier,
        params: Vec<MacroParam>,
        body: Vec<Stmt>,
        catch_varargs: bool,
        catch_kwargs: bool,
    },
    /// `{% call f() %}` without a matching `endcall`
    Call {
        call: Expr,
    },
    CallBlock {
        call: Expr,
        params: Vec<MacroParam>,
        body: Vec<Stmt>,
    },
    With {
        assignments: Vec<(Identifier, Expr)>,
        body: Vec<Stmt>,
    },
    FilterBlock {
        filters: Vec<FilterCall>,
        body: Vec<Stmt>,
    },
    Autoescape {
        enabled: Expr,
        body: Vec<Stmt>,
    },
    /// `{% do expr %}`
    ExprStmt {
        expr: Expr,
    },
    DebugStmt,
    Continue,
    Break,
    /// Tag parsed by a registered extension
    Extension {
        tag: Identifier,
        args: Vec<Expr>,
        body: Vec<Stmt>,
    },
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize, source_name: Option<String>) -> Self {
        Self {
            kind,
            line,
            source_name,
        }
    }

    /// Tag name as written in templates, or the node name for output nodes
    pub fn tag_name(&self) -> &str {
        match &self.kind {
            StmtKind::PlainOutput { .. } => "data",
            StmtKind::VariableOutput { .. } => "output",
            StmtKind::For { .. } => "for",
            StmtKind::If { .. } => "if",
            StmtKind::Set { .. } => "set",
            StmtKind::Block { .. } => "block",
            StmtKind::Extends { .. } => "extends",
            StmtKind::Include { .. } => "include",
            StmtKind::Import { .. } => "import",
            StmtKind::FromImport { .. } => "from",
            StmtKind::Macro { .. } => "macro",
            StmtKind::Call { .. } => "call",
            StmtKind::CallBlock { .. } => "call",
            StmtKind::With { .. } => "with",
            StmtKind::FilterBlock { .. } => "filter",
            StmtKind::Autoescape { .. } => "autoescape",
            StmtKind::ExprStmt { .. } => "do",
            StmtKind::DebugStmt => "debug",
            StmtKind::Continue => "continue",
            StmtKind::Break => "break",
            StmtKind::Extension { tag, .. } => tag,
        }
    }

    /// Direct child statement lists, in source order
    pub fn bodies(&self) -> Vec<&[Stmt]> {
        match &self.kind {
            StmtKind::For {
                body, else_body, ..
            } => vec![body.as_slice(), else_body.as_slice()],
            StmtKind::If {
                body,
                elif_branches,
                else_body,
                ..
            } => {
                let mut bodies: Vec<&[Stmt]> = vec![body.as_slice()];
                bodies.extend(elif_branches.iter().map(|b| b.body.as_slice()));
                bodies.push(else_body.as_slice());
                bodies
            }
            StmtKind::Set { body, .. }
            | StmtKind::Block { body, .. }
            | StmtKind::Macro { body, .. }
            | StmtKind::CallBlock { body, .. }
            | StmtKind::With { body, .. }
            | StmtKind::FilterBlock { body, .. }
            | StmtKind::Autoescape { body, .. }
            | StmtKind::Extension { body, .. } => vec![body.as_slice()],
            _ => Vec::new(),
        }
    }
}

/// Root node for one template source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Template {
    pub body: Vec<Stmt>,
    pub source_name: Option<String>,
}

impl Template {
    pub fn new(body: Vec<Stmt>, source_name: Option<String>) -> Self {
        Self { body, source_name }
    }

    /// Number of statements at every nesting level
    pub fn statement_count(&self) -> usize {
        fn count(stmts: &[Stmt]) -> usize {
            stmts
                .iter()
                .map(|s| 1 + s.bodies().into_iter().map(count).sum::<usize>())
                .sum()
        }
        count(&self.body)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// The `extends` target when the template starts from a parent
    pub fn parent_template(&self) -> Option<&Expr> {
        self.body.iter().find_map(|stmt| match &stmt.kind {
            StmtKind::Extends { template } => Some(template),
            _ => None,
        })
    }
}

// === DISPLAY IMPLEMENTATIONS ===

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, 1, None)
    }

    fn stmt(kind: StmtKind) -> Stmt {
        Stmt::new(kind, 1, None)
    }

    fn text(content: &str) -> Stmt {
        stmt(StmtKind::PlainOutput {
            content: content.to_string(),
        })
    }

    #[test]
    fn test_operator_from_token() {
        assert_eq!(
            BinaryOperator::from_token(TokenKind::Tilde),
            Some(BinaryOperator::Concat)
        );
        assert_eq!(
            BinaryOperator::from_token(TokenKind::Keyword(Keyword::In)),
            Some(BinaryOperator::In)
        );
        assert_eq!(BinaryOperator::from_token(TokenKind::Pipe), None);
        assert!(BinaryOperator::NotIn.is_comparison());
        assert!(!BinaryOperator::Pow.is_comparison());
    }

    #[test]
    fn test_statement_count_walks_every_body() {
        let template = Template::new(
            vec![
                text("a"),
                stmt(StmtKind::If {
                    condition: expr(ExprKind::BooleanLiteral(true)),
                    body: vec![text("b")],
                    elif_branches: vec![ElifBranch {
                        condition: expr(ExprKind::Name("x".into())),
                        body: vec![text("c"), text("d")],
                    }],
                    else_body: vec![stmt(StmtKind::Break)],
                }),
            ],
            None,
        );
        assert_eq!(template.statement_count(), 6);
        assert_eq!(template.body[1].tag_name(), "if");
    }

    #[test]
    fn test_parent_template() {
        let template = Template::new(
            vec![stmt(StmtKind::Extends {
                template: expr(ExprKind::StringLiteral("base.html".into())),
            })],
            Some("child.html".into()),
        );
        assert!(matches!(
            template.parent_template().map(|e| &e.kind),
            Some(ExprKind::StringLiteral(name)) if name == "base.html"
        ));
    }

    #[test]
    fn test_nodes_serialize_to_json() {
        let node = stmt(StmtKind::VariableOutput {
            expr: expr(ExprKind::Slice {
                start: Some(Box::new(expr(ExprKind::IntegerLiteral(1)))),
                stop: None,
                step: None,
            }),
        });
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"VariableOutput\""));
        assert!(json.contains("\"IntegerLiteral\":1"));
        let back: Stmt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
