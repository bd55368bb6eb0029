//! Token kinds and borrowed tokens
//!
//! A `Token` never owns text: `text` is a slice of the template source, so the
//! source buffer outlives every token produced from it.
use crate::grammar::keywords::Keyword;
use crate::utils::{Position, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of lexeme categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // === DELIMITERS ===
    BlockBegin,
    BlockEnd,
    VariableBegin,
    VariableEnd,
    CommentBegin,
    CommentEnd,
    RawBegin,
    RawEnd,

    // === OPERATORS ===
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    FloorDiv, // //
    Mod,      // %
    Pow,      // **
    Tilde,    // ~
    Eq,       // ==
    Ne,       // !=
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=
    Assign,   // =

    // === PUNCTUATION ===
    Dot,
    Comma,
    Colon,
    Pipe,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // === LITERALS ===
    String,
    Integer,
    Float,
    Boolean,
    Null,

    // === NAMES ===
    Name,
    Keyword(Keyword),

    // === STRUCTURAL ===
    Data,
    Whitespace,
    Comment,
    LineComment,
    Eof,
}

impl TokenKind {
    /// Whitespace inside tags is kept in the token vector but never reaches
    /// the parser.
    pub fn is_significant(self) -> bool {
        !matches!(self, TokenKind::Whitespace)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::Integer
                | TokenKind::Float
                | TokenKind::Boolean
                | TokenKind::Null
        )
    }

    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Add
                | TokenKind::Sub
                | TokenKind::Mul
                | TokenKind::Div
                | TokenKind::FloorDiv
                | TokenKind::Mod
                | TokenKind::Pow
                | TokenKind::Tilde
                | TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::Assign
        )
    }

    /// Delimiters that open a tag; used as resynchronization points
    pub fn is_statement_boundary(self) -> bool {
        matches!(
            self,
            TokenKind::BlockBegin | TokenKind::VariableBegin | TokenKind::CommentBegin | TokenKind::Eof
        )
    }

    /// Map a fixed operator/punctuation spelling to its kind. Two-character
    /// spellings must be tried before their one-character prefixes.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let kind = match symbol {
            "**" => TokenKind::Pow,
            "//" => TokenKind::FloorDiv,
            "==" => TokenKind::Eq,
            "!=" => TokenKind::Ne,
            "<=" => TokenKind::Le,
            ">=" => TokenKind::Ge,
            "+" => TokenKind::Add,
            "-" => TokenKind::Sub,
            "*" => TokenKind::Mul,
            "/" => TokenKind::Div,
            "%" => TokenKind::Mod,
            "~" => TokenKind::Tilde,
            "<" => TokenKind::Lt,
            ">" => TokenKind::Gt,
            "=" => TokenKind::Assign,
            "." => TokenKind::Dot,
            "," => TokenKind::Comma,
            ":" => TokenKind::Colon,
            "|" => TokenKind::Pipe,
            "(" => TokenKind::LParen,
            ")" => TokenKind::RParen,
            "[" => TokenKind::LBracket,
            "]" => TokenKind::RBracket,
            "{" => TokenKind::LBrace,
            "}" => TokenKind::RBrace,
            _ => return None,
        };
        Some(kind)
    }

    /// Human readable description used in diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::BlockBegin => "beginning of block tag",
            TokenKind::BlockEnd => "end of block tag",
            TokenKind::VariableBegin => "beginning of print tag",
            TokenKind::VariableEnd => "end of print tag",
            TokenKind::CommentBegin => "beginning of comment",
            TokenKind::CommentEnd => "end of comment",
            TokenKind::RawBegin => "raw block",
            TokenKind::RawEnd => "end of raw block",
            TokenKind::Add => "'+'",
            TokenKind::Sub => "'-'",
            TokenKind::Mul => "'*'",
            TokenKind::Div => "'/'",
            TokenKind::FloorDiv => "'//'",
            TokenKind::Mod => "'%'",
            TokenKind::Pow => "'**'",
            TokenKind::Tilde => "'~'",
            TokenKind::Eq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Assign => "'='",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Pipe => "'|'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::String => "string literal",
            TokenKind::Integer => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Boolean => "boolean literal",
            TokenKind::Null => "null literal",
            TokenKind::Name => "name",
            TokenKind::Keyword(_) => "keyword",
            TokenKind::Data => "template data",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::LineComment => "line comment",
            TokenKind::Eof => "end of template",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(keyword) => write!(f, "keyword '{}'", keyword),
            other => f.write_str(other.describe()),
        }
    }
}

/// A typed lexeme borrowed from the template source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub position: Position,
    pub source_name: Option<&'src str>,
}

impl<'src> Token<'src> {
    pub fn new(
        kind: TokenKind,
        text: &'src str,
        position: Position,
        source_name: Option<&'src str>,
    ) -> Self {
        Self {
            kind,
            text,
            position,
            source_name,
        }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    pub fn span(&self) -> Span {
        Span::new(self.position, self.position.advance_str(self.text))
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Text of a name or keyword token. Contextual tag words are matched
    /// through this so `endset` and `for` are looked up the same way.
    pub fn word(&self) -> Option<&'src str> {
        match self.kind {
            TokenKind::Name | TokenKind::Keyword(_) => Some(self.text),
            _ => None,
        }
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.word() == Some(word)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of template"),
            TokenKind::Data | TokenKind::Comment | TokenKind::LineComment => {
                write!(f, "{}", self.kind)
            }
            _ => write!(f, "'{}'", self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(TokenKind::from_symbol("**"), Some(TokenKind::Pow));
        assert_eq!(TokenKind::from_symbol("//"), Some(TokenKind::FloorDiv));
        assert_eq!(TokenKind::from_symbol("="), Some(TokenKind::Assign));
        assert_eq!(TokenKind::from_symbol("|"), Some(TokenKind::Pipe));
        assert_eq!(TokenKind::from_symbol("!"), None);
    }

    #[test]
    fn test_token_span_and_word() {
        let token = Token::new(TokenKind::Name, "items", Position::new(3, 1, 4), None);
        let span = token.span();
        assert_eq!(span.start.column, 4);
        assert_eq!(span.end.column, 9);
        assert_eq!(token.word(), Some("items"));
        assert!(token.is_word("items"));

        let keyword = Token::new(
            TokenKind::Keyword(Keyword::For),
            "for",
            Position::start(),
            Some("page.html"),
        );
        assert!(keyword.is_keyword(Keyword::For));
        assert_eq!(keyword.word(), Some("for"));
        assert_eq!(keyword.source_name, Some("page.html"));
    }

    #[test]
    fn test_significance() {
        assert!(!TokenKind::Whitespace.is_significant());
        assert!(TokenKind::Comment.is_significant());
        assert!(TokenKind::Eof.is_statement_boundary());
        assert!(!TokenKind::BlockEnd.is_statement_boundary());
    }
}
