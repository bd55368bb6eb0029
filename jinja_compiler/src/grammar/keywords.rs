//! Reserved words of the template language
//!
//! Only the words listed here are lexed as `TokenKind::Keyword`. Contextual
//! words such as `endfilter`, `endset`, `endcall`, `as`, `scoped` or
//! `ignore` stay plain names and are recognized by the parser where they are
//! meaningful, so they remain usable as variable names elsewhere.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    // === CONTROL FLOW ===
    For,
    In,
    If,
    Else,
    Elif,
    EndIf,
    EndFor,
    Continue,
    Break,

    // === TEMPLATE STRUCTURE ===
    Block,
    EndBlock,
    Extends,
    Include,
    Import,
    From,

    // === MACROS AND SCOPES ===
    Macro,
    EndMacro,
    Call,
    Set,
    With,
    EndWith,
    Do,
    Debug,

    // === OPERATORS ===
    And,
    Or,
    Not,
    Is,
}

/// Every keyword, in declaration order
pub const ALL_KEYWORDS: [Keyword; 27] = [
    Keyword::For,
    Keyword::In,
    Keyword::If,
    Keyword::Else,
    Keyword::Elif,
    Keyword::EndIf,
    Keyword::EndFor,
    Keyword::Continue,
    Keyword::Break,
    Keyword::Block,
    Keyword::EndBlock,
    Keyword::Extends,
    Keyword::Include,
    Keyword::Import,
    Keyword::From,
    Keyword::Macro,
    Keyword::EndMacro,
    Keyword::Call,
    Keyword::Set,
    Keyword::With,
    Keyword::EndWith,
    Keyword::Do,
    Keyword::Debug,
    Keyword::And,
    Keyword::Or,
    Keyword::Not,
    Keyword::Is,
];

impl Keyword {
    /// Exact spelling as it appears in template source
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::For => "for",
            Self::In => "in",
            Self::If => "if",
            Self::Else => "else",
            Self::Elif => "elif",
            Self::EndIf => "endif",
            Self::EndFor => "endfor",
            Self::Continue => "continue",
            Self::Break => "break",
            Self::Block => "block",
            Self::EndBlock => "endblock",
            Self::Extends => "extends",
            Self::Include => "include",
            Self::Import => "import",
            Self::From => "from",
            Self::Macro => "macro",
            Self::EndMacro => "endmacro",
            Self::Call => "call",
            Self::Set => "set",
            Self::With => "with",
            Self::EndWith => "endwith",
            Self::Do => "do",
            Self::Debug => "debug",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Is => "is",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "for" => Some(Self::For),
            "in" => Some(Self::In),
            "if" => Some(Self::If),
            "else" => Some(Self::Else),
            "elif" => Some(Self::Elif),
            "endif" => Some(Self::EndIf),
            "endfor" => Some(Self::EndFor),
            "continue" => Some(Self::Continue),
            "break" => Some(Self::Break),
            "block" => Some(Self::Block),
            "endblock" => Some(Self::EndBlock),
            "extends" => Some(Self::Extends),
            "include" => Some(Self::Include),
            "import" => Some(Self::Import),
            "from" => Some(Self::From),
            "macro" => Some(Self::Macro),
            "endmacro" => Some(Self::EndMacro),
            "call" => Some(Self::Call),
            "set" => Some(Self::Set),
            "with" => Some(Self::With),
            "endwith" => Some(Self::EndWith),
            "do" => Some(Self::Do),
            "debug" => Some(Self::Debug),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "is" => Some(Self::Is),
            _ => None,
        }
    }

    pub fn is_operator(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not | Self::Is | Self::In)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal words that lex to a dedicated literal kind instead of a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralWord {
    Boolean(bool),
    Null,
}

/// `true`/`false` are booleans and `null`/`None` are null. Lowercase `none`
/// is left alone because it names the `is none` test.
pub fn classify_literal_word(word: &str) -> Option<LiteralWord> {
    match word {
        "true" => Some(LiteralWord::Boolean(true)),
        "false" => Some(LiteralWord::Boolean(false)),
        "null" | "None" => Some(LiteralWord::Null),
        _ => None,
    }
}

pub fn is_reserved_keyword(word: &str) -> bool {
    Keyword::from_str(word).is_some() || classify_literal_word(word).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for keyword in ALL_KEYWORDS {
            assert_eq!(Keyword::from_str(keyword.as_str()), Some(keyword));
        }
    }

    #[test]
    fn test_contextual_words_are_not_keywords() {
        for word in ["endfilter", "endset", "endcall", "as", "raw", "filter", "autoescape"] {
            assert_eq!(Keyword::from_str(word), None, "{word} should not be reserved");
        }
        assert_eq!(Keyword::from_str("For"), None);
    }

    #[test]
    fn test_literal_words() {
        assert_eq!(classify_literal_word("true"), Some(LiteralWord::Boolean(true)));
        assert_eq!(classify_literal_word("None"), Some(LiteralWord::Null));
        assert_eq!(classify_literal_word("null"), Some(LiteralWord::Null));
        assert_eq!(classify_literal_word("none"), None);
        assert!(is_reserved_keyword("None"));
        assert!(!is_reserved_keyword("none"));
    }
}
