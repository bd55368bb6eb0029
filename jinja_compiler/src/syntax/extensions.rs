//! Custom tag hooks
//!
//! An [`Extension`] claims one or more tag names. When the parser meets
//! `{% name ... %}` for a name no built-in builder owns, it hands the cursor
//! (positioned on the tag name) to the extension that claimed it.

use crate::grammar::ast::nodes::Stmt;
use crate::grammar::builders::Parser;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::tokens::Token;
use crate::utils::Span;
use std::fmt;

/// Tag names reserved by the built-in grammar
pub const BUILTIN_TAGS: [&str; 18] = [
    "for",
    "if",
    "set",
    "block",
    "extends",
    "include",
    "import",
    "from",
    "macro",
    "call",
    "with",
    "filter",
    "autoescape",
    "do",
    "debug",
    "continue",
    "break",
    "raw",
];

/// Words that only close or continue a block opened earlier
pub const CLOSING_TAGS: [&str; 12] = [
    "elif",
    "else",
    "endif",
    "endfor",
    "endset",
    "endblock",
    "endmacro",
    "endcall",
    "endwith",
    "endfilter",
    "endautoescape",
    "endraw",
];

pub fn is_builtin_tag(name: &str) -> bool {
    BUILTIN_TAGS.contains(&name) || CLOSING_TAGS.contains(&name)
}

pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    /// Tag names this extension parses
    fn tags(&self) -> &[&'static str];

    fn handles_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }

    /// Parse the tag opened by `open`, with the cursor on the tag name.
    ///
    /// Returning `Ok(None)` declines the tag: the parser rewinds, skips the
    /// whole tag and produces no node.
    fn parse_tag<'src>(
        &self,
        parser: &mut dyn Parser<'src>,
        open: &Token<'src>,
    ) -> SyntaxResult<Option<Stmt>>;
}

#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn Extension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension. Claiming a built-in tag or a tag another extension
    /// already owns is rejected.
    pub fn register(&mut self, extension: impl Extension + 'static) -> SyntaxResult<()> {
        for tag in extension.tags() {
            if is_builtin_tag(tag) {
                return Err(SyntaxError::extension_failure(
                    extension.name(),
                    &format!("tag '{}' is built in", tag),
                    Span::default(),
                ));
            }
            if let Some(owner) = self.find(tag) {
                return Err(SyntaxError::extension_failure(
                    extension.name(),
                    &format!("tag '{}' is already handled by '{}'", tag, owner.name()),
                    Span::default(),
                ));
            }
        }

        self.extensions.push(Box::new(extension));
        Ok(())
    }

    pub fn find(&self, tag: &str) -> Option<&dyn Extension> {
        self.extensions
            .iter()
            .find(|ext| ext.handles_tag(tag))
            .map(|ext| &**ext)
    }

    pub fn handles_tag(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.extensions
            .iter()
            .flat_map(|ext| ext.tags().iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.extensions.iter().map(|ext| ext.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct Named(&'static str, &'static [&'static str]);

    impl Extension for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn tags(&self) -> &[&'static str] {
            self.1
        }

        fn parse_tag<'src>(
            &self,
            _parser: &mut dyn Parser<'src>,
            _open: &Token<'src>,
        ) -> SyntaxResult<Option<Stmt>> {
            Ok(None)
        }
    }

    #[test]
    fn test_register_and_find() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Named("cache", &["cache"])).unwrap();

        assert!(registry.handles_tag("cache"));
        assert!(!registry.handles_tag("trans"));
        assert_eq!(registry.find("cache").map(|e| e.name()), Some("cache"));
        assert_eq!(registry.tags(), vec!["cache"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtin_tags_cannot_be_claimed() {
        let mut registry = ExtensionRegistry::new();
        let err = registry.register(Named("bad", &["for"])).unwrap_err();
        assert_matches!(err, SyntaxError::ExtensionFailure { .. });
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Named("first", &["spaceless"])).unwrap();
        let err = registry.register(Named("second", &["spaceless"])).unwrap_err();
        assert!(err.to_string().contains("already handled by 'first'"));
    }
}
