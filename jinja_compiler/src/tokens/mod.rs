//! Token model shared by the lexer and parser
//!
//! - [`TokenKind`] - closed set of lexeme categories
//! - [`Token`] - a kind plus a borrowed slice of the source and its position
//! - [`TokenStream`] - forward cursor over significant tokens with lookahead

pub mod token;
pub mod token_stream;

pub use token::{Token, TokenKind};
pub use token_stream::{TokenStream, TokenStreamBuilder};
