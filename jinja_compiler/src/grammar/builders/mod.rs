//! Builder functions for the template grammar
//!
//! - `atomic` - the [`Parser`] trait, names and literals
//! - `expressions` - the operator precedence ladder
//! - `blocks` - one builder per statement tag
//! - `helpers` - expectations, bodies, argument lists

pub mod atomic;
pub mod blocks;
pub mod expressions;
pub mod helpers;

pub use atomic::{parse_dotted_name, parse_identifier, parse_literal, unescape_string, Parser};

pub use blocks::{
    parse_autoescape, parse_block, parse_call, parse_do, parse_extends, parse_filter_block,
    parse_for, parse_from_import, parse_if, parse_import, parse_include, parse_macro,
    parse_plain_output, parse_raw_block, parse_set, parse_simple_tag, parse_variable_output,
    parse_with, skip_comment,
};

pub use expressions::{
    parse_expression, parse_expression_no_conditional, parse_filter_call, parse_filter_chain,
};

pub use helpers::{
    expect, expect_block_end, expect_word, nested, parse_body_until, parse_call_arguments,
    parse_closed_body, parse_signature, skip_if, skip_tag, skip_word,
};
