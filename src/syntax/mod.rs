//! Snippet compilation.
//!
//! Rules may be authored as before/after example fragments. Each fragment is
//! parsed once into a [`Skeleton`](crate::rules::skeleton::Skeleton) with the
//! pest grammar in `grammar.pest`:
//!
//! ```rust
//! use recast::syntax::{parse_pattern, parse_template};
//! let pattern = parse_pattern("new java.lang.Integer(#{x:numeric})").unwrap();
//! let template = parse_template("java.lang.Integer.valueOf(#{x})").unwrap();
//! assert_eq!(pattern.capture_set(), template.slot_names());
//! ```

pub mod parser;

pub use parser::{parse_snippet, SnippetRole};

use crate::rules::pattern::Pattern;
use crate::rules::template::Template;
use crate::RecastError;

/// Compiles the "before" side of a rule.
pub fn parse_pattern(text: &str) -> Result<Pattern, RecastError> {
    parse_snippet(text, SnippetRole::Pattern).map(Pattern::new)
}

/// Compiles the "after" side of a rule.
pub fn parse_template(text: &str) -> Result<Template, RecastError> {
    parse_snippet(text, SnippetRole::Template).and_then(Template::new)
}
