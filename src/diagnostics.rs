//! Unified, `miette`-based diagnostics for the Recast engine.
//!
//! Every failure the engine can surface to a caller is a [`RecastError`]. Expected
//! outcomes such as "this rule does not apply here" are *not* errors; they are
//! values (`MatchResult::NoMatch`) and never reach this module.
//!
//! # Error Construction Macros
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(RuleConstruction, "Rule '{}' has no alternatives", name)`
//!
//! - **Use `err_ctx!` when a source text and a span are available** (snippet
//!   parse errors, configuration errors).
//!   - `err_ctx!(Parse, "Unknown constraint", src, span)`
//!
//! Traversal failures carry the offending node path and are built with
//! [`RecastError::traversal`].

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::ast::path::NodePath;
use crate::ast::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification, used by tests and by the CLI exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Snippet or tree input could not be parsed.
    Parse,
    /// A rule or rule set is malformed.
    RuleConstruction,
    /// A pass hit an internal invariant violation.
    Traversal,
    /// Engine configuration is invalid.
    Config,
    /// Reading or writing a file failed.
    Io,
    /// Engine bug.
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "parse",
            ErrorType::RuleConstruction => "rule",
            ErrorType::Traversal => "traversal",
            ErrorType::Config => "config",
            ErrorType::Io => "io",
            ErrorType::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

type BoxedCause = Option<Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Unified error type for all Recast failure modes.
#[derive(Debug, Error)]
pub enum RecastError {
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Rule construction error: {message}")]
    RuleConstruction {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Traversal failure at `{path}`: {message}")]
    Traversal {
        message: String,
        path: NodePath,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl RecastError {
    /// Builds a traversal failure located at `path`.
    pub fn traversal(path: NodePath, message: impl Into<String>) -> Self {
        RecastError::Traversal {
            message: message.into(),
            path,
            ctx: ErrorContext::none(),
            source: None,
        }
    }

    /// Attaches a help message, replacing any previous one.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.ctx_mut().help = Some(help.into());
        self
    }

    /// Attaches an underlying cause.
    pub fn caused_by(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        *self.cause_mut() = Some(Box::new(cause));
        self
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            RecastError::Parse { .. } => ErrorType::Parse,
            RecastError::RuleConstruction { .. } => ErrorType::RuleConstruction,
            RecastError::Traversal { .. } => ErrorType::Traversal,
            RecastError::Config { .. } => ErrorType::Config,
            RecastError::Io { .. } => ErrorType::Io,
            RecastError::Internal { .. } => ErrorType::Internal,
        }
    }

    /// The bare message, without the category prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            RecastError::Parse { message, .. }
            | RecastError::RuleConstruction { message, .. }
            | RecastError::Traversal { message, .. }
            | RecastError::Config { message, .. }
            | RecastError::Io { message, .. }
            | RecastError::Internal { message, .. } => message,
        }
    }

    /// The node path of a traversal failure.
    pub fn path(&self) -> Option<&NodePath> {
        match self {
            RecastError::Traversal { path, .. } => Some(path),
            _ => None,
        }
    }

    fn ctx(&self) -> &ErrorContext {
        match self {
            RecastError::Parse { ctx, .. }
            | RecastError::RuleConstruction { ctx, .. }
            | RecastError::Traversal { ctx, .. }
            | RecastError::Config { ctx, .. }
            | RecastError::Io { ctx, .. }
            | RecastError::Internal { ctx, .. } => ctx,
        }
    }

    fn ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            RecastError::Parse { ctx, .. }
            | RecastError::RuleConstruction { ctx, .. }
            | RecastError::Traversal { ctx, .. }
            | RecastError::Config { ctx, .. }
            | RecastError::Io { ctx, .. }
            | RecastError::Internal { ctx, .. } => ctx,
        }
    }

    fn cause_mut(&mut self) -> &mut BoxedCause {
        match self {
            RecastError::Parse { source, .. }
            | RecastError::RuleConstruction { source, .. }
            | RecastError::Traversal { source, .. }
            | RecastError::Config { source, .. }
            | RecastError::Io { source, .. }
            | RecastError::Internal { source, .. } => source,
        }
    }
}

impl Diagnostic for RecastError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("recast::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.ctx();
        // Labels without a source would point into nothing.
        ctx.source.as_ref()?;
        let span = ctx.span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.message().to_string()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

impl From<std::io::Error> for RecastError {
    fn from(error: std::io::Error) -> Self {
        RecastError::Io {
            message: error.to_string(),
            ctx: ErrorContext::none(),
            source: Some(Box::new(error)),
        }
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source(name: &str, source: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Byte offset of a 1-based line/column position, clamped to the text.
pub(crate) fn line_column_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// Constructs a `RecastError` variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    // Format string with arguments
    ($variant:ident, $fmt:literal, $($arg:expr),+ $(,)?) => {
        $crate::RecastError::$variant {
            message: format!($fmt, $($arg),+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    // Literal message only
    ($variant:ident, $msg:literal) => {
        $crate::RecastError::$variant {
            message: format!($msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    // Pre-built message
    ($variant:ident, $msg:expr) => {
        $crate::RecastError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a `RecastError` variant with a message, a source, a span and optional help.
#[macro_export]
macro_rules! err_ctx {
    // Message, src, span, help
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::RecastError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    // Message, src, span
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::RecastError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;
    use crate::ast::path::PathSegment;

    #[test]
    fn test_labeled_snippet_diagnostic() {
        let src = to_error_source("snippet", "new Integer(#{x:wat})");
        let err = err_ctx!(
            Parse,
            "unknown hole constraint `wat`",
            &src,
            Span { start: 16, end: 19 },
            "use any, primitive, numeric, a primitive keyword or a qualified class name"
        );
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("unknown hole constraint"));
        assert!(output.contains("recast::parse"));
        assert!(output.contains("qualified class name"));
    }

    #[test]
    fn test_traversal_error_names_path() {
        let path = NodePath::root()
            .child(PathSegment::index("members", 2))
            .child(PathSegment::field("body"));
        let err = RecastError::traversal(path, "arity mismatch");
        assert_eq!(err.error_type(), ErrorType::Traversal);
        assert_eq!(err.to_string(), "Traversal failure at `members[2].body`: arity mismatch");
    }

    #[test]
    fn test_error_chaining() {
        let cause = err_msg!(Parse, "bad snippet");
        let err = err_msg!(RuleConstruction, "rule '{}' rejected", "demo")
            .caused_by(cause)
            .with_help("fix the snippet");
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("rule 'demo' rejected"));
        assert!(output.contains("bad snippet"));
        assert!(output.contains("fix the snippet"));
    }
}
