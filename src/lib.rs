//! Recast: a rule-based, type-aware rewriting engine for annotated syntax trees.
//!
//! A tree produced by an external parser and type resolver is rewritten by a
//! [`RuleSet`](rules::RuleSet): every node matching a rule's pattern is replaced
//! by the rule's template, with the captured sub-trees carried over untouched.
//!
//! ```rust
//! use recast::prelude::*;
//! use recast::ast::builder::{ident, new_integer};
//! use recast::ast::types::PrimitiveKind;
//!
//! let registry = RuleRegistry::standard().unwrap();
//! let rules = registry.select(&["use-integer-value-of"]).unwrap();
//! let tree = new_integer(vec![ident("n")], Some(PrimitiveKind::Int.into()));
//! let out = apply_all(&tree, &rules).unwrap();
//! assert_eq!(out.pretty(), "Integer.valueOf(n)");
//! ```

pub use crate::diagnostics::{ErrorContext, RecastError};

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod rules;
pub mod syntax;

pub mod prelude {
    pub use crate::ast::path::{NodePath, PathSegment};
    pub use crate::ast::types::{MethodSignature, PrimitiveKind, Type};
    pub use crate::ast::{AstNode, Expr, Literal, Span};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{apply_all, Engine, RewriteOutcome, RewriteStep, TraversalConfig, TraversalMode};
    pub use crate::rules::{
        match_rule, Alternative, MatchResult, Pattern, Rule, RuleRegistry, RuleSet, Skeleton, Template,
        TypeConstraint,
    };
    pub use crate::{ErrorContext, RecastError};
}
