//! Structural and type-aware matching of tree nodes against rule patterns.
//!
//! Matching is pure: it never mutates the tree and keeps no state between calls.
//! A failed match, including one caused by missing type metadata, is the value
//! [`MatchResult::NoMatch`], never an error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::ast::types::{MethodSignature, Type};
use crate::ast::{AstNode, Expr};
use crate::rules::rule::Rule;
use crate::rules::skeleton::{Hole, Skeleton};

/// A sub-tree bound to a pattern hole, plus the type that justified the binding.
///
/// `ty` is the declared parameter type of the bound overload for captures in an
/// argument slot, and the node's own resolved type elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub node: AstNode,
    pub ty: Option<Type>,
}

pub type Captures = BTreeMap<String, Capture>;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    Matched {
        /// Index of the alternative that matched.
        alternative: usize,
        captures: Captures,
    },
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

/// The matcher half of a rule alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(Skeleton);

/// Where the node under test sits relative to its parent.
#[derive(Clone, Copy)]
enum Position<'a> {
    Node,
    /// An argument slot; carries the declared parameter type of the bound overload.
    Argument(Option<&'a Type>),
}

impl Pattern {
    pub fn new(skeleton: Skeleton) -> Self {
        Pattern(skeleton)
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.0
    }

    /// Capture names in pre-order, duplicates included.
    pub fn capture_names(&self) -> Vec<&str> {
        self.0.holes().into_iter().map(|h| h.name.as_str()).collect()
    }

    pub fn capture_set(&self) -> BTreeSet<String> {
        self.0.hole_names()
    }

    pub fn overlaps(&self, other: &Pattern) -> bool {
        self.0.overlaps(&other.0)
    }

    /// Tests `node` against this pattern, returning the captures on success.
    pub fn matches(&self, node: &AstNode) -> Option<Captures> {
        let mut captures = Captures::new();
        match_skeleton(&self.0, node, Position::Node, &mut captures).then_some(captures)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tests `node` against each alternative of `rule` in order; the first match wins.
pub fn match_rule(node: &AstNode, rule: &Rule) -> MatchResult {
    rule.alternatives()
        .iter()
        .enumerate()
        .find_map(|(index, alternative)| {
            alternative
                .pattern
                .matches(node)
                .map(|captures| MatchResult::Matched {
                    alternative: index,
                    captures,
                })
        })
        .unwrap_or(MatchResult::NoMatch)
}

// ============================================================================
// MATCHING
// ============================================================================

fn match_skeleton(
    pattern: &Skeleton,
    node: &AstNode,
    position: Position<'_>,
    captures: &mut Captures,
) -> bool {
    match (pattern, node.expr()) {
        (Skeleton::Hole(hole), _) => bind(hole, node, position, captures),
        (Skeleton::Literal(expected), Expr::Literal(actual)) => expected == actual,
        (Skeleton::Ident(expected), Expr::Ident(actual)) => expected == actual,
        (
            Skeleton::FieldAccess { target, name },
            Expr::FieldAccess {
                target: node_target,
                name: node_name,
            },
        ) => name == node_name && match_skeleton(target, node_target, Position::Node, captures),
        (
            Skeleton::MethodCall { target, name, args },
            Expr::MethodCall {
                target: node_target,
                name: node_name,
                args: node_args,
                method,
            },
        ) => {
            if name != node_name || args.len() != node_args.len() {
                return false;
            }
            let receiver = match (target, node_target) {
                (None, None) => true,
                (Some(target), Some(node_target)) => {
                    match_skeleton(target, node_target, Position::Node, captures)
                }
                _ => false,
            };
            receiver && match_arguments(args, node_args, method.as_ref(), captures)
        }
        (
            Skeleton::NewClass { class, args },
            Expr::NewClass {
                args: node_args,
                constructor,
                ..
            },
        ) => {
            args.len() == node_args.len()
                && constructs_class(class, node)
                && match_arguments(args, node_args, constructor.as_ref(), captures)
        }
        (
            Skeleton::Unary { op, operand },
            Expr::Unary {
                op: node_op,
                operand: node_operand,
            },
        ) => op == node_op && match_skeleton(operand, node_operand, Position::Node, captures),
        (
            Skeleton::Binary { op, lhs, rhs },
            Expr::Binary {
                op: node_op,
                lhs: node_lhs,
                rhs: node_rhs,
            },
        ) => {
            op == node_op
                && match_skeleton(lhs, node_lhs, Position::Node, captures)
                && match_skeleton(rhs, node_rhs, Position::Node, captures)
        }
        (
            Skeleton::Ternary {
                condition,
                then_branch,
                else_branch,
            },
            Expr::Ternary {
                condition: node_condition,
                then_branch: node_then,
                else_branch: node_else,
            },
        ) => {
            match_skeleton(condition, node_condition, Position::Node, captures)
                && match_skeleton(then_branch, node_then, Position::Node, captures)
                && match_skeleton(else_branch, node_else, Position::Node, captures)
        }
        (Skeleton::Parens(inner), Expr::Parens(node_inner)) => {
            match_skeleton(inner, node_inner, Position::Node, captures)
        }
        _ => false,
    }
}

fn match_arguments(
    patterns: &[Skeleton],
    args: &[AstNode],
    signature: Option<&MethodSignature>,
    captures: &mut Captures,
) -> bool {
    let arity = args.len();
    patterns.iter().zip(args).enumerate().all(|(index, (pattern, arg))| {
        let declared = signature.and_then(|s| s.parameter(index, arity));
        match_skeleton(pattern, arg, Position::Argument(declared), captures)
    })
}

/// The construction site's resolved type must name the pattern's class.
fn constructs_class(class: &str, node: &AstNode) -> bool {
    let Some(fqn) = node.ty.as_ref().and_then(Type::fqn) else {
        tracing::trace!(class, span = ?node.span, "construction site has no resolved class type");
        return false;
    };
    if class.contains('.') {
        fqn == class
    } else {
        fqn.rsplit('.').next() == Some(class)
    }
}

fn bind(hole: &Hole, node: &AstNode, position: Position<'_>, captures: &mut Captures) -> bool {
    let ty = match position {
        Position::Node => node.ty.as_ref(),
        Position::Argument(declared) => declared,
    };
    if hole.constraint.needs_metadata() {
        match ty {
            None => {
                tracing::trace!(
                    capture = %hole.name,
                    constraint = %hole.constraint,
                    span = ?node.span,
                    "type metadata unresolved, treating as no match"
                );
                return false;
            }
            Some(ty) if !hole.constraint.admits(ty) => return false,
            Some(_) => {}
        }
    }
    captures.insert(
        hole.name.clone(),
        Capture {
            node: node.clone(),
            ty: ty.cloned(),
        },
    );
    true
}
