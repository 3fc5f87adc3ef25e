//! Replacement templates and their instantiation.
//!
//! Instantiation never touches captured sub-trees: each slot receives the
//! captured node itself (the same shared instance, metadata and span included).
//! Fresh skeleton nodes take the span of the matched site. A fresh replacement
//! root carries the template's declared result type, or no type when none is
//! declared; inner fresh nodes never carry one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ast::types::Type;
use crate::ast::{AstNode, Expr, Span};
use crate::rules::pattern::Captures;
use crate::rules::skeleton::{Skeleton, TypeConstraint};
use crate::{err_msg, RecastError};

/// The replacement half of a rule alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    skeleton: Skeleton,
    /// Resolved type of a fresh replacement root, e.g. `int` for `Integer.parseInt(..)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_type: Option<Type>,
}

impl Template {
    /// Wraps a skeleton; template slots cannot carry type constraints.
    pub fn new(skeleton: Skeleton) -> Result<Self, RecastError> {
        if let Some(hole) = skeleton
            .holes()
            .into_iter()
            .find(|h| h.constraint != TypeConstraint::Any)
        {
            return Err(err_msg!(
                RuleConstruction,
                "template slot `{}` cannot carry a type constraint",
                hole.name
            ));
        }
        Ok(Template {
            skeleton,
            result_type: None,
        })
    }

    /// Declares the resolved type of the replacement root.
    ///
    /// Ignored when the template is a bare slot: the captured node keeps its own type.
    pub fn with_result_type(mut self, ty: Type) -> Self {
        self.result_type = Some(ty);
        self
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn result_type(&self) -> Option<&Type> {
        self.result_type.as_ref()
    }

    pub fn slot_names(&self) -> BTreeSet<String> {
        self.skeleton.hole_names()
    }

    /// Builds a detached replacement for `site` from `captures`.
    ///
    /// A slot without a capture is an internal invariant violation; rule
    /// construction guarantees the slot and capture sets agree.
    pub fn instantiate(&self, captures: &Captures, site: &AstNode) -> Result<AstNode, RecastError> {
        let replacement = build(&self.skeleton, captures, site.span)?;
        if matches!(self.skeleton, Skeleton::Hole(_)) {
            return Ok(replacement);
        }
        Ok(AstNode {
            ty: self.result_type.clone(),
            ..replacement
        })
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.skeleton)
    }
}

fn build(skeleton: &Skeleton, captures: &Captures, span: Span) -> Result<AstNode, RecastError> {
    let fresh = |expr: Expr| -> Result<AstNode, RecastError> { Ok(AstNode::new(expr).at(span)) };
    match skeleton {
        Skeleton::Hole(hole) => captures
            .get(&hole.name)
            .map(|capture| capture.node.clone())
            .ok_or_else(|| err_msg!(Internal, "no capture bound for template slot `{}`", hole.name)),
        Skeleton::Literal(literal) => fresh(Expr::Literal(literal.clone())),
        Skeleton::Ident(name) => fresh(Expr::Ident(name.clone())),
        Skeleton::FieldAccess { target, name } => fresh(Expr::FieldAccess {
            target: build(target, captures, span)?,
            name: name.clone(),
        }),
        Skeleton::MethodCall { target, name, args } => {
            let target = match target {
                Some(target) => Some(build(target, captures, span)?),
                None => None,
            };
            fresh(Expr::MethodCall {
                target,
                name: name.clone(),
                args: build_all(args, captures, span)?,
                method: None,
            })
        }
        Skeleton::NewClass { class, args } => fresh(Expr::NewClass {
            class: class.clone(),
            args: build_all(args, captures, span)?,
            constructor: None,
        }),
        Skeleton::Unary { op, operand } => fresh(Expr::Unary {
            op: *op,
            operand: build(operand, captures, span)?,
        }),
        Skeleton::Binary { op, lhs, rhs } => fresh(Expr::Binary {
            op: *op,
            lhs: build(lhs, captures, span)?,
            rhs: build(rhs, captures, span)?,
        }),
        Skeleton::Ternary {
            condition,
            then_branch,
            else_branch,
        } => fresh(Expr::Ternary {
            condition: build(condition, captures, span)?,
            then_branch: build(then_branch, captures, span)?,
            else_branch: build(else_branch, captures, span)?,
        }),
        Skeleton::Parens(inner) => fresh(Expr::Parens(build(inner, captures, span)?)),
    }
}

fn build_all(items: &[Skeleton], captures: &Captures, span: Span) -> Result<Vec<AstNode>, RecastError> {
    items.iter().map(|item| build(item, captures, span)).collect()
}
