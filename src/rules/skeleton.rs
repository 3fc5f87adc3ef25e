//! Fragment skeletons shared by patterns and templates.
//!
//! A skeleton is a small tree of expression forms in which some positions are
//! named holes. In a pattern a hole captures whatever sits at that position
//! (subject to its [`TypeConstraint`]); in a template a hole is a slot that
//! receives a captured sub-tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::ast::types::{Type, JAVA_LANG_STRING};
use crate::ast::{BinaryOp, Literal, UnaryOp};
use crate::{err_msg, RecastError};

// ============================================================================
// TYPE CONSTRAINTS
// ============================================================================

/// A predicate over the resolved type a capture is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeConstraint {
    /// Matches regardless of metadata, including when none is present.
    Any,
    /// Any primitive kind.
    Primitive,
    /// Any numeric primitive kind.
    Numeric,
    Exact(Type),
}

impl TypeConstraint {
    /// Parses the constraint part of a hole, `#{name:constraint}`.
    ///
    /// Accepts `any`, `primitive`, `numeric`, or any type [`Type::parse`]
    /// understands: a primitive keyword, `String` (short for `java.lang.String`),
    /// a fully-qualified class name, and arrays of those (`int[]`).
    pub fn parse(text: &str) -> Result<Self, RecastError> {
        let constraint = match text.trim() {
            "any" => TypeConstraint::Any,
            "primitive" => TypeConstraint::Primitive,
            "numeric" => TypeConstraint::Numeric,
            other => Type::parse(other)
                .map(TypeConstraint::Exact)
                .map_err(|_| err_msg!(Parse, "unknown type constraint `{}`", other))?,
        };
        Ok(constraint)
    }

    /// True if a check against this constraint needs resolved metadata.
    pub fn needs_metadata(&self) -> bool {
        !matches!(self, TypeConstraint::Any)
    }

    pub fn admits(&self, ty: &Type) -> bool {
        match self {
            TypeConstraint::Any => true,
            TypeConstraint::Primitive => ty.is_primitive(),
            TypeConstraint::Numeric => ty.is_numeric(),
            TypeConstraint::Exact(expected) => expected == ty,
        }
    }

    /// Conservative: true unless no type can satisfy both constraints.
    pub fn overlaps(&self, other: &TypeConstraint) -> bool {
        use TypeConstraint::*;
        match (self, other) {
            (Any, _) | (_, Any) => true,
            (Primitive, Primitive) | (Numeric, Numeric) => true,
            (Primitive, Numeric) | (Numeric, Primitive) => true,
            (Primitive, Exact(t)) | (Exact(t), Primitive) => t.is_primitive(),
            (Numeric, Exact(t)) | (Exact(t), Numeric) => t.is_numeric(),
            (Exact(a), Exact(b)) => a == b,
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeConstraint::Any => write!(f, "any"),
            TypeConstraint::Primitive => write!(f, "primitive"),
            TypeConstraint::Numeric => write!(f, "numeric"),
            TypeConstraint::Exact(ty) if ty.fqn() == Some(JAVA_LANG_STRING) => write!(f, "String"),
            TypeConstraint::Exact(ty) => write!(f, "{}", ty),
        }
    }
}

// ============================================================================
// SKELETON
// ============================================================================

/// A named hole.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hole {
    pub name: String,
    pub constraint: TypeConstraint,
}

/// An expression skeleton with holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Skeleton {
    Hole(Hole),
    Literal(Literal),
    Ident(String),
    FieldAccess {
        target: Box<Skeleton>,
        name: String,
    },
    MethodCall {
        target: Option<Box<Skeleton>>,
        name: String,
        args: Vec<Skeleton>,
    },
    /// `new class(args)`. A qualified `class` is compared against the fully-qualified
    /// name of the resolved type, a simple one against its last segment.
    NewClass {
        class: String,
        args: Vec<Skeleton>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Skeleton>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Skeleton>,
        rhs: Box<Skeleton>,
    },
    Ternary {
        condition: Box<Skeleton>,
        then_branch: Box<Skeleton>,
        else_branch: Box<Skeleton>,
    },
    Parens(Box<Skeleton>),
}

impl Skeleton {
    pub fn hole(name: &str) -> Self {
        Self::typed_hole(name, TypeConstraint::Any)
    }

    pub fn typed_hole(name: &str, constraint: TypeConstraint) -> Self {
        Skeleton::Hole(Hole {
            name: name.to_string(),
            constraint,
        })
    }

    pub fn ident(name: &str) -> Self {
        Skeleton::Ident(name.to_string())
    }

    pub fn literal(literal: Literal) -> Self {
        Skeleton::Literal(literal)
    }

    pub fn new_class(class: &str, args: Vec<Skeleton>) -> Self {
        Skeleton::NewClass {
            class: class.to_string(),
            args,
        }
    }

    pub fn call(target: Option<Skeleton>, name: &str, args: Vec<Skeleton>) -> Self {
        Skeleton::MethodCall {
            target: target.map(Box::new),
            name: name.to_string(),
            args,
        }
    }

    pub fn field_access(target: Skeleton, name: &str) -> Self {
        Skeleton::FieldAccess {
            target: Box::new(target),
            name: name.to_string(),
        }
    }

    pub fn unary(op: UnaryOp, operand: Skeleton) -> Self {
        Skeleton::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Skeleton, rhs: Skeleton) -> Self {
        Skeleton::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn ternary(condition: Skeleton, then_branch: Skeleton, else_branch: Skeleton) -> Self {
        Skeleton::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn parens(inner: Skeleton) -> Self {
        Skeleton::Parens(Box::new(inner))
    }

    /// Direct sub-skeletons, in slot order.
    pub fn children(&self) -> Vec<&Skeleton> {
        match self {
            Skeleton::Hole(_) | Skeleton::Literal(_) | Skeleton::Ident(_) => Vec::new(),
            Skeleton::FieldAccess { target, .. } => vec![target.as_ref()],
            Skeleton::MethodCall { target, args, .. } => {
                target.iter().map(|t| t.as_ref()).chain(args.iter()).collect()
            }
            Skeleton::NewClass { args, .. } => args.iter().collect(),
            Skeleton::Unary { operand, .. } => vec![operand.as_ref()],
            Skeleton::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            Skeleton::Ternary {
                condition,
                then_branch,
                else_branch,
            } => vec![condition.as_ref(), then_branch.as_ref(), else_branch.as_ref()],
            Skeleton::Parens(inner) => vec![inner.as_ref()],
        }
    }

    /// All holes in pre-order, duplicates included.
    pub fn holes(&self) -> Vec<&Hole> {
        let mut out = Vec::new();
        self.collect_holes(&mut out);
        out
    }

    fn collect_holes<'a>(&'a self, out: &mut Vec<&'a Hole>) {
        if let Skeleton::Hole(hole) = self {
            out.push(hole);
        }
        for child in self.children() {
            child.collect_holes(out);
        }
    }

    /// The distinct hole names.
    pub fn hole_names(&self) -> BTreeSet<String> {
        self.holes().into_iter().map(|h| h.name.clone()).collect()
    }

    /// Conservative structural overlap: two skeletons overlap unless some
    /// corresponding position differs in kind, literal, name, operator, class or
    /// arity, or carries disjoint type constraints. A hole facing a concrete form
    /// counts as overlapping.
    pub fn overlaps(&self, other: &Skeleton) -> bool {
        use Skeleton::*;
        match (self, other) {
            (Hole(a), Hole(b)) => a.constraint.overlaps(&b.constraint),
            (Hole(_), _) | (_, Hole(_)) => true,
            (Literal(a), Literal(b)) => a == b,
            (Ident(a), Ident(b)) => a == b,
            (FieldAccess { target: ta, name: na }, FieldAccess { target: tb, name: nb }) => {
                na == nb && ta.overlaps(tb)
            }
            (
                MethodCall {
                    target: ta,
                    name: na,
                    args: aa,
                },
                MethodCall {
                    target: tb,
                    name: nb,
                    args: ab,
                },
            ) => {
                let targets = match (ta, tb) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.overlaps(b),
                    _ => false,
                };
                na == nb && targets && all_overlap(aa, ab)
            }
            (NewClass { class: ca, args: aa }, NewClass { class: cb, args: ab }) => {
                classes_may_coincide(ca, cb) && all_overlap(aa, ab)
            }
            (Unary { op: oa, operand: a }, Unary { op: ob, operand: b }) => {
                oa == ob && a.overlaps(b)
            }
            (
                Binary {
                    op: oa,
                    lhs: la,
                    rhs: ra,
                },
                Binary {
                    op: ob,
                    lhs: lb,
                    rhs: rb,
                },
            ) => oa == ob && la.overlaps(lb) && ra.overlaps(rb),
            (
                Ternary {
                    condition: ca,
                    then_branch: ta,
                    else_branch: ea,
                },
                Ternary {
                    condition: cb,
                    then_branch: tb,
                    else_branch: eb,
                },
            ) => ca.overlaps(cb) && ta.overlaps(tb) && ea.overlaps(eb),
            (Parens(a), Parens(b)) => a.overlaps(b),
            _ => false,
        }
    }
}

fn all_overlap(a: &[Skeleton], b: &[Skeleton]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.overlaps(y))
}

/// A simple name may denote any qualified name ending in it.
fn classes_may_coincide(a: &str, b: &str) -> bool {
    let simple = |name: &str| name.rsplit('.').next().unwrap_or(name).to_string();
    match (a.contains('.'), b.contains('.')) {
        (true, true) | (false, false) => a == b,
        _ => simple(a) == simple(b),
    }
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skeleton::Hole(hole) => match hole.constraint {
                TypeConstraint::Any => write!(f, "#{{{}}}", hole.name),
                ref constraint => write!(f, "#{{{}:{}}}", hole.name, constraint),
            },
            Skeleton::Literal(literal) => write!(f, "{}", literal.pretty()),
            Skeleton::Ident(name) => write!(f, "{}", name),
            Skeleton::FieldAccess { target, name } => write!(f, "{}.{}", target, name),
            Skeleton::MethodCall { target, name, args } => {
                if let Some(target) = target {
                    write!(f, "{}.", target)?;
                }
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Skeleton::NewClass { class, args } => {
                write!(f, "new {}(", class)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Skeleton::Unary { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Skeleton::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Skeleton::Ternary {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "{} ? {} : {}", condition, then_branch, else_branch),
            Skeleton::Parens(inner) => write!(f, "({})", inner),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Skeleton]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::PrimitiveKind;

    #[test]
    fn test_parse_constraints() {
        assert_eq!(TypeConstraint::parse("any").unwrap(), TypeConstraint::Any);
        assert_eq!(TypeConstraint::parse("numeric").unwrap(), TypeConstraint::Numeric);
        assert_eq!(
            TypeConstraint::parse("int").unwrap(),
            TypeConstraint::Exact(PrimitiveKind::Int.into())
        );
        assert_eq!(
            TypeConstraint::parse("String").unwrap(),
            TypeConstraint::Exact(Type::string())
        );
        assert_eq!(
            TypeConstraint::parse("java.util.List").unwrap(),
            TypeConstraint::Exact(Type::class("java.util.List"))
        );
        assert_eq!(
            TypeConstraint::parse("int[]").unwrap(),
            TypeConstraint::Exact(Type::Array(Box::new(PrimitiveKind::Int.into())))
        );
        assert!(TypeConstraint::parse("wat").is_err());
        assert!(TypeConstraint::parse("java..List").is_err());
    }

    #[test]
    fn test_constraint_overlap() {
        let string = TypeConstraint::Exact(Type::string());
        let int = TypeConstraint::Exact(PrimitiveKind::Int.into());
        let boolean = TypeConstraint::Exact(PrimitiveKind::Boolean.into());
        assert!(!TypeConstraint::Numeric.overlaps(&string));
        assert!(TypeConstraint::Numeric.overlaps(&int));
        assert!(!TypeConstraint::Numeric.overlaps(&boolean));
        assert!(TypeConstraint::Primitive.overlaps(&boolean));
        assert!(TypeConstraint::Any.overlaps(&string));
        assert!(!int.overlaps(&string));
    }

    #[test]
    fn test_skeleton_overlap_is_conservative() {
        let a = Skeleton::new_class(
            "java.lang.Integer",
            vec![Skeleton::typed_hole("x", TypeConstraint::Numeric)],
        );
        let b = Skeleton::new_class(
            "java.lang.Integer",
            vec![Skeleton::typed_hole("x", TypeConstraint::Exact(Type::string()))],
        );
        let c = Skeleton::new_class("java.lang.Integer", vec![Skeleton::literal(Literal::Int(1))]);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(!c.overlaps(&Skeleton::new_class("java.lang.Integer", vec![])));
        assert!(Skeleton::new_class("Integer", vec![]).overlaps(&Skeleton::new_class("java.lang.Integer", vec![])));
    }

    #[test]
    fn test_display_matches_snippet_syntax() {
        let s = Skeleton::call(
            Some(Skeleton::ident("java.lang.Integer")),
            "valueOf",
            vec![Skeleton::typed_hole("x", TypeConstraint::Numeric)],
        );
        assert_eq!(s.to_string(), "java.lang.Integer.valueOf(#{x:numeric})");
    }
}
