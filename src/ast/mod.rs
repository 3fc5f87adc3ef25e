//! AST module for the Recast engine
//!
//! The tree model handed to the engine by an external parser and type resolver.
//! Nodes are immutable: a rewrite always builds new nodes, and unchanged subtrees
//! are shared between the input and the output tree through `Arc`.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ast::path::PathSegment;
use crate::ast::types::Type;
use crate::diagnostics::{line_column_offset, to_error_source};
use crate::{err_ctx, RecastError};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a span in the source code the tree was parsed from.
///
/// # Examples
///
/// ```rust
/// use recast::ast::Span;
/// let span = Span { start: 0, end: 5 };
/// assert_eq!(span.end - span.start, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One node of the tree: a syntactic construct, its source span and, when the
/// upstream resolver succeeded, its resolved type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    pub value: Arc<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    #[serde(default)]
    pub span: Span,
}

/// Literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Long(i64),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub ty_name: String,
    pub name: String,
}

/// The closed set of syntactic forms. Each variant fixes its child slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    /// A simple or qualified name, e.g. `x` or `java.lang.Integer`.
    Ident(String),
    FieldAccess {
        target: AstNode,
        name: String,
    },
    MethodCall {
        target: Option<AstNode>,
        name: String,
        args: Vec<AstNode>,
        /// The overload bound at this call site.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<crate::ast::types::MethodSignature>,
    },
    /// Object construction `new C(args)`. The constructed type is the node's `ty`.
    NewClass {
        class: String,
        args: Vec<AstNode>,
        /// The constructor overload bound at this site.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constructor: Option<crate::ast::types::MethodSignature>,
    },
    Unary {
        op: UnaryOp,
        operand: AstNode,
    },
    Binary {
        op: BinaryOp,
        lhs: AstNode,
        rhs: AstNode,
    },
    Ternary {
        condition: AstNode,
        then_branch: AstNode,
        else_branch: AstNode,
    },
    Parens(AstNode),
    Assign {
        target: AstNode,
        value: AstNode,
    },
    LocalVar {
        ty_name: String,
        name: String,
        init: Option<AstNode>,
    },
    ExprStmt(AstNode),
    Return(Option<AstNode>),
    If {
        condition: AstNode,
        then_branch: AstNode,
        else_branch: Option<AstNode>,
    },
    Block(Vec<AstNode>),
    Method {
        name: String,
        return_type: String,
        params: Vec<Param>,
        body: Option<AstNode>,
    },
    Field {
        ty_name: String,
        name: String,
        init: Option<AstNode>,
    },
    Class {
        name: String,
        members: Vec<AstNode>,
    },
    CompilationUnit {
        package: Option<String>,
        types: Vec<AstNode>,
    },
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl AstNode {
    /// Wraps an expression with no span and no resolved type.
    pub fn new(expr: Expr) -> Self {
        Self {
            value: Arc::new(expr),
            ty: None,
            span: Span::default(),
        }
    }

    /// Attaches a resolved type.
    pub fn typed(mut self, ty: impl Into<Type>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    /// Attaches a source span.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn expr(&self) -> &Expr {
        &self.value
    }

    /// True when both handles point at the very same node instance.
    pub fn is_same_node(&self, other: &AstNode) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self
            .value
            .children()
            .into_iter()
            .map(|(_, child)| child.node_count())
            .sum::<usize>()
    }

    pub fn pretty(&self) -> String {
        self.value.pretty()
    }

    /// Reads a tree serialized by an external parser.
    ///
    /// Nesting depth is unbounded; deep trees grow the stack on the heap
    /// instead of hitting the JSON recursion limit.
    pub fn from_json(text: &str) -> Result<Self, RecastError> {
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let parsed = AstNode::deserialize(serde_stacker::Deserializer::new(&mut de));
        parsed.and_then(|node| de.end().map(|()| node)).map_err(|e| {
            let src = to_error_source("tree.json", text);
            let offset = line_column_offset(text, e.line(), e.column());
            err_ctx!(
                Parse,
                format!("invalid tree: {}", e),
                &src,
                Span {
                    start: offset,
                    end: offset
                }
            )
        })
    }

    pub fn to_json(&self) -> Result<String, RecastError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::err_msg!(Internal, "failed to serialize tree: {}", e))
    }
}

impl Expr {
    /// The child nodes of this expression in slot order, labeled with their slot.
    /// Absent optional slots are skipped.
    pub fn children(&self) -> Vec<(PathSegment, &AstNode)> {
        let mut out = Vec::new();
        match self {
            Expr::Literal(_) | Expr::Ident(_) => {}
            Expr::FieldAccess { target, .. } => push_field(&mut out, "target", target),
            Expr::MethodCall { target, args, .. } => {
                push_optional(&mut out, "target", target);
                push_list(&mut out, "args", args);
            }
            Expr::NewClass { args, .. } => push_list(&mut out, "args", args),
            Expr::Unary { operand, .. } => push_field(&mut out, "operand", operand),
            Expr::Binary { lhs, rhs, .. } => {
                push_field(&mut out, "lhs", lhs);
                push_field(&mut out, "rhs", rhs);
            }
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                push_field(&mut out, "condition", condition);
                push_field(&mut out, "then", then_branch);
                push_field(&mut out, "else", else_branch);
            }
            Expr::Parens(inner) => push_field(&mut out, "inner", inner),
            Expr::Assign { target, value } => {
                push_field(&mut out, "target", target);
                push_field(&mut out, "value", value);
            }
            Expr::LocalVar { init, .. } | Expr::Field { init, .. } => {
                push_optional(&mut out, "init", init)
            }
            Expr::ExprStmt(inner) => push_field(&mut out, "expr", inner),
            Expr::Return(value) => push_optional(&mut out, "value", value),
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => {
                push_field(&mut out, "condition", condition);
                push_field(&mut out, "then", then_branch);
                push_optional(&mut out, "else", else_branch);
            }
            Expr::Block(stmts) => push_list(&mut out, "stmts", stmts),
            Expr::Method { body, .. } => push_optional(&mut out, "body", body),
            Expr::Class { members, .. } => push_list(&mut out, "members", members),
            Expr::CompilationUnit { types, .. } => push_list(&mut out, "types", types),
        }
        out
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Rebuilds this expression with `children` placed into its slots, in the
    /// order [`Expr::children`] reports them. Returns `None` when the number of
    /// children does not fit the slots of this kind.
    pub fn with_children(&self, children: Vec<AstNode>) -> Option<Expr> {
        if children.len() != self.child_count() {
            return None;
        }
        let mut it = children.into_iter();
        let rebuilt = match self {
            Expr::Literal(_) | Expr::Ident(_) => self.clone(),
            Expr::FieldAccess { name, .. } => Expr::FieldAccess {
                target: it.next()?,
                name: name.clone(),
            },
            Expr::MethodCall {
                target,
                name,
                args,
                method,
            } => {
                let target = take_optional(&mut it, target.is_some())?;
                let args = take_list(&mut it, args.len())?;
                Expr::MethodCall {
                    target,
                    name: name.clone(),
                    args,
                    method: method.clone(),
                }
            }
            Expr::NewClass {
                class,
                args,
                constructor,
            } => Expr::NewClass {
                class: class.clone(),
                args: take_list(&mut it, args.len())?,
                constructor: constructor.clone(),
            },
            Expr::Unary { op, .. } => Expr::Unary {
                op: *op,
                operand: it.next()?,
            },
            Expr::Binary { op, .. } => {
                let lhs = it.next()?;
                let rhs = it.next()?;
                Expr::Binary { op: *op, lhs, rhs }
            }
            Expr::Ternary { .. } => {
                let condition = it.next()?;
                let then_branch = it.next()?;
                let else_branch = it.next()?;
                Expr::Ternary {
                    condition,
                    then_branch,
                    else_branch,
                }
            }
            Expr::Parens(_) => Expr::Parens(it.next()?),
            Expr::Assign { .. } => {
                let target = it.next()?;
                let value = it.next()?;
                Expr::Assign { target, value }
            }
            Expr::LocalVar { ty_name, name, init } => Expr::LocalVar {
                ty_name: ty_name.clone(),
                name: name.clone(),
                init: take_optional(&mut it, init.is_some())?,
            },
            Expr::Field { ty_name, name, init } => Expr::Field {
                ty_name: ty_name.clone(),
                name: name.clone(),
                init: take_optional(&mut it, init.is_some())?,
            },
            Expr::ExprStmt(_) => Expr::ExprStmt(it.next()?),
            Expr::Return(value) => Expr::Return(take_optional(&mut it, value.is_some())?),
            Expr::If { else_branch, .. } => {
                let condition = it.next()?;
                let then_branch = it.next()?;
                let else_branch = take_optional(&mut it, else_branch.is_some())?;
                Expr::If {
                    condition,
                    then_branch,
                    else_branch,
                }
            }
            Expr::Block(stmts) => Expr::Block(take_list(&mut it, stmts.len())?),
            Expr::Method {
                name,
                return_type,
                params,
                body,
            } => Expr::Method {
                name: name.clone(),
                return_type: return_type.clone(),
                params: params.clone(),
                body: take_optional(&mut it, body.is_some())?,
            },
            Expr::Class { name, members } => Expr::Class {
                name: name.clone(),
                members: take_list(&mut it, members.len())?,
            },
            Expr::CompilationUnit { package, types } => Expr::CompilationUnit {
                package: package.clone(),
                types: take_list(&mut it, types.len())?,
            },
        };
        Some(rebuilt)
    }

    /// A short name for the kind of this expression, used in traces and errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Ident(_) => "identifier",
            Expr::FieldAccess { .. } => "field access",
            Expr::MethodCall { .. } => "method call",
            Expr::NewClass { .. } => "object construction",
            Expr::Unary { .. } => "unary",
            Expr::Binary { .. } => "binary",
            Expr::Ternary { .. } => "ternary",
            Expr::Parens(_) => "parentheses",
            Expr::Assign { .. } => "assignment",
            Expr::LocalVar { .. } => "local variable",
            Expr::ExprStmt(_) => "expression statement",
            Expr::Return(_) => "return",
            Expr::If { .. } => "if",
            Expr::Block(_) => "block",
            Expr::Method { .. } => "method",
            Expr::Field { .. } => "field",
            Expr::Class { .. } => "class",
            Expr::CompilationUnit { .. } => "compilation unit",
        }
    }

    /// Renders the expression as a single line of Java-like text.
    ///
    /// This is a debugging rendering for traces and diffs, not a formatter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recast::ast::builder::{ident, int, new_object};
    /// let node = new_object("Integer", vec![int(42)]);
    /// assert_eq!(node.pretty(), "new Integer(42)");
    /// ```
    pub fn pretty(&self) -> String {
        match self {
            Expr::Literal(literal) => literal.pretty(),
            Expr::Ident(name) => name.clone(),
            Expr::FieldAccess { target, name } => format!("{}.{}", target.pretty(), name),
            Expr::MethodCall {
                target, name, args, ..
            } => match target {
                Some(target) => format!("{}.{}({})", target.pretty(), name, pretty_args(args)),
                None => format!("{}({})", name, pretty_args(args)),
            },
            Expr::NewClass { class, args, .. } => format!("new {}({})", class, pretty_args(args)),
            Expr::Unary { op, operand } => format!("{}{}", op.symbol(), operand.pretty()),
            Expr::Binary { op, lhs, rhs } => {
                format!("{} {} {}", lhs.pretty(), op.symbol(), rhs.pretty())
            }
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "{} ? {} : {}",
                condition.pretty(),
                then_branch.pretty(),
                else_branch.pretty()
            ),
            Expr::Parens(inner) => format!("({})", inner.pretty()),
            Expr::Assign { target, value } => format!("{} = {}", target.pretty(), value.pretty()),
            Expr::LocalVar { ty_name, name, init } => match init {
                Some(init) => format!("{} {} = {};", ty_name, name, init.pretty()),
                None => format!("{} {};", ty_name, name),
            },
            Expr::ExprStmt(inner) => format!("{};", inner.pretty()),
            Expr::Return(value) => match value {
                Some(value) => format!("return {};", value.pretty()),
                None => "return;".to_string(),
            },
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "if ({}) {} else {}",
                    condition.pretty(),
                    then_branch.pretty(),
                    else_branch.pretty()
                ),
                None => format!("if ({}) {}", condition.pretty(), then_branch.pretty()),
            },
            Expr::Block(stmts) => Self::pretty_block(stmts),
            Expr::Method {
                name,
                return_type,
                params,
                body,
            } => {
                let params = params
                    .iter()
                    .map(|p| format!("{} {}", p.ty_name, p.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                match body {
                    Some(body) => format!("{} {}({}) {}", return_type, name, params, body.pretty()),
                    None => format!("{} {}({});", return_type, name, params),
                }
            }
            Expr::Field { ty_name, name, init } => match init {
                Some(init) => format!("{} {} = {};", ty_name, name, init.pretty()),
                None => format!("{} {};", ty_name, name),
            },
            Expr::Class { name, members } => format!("class {} {}", name, Self::pretty_block(members)),
            Expr::CompilationUnit { package, types } => {
                let mut parts = Vec::new();
                if let Some(package) = package {
                    parts.push(format!("package {};", package));
                }
                parts.extend(types.iter().map(|t| t.pretty()));
                parts.join(" ")
            }
        }
    }

    // ------------------------------------------------------------------------
    // Pretty-printing helpers
    // ------------------------------------------------------------------------

    fn pretty_block(items: &[AstNode]) -> String {
        if items.is_empty() {
            return "{ }".to_string();
        }
        let inner = items
            .iter()
            .map(|item| item.pretty())
            .collect::<Vec<_>>()
            .join(" ");
        format!("{{ {} }}", inner)
    }
}

impl Literal {
    pub fn pretty(&self) -> String {
        match self {
            Literal::Int(v) => v.to_string(),
            Literal::Long(v) => format!("{}L", v),
            Literal::Double(v) => format!("{:?}", v),
            Literal::Bool(v) => v.to_string(),
            Literal::Char(c) => format!("'{}'", c.escape_default()),
            Literal::Str(s) => format!("{:?}", s),
            Literal::Null => "null".to_string(),
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "&" => BinaryOp::BitAnd,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        };
        Some(op)
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn push_field<'a>(out: &mut Vec<(PathSegment, &'a AstNode)>, slot: &str, node: &'a AstNode) {
    out.push((PathSegment::field(slot), node));
}

fn push_optional<'a>(
    out: &mut Vec<(PathSegment, &'a AstNode)>,
    slot: &str,
    node: &'a Option<AstNode>,
) {
    if let Some(node) = node {
        push_field(out, slot, node);
    }
}

fn push_list<'a>(out: &mut Vec<(PathSegment, &'a AstNode)>, slot: &str, nodes: &'a [AstNode]) {
    for (i, node) in nodes.iter().enumerate() {
        out.push((PathSegment::index(slot, i), node));
    }
}

fn take_optional(it: &mut impl Iterator<Item = AstNode>, present: bool) -> Option<Option<AstNode>> {
    if present {
        it.next().map(Some)
    } else {
        Some(None)
    }
}

fn take_list(it: &mut impl Iterator<Item = AstNode>, len: usize) -> Option<Vec<AstNode>> {
    let items: Vec<AstNode> = it.by_ref().take(len).collect();
    (items.len() == len).then_some(items)
}

fn pretty_args(args: &[AstNode]) -> String {
    args.iter()
        .map(|a| a.pretty())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// MODULE EXPORTS
// ============================================================================

pub mod builder;
pub mod path;
pub mod types;

#[cfg(test)]
mod tests {
    use super::builder::*;
    use super::*;

    #[test]
    fn test_with_children_round_trips_slots() {
        let call = static_call("Integer", "valueOf", vec![ident("x")]);
        let children: Vec<AstNode> = call
            .value
            .children()
            .into_iter()
            .map(|(_, c)| c.clone())
            .collect();
        assert_eq!(children.len(), 2);
        let rebuilt = call.value.with_children(children).unwrap();
        assert_eq!(&rebuilt, call.expr());
    }

    #[test]
    fn test_with_children_rejects_wrong_arity() {
        let node = binary(BinaryOp::Add, int(1), int(2));
        assert!(node.value.with_children(vec![int(1)]).is_none());
        assert!(node.value.with_children(vec![int(1), int(2), int(3)]).is_none());
    }

    #[test]
    fn test_children_skip_absent_optional_slots() {
        let ret = return_stmt(None);
        assert!(ret.value.children().is_empty());
        let labels: Vec<String> = if_stmt(ident("c"), block(vec![]), None)
            .value
            .children()
            .into_iter()
            .map(|(seg, _)| seg.to_string())
            .collect();
        assert_eq!(labels, vec!["condition", "then"]);
    }

    #[test]
    fn test_pretty() {
        let node = ternary(ident("flag"), boolean(true), boolean(false));
        assert_eq!(node.pretty(), "flag ? true : false");
        let call = call(Some(ident("name")), "equals", vec![string("admin")]);
        assert_eq!(call.pretty(), "name.equals(\"admin\")");
    }

    #[test]
    fn test_json_round_trip_preserves_types() {
        let tree = new_integer(vec![int(7)], Some(crate::ast::types::PrimitiveKind::Int.into()));
        let json = tree.to_json().unwrap();
        let back = AstNode::from_json(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_json_round_trip_of_deep_chain() {
        let operands = 200;
        let chain = (1..operands).fold(string("s0"), |acc, i| {
            binary(BinaryOp::Add, acc, string(&format!("s{}", i)))
        });
        let tree = compilation_unit(
            None,
            vec![class(
                "Deep",
                vec![method(
                    "String",
                    "concat",
                    &[],
                    Some(block(vec![return_stmt(Some(chain))])),
                )],
            )],
        );
        let back = AstNode::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(back, tree);
        assert_eq!(back.node_count(), tree.node_count());
    }

    #[test]
    fn test_trailing_input_is_rejected() {
        let json = int(1).to_json().unwrap() + " []";
        let err = AstNode::from_json(&json).unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Parse);
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let err = AstNode::from_json("{ \"value\": ").unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Parse);
    }
}
