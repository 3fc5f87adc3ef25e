//! # AST Builder Module
//!
//! Free constructor functions for building annotated trees in-process.
//!
//! An external parser normally hands the engine a tree; these helpers exist for
//! embedders that construct trees directly and for tests. All builders return
//! untyped nodes with a default span unless stated otherwise; attach metadata with
//! [`AstNode::typed`] and [`AstNode::at`].

use crate::ast::types::{MethodSignature, Type};
use crate::ast::{AstNode, BinaryOp, Expr, Literal, Param, UnaryOp};

// ============================================================================
// LITERALS AND NAMES
// ============================================================================

pub fn int(value: i64) -> AstNode {
    AstNode::new(Expr::Literal(Literal::Int(value)))
}

pub fn long(value: i64) -> AstNode {
    AstNode::new(Expr::Literal(Literal::Long(value)))
}

pub fn double(value: f64) -> AstNode {
    AstNode::new(Expr::Literal(Literal::Double(value)))
}

pub fn boolean(value: bool) -> AstNode {
    AstNode::new(Expr::Literal(Literal::Bool(value)))
}

pub fn char_lit(value: char) -> AstNode {
    AstNode::new(Expr::Literal(Literal::Char(value)))
}

pub fn string(value: &str) -> AstNode {
    AstNode::new(Expr::Literal(Literal::Str(value.to_string())))
}

pub fn null() -> AstNode {
    AstNode::new(Expr::Literal(Literal::Null))
}

pub fn ident(name: &str) -> AstNode {
    AstNode::new(Expr::Ident(name.to_string()))
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

pub fn field_access(target: AstNode, name: &str) -> AstNode {
    AstNode::new(Expr::FieldAccess {
        target,
        name: name.to_string(),
    })
}

/// A call with an optional receiver and no bound overload.
pub fn call(target: Option<AstNode>, name: &str, args: Vec<AstNode>) -> AstNode {
    AstNode::new(Expr::MethodCall {
        target,
        name: name.to_string(),
        args,
        method: None,
    })
}

/// A call whose receiver is a (possibly qualified) type name, e.g. `Integer.valueOf(x)`.
pub fn static_call(class: &str, name: &str, args: Vec<AstNode>) -> AstNode {
    call(Some(ident(class)), name, args)
}

/// A call carrying the overload bound by the type resolver.
pub fn resolved_call(
    target: Option<AstNode>,
    name: &str,
    args: Vec<AstNode>,
    method: MethodSignature,
) -> AstNode {
    AstNode::new(Expr::MethodCall {
        target,
        name: name.to_string(),
        args,
        method: Some(method),
    })
}

/// `new class(args)` without any resolved metadata.
pub fn new_object(class: &str, args: Vec<AstNode>) -> AstNode {
    AstNode::new(Expr::NewClass {
        class: class.to_string(),
        args,
        constructor: None,
    })
}

/// `new class(args)` resolved to the class type `fqn`, with the bound constructor
/// taking `parameter_types`.
pub fn resolved_new(class: &str, fqn: &str, args: Vec<AstNode>, parameter_types: Vec<Type>) -> AstNode {
    AstNode::new(Expr::NewClass {
        class: class.to_string(),
        args,
        constructor: Some(MethodSignature::new(fqn, parameter_types)),
    })
    .typed(Type::class(fqn))
}

/// `new Integer(args)` resolved to `java.lang.Integer`; the single-parameter
/// constructor is bound when `parameter` is given, otherwise the overload is unknown.
pub fn new_integer(args: Vec<AstNode>, parameter: Option<Type>) -> AstNode {
    let fqn = "java.lang.Integer";
    let constructor = parameter.map(|p| MethodSignature::new(fqn, vec![p]));
    AstNode::new(Expr::NewClass {
        class: "Integer".to_string(),
        args,
        constructor,
    })
    .typed(Type::class(fqn))
}

pub fn unary(op: UnaryOp, operand: AstNode) -> AstNode {
    AstNode::new(Expr::Unary { op, operand })
}

pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> AstNode {
    AstNode::new(Expr::Binary { op, lhs, rhs })
}

pub fn ternary(condition: AstNode, then_branch: AstNode, else_branch: AstNode) -> AstNode {
    AstNode::new(Expr::Ternary {
        condition,
        then_branch,
        else_branch,
    })
}

pub fn parens(inner: AstNode) -> AstNode {
    AstNode::new(Expr::Parens(inner))
}

pub fn assign(target: AstNode, value: AstNode) -> AstNode {
    AstNode::new(Expr::Assign { target, value })
}

// ============================================================================
// STATEMENTS AND DECLARATIONS
// ============================================================================

pub fn local_var(ty_name: &str, name: &str, init: Option<AstNode>) -> AstNode {
    AstNode::new(Expr::LocalVar {
        ty_name: ty_name.to_string(),
        name: name.to_string(),
        init,
    })
}

pub fn expr_stmt(expr: AstNode) -> AstNode {
    AstNode::new(Expr::ExprStmt(expr))
}

pub fn return_stmt(value: Option<AstNode>) -> AstNode {
    AstNode::new(Expr::Return(value))
}

pub fn if_stmt(condition: AstNode, then_branch: AstNode, else_branch: Option<AstNode>) -> AstNode {
    AstNode::new(Expr::If {
        condition,
        then_branch,
        else_branch,
    })
}

pub fn block(stmts: Vec<AstNode>) -> AstNode {
    AstNode::new(Expr::Block(stmts))
}

/// A method declaration; `params` are `(type, name)` pairs.
pub fn method(return_type: &str, name: &str, params: &[(&str, &str)], body: Option<AstNode>) -> AstNode {
    let params = params
        .iter()
        .map(|(ty_name, name)| Param {
            ty_name: ty_name.to_string(),
            name: name.to_string(),
        })
        .collect();
    AstNode::new(Expr::Method {
        name: name.to_string(),
        return_type: return_type.to_string(),
        params,
        body,
    })
}

pub fn field_decl(ty_name: &str, name: &str, init: Option<AstNode>) -> AstNode {
    AstNode::new(Expr::Field {
        ty_name: ty_name.to_string(),
        name: name.to_string(),
        init,
    })
}

pub fn class(name: &str, members: Vec<AstNode>) -> AstNode {
    AstNode::new(Expr::Class {
        name: name.to_string(),
        members,
    })
}

pub fn compilation_unit(package: Option<&str>, types: Vec<AstNode>) -> AstNode {
    AstNode::new(Expr::CompilationUnit {
        package: package.map(str::to_string),
        types,
    })
}
