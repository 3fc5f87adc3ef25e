//! Shared fixtures: small annotated Java-like trees and rule sets.

#![allow(dead_code)]

use recast::ast::builder::*;
use recast::ast::types::{PrimitiveKind, Type};
use recast::ast::{AstNode, Span};
use recast::rules::{RuleRegistry, RuleSet};

pub fn int_type() -> Type {
    PrimitiveKind::Int.into()
}

/// `new Integer(arg)` with the constructor overload taking `parameter`.
pub fn boxing_site(arg: AstNode, parameter: Type) -> AstNode {
    new_integer(vec![arg], Some(parameter)).at(Span { start: 120, end: 134 })
}

/// `new Long(arg)` with the constructor overload taking `parameter`.
pub fn long_boxing_site(arg: AstNode, parameter: Type) -> AstNode {
    resolved_new("Long", "java.lang.Long", vec![arg], vec![parameter]).at(Span { start: 210, end: 221 })
}

/// `m`, a long parameter reference.
pub fn long_arg() -> AstNode {
    ident("m").typed(PrimitiveKind::Long).at(Span { start: 219, end: 220 })
}

/// `n`, an int parameter reference.
pub fn int_arg() -> AstNode {
    ident("n").typed(PrimitiveKind::Int).at(Span { start: 132, end: 133 })
}

/// `s`, a String parameter reference.
pub fn string_arg() -> AstNode {
    ident("s").typed(Type::string()).at(Span { start: 132, end: 133 })
}

/// `flag ? true : false` where `flag` is a boolean.
pub fn boolean_ternary(then_value: bool) -> AstNode {
    ternary(
        ident("flag").typed(PrimitiveKind::Boolean),
        boolean(then_value),
        boolean(!then_value),
    )
    .typed(PrimitiveKind::Boolean)
}

/// ```java
/// package com.example;
/// class Counter {
///     int count = 0;
///     Integer boxed(int n) { return <site>; }
///     boolean isAdmin(String name) { return name.equals("admin"); }
/// }
/// ```
pub fn counter_unit(site: AstNode) -> AstNode {
    compilation_unit(
        Some("com.example"),
        vec![class(
            "Counter",
            vec![
                field_decl("int", "count", Some(int(0))),
                method(
                    "Integer",
                    "boxed",
                    &[("int", "n")],
                    Some(block(vec![return_stmt(Some(site))])),
                ),
                method(
                    "boolean",
                    "isAdmin",
                    &[("String", "name")],
                    Some(block(vec![return_stmt(Some(call(
                        Some(ident("name")),
                        "equals",
                        vec![string("admin")],
                    )))])),
                ),
            ],
        )],
    )
}

pub fn standard_rules(names: &[&str]) -> RuleSet {
    RuleRegistry::standard()
        .expect("standard catalog")
        .select(names)
        .expect("known rules")
}

/// Follows a dotted path such as `types[0].members[1].body`.
pub fn node_at<'a>(tree: &'a AstNode, path: &str) -> &'a AstNode {
    if path.is_empty() {
        return tree;
    }
    path.split('.').fold(tree, |node: &'a AstNode, segment| {
        node.value
            .children()
            .into_iter()
            .find(|(slot, _)| slot.to_string() == segment)
            .map(|(_, child)| child)
            .unwrap_or_else(|| panic!("no child `{}` under {}", segment, node.pretty()))
    })
}

pub const SITE_PATH: &str = "types[0].members[1].body.stmts[0].value";
pub const IS_ADMIN_PATH: &str = "types[0].members[2]";
pub const FIELD_PATH: &str = "types[0].members[0]";
