mod common;

use pretty_assertions::assert_eq;

use common::*;
use recast::ast::builder::*;
use recast::ast::types::{MethodSignature, PrimitiveKind, Type};
use recast::ast::{AstNode, BinaryOp, Expr};
use recast::diagnostics::ErrorType;
use recast::engine::{apply_all, Engine, TraversalConfig, TraversalMode};
use recast::rules::std::{SIMPLIFY_BOOLEAN_TERNARY, USE_INTEGER_VALUE_OF, USE_LONG_VALUE_OF};
use recast::rules::{Rule, RuleRegistry, RuleSet};

fn integer_rules() -> RuleSet {
    standard_rules(&[USE_INTEGER_VALUE_OF])
}

fn call_parts(node: &AstNode) -> (String, String, Vec<AstNode>) {
    match node.expr() {
        Expr::MethodCall {
            target: Some(target),
            name,
            args,
            ..
        } => (target.pretty(), name.clone(), args.clone()),
        other => panic!("expected a qualified call, found {}", other.pretty()),
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn numeric_constructor_becomes_value_of() {
    let arg = int_arg();
    let tree = counter_unit(boxing_site(arg.clone(), int_type()));
    let out = apply_all(&tree, &integer_rules()).unwrap();

    let (receiver, name, args) = call_parts(node_at(&out, SITE_PATH));
    assert_eq!(receiver, "Integer");
    assert_eq!(name, "valueOf");
    assert_eq!(args.len(), 1);
    assert!(args[0].is_same_node(&arg));
}

#[test]
fn string_constructor_becomes_parse_int() {
    let arg = string_arg();
    let tree = counter_unit(boxing_site(arg.clone(), Type::string()));
    let out = apply_all(&tree, &integer_rules()).unwrap();

    let (receiver, name, args) = call_parts(node_at(&out, SITE_PATH));
    assert_eq!(receiver, "Integer");
    assert_eq!(name, "parseInt");
    assert!(args[0].is_same_node(&arg));
}

#[test]
fn no_argument_constructor_is_left_alone() {
    let site = AstNode::new(Expr::NewClass {
        class: "Integer".to_string(),
        args: vec![],
        constructor: Some(MethodSignature::new("java.lang.Integer", vec![])),
    })
    .typed(Type::class("java.lang.Integer"));
    let tree = counter_unit(site);
    let out = apply_all(&tree, &integer_rules()).unwrap();
    assert!(out.is_same_node(&tree));
}

#[test]
fn independent_rules_apply_in_one_pass() {
    let tree = compilation_unit(
        None,
        vec![class(
            "Flags",
            vec![
                method(
                    "Integer",
                    "boxed",
                    &[("int", "n")],
                    Some(block(vec![return_stmt(Some(boxing_site(int_arg(), int_type())))])),
                ),
                method(
                    "boolean",
                    "isSet",
                    &[("boolean", "flag")],
                    Some(block(vec![return_stmt(Some(boolean_ternary(true)))])),
                ),
            ],
        )],
    );
    let rules = standard_rules(&[USE_INTEGER_VALUE_OF, SIMPLIFY_BOOLEAN_TERNARY]);
    let engine = Engine::new(rules, TraversalConfig::default());
    let outcome = engine.run(&tree).unwrap();

    assert_eq!(outcome.passes, 1);
    let applied: Vec<(String, String)> = outcome
        .trace
        .iter()
        .map(|s| (s.rule.clone(), s.path.to_string()))
        .collect();
    assert_eq!(
        applied,
        vec![
            (
                USE_INTEGER_VALUE_OF.to_string(),
                "types[0].members[0].body.stmts[0].value".to_string()
            ),
            (
                SIMPLIFY_BOOLEAN_TERNARY.to_string(),
                "types[0].members[1].body.stmts[0].value".to_string()
            ),
        ]
    );
    assert_eq!(
        outcome.tree.pretty(),
        "class Flags { Integer boxed(int n) { return Integer.valueOf(n); } \
         boolean isSet(boolean flag) { return flag; } }"
    );
}

#[test]
fn unresolved_metadata_is_not_an_error() {
    let site = new_integer(vec![ident("n")], None);
    let tree = counter_unit(site);
    let out = apply_all(&tree, &integer_rules()).unwrap();
    assert!(out.is_same_node(&tree));
}

#[test]
fn long_constructors_become_value_of_and_parse_long() {
    let rules = standard_rules(&[USE_LONG_VALUE_OF]);

    let arg = long_arg();
    let out = apply_all(&long_boxing_site(arg.clone(), PrimitiveKind::Long.into()), &rules).unwrap();
    let (receiver, name, args) = call_parts(&out);
    assert_eq!((receiver.as_str(), name.as_str()), ("Long", "valueOf"));
    assert!(args[0].is_same_node(&arg));
    assert_eq!(out.ty, Some(Type::class("java.lang.Long")));

    let arg = string_arg();
    let out = apply_all(&long_boxing_site(arg.clone(), Type::string()), &rules).unwrap();
    let (receiver, name, args) = call_parts(&out);
    assert_eq!((receiver.as_str(), name.as_str()), ("Long", "parseLong"));
    assert!(args[0].is_same_node(&arg));
    assert_eq!(out.ty, Some(Type::Primitive(PrimitiveKind::Long)));
}

#[test]
fn long_rule_ignores_integer_construction() {
    let tree = counter_unit(boxing_site(int_arg(), int_type()));
    let out = apply_all(&tree, &standard_rules(&[USE_LONG_VALUE_OF])).unwrap();
    assert!(out.is_same_node(&tree));
}

#[test]
fn parse_int_result_is_typed_int_for_later_rules() {
    // `Integer.parseInt(s) + 1`: the rewritten operand is an `int`, so an
    // int-only rule applies to the enclosing addition in the same pass.
    let add_exact = Rule::builder("use-add-exact")
        .snippet("ints", "#{a:int} + #{b:int}", "Math.addExact(#{a}, #{b})")
        .build()
        .unwrap();
    let mut registry = RuleRegistry::standard().unwrap();
    registry.register(add_exact);
    let rules = registry.select(&[USE_INTEGER_VALUE_OF, "use-add-exact"]).unwrap();

    let tree = binary(
        BinaryOp::Add,
        boxing_site(string_arg(), Type::string()),
        int(1).typed(PrimitiveKind::Int),
    );
    let out = apply_all(&tree, &rules).unwrap();
    assert_eq!(out.pretty(), "Math.addExact(Integer.parseInt(s), 1)");

    // `Integer.valueOf` yields a boxed Integer, which `int` does not admit.
    let tree = binary(
        BinaryOp::Add,
        boxing_site(int_arg(), int_type()),
        int(1).typed(PrimitiveKind::Int),
    );
    let out = apply_all(&tree, &rules).unwrap();
    assert_eq!(out.pretty(), "Integer.valueOf(n) + 1");
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn second_pass_changes_nothing_for_every_standard_rule() {
    let tree = compilation_unit(
        Some("com.example"),
        vec![class(
            "Mixed",
            vec![
                method(
                    "Integer",
                    "boxInt",
                    &[("int", "n")],
                    Some(block(vec![return_stmt(Some(boxing_site(int_arg(), int_type())))])),
                ),
                method(
                    "Long",
                    "parse",
                    &[("String", "s")],
                    Some(block(vec![return_stmt(Some(long_boxing_site(
                        string_arg(),
                        Type::string(),
                    )))])),
                ),
                method(
                    "boolean",
                    "isSet",
                    &[("boolean", "flag")],
                    Some(block(vec![
                        expr_stmt(boolean_ternary(true)),
                        return_stmt(Some(boolean_ternary(false))),
                    ])),
                ),
            ],
        )],
    );
    let rules = RuleRegistry::standard().unwrap().all();
    let engine = Engine::new(rules.clone(), TraversalConfig::default());

    let first = engine.run(&tree).unwrap();
    let applied: Vec<&str> = first.trace.iter().map(|s| s.rule.as_str()).collect();
    assert_eq!(
        applied,
        vec![
            USE_INTEGER_VALUE_OF,
            USE_LONG_VALUE_OF,
            SIMPLIFY_BOOLEAN_TERNARY,
            SIMPLIFY_BOOLEAN_TERNARY
        ]
    );

    let second = engine.run(&first.tree).unwrap();
    assert!(second.trace.is_empty());
    assert!(second.tree.is_same_node(&first.tree));
    assert!(apply_all(&first.tree, &rules).unwrap().is_same_node(&first.tree));
}

#[test]
fn second_pass_changes_nothing() {
    let tree = counter_unit(boxing_site(int_arg(), int_type()));
    let rules = standard_rules(&[USE_INTEGER_VALUE_OF, SIMPLIFY_BOOLEAN_TERNARY]);
    let once = apply_all(&tree, &rules).unwrap();
    assert!(!once.is_same_node(&tree));
    let twice = apply_all(&once, &rules).unwrap();
    assert!(twice.is_same_node(&once));
}

#[test]
fn unrelated_subtrees_are_shared() {
    let tree = counter_unit(boxing_site(int_arg(), int_type()));
    let out = apply_all(&tree, &integer_rules()).unwrap();

    assert!(node_at(&out, FIELD_PATH).is_same_node(node_at(&tree, FIELD_PATH)));
    assert!(node_at(&out, IS_ADMIN_PATH).is_same_node(node_at(&tree, IS_ADMIN_PATH)));
    // The rebuilt ancestors keep their own metadata.
    assert_eq!(node_at(&out, "types[0]").span, node_at(&tree, "types[0]").span);
}

#[test]
fn captured_argument_keeps_type_and_span() {
    let arg = binary(BinaryOp::Add, int_arg(), int(1))
        .typed(PrimitiveKind::Int)
        .at(recast::ast::Span { start: 132, end: 137 });
    let site = boxing_site(arg.clone(), int_type());
    let out = apply_all(&site, &integer_rules()).unwrap();

    let (_, _, args) = call_parts(&out);
    assert_eq!(args[0], arg);
    assert!(args[0].is_same_node(&arg));
    assert_eq!(out.span, site.span);
    assert_eq!(out.ty, site.ty);
}

#[test]
fn selection_uses_bound_parameter_type() {
    // The argument expression is a String, but the bound overload takes int.
    let site = boxing_site(string_arg(), int_type());
    let out = apply_all(&site, &integer_rules()).unwrap();
    assert_eq!(call_parts(&out).1, "valueOf");

    // A numeric argument passed to the String overload selects parseInt.
    let site = boxing_site(int_arg(), Type::string());
    let out = apply_all(&site, &integer_rules()).unwrap();
    assert_eq!(call_parts(&out).1, "parseInt");
}

#[test]
fn two_argument_constructor_is_left_alone() {
    let site = AstNode::new(Expr::NewClass {
        class: "Integer".to_string(),
        args: vec![int_arg(), int(10)],
        constructor: Some(MethodSignature::new(
            "java.lang.Integer",
            vec![PrimitiveKind::Int.into(), PrimitiveKind::Int.into()],
        )),
    })
    .typed(Type::class("java.lang.Integer"));
    let out = apply_all(&site, &integer_rules()).unwrap();
    assert!(out.is_same_node(&site));
}

#[test]
fn stale_signature_arity_is_unresolved() {
    // One argument, but the recorded overload has two parameters.
    let site = AstNode::new(Expr::NewClass {
        class: "Integer".to_string(),
        args: vec![int_arg()],
        constructor: Some(MethodSignature::new(
            "java.lang.Integer",
            vec![PrimitiveKind::Int.into(), PrimitiveKind::Int.into()],
        )),
    })
    .typed(Type::class("java.lang.Integer"));
    let out = apply_all(&site, &integer_rules()).unwrap();
    assert!(out.is_same_node(&site));
}

// ============================================================================
// ORDERING AND PASSES
// ============================================================================

fn rule(name: &str, before: &str, after: &str) -> Rule {
    Rule::builder(name).snippet("only", before, after).build().unwrap()
}

#[test]
fn earlier_rule_wins_on_the_same_node() {
    let unwrap = rule("unwrap-parens", "(#{e})", "#{e}");
    let stringify = rule("stringify-parens", "(#{e})", "String.valueOf(#{e})");
    let tree = parens(ident("x"));

    let first = RuleSet::new(vec![unwrap.clone(), stringify.clone()]).unwrap();
    assert_eq!(apply_all(&tree, &first).unwrap().pretty(), "x");

    let second = RuleSet::new(vec![stringify, unwrap]).unwrap();
    assert_eq!(apply_all(&tree, &second).unwrap().pretty(), "String.valueOf(x)");
}

#[test]
fn replacement_is_not_revisited_within_a_pass() {
    let grow = rule("grow", "#{a} + #{b}", "(#{a} + #{b}) + 0");
    let rules = RuleSet::new(vec![grow]).unwrap();
    let tree = binary(BinaryOp::Add, ident("x"), ident("y"));
    let (out, steps) = Engine::new(rules, TraversalConfig::default())
        .apply_pass(&tree, 1)
        .unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(out.pretty(), "(x + y) + 0");
}

#[test]
fn fixed_point_stops_when_nothing_changes() {
    let rules = standard_rules(&[SIMPLIFY_BOOLEAN_TERNARY]);
    let tree = ternary(boolean_ternary(false), boolean(true), boolean(false));
    let config = TraversalConfig {
        mode: TraversalMode::FixedPoint,
        ..TraversalConfig::default()
    };
    let outcome = Engine::new(rules, config).run(&tree).unwrap();
    assert!(outcome.converged);
    assert_eq!(outcome.passes, 2);
    assert_eq!(outcome.tree.pretty(), "!(flag)");
}

#[test]
fn fixed_point_reports_non_convergence() {
    let commute = rule("commute-addition", "#{a} + #{b}", "#{b} + #{a}");
    let rules = RuleSet::new(vec![commute]).unwrap();
    let config = TraversalConfig {
        mode: TraversalMode::FixedPoint,
        max_passes: 4,
        parallel: false,
    };
    let tree = binary(BinaryOp::Add, ident("x"), ident("y"));
    let err = Engine::new(rules, config).run(&tree).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Traversal);
    assert!(err.message().contains("4 passes"));
}

// ============================================================================
// PARALLELISM
// ============================================================================

fn wide_class(methods: usize) -> AstNode {
    let members = (0..methods)
        .map(|i| {
            let site = if i % 3 == 0 {
                boxing_site(string_arg(), Type::string())
            } else {
                boxing_site(int_arg(), int_type())
            };
            let check = if i % 2 == 0 {
                boolean_ternary(true)
            } else {
                boolean_ternary(false)
            };
            method(
                "Integer",
                &format!("m{}", i),
                &[("int", "n")],
                Some(block(vec![
                    expr_stmt(check),
                    return_stmt(Some(site)),
                ])),
            )
        })
        .collect();
    compilation_unit(Some("com.example"), vec![class("Wide", members)])
}

#[test]
fn parallel_pass_matches_sequential_pass() {
    let tree = wide_class(48);
    let rules = standard_rules(&[USE_INTEGER_VALUE_OF, SIMPLIFY_BOOLEAN_TERNARY]);

    let sequential = Engine::new(rules.clone(), TraversalConfig::default())
        .run(&tree)
        .unwrap();
    let parallel = Engine::new(
        rules,
        TraversalConfig {
            parallel: true,
            ..TraversalConfig::default()
        },
    )
    .run(&tree)
    .unwrap();

    assert_eq!(parallel.tree, sequential.tree);
    assert_eq!(parallel.trace, sequential.trace);
    assert_eq!(sequential.trace.len(), 96);
}
