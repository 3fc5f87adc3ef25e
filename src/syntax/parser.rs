//! Snippet parser: compiles example fragments into skeletons.
//!
//! Snippets are compiled once, when a rule is constructed. Dotted names without
//! a call fold into a single qualified identifier (`java.lang.Integer`), so
//! `a.b.c(x)` is a call of `c` on the receiver `a.b`.

use pest::{error::Error, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::ast::{BinaryOp, Literal, Span, UnaryOp};
use crate::diagnostics::{to_error_source, SourceArc};
use crate::rules::skeleton::{Skeleton, TypeConstraint};
use crate::{err_ctx, RecastError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SnippetParser;

const CONSTRAINT_HELP: &str =
    "use any, primitive, numeric, a primitive keyword, String or a fully-qualified class name, optionally followed by []";

/// Which side of a rule a snippet is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetRole {
    /// Holes may carry type constraints.
    Pattern,
    /// Holes are plain slots.
    Template,
}

struct SnippetSource {
    source: SourceArc,
    role: SnippetRole,
}

impl SnippetSource {
    fn error(&self, message: impl std::fmt::Display, span: Span) -> RecastError {
        err_ctx!(Parse, message, &self.source, span)
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses one snippet into a skeleton.
pub fn parse_snippet(text: &str, role: SnippetRole) -> Result<Skeleton, RecastError> {
    let ctx = SnippetSource {
        source: to_error_source("snippet", text),
        role,
    };
    if text.trim().is_empty() {
        return Err(ctx.error("empty snippet", Span::default()));
    }

    let mut pairs = SnippetParser::parse(Rule::snippet, text).map_err(|e| convert_parse_error(e, &ctx))?;
    let snippet = pairs
        .next()
        .ok_or_else(|| ctx.error("empty snippet", Span::default()))?;
    let span = get_span(&snippet);
    let expr = snippet
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| ctx.error("expected an expression", span))?;
    build(expr, &ctx)
}

// ============================================================================
// SKELETON BUILDERS
// ============================================================================

fn build(pair: Pair<Rule>, ctx: &SnippetSource) -> Result<Skeleton, RecastError> {
    let span = get_span(&pair);

    match pair.as_rule() {
        Rule::expr | Rule::primary | Rule::literal => build(first_inner(pair, ctx)?, ctx),

        Rule::ternary => {
            let mut inner = pair.into_inner();
            let condition = build(expect(inner.next(), ctx, span, "condition")?, ctx)?;
            match inner.next() {
                None => Ok(condition),
                Some(then_pair) => {
                    let then_branch = build(then_pair, ctx)?;
                    let else_branch = build(expect(inner.next(), ctx, span, "else branch")?, ctx)?;
                    Ok(Skeleton::ternary(condition, then_branch, else_branch))
                }
            }
        }

        Rule::logic_or
        | Rule::logic_and
        | Rule::bit_or
        | Rule::bit_xor
        | Rule::bit_and
        | Rule::equality
        | Rule::relational
        | Rule::additive
        | Rule::multiplicative => build_binary(pair, ctx),

        Rule::unary => {
            let mut inner = pair.into_inner();
            let first = expect(inner.next(), ctx, span, "operand")?;
            if first.as_rule() != Rule::op_unary {
                return build(first, ctx);
            }
            let op = match first.as_str() {
                "!" => UnaryOp::Not,
                "-" => UnaryOp::Neg,
                _ => UnaryOp::Plus,
            };
            let operand = build(expect(inner.next(), ctx, span, "operand")?, ctx)?;
            Ok(Skeleton::unary(op, operand))
        }

        Rule::postfix => build_postfix(pair, ctx),

        Rule::invocation => {
            let mut inner = pair.into_inner();
            let name = expect(inner.next(), ctx, span, "method name")?.as_str().to_string();
            let args = build_arguments(expect(inner.next(), ctx, span, "arguments")?, ctx)?;
            Ok(Skeleton::call(None, &name, args))
        }

        Rule::creation => {
            let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::kw_new);
            let class = expect(inner.next(), ctx, span, "class name")?.as_str().to_string();
            let args = build_arguments(expect(inner.next(), ctx, span, "arguments")?, ctx)?;
            Ok(Skeleton::new_class(&class, args))
        }

        Rule::parens => Ok(Skeleton::parens(build(first_inner(pair, ctx)?, ctx)?)),

        Rule::hole => build_hole(pair, ctx),

        Rule::identifier | Rule::qualified_name => Ok(Skeleton::ident(pair.as_str())),

        Rule::null_lit => Ok(Skeleton::literal(Literal::Null)),

        Rule::bool_lit => Ok(Skeleton::literal(Literal::Bool(pair.as_str() == "true"))),

        Rule::int_lit => {
            let value = pair
                .as_str()
                .parse::<i64>()
                .map_err(|_| ctx.error(format!("integer literal `{}` out of range", pair.as_str()), span))?;
            Ok(Skeleton::literal(Literal::Int(value)))
        }

        Rule::long_lit => {
            let digits = pair.as_str().trim_end_matches(['L', 'l']);
            let value = digits
                .parse::<i64>()
                .map_err(|_| ctx.error(format!("long literal `{}` out of range", pair.as_str()), span))?;
            Ok(Skeleton::literal(Literal::Long(value)))
        }

        Rule::double_lit => {
            let value = pair
                .as_str()
                .parse::<f64>()
                .map_err(|_| ctx.error(format!("invalid double literal `{}`", pair.as_str()), span))?;
            Ok(Skeleton::literal(Literal::Double(value)))
        }

        Rule::string_lit => {
            let inner = first_inner(pair, ctx)?;
            Ok(Skeleton::literal(Literal::Str(unescape(inner.as_str()))))
        }

        Rule::char_lit => {
            let inner = first_inner(pair, ctx)?;
            let text = unescape(inner.as_str());
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Skeleton::literal(Literal::Char(c))),
                _ => Err(ctx.error("invalid character literal", span)),
            }
        }

        rule => Err(ctx.error(format!("unsupported construct: {:?}", rule), span)),
    }
}

fn build_binary(pair: Pair<Rule>, ctx: &SnippetSource) -> Result<Skeleton, RecastError> {
    let span = get_span(&pair);
    let mut inner = pair.into_inner();
    let mut lhs = build(expect(inner.next(), ctx, span, "left operand")?, ctx)?;
    while let Some(op_pair) = inner.next() {
        let op = BinaryOp::from_symbol(op_pair.as_str()).ok_or_else(|| {
            ctx.error(format!("unknown operator `{}`", op_pair.as_str()), get_span(&op_pair))
        })?;
        let rhs = build(expect(inner.next(), ctx, span, "right operand")?, ctx)?;
        lhs = Skeleton::binary(op, lhs, rhs);
    }
    Ok(lhs)
}

fn build_postfix(pair: Pair<Rule>, ctx: &SnippetSource) -> Result<Skeleton, RecastError> {
    let span = get_span(&pair);
    let mut inner = pair.into_inner();
    let mut base = build(expect(inner.next(), ctx, span, "expression")?, ctx)?;
    for selector in inner {
        let selector_span = get_span(&selector);
        let mut parts = selector.into_inner();
        let name = expect(parts.next(), ctx, selector_span, "member name")?.as_str().to_string();
        base = match parts.next() {
            Some(args) => Skeleton::call(Some(base), &name, build_arguments(args, ctx)?),
            None => match base {
                Skeleton::Ident(qualified) => Skeleton::Ident(format!("{}.{}", qualified, name)),
                other => Skeleton::field_access(other, &name),
            },
        };
    }
    Ok(base)
}

fn build_arguments(pair: Pair<Rule>, ctx: &SnippetSource) -> Result<Vec<Skeleton>, RecastError> {
    pair.into_inner().map(|arg| build(arg, ctx)).collect()
}

fn build_hole(pair: Pair<Rule>, ctx: &SnippetSource) -> Result<Skeleton, RecastError> {
    let span = get_span(&pair);
    let mut inner = pair.into_inner();
    let name = expect(inner.next(), ctx, span, "hole name")?.as_str().to_string();
    let Some(constraint) = inner.next() else {
        return Ok(Skeleton::hole(&name));
    };
    let constraint_span = get_span(&constraint);
    if ctx.role == SnippetRole::Template {
        return Err(err_ctx!(
            Parse,
            format!("template slot `{}` cannot carry a type constraint", name),
            &ctx.source,
            constraint_span,
            "constraints belong on the matching hole of the pattern"
        ));
    }
    let constraint = TypeConstraint::parse(constraint.as_str()).map_err(|e| {
        err_ctx!(Parse, e.message(), &ctx.source, constraint_span, CONSTRAINT_HELP)
    })?;
    Ok(Skeleton::typed_hole(&name, constraint))
}

// ============================================================================
// UTILITIES
// ============================================================================

fn get_span(pair: &Pair<Rule>) -> Span {
    Span {
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    }
}

fn first_inner<'i>(pair: Pair<'i, Rule>, ctx: &SnippetSource) -> Result<Pair<'i, Rule>, RecastError> {
    let span = get_span(&pair);
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .ok_or_else(|| ctx.error(format!("malformed {:?}", rule), span))
}

fn expect<'i>(
    pair: Option<Pair<'i, Rule>>,
    ctx: &SnippetSource,
    span: Span,
    element: &str,
) -> Result<Pair<'i, Rule>, RecastError> {
    pair.ok_or_else(|| ctx.error(format!("missing {}", element), span))
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}

fn convert_parse_error(error: Error<Rule>, ctx: &SnippetSource) -> RecastError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => Span { start: pos, end: pos },
        pest::error::InputLocation::Span((start, end)) => Span { start, end },
    };
    let rendered = error.to_string();
    let message = if rendered.contains("arguments") || rendered.contains("expected \")\"") {
        "malformed snippet: unbalanced parentheses or arguments".to_string()
    } else {
        format!("malformed snippet: {}", error.variant.message())
    };
    ctx.error(message, span)
}
