//! The built-in rule catalog.
//!
//! The catalog is compiled from snippets once per process and shared.

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::rules::registry::RuleRegistry;
use crate::rules::rule::Rule;
use crate::{err_msg, RecastError};

pub const USE_INTEGER_VALUE_OF: &str = "use-integer-value-of";
pub const USE_LONG_VALUE_OF: &str = "use-long-value-of";
pub const SIMPLIFY_BOOLEAN_TERNARY: &str = "simplify-boolean-ternary";

static STANDARD_RULES: Lazy<Result<Vec<Arc<Rule>>, String>> = Lazy::new(|| {
    build_std_rules()
        .map(|rules| rules.into_iter().map(Arc::new).collect())
        .map_err(|e| format!("{:?}", miette::Report::new(e)))
});

/// Registers every built-in rule, in catalog order.
pub fn register_std_rules(registry: &mut RuleRegistry) -> Result<(), RecastError> {
    let rules = STANDARD_RULES
        .as_ref()
        .map_err(|e| err_msg!(Internal, "built-in rule catalog failed to compile: {}", e))?;
    for rule in rules {
        registry.register(Arc::clone(rule));
    }
    Ok(())
}

fn build_std_rules() -> Result<Vec<Rule>, RecastError> {
    Ok(vec![
        Rule::builder(USE_INTEGER_VALUE_OF)
            .display_name("Use Integer.valueOf and Integer.parseInt")
            .description("Replaces the deprecated boxing constructor `new Integer(..)` with the equivalent factory call.")
            .typed_snippet(
                "numeric",
                "new java.lang.Integer(#{x:numeric})",
                "Integer.valueOf(#{x})",
                "java.lang.Integer",
            )
            .typed_snippet("string", "new java.lang.Integer(#{x:String})", "Integer.parseInt(#{x})", "int")
            .build()?,
        Rule::builder(USE_LONG_VALUE_OF)
            .display_name("Use Long.valueOf and Long.parseLong")
            .description("Replaces the deprecated boxing constructor `new Long(..)` with the equivalent factory call.")
            .typed_snippet(
                "numeric",
                "new java.lang.Long(#{x:numeric})",
                "Long.valueOf(#{x})",
                "java.lang.Long",
            )
            .typed_snippet("string", "new java.lang.Long(#{x:String})", "Long.parseLong(#{x})", "long")
            .build()?,
        Rule::builder(SIMPLIFY_BOOLEAN_TERNARY)
            .display_name("Simplify boolean ternary")
            .description("Replaces `c ? true : false` with `c` and `c ? false : true` with `!(c)`.")
            .snippet("identity", "#{c} ? true : false", "#{c}")
            .typed_snippet("negation", "#{c} ? false : true", "!(#{c})", "boolean")
            .build()?,
    ])
}
