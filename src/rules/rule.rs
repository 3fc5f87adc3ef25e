//! Rules: named bundles of (pattern, template) alternatives.
//!
//! A [`Rule`] is validated once, when it is built, and never changes afterwards.
//! Rules are plain immutable data and are shared across threads by reference.
//!
//! # Example
//! ```rust
//! use recast::rules::Rule;
//! let rule = Rule::builder("use-integer-value-of")
//!     .description("Replace boxing constructors with factory calls")
//!     .snippet("numeric", "new java.lang.Integer(#{x:numeric})", "Integer.valueOf(#{x})")
//!     .snippet("string", "new java.lang.Integer(#{x:String})", "Integer.parseInt(#{x})")
//!     .build()
//!     .unwrap();
//! assert_eq!(rule.alternatives().len(), 2);
//! ```

use std::collections::BTreeSet;

use crate::ast::types::Type;
use crate::rules::pattern::Pattern;
use crate::rules::template::Template;
use crate::syntax::{parse_pattern, parse_template};
use crate::{err_msg, RecastError};

/// One way a rule can apply: a pattern and the template replacing its matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub label: Option<String>,
    pub pattern: Pattern,
    pub template: Template,
}

impl Alternative {
    pub fn new(pattern: Pattern, template: Template) -> Self {
        Self {
            label: None,
            pattern,
            template,
        }
    }

    pub fn labeled(label: &str, pattern: Pattern, template: Template) -> Self {
        Self {
            label: Some(label.to_string()),
            pattern,
            template,
        }
    }

    /// Compiles a before/after snippet pair.
    pub fn from_snippets(label: Option<&str>, before: &str, after: &str) -> Result<Self, RecastError> {
        Ok(Self {
            label: label.map(str::to_string),
            pattern: parse_pattern(before)?,
            template: parse_template(after)?,
        })
    }

    /// The label, or `#index` when the alternative is unlabeled.
    pub fn describe(&self, index: usize) -> String {
        self.label.clone().unwrap_or_else(|| format!("#{}", index))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: String,
    display_name: String,
    description: String,
    alternatives: Vec<Alternative>,
}

impl Rule {
    pub fn builder(name: &str) -> RuleBuilder {
        RuleBuilder::new(name)
    }

    /// Stable identifier used for selection and in traces.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }
}

/// Collects the parts of a [`Rule`] and validates them in [`RuleBuilder::build`].
///
/// Snippet compilation errors are remembered and reported by `build`, so a
/// builder chain never needs intermediate `?`.
#[derive(Debug)]
pub struct RuleBuilder {
    name: String,
    display_name: Option<String>,
    description: String,
    alternatives: Vec<Alternative>,
    failure: Option<RecastError>,
}

impl RuleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: None,
            description: String::new(),
            alternatives: Vec::new(),
            failure: None,
        }
    }

    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn alternative(mut self, alternative: Alternative) -> Self {
        self.alternatives.push(alternative);
        self
    }

    /// Adds a labeled alternative compiled from a before/after snippet pair.
    /// The replacement root is left untyped.
    pub fn snippet(self, label: &str, before: &str, after: &str) -> Self {
        self.snippet_alternative(Some(label), before, after, None)
    }

    /// Like [`RuleBuilder::snippet`], declaring the resolved type of the
    /// replacement root (`"int"`, `"java.lang.Integer"`, ...).
    pub fn typed_snippet(self, label: &str, before: &str, after: &str, result_type: &str) -> Self {
        self.snippet_alternative(Some(label), before, after, Some(result_type))
    }

    pub fn snippet_alternative(
        mut self,
        label: Option<&str>,
        before: &str,
        after: &str,
        result_type: Option<&str>,
    ) -> Self {
        let compiled = Alternative::from_snippets(label, before, after).and_then(|alternative| {
            let Some(text) = result_type else {
                return Ok(alternative);
            };
            let ty = Type::parse(text)?;
            Ok(Alternative {
                template: alternative.template.with_result_type(ty),
                ..alternative
            })
        });
        match compiled {
            Ok(alternative) => self.alternatives.push(alternative),
            Err(e) => {
                if self.failure.is_none() {
                    self.failure = Some(e);
                }
            }
        }
        self
    }

    /// Validates and builds the rule.
    ///
    /// # Errors
    /// `RuleConstruction` when the name is empty or contains whitespace, when
    /// there are no alternatives, when a pattern repeats a capture name, when a
    /// template's slots differ from its pattern's captures, or when two
    /// alternatives may match the same node. A snippet that failed to compile
    /// is reported as the cause.
    pub fn build(self) -> Result<Rule, RecastError> {
        let name = self.name;
        if let Some(cause) = self.failure {
            return Err(err_msg!(RuleConstruction, "rule '{}': invalid snippet", name).caused_by(cause));
        }
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(err_msg!(
                RuleConstruction,
                "invalid rule name '{}': names must be non-empty and contain no whitespace",
                name
            ));
        }
        if self.alternatives.is_empty() {
            return Err(err_msg!(RuleConstruction, "rule '{}' has no alternatives", name));
        }

        for (index, alternative) in self.alternatives.iter().enumerate() {
            validate_alternative(&name, index, alternative)?;
        }

        for (i, first) in self.alternatives.iter().enumerate() {
            for (j, second) in self.alternatives.iter().enumerate().skip(i + 1) {
                if first.pattern.overlaps(&second.pattern) {
                    return Err(err_msg!(
                        RuleConstruction,
                        "rule '{}': alternatives {} and {} may match the same node",
                        name,
                        first.describe(i),
                        second.describe(j)
                    )
                    .with_help("make the patterns differ in structure or use disjoint type constraints"));
                }
            }
        }

        let display_name = self.display_name.unwrap_or_else(|| name.clone());
        Ok(Rule {
            name,
            display_name,
            description: self.description,
            alternatives: self.alternatives,
        })
    }
}

fn validate_alternative(rule: &str, index: usize, alternative: &Alternative) -> Result<(), RecastError> {
    let mut seen = BTreeSet::new();
    for capture in alternative.pattern.capture_names() {
        if !seen.insert(capture) {
            return Err(err_msg!(
                RuleConstruction,
                "rule '{}', alternative {}: capture `{}` appears more than once",
                rule,
                alternative.describe(index),
                capture
            ));
        }
    }

    let captures = alternative.pattern.capture_set();
    let slots = alternative.template.slot_names();
    if captures != slots {
        let unbound: Vec<_> = slots.difference(&captures).cloned().collect();
        let unused: Vec<_> = captures.difference(&slots).cloned().collect();
        return Err(err_msg!(
            RuleConstruction,
            "rule '{}', alternative {}: template slots do not match pattern captures (unbound slots: [{}], unused captures: [{}])",
            rule,
            alternative.describe(index),
            unbound.join(", "),
            unused.join(", ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    #[test]
    fn test_build_integer_rule() {
        let rule = Rule::builder("use-integer-value-of")
            .display_name("Use Integer.valueOf")
            .snippet("numeric", "new java.lang.Integer(#{x:numeric})", "Integer.valueOf(#{x})")
            .snippet("string", "new java.lang.Integer(#{x:String})", "Integer.parseInt(#{x})")
            .build()
            .unwrap();
        assert_eq!(rule.name(), "use-integer-value-of");
        assert_eq!(rule.display_name(), "Use Integer.valueOf");
        assert_eq!(rule.alternatives()[1].label.as_deref(), Some("string"));
    }

    #[test]
    fn test_display_name_defaults_to_name() {
        let rule = Rule::builder("drop-parens")
            .snippet("only", "(#{e})", "#{e}")
            .build()
            .unwrap();
        assert_eq!(rule.display_name(), "drop-parens");
    }

    #[test]
    fn test_rejects_empty_rule() {
        let err = Rule::builder("empty").build().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::RuleConstruction);
        assert!(err.message().contains("no alternatives"));
    }

    #[test]
    fn test_typed_snippet_declares_result_type() {
        let rule = Rule::builder("use-integer-parse-int")
            .typed_snippet("string", "new java.lang.Integer(#{x:String})", "Integer.parseInt(#{x})", "int")
            .build()
            .unwrap();
        assert_eq!(
            rule.alternatives()[0].template.result_type(),
            Some(&crate::ast::types::PrimitiveKind::Int.into())
        );
        let err = Rule::builder("bad-type")
            .typed_snippet("only", "(#{e})", "#{e}.x", "Integer")
            .build()
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::RuleConstruction);
    }

    #[test]
    fn test_snippet_error_is_reported_as_cause() {
        let err = Rule::builder("broken")
            .snippet("bad", "new Integer(#{x:wat})", "Integer.valueOf(#{x})")
            .build()
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::RuleConstruction);
        let cause = std::error::Error::source(&err).unwrap();
        assert!(cause.to_string().contains("wat"));
    }
}
