//! Rule registry and rule sets.
//!
//! Rules are registered explicitly; there is no discovery. A [`RuleSet`] is the
//! ordered selection of rules applied together in a pass. Order matters only
//! when two rules match the same node: the earlier rule wins.
//!
//! # Summary Table
//! | Method            | Overwrites | Error on Duplicate | Notes                        |
//! |-------------------|------------|--------------------|------------------------------|
//! | register          | Yes        | No                 | Keeps the original position  |
//! | register_or_error | No         | Yes                | Appends                      |
//! | unregister        | N/A        | N/A                | Removes by name              |
//! | get/contains      | N/A        | N/A                | Case-sensitive lookup        |

use std::sync::Arc;

use crate::ast::AstNode;
use crate::rules::pattern::{match_rule, Captures, MatchResult};
use crate::rules::rule::Rule;
use crate::{err_msg, RecastError};

/// Named rules in registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<Rule>>,
}

impl RuleRegistry {
    /// Creates a new, empty registry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recast::rules::RuleRegistry;
    /// let registry = RuleRegistry::new();
    /// assert!(registry.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in catalog.
    pub fn standard() -> Result<Self, RecastError> {
        let mut registry = Self::new();
        crate::rules::std::register_std_rules(&mut registry)?;
        Ok(registry)
    }

    /// Registers `rule`, replacing (in place) any rule with the same name.
    ///
    /// Returns the replaced rule, if any.
    pub fn register(&mut self, rule: impl Into<Arc<Rule>>) -> Option<Arc<Rule>> {
        let rule = rule.into();
        match self.position(rule.name()) {
            Some(index) => Some(std::mem::replace(&mut self.rules[index], rule)),
            None => {
                self.rules.push(rule);
                None
            }
        }
    }

    /// Registers `rule`, returning an error if the name is already taken.
    ///
    /// # Example
    /// ```rust
    /// use recast::rules::{Rule, RuleRegistry};
    /// let rule = Rule::builder("drop-parens").snippet("only", "(#{e})", "#{e}").build().unwrap();
    /// let mut reg = RuleRegistry::new();
    /// reg.register_or_error(rule.clone()).unwrap();
    /// assert!(reg.register_or_error(rule).is_err());
    /// ```
    pub fn register_or_error(&mut self, rule: impl Into<Arc<Rule>>) -> Result<(), RecastError> {
        let rule = rule.into();
        if self.contains(rule.name()) {
            return Err(err_msg!(RuleConstruction, "rule '{}' is already registered", rule.name()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<Rule>> {
        self.position(name).map(|index| self.rules.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Rule>> {
        self.rules.iter().find(|r| r.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Builds a rule set from `names`, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<RuleSet, RecastError> {
        let rules = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).cloned().ok_or_else(|| {
                    err_msg!(RuleConstruction, "unknown rule '{}'", name)
                        .with_help(format!("registered rules: {}", self.names().join(", ")))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        RuleSet::from_shared(rules)
    }

    /// Every registered rule, in registration order.
    pub fn all(&self) -> RuleSet {
        RuleSet {
            rules: self.rules.clone(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name() == name)
    }
}

/// An ordered, immutable collection of rules applied together.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<Rule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self, RecastError> {
        Self::from_shared(rules.into_iter().map(Arc::new).collect())
    }

    /// Rejects duplicate rule names; each rule was validated when it was built.
    pub fn from_shared(rules: Vec<Arc<Rule>>) -> Result<Self, RecastError> {
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|earlier| earlier.name() == rule.name()) {
                return Err(err_msg!(
                    RuleConstruction,
                    "rule '{}' appears more than once in the rule set",
                    rule.name()
                ));
            }
        }
        Ok(Self { rules })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule (in set order) matching `node`, with the matching
    /// alternative's index and its captures.
    pub fn first_match(&self, node: &AstNode) -> Option<(&Rule, usize, Captures)> {
        self.rules.iter().find_map(|rule| match match_rule(node, rule) {
            MatchResult::Matched {
                alternative,
                captures,
            } => Some((rule.as_ref(), alternative, captures)),
            MatchResult::NoMatch => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    fn rule(name: &str) -> Rule {
        Rule::builder(name)
            .snippet("only", "(#{e})", "#{e}")
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut reg = RuleRegistry::new();
        assert!(reg.register(rule("a")).is_none());
        reg.register(rule("b"));
        assert!(reg.register(rule("a")).is_some());
        assert_eq!(reg.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_unregister() {
        let mut reg = RuleRegistry::new();
        reg.register(rule("a"));
        assert!(reg.unregister("a").is_some());
        assert!(reg.unregister("a").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_select_follows_requested_order() {
        let mut reg = RuleRegistry::new();
        reg.register(rule("a"));
        reg.register(rule("b"));
        let set = reg.select(&["b", "a"]).unwrap();
        assert_eq!(set.names(), vec!["b", "a"]);
        let err = reg.select(&["c"]).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::RuleConstruction);
    }

    #[test]
    fn test_rule_set_rejects_duplicates() {
        let err = RuleSet::new(vec![rule("a"), rule("a")]).unwrap_err();
        assert!(err.message().contains("more than once"));
    }
}
