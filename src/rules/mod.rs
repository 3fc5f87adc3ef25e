//! Rewrite rules: patterns, templates, rules and rule sets.
//!
//! ## Module Structure
//! - **Skeleton**: expression skeletons with named holes, shared by both sides of a rule
//! - **Pattern**: structural and type-aware matching, producing captures
//! - **Template**: detached replacement fragments built from captures
//! - **Rule**: validated bundles of alternatives
//! - **Registry**: explicit registration and ordered rule sets
//! - **Std**: the built-in catalog

pub mod pattern;
pub mod registry;
pub mod rule;
pub mod skeleton;
pub mod std;
pub mod template;

pub use pattern::{match_rule, Capture, Captures, MatchResult, Pattern};
pub use registry::{RuleRegistry, RuleSet};
pub use rule::{Alternative, Rule, RuleBuilder};
pub use skeleton::{Hole, Skeleton, TypeConstraint};
pub use template::Template;
