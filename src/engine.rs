//! The traversal engine.
//!
//! A pass walks the tree post-order: children are rewritten first, the node is
//! rebuilt around them (or reused when no child changed) and the rebuilt node is
//! tested against every rule of the [`RuleSet`] in order. The first match wins
//! and its replacement is not visited again in the same pass.
//!
//! Sibling subtrees are independent, so with `parallel` enabled the children of
//! a node are rewritten with rayon's fork-join and joined before the parent is
//! rebuilt. Each task returns its own node and trace; nothing is shared mutably.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ast::path::NodePath;
use crate::ast::AstNode;
use crate::rules::RuleSet;
use crate::RecastError;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalMode {
    /// One pass over the tree.
    #[default]
    SinglePass,
    /// Passes repeat until one leaves the tree unchanged.
    FixedPoint,
}

pub const DEFAULT_MAX_PASSES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraversalConfig {
    pub mode: TraversalMode,
    /// Upper bound on passes in fixed-point mode.
    pub max_passes: usize,
    pub parallel: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            mode: TraversalMode::SinglePass,
            max_passes: DEFAULT_MAX_PASSES,
            parallel: false,
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// One applied rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteStep {
    pub rule: String,
    pub alternative: usize,
    pub label: Option<String>,
    pub path: NodePath,
    /// 1-based pass number.
    pub pass: usize,
    pub before: AstNode,
    pub after: AstNode,
}

#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub tree: AstNode,
    /// Rewrites in pass order, then post-order within a pass.
    pub trace: Vec<RewriteStep>,
    pub passes: usize,
    /// Whether the last pass left the tree unchanged.
    pub converged: bool,
}

impl RewriteOutcome {
    pub fn changed(&self) -> bool {
        !self.trace.is_empty()
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Applies a rule set to trees. Immutable once built and safe to share.
#[derive(Debug, Clone)]
pub struct Engine {
    rules: RuleSet,
    config: TraversalConfig,
}

impl Engine {
    pub fn new(rules: RuleSet, config: TraversalConfig) -> Self {
        Self { rules, config }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Runs a single pass. `pass` is recorded in the trace.
    ///
    /// Returns a fully rewritten tree or the first failure; partial results
    /// are dropped.
    pub fn apply_pass(&self, tree: &AstNode, pass: usize) -> Result<(AstNode, Vec<RewriteStep>), RecastError> {
        let walker = Pass {
            rules: &self.rules,
            pass,
            parallel: self.config.parallel,
        };
        let result = walker.visit(tree, &NodePath::root())?;
        tracing::debug!(pass, rewrites = result.1.len(), "pass complete");
        Ok(result)
    }

    /// Runs the configured traversal.
    ///
    /// # Errors
    /// A traversal failure when a pass hits an internal invariant violation, or
    /// when fixed-point iteration does not converge within `max_passes`.
    pub fn run(&self, tree: &AstNode) -> Result<RewriteOutcome, RecastError> {
        match self.config.mode {
            TraversalMode::SinglePass => {
                let (out, trace) = self.apply_pass(tree, 1)?;
                let converged = out.is_same_node(tree);
                Ok(RewriteOutcome {
                    tree: out,
                    trace,
                    passes: 1,
                    converged,
                })
            }
            TraversalMode::FixedPoint => self.run_to_fixed_point(tree),
        }
    }

    fn run_to_fixed_point(&self, tree: &AstNode) -> Result<RewriteOutcome, RecastError> {
        let max_passes = self.config.max_passes.max(1);
        let mut current = tree.clone();
        let mut trace = Vec::new();

        for pass in 1..=max_passes {
            let (next, steps) = self.apply_pass(&current, pass)?;
            trace.extend(steps);
            if next.is_same_node(&current) {
                return Ok(RewriteOutcome {
                    tree: next,
                    trace,
                    passes: pass,
                    converged: true,
                });
            }
            current = next;
        }

        tracing::warn!(max_passes, rewrites = trace.len(), "rewriting did not converge");
        Err(RecastError::traversal(
            NodePath::root(),
            format!("rewriting did not reach a fixed point within {} passes", max_passes),
        )
        .with_help("a rule's template probably reintroduces its own pattern; raise max_passes or use a single pass"))
    }
}

/// Applies `rules` to `tree` in one sequential pass.
pub fn apply_all(tree: &AstNode, rules: &RuleSet) -> Result<AstNode, RecastError> {
    let engine = Engine::new(rules.clone(), TraversalConfig::default());
    engine.apply_pass(tree, 1).map(|(out, _)| out)
}

// ============================================================================
// TRAVERSAL
// ============================================================================

struct Pass<'a> {
    rules: &'a RuleSet,
    pass: usize,
    parallel: bool,
}

type Visited = (AstNode, Vec<RewriteStep>);

impl Pass<'_> {
    fn visit(&self, node: &AstNode, path: &NodePath) -> Result<Visited, RecastError> {
        let (rebuilt, mut steps) = self.visit_children(node, path)?;

        let Some((rule, index, captures)) = self.rules.first_match(&rebuilt) else {
            return Ok((rebuilt, steps));
        };
        let alternative = &rule.alternatives()[index];
        let replacement = alternative
            .template
            .instantiate(&captures, &rebuilt)
            .map_err(|e| {
                RecastError::traversal(
                    path.clone(),
                    format!("rule '{}' could not build its replacement", rule.name()),
                )
                .caused_by(e)
            })?;

        tracing::debug!(
            rule = rule.name(),
            alternative = %alternative.describe(index),
            path = %path,
            pass = self.pass,
            "rewrote node"
        );
        steps.push(RewriteStep {
            rule: rule.name().to_string(),
            alternative: index,
            label: alternative.label.clone(),
            path: path.clone(),
            pass: self.pass,
            before: rebuilt,
            after: replacement.clone(),
        });
        Ok((replacement, steps))
    }

    fn visit_children(&self, node: &AstNode, path: &NodePath) -> Result<Visited, RecastError> {
        let children = node.value.children();
        if children.is_empty() {
            return Ok((node.clone(), Vec::new()));
        }

        let visit_child = |(segment, child): &(crate::ast::path::PathSegment, &AstNode)| {
            self.visit(child, &path.child(segment.clone()))
        };
        let results: Vec<Visited> = if self.parallel && children.len() > 1 {
            children.par_iter().map(visit_child).collect::<Result<_, _>>()?
        } else {
            children.iter().map(visit_child).collect::<Result<_, _>>()?
        };

        let changed = results
            .iter()
            .zip(&children)
            .any(|((new, _), (_, old))| !new.is_same_node(old));

        let mut steps = Vec::new();
        let mut rebuilt_children = Vec::with_capacity(results.len());
        for (child, child_steps) in results {
            rebuilt_children.push(child);
            steps.extend(child_steps);
        }

        if !changed {
            return Ok((node.clone(), steps));
        }

        let expr = node.value.with_children(rebuilt_children).ok_or_else(|| {
            RecastError::traversal(
                path.clone(),
                format!("rewritten children do not fit a {} node", node.value.kind_name()),
            )
        })?;
        Ok((
            AstNode {
                value: Arc::new(expr),
                ty: node.ty.clone(),
                span: node.span,
            },
            steps,
        ))
    }
}
