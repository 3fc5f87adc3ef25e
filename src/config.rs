//! Engine configuration.
//!
//! Rule selection, rule order and the traversal mode are the only knobs. A
//! configuration may also define rules of its own as before/after snippet pairs.
//!
//! ```yaml
//! rules: [use-integer-value-of, simplify-boolean-ternary]
//! traversal:
//!   mode: fixed-point
//!   max_passes: 8
//!   parallel: true
//! definitions:
//!   - name: unwrap-parens
//!     alternatives:
//!       - before: "(#{e})"
//!         after: "#{e}"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ast::Span;
use crate::diagnostics::{line_column_offset, to_error_source};
use crate::engine::{Engine, TraversalConfig};
use crate::rules::{Rule, RuleRegistry, RuleSet};
use crate::{err_ctx, err_msg, RecastError};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Rules to apply, in order. Empty selects every registered rule in
    /// registration order.
    pub rules: Vec<String>,
    pub traversal: TraversalConfig,
    /// Rules defined by this configuration, registered after the built-in ones.
    pub definitions: Vec<RuleDefinition>,
}

/// A snippet-authored rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub alternatives: Vec<SnippetPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub before: String,
    pub after: String,
    /// Resolved type of the replacement root; left untyped when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
}

impl RuleDefinition {
    pub fn build(&self) -> Result<Rule, RecastError> {
        let mut builder = Rule::builder(&self.name).description(&self.description);
        if let Some(display_name) = &self.display_name {
            builder = builder.display_name(display_name);
        }
        for pair in &self.alternatives {
            builder = builder.snippet_alternative(
                pair.label.as_deref(),
                &pair.before,
                &pair.after,
                pair.result_type.as_deref(),
            );
        }
        builder.build()
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, RecastError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| {
            let offset = e.location().map(|l| l.index()).unwrap_or(0);
            config_error(text, "config.yaml", e.to_string(), offset)
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, RecastError> {
        let config: Self = serde_json::from_str(text).map_err(|e| {
            let offset = line_column_offset(text, e.line(), e.column());
            config_error(text, "config.json", e.to_string(), offset)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file; `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, RecastError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            err_msg!(Io, "cannot read configuration '{}'", path.display()).caused_by(e)
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        tracing::debug!(path = %path.display(), json = is_json, "loading configuration");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn validate(&self) -> Result<(), RecastError> {
        if self.traversal.max_passes == 0 {
            return Err(err_msg!(Config, "traversal.max_passes must be at least 1"));
        }
        Ok(())
    }

    /// The built-in catalog plus this configuration's definitions.
    pub fn build_registry(&self) -> Result<RuleRegistry, RecastError> {
        let mut registry = RuleRegistry::standard()?;
        for definition in &self.definitions {
            let rule = definition.build()?;
            registry.register_or_error(rule).map_err(|e| {
                err_msg!(Config, "rule definition '{}' clashes with a registered rule", definition.name)
                    .caused_by(e)
            })?;
        }
        Ok(registry)
    }

    /// The rules selected by this configuration, in order.
    pub fn rule_set(&self, registry: &RuleRegistry) -> Result<RuleSet, RecastError> {
        if self.rules.is_empty() {
            return Ok(registry.all());
        }
        registry.select(&self.rules)
    }

    pub fn build_engine(&self) -> Result<Engine, RecastError> {
        let registry = self.build_registry()?;
        let rules = self.rule_set(&registry)?;
        tracing::debug!(rules = ?rules.names(), mode = ?self.traversal.mode, "engine configured");
        Ok(Engine::new(rules, self.traversal.clone()))
    }
}

fn config_error(text: &str, name: &str, message: String, offset: usize) -> RecastError {
    let src = to_error_source(name, text);
    let offset = offset.min(text.len());
    err_ctx!(
        Config,
        message,
        &src,
        Span {
            start: offset,
            end: offset
        }
    )
}
