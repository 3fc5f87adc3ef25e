//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for colorizing output and rendering rewrite
//! traces as diffs. Writers are passed in so the same rendering works for the
//! terminal and for captured output in tests.

use difference::{Changeset, Difference};
use std::io::{self, Write};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::engine::RewriteOutcome;
use crate::rules::RuleRegistry;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints each rewrite step with a colored diff of the rewritten node.
pub fn print_trace<W: WriteColor>(out: &mut W, outcome: &RewriteOutcome) -> io::Result<()> {
    if outcome.trace.is_empty() {
        writeln!(out, "No rules applied.")?;
        return Ok(());
    }

    for (i, step) in outcome.trace.iter().enumerate() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        let alternative = step
            .label
            .clone()
            .unwrap_or_else(|| format!("#{}", step.alternative));
        writeln!(
            out,
            "--- Step {}: {} ({}) at {} [pass {}] ---",
            i + 1,
            step.rule,
            alternative,
            step.path,
            step.pass
        )?;
        out.reset()?;

        let changeset = Changeset::new(&step.before.pretty(), &step.after.pretty(), " ");
        print_diff(out, &changeset.diffs)?;
        writeln!(out)?;
    }

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    writeln!(
        out,
        "{} rewrite(s) in {} pass(es)",
        outcome.trace.len(),
        outcome.passes
    )?;
    out.reset()?;
    writeln!(out, "{}", outcome.tree.pretty())
}

/// Prints every registered rule and its alternatives as snippets.
pub fn print_rules<W: WriteColor>(out: &mut W, registry: &RuleRegistry) -> io::Result<()> {
    for rule in registry.iter() {
        out.set_color(ColorSpec::new().set_bold(true))?;
        write!(out, "{}", rule.name())?;
        out.reset()?;
        writeln!(out, " - {}", rule.display_name())?;
        if !rule.description().is_empty() {
            writeln!(out, "    {}", rule.description())?;
        }
        for (index, alternative) in rule.alternatives().iter().enumerate() {
            write!(
                out,
                "    [{}] {}  =>  {}",
                alternative.describe(index),
                alternative.pattern,
                alternative.template
            )?;
            match alternative.template.result_type() {
                Some(ty) => writeln!(out, " : {}", ty)?,
                None => writeln!(out)?,
            }
        }
    }
    Ok(())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff<W: WriteColor>(out: &mut W, diffs: &[Difference]) -> io::Result<()> {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                out.reset()?;
                writeln!(out, " {}", x)?;
            }
            Difference::Add(ref x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                writeln!(out, "+{}", x)?;
            }
            Difference::Rem(ref x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                writeln!(out, "-{}", x)?;
            }
        }
    }
    out.reset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    #[test]
    fn test_print_rules_lists_alternatives() {
        let registry = RuleRegistry::standard().unwrap();
        let mut out = NoColor::new(Vec::new());
        print_rules(&mut out, &registry).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("use-integer-value-of - Use Integer.valueOf and Integer.parseInt"));
        assert!(text.contains("[string] new java.lang.Integer(#{x:String})  =>  Integer.parseInt(#{x}) : int\n"));
        assert!(text.contains("[identity] #{c} ? true : false  =>  #{c}\n"));
    }
}
