use std::collections::{HashMap, HashSet};

use crate::types::{AuditError, Directive, Interest, Rule};

/// Dispatch table from directive kind to the rules interested in it.
///
/// Built once when the [`Auditor`](crate::Auditor) is assembled. Rule
/// indices refer to the auditor's rule list and are kept in registration
/// order so every pass invokes rules in the same sequence.
#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    by_kind: HashMap<&'static str, Vec<usize>>,
    blocks: Vec<usize>,
}

impl Registry {
    pub(crate) fn new(rules: &[Box<dyn Rule>]) -> Self {
        let mut registry = Self::default();
        for (idx, rule) in rules.iter().enumerate() {
            match rule.interest() {
                Interest::Blocks => registry.blocks.push(idx),
                Interest::Directives(kinds) => {
                    for kind in kinds {
                        let slot = registry.by_kind.entry(*kind).or_default();
                        if !slot.contains(&idx) {
                            slot.push(idx);
                        }
                    }
                }
            }
        }
        registry
    }

    /// Indices of the rules to invoke for `directive`, ascending.
    pub(crate) fn matching(&self, directive: Directive<'_>) -> Vec<usize> {
        if directive.is_root() {
            return Vec::new();
        }
        let mut out: Vec<usize> = self
            .by_kind
            .get(directive.kind())
            .cloned()
            .unwrap_or_default();
        if directive.is_block() {
            out.extend(&self.blocks);
            out.sort_unstable();
            out.dedup();
        }
        out
    }
}

pub(crate) fn check_duplicates(rules: &[Box<dyn Rule>]) -> Result<(), AuditError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.id()) {
            return Err(AuditError::DuplicateRule {
                id: rule.id().to_owned(),
            });
        }
    }
    Ok(())
}

/// Every id in `ids` must name one of `known`.
pub(crate) fn check_known<'a>(
    ids: impl IntoIterator<Item = &'a String>,
    known: &[&str],
    context: &'static str,
) -> Result<(), AuditError> {
    for id in ids {
        if !known.contains(&id.as_str()) {
            return Err(AuditError::UnknownRule {
                id: id.clone(),
                context,
            });
        }
    }
    Ok(())
}
