use std::fmt;

use super::severity::Severity;
use super::tree::{Directive, DirectiveTree, NodeId};

/// One finding emitted by a rule.
///
/// The implicated directives are kept as [`NodeId`]s so an issue can outlive
/// the borrow of the tree it was found in; resolve them again with
/// [`Issue::directives()`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[must_use]
pub struct Issue {
    rule_id: &'static str,
    summary: &'static str,
    help_url: &'static str,
    severity: Severity,
    reason: String,
    nodes: Vec<NodeId>,
}

impl Issue {
    pub fn new(
        rule_id: &'static str,
        severity: Severity,
        nodes: Vec<NodeId>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            rule_id,
            summary: "",
            help_url: "",
            severity,
            reason: reason.into(),
            nodes,
        }
    }

    /// Attach the emitting rule's one-line summary and documentation link.
    pub fn with_docs(mut self, summary: &'static str, help_url: &'static str) -> Self {
        self.summary = summary;
        self.help_url = help_url;
        self
    }

    #[must_use]
    pub fn rule_id(&self) -> &'static str {
        self.rule_id
    }

    #[must_use]
    pub fn summary(&self) -> &'static str {
        self.summary
    }

    #[must_use]
    pub fn help_url(&self) -> &'static str {
        self.help_url
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Implicated directives, in the order the rule reported them.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Resolve the implicated directives against the tree they came from.
    pub fn directives<'a, 't: 'a>(
        &'a self,
        tree: &'t DirectiveTree,
    ) -> impl Iterator<Item = Directive<'t>> + 'a {
        self.nodes.iter().filter_map(move |&id| tree.get(id))
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule_id, self.reason)
    }
}

/// Destination for issues produced during an audit pass.
pub trait IssueSink {
    fn report(&mut self, issue: Issue);
}

impl IssueSink for Vec<Issue> {
    fn report(&mut self, issue: Issue) {
        self.push(issue);
    }
}
