use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::registry::{check_duplicates, check_known, Registry};
use crate::rules::{builtin_rules, BUILTIN_RULE_IDS};
use crate::types::{
    AuditError, AuditReport, Directive, DirectiveTree, Issue, IssueSink, Rule, RuleOptions,
    Severity,
};

/// Builder for an [`Auditor`].
///
/// # Example
///
/// ```
/// use nginx_audit::{AuditorBuilder, RuleOptions, Severity, TreeBuilder};
///
/// let auditor = AuditorBuilder::with_defaults()
///     .options(
///         "add_header_redefinition",
///         RuleOptions::new().set("headers", "x-frame-options"),
///     )
///     .min_severity(Severity::Low)
///     .build()
///     .unwrap();
///
/// let tree = TreeBuilder::new()
///     .block("location", &["/"], |l| {
///         l.directive("deny", &["all"]).directive("return", &["200", "hi"])
///     })
///     .build();
///
/// let report = auditor.audit(&tree);
/// assert_eq!(report.issues().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditorBuilder {
    builtins: bool,
    rules: Vec<Box<dyn Rule>>,
    options: HashMap<String, RuleOptions>,
    skips: Vec<String>,
    min_severity: Severity,
}

impl AuditorBuilder {
    /// An empty builder with no rules registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with every built-in rule registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            builtins: true,
            ..Self::default()
        }
    }

    /// Register a custom rule after the built-ins.
    #[must_use]
    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Options for a built-in rule. Later calls for the same id replace
    /// earlier ones.
    #[must_use]
    pub fn options(mut self, rule_id: &str, options: RuleOptions) -> Self {
        self.options.insert(rule_id.to_owned(), options);
        self
    }

    /// Leave a registered rule out of the pass.
    #[must_use]
    pub fn skip(mut self, rule_id: &str) -> Self {
        self.skips.push(rule_id.to_owned());
        self
    }

    /// Drop issues below `severity` from every report.
    #[must_use]
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Construct the rules and the dispatch table.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if two rules share an id, or if options or the
    /// skip list name a rule that is not registered.
    pub fn build(self) -> Result<Auditor, AuditError> {
        let configurable: &[&str] = if self.builtins { BUILTIN_RULE_IDS } else { &[] };
        check_known(self.options.keys(), configurable, "rule options")?;

        let mut rules = if self.builtins {
            builtin_rules(&self.options)
        } else {
            Vec::new()
        };
        rules.extend(self.rules);
        check_duplicates(&rules)?;

        let ids: Vec<&str> = rules.iter().map(|r| r.id()).collect();
        check_known(&self.skips, &ids, "skip list")?;
        rules.retain(|r| !self.skips.iter().any(|s| s == r.id()));

        let registry = Registry::new(&rules);
        debug!(
            rules = rules.len(),
            skipped = self.skips.len(),
            min_severity = %self.min_severity,
            "auditor built"
        );
        Ok(Auditor {
            rules,
            registry,
            min_severity: self.min_severity,
        })
    }
}

/// A set of rules ready to audit directive trees. Immutable, `Send + Sync`,
/// and designed to live behind `Arc`.
#[derive(Debug)]
pub struct Auditor {
    rules: Vec<Box<dyn Rule>>,
    registry: Registry,
    min_severity: Severity,
}

impl Auditor {
    /// Audit every directive of `tree` in document order.
    pub fn audit(&self, tree: &DirectiveTree) -> AuditReport {
        let start = Instant::now();
        let mut issues = Vec::new();
        let invocations = self.audit_into(tree, &mut issues);
        self.finish(tree, issues, invocations, start)
    }

    /// Same result as [`audit()`](Self::audit), with directives spread over
    /// the rayon thread pool.
    pub fn audit_parallel(&self, tree: &DirectiveTree) -> AuditReport {
        let start = Instant::now();
        let nodes: Vec<Directive<'_>> = tree.walk().collect();
        let per_node: Vec<(usize, Vec<Issue>)> = nodes
            .par_iter()
            .map(|&node| {
                let mut issues = Vec::new();
                let invocations = self.audit_node(node, &mut issues);
                (invocations, issues)
            })
            .collect();

        let invocations = per_node.iter().map(|(n, _)| n).sum();
        let issues = per_node.into_iter().flat_map(|(_, issues)| issues).collect();
        self.finish(tree, issues, invocations, start)
    }

    /// Stream issues straight into an external sink. Returns the number of
    /// rule invocations made.
    pub fn audit_into(&self, tree: &DirectiveTree, sink: &mut dyn IssueSink) -> usize {
        tree.walk().map(|node| self.audit_node(node, sink)).sum()
    }

    /// Registered rules, in invocation order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Look up a registered rule by id.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rules().find(|r| r.id() == id)
    }

    fn audit_node(&self, node: Directive<'_>, sink: &mut dyn IssueSink) -> usize {
        let matching = self.registry.matching(node);
        let mut filtered = MinSeverity {
            inner: sink,
            min: self.min_severity,
        };
        for &idx in &matching {
            let rule = &self.rules[idx];
            trace!(rule = rule.id(), node = node.id().index(), kind = node.kind(), "invoking rule");
            rule.audit(node, &mut filtered);
        }
        matching.len()
    }

    fn finish(
        &self,
        tree: &DirectiveTree,
        issues: Vec<Issue>,
        invocations: usize,
        start: Instant,
    ) -> AuditReport {
        let report = AuditReport::new(issues, tree.len(), invocations, start.elapsed());
        debug!(
            issues = report.issues().len(),
            nodes = report.nodes_visited(),
            invocations,
            "audit pass finished"
        );
        report
    }
}

impl fmt::Display for Auditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.rules.iter().map(|r| r.id()).collect();
        write!(f, "Auditor({} rules: {})", ids.len(), ids.join(", "))
    }
}

/// Drops issues below a threshold before they reach the wrapped sink.
struct MinSeverity<'a> {
    inner: &'a mut dyn IssueSink,
    min: Severity,
}

impl IssueSink for MinSeverity<'_> {
    fn report(&mut self, issue: Issue) {
        if issue.severity() >= self.min {
            self.inner.report(issue);
        }
    }
}
