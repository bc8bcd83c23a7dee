use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::issue::Issue;
use super::severity::Severity;

/// Result of one audit pass, returned by [`Auditor::audit()`](crate::Auditor::audit).
///
/// Issues are ordered by the document position of the directive that
/// triggered them, then by rule registration order.
#[derive(Debug, Clone)]
#[must_use]
pub struct AuditReport {
    issues: Vec<Issue>,
    nodes_visited: usize,
    invocations: usize,
    duration: Duration,
}

impl AuditReport {
    pub(crate) fn new(
        issues: Vec<Issue>,
        nodes_visited: usize,
        invocations: usize,
        duration: Duration,
    ) -> Self {
        Self {
            issues,
            nodes_visited,
            invocations,
            duration,
        }
    }

    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Number of directives walked, excluding the root.
    #[must_use]
    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited
    }

    /// Number of rule entry-point calls made during the pass.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Wall-clock duration of the pass.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(Issue::severity).max()
    }

    /// Issues at or above `severity`.
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity() >= severity)
    }

    /// Issue counts keyed by severity. Levels with no issues are absent.
    #[must_use]
    pub fn count_by_severity(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity()).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issues: {}", self.issues.len())?;
        let counts = self.count_by_severity();
        if !counts.is_empty() {
            let parts: Vec<String> = counts
                .iter()
                .rev()
                .map(|(sev, n)| format!("{sev}: {n}"))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        write!(f, ", nodes: {}", self.nodes_visited)?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
