use std::fmt::Debug;

use super::issue::IssueSink;
use super::severity::Severity;
use super::tree::Directive;

/// Which directives a rule wants to be invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Every block directive (`server`, `location`, `if`, ...).
    Blocks,
    /// Directives whose kind is in the list.
    Directives(&'static [&'static str]),
}

impl Interest {
    /// Whether a rule with this interest should see `directive`.
    /// The root block never matches.
    #[must_use]
    pub fn matches(self, directive: Directive<'_>) -> bool {
        if directive.is_root() {
            return false;
        }
        match self {
            Interest::Blocks => directive.is_block(),
            Interest::Directives(kinds) => kinds.contains(&directive.kind()),
        }
    }
}

/// An audit rule: inspects one directive (and its ancestors) and reports
/// zero or more issues.
///
/// Rules are built once with their options and never mutated afterwards, so
/// a single instance can be shared by many threads.
pub trait Rule: Send + Sync + Debug {
    /// Stable identifier used in reports and configuration.
    fn id(&self) -> &'static str;

    /// One-line description of what the rule catches.
    fn summary(&self) -> &'static str;

    /// Long-form rationale.
    fn description(&self) -> &'static str;

    fn help_url(&self) -> &'static str;

    /// Base severity of the rule's issues.
    fn severity(&self) -> Severity;

    fn interest(&self) -> Interest;

    /// Help text for each recognized option, as `(name, help)` pairs.
    fn options_help(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Inspect `directive` and report findings to `sink`.
    fn audit(&self, directive: Directive<'_>, sink: &mut dyn IssueSink);
}
