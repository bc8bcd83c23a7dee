mod error;
mod issue;
mod options;
mod report;
mod rule;
mod severity;
mod tree;

pub use error::AuditError;
pub use issue::{Issue, IssueSink};
pub use options::{OptionValue, RuleOptions};
pub use report::AuditReport;
pub use rule::{Interest, Rule};
pub use severity::Severity;
pub use tree::{Ancestors, Directive, DirectiveTree, NodeId, TreeBuilder};
