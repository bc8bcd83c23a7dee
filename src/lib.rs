//! Rule-based security audit of parsed nginx configuration trees.
//!
//! A parser hands over a [`DirectiveTree`]; an [`Auditor`] walks it in
//! document order and invokes every [`Rule`] interested in each directive.
//! Rules look at the directive and its ancestors and report [`Issue`]s.
//!
//! ```
//! use nginx_audit::{AuditorBuilder, Severity, TreeBuilder};
//!
//! let tree = TreeBuilder::new()
//!     .block("server", &[], |s| {
//!         s.directive("add_header", &["Strict-Transport-Security", "max-age=31536000"])
//!             .block("location", &["/"], |l| {
//!                 l.directive("add_header", &["X-Custom", "1"])
//!             })
//!     })
//!     .build();
//!
//! let report = AuditorBuilder::with_defaults().build().unwrap().audit(&tree);
//! assert_eq!(report.max_severity(), Some(Severity::Medium));
//! ```

mod audit;
mod registry;
pub mod rules;
mod types;

pub use audit::{Auditor, AuditorBuilder};
pub use types::{
    Ancestors, AuditError, AuditReport, Directive, DirectiveTree, Interest, Issue, IssueSink,
    NodeId, OptionValue, Rule, RuleOptions, Severity, TreeBuilder,
};
