use tracing::trace;

use crate::types::{Directive, Interest, Issue, IssueSink, Rule, Severity};

/// Flags `allow`/`deny` directives sharing a block with a `return`.
///
/// `return` runs in the rewrite phase, before access checks, so the
/// response is served to everyone:
///
/// ```nginx
/// location / {
///     allow 127.0.0.1;
///     deny all;
///     return 200 "hi";
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnWithAllowDeny;

impl ReturnWithAllowDeny {
    pub const ID: &'static str = "return_with_allow_deny";
}

impl Rule for ReturnWithAllowDeny {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn summary(&self) -> &'static str {
        "The return directive does not obey allow or deny directives, and always takes precedence."
    }

    fn description(&self) -> &'static str {
        "The return directive is executed before the allow or deny directives take any effect. \
         You may want to use a named location with the try_files directive instead."
    }

    fn help_url(&self) -> &'static str {
        "https://joshua.hu/nginx-return-allow-deny"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn interest(&self) -> Interest {
        Interest::Directives(&["allow", "deny"])
    }

    fn audit(&self, directive: Directive<'_>, sink: &mut dyn IssueSink) {
        let Some(parent) = directive.parent() else {
            return;
        };

        let returns = parent.find_recursive("return");
        if returns.is_empty() {
            return;
        }

        trace!(
            rule = Self::ID,
            node = directive.id().index(),
            returns = returns.len(),
            "access directive bypassed by return"
        );
        let nodes = std::iter::once(directive)
            .chain(returns)
            .map(Directive::id)
            .collect();
        sink.report(
            Issue::new(
                Self::ID,
                self.severity(),
                nodes,
                "The allow and deny directives do not restrict access to pages returned with 'return'.",
            )
            .with_docs(self.summary(), self.help_url()),
        );
    }
}
