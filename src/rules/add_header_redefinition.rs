use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::types::{Directive, Interest, Issue, IssueSink, Rule, RuleOptions, Severity};

/// Headers whose loss escalates an issue to [`Severity::Medium`].
const SECURE_HEADERS: &[&str] = &[
    "content-security-policy",
    "cross-origin-embedder-policy",
    "cross-origin-opener-policy",
    "cross-origin-resource-policy",
    "permissions-policy",
    "referrer-policy",
    "strict-transport-security",
    "x-content-type-options",
    "x-frame-options",
    "x-xss-protection",
];

/// Flags blocks whose own `add_header` directives silently discard the
/// headers set by the nearest enclosing block that sets any.
///
/// nginx only inherits `add_header` from the previous level when the current
/// level defines none, so:
///
/// ```nginx
/// server {
///     add_header X-Content-Type-Options nosniff;
///     location / {
///         add_header X-Frame-Options DENY;   # X-Content-Type-Options is gone here
///     }
/// }
/// ```
///
/// `add_header_inherit on;` (nginx 1.29.3+) in the inner block restores
/// inheritance and silences the rule.
#[derive(Debug, Clone, Default)]
pub struct AddHeaderRedefinition {
    interesting: BTreeSet<String>,
}

impl AddHeaderRedefinition {
    pub const ID: &'static str = "add_header_redefinition";

    /// Build the rule. The `headers` option restricts reporting to the
    /// listed header names; when empty every dropped header is reported.
    #[must_use]
    pub fn new(options: &RuleOptions) -> Self {
        Self {
            interesting: options.string_set("headers"),
        }
    }
}

impl Rule for AddHeaderRedefinition {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn summary(&self) -> &'static str {
        "Nested \"add_header\" drops parent headers."
    }

    fn description(&self) -> &'static str {
        "\"add_header\" replaces ALL parent headers. \
         See documentation: https://nginx.org/en/docs/http/ngx_http_headers_module.html#add_header \
         Note: nginx 1.29.3+ supports \"add_header_inherit on;\" to inherit parent headers."
    }

    fn help_url(&self) -> &'static str {
        "https://github.com/dvershinin/gixy/blob/master/docs/en/plugins/addheaderredefinition.md"
    }

    fn severity(&self) -> Severity {
        Severity::Low
    }

    fn interest(&self) -> Interest {
        Interest::Blocks
    }

    fn options_help(&self) -> &'static [(&'static str, &'static str)] {
        &[(
            "headers",
            "Only report dropped headers from this allowlist. Case-insensitive. \
             Comma-separated list, e.g. \"x-frame-options,content-security-policy\".",
        )]
    }

    fn audit(&self, directive: Directive<'_>, sink: &mut dyn IssueSink) {
        if !directive.is_block() {
            return;
        }

        let own = headers_of(directive);
        if own.is_empty() || inherits_headers(directive) {
            return;
        }

        // Only the nearest ancestor that sets headers is compared.
        let Some((parent, parent_headers)) = directive.ancestors().find_map(|ancestor| {
            let headers = headers_of(ancestor);
            (!headers.is_empty()).then_some((ancestor, headers))
        }) else {
            return;
        };

        let dropped: Vec<(&str, &str)> = parent_headers
            .iter()
            .filter(|(name, _)| !own.contains_key(*name))
            .filter(|(name, _)| self.interesting.is_empty() || self.interesting.contains(*name))
            .map(|(name, spelling)| (name.as_str(), *spelling))
            .collect();
        if dropped.is_empty() {
            return;
        }

        let severity = if dropped.iter().any(|(name, _)| SECURE_HEADERS.contains(name)) {
            Severity::Medium
        } else {
            self.severity()
        };

        let nodes = parent
            .find("add_header")
            .into_iter()
            .chain(directive.find("add_header"))
            .map(Directive::id)
            .collect();

        let names: Vec<&str> = dropped.iter().map(|(_, spelling)| *spelling).collect();
        let reason = format!(
            "Parent headers \"{}\" was dropped in current level",
            names.join("\", \"")
        );

        trace!(
            rule = Self::ID,
            node = directive.id().index(),
            parent = parent.id().index(),
            dropped = ?names,
            "parent headers dropped"
        );
        sink.report(
            Issue::new(Self::ID, severity, nodes, reason).with_docs(self.summary(), self.help_url()),
        );
    }
}

/// Header names set directly in `block`, keyed by lower-cased name and
/// mapped to the first spelling found.
fn headers_of(block: Directive<'_>) -> BTreeMap<String, &str> {
    let mut headers = BTreeMap::new();
    for add_header in block.find("add_header") {
        if let Some(name) = add_header.arg() {
            headers.entry(name.to_lowercase()).or_insert(name);
        }
    }
    headers
}

/// Whether `block` opts into header inheritance with `add_header_inherit on;`.
fn inherits_headers(block: Directive<'_>) -> bool {
    block
        .find("add_header_inherit")
        .iter()
        .any(|d| d.arg().is_some_and(|arg| arg.eq_ignore_ascii_case("on")))
}
