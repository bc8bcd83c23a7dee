mod add_header_redefinition;
mod return_with_allow_deny;

use std::collections::HashMap;

pub use add_header_redefinition::AddHeaderRedefinition;
pub use return_with_allow_deny::ReturnWithAllowDeny;

use crate::types::{Rule, RuleOptions};

/// Ids of the rules shipped with the crate, in registration order.
pub const BUILTIN_RULE_IDS: &[&str] = &[AddHeaderRedefinition::ID, ReturnWithAllowDeny::ID];

/// Construct every built-in rule, handing each the options registered under
/// its id (or empty options).
#[must_use]
pub fn builtin_rules(options: &HashMap<String, RuleOptions>) -> Vec<Box<dyn Rule>> {
    let empty = RuleOptions::new();
    let opts = |id: &str| options.get(id).unwrap_or(&empty);
    vec![
        Box::new(AddHeaderRedefinition::new(opts(AddHeaderRedefinition::ID))),
        Box::new(ReturnWithAllowDeny),
    ]
}
