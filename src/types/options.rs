use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A single rule option value as handed over by the configuration loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A 64-bit signed integer.
    Int(i64),
    /// A boolean flag.
    Bool(bool),
    /// A UTF-8 string. Comma-separated lists arrive in this form from the CLI.
    String(String),
    /// An already split list of strings.
    List(Vec<String>),
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::String(v.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::String(v)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(v: Vec<String>) -> Self {
        OptionValue::List(v)
    }
}

impl From<&[&str]> for OptionValue {
    fn from(v: &[&str]) -> Self {
        OptionValue::List(v.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::String(v) => write!(f, "\"{v}\""),
            OptionValue::List(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

/// Per-rule options, fixed when the rule is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOptions {
    values: HashMap<String, OptionValue>,
}

impl RuleOptions {
    /// Create an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value under the same name.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Set an option (mutable reference version).
    pub fn insert(&mut self, name: &str, value: OptionValue) {
        self.values.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read an option as a set of lower-cased, trimmed names.
    ///
    /// Lists are taken item by item and strings are split on commas. Blank
    /// entries are dropped. A missing option or one of any other type reads
    /// as the empty set.
    #[must_use]
    pub fn string_set(&self, name: &str) -> BTreeSet<String> {
        let items: Vec<&str> = match self.values.get(name) {
            Some(OptionValue::String(s)) => s.split(',').collect(),
            Some(OptionValue::List(list)) => list.iter().map(String::as_str).collect(),
            Some(OptionValue::Int(_) | OptionValue::Bool(_)) | None => return BTreeSet::new(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_lowercase())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn set_and_get() {
        let opts = RuleOptions::new().set("headers", "x-frame-options");
        assert_eq!(
            opts.get("headers"),
            Some(&OptionValue::String("x-frame-options".to_owned()))
        );
        assert_eq!(opts.get("missing"), None);
    }

    #[test]
    fn overwrite_value() {
        let opts = RuleOptions::new().set("n", 1_i64).set("n", 2_i64);
        assert_eq!(opts.get("n"), Some(&OptionValue::Int(2)));
    }

    #[test]
    fn string_set_splits_comma_separated() {
        let opts = RuleOptions::new().set("headers", " X-Frame-Options, content-security-policy ,");
        assert_eq!(
            opts.string_set("headers"),
            set_of(&["content-security-policy", "x-frame-options"])
        );
    }

    #[test]
    fn string_set_from_list() {
        let opts = RuleOptions::new().set("headers", &["Referrer-Policy", "  ", "X-XSS-Protection"][..]);
        assert_eq!(
            opts.string_set("headers"),
            set_of(&["referrer-policy", "x-xss-protection"])
        );
    }

    #[test]
    fn string_set_other_types_are_empty() {
        let opts = RuleOptions::new().set("a", true).set("b", 5_i64);
        assert!(opts.string_set("a").is_empty());
        assert!(opts.string_set("b").is_empty());
        assert!(opts.string_set("missing").is_empty());
    }

    #[test]
    fn empty_string_is_empty_set() {
        let opts = RuleOptions::new().set("headers", "");
        assert!(opts.string_set("headers").is_empty());
    }

    #[test]
    fn display() {
        assert_eq!(OptionValue::Int(3).to_string(), "3");
        assert_eq!(OptionValue::from("a").to_string(), "\"a\"");
        assert_eq!(
            OptionValue::List(vec!["a".into(), "b".into()]).to_string(),
            "[a, b]"
        );
    }
}
