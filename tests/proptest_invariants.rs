
use std::collections::HashSet;

use nginx_audit::rules::{AddHeaderRedefinition, ReturnWithAllowDeny};
use nginx_audit::{Auditor, AuditorBuilder, DirectiveTree, NodeId, RuleOptions, Severity};
use proptest::prelude::*;
use strategies::arb_tree;

fn defaults() -> Auditor {
    AuditorBuilder::with_defaults().build().unwrap()
}

// ---------------------------------------------------------------------------
// Invariant 1: Idempotence
//
// Auditing an unmodified tree twice yields the same issues in the same order,
// and the parallel pass agrees with the sequential one.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn repeated_pass_is_identical(gen in arb_tree()) {
        let tree = gen.build();
        let auditor = defaults();
        let first = auditor.audit(&tree);
        for _ in 0..3 {
            let again = auditor.audit(&tree);
            prop_assert_eq!(first.issues(), again.issues());
        }
    }

    #[test]
    fn parallel_pass_matches_sequential(gen in arb_tree()) {
        let tree = gen.build();
        let auditor = defaults();
        let seq = auditor.audit(&tree);
        let par = auditor.audit_parallel(&tree);
        prop_assert_eq!(seq.issues(), par.issues());
        prop_assert_eq!(seq.invocations(), par.invocations());
        prop_assert_eq!(seq.nodes_visited(), par.nodes_visited());
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Ordering
//
// Issues come out sorted by the position of the directive that triggered
// them. For the header rule that is the block owning the last implicated
// add_header; for the access rule it is the first implicated node.
// ---------------------------------------------------------------------------

fn trigger(tree: &DirectiveTree, issue: &nginx_audit::Issue) -> NodeId {
    if issue.rule_id() == AddHeaderRedefinition::ID {
        let last = issue.directives(tree).last().unwrap();
        last.parent().unwrap().id()
    } else {
        issue.nodes()[0]
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn issues_follow_document_order(gen in arb_tree()) {
        let tree = gen.build();
        let report = defaults().audit(&tree);
        let triggers: Vec<NodeId> = report.issues().iter().map(|i| trigger(&tree, i)).collect();
        let mut sorted = triggers.clone();
        sorted.sort();
        prop_assert_eq!(triggers, sorted);
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Header rule
//
// Issues are LOW or MEDIUM, implicate only add_header directives, never fire
// for a block that opts into inheritance, and an allowlist can only shrink
// the set of findings.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn header_issues_are_well_formed(gen in arb_tree()) {
        let tree = gen.build();
        let report = defaults().audit(&tree);
        let opted_in: HashSet<NodeId> = tree
            .walk()
            .filter(|d| d.is_block())
            .filter(|d| {
                d.find("add_header_inherit")
                    .iter()
                    .any(|i| i.arg().is_some_and(|a| a.eq_ignore_ascii_case("on")))
            })
            .map(|d| d.id())
            .collect();

        for issue in report.issues().iter().filter(|i| i.rule_id() == AddHeaderRedefinition::ID) {
            prop_assert!(matches!(issue.severity(), Severity::Low | Severity::Medium));
            prop_assert!(issue.directives(&tree).all(|d| d.kind() == "add_header"));
            let owner = trigger(&tree, issue);
            prop_assert!(!opted_in.contains(&owner));
        }
    }

    #[test]
    fn allowlist_only_shrinks(gen in arb_tree()) {
        let tree = gen.build();
        let all = defaults().audit(&tree);
        let filtered = AuditorBuilder::with_defaults()
            .options(
                AddHeaderRedefinition::ID,
                RuleOptions::new().set("headers", "x-frame-options"),
            )
            .build()
            .unwrap()
            .audit(&tree);

        let count = |r: &nginx_audit::AuditReport| {
            r.issues().iter().filter(|i| i.rule_id() == AddHeaderRedefinition::ID).count()
        };
        prop_assert!(count(&filtered) <= count(&all));
        for issue in filtered.issues().iter().filter(|i| i.rule_id() == AddHeaderRedefinition::ID) {
            prop_assert!(issue.reason().to_lowercase().contains("\"x-frame-options\""));
            prop_assert_eq!(issue.severity(), Severity::Medium);
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Access rule
//
// Exactly one issue per allow/deny whose parent has a `return` anywhere below
// it, implicating the access directive followed by returns only.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn one_issue_per_bypassed_access_directive(gen in arb_tree()) {
        let tree = gen.build();
        let report = defaults().audit(&tree);
        let expected = tree
            .walk()
            .filter(|d| matches!(d.kind(), "allow" | "deny"))
            .filter(|d| !d.parent().unwrap().find_recursive("return").is_empty())
            .count();
        let issues: Vec<_> = report
            .issues()
            .iter()
            .filter(|i| i.rule_id() == ReturnWithAllowDeny::ID)
            .collect();
        prop_assert_eq!(issues.len(), expected);

        for issue in issues {
            let kinds: Vec<&str> = issue.directives(&tree).map(|d| d.kind()).collect();
            prop_assert!(matches!(kinds[0], "allow" | "deny"));
            prop_assert!(kinds.len() >= 2);
            prop_assert!(kinds[1..].iter().all(|k| *k == "return"));
            prop_assert_eq!(issue.severity(), Severity::Medium);
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 5: Severity threshold
//
// A minimum severity keeps exactly the issues at or above it.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn min_severity_is_a_filter(gen in arb_tree()) {
        let tree = gen.build();
        let all = defaults().audit(&tree);
        let medium = AuditorBuilder::with_defaults()
            .min_severity(Severity::Medium)
            .build()
            .unwrap()
            .audit(&tree);
        let expected: Vec<_> = all.at_least(Severity::Medium).cloned().collect();
        prop_assert_eq!(medium.issues(), expected.as_slice());
    }
}
