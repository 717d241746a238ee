//! Attach impact paths to scan results.
//!
//! An impact path lists the nodes from a tree root down to an affected
//! component, both ends included. Every distinct route is recorded.

use std::collections::HashMap;

use artiflow_core::graph::GraphNode;
use artiflow_core::scan::{Components, ImpactPathNode, ScanResponse};

/// Affected component id to the impact paths found so far.
pub type IssuesMap = HashMap<String, Vec<Vec<ImpactPathNode>>>;

/// Walk `node` depth-first and record a path for every id present in `issues`.
pub fn set_paths_for_issues(
    node: &GraphNode,
    issues: &mut IssuesMap,
    path_from_root: &mut Vec<ImpactPathNode>,
) {
    path_from_root.push(ImpactPathNode::new(node.id.as_str()));
    if let Some(paths) = issues.get_mut(&node.id) {
        paths.push(path_from_root.clone());
    }
    for child in &node.nodes {
        set_paths_for_issues(child, issues, path_from_root);
    }
    path_from_root.pop();
}

/// Start an issues map with an empty entry per component id.
pub fn fill_issues_map<'a>(issues: &mut IssuesMap, components: impl IntoIterator<Item = &'a Components>) {
    for components in components {
        for id in components.keys() {
            issues.entry(id.clone()).or_default();
        }
    }
}

/// Walk every tree, filling `issues`.
pub fn build_impact_paths(issues: &mut IssuesMap, trees: &[GraphNode]) {
    let mut path = Vec::new();
    for tree in trees {
        set_paths_for_issues(tree, issues, &mut path);
    }
}

/// Replace each component's impact paths with those found. Components that
/// no tree reaches keep what they had. Fixed versions and CPEs are untouched.
pub fn update_components_with_impact_paths(components: &mut Components, issues: &IssuesMap) {
    for (id, component) in components.iter_mut() {
        match issues.get(id) {
            Some(paths) if !paths.is_empty() => component.impact_paths = paths.clone(),
            _ => {}
        }
    }
}

/// Compute impact paths for every category of every response. Each category
/// gets its own issues map.
pub fn build_impact_paths_for_scan_response(responses: &mut [ScanResponse], trees: &[GraphNode]) {
    for response in responses.iter_mut() {
        if !response.vulnerabilities.is_empty() {
            let mut issues = IssuesMap::new();
            fill_issues_map(&mut issues, response.vulnerabilities.iter().map(|v| &v.components));
            build_impact_paths(&mut issues, trees);
            for vulnerability in &mut response.vulnerabilities {
                update_components_with_impact_paths(&mut vulnerability.components, &issues);
            }
        }
        if !response.violations.is_empty() {
            let mut issues = IssuesMap::new();
            fill_issues_map(&mut issues, response.violations.iter().map(|v| &v.components));
            build_impact_paths(&mut issues, trees);
            for violation in &mut response.violations {
                update_components_with_impact_paths(&mut violation.components, &issues);
            }
        }
        if !response.licenses.is_empty() {
            let mut issues = IssuesMap::new();
            fill_issues_map(&mut issues, response.licenses.iter().map(|l| &l.components));
            build_impact_paths(&mut issues, trees);
            for license in &mut response.licenses {
                update_components_with_impact_paths(&mut license.components, &issues);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artiflow_core::scan::{Component, License, Violation, Vulnerability};

    fn ids(path: &[ImpactPathNode]) -> Vec<&str> {
        path.iter().map(|n| n.component_id.as_str()).collect()
    }

    fn components(entries: &[(&str, &str)]) -> Components {
        entries
            .iter()
            .map(|(id, fixed)| {
                (
                    id.to_string(),
                    Component {
                        fixed_versions: vec![fixed.to_string()],
                        cpes: vec![format!("cpe:/o:vendor:product:{fixed}")],
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn paths_include_root_and_component() {
        let root = GraphNode::with_children(
            "root",
            vec![
                GraphNode::new("child1"),
                GraphNode::with_children("child2", vec![GraphNode::new("child4")]),
                GraphNode::with_children("child3", vec![GraphNode::new("child5")]),
            ],
        );
        let mut issues = IssuesMap::new();
        for id in ["child1", "child4", "child5"] {
            issues.insert(id.to_string(), Vec::new());
        }
        set_paths_for_issues(&root, &mut issues, &mut Vec::new());

        assert_eq!(ids(&issues["child1"][0]), vec!["root", "child1"]);
        assert_eq!(ids(&issues["child4"][0]), vec!["root", "child2", "child4"]);
        assert_eq!(ids(&issues["child5"][0]), vec!["root", "child3", "child5"]);
    }

    #[test]
    fn every_route_is_recorded() {
        let trees = vec![
            GraphNode::with_children(
                "dep1",
                vec![GraphNode::with_children("dep2", vec![GraphNode::new("dep3")])],
            ),
            GraphNode::with_children(
                "dep7",
                vec![GraphNode::with_children(
                    "dep4",
                    vec![GraphNode::new("dep2"), GraphNode::new("dep5"), GraphNode::new("dep6")],
                )],
            ),
        ];
        let mut responses = vec![ScanResponse {
            vulnerabilities: vec![Vulnerability {
                components: components(&[("dep1", "1.2.3"), ("dep2", "3.0.0")]),
                ..Default::default()
            }],
            violations: vec![Violation {
                components: components(&[("dep2", "4.5.6")]),
                ..Default::default()
            }],
            licenses: vec![License {
                components: components(&[("dep3", "7.8.9")]),
                ..Default::default()
            }],
            ..Default::default()
        }];

        build_impact_paths_for_scan_response(&mut responses, &trees);
        let response = &responses[0];

        let vuln = &response.vulnerabilities[0].components;
        assert_eq!(vuln["dep1"].impact_paths.len(), 1);
        assert_eq!(ids(&vuln["dep1"].impact_paths[0]), vec!["dep1"]);
        assert_eq!(ids(&vuln["dep2"].impact_paths[0]), vec!["dep1", "dep2"]);
        assert_eq!(ids(&vuln["dep2"].impact_paths[1]), vec!["dep7", "dep4", "dep2"]);
        assert_eq!(vuln["dep1"].fixed_versions, vec!["1.2.3"]);
        assert_eq!(vuln["dep1"].cpes, vec!["cpe:/o:vendor:product:1.2.3"]);

        let violation = &response.violations[0].components["dep2"];
        assert_eq!(violation.impact_paths.len(), 2);
        assert_eq!(violation.fixed_versions, vec!["4.5.6"]);

        let license = &response.licenses[0].components["dep3"];
        assert_eq!(ids(&license.impact_paths[0]), vec!["dep1", "dep2", "dep3"]);
    }

    #[test]
    fn categories_are_computed_independently() {
        let trees = vec![GraphNode::with_children(
            "npm://app:1.0.0",
            vec![GraphNode::with_children(
                "npm://express:4.18.2",
                vec![GraphNode::new("npm://qs:6.11.0")],
            )],
        )];
        let mut responses = vec![ScanResponse {
            vulnerabilities: vec![Vulnerability {
                components: components(&[("npm://qs:6.11.0", "6.11.1")]),
                ..Default::default()
            }],
            licenses: vec![License {
                key: "BSD-3-Clause".to_string(),
                components: components(&[("npm://qs:6.11.0", "")]),
                ..Default::default()
            }],
            ..Default::default()
        }];
        build_impact_paths_for_scan_response(&mut responses, &trees);
        let vuln_paths = &responses[0].vulnerabilities[0].components["npm://qs:6.11.0"].impact_paths;
        let license_paths = &responses[0].licenses[0].components["npm://qs:6.11.0"].impact_paths;
        assert_eq!(vuln_paths.len(), 1);
        assert_eq!(vuln_paths, license_paths);
    }

    #[test]
    fn unreachable_component_is_left_untouched() {
        let existing = vec![vec![ImpactPathNode::new("elsewhere")]];
        let mut comps = Components::new();
        comps.insert(
            "npm://ghost:1.0.0".to_string(),
            Component {
                impact_paths: existing.clone(),
                ..Default::default()
            },
        );
        let mut issues = IssuesMap::new();
        fill_issues_map(&mut issues, [&comps]);
        build_impact_paths(&mut issues, &[GraphNode::new("npm://app:1.0.0")]);
        update_components_with_impact_paths(&mut comps, &issues);
        assert_eq!(comps["npm://ghost:1.0.0"].impact_paths, existing);
    }
}
