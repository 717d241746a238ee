//! Operation: scan dependency trees with Xray and attach impact paths.

use std::fmt::Write as _;

use artiflow_core::config::GlobalConfig;
use artiflow_core::graph::GraphNode;
use artiflow_core::scan::{Components, ScanResponse, Severity};
use artiflow_core::technology::Technology;
use artiflow_deptree::impact::build_impact_paths_for_scan_response;
use artiflow_util::errors::ArtiflowError;
use tracing::{info, warn};

use crate::inputs::{build_trees, TreeInputs};
use crate::xray::XrayClient;

/// Something that can scan one dependency graph.
#[allow(async_fn_in_trait)]
pub trait GraphScanner {
    async fn scan_graph(&self, graph: &GraphNode) -> miette::Result<ScanResponse>;
}

/// How the audit report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options for `artiflow audit`.
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Drop vulnerabilities and violations below this severity.
    pub min_severity: Option<Severity>,
    /// Keep only components that have a fixed version.
    pub fixable_only: bool,
    pub format: OutputFormat,
    /// Send one flat graph of every unique dependency instead of one graph per root.
    pub flat: bool,
    /// Platform project to scope the scan to.
    pub project: Option<String>,
}

/// Scan the trees built from `inputs` and print the report.
pub async fn audit(inputs: &TreeInputs, opts: &AuditOptions) -> miette::Result<()> {
    let config = GlobalConfig::load()?;
    let mut opts = opts.clone();
    if opts.min_severity.is_none() {
        if let Some(level) = &config.audit.min_severity {
            opts.min_severity = Some(Severity::from_str(level).ok_or_else(|| {
                ArtiflowError::Config {
                    message: format!("invalid [audit] min-severity '{level}'"),
                }
            })?);
        }
    }
    opts.fixable_only |= config.audit.fixable_only;

    let scanner = XrayClient::from_config(&config)?.with_project(opts.project.clone());
    let sp = artiflow_util::progress::spinner(&format!(
        "Scanning {} dependencies...",
        inputs.technology.formal_name()
    ));
    let results = run_audit(&scanner, inputs, &opts).await;
    sp.finish_and_clear();
    let results = results?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&results).map_err(|e| ArtiflowError::Generic {
                message: format!("Failed to serialize scan results: {e}"),
            })?;
            println!("{json}");
        }
        OutputFormat::Table => {
            if results.iter().all(ScanResponse::is_clean) {
                artiflow_util::progress::status("Audit", "no issues found");
            } else {
                print!("{}", render_report(&results));
            }
        }
    }

    let failing = results
        .iter()
        .flat_map(|r| &r.violations)
        .filter(|v| v.fail_build)
        .count();
    if failing > 0 {
        return Err(ArtiflowError::Generic {
            message: format!("Audit failed: {failing} violation(s) are marked to fail the build"),
        }
        .into());
    }
    Ok(())
}

/// Build the trees, scan them, attach impact paths and apply the filters.
pub async fn run_audit<S: GraphScanner>(
    scanner: &S,
    inputs: &TreeInputs,
    opts: &AuditOptions,
) -> miette::Result<Vec<ScanResponse>> {
    let tech = inputs.technology;
    let trees = build_trees(inputs)?;
    if trees.trees.iter().all(|tree| tree.nodes.is_empty()) {
        return Err(ArtiflowError::Scan {
            message: format!(
                "no {} dependencies were found; build the project and re-run the audit",
                tech.formal_name()
            ),
        }
        .into());
    }

    let graphs = if opts.flat {
        vec![trees.flat_tree()]
    } else {
        trees.trees.clone()
    };
    let mut results = scan_trees(scanner, tech, &graphs).await?;
    build_impact_paths_for_scan_response(&mut results, &trees.trees);
    filter_results(&mut results, opts.min_severity, opts.fixable_only);
    Ok(results)
}

/// Scan each graph in turn, tagging findings with the technology.
///
/// The first failing scan stops the loop. Results gathered before it are
/// returned; if there are none the audit fails.
pub async fn scan_trees<S: GraphScanner>(
    scanner: &S,
    technology: Technology,
    graphs: &[GraphNode],
) -> miette::Result<Vec<ScanResponse>> {
    let formal = technology.formal_name();
    let mut results = Vec::new();
    let mut failure = None;
    for graph in graphs {
        info!("Scanning {} {formal} dependencies...", graph.nodes.len());
        match scanner.scan_graph(graph).await {
            Ok(mut response) => {
                for vulnerability in &mut response.vulnerabilities {
                    vulnerability.technology = formal.to_string();
                }
                for violation in &mut response.violations {
                    violation.technology = formal.to_string();
                }
                results.push(response);
            }
            Err(e) => {
                warn!("scanning {formal} dependencies of {} failed: {e}", graph.id);
                failure = Some(e.to_string());
                break;
            }
        }
    }
    if results.is_empty() {
        let reason = failure.unwrap_or_else(|| "no dependency trees to scan".to_string());
        return Err(ArtiflowError::Scan {
            message: format!("audit failed: {reason}"),
        }
        .into());
    }
    Ok(results)
}

/// Apply the minimum severity and fixable-only filters to vulnerabilities and
/// violations. Licenses are left alone.
pub fn filter_results(results: &mut [ScanResponse], min_severity: Option<Severity>, fixable_only: bool) {
    if min_severity.is_none() && !fixable_only {
        return;
    }
    let min = min_severity.unwrap_or_default();
    for result in results {
        result.vulnerabilities.retain_mut(|v| {
            let severity = v.severity_level();
            keep_issue(&mut v.components, severity, min, fixable_only)
        });
        result.violations.retain_mut(|v| {
            let severity = v.severity_level();
            keep_issue(&mut v.components, severity, min, fixable_only)
        });
    }
}

fn keep_issue(components: &mut Components, severity: Severity, min: Severity, fixable_only: bool) -> bool {
    if fixable_only {
        components.retain(|_, component| !component.fixed_versions.is_empty());
        if components.is_empty() {
            return false;
        }
    }
    severity >= min
}

/// Human readable report, most severe first.
pub fn render_report(results: &[ScanResponse]) -> String {
    let mut out = String::new();

    let mut vulnerabilities: Vec<_> = results.iter().flat_map(|r| &r.vulnerabilities).collect();
    vulnerabilities.sort_by_key(|v| std::cmp::Reverse(v.severity_level()));
    if !vulnerabilities.is_empty() {
        let _ = writeln!(out, "Vulnerabilities ({}):", vulnerabilities.len());
        for v in vulnerabilities {
            let cves: Vec<&str> = v.cves.iter().map(|c| c.id.as_str()).filter(|id| !id.is_empty()).collect();
            let _ = writeln!(
                out,
                "  [{}] {} {}",
                v.severity_level().as_str().to_uppercase(),
                v.issue_id,
                cves.join(",")
            );
            write_components(&mut out, &v.components);
            if !v.summary.is_empty() {
                let _ = writeln!(out, "    {}", v.summary);
            }
        }
        out.push('\n');
    }

    let mut violations: Vec<_> = results.iter().flat_map(|r| &r.violations).collect();
    violations.sort_by_key(|v| std::cmp::Reverse(v.severity_level()));
    if !violations.is_empty() {
        let _ = writeln!(out, "Violations ({}):", violations.len());
        for v in violations {
            let watch = if v.watch_name.is_empty() {
                String::new()
            } else {
                format!(" (watch: {})", v.watch_name)
            };
            let _ = writeln!(
                out,
                "  [{}] {} {}{watch}",
                v.severity_level().as_str().to_uppercase(),
                v.kind,
                v.issue_id
            );
            write_components(&mut out, &v.components);
        }
        out.push('\n');
    }

    let licenses: Vec<_> = results.iter().flat_map(|r| &r.licenses).collect();
    if !licenses.is_empty() {
        let _ = writeln!(out, "Licenses ({}):", licenses.len());
        for license in licenses {
            for id in license.components.keys() {
                let _ = writeln!(out, "  {:<16} {id}", license.key);
            }
        }
        out.push('\n');
    }
    out
}

fn write_components(out: &mut String, components: &Components) {
    for (id, component) in components {
        let fix = if component.fixed_versions.is_empty() {
            String::new()
        } else {
            format!(" (fix: {})", component.fixed_versions.join(", "))
        };
        let _ = writeln!(out, "    {id}{fix}");
        for path in &component.impact_paths {
            let hops: Vec<&str> = path.iter().map(|node| node.component_id.as_str()).collect();
            let _ = writeln!(out, "      {}", hops.join(" > "));
        }
    }
}
