//! Xray graph-scan responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Issue severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse an Xray severity string, ignoring case. Unrecognised values map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Unknown,
        }
    }

    /// Strict variant of [`Severity::parse`] for user input.
    pub fn from_str(s: &str) -> Option<Self> {
        match Self::parse(s) {
            Self::Unknown if !s.trim().eq_ignore_ascii_case("unknown") => None,
            severity => Some(severity),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hop of an impact path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactPathNode {
    pub component_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_path: String,
}

impl ImpactPathNode {
    pub fn new(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            full_path: String::new(),
        }
    }
}

/// A vulnerable, violating or licensed component reported by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixed_versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impact_paths: Vec<Vec<ImpactPathNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpes: Vec<String>,
}

/// Components keyed by component id.
pub type Components = BTreeMap<String, Component>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cve {
    #[serde(default, rename = "cve")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cvss_v2_score: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cvss_v3_score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default)]
    pub issue_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cves: Vec<Cve>,
    #[serde(default)]
    pub components: Components,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub technology: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(default)]
    pub issue_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub severity: String,
    /// `security` or `license`.
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cves: Vec<Cve>,
    #[serde(default)]
    pub components: Components,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub watch_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license_key: String,
    #[serde(default)]
    pub fail_build: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub technology: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default, rename = "license_key")]
    pub key: String,
    #[serde(default, rename = "license_name")]
    pub name: String,
    #[serde(default)]
    pub components: Components,
}

/// The result of scanning one dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    #[serde(default)]
    pub scan_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_type: String,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub licenses: Vec<License>,
}

impl Vulnerability {
    pub fn severity_level(&self) -> Severity {
        Severity::parse(&self.severity)
    }
}

impl Violation {
    pub fn severity_level(&self) -> Severity {
        Severity::parse(&self.severity)
    }
}

impl ScanResponse {
    /// Returns `true` if the scan reported nothing at all.
    pub fn is_clean(&self) -> bool {
        self.vulnerabilities.is_empty() && self.violations.is_empty() && self.licenses.is_empty()
    }
}
