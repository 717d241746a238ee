//! Build-info entities and the partial fragments they are assembled from.
//!
//! Field names follow the build-info JSON schema (camelCase), so documents
//! produced here can be published as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current build-info schema version.
pub const BUILD_INFO_VERSION: &str = "1.0.1";

/// Environment variables collected for a build.
pub type Env = BTreeMap<String, String>;

/// File digests. Empty strings mean "not computed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub md5: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha256: String,
}

impl Checksum {
    pub fn is_empty(&self) -> bool {
        self.sha1.is_empty() && self.md5.is_empty() && self.sha256.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_deployment_repo: String,
    #[serde(flatten)]
    pub checksum: Checksum,
}

impl Artifact {
    /// Key under which duplicate artifacts collapse when partials are merged.
    pub fn dedup_key(&self) -> String {
        format!("{}-{}-{}", self.name, self.checksum.sha1, self.checksum.md5)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Each entry is one chain of requesters, nearest parent first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_by: Vec<Vec<String>>,
    #[serde(flatten)]
    pub checksum: Checksum,
}

impl Dependency {
    /// Key under which duplicate dependencies collapse when partials are merged.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.id,
            self.checksum.sha1,
            self.checksum.md5,
            self.scopes.join(",")
        )
    }

    /// Immediate requesters: the first element of every requested-by chain.
    pub fn direct_parents(&self) -> impl Iterator<Item = &str> {
        self.requested_by
            .iter()
            .filter_map(|chain| chain.first().map(String::as_str))
    }
}

/// Kind of a build-info module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    #[default]
    Generic,
    /// A module that references another published build.
    Build,
    Maven,
    Gradle,
    Npm,
    Go,
    Nuget,
    Python,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(default, rename = "type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(flatten)]
    pub checksum: Checksum,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vcs {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedIssue {
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default)]
    pub aggregated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker: Option<Tracker>,
    #[serde(default)]
    pub aggregate_build_issues: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub aggregation_build_status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_issues: Vec<AffectedIssue>,
}

/// One command invocation's contribution to a build.
///
/// In practice exactly one of the payload fields is set. `None` means "not
/// part of this fragment", while `Some(vec![])` still registers the module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partial {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module_id: String,
    #[serde(default)]
    pub module_type: ModuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Dependency>>,
    #[serde(default, rename = "vcs", skip_serializing_if = "Option::is_none")]
    pub vcs_list: Option<Vec<Vcs>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Issues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Env>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub version: String,
}

/// A complete build-info document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    #[serde(default)]
    pub version: String,
    pub name: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_agent: Option<Agent>,
    #[serde(default)]
    pub started: String,
    #[serde(default)]
    pub duration_millis: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub principal: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vcs: Vec<Vcs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Module>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Env,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Issues>,
}

impl BuildInfo {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            version: BUILD_INFO_VERSION.to_string(),
            name: name.into(),
            number: number.into(),
            ..Self::default()
        }
    }

    /// Parse a build-info JSON document.
    pub fn from_json(content: &str) -> miette::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            artiflow_util::errors::ArtiflowError::Parse {
                message: format!("Invalid build-info document: {e}"),
            }
            .into()
        })
    }
}
