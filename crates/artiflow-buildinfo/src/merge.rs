//! Merge partial build-info fragments into modules, env, VCS and issues.

use std::collections::BTreeMap;

use artiflow_core::buildinfo::{
    AffectedIssue, Artifact, Checksum, Dependency, Env, Issues, Module, ModuleType, Partial, Vcs,
};
use artiflow_util::errors::ArtiflowError;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

/// Everything extracted from a build's partials.
///
/// Module, artifact and dependency order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedBuildInfo {
    pub modules: Vec<Module>,
    pub env: Env,
    pub vcs_list: Vec<Vcs>,
    pub issues: Issues,
}

/// A filter failed part-way through. `partial` holds what was merged before it.
#[derive(Debug, Error, Diagnostic)]
#[error("Failed merging partial build-info: {source}")]
pub struct ExtractError {
    pub partial: Box<ExtractedBuildInfo>,
    pub source: ArtiflowError,
}

#[derive(Debug, Default)]
struct PartialModule {
    module_type: ModuleType,
    artifacts: BTreeMap<String, Artifact>,
    dependencies: BTreeMap<String, Dependency>,
    checksum: Option<Checksum>,
}

#[derive(Debug, Default)]
struct Aggregation {
    modules: BTreeMap<String, PartialModule>,
    env: Env,
    vcs_list: Vec<Vcs>,
    issues: Issues,
    affected_issues: BTreeMap<String, AffectedIssue>,
}

impl Aggregation {
    fn module(&mut self, partial: &Partial) -> &mut PartialModule {
        let module = self.modules.entry(partial.module_id.clone()).or_default();
        // A generic fragment never downgrades a typed module.
        if partial.module_type != ModuleType::Generic {
            module.module_type = partial.module_type;
        }
        module
    }

    fn finish(self) -> ExtractedBuildInfo {
        let modules = self
            .modules
            .into_iter()
            .map(|(id, partial)| Module {
                module_type: partial.module_type,
                id,
                artifacts: partial.artifacts.into_values().collect(),
                dependencies: partial.dependencies.into_values().collect(),
                checksum: partial.checksum.unwrap_or_default(),
            })
            .collect();
        let mut issues = self.issues;
        issues.affected_issues = self.affected_issues.into_values().collect();
        ExtractedBuildInfo {
            modules,
            env: self.env,
            vcs_list: self.vcs_list,
            issues,
        }
    }
}

/// Merge `partials` (already ordered by timestamp).
///
/// Each fragment contributes through the first populated payload among
/// artifacts, dependencies, VCS (with optional issues), env, and the checksum
/// of a build-type module. Artifacts collapse on `name-sha1-md5`, dependencies
/// on `id-sha1-md5-scopes`, affected issues on their key; later values win.
/// Env fragments pass through `include` then `exclude`. A filter error stops
/// the merge and is returned with everything merged up to that point.
pub fn extract_build_info_data<I, E>(
    partials: &[Partial],
    include: I,
    exclude: E,
) -> Result<ExtractedBuildInfo, ExtractError>
where
    I: Fn(&Env) -> Result<Env, ArtiflowError>,
    E: Fn(&Env) -> Result<Env, ArtiflowError>,
{
    let mut agg = Aggregation::default();
    for partial in partials {
        if let Some(artifacts) = &partial.artifacts {
            let module = agg.module(partial);
            for artifact in artifacts {
                module.artifacts.insert(artifact.dedup_key(), artifact.clone());
            }
        } else if let Some(dependencies) = &partial.dependencies {
            let module = agg.module(partial);
            for dependency in dependencies {
                module
                    .dependencies
                    .insert(dependency.dedup_key(), dependency.clone());
            }
        } else if let Some(vcs_list) = &partial.vcs_list {
            agg.vcs_list.extend(vcs_list.iter().cloned());
            if let Some(issues) = &partial.issues {
                agg.issues.tracker = issues.tracker.clone();
                agg.issues.aggregate_build_issues = issues.aggregate_build_issues;
                agg.issues.aggregation_build_status = issues.aggregation_build_status.clone();
                for issue in &issues.affected_issues {
                    agg.affected_issues.insert(issue.key.clone(), issue.clone());
                }
            }
        } else if let Some(env) = &partial.env {
            let included = match include(env) {
                Ok(env) => env,
                Err(source) => return Err(abort(agg, source)),
            };
            let kept = match exclude(&included) {
                Ok(env) => env,
                Err(source) => return Err(abort(agg, source)),
            };
            debug!("Env fragment: kept {} of {} variables", kept.len(), env.len());
            agg.env.extend(kept);
        } else if partial.module_type == ModuleType::Build {
            let checksum = partial.checksum.clone();
            agg.module(partial).checksum = checksum;
        }
    }
    Ok(agg.finish())
}

fn abort(agg: Aggregation, source: ArtiflowError) -> ExtractError {
    ExtractError {
        partial: Box::new(agg.finish()),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{exclude_filter, include_filter};
    use artiflow_core::buildinfo::Tracker;

    fn pass(env: &Env) -> Result<Env, ArtiflowError> {
        Ok(env.clone())
    }

    fn artifact(name: &str, sha1: &str, md5: &str) -> Artifact {
        Artifact {
            name: name.to_string(),
            path: format!("libs-release/{name}"),
            checksum: Checksum {
                sha1: sha1.to_string(),
                md5: md5.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn artifacts_partial(module: &str, artifacts: Vec<Artifact>) -> Partial {
        Partial {
            module_id: module.to_string(),
            artifacts: Some(artifacts),
            ..Default::default()
        }
    }

    fn issues_partial(key: &str, summary: &str) -> Partial {
        Partial {
            vcs_list: Some(vec![Vcs {
                url: "https://git.example.com/app.git".to_string(),
                revision: "abc123".to_string(),
                ..Default::default()
            }]),
            issues: Some(Issues {
                tracker: Some(Tracker {
                    name: "JIRA".to_string(),
                    version: "1.0".to_string(),
                }),
                affected_issues: vec![AffectedIssue {
                    key: key.to_string(),
                    summary: summary.to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn env_partial(pairs: &[(&str, &str)]) -> Partial {
        Partial {
            env: Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn identical_artifact_is_merged_once() {
        let partials = vec![
            artifacts_partial("app", vec![artifact("app.jar", "s1", "m1")]),
            artifacts_partial("app", vec![artifact("app.jar", "s1", "m1")]),
        ];
        let extracted = extract_build_info_data(&partials, pass, pass).unwrap();
        assert_eq!(extracted.modules.len(), 1);
        assert_eq!(extracted.modules[0].artifacts.len(), 1);
    }

    #[test]
    fn artifacts_with_different_checksums_are_kept() {
        let partials = vec![artifacts_partial(
            "app",
            vec![artifact("app.jar", "s1", "m1"), artifact("app.jar", "s2", "m2")],
        )];
        let extracted = extract_build_info_data(&partials, pass, pass).unwrap();
        assert_eq!(extracted.modules[0].artifacts.len(), 2);
    }

    #[test]
    fn same_issue_key_collapses_last_write_wins() {
        let partials = vec![issues_partial("TEST-1", "a"), issues_partial("TEST-1", "b")];
        let extracted = extract_build_info_data(&partials, pass, pass).unwrap();
        let affected = &extracted.issues.affected_issues;
        assert_eq!(affected.len(), 1);
        assert_eq!(affected[0].key, "TEST-1");
        assert_eq!(affected[0].summary, "b");
        assert_eq!(extracted.vcs_list.len(), 2);
        assert_eq!(extracted.issues.tracker.as_ref().unwrap().name, "JIRA");
    }

    #[test]
    fn dependencies_dedup_on_scopes_too() {
        let dep = |scope: &str| Dependency {
            id: "org.slf4j:slf4j-api:2.0.9".to_string(),
            scopes: vec![scope.to_string()],
            ..Default::default()
        };
        let partials = vec![
            Partial {
                module_id: "app".to_string(),
                module_type: ModuleType::Maven,
                dependencies: Some(vec![dep("compile"), dep("compile")]),
                ..Default::default()
            },
            Partial {
                module_id: "app".to_string(),
                module_type: ModuleType::Maven,
                dependencies: Some(vec![dep("test")]),
                ..Default::default()
            },
        ];
        let extracted = extract_build_info_data(&partials, pass, pass).unwrap();
        let module = &extracted.modules[0];
        assert_eq!(module.module_type, ModuleType::Maven);
        assert_eq!(module.dependencies.len(), 2);
    }

    #[test]
    fn generic_fragment_keeps_earlier_module_type() {
        let partials = vec![
            Partial {
                module_id: "app".to_string(),
                module_type: ModuleType::Maven,
                dependencies: Some(vec![Dependency {
                    id: "junit:junit:4.13.2".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            artifacts_partial("app", vec![artifact("app.jar", "s1", "m1")]),
        ];
        let extracted = extract_build_info_data(&partials, pass, pass).unwrap();
        let module = &extracted.modules[0];
        assert_eq!(module.module_type, ModuleType::Maven);
        assert_eq!(module.artifacts.len(), 1);
        assert_eq!(module.dependencies.len(), 1);
    }

    #[test]
    fn env_passes_through_filters() {
        let partials = vec![
            env_partial(&[("buildInfo.env.CI", "true"), ("buildInfo.env.API_TOKEN", "t")]),
            env_partial(&[("buildInfo.env.CI", "false")]),
        ];
        let extracted =
            extract_build_info_data(&partials, include_filter("*"), exclude_filter("*token*"))
                .unwrap();
        assert_eq!(extracted.env.len(), 1);
        assert_eq!(extracted.env["buildInfo.env.CI"], "false");
    }

    #[test]
    fn filter_error_returns_partial_aggregation() {
        let partials = vec![
            artifacts_partial("app", vec![artifact("app.jar", "s1", "m1")]),
            env_partial(&[("buildInfo.env.CI", "true")]),
            artifacts_partial("lib", vec![artifact("lib.jar", "s2", "m2")]),
        ];
        let err =
            extract_build_info_data(&partials, include_filter("[bad"), pass).unwrap_err();
        assert!(matches!(err.source, ArtiflowError::EnvFilter { .. }));
        assert_eq!(err.partial.modules.len(), 1);
        assert_eq!(err.partial.modules[0].id, "app");
    }

    #[test]
    fn build_module_receives_checksum() {
        let partials = vec![Partial {
            module_id: "other-build/7".to_string(),
            module_type: ModuleType::Build,
            checksum: Some(Checksum {
                sha1: "s".to_string(),
                md5: "m".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }];
        let extracted = extract_build_info_data(&partials, pass, pass).unwrap();
        let module = &extracted.modules[0];
        assert_eq!(module.module_type, ModuleType::Build);
        assert_eq!(module.checksum.sha1, "s");
    }

    #[test]
    fn empty_module_id_is_a_valid_module() {
        let partials = vec![artifacts_partial("", vec![artifact("a.zip", "1", "2")])];
        let extracted = extract_build_info_data(&partials, pass, pass).unwrap();
        assert_eq!(extracted.modules[0].id, "");
    }
}
