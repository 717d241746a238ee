//! Operations: collect partial build-info and publish the merged document.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use artiflow_buildinfo::filter::{exclude_filter, include_filter};
use artiflow_buildinfo::publish::{assemble_build_info, AssembleOptions};
use artiflow_buildinfo::{extract_build_info_data, BuildKey, BuildStore};
use artiflow_core::buildinfo::{
    AffectedIssue, Artifact, BuildInfo, Checksum, Dependency, Env, Issues, ModuleType, Partial,
    Tracker, Vcs,
};
use artiflow_core::config::BuildConfig;
use artiflow_util::errors::ArtiflowError;
use artiflow_util::hash::{checksums_bytes, checksums_file, FileChecksums};
use artiflow_util::progress;
use chrono::Utc;
use tracing::{debug, info};

/// Prefix of collected environment variable keys.
pub const ENV_PREFIX: &str = "buildInfo.env.";

/// Files recorded as artifacts or dependencies of one module.
#[derive(Debug, Clone, Default)]
pub struct FilesOptions {
    /// Module id; the build name is used when unset.
    pub module: Option<String>,
    pub files: Vec<PathBuf>,
    /// Dependency scopes. Ignored for artifacts.
    pub scopes: Vec<String>,
}

/// Options for `artiflow build add-vcs`.
#[derive(Debug, Clone, Default)]
pub struct VcsOptions {
    pub url: String,
    pub revision: String,
    pub branch: String,
    pub message: String,
    /// Issue tracker name. Issues are only published when it is set.
    pub tracker: Option<String>,
    pub tracker_version: Option<String>,
    pub aggregate: bool,
    pub aggregation_status: Option<String>,
    /// `KEY` or `KEY=summary`.
    pub issues: Vec<String>,
}

/// Options for `artiflow build publish`.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Print the document and keep the partials.
    pub dry_run: bool,
    pub build_url: Option<String>,
    pub principal: Option<String>,
    /// Write the document here instead of stdout.
    pub output: Option<PathBuf>,
}

fn checksum_of(sums: FileChecksums) -> Checksum {
    Checksum {
        sha1: sums.sha1,
        md5: sums.md5,
        sha256: sums.sha256,
    }
}

fn file_checksum(path: &Path) -> miette::Result<Checksum> {
    let sums = checksums_file(path).map_err(|e| ArtiflowError::BuildInfo {
        message: format!("Failed to checksum {}: {e}", path.display()),
    })?;
    Ok(checksum_of(sums))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Record files as artifacts of a module.
pub fn add_artifacts(store: &BuildStore, key: &BuildKey, opts: &FilesOptions) -> miette::Result<usize> {
    let mut artifacts = Vec::with_capacity(opts.files.len());
    for path in &opts.files {
        artifacts.push(Artifact {
            kind: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
            name: file_name(path),
            path: path.display().to_string(),
            original_deployment_repo: String::new(),
            checksum: file_checksum(path)?,
        });
    }
    let count = artifacts.len();
    store.save_partial(
        key,
        Partial {
            module_id: opts.module.clone().unwrap_or_default(),
            artifacts: Some(artifacts),
            ..Default::default()
        },
    )?;
    info!("Recorded {count} artifact(s) for build {}/{}", key.name, key.number);
    Ok(count)
}

/// Record files as dependencies of a module.
pub fn add_dependencies(store: &BuildStore, key: &BuildKey, opts: &FilesOptions) -> miette::Result<usize> {
    let mut dependencies = Vec::with_capacity(opts.files.len());
    for path in &opts.files {
        dependencies.push(Dependency {
            id: file_name(path),
            scopes: opts.scopes.clone(),
            checksum: file_checksum(path)?,
            ..Default::default()
        });
    }
    let count = dependencies.len();
    store.save_partial(
        key,
        Partial {
            module_id: opts.module.clone().unwrap_or_default(),
            dependencies: Some(dependencies),
            ..Default::default()
        },
    )?;
    info!("Recorded {count} dependency file(s) for build {}/{}", key.name, key.number);
    Ok(count)
}

/// Record environment variables, keys prefixed with [`ENV_PREFIX`].
/// Variables whose name or value is not valid UTF-8 are skipped. Filtering
/// happens at publish time.
pub fn collect_env<I, K, V>(store: &BuildStore, key: &BuildKey, vars: I) -> miette::Result<usize>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut env = Env::new();
    for (name, value) in vars {
        match (name.into().into_string(), value.into().into_string()) {
            (Ok(name), Ok(value)) => {
                env.insert(format!("{ENV_PREFIX}{name}"), value);
            }
            (Ok(name), Err(_)) => debug!("Skipping {name}: value is not valid UTF-8"),
            (Err(name), _) => debug!("Skipping {}: name is not valid UTF-8", name.to_string_lossy()),
        }
    }
    let count = env.len();
    store.save_partial(
        key,
        Partial {
            env: Some(env),
            ..Default::default()
        },
    )?;
    Ok(count)
}

fn parse_issue(raw: &str) -> AffectedIssue {
    let (key, summary) = match raw.split_once('=') {
        Some((key, summary)) => (key.trim(), summary.trim()),
        None => (raw.trim(), ""),
    };
    AffectedIssue {
        key: key.to_string(),
        summary: summary.to_string(),
        ..Default::default()
    }
}

/// Record version control details and, optionally, affected issues.
pub fn add_vcs(store: &BuildStore, key: &BuildKey, opts: &VcsOptions) -> miette::Result<()> {
    if opts.url.is_empty() && opts.revision.is_empty() {
        return Err(ArtiflowError::BuildInfo {
            message: "add-vcs needs at least a url or a revision".to_string(),
        }
        .into());
    }
    let issues = opts.tracker.as_ref().map(|name| Issues {
        tracker: Some(Tracker {
            name: name.clone(),
            version: opts.tracker_version.clone().unwrap_or_default(),
        }),
        aggregate_build_issues: opts.aggregate,
        aggregation_build_status: opts.aggregation_status.clone().unwrap_or_default(),
        affected_issues: opts.issues.iter().map(|s| parse_issue(s)).collect(),
    });
    store.save_partial(
        key,
        Partial {
            vcs_list: Some(vec![Vcs {
                url: opts.url.clone(),
                revision: opts.revision.clone(),
                branch: opts.branch.clone(),
                message: opts.message.clone(),
            }]),
            issues,
            ..Default::default()
        },
    )?;
    Ok(())
}

/// Reference another locally published build as a module of this one.
pub fn append_build(store: &BuildStore, key: &BuildKey, other: &BuildKey) -> miette::Result<()> {
    let published = store.read_published(other)?;
    let sums = checksums_bytes(&published);
    store.save_partial(
        key,
        Partial {
            module_id: format!("{}/{}", other.name, other.number),
            module_type: ModuleType::Build,
            checksum: Some(checksum_of(sums)),
            ..Default::default()
        },
    )?;
    debug!("Appended build {}/{} to {}/{}", other.name, other.number, key.name, key.number);
    Ok(())
}

/// Merge every partial of a build into a build-info document.
///
/// The document is written to `opts.output`, or printed when no output is
/// given. Unless `dry_run` is set, the partials are deleted afterwards and a
/// copy is kept for `append`.
pub fn publish(
    store: &BuildStore,
    key: &BuildKey,
    config: &BuildConfig,
    opts: &PublishOptions,
) -> miette::Result<BuildInfo> {
    let partials = store.read_partials(key)?;
    if partials.is_empty() {
        return Err(ArtiflowError::BuildInfo {
            message: format!("no build-info collected for {}/{}", key.name, key.number),
        }
        .into());
    }
    debug!("Merging {} partial(s) of {}/{}", partials.len(), key.name, key.number);

    let extracted = extract_build_info_data(
        &partials,
        include_filter(config.env_include.clone()),
        exclude_filter(config.env_exclude.clone()),
    )?;
    let started = store
        .read_details(key)?
        .map(|details| details.started)
        .unwrap_or_else(Utc::now);
    let assemble = AssembleOptions {
        build_url: opts.build_url.clone(),
        principal: opts.principal.clone(),
    };
    let mut build_info = assemble_build_info(key, started, extracted, &assemble);
    if let Some(project) = &key.project {
        build_info
            .properties
            .insert("buildInfo.project".to_string(), project.clone());
    }

    let json = serde_json::to_string_pretty(&build_info).map_err(|e| ArtiflowError::BuildInfo {
        message: format!("Failed to serialize build-info: {e}"),
    })?;
    match &opts.output {
        Some(path) => std::fs::write(path, &json).map_err(ArtiflowError::Io)?,
        None => println!("{json}"),
    }

    if opts.dry_run {
        progress::status("Dry run", &format!("{}/{} not published", key.name, key.number));
        return Ok(build_info);
    }
    store.save_published(key, &build_info)?;
    store.remove_build(key)?;
    progress::status(
        "Published",
        &format!("{}/{} ({} modules)", key.name, key.number, build_info.modules.len()),
    );
    Ok(build_info)
}

/// Discard everything collected for a build.
pub fn clean(store: &BuildStore, key: &BuildKey) -> miette::Result<()> {
    store.remove_build(key)?;
    progress::status("Cleaned", &format!("{}/{}", key.name, key.number));
    Ok(())
}
