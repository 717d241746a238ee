//! Assemble a build-info document from merged partials.

use artiflow_core::buildinfo::{Agent, BuildInfo};
use artiflow_core::AGENT_NAME;
use chrono::{DateTime, Utc};

use crate::merge::ExtractedBuildInfo;
use crate::store::BuildKey;

/// Timestamp format of the `started` field.
pub const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Optional metadata for the assembled document.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    pub build_url: Option<String>,
    pub principal: Option<String>,
}

pub fn format_started(started: &DateTime<Utc>) -> String {
    started.format(STARTED_FORMAT).to_string()
}

/// Build the final document.
///
/// Modules without an id take the build name. Issues are attached only when
/// a tracker is named. The merged env becomes the document's properties.
pub fn assemble_build_info(
    key: &BuildKey,
    started: DateTime<Utc>,
    extracted: ExtractedBuildInfo,
    opts: &AssembleOptions,
) -> BuildInfo {
    let mut build_info = BuildInfo::new(&key.name, &key.number);
    build_info.agent = Some(Agent {
        name: AGENT_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });
    build_info.started = format_started(&started);
    build_info.duration_millis = (Utc::now() - started).num_milliseconds().max(0);
    build_info.url = opts.build_url.clone().unwrap_or_default();
    build_info.principal = opts.principal.clone().unwrap_or_default();
    build_info.properties = extracted.env;
    build_info.vcs = extracted.vcs_list;

    let has_tracker = extracted
        .issues
        .tracker
        .as_ref()
        .is_some_and(|tracker| !tracker.name.is_empty());
    if has_tracker {
        build_info.issues = Some(extracted.issues);
    }

    build_info.modules = extracted
        .modules
        .into_iter()
        .map(|mut module| {
            if module.id.is_empty() {
                module.id = key.name.clone();
            }
            module
        })
        .collect();
    build_info
}
