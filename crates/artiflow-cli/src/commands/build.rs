//! Handlers for `artiflow build ...`.

use miette::Result;

use artiflow_buildinfo::{BuildKey, BuildStore};
use artiflow_core::config::GlobalConfig;
use artiflow_ops::ops_build::{self, FilesOptions, PublishOptions, VcsOptions};
use artiflow_util::progress;

use crate::cli::{BuildAction, BuildArgs};

fn open(build: BuildArgs) -> Result<(GlobalConfig, BuildStore, BuildKey)> {
    let config = GlobalConfig::load()?;
    let store = BuildStore::from_config(&config);
    let key = BuildKey::new(build.name, build.number, build.project);
    Ok((config, store, key))
}

pub fn exec(action: BuildAction) -> Result<()> {
    match action {
        BuildAction::AddArtifacts { build, module, files } => {
            let (_, store, key) = open(build)?;
            let opts = FilesOptions {
                module,
                files,
                scopes: Vec::new(),
            };
            let count = ops_build::add_artifacts(&store, &key, &opts)?;
            progress::status("Recorded", &format!("{count} artifact(s)"));
            Ok(())
        }
        BuildAction::AddDeps {
            build,
            module,
            scopes,
            files,
        } => {
            let (_, store, key) = open(build)?;
            let opts = FilesOptions {
                module,
                files,
                scopes,
            };
            let count = ops_build::add_dependencies(&store, &key, &opts)?;
            progress::status("Recorded", &format!("{count} dependency file(s)"));
            Ok(())
        }
        BuildAction::CollectEnv { build } => {
            let (_, store, key) = open(build)?;
            let count = ops_build::collect_env(&store, &key, std::env::vars_os())?;
            progress::status("Collected", &format!("{count} environment variable(s)"));
            Ok(())
        }
        BuildAction::AddVcs {
            build,
            url,
            revision,
            branch,
            message,
            tracker,
            tracker_version,
            issues,
            aggregation_status,
        } => {
            let (_, store, key) = open(build)?;
            let opts = VcsOptions {
                url,
                revision,
                branch,
                message,
                tracker,
                tracker_version,
                aggregate: aggregation_status.is_some(),
                aggregation_status,
                issues,
            };
            ops_build::add_vcs(&store, &key, &opts)?;
            progress::status("Recorded", "VCS details");
            Ok(())
        }
        BuildAction::Append {
            build,
            other_name,
            other_number,
        } => {
            let project = build.project.clone();
            let (_, store, key) = open(build)?;
            let other = BuildKey::new(other_name, other_number, project);
            ops_build::append_build(&store, &key, &other)?;
            progress::status("Appended", &format!("{}/{}", other.name, other.number));
            Ok(())
        }
        BuildAction::Publish {
            build,
            dry_run,
            build_url,
            output,
        } => {
            let (config, store, key) = open(build)?;
            let opts = PublishOptions {
                dry_run,
                build_url,
                principal: config.server.user.clone(),
                output,
            };
            ops_build::publish(&store, &key, &config.build, &opts)?;
            Ok(())
        }
        BuildAction::Clean { build } => {
            let (_, store, key) = open(build)?;
            ops_build::clean(&store, &key)
        }
    }
}
