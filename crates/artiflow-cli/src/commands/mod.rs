//! Command dispatch and handler modules.

mod audit;
mod build;
mod tree;

use artiflow_core::technology::Technology;
use artiflow_ops::inputs::TreeInputs;
use artiflow_util::errors::ArtiflowError;
use miette::Result;
use tracing::debug;

use crate::cli::{Cli, Command, TreeInputArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    debug!("Dispatching {:?}", cli.command);
    match cli.command {
        Command::Tree {
            input,
            depth,
            json,
            flat,
            direct,
        } => tree::exec(input, depth, json, flat, direct),
        Command::Audit {
            input,
            min_severity,
            fixable_only,
            format,
            flat,
            project,
        } => audit::exec(input, min_severity, fixable_only, &format, flat, project).await,
        Command::Build { action } => build::exec(action),
    }
}

fn tree_inputs(args: TreeInputArgs) -> Result<TreeInputs> {
    let technology = Technology::from_str(&args.tech).ok_or_else(|| {
        let supported: Vec<&str> = Technology::ALL.iter().map(Technology::as_str).collect();
        ArtiflowError::Generic {
            message: format!(
                "Unsupported technology '{}', expected one of: {}",
                args.tech,
                supported.join(", ")
            ),
        }
    })?;
    Ok(TreeInputs {
        technology,
        files: args.inputs,
        module: args.module,
        module_list: args.list,
        go_version: args.go_version,
    })
}
