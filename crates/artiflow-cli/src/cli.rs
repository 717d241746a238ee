//! CLI argument definitions for artiflow.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "artiflow",
    version,
    about = "Dependency trees, Xray audits and build-info collection",
    long_about = "artiflow turns package manager output into dependency trees, scans them \
                  with Xray to find how vulnerable components are reached, and collects \
                  partial build-info across CI steps into one published document."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Where a technology's dependency data comes from.
#[derive(Args, Debug)]
pub struct TreeInputArgs {
    /// Package manager: go, npm, maven, gradle, nuget, pip, pipenv, poetry
    #[arg(short, long)]
    pub tech: String,

    /// Package manager output files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Root module id (Go module path or npm package id)
    #[arg(long)]
    pub module: Option<String>,

    /// Go: `go list -m all` output
    #[arg(long)]
    pub list: Option<PathBuf>,

    /// Go: toolchain version to include as a dependency
    #[arg(long)]
    pub go_version: Option<String>,
}

/// Identifies the build a `build` subcommand works on.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Build name
    pub name: String,
    /// Build number
    pub number: String,
    /// Platform project key
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display the dependency trees built from package manager output
    Tree {
        #[command(flatten)]
        input: TreeInputArgs,
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Print Xray graph JSON
        #[arg(long)]
        json: bool,
        /// Show every unique dependency under one root
        #[arg(long)]
        flat: bool,
        /// List only direct dependencies
        #[arg(long, conflicts_with_all = ["json", "flat"])]
        direct: bool,
    },

    /// Scan dependencies with Xray and report impact paths
    Audit {
        #[command(flatten)]
        input: TreeInputArgs,
        /// Minimum severity to report: low, medium, high, critical
        #[arg(long)]
        min_severity: Option<String>,
        /// Report only issues with a fixed version
        #[arg(long)]
        fixable_only: bool,
        /// Output format: table or json
        #[arg(long, default_value = "table")]
        format: String,
        /// Send all unique dependencies as one flat graph
        #[arg(long)]
        flat: bool,
        /// Platform project key
        #[arg(long)]
        project: Option<String>,
    },

    /// Collect and publish build-info
    Build {
        #[command(subcommand)]
        action: BuildAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum BuildAction {
    /// Record files as artifacts of a module
    AddArtifacts {
        #[command(flatten)]
        build: BuildArgs,
        /// Module id (defaults to the build name)
        #[arg(long)]
        module: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Record files as dependencies of a module
    AddDeps {
        #[command(flatten)]
        build: BuildArgs,
        /// Module id (defaults to the build name)
        #[arg(long)]
        module: Option<String>,
        /// Dependency scope, repeatable
        #[arg(long = "scope")]
        scopes: Vec<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Record the current environment variables
    CollectEnv {
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Record version control details
    AddVcs {
        #[command(flatten)]
        build: BuildArgs,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long, default_value = "")]
        revision: String,
        #[arg(long, default_value = "")]
        branch: String,
        #[arg(long, default_value = "")]
        message: String,
        /// Issue tracker name; issues are published only when set
        #[arg(long)]
        tracker: Option<String>,
        #[arg(long)]
        tracker_version: Option<String>,
        /// Affected issue as KEY or KEY=summary, repeatable
        #[arg(long = "issue")]
        issues: Vec<String>,
        /// Aggregate issues since the last build with this status
        #[arg(long)]
        aggregation_status: Option<String>,
    },
    /// Reference another published build as a module
    Append {
        #[command(flatten)]
        build: BuildArgs,
        /// Name of the build to append
        other_name: String,
        /// Number of the build to append
        other_number: String,
    },
    /// Merge collected partials into a build-info document
    Publish {
        #[command(flatten)]
        build: BuildArgs,
        /// Print the document without deleting collected partials
        #[arg(long)]
        dry_run: bool,
        /// CI build URL
        #[arg(long, env = "ARTIFLOW_BUILD_URL")]
        build_url: Option<String>,
        /// Write the document to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Discard collected partials
    Clean {
        #[command(flatten)]
        build: BuildArgs,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
