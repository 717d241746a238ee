//! Read package manager output files and dispatch to the matching tree builder.

use std::path::{Path, PathBuf};

use artiflow_core::buildinfo::BuildInfo;
use artiflow_core::technology::Technology;
use artiflow_deptree::gradle::GradleDepTrees;
use artiflow_deptree::maven::{self, DepTreeDocument};
use artiflow_deptree::{golang, npm, nuget, python, DependencyTrees};
use artiflow_util::errors::ArtiflowError;
use artiflow_util::fs::{find_ancestor_with, read_to_string};
use tracing::debug;

/// Where a technology's dependency data comes from.
#[derive(Debug, Clone)]
pub struct TreeInputs {
    pub technology: Technology,
    pub files: Vec<PathBuf>,
    /// Module id override: the Go module path or the npm package id.
    pub module: Option<String>,
    /// Go only: the `go list -m all` output.
    pub module_list: Option<PathBuf>,
    /// Go only: toolchain version to add as a dependency.
    pub go_version: Option<String>,
}

impl TreeInputs {
    pub fn new(technology: Technology, files: Vec<PathBuf>) -> Self {
        Self {
            technology,
            files,
            module: None,
            module_list: None,
            go_version: None,
        }
    }
}

/// Build the dependency trees described by `inputs`.
pub fn build_trees(inputs: &TreeInputs) -> miette::Result<DependencyTrees> {
    let tech = inputs.technology;
    if inputs.files.is_empty() {
        return Err(ArtiflowError::tree_build(tech, "no input files given").into());
    }
    debug!("Building {tech} dependency trees from {} file(s)", inputs.files.len());

    let trees = match tech {
        Technology::Go => go_trees(inputs)?,
        Technology::Npm => npm_trees(inputs)?,
        Technology::Maven | Technology::Gradle => java_trees(tech, &inputs.files)?,
        Technology::Nuget => {
            let mut modules = Vec::new();
            for file in &inputs.files {
                modules.extend(read_build_info(tech, file)?.modules);
            }
            nuget::build_nuget_trees(&modules)
        }
        Technology::Pip | Technology::Pipenv | Technology::Poetry => {
            let content = read_to_string(&inputs.files[0])?;
            let (graph, top_level) = python::parse_pipdeptree(&content, tech)?;
            python::build_python_trees(&graph, &top_level)
        }
    };
    debug!(
        "Built {} {tech} tree(s) with {} unique dependencies",
        trees.trees.len(),
        trees.unique_deps.len()
    );
    Ok(trees)
}

fn go_trees(inputs: &TreeInputs) -> miette::Result<DependencyTrees> {
    let graph_file = &inputs.files[0];
    let mod_graph = golang::parse_mod_graph(&read_to_string(graph_file)?)?;

    let module_name = match &inputs.module {
        Some(name) => name.clone(),
        None => {
            let start = graph_file
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let dir = find_ancestor_with(start, "go.mod").ok_or_else(|| {
                ArtiflowError::tree_build(
                    Technology::Go,
                    "no go.mod found next to the graph file; pass --module",
                )
            })?;
            golang::parse_module_name(&read_to_string(&dir.join("go.mod"))?)?
        }
    };

    let module_list = match &inputs.module_list {
        Some(path) => golang::parse_module_list(&read_to_string(path)?),
        None => {
            debug!("No module list given; keeping every go graph edge");
            mod_graph.node_ids().map(str::to_string).collect()
        }
    };

    Ok(golang::build_go_tree(
        &module_name,
        &mod_graph,
        &module_list,
        inputs.go_version.as_deref(),
    ))
}

fn npm_trees(inputs: &TreeInputs) -> miette::Result<DependencyTrees> {
    let build_info = read_build_info(Technology::Npm, &inputs.files[0])?;
    let module = build_info.modules.into_iter().next().ok_or_else(|| {
        ArtiflowError::tree_build(Technology::Npm, "build-info contains no modules")
    })?;
    let module_id = inputs.module.clone().unwrap_or(module.id);
    Ok(npm::build_npm_tree(&module_id, &module.dependencies))
}

/// Maven and Gradle accept dependency-tree plugin documents. Maven also
/// accepts build-info; Gradle also accepts nested `children` documents
/// named after their build file.
fn java_trees(tech: Technology, files: &[PathBuf]) -> miette::Result<DependencyTrees> {
    let mut documents = Vec::new();
    let mut modules = Vec::new();
    let mut gradle = GradleDepTrees::new();

    for file in files {
        let content = read_to_string(file)?;
        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            ArtiflowError::tree_build(tech, format!("{} is not valid JSON: {e}", file.display()))
        })?;
        if value.get("root").is_some() {
            documents.push(DepTreeDocument::parse(&content, tech)?);
        } else if tech == Technology::Maven {
            modules.extend(BuildInfo::from_json(&content)?.modules);
        } else {
            let build_file = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            gradle.append(&build_file, &content)?;
        }
    }

    let mut trees = maven::build_maven_trees(&modules);
    let from_documents = maven::build_trees_from_documents(&documents);
    let from_gradle = gradle.into_trees();
    for extra in [from_documents, from_gradle] {
        trees.trees.extend(extra.trees);
        trees.unique_deps.extend(extra.unique_deps);
    }
    Ok(trees)
}

fn read_build_info(tech: Technology, path: &Path) -> miette::Result<BuildInfo> {
    let content = read_to_string(path)?;
    BuildInfo::from_json(&content).map_err(|e| {
        ArtiflowError::tree_build(tech, format!("{}: {e}", path.display())).into()
    })
}
