//! On-disk storage of partial build-info.
//!
//! Layout under the configured temp dir:
//!
//! ```text
//! builds/<sha256(name_number_project)>/details      build start time
//! builds/<sha256(name_number_project)>/partials/*   one JSON fragment per command
//! published/<sha256(name_number_project)>.json      last published document
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use artiflow_core::buildinfo::{BuildInfo, Partial};
use artiflow_core::config::GlobalConfig;
use artiflow_util::errors::ArtiflowError;
use artiflow_util::fs::{ensure_dir, remove_dir_if_exists};
use artiflow_util::hash::sha256_bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifies a build: name, number and optional project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildKey {
    pub name: String,
    pub number: String,
    pub project: Option<String>,
}

impl BuildKey {
    pub fn new(name: impl Into<String>, number: impl Into<String>, project: Option<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            project: project.filter(|p| !p.is_empty()),
        }
    }

    /// Directory name for this build.
    pub fn hash(&self) -> String {
        let project = self.project.as_deref().unwrap_or("");
        sha256_bytes(format!("{}_{}_{project}", self.name, self.number).as_bytes())
    }
}

/// Build-level details recorded when the first fragment is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDetails {
    pub started: DateTime<Utc>,
}

/// Reads and writes partial build-info below a base directory.
#[derive(Debug, Clone)]
pub struct BuildStore {
    base: PathBuf,
}

impl BuildStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(config.build.temp_dir())
    }

    pub fn build_dir(&self, key: &BuildKey) -> PathBuf {
        self.base.join("builds").join(key.hash())
    }

    fn partials_dir(&self, key: &BuildKey) -> PathBuf {
        self.build_dir(key).join("partials")
    }

    fn details_path(&self, key: &BuildKey) -> PathBuf {
        self.build_dir(key).join("details")
    }

    fn published_path(&self, key: &BuildKey) -> PathBuf {
        self.base.join("published").join(format!("{}.json", key.hash()))
    }

    /// Persist one fragment, stamping it with the current time when unset.
    /// The build's details file is created on first use.
    pub fn save_partial(&self, key: &BuildKey, mut partial: Partial) -> miette::Result<PathBuf> {
        let dir = self.partials_dir(key);
        ensure_dir(&dir).map_err(|e| ArtiflowError::BuildInfo {
            message: format!("Failed to create {}: {e}", dir.display()),
        })?;
        if !self.details_path(key).is_file() {
            self.save_details(key, &BuildDetails { started: Utc::now() })?;
        }
        if partial.timestamp == 0 {
            partial.timestamp = Utc::now().timestamp_millis();
        }

        let content = serde_json::to_vec_pretty(&partial).map_err(|e| ArtiflowError::BuildInfo {
            message: format!("Failed to serialize partial build-info: {e}"),
        })?;
        // Readers only ever see fully written `partial-*.json` files.
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&dir)
            .map_err(ArtiflowError::Io)?;
        file.write_all(&content).map_err(ArtiflowError::Io)?;
        file.as_file().sync_all().map_err(ArtiflowError::Io)?;
        let path = dir.join(final_name(file.path()));
        file.persist_noclobber(&path).map_err(|e| ArtiflowError::BuildInfo {
            message: format!("Failed to store {}: {}", path.display(), e.error),
        })?;
        debug!("Saved partial build-info to {}", path.display());
        Ok(path)
    }

    /// All fragments of a build, ordered by timestamp. A build with no
    /// fragments yields an empty list.
    pub fn read_partials(&self, key: &BuildKey) -> miette::Result<Vec<Partial>> {
        let dir = self.partials_dir(key);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
            .map_err(ArtiflowError::Io)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_partial_file(path))
            .collect();
        paths.sort();

        let mut partials = Vec::with_capacity(paths.len());
        for path in paths {
            partials.push(read_json::<Partial>(&path)?);
        }
        partials.sort_by_key(|p| p.timestamp);
        Ok(partials)
    }

    pub fn read_details(&self, key: &BuildKey) -> miette::Result<Option<BuildDetails>> {
        let path = self.details_path(key);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn save_details(&self, key: &BuildKey, details: &BuildDetails) -> miette::Result<()> {
        write_json(&self.details_path(key), details)
    }

    /// Delete everything stored for a build.
    pub fn remove_build(&self, key: &BuildKey) -> miette::Result<()> {
        let dir = self.build_dir(key);
        remove_dir_if_exists(&dir).map_err(|e| {
            ArtiflowError::BuildInfo {
                message: format!("Failed to remove {}: {e}", dir.display()),
            }
            .into()
        })
    }

    /// Keep a copy of a published document so other builds can reference it.
    pub fn save_published(&self, key: &BuildKey, build_info: &BuildInfo) -> miette::Result<PathBuf> {
        let path = self.published_path(key);
        if let Some(parent) = path.parent() {
            ensure_dir(parent).map_err(ArtiflowError::Io)?;
        }
        write_json(&path, build_info)?;
        Ok(path)
    }

    /// Raw bytes of a previously published document.
    pub fn read_published(&self, key: &BuildKey) -> miette::Result<Vec<u8>> {
        let path = self.published_path(key);
        std::fs::read(&path).map_err(|e| {
            ArtiflowError::BuildInfo {
                message: format!(
                    "Build {}/{} has not been published locally ({}): {e}",
                    key.name,
                    key.number,
                    path.display()
                ),
            }
            .into()
        })
    }
}

const TEMP_PREFIX: &str = ".partial-";
const TEMP_SUFFIX: &str = ".tmp";

/// `.partial-XXXX.tmp` becomes `partial-XXXX.json`.
fn final_name(temp: &Path) -> String {
    let name = temp
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_prefix(TEMP_PREFIX)
        .and_then(|rest| rest.strip_suffix(TEMP_SUFFIX))
        .unwrap_or(name.as_str());
    format!("partial-{stem}.json")
}

/// Stored fragments are visible `*.json` files. In-flight temp files and
/// anything else left in the directory are ignored.
fn is_partial_file(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| !n.starts_with('.'));
    visible && path.extension().is_some_and(|ext| ext == "json") && path.is_file()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> miette::Result<T> {
    let content = std::fs::read_to_string(path).map_err(ArtiflowError::Io)?;
    serde_json::from_str(&content).map_err(|e| {
        ArtiflowError::Parse {
            message: format!("{}: {e}", path.display()),
        }
        .into()
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> miette::Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| ArtiflowError::BuildInfo {
        message: format!("Failed to serialize {}: {e}", path.display()),
    })?;
    std::fs::write(path, content).map_err(|e| {
        ArtiflowError::BuildInfo {
            message: format!("Failed to write {}: {e}", path.display()),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use artiflow_core::buildinfo::Vcs;
    use tempfile::TempDir;

    fn vcs_partial(timestamp: i64, revision: &str) -> Partial {
        Partial {
            timestamp,
            vcs_list: Some(vec![Vcs {
                revision: revision.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn build_dir_depends_on_project() {
        let a = BuildKey::new("app", "1", None);
        let b = BuildKey::new("app", "1", Some("proj".to_string()));
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), BuildKey::new("app", "1", Some(String::new())).hash());
        assert_eq!(a.hash().len(), 64);
    }

    #[test]
    fn partials_are_read_back_in_timestamp_order() {
        let tmp = TempDir::new().unwrap();
        let store = BuildStore::new(tmp.path());
        let key = BuildKey::new("app", "7", None);
        store.save_partial(&key, vcs_partial(300, "c")).unwrap();
        store.save_partial(&key, vcs_partial(100, "a")).unwrap();
        store.save_partial(&key, vcs_partial(200, "b")).unwrap();

        let revisions: Vec<String> = store
            .read_partials(&key)
            .unwrap()
            .into_iter()
            .map(|p| p.vcs_list.unwrap()[0].revision.clone())
            .collect();
        assert_eq!(revisions, vec!["a", "b", "c"]);
        assert!(store.read_details(&key).unwrap().is_some());
    }

    #[test]
    fn saved_partial_lands_under_json_name() {
        let tmp = TempDir::new().unwrap();
        let store = BuildStore::new(tmp.path());
        let key = BuildKey::new("app", "2", None);
        let path = store.save_partial(&key, vcs_partial(1, "a")).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("partial-") && name.ends_with(".json"), "got: {name}");
        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn stray_files_in_partials_dir_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let store = BuildStore::new(tmp.path());
        let key = BuildKey::new("app", "3", None);
        let path = store.save_partial(&key, vcs_partial(5, "kept")).unwrap();
        let dir = path.parent().unwrap();
        std::fs::write(dir.join(".partial-abc123.tmp"), "{\"timest").unwrap();
        std::fs::write(dir.join("notes.txt"), "not json").unwrap();
        std::fs::create_dir(dir.join("nested.json")).unwrap();

        let partials = store.read_partials(&key).unwrap();
        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].vcs_list.as_ref().unwrap()[0].revision, "kept");
    }

    #[test]
    fn final_name_drops_temp_markers() {
        assert_eq!(final_name(Path::new("/x/.partial-Ab12.tmp")), "partial-Ab12.json");
    }

    #[test]
    fn unset_timestamp_is_stamped() {
        let tmp = TempDir::new().unwrap();
        let store = BuildStore::new(tmp.path());
        let key = BuildKey::new("app", "1", None);
        store.save_partial(&key, vcs_partial(0, "x")).unwrap();
        assert!(store.read_partials(&key).unwrap()[0].timestamp > 0);
    }

    #[test]
    fn unknown_build_has_no_partials() {
        let tmp = TempDir::new().unwrap();
        let store = BuildStore::new(tmp.path());
        let key = BuildKey::new("nothing", "0", None);
        assert!(store.read_partials(&key).unwrap().is_empty());
        assert!(store.read_details(&key).unwrap().is_none());
    }

    #[test]
    fn remove_build_deletes_directory() {
        let tmp = TempDir::new().unwrap();
        let store = BuildStore::new(tmp.path());
        let key = BuildKey::new("app", "1", None);
        store.save_partial(&key, vcs_partial(1, "x")).unwrap();
        assert!(store.build_dir(&key).is_dir());
        store.remove_build(&key).unwrap();
        assert!(!store.build_dir(&key).exists());
        store.remove_build(&key).unwrap();
    }

    #[test]
    fn published_documents_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = BuildStore::new(tmp.path());
        let key = BuildKey::new("lib", "3", None);
        assert!(store.read_published(&key).is_err());
        store.save_published(&key, &BuildInfo::new("lib", "3")).unwrap();
        let bytes = store.read_published(&key).unwrap();
        let info: BuildInfo = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(info.number, "3");
    }
}
