//! Checkpoint resolution: identifier + kind -> local file path.
//!
//! Resolution is strictly local. Plain paths are checked for existence, and
//! hub model ids are looked up in the on-disk HuggingFace cache layout:
//!
//! ```text
//! <cache>/models--<org>--<name>/refs/main          (revision hash)
//! <cache>/models--<org>--<name>/snapshots/<rev>/model.safetensors
//! ```

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{LoadError, LoadResult};

/// File names looked up inside a checkpoint directory, in priority order.
pub const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "weights.safetensors"];

/// How a checkpoint identifier should be interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointKind {
    /// A path to a checkpoint file or a directory holding one.
    #[default]
    File,
    /// A model id on the HuggingFace hub, served from the local cache.
    HuggingFace,
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointKind::File => write!(f, "file"),
            CheckpointKind::HuggingFace => write!(f, "huggingface"),
        }
    }
}

impl FromStr for CheckpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(CheckpointKind::File),
            "huggingface" => Ok(CheckpointKind::HuggingFace),
            other => Err(format!("bad checkpoint type '{other}'")),
        }
    }
}

/// Maps a checkpoint identifier to a local file.
pub trait CheckpointResolver {
    fn resolve(&self, identifier: &str, kind: CheckpointKind) -> LoadResult<PathBuf>;
}

/// Resolver over the local file system and hub cache.
#[derive(Clone, Debug)]
pub struct LocalResolver {
    hub_cache: PathBuf,
}

impl LocalResolver {
    /// Resolver using an explicit hub cache directory.
    pub fn with_hub_cache(hub_cache: impl Into<PathBuf>) -> Self {
        Self {
            hub_cache: hub_cache.into(),
        }
    }

    /// Resolver using the hub cache location from the environment:
    /// `HF_HUB_CACHE`, then `HF_HOME/hub`, then `~/.cache/huggingface/hub`.
    pub fn from_env() -> Self {
        Self::with_hub_cache(default_hub_cache())
    }

    pub fn hub_cache(&self) -> &Path {
        &self.hub_cache
    }

    fn resolve_file(&self, identifier: &str) -> LoadResult<PathBuf> {
        let path = PathBuf::from(identifier);
        if identifier.ends_with(".tar.gz") {
            return Err(LoadError::UnsupportedFormat {
                path,
                reason: "model archives must be extracted first".into(),
            });
        }
        if !path.exists() {
            return Err(LoadError::NotFound(path));
        }
        Ok(path)
    }

    fn resolve_hub(&self, model: &str) -> LoadResult<PathBuf> {
        let repo_dir = self
            .hub_cache
            .join(format!("models--{}", model.replace('/', "--")));
        let not_cached = || LoadError::NotCached {
            model: model.to_string(),
            cache: self.hub_cache.clone(),
        };
        let snapshots = repo_dir.join("snapshots");
        if !snapshots.is_dir() {
            return Err(not_cached());
        }

        // Prefer the revision `refs/main` points at.
        if let Ok(rev) = std::fs::read_to_string(repo_dir.join("refs").join("main")) {
            let snapshot = snapshots.join(rev.trim());
            if let Some(file) = weight_file_in(&snapshot) {
                debug!(model, path = %file.display(), "resolved hub checkpoint from refs/main");
                return Ok(file);
            }
        }

        WalkDir::new(&snapshots)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .find_map(|entry| weight_file_in(entry.path()))
            .inspect(|file| debug!(model, path = %file.display(), "resolved hub checkpoint"))
            .ok_or_else(not_cached)
    }
}

impl Default for LocalResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

impl CheckpointResolver for LocalResolver {
    fn resolve(&self, identifier: &str, kind: CheckpointKind) -> LoadResult<PathBuf> {
        match kind {
            CheckpointKind::File => self.resolve_file(identifier),
            CheckpointKind::HuggingFace => self.resolve_hub(identifier),
        }
    }
}

/// The first known weight file inside `dir`, if any.
pub fn weight_file_in(dir: &Path) -> Option<PathBuf> {
    WEIGHT_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn default_hub_cache() -> PathBuf {
    hub_cache_from(|name| std::env::var_os(name))
}

/// Hub cache root from `HF_HUB_CACHE`, then `HF_HOME/hub`, then
/// `$HOME/.cache/huggingface/hub`.
fn hub_cache_from(var: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    if let Some(dir) = var("HF_HUB_CACHE") {
        return PathBuf::from(dir);
    }
    if let Some(home) = var("HF_HOME") {
        return PathBuf::from(home).join("hub");
    }
    var("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".cache")
        .join("huggingface")
        .join("hub")
}
