use std::path::{Path, PathBuf};

use ckpt_types::StateDict;
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::resolve::weight_file_in;
use crate::safetensors::read_safetensors;

/// Extensions of pickle-based checkpoints, which cannot be read without
/// executing arbitrary code.
const PICKLE_EXTENSIONS: [&str; 5] = ["pt", "pth", "bin", "th", "ckpt"];

/// Reads a local checkpoint into a [`StateDict`].
pub trait CheckpointLoader {
    /// Load the checkpoint at `path`. With `strip_prefix`, only keys starting
    /// with it are kept, and the prefix is removed from them.
    fn load(&self, path: &Path, strip_prefix: Option<&str>) -> LoadResult<StateDict>;
}

/// Loader for SafeTensors files, or directories holding one.
#[derive(Clone, Copy, Debug, Default)]
pub struct SafeTensorsLoader;

impl SafeTensorsLoader {
    pub fn new() -> Self {
        Self
    }

    fn weight_file(&self, path: &Path) -> LoadResult<PathBuf> {
        if path.is_dir() {
            return weight_file_in(path).ok_or_else(|| LoadError::NotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if PICKLE_EXTENSIONS.contains(&ext) {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "pickle checkpoints are not supported, convert to SafeTensors".into(),
            });
        }
        if path.to_string_lossy().ends_with(".tar.gz") {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "model archives must be extracted first".into(),
            });
        }
        Ok(path.to_path_buf())
    }
}

impl CheckpointLoader for SafeTensorsLoader {
    fn load(&self, path: &Path, strip_prefix: Option<&str>) -> LoadResult<StateDict> {
        let file = self.weight_file(path)?;
        let dict = read_safetensors(&file)?;
        match strip_prefix {
            Some(prefix) if !prefix.is_empty() => {
                let stripped = dict.strip_prefix(prefix);
                debug!(
                    path = %file.display(),
                    prefix,
                    kept = stripped.len(),
                    dropped = dict.len() - stripped.len(),
                    "stripped key prefix"
                );
                Ok(stripped)
            }
            _ => Ok(dict),
        }
    }
}

/// Load a state dict from a local SafeTensors file or directory.
pub fn load_state_dict(
    path: impl AsRef<Path>,
    strip_prefix: Option<&str>,
) -> LoadResult<StateDict> {
    SafeTensorsLoader.load(path.as_ref(), strip_prefix)
}
