//! Tile cache directories on disk.

use mapproxy_common::{cache_dir_suffix, MapProxyError, MapProxyResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::model::ProxyConfig;

/// Create the cache base directory; `false` when it already existed.
pub fn create_base_dir(base_dir: &Path) -> MapProxyResult<bool> {
    if base_dir.is_dir() {
        debug!(path = %base_dir.display(), "Cache directory already exists");
        return Ok(false);
    }
    std::fs::create_dir_all(base_dir).map_err(|e| {
        MapProxyError::CacheDirectory(format!("create {}: {}", base_dir.display(), e))
    })?;
    info!(path = %base_dir.display(), "Created cache directory");
    Ok(true)
}

/// Directories to delete when cleaning `layers` (`None` = everything).
///
/// A name selects a layer entry by its own name or by the upstream layer
/// behind it. Each selected entry contributes `<cache>_<grid dir>` for every
/// cache and grid it uses.
pub fn plan_clean(
    config: &ProxyConfig,
    base_dir: &Path,
    layers: Option<&[String]>,
) -> Vec<PathBuf> {
    let Some(names) = layers else {
        return vec![base_dir.to_path_buf()];
    };

    let mut dirs: Vec<PathBuf> = Vec::new();
    for name in names {
        let entries: Vec<_> = config
            .layers
            .iter()
            .filter(|entry| {
                entry.name == *name || config.upstream_layers_of(entry).contains(&name.as_str())
            })
            .collect();

        if entries.is_empty() {
            warn!(layer = %name, "Layer not found in configuration");
            continue;
        }

        for entry in entries {
            for (cache, grid) in config.cache_grids_of(entry) {
                let dir = base_dir.join(format!("{}_{}", cache, cache_dir_suffix(grid)));
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }
    }
    dirs
}

/// Remove a directory tree, returning the number of files it held.
///
/// A missing directory is not an error and counts zero.
pub fn remove_dir(dir: &Path) -> MapProxyResult<usize> {
    if !dir.is_dir() {
        debug!(path = %dir.display(), "Nothing to remove");
        return Ok(0);
    }

    let tiles = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count();

    std::fs::remove_dir_all(dir).map_err(|e| {
        MapProxyError::CacheDirectory(format!("remove {}: {}", dir.display(), e))
    })?;
    info!(path = %dir.display(), tiles, "Removed cache directory");
    Ok(tiles)
}
