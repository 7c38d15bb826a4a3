//! Subcommand implementations.
//!
//! Every command validates its settings and builds its temporal source
//! before touching the filesystem or the network.

use anyhow::{Context, Result};
use mapproxy_common::{MapProxyError, ResolveMode};
use proxy_config::{cache_dirs, store, CacheCatalog, SynthesisOptions};
use std::path::PathBuf;
use temporal_resolver::build_source;
use tracing::info;

use crate::settings::Settings;

/// Outcome of `config create` / `config update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReport {
    pub path: PathBuf,
    pub layers: usize,
}

/// Outcome of `cache clean`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub tiles: usize,
    pub recreated: bool,
}

/// Build a new configuration from the cache catalog and save it.
pub async fn config_create(settings: &Settings, mode: ResolveMode) -> Result<ConfigReport> {
    let source = build_source(mode, &settings.resolver())?;
    let config_path = settings.config_path()?;
    let catalog_path = settings.cache_config_path()?;
    let cache_data = settings.cache_data_dir()?;

    info!(catalog = %catalog_path.display(), mode = %mode, "Creating configuration");
    let catalog = CacheCatalog::load(catalog_path)?;

    let options = SynthesisOptions {
        cache_base_dir: cache_data.display().to_string(),
        user_agent: settings.resolver().user_agent,
    };
    let config = proxy_config::synthesize(&catalog, &options, source.as_ref())
        .await
        .context("Error creating config")?;

    store::save(&config, config_path)?;
    Ok(ConfigReport {
        path: config_path.to_path_buf(),
        layers: config.layers.len(),
    })
}

/// Refresh temporal dimensions of `layers` (`None` = all) in the saved configuration.
pub async fn config_update(
    settings: &Settings,
    layers: Option<Vec<String>>,
    mode: ResolveMode,
) -> Result<ConfigReport> {
    let source = build_source(mode, &settings.resolver())?;
    let config_path = settings.config_path()?;

    info!(path = %config_path.display(), layers = ?layers, mode = %mode, "Updating configuration");
    let config = store::load(config_path)?;
    let config = proxy_config::merge(config, layers.as_deref(), source.as_ref())
        .await
        .context("Error updating config")?;

    store::save(&config, config_path)?;
    Ok(ConfigReport {
        path: config_path.to_path_buf(),
        layers: config.layers.len(),
    })
}

/// Create the cache base directory; `false` when it already existed.
pub fn cache_create(settings: &Settings) -> Result<bool> {
    let base_dir = settings.cache_data_dir()?;
    Ok(cache_dirs::create_base_dir(base_dir)?)
}

/// Directories `cache clean` would remove for `layers` (`None` = all).
pub fn cache_clean_plan(settings: &Settings, layers: Option<&[String]>) -> Result<Vec<PathBuf>> {
    let base_dir = settings.cache_data_dir()?;
    match layers {
        None => Ok(cache_dirs::plan_clean(&Default::default(), base_dir, None)),
        Some([]) => Err(MapProxyError::InvalidLayerList("no layer given".to_string()).into()),
        Some(names) => {
            let config = store::load(settings.config_path()?)?;
            Ok(cache_dirs::plan_clean(&config, base_dir, Some(names)))
        }
    }
}

/// Remove planned cache directories, then make sure the base directory exists.
pub fn cache_clean(settings: &Settings, dirs: &[PathBuf]) -> Result<CleanReport> {
    let base_dir = settings.cache_data_dir()?;
    let mut report = CleanReport::default();

    for dir in dirs.iter().filter(|d| d.is_dir()) {
        report.tiles += cache_dirs::remove_dir(dir)?;
        report.removed.push(dir.clone());
    }

    report.recreated = cache_dirs::create_base_dir(base_dir)?;
    info!(
        removed = report.removed.len(),
        tiles = report.tiles,
        "Cleaned cache directories"
    );
    Ok(report)
}
