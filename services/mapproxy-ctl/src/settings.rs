//! Deployment settings shared by every subcommand.
//!
//! All values come from flags or their environment variables; `.env` is
//! loaded by the binary before parsing.

use anyhow::{anyhow, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use temporal_resolver::settings::DEFAULT_LAYER_MAPFILE_TEMPLATE;
use temporal_resolver::ResolverSettings;

/// Locations and tuning read from the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct Settings {
    /// Base directory for cached tiles
    #[arg(long, env = "MAPPROXY_CACHE_DATA", global = true)]
    pub cache_data: Option<PathBuf>,

    /// Proxy configuration document
    #[arg(long, env = "MAPPROXY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Cache catalog listing the layers to cache
    #[arg(long, env = "MAPPROXY_CACHE_CONFIG", global = true)]
    pub cache_config: Option<PathBuf>,

    /// Upstream WMS base URL (wms mode)
    #[arg(long, env = "MAPPROXY_CACHE_WMS", global = true)]
    pub wms_url: Option<String>,

    /// Global mapfile (mapfile mode)
    #[arg(long, env = "MAPPROXY_CACHE_MAPFILE", global = true)]
    pub mapfile: Option<PathBuf>,

    /// Capabilities XML document (xml mode)
    #[arg(long, env = "MAPPROXY_CACHE_XML", global = true)]
    pub capabilities_xml: Option<PathBuf>,

    /// Per-layer mapfile name, `{layer}` replaced by the layer name
    #[arg(long, env = "MAPPROXY_LAYER_MAPFILE_TEMPLATE", global = true)]
    pub layer_mapfile_template: Option<String>,

    /// GetCapabilities request timeout in seconds
    #[arg(long, env = "MAPPROXY_HTTP_TIMEOUT_SECS", global = true)]
    pub http_timeout_secs: Option<u64>,

    /// Maximum concurrent GetCapabilities requests
    #[arg(long, env = "MAPPROXY_MAX_CONCURRENT", global = true)]
    pub max_concurrent: Option<usize>,
}

impl Settings {
    /// Resolver settings, defaults filled in for unset tuning values.
    pub fn resolver(&self) -> ResolverSettings {
        let defaults = ResolverSettings::default();
        ResolverSettings {
            wms_url: self.wms_url.clone(),
            mapfile: self.mapfile.clone(),
            capabilities_xml: self.capabilities_xml.clone(),
            layer_mapfile_template: self
                .layer_mapfile_template
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LAYER_MAPFILE_TEMPLATE.to_string()),
            http_timeout: self
                .http_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            max_concurrent: self.max_concurrent.unwrap_or(defaults.max_concurrent),
            user_agent: defaults.user_agent,
        }
    }

    pub fn config_path(&self) -> Result<&Path> {
        required(self.config.as_deref(), "MAPPROXY_CONFIG")
    }

    pub fn cache_config_path(&self) -> Result<&Path> {
        required(self.cache_config.as_deref(), "MAPPROXY_CACHE_CONFIG")
    }

    pub fn cache_data_dir(&self) -> Result<&Path> {
        required(self.cache_data.as_deref(), "MAPPROXY_CACHE_DATA")
    }
}

fn required<'a>(path: Option<&'a Path>, name: &str) -> Result<&'a Path> {
    path.filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| anyhow!("{} is not set", name))
}
