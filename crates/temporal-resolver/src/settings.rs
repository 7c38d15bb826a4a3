//! Backend locations and tuning for temporal resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file name pattern for per-layer mapfiles.
pub const DEFAULT_LAYER_MAPFILE_TEMPLATE: &str = "geomet-{layer}-en.map";

/// Explicit resolver configuration.
///
/// Each mode only reads its own prerequisite; the others may stay unset.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// WMS base URL queried in service mode
    pub wms_url: Option<String>,

    /// Global mapfile; its directory also holds the per-layer mapfiles
    pub mapfile: Option<PathBuf>,

    /// Capabilities XML document read in document mode
    pub capabilities_xml: Option<PathBuf>,

    /// Per-layer mapfile name, `{layer}` replaced by the layer name
    pub layer_mapfile_template: String,

    /// Timeout for a single GetCapabilities request
    pub http_timeout: Duration,

    /// Maximum concurrent GetCapabilities requests
    pub max_concurrent: usize,

    /// User-Agent sent upstream
    pub user_agent: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            wms_url: None,
            mapfile: None,
            capabilities_xml: None,
            layer_mapfile_template: DEFAULT_LAYER_MAPFILE_TEMPLATE.to_string(),
            http_timeout: Duration::from_secs(30),
            max_concurrent: 4,
            user_agent: concat!("mapproxy-ctl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ResolverSettings {
    pub fn wms_url(&self) -> Option<&str> {
        self.wms_url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn mapfile(&self) -> Option<&Path> {
        non_empty_path(self.mapfile.as_deref())
    }

    pub fn capabilities_xml(&self) -> Option<&Path> {
        non_empty_path(self.capabilities_xml.as_deref())
    }
}

fn non_empty_path(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}
