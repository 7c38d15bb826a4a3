//! Strategies for discovering layer temporal dimensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where temporal metadata is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// Live WMS GetCapabilities queries
    #[serde(rename = "wms", alias = "service")]
    Service,
    /// MapServer mapfiles on disk
    Mapfile,
    /// Capabilities XML document already on disk
    #[serde(rename = "xml", alias = "document")]
    Document,
}

impl ResolveMode {
    /// Name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveMode::Service => "wms",
            ResolveMode::Mapfile => "mapfile",
            ResolveMode::Document => "xml",
        }
    }

    /// Setting that must be configured before the mode can run.
    pub fn prerequisite(&self) -> &'static str {
        match self {
            ResolveMode::Service => "MAPPROXY_CACHE_WMS",
            ResolveMode::Mapfile => "MAPPROXY_CACHE_MAPFILE",
            ResolveMode::Document => "MAPPROXY_CACHE_XML",
        }
    }
}

impl Default for ResolveMode {
    fn default() -> Self {
        ResolveMode::Service
    }
}

impl fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wms" | "service" => Ok(ResolveMode::Service),
            "mapfile" => Ok(ResolveMode::Mapfile),
            "xml" | "document" => Ok(ResolveMode::Document),
            other => Err(format!(
                "unknown mode '{}', expected one of: wms, mapfile, xml",
                other
            )),
        }
    }
}
