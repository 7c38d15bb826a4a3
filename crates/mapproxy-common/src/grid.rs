//! Tile grids referenced by generated caches.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grids every generated cache is seeded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridName {
    /// Built-in geographic grid (EPSG:4326)
    #[serde(rename = "GLOBAL_GEODETIC")]
    GlobalGeodetic,
    /// Built-in web mercator grid (EPSG:3857)
    #[serde(rename = "GLOBAL_WEBMERCATOR")]
    GlobalWebMercator,
    /// Custom Canada Atlas Lambert grid (EPSG:3978)
    #[serde(rename = "CANADA_ATLAS_LAMBERT")]
    CanadaAtlasLambert,
}

impl GridName {
    /// Grid list attached to every generated cache, in order.
    pub const CACHE_GRIDS: [GridName; 3] = [
        GridName::GlobalGeodetic,
        GridName::GlobalWebMercator,
        GridName::CanadaAtlasLambert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GridName::GlobalGeodetic => "GLOBAL_GEODETIC",
            GridName::GlobalWebMercator => "GLOBAL_WEBMERCATOR",
            GridName::CanadaAtlasLambert => "CANADA_ATLAS_LAMBERT",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::CACHE_GRIDS.into_iter().find(|g| g.as_str() == name)
    }

    pub fn srs(&self) -> &'static str {
        match self {
            GridName::GlobalGeodetic => "EPSG:4326",
            GridName::GlobalWebMercator => "EPSG:3857",
            GridName::CanadaAtlasLambert => "EPSG:3978",
        }
    }

    /// Definition to write under `grids:`; built-in grids need none.
    pub fn custom_definition(&self) -> Option<(&'static str, BoundingBox)> {
        match self {
            GridName::CanadaAtlasLambert => Some((
                self.srs(),
                BoundingBox::new(-7192737.96, -3004297.73, 5183275.29, 4484204.83),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for GridName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory suffix the proxy uses for a grid's tiles: `<cache>_<suffix>`.
///
/// Built-in grids are stored under their legacy EPSG names, custom grids
/// under the grid name itself.
pub fn cache_dir_suffix(grid: &str) -> &str {
    match grid {
        "GLOBAL_GEODETIC" => "EPSG4326",
        "GLOBAL_WEBMERCATOR" | "GLOBAL_MERCATOR" => "EPSG900913",
        other => other,
    }
}

/// Spatial reference systems advertised by the generated WMS service.
pub fn service_srs() -> Vec<String> {
    GridName::CACHE_GRIDS
        .iter()
        .map(|g| g.srs().to_string())
        .collect()
}
