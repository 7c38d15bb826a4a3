//! Resolution from MapServer mapfiles.
//!
//! Resolving every layer reads the configured global mapfile once. Named
//! layers are read from their own mapfile next to the global one. INCLUDE
//! directives are followed relative to the including file.

pub mod parser;

use async_trait::async_trait;
use mapproxy_common::{
    Dimension, DimensionInfo, LayerDimensions, LayerTemporalInfo, MapProxyError, MapProxyResult,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use wms_capabilities::capabilities::split_extent;

use crate::{LayerSelection, TemporalSource};
pub use parser::{Mapfile, MapfileError, MapfileLayer};

const TIME_EXTENT: &str = "wms_timeextent";
const TIME_DEFAULT: &str = "wms_timedefault";
const REFERENCE_TIME_EXTENT: &str = "wms_reference_time_extent";
const REFERENCE_TIME_DEFAULT: &str = "wms_reference_time_default";

pub struct MapfileSource {
    global: PathBuf,
    layer_template: String,
}

impl MapfileSource {
    pub fn new(global: impl AsRef<Path>, layer_template: &str) -> Self {
        Self {
            global: global.as_ref().to_path_buf(),
            layer_template: layer_template.to_string(),
        }
    }

    /// Path of the mapfile describing a single layer.
    pub fn layer_path(&self, layer: &str) -> PathBuf {
        let dir = self.global.parent().unwrap_or_else(|| Path::new("."));
        dir.join(self.layer_template.replace("{layer}", layer))
    }

    async fn read(path: &Path) -> Result<Mapfile, String> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_blocking(&path))
            .await
            .map_err(|e| format!("mapfile reader failed: {}", e))?
    }

    async fn lookup(&self, layer: &str) -> MapProxyResult<LayerDimensions> {
        let path = self.layer_path(layer);
        debug!(layer = %layer, path = %path.display(), "Reading layer mapfile");

        let mapfile = Self::read(&path)
            .await
            .map_err(|e| MapProxyError::lookup(layer, e))?;

        mapfile
            .layer(layer)
            .or_else(|| mapfile.layers.first())
            .map(|l| temporal_dimensions(&l.metadata))
            .ok_or_else(|| MapProxyError::lookup(layer, "mapfile defines no LAYER"))
    }
}

fn read_blocking(path: &Path) -> Result<Mapfile, String> {
    let src =
        std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    Mapfile::parse_with_includes(&src, dir, |include| {
        debug!(path = %include.display(), "Reading included mapfile");
        std::fs::read_to_string(include).map_err(|e| e.to_string())
    })
    .map_err(|e| format!("{}: {}", path.display(), e))
}

/// Temporal dimensions described by a LAYER's METADATA.
pub fn temporal_dimensions(metadata: &BTreeMap<String, String>) -> LayerDimensions {
    let mut dims = LayerDimensions::new();

    if let Some(extent) = metadata.get(TIME_EXTENT) {
        dims.insert(
            Dimension::Time,
            DimensionInfo::new(metadata.get(TIME_DEFAULT).cloned(), split_extent(extent)),
        );
    }

    let reference_extent = metadata.get(REFERENCE_TIME_EXTENT);
    let reference_default = metadata.get(REFERENCE_TIME_DEFAULT);
    if reference_extent.is_some() || reference_default.is_some() {
        dims.insert(
            Dimension::ReferenceTime,
            DimensionInfo::new(
                reference_default.cloned(),
                reference_extent.map(|e| split_extent(e)).unwrap_or_default(),
            ),
        );
    }

    dims
}

#[async_trait]
impl TemporalSource for MapfileSource {
    fn describe(&self) -> String {
        format!("mapfile {}", self.global.display())
    }

    async fn resolve(&self, layers: &LayerSelection) -> MapProxyResult<LayerTemporalInfo> {
        let mut ltu = LayerTemporalInfo::new();

        match layers {
            LayerSelection::All => {
                debug!(path = %self.global.display(), "Reading global mapfile");
                let mapfile = Self::read(&self.global)
                    .await
                    .map_err(MapProxyError::SourceUnavailable)?;

                for layer in &mapfile.layers {
                    match layer.name.as_deref() {
                        Some(name) => ltu.insert_layer(name, temporal_dimensions(&layer.metadata)),
                        None => warn!("Skipping unnamed LAYER in global mapfile"),
                    }
                }
            }
            LayerSelection::Named(names) => {
                for name in names {
                    match self.lookup(name).await {
                        Ok(dims) => ltu.insert_layer(name, dims),
                        Err(e) => warn!(layer = %name, error = %e, "Skipping layer"),
                    }
                }
            }
        }

        info!(resolved = ltu.len(), "Resolved temporal dimensions from mapfiles");
        Ok(ltu)
    }
}
