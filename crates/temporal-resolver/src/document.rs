//! Resolution from a capabilities document already on disk.

use async_trait::async_trait;
use mapproxy_common::{LayerTemporalInfo, MapProxyError, MapProxyResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use wms_capabilities::Capabilities;

use crate::{LayerSelection, TemporalSource};

/// Reads one capabilities document and answers every layer from it.
pub struct CapabilitiesDocumentSource {
    path: PathBuf,
}

impl CapabilitiesDocumentSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn load(&self) -> MapProxyResult<Capabilities> {
        debug!(path = %self.path.display(), "Reading capabilities document");

        let xml = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            MapProxyError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        Capabilities::parse(&xml).map_err(|e| {
            MapProxyError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl TemporalSource for CapabilitiesDocumentSource {
    fn describe(&self) -> String {
        format!("xml {}", self.path.display())
    }

    async fn resolve(&self, layers: &LayerSelection) -> MapProxyResult<LayerTemporalInfo> {
        let caps = self.load().await?;
        let mut ltu = LayerTemporalInfo::new();

        match layers {
            LayerSelection::All => {
                for layer in caps.layers() {
                    if let Some(name) = layer.name.as_deref() {
                        ltu.insert_layer(name, layer.temporal_dimensions());
                    }
                }
            }
            LayerSelection::Named(names) => {
                for name in names {
                    match caps.layer(name) {
                        Some(layer) => ltu.insert_layer(name, layer.temporal_dimensions()),
                        None => {
                            let err = MapProxyError::lookup(name, "layer not in capabilities document");
                            warn!(layer = %name, error = %err, "Skipping layer");
                        }
                    }
                }
            }
        }

        info!(resolved = ltu.len(), "Resolved temporal dimensions from capabilities document");
        Ok(ltu)
    }
}
