//! Live WMS GetCapabilities resolution.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use mapproxy_common::{LayerDimensions, LayerTemporalInfo, MapProxyError, MapProxyResult};
use tracing::{debug, info, warn};
use wms_capabilities::Capabilities;

use crate::{LayerSelection, ResolverSettings, TemporalSource};

/// Queries a WMS for each layer's capabilities.
pub struct WmsServiceSource {
    base_url: String,
    client: reqwest::Client,
    max_concurrent: usize,
}

impl WmsServiceSource {
    pub fn new(base_url: &str, settings: &ResolverSettings) -> MapProxyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| MapProxyError::SourceUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.to_string(),
            client,
            max_concurrent: settings.max_concurrent.max(1),
        })
    }

    /// Fetch GetCapabilities, scoped to one layer when given.
    async fn fetch_capabilities(&self, layer: Option<&str>) -> Result<Capabilities, String> {
        let mut query = vec![
            ("SERVICE", "WMS"),
            ("VERSION", "1.3.0"),
            ("REQUEST", "GetCapabilities"),
        ];
        if let Some(layer) = layer {
            query.push(("LAYER", layer));
        }

        debug!(url = %self.base_url, layer = ?layer, "Requesting WMS capabilities");

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        let body = response.text().await.map_err(|e| e.to_string())?;

        Capabilities::parse(&body).map_err(|e| e.to_string())
    }

    async fn lookup(&self, layer: &str) -> MapProxyResult<LayerDimensions> {
        let caps = self
            .fetch_capabilities(Some(layer))
            .await
            .map_err(|e| MapProxyError::lookup(layer, e))?;

        caps.layer(layer)
            .map(|l| l.temporal_dimensions())
            .ok_or_else(|| MapProxyError::lookup(layer, "layer not advertised by service"))
    }
}

#[async_trait]
impl TemporalSource for WmsServiceSource {
    fn describe(&self) -> String {
        format!("wms {}", self.base_url)
    }

    async fn resolve(&self, layers: &LayerSelection) -> MapProxyResult<LayerTemporalInfo> {
        let mut ltu = LayerTemporalInfo::new();

        let names = match layers {
            LayerSelection::All => {
                let caps = self
                    .fetch_capabilities(None)
                    .await
                    .map_err(MapProxyError::SourceUnavailable)?;
                for layer in caps.layers() {
                    if let Some(name) = layer.name.as_deref() {
                        ltu.insert_layer(name, layer.temporal_dimensions());
                    }
                }
                info!(layers = ltu.len(), "Resolved temporal dimensions from WMS");
                return Ok(ltu);
            }
            LayerSelection::Named(names) => names,
        };

        let results: Vec<(String, MapProxyResult<LayerDimensions>)> =
            stream::iter(names.iter().cloned())
                .map(|name| async move {
                    let result = self.lookup(&name).await;
                    (name, result)
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        for (name, result) in results {
            match result {
                Ok(dims) if dims.is_empty() => {
                    debug!(layer = %name, "Layer advertises no temporal dimensions");
                }
                Ok(dims) => ltu.insert_layer(&name, dims),
                Err(e) => warn!(layer = %name, error = %e, "Skipping layer"),
            }
        }

        info!(
            requested = names.len(),
            resolved = ltu.len(),
            "Resolved temporal dimensions from WMS"
        );
        Ok(ltu)
    }
}
