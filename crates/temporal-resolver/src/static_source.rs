//! In-memory temporal source.

use async_trait::async_trait;
use mapproxy_common::{LayerTemporalInfo, MapProxyResult};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{LayerSelection, TemporalSource};

/// Serves a fixed [`LayerTemporalInfo`], filtered to the requested layers.
#[derive(Debug, Default)]
pub struct StaticSource {
    info: LayerTemporalInfo,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(info: LayerTemporalInfo) -> Self {
        Self {
            info,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of resolve calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemporalSource for StaticSource {
    fn describe(&self) -> String {
        format!("static ({} layers)", self.info.len())
    }

    async fn resolve(&self, layers: &LayerSelection) -> MapProxyResult<LayerTemporalInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut ltu = self.info.clone();
        if let LayerSelection::Named(names) = layers {
            ltu.retain_layers(names);
        }
        Ok(ltu)
    }
}
