//! Temporal metadata resolution for cached layers.
//!
//! A [`TemporalSource`] maps layer names to the `time` / `reference_time`
//! dimensions the upstream advertises. Three strategies exist, one per
//! [`ResolveMode`]:
//!
//! - [`WmsServiceSource`]: live GetCapabilities queries, one per layer
//! - [`MapfileSource`]: MapServer mapfiles on disk
//! - [`CapabilitiesDocumentSource`]: a capabilities document already on disk
//!
//! [`StaticSource`] serves a fixed result and backs tests.
//!
//! Per-layer failures are logged and skipped; only a missing prerequisite
//! (checked by [`build_source`] before any I/O) or an unreadable shared
//! backend aborts resolution.

pub mod document;
pub mod mapfile;
pub mod service;
pub mod settings;
pub mod static_source;

use async_trait::async_trait;
use mapproxy_common::{LayerTemporalInfo, MapProxyError, MapProxyResult, ResolveMode};
use tracing::debug;

pub use document::CapabilitiesDocumentSource;
pub use mapfile::MapfileSource;
pub use service::WmsServiceSource;
pub use settings::ResolverSettings;
pub use static_source::StaticSource;

/// Which layers a resolve call covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSelection {
    /// Every layer the backend knows about
    All,
    /// Exactly these layers, in order
    Named(Vec<String>),
}

impl LayerSelection {
    /// Build a selection from names; an empty list selects everything.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names.into_iter().map(Into::into) {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        if unique.is_empty() {
            LayerSelection::All
        } else {
            LayerSelection::Named(unique)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, LayerSelection::All)
    }

    /// Selected names; empty for [`LayerSelection::All`].
    pub fn names(&self) -> &[String] {
        match self {
            LayerSelection::All => &[],
            LayerSelection::Named(names) => names,
        }
    }
}

/// A backend able to report layer temporal dimensions.
#[async_trait]
pub trait TemporalSource: Send + Sync {
    /// Human-readable backend description for logs.
    fn describe(&self) -> String;

    /// Resolve temporal dimensions for the selected layers.
    ///
    /// Layers without any dimension, or whose lookup failed, are absent
    /// from the result.
    async fn resolve(&self, layers: &LayerSelection) -> MapProxyResult<LayerTemporalInfo>;
}

/// Build the source for `mode`, failing if its prerequisite is not configured.
///
/// No network or file access happens here.
pub fn build_source(
    mode: ResolveMode,
    settings: &ResolverSettings,
) -> MapProxyResult<Box<dyn TemporalSource>> {
    let missing = || MapProxyError::MissingPrerequisite {
        mode: mode.as_str(),
        setting: mode.prerequisite(),
    };

    let source: Box<dyn TemporalSource> = match mode {
        ResolveMode::Service => {
            let url = settings.wms_url().ok_or_else(missing)?;
            Box::new(WmsServiceSource::new(url, settings)?)
        }
        ResolveMode::Mapfile => {
            let path = settings.mapfile().ok_or_else(missing)?;
            Box::new(MapfileSource::new(path, &settings.layer_mapfile_template))
        }
        ResolveMode::Document => {
            let path = settings.capabilities_xml().ok_or_else(missing)?;
            Box::new(CapabilitiesDocumentSource::new(path))
        }
    };

    debug!(mode = %mode, source = %source.describe(), "Built temporal source");
    Ok(source)
}
