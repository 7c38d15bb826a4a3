//! The persisted proxy configuration document.
//!
//! Only the keys this tool writes are typed. Everything else found in an
//! existing document is kept in `extra` maps so an update round-trip never
//! loses hand-edited settings.

use mapproxy_common::{BoundingBox, DimensionInfo};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Source type for every generated source.
pub const WMS_SOURCE_TYPE: &str = "wms";

/// Request parameters forwarded from the client to the upstream WMS.
pub const FORWARD_REQ_PARAMS: [&str; 2] = ["time", "dim_reference_time"];

/// WMS version used against the upstream.
pub const UPSTREAM_WMS_VERSION: &str = "1.3.0";

/// GetFeatureInfo format requested from the upstream.
pub const FEATUREINFO_FORMAT: &str = "application/vnd.ogc.gml";

/// WMS versions served by the proxy.
pub const SERVICE_VERSIONS: [&str; 2] = ["1.3.0", "1.1.1"];

type Extra = BTreeMap<String, Value>;

/// Top-level proxy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub services: Services,

    #[serde(default)]
    pub layers: Vec<LayerEntry>,

    #[serde(default)]
    pub caches: BTreeMap<String, CacheEntry>,

    #[serde(default)]
    pub sources: BTreeMap<String, SourceEntry>,

    #[serde(default)]
    pub grids: BTreeMap<String, GridDefinition>,

    #[serde(default)]
    pub globals: Globals,

    #[serde(flatten)]
    pub extra: Extra,
}

impl ProxyConfig {
    pub fn layer(&self, name: &str) -> Option<&LayerEntry> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut LayerEntry> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    /// Upstream layer names requested by the sources behind a layer entry.
    ///
    /// Follows entry -> cache -> source; a source name listed directly on
    /// the entry is followed as well.
    pub fn upstream_layers_of<'a>(&'a self, entry: &LayerEntry) -> Vec<&'a str> {
        let mut upstream: Vec<&'a str> = Vec::new();
        let mut push = |source: &'a SourceEntry| {
            for name in source.upstream_layers() {
                if !upstream.contains(&name) {
                    upstream.push(name);
                }
            }
        };

        for name in &entry.sources {
            if let Some(cache) = self.caches.get(name) {
                for source in cache.sources.iter().filter_map(|s| self.sources.get(s)) {
                    push(source);
                }
            } else if let Some(source) = self.sources.get(name) {
                push(source);
            }
        }
        upstream
    }

    /// Every upstream layer referenced by a layer entry, in document order.
    pub fn upstream_layers(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.layers {
            for name in self.upstream_layers_of(entry) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Grids used by the caches behind a layer entry.
    pub fn cache_grids_of<'a>(&'a self, entry: &'a LayerEntry) -> Vec<(&'a str, &'a str)> {
        entry
            .sources
            .iter()
            .filter_map(|name| self.caches.get(name).map(|cache| (name.as_str(), cache)))
            .flat_map(|(name, cache)| cache.grids.iter().map(move |g| (name, g.as_str())))
            .collect()
    }
}

/// A published layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub sources: Vec<String>,

    /// Dimension name -> default and permitted values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, DimensionInfo>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A tile cache in front of one or more sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub grids: Vec<String>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// An upstream map source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forward_req_params: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req: Option<SourceRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wms_opts: Option<WmsOptions>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl SourceEntry {
    /// A WMS source for one upstream layer, optionally in a named style.
    pub fn wms(url: &str, layer: &str, style: Option<&str>) -> Self {
        Self {
            kind: WMS_SOURCE_TYPE.to_string(),
            forward_req_params: FORWARD_REQ_PARAMS.iter().map(|p| p.to_string()).collect(),
            req: Some(SourceRequest {
                layers: RequestLayers::from(layer),
                url: url.to_string(),
                transparent: true,
                styles: style.map(String::from),
                extra: Extra::new(),
            }),
            wms_opts: Some(WmsOptions::default()),
            extra: Extra::new(),
        }
    }

    /// Layers requested upstream; empty unless this is a request-based source.
    pub fn upstream_layers(&self) -> Vec<&str> {
        self.req
            .as_ref()
            .map(|r| r.layers.names())
            .unwrap_or_default()
    }
}

/// `req.layers`, written either as a comma-separated string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestLayers {
    Joined(String),
    List(Vec<String>),
}

impl RequestLayers {
    pub fn names(&self) -> Vec<&str> {
        let names: Vec<&str> = match self {
            RequestLayers::Joined(joined) => joined.split(',').collect(),
            RequestLayers::List(list) => list.iter().map(String::as_str).collect(),
        };
        names
            .into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

impl Default for RequestLayers {
    fn default() -> Self {
        RequestLayers::Joined(String::new())
    }
}

impl From<&str> for RequestLayers {
    fn from(layer: &str) -> Self {
        RequestLayers::Joined(layer.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRequest {
    #[serde(default)]
    pub layers: RequestLayers,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub transparent: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featureinfo_format: Option<String>,

    #[serde(default)]
    pub legendgraphic: bool,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for WmsOptions {
    fn default() -> Self {
        Self {
            version: Some(UPSTREAM_WMS_VERSION.to_string()),
            featureinfo_format: Some(FEATUREINFO_FORMAT.to_string()),
            legendgraphic: true,
            extra: Extra::new(),
        }
    }
}

/// A custom grid. Grids derived with `base:` may leave `srs` out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Globals {
    #[serde(default)]
    pub cache: GlobalCache,

    #[serde(default)]
    pub http: GlobalHttp,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalCache {
    #[serde(default)]
    pub base_dir: String,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalHttp {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Services {
    /// `Some(null)` enables the demo service; `None` leaves the key out
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub demo: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wms: Option<WmsService>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsService {
    #[serde(default)]
    pub md: ServiceMetadata,

    #[serde(default)]
    pub versions: Vec<String>,

    #[serde(default)]
    pub srs: Vec<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    #[serde(default)]
    pub title: String,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Keep an explicit `null` as `Some(Value::Null)`; only a missing key is `None`.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}
