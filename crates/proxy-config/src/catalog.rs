//! Declarative cache catalog: the layer list a configuration is built from.
//!
//! ```yaml
//! service:
//!   name: My WMS
//!   url: ${UPSTREAM_URL:-http://localhost/wms}
//!   layers:
//!     - name: GDPS.ETA_TT
//!       styles: [CONTOUR]
//!     - RADAR_1KM_RRAI
//! ```
//!
//! The legacy `wms-server` key is accepted in place of `service`. Environment
//! references (`${VAR}` / `${VAR:-default}`) are expanded before parsing.

use mapproxy_common::{LayerSpec, MapProxyError, MapProxyResult};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Upstream service and the layers to cache from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheCatalog {
    pub name: String,
    pub url: String,
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(alias = "wms-server")]
    service: RawService,
}

#[derive(Debug, Deserialize)]
struct RawService {
    name: String,
    url: String,
    #[serde(default)]
    layers: Vec<RawLayer>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLayer {
    Name(String),
    Spec(LayerSpec),
}

impl CacheCatalog {
    /// Load a catalog file.
    pub fn load(path: impl AsRef<Path>) -> MapProxyResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading cache catalog");

        let content = std::fs::read_to_string(path).map_err(|e| {
            MapProxyError::InvalidCatalog(format!("{}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            MapProxyError::InvalidCatalog(reason) => {
                MapProxyError::InvalidCatalog(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Parse catalog YAML, expanding environment references first.
    pub fn from_yaml(content: &str) -> MapProxyResult<Self> {
        let expanded = expand_env_vars(content)?;
        let raw: RawCatalog = serde_yaml::from_str(&expanded)
            .map_err(|e| MapProxyError::InvalidCatalog(e.to_string()))?;

        let mut layers: Vec<LayerSpec> = Vec::with_capacity(raw.service.layers.len());
        for layer in raw.service.layers {
            let spec = match layer {
                RawLayer::Name(name) => LayerSpec::new(name),
                RawLayer::Spec(spec) => spec,
            };
            if spec.name.trim().is_empty() {
                return Err(MapProxyError::InvalidCatalog(
                    "layer with empty name".to_string(),
                ));
            }
            if layers.iter().any(|l| l.name == spec.name) {
                warn!(layer = %spec.name, "Duplicate layer in catalog, keeping the first");
                continue;
            }
            layers.push(spec);
        }

        if layers.is_empty() {
            warn!("Cache catalog declares no layers");
        }

        Ok(Self {
            name: raw.service.name,
            url: raw.service.url,
            layers,
        })
    }

    pub fn layer(&self, name: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// The first `}` closes a reference; defaults cannot contain braces.
fn expand_env_vars(content: &str) -> MapProxyResult<String> {
    let mut expanded = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let Some(end) = reference.find('}') else {
            let line = reference.lines().next().unwrap_or_default();
            return Err(MapProxyError::InvalidCatalog(format!(
                "unclosed variable reference '${{{}'",
                line
            )));
        };
        expanded.push_str(&env_value(&reference[..end])?);
        rest = &reference[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

/// Value of `VAR` or `VAR:-default`; the default also replaces an empty value.
fn env_value(reference: &str) -> MapProxyResult<String> {
    let (name, fallback) = match reference.split_once(":-") {
        Some((name, fallback)) => (name.trim(), Some(fallback)),
        None => (reference.trim(), None),
    };

    match (std::env::var(name), fallback) {
        (Ok(value), Some(fallback)) if value.is_empty() => Ok(fallback.to_string()),
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_string()),
        (Err(_), None) => Err(MapProxyError::InvalidCatalog(format!(
            "environment variable {} is not set",
            name
        ))),
    }
}
