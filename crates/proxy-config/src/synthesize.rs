//! Building a complete configuration from a cache catalog.

use mapproxy_common::{
    service_srs, Dimension, DimensionInfo, GridName, LayerSpec, MapProxyResult,
};
use std::collections::BTreeMap;
use temporal_resolver::TemporalSource;
use tracing::{debug, info};

use crate::catalog::CacheCatalog;
use crate::merge::merge;
use crate::model::{
    CacheEntry, GlobalCache, GlobalHttp, Globals, GridDefinition, LayerEntry, ProxyConfig,
    ServiceMetadata, Services, SourceEntry, WmsService, SERVICE_VERSIONS,
};

/// Header name the proxy uses for upstream requests.
pub const USER_AGENT_HEADER: &str = "User-agent";

/// Deployment settings written into `globals`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Directory the proxy stores tiles under
    pub cache_base_dir: String,
    /// User-Agent sent by the proxy to the upstream
    pub user_agent: String,
}

/// Build the configuration for `catalog` and fill in its temporal dimensions.
pub async fn synthesize(
    catalog: &CacheCatalog,
    options: &SynthesisOptions,
    source: &dyn TemporalSource,
) -> MapProxyResult<ProxyConfig> {
    let config = build_skeleton(catalog, options);
    info!(
        layers = catalog.layers.len(),
        entries = config.layers.len(),
        "Built configuration skeleton"
    );

    let targets = catalog.layer_names();
    merge(config, Some(targets.as_slice()), source).await
}

/// The configuration with placeholder dimensions, before any resolution.
pub fn build_skeleton(catalog: &CacheCatalog, options: &SynthesisOptions) -> ProxyConfig {
    let mut config = ProxyConfig {
        services: services(&catalog.name),
        grids: custom_grids(),
        globals: globals(options),
        ..Default::default()
    };

    for spec in &catalog.layers {
        add_layer(&mut config, spec, &catalog.url);
    }

    config
}

fn add_layer(config: &mut ProxyConfig, spec: &LayerSpec, url: &str) {
    let dimensions = placeholder_dimensions(spec.is_radar());

    for entry in spec.entries() {
        debug!(layer = %spec.name, style = %entry.style, "Configuring layer entry");

        let style = (!entry.is_default_style()).then_some(entry.style.as_str());
        config
            .sources
            .insert(entry.source_name(), SourceEntry::wms(url, &spec.name, style));

        config.caches.insert(
            entry.cache_name(),
            CacheEntry {
                grids: GridName::CACHE_GRIDS
                    .iter()
                    .map(|g| g.as_str().to_string())
                    .collect(),
                sources: vec![entry.source_name()],
                extra: BTreeMap::new(),
            },
        );

        let title = match style {
            Some(style) => format!("{} ({})", spec.name, style),
            None => spec.name.clone(),
        };
        config.layers.push(LayerEntry {
            name: entry.layer_name(),
            title,
            sources: vec![entry.cache_name()],
            dimensions: dimensions.clone(),
            extra: BTreeMap::new(),
        });
    }
}

/// `{time}` for radar layers, `{time, reference_time}` otherwise.
fn placeholder_dimensions(radar: bool) -> BTreeMap<String, DimensionInfo> {
    Dimension::for_layer(radar)
        .iter()
        .map(|d| (d.as_str().to_string(), DimensionInfo::placeholder()))
        .collect()
}

fn custom_grids() -> BTreeMap<String, GridDefinition> {
    GridName::CACHE_GRIDS
        .iter()
        .filter_map(|grid| {
            grid.custom_definition().map(|(srs, bbox)| {
                (
                    grid.as_str().to_string(),
                    GridDefinition {
                        srs: Some(srs.to_string()),
                        bbox: Some(bbox),
                        extra: BTreeMap::new(),
                    },
                )
            })
        })
        .collect()
}

fn globals(options: &SynthesisOptions) -> Globals {
    Globals {
        cache: GlobalCache {
            base_dir: options.cache_base_dir.clone(),
            extra: BTreeMap::new(),
        },
        http: GlobalHttp {
            headers: BTreeMap::from([(USER_AGENT_HEADER.to_string(), options.user_agent.clone())]),
            extra: BTreeMap::new(),
        },
        extra: BTreeMap::new(),
    }
}

fn services(title: &str) -> Services {
    Services {
        demo: Some(serde_yaml::Value::Null),
        wms: Some(WmsService {
            md: ServiceMetadata {
                title: title.to_string(),
                extra: BTreeMap::new(),
            },
            versions: SERVICE_VERSIONS.iter().map(|v| v.to_string()).collect(),
            srs: service_srs(),
            extra: BTreeMap::new(),
        }),
        extra: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SynthesisOptions {
        SynthesisOptions {
            cache_base_dir: "/data/cache".to_string(),
            user_agent: "mapproxy-ctl/test".to_string(),
        }
    }

    fn catalog(layers: Vec<LayerSpec>) -> CacheCatalog {
        CacheCatalog {
            name: "Demo".to_string(),
            url: "http://x".to_string(),
            layers,
        }
    }

    #[test]
    fn test_one_pair_per_layer_style() {
        let config = build_skeleton(
            &catalog(vec![
                LayerSpec::new("TEMP").with_styles(["CONTOUR"]),
                LayerSpec::new("RADAR_1KM_RRAI"),
            ]),
            &options(),
        );

        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.caches.len(), 3);
        let names: Vec<&str> = config.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["TEMP_CONTOUR", "TEMP_default", "RADAR_1KM_RRAI_default"]);

        let cache = &config.caches["TEMP_CONTOUR_cache"];
        assert_eq!(cache.sources, vec!["TEMP_CONTOUR_source"]);
        assert_eq!(
            cache.grids,
            vec!["GLOBAL_GEODETIC", "GLOBAL_WEBMERCATOR", "CANADA_ATLAS_LAMBERT"]
        );

        let req = config.sources["TEMP_CONTOUR_source"].req.as_ref().unwrap();
        assert_eq!(req.layers.names(), vec!["TEMP"]);
        assert_eq!(req.styles.as_deref(), Some("CONTOUR"));
        assert!(config.sources["TEMP_default_source"]
            .req
            .as_ref()
            .unwrap()
            .styles
            .is_none());
    }

    #[test]
    fn test_placeholder_dimensions() {
        let config = build_skeleton(
            &catalog(vec![
                LayerSpec::new("TEMP"),
                LayerSpec::new("RADAR_1KM_RRAI"),
                LayerSpec::new("NOT_A_RADAR_LAYER").with_radar(false),
            ]),
            &options(),
        );

        let keys = |name: &str| -> Vec<String> {
            config.layer(name).unwrap().dimensions.keys().cloned().collect()
        };
        assert_eq!(keys("TEMP_default"), vec!["reference_time", "time"]);
        assert_eq!(keys("RADAR_1KM_RRAI_default"), vec!["time"]);
        assert_eq!(keys("NOT_A_RADAR_LAYER_default"), vec!["reference_time", "time"]);
        assert!(config
            .layers
            .iter()
            .flat_map(|l| l.dimensions.values())
            .all(DimensionInfo::is_placeholder));
    }

    #[test]
    fn test_fixed_sections() {
        let config = build_skeleton(&catalog(vec![]), &options());

        assert_eq!(config.globals.cache.base_dir, "/data/cache");
        assert_eq!(
            config.globals.http.headers.get(USER_AGENT_HEADER).map(String::as_str),
            Some("mapproxy-ctl/test")
        );
        assert_eq!(config.grids.len(), 1);
        assert_eq!(
            config.grids["CANADA_ATLAS_LAMBERT"].srs.as_deref(),
            Some("EPSG:3978")
        );

        let wms = config.services.wms.as_ref().unwrap();
        assert_eq!(wms.md.title, "Demo");
        assert_eq!(wms.versions, vec!["1.3.0", "1.1.1"]);
        assert_eq!(wms.srs, vec!["EPSG:4326", "EPSG:3857", "EPSG:3978"]);
        assert_eq!(config.services.demo, Some(serde_yaml::Value::Null));
    }
}
