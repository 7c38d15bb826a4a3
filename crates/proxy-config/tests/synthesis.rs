//! Catalog to configuration, end to end with an in-memory source.

use mapproxy_common::{Dimension, LayerSpec};
use proxy_config::{store, synthesize, CacheCatalog, SynthesisOptions};
use temporal_resolver::StaticSource;
use test_utils::{
    assert_dimension, fixture_temporal_info, temp_test_dir, temporal_info, CACHE_CATALOG_YAML,
    MODEL_LAYER, RADAR_LAYER, STATIC_LAYER,
};

fn options() -> SynthesisOptions {
    SynthesisOptions {
        cache_base_dir: "/data/cache".to_string(),
        user_agent: "mapproxy-ctl/test".to_string(),
    }
}

#[tokio::test]
async fn test_minimal_catalog() {
    let catalog = CacheCatalog::from_yaml(
        r#"{service: {name: "Demo", url: "http://x", layers: [{name: "TEMP"}]}}"#,
    )
    .unwrap();
    let source = StaticSource::new(temporal_info(&[(
        "TEMP",
        Dimension::Time,
        Some("2024-01-01"),
        &["2024-01-01"],
    )]));

    let config = synthesize(&catalog, &options(), &source).await.unwrap();

    let entry = config.layer("TEMP_default").unwrap();
    assert_eq!(entry.sources, vec!["TEMP_default_cache"]);
    assert_dimension!(entry.dimensions["time"], Some("2024-01-01"), ["2024-01-01"]);
    assert_dimension!(entry.dimensions["reference_time"], None, []);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_fixture_catalog() {
    let catalog = CacheCatalog::from_yaml(CACHE_CATALOG_YAML).unwrap();
    let source = StaticSource::new(fixture_temporal_info());

    let config = synthesize(&catalog, &options(), &source).await.unwrap();

    // GDPS.ETA_TT has one declared style plus default.
    assert_eq!(config.layers.len(), 4);
    assert_eq!(config.sources.len(), 4);
    assert_eq!(config.caches.len(), 4);

    for name in ["GDPS.ETA_TT_TEMPERATURE_CONTOUR", "GDPS.ETA_TT_default"] {
        let entry = config.layer(name).unwrap();
        assert_dimension!(
            entry.dimensions["reference_time"],
            Some("2024-01-01T00:00:00Z"),
            ["2023-12-31T12:00:00Z", "2024-01-01T00:00:00Z"]
        );
    }

    let radar = config.layer(&format!("{}_default", RADAR_LAYER)).unwrap();
    assert_eq!(radar.dimensions.keys().collect::<Vec<_>>(), vec!["time"]);

    // Nothing resolved for the static layer: placeholders stay.
    let current = config.layer(&format!("{}_default", STATIC_LAYER)).unwrap();
    assert_dimension!(current.dimensions["time"], None, []);
    assert_dimension!(current.dimensions["reference_time"], None, []);

    assert!(config.layers.iter().all(|l| l.title.starts_with(MODEL_LAYER)
        || l.title == RADAR_LAYER
        || l.title == STATIC_LAYER));
}

#[tokio::test]
async fn test_one_cache_and_source_per_layer_style() {
    let catalog = CacheCatalog {
        name: "Demo".to_string(),
        url: "http://x".to_string(),
        layers: vec![
            LayerSpec::new("A").with_styles(["S1", "S2"]),
            LayerSpec::new("B"),
            LayerSpec::new("C").with_styles(["default"]),
        ],
    };
    let source = StaticSource::new(Default::default());

    let config = synthesize(&catalog, &options(), &source).await.unwrap();

    let expected = ["A_S1", "A_S2", "A_default", "B_default", "C_default"];
    assert_eq!(
        config.layers.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
        expected
    );
    for name in expected {
        let cache = &config.caches[&format!("{}_cache", name)];
        assert_eq!(cache.sources, vec![format!("{}_source", name)]);
        assert!(config.sources.contains_key(&format!("{}_source", name)));
    }
    assert_eq!(config.caches.len(), expected.len());
    assert_eq!(config.sources.len(), expected.len());
}

#[tokio::test]
async fn test_radar_dimension_keys() {
    let catalog = CacheCatalog {
        name: "Demo".to_string(),
        url: "http://x".to_string(),
        layers: vec![
            LayerSpec::new("RADAR_1KM_RSNO"),
            LayerSpec::new("radar_coverage"),
            LayerSpec::new("PRECIP").with_radar(true),
            LayerSpec::new("TEMP"),
        ],
    };
    let source = StaticSource::new(temporal_info(&[
        ("RADAR_1KM_RSNO", Dimension::Time, Some("T"), &["T"]),
        ("TEMP", Dimension::Time, Some("T"), &["T"]),
    ]));

    let config = synthesize(&catalog, &options(), &source).await.unwrap();

    for entry in &config.layers {
        let keys: Vec<&str> = entry.dimensions.keys().map(String::as_str).collect();
        if entry.name == "TEMP_default" {
            assert_eq!(keys, vec!["reference_time", "time"]);
        } else {
            assert_eq!(keys, vec!["time"], "{}", entry.name);
        }
    }
}

#[tokio::test]
async fn test_synthesized_document_survives_store() {
    let catalog = CacheCatalog::from_yaml(CACHE_CATALOG_YAML).unwrap();
    let source = StaticSource::new(fixture_temporal_info());
    let config = synthesize(&catalog, &options(), &source).await.unwrap();

    let dir = temp_test_dir();
    let path = dir.path().join("mapproxy.yaml");
    store::save(&config, &path).unwrap();

    let loaded = store::load(&path).unwrap();
    assert_eq!(loaded, config);

    let yaml = std::fs::read_to_string(&path).unwrap();
    assert!(yaml.contains("CANADA_ATLAS_LAMBERT"));
    assert!(yaml.contains("dim_reference_time"));
}

#[tokio::test]
async fn test_radar_keys_ignore_advertised_reference_time() {
    let catalog = CacheCatalog::from_yaml(&format!(
        "{{service: {{name: Demo, url: 'http://x', layers: [{{name: {}}}]}}}}",
        RADAR_LAYER
    ))
    .unwrap();
    let source = StaticSource::new(temporal_info(&[
        (
            RADAR_LAYER,
            Dimension::Time,
            Some("2024-01-01T02:54:00Z"),
            &["2024-01-01T00:00:00Z/2024-01-01T03:00:00Z/PT6M"],
        ),
        (
            RADAR_LAYER,
            Dimension::ReferenceTime,
            Some("2024-01-01T00:00:00Z"),
            &["2024-01-01T00:00:00Z"],
        ),
    ]));

    let config = synthesize(&catalog, &options(), &source).await.unwrap();

    let radar = config.layer(&format!("{}_default", RADAR_LAYER)).unwrap();
    assert_eq!(radar.dimensions.keys().collect::<Vec<_>>(), vec!["time"]);
    assert_dimension!(
        radar.dimensions["time"],
        Some("2024-01-01T02:54:00Z"),
        ["2024-01-01T00:00:00Z/2024-01-01T03:00:00Z/PT6M"]
    );
}
