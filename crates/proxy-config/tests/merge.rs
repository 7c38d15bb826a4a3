//! Selective updates of an existing configuration.

use mapproxy_common::{Dimension, DimensionInfo};
use proxy_config::{build_skeleton, merge, CacheCatalog, ProxyConfig, SynthesisOptions};
use temporal_resolver::StaticSource;
use test_utils::{assert_dimension, temporal_info};

fn skeleton() -> ProxyConfig {
    let catalog = CacheCatalog::from_yaml(
        r#"
service:
  name: Demo
  url: http://x
  layers:
    - name: A
      styles: [CONTOUR]
    - name: B
    - name: RADAR_A
"#,
    )
    .unwrap();
    build_skeleton(
        &catalog,
        &SynthesisOptions {
            cache_base_dir: "/data/cache".to_string(),
            user_agent: "test".to_string(),
        },
    )
}

fn source() -> StaticSource {
    StaticSource::new(temporal_info(&[
        ("A", Dimension::Time, Some("2024-01-02"), &["2024-01-01", "2024-01-02"]),
        ("A", Dimension::ReferenceTime, Some("2024-01-01"), &["2024-01-01"]),
        ("B", Dimension::Time, Some("2024-02-01"), &["2024-02-01"]),
        ("RADAR_A", Dimension::Time, Some("2024-03-01"), &["2024-03-01"]),
    ]))
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_merge_is_idempotent() {
    let source = source();

    let once = merge(skeleton(), None, &source).await.unwrap();
    let twice = merge(once.clone(), None, &source).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(
        twice.layer("A_default").unwrap().dimensions["time"].values.len(),
        2
    );
}

#[tokio::test]
async fn test_merge_leaves_other_layers_alone() {
    let before = skeleton();
    let after = merge(before.clone(), Some(names(&["A"]).as_slice()), &source())
        .await
        .unwrap();

    for name in ["B_default", "RADAR_A_default"] {
        assert_eq!(
            after.layer(name).unwrap().dimensions,
            before.layer(name).unwrap().dimensions
        );
    }
    for name in ["A_CONTOUR", "A_default"] {
        assert_dimension!(
            after.layer(name).unwrap().dimensions["time"],
            Some("2024-01-02"),
            ["2024-01-01", "2024-01-02"]
        );
    }
}

#[tokio::test]
async fn test_layer_without_data_is_unchanged() {
    let mut config = merge(skeleton(), None, &source()).await.unwrap();
    let b_before = config.layer("B_default").unwrap().clone();

    let empty = StaticSource::new(temporal_info(&[(
        "A",
        Dimension::Time,
        Some("2024-05-01"),
        &["2024-05-01"],
    )]));
    config = merge(config, Some(names(&["A", "B"]).as_slice()), &empty).await.unwrap();

    assert_eq!(config.layer("B_default").unwrap(), &b_before);
    // reference_time was not returned this time and keeps the previous value.
    assert_dimension!(
        config.layer("A_default").unwrap().dimensions["reference_time"],
        Some("2024-01-01"),
        ["2024-01-01"]
    );
    assert_dimension!(
        config.layer("A_default").unwrap().dimensions["time"],
        Some("2024-05-01"),
        ["2024-05-01"]
    );
}

#[tokio::test]
async fn test_update_never_restructures() {
    let mut config = skeleton();
    config.layers.retain(|l| l.name != "B_default");
    let caches = config.caches.clone();
    let sources = config.sources.clone();

    let merged = merge(config, None, &source()).await.unwrap();

    assert!(merged.layer("B_default").is_none());
    assert_eq!(merged.caches, caches);
    assert_eq!(merged.sources, sources);
}

#[tokio::test]
async fn test_refresh_all_queries_document_layers() {
    let source = source();
    let merged = merge(skeleton(), Some(&[] as &[String]), &source).await.unwrap();

    assert_eq!(source.calls(), 1);
    assert_dimension!(
        merged.layer("RADAR_A_default").unwrap().dimensions["time"],
        Some("2024-03-01"),
        ["2024-03-01"]
    );
}

#[tokio::test]
async fn test_hand_written_document() {
    let config: ProxyConfig = serde_yaml::from_str(
        r#"
layers:
  - name: A
    title: Hand written
    sources: []
    dimensions:
      time: {default: old, values: [old]}
    legend: keep-me
  - name: AB
    title: Similar name
    sources: []
"#,
    )
    .unwrap();

    let merged = merge(config, Some(names(&["A"]).as_slice()), &source()).await.unwrap();

    let a = merged.layer("A").unwrap();
    assert_eq!(
        a.dimensions["time"],
        DimensionInfo::new(
            Some("2024-01-02".into()),
            vec!["2024-01-01".into(), "2024-01-02".into()]
        )
    );
    // the entry only declares time, so the advertised reference_time stays out
    assert!(!a.dimensions.contains_key("reference_time"));
    assert!(a.extra.contains_key("legend"));
    assert!(merged.layer("AB").unwrap().dimensions.is_empty());
}
