//! WMS service resolution against a local capabilities server.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use mapproxy_common::{Dimension, MapProxyError, ResolveMode};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use temporal_resolver::{build_source, LayerSelection, ResolverSettings};
use test_utils::{
    assert_dimension, CAPABILITIES_XML, LAYER_NOT_DEFINED_XML, MODEL_LAYER,
    MODEL_LAYER_CAPABILITIES_XML, RADAR_LAYER,
};

#[derive(Clone, Default)]
struct Upstream {
    requests: Arc<AtomicUsize>,
}

async fn capabilities(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    upstream.requests.fetch_add(1, Ordering::SeqCst);

    if params.get("REQUEST").map(String::as_str) != Some("GetCapabilities") {
        return (StatusCode::BAD_REQUEST, "unsupported request".to_string());
    }

    let body = match params.get("LAYER").map(String::as_str) {
        None => CAPABILITIES_XML,
        Some(MODEL_LAYER) => MODEL_LAYER_CAPABILITIES_XML,
        Some("BROKEN") => return (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
        Some(_) => LAYER_NOT_DEFINED_XML,
    };
    (StatusCode::OK, body.to_string())
}

async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/wms", get(capabilities))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/wms", addr), upstream)
}

fn settings(url: &str) -> ResolverSettings {
    ResolverSettings {
        wms_url: Some(url.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_named_layers_are_queried_individually() {
    let (url, upstream) = spawn_upstream().await;
    let source = build_source(ResolveMode::Service, &settings(&url)).unwrap();

    let info = source
        .resolve(&LayerSelection::named([MODEL_LAYER]))
        .await
        .unwrap();

    let dims = info.get(MODEL_LAYER).unwrap();
    assert_dimension!(
        dims[&Dimension::Time],
        Some("2024-01-01T12:00:00Z"),
        ["2024-01-01T00:00:00Z/2024-01-11T00:00:00Z/PT3H"]
    );
    assert_dimension!(
        dims[&Dimension::ReferenceTime],
        Some("2024-01-01T00:00:00Z"),
        ["2023-12-31T12:00:00Z", "2024-01-01T00:00:00Z"]
    );
    assert_eq!(upstream.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_layers_are_skipped() {
    let (url, upstream) = spawn_upstream().await;
    let source = build_source(ResolveMode::Service, &settings(&url)).unwrap();

    let info = source
        .resolve(&LayerSelection::named([MODEL_LAYER, "UNKNOWN", "BROKEN"]))
        .await
        .unwrap();

    assert_eq!(info.layer_names().collect::<Vec<_>>(), vec![MODEL_LAYER]);
    assert_eq!(upstream.requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_all_layers_use_one_request() {
    let (url, upstream) = spawn_upstream().await;
    let source = build_source(ResolveMode::Service, &settings(&url)).unwrap();

    let info = source.resolve(&LayerSelection::All).await.unwrap();

    assert!(info.contains_layer(MODEL_LAYER));
    assert!(info.contains_layer(RADAR_LAYER));
    assert!(!info.get(RADAR_LAYER).unwrap().contains_key(&Dimension::ReferenceTime));
    assert_eq!(info.len(), 2);
    assert_eq!(upstream.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_service() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/wms", listener.local_addr().unwrap());
    drop(listener);

    let source = build_source(ResolveMode::Service, &settings(&url)).unwrap();

    let named = source
        .resolve(&LayerSelection::named([MODEL_LAYER]))
        .await
        .unwrap();
    assert!(named.is_empty());

    let all = source.resolve(&LayerSelection::All).await;
    assert!(matches!(all, Err(MapProxyError::SourceUnavailable(_))));
}
