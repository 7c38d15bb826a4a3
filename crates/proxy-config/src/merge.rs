//! Selective refresh of layer dimensions in an existing configuration.

use mapproxy_common::{Dimension, LayerSpec, LayerTemporalInfo, MapProxyResult, DEFAULT_STYLE};
use temporal_resolver::{LayerSelection, TemporalSource};
use tracing::{debug, info, warn};

use crate::model::{LayerEntry, ProxyConfig};

/// Resolve `targets` and write their dimensions into `config`.
///
/// `None` (or an empty list) refreshes every upstream layer referenced by the
/// document. Sources, caches and layer entries are never added or removed;
/// only the dimensions returned by the source are overwritten.
pub async fn merge(
    mut config: ProxyConfig,
    targets: Option<&[String]>,
    source: &dyn TemporalSource,
) -> MapProxyResult<ProxyConfig> {
    if config.layers.is_empty() {
        warn!("Configuration has no layers, nothing to update");
        return Ok(config);
    }

    let selection = match targets {
        Some(names) if !names.is_empty() => LayerSelection::named(names.iter().cloned()),
        _ => LayerSelection::named(config.upstream_layers()),
    };
    debug!(
        source = %source.describe(),
        layers = ?selection.names(),
        all = selection.is_all(),
        "Resolving temporal dimensions"
    );

    let resolved = source.resolve(&selection).await?;

    for name in selection.names() {
        if !resolved.contains_layer(name) {
            warn!(layer = %name, "No temporal data resolved, dimensions left unchanged");
        }
    }

    let updated = apply_temporal_info(&mut config, &resolved);
    info!(
        requested = selection.names().len(),
        resolved = resolved.len(),
        dimensions_updated = updated,
        "Merged temporal dimensions"
    );

    Ok(config)
}

/// Overwrite the dimensions of every entry associated with a resolved layer.
///
/// Returns the number of dimensions written. Dimensions and layers absent
/// from `resolved` are left as they are, so applying the same result twice
/// changes nothing. An entry only receives the dimension keys it already
/// carries; an entry without any gets the keys of its layer's classification,
/// so radar entries never gain `reference_time`.
pub fn apply_temporal_info(config: &mut ProxyConfig, resolved: &LayerTemporalInfo) -> usize {
    if resolved.is_empty() {
        return 0;
    }

    let styles = document_styles(config);
    let associations: Vec<(usize, Vec<String>)> = config
        .layers
        .iter()
        .enumerate()
        .map(|(i, entry)| (i, associated_layers(config, entry, resolved, &styles)))
        .filter(|(_, layers)| !layers.is_empty())
        .collect();

    let mut updated = 0;
    for (index, layers) in associations {
        let entry = &mut config.layers[index];
        for layer in layers {
            let Some(dimensions) = resolved.get(&layer) else {
                continue;
            };
            let allowed: Vec<Dimension> = if entry.dimensions.is_empty() {
                Dimension::for_layer(LayerSpec::new(&layer).is_radar()).to_vec()
            } else {
                entry
                    .dimensions
                    .keys()
                    .filter_map(|key| Dimension::from_name(key))
                    .collect()
            };
            let dimensions: Vec<_> = dimensions
                .iter()
                .filter(|(dimension, _)| allowed.contains(*dimension))
                .collect();

            for (dimension, dim_info) in dimensions {
                debug!(
                    entry = %entry.name,
                    layer = %layer,
                    dimension = %dimension,
                    default = ?dim_info.default,
                    values = dim_info.values.len(),
                    "Updating dimension"
                );
                entry
                    .dimensions
                    .insert(dimension.as_str().to_string(), dim_info.clone());
                updated += 1;
            }
        }
    }
    updated
}

/// Resolved upstream layers a layer entry stands for.
///
/// The cache -> source chain decides when the document has one. Without it,
/// the entry name must be the layer name itself or `<layer>_<style>`.
fn associated_layers(
    config: &ProxyConfig,
    entry: &LayerEntry,
    resolved: &LayerTemporalInfo,
    styles: &[String],
) -> Vec<String> {
    let upstream = config.upstream_layers_of(entry);
    if !upstream.is_empty() {
        return upstream
            .into_iter()
            .filter(|l| resolved.contains_layer(l))
            .map(String::from)
            .collect();
    }

    resolved
        .layer_names()
        .filter(|layer| {
            entry.name == *layer
                || styles
                    .iter()
                    .any(|style| entry.name == format!("{}_{}", layer, style))
        })
        .map(String::from)
        .collect()
}

/// Styles requested by the document's sources, plus the implicit default.
fn document_styles(config: &ProxyConfig) -> Vec<String> {
    let mut styles = vec![DEFAULT_STYLE.to_string()];
    for style in config
        .sources
        .values()
        .filter_map(|s| s.req.as_ref())
        .filter_map(|r| r.styles.as_deref())
    {
        if !styles.iter().any(|s| s == style) {
            styles.push(style.to_string());
        }
    }
    styles
}
