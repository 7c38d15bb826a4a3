//! Temporal dimension metadata for cached layers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Temporal dimensions a cached layer can be queried along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Valid time of the product
    Time,
    /// Model run time
    ReferenceTime,
}

impl Dimension {
    /// The fixed allowlist inspected by every resolver.
    pub const ALL: [Dimension; 2] = [Dimension::Time, Dimension::ReferenceTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Time => "time",
            Dimension::ReferenceTime => "reference_time",
        }
    }

    /// Match a dimension name as advertised by a WMS (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(name))
    }

    /// Dimension keys every layer entry carries for its classification.
    pub fn for_layer(radar: bool) -> &'static [Dimension] {
        if radar {
            &[Dimension::Time]
        } else {
            &Dimension::ALL
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value and permitted values of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionInfo {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl DimensionInfo {
    pub fn new(default: Option<String>, values: Vec<String>) -> Self {
        Self { default, values }
    }

    /// Placeholder written before any temporal data is known.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.default.is_none() && self.values.is_empty()
    }

    /// Check that `default` is one of the permitted values.
    ///
    /// Values written as ISO 8601 intervals (`start/end[/period]`) cover every
    /// instant between their bounds. An empty value list or a null default is
    /// always consistent.
    pub fn check_default(&self) -> Result<(), String> {
        let Some(default) = self.default.as_deref() else {
            return Ok(());
        };
        if self.values.is_empty() || self.covers(default) {
            return Ok(());
        }
        Err(format!(
            "default '{}' is not among {} permitted value(s)",
            default,
            self.values.len()
        ))
    }

    /// Whether `value` is listed or falls inside a listed interval.
    pub fn covers(&self, value: &str) -> bool {
        if self.values.iter().any(|v| v == value) {
            return true;
        }
        let Some(instant) = parse_instant(value) else {
            return false;
        };
        self.values.iter().any(|v| {
            let mut parts = v.split('/');
            match (parts.next(), parts.next()) {
                (Some(start), Some(end)) => match (parse_instant(start), parse_instant(end)) {
                    (Some(start), Some(end)) => start <= instant && instant <= end,
                    _ => false,
                },
                _ => false,
            }
        })
    }
}

/// Parse an ISO 8601 instant, assuming UTC when no offset is given.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Dimensions resolved for a single layer.
pub type LayerDimensions = BTreeMap<Dimension, DimensionInfo>;

/// Temporal metadata keyed by upstream layer name.
///
/// Built fresh by every resolve call and consumed by the merge step. Layers
/// without any dimension are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerTemporalInfo {
    layers: BTreeMap<String, LayerDimensions>,
}

impl LayerTemporalInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dimension for a layer.
    ///
    /// A default outside the permitted values is logged, not rejected.
    pub fn insert(&mut self, layer: &str, dimension: Dimension, info: DimensionInfo) {
        if let Err(reason) = info.check_default() {
            warn!(layer = %layer, dimension = %dimension, %reason, "Inconsistent dimension metadata");
        }
        self.layers
            .entry(layer.to_string())
            .or_default()
            .insert(dimension, info);
    }

    /// Record every dimension found for a layer; an empty set is dropped.
    pub fn insert_layer(&mut self, layer: &str, dimensions: LayerDimensions) {
        for (dimension, info) in dimensions {
            self.insert(layer, dimension, info);
        }
    }

    pub fn get(&self, layer: &str) -> Option<&LayerDimensions> {
        self.layers.get(layer)
    }

    pub fn contains_layer(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerDimensions)> {
        self.layers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Merge another result into this one, later entries winning.
    pub fn extend(&mut self, other: LayerTemporalInfo) {
        for (layer, dims) in other.layers {
            self.insert_layer(&layer, dims);
        }
    }

    /// Keep only the named layers.
    pub fn retain_layers(&mut self, names: &[String]) {
        self.layers.retain(|k, _| names.iter().any(|n| n == k));
    }
}
