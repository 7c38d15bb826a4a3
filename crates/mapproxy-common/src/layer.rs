//! Layer declarations and the naming scheme for generated config entries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MapProxyError, MapProxyResult};

/// Style implicitly appended to every layer's style list.
pub const DEFAULT_STYLE: &str = "default";

/// Marker in a layer name identifying radar products.
pub const RADAR_MARKER: &str = "RADAR";

/// A layer declared in the cache catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Upstream layer name (e.g., "GDPS.ETA_TT")
    pub name: String,

    /// Named rendering variants, without the implicit default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,

    /// Explicit radar classification; inferred from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radar: Option<bool>,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            styles: Vec::new(),
            radar: None,
        }
    }

    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = styles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_radar(mut self, radar: bool) -> Self {
        self.radar = Some(radar);
        self
    }

    /// Radar layers only expose a `time` dimension.
    pub fn is_radar(&self) -> bool {
        self.radar
            .unwrap_or_else(|| name_has_radar_marker(&self.name))
    }

    /// Declared styles followed by the implicit default, without duplicates.
    pub fn effective_styles(&self) -> Vec<&str> {
        let mut styles: Vec<&str> = Vec::with_capacity(self.styles.len() + 1);
        for style in self
            .styles
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(DEFAULT_STYLE))
        {
            if !styles.contains(&style) {
                styles.push(style);
            }
        }
        styles
    }

    /// Config entry names for every effective style.
    pub fn entries(&self) -> Vec<EntryName> {
        self.effective_styles()
            .into_iter()
            .map(|style| EntryName::new(&self.name, style))
            .collect()
    }
}

fn name_has_radar_marker(name: &str) -> bool {
    name.to_ascii_uppercase().contains(RADAR_MARKER)
}

/// Name of a generated (layer, style) entry: `<layer>_<style>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryName {
    pub layer: String,
    pub style: String,
}

impl EntryName {
    pub fn new(layer: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            style: style.into(),
        }
    }

    pub fn is_default_style(&self) -> bool {
        self.style == DEFAULT_STYLE
    }

    /// Layer entry name, e.g. "TEMP_default".
    pub fn layer_name(&self) -> String {
        format!("{}_{}", self.layer, self.style)
    }

    pub fn source_name(&self) -> String {
        format!("{}_source", self.layer_name())
    }

    pub fn cache_name(&self) -> String {
        format!("{}_cache", self.layer_name())
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.layer, self.style)
    }
}

/// Split a `--layers` argument into names; `None` means every layer.
///
/// An absent value, an empty list and the keyword `all` are equivalent.
pub fn parse_layer_list(arg: Option<&str>) -> Option<Vec<String>> {
    let arg = arg?.trim();
    if arg.is_empty() || arg.eq_ignore_ascii_case("all") {
        return None;
    }
    let names: Vec<String> = arg
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

/// Split a destructive `--layers` argument; `None` means every layer.
///
/// Only the keyword `all` selects everything. A value that names no layer
/// is rejected instead of widening to the whole cache.
pub fn parse_clean_targets(arg: &str) -> MapProxyResult<Option<Vec<String>>> {
    if arg.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    let names: Vec<String> = arg
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Err(MapProxyError::InvalidLayerList(format!(
            "'{}' names no layer, pass \"all\" to select every layer",
            arg
        )));
    }
    Ok(Some(names))
}
