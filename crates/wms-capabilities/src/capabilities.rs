//! GetCapabilities document parsing.
//!
//! Only the parts needed to drive cache configuration are read: named
//! layers, their titles, and the dimensions they advertise.

use mapproxy_common::{Dimension, DimensionInfo, LayerDimensions};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapabilitiesError {
    #[error("XML parsing error at position {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("Service exception: {0}")]
    ServiceException(String),

    #[error("Not a WMS capabilities document (root element '{0}')")]
    UnexpectedRoot(String),
}

/// A dimension as advertised by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisedDimension {
    /// Lowercased dimension name
    pub name: String,
    pub units: Option<String>,
    pub default: Option<String>,
    /// Extent split on commas, intervals kept whole
    pub values: Vec<String>,
}

impl AdvertisedDimension {
    pub fn to_info(&self) -> DimensionInfo {
        DimensionInfo::new(self.default.clone(), self.values.clone())
    }
}

/// A named layer with its effective (inherited or declared) dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitiesLayer {
    pub name: Option<String>,
    pub title: Option<String>,
    pub dimensions: Vec<AdvertisedDimension>,
}

impl CapabilitiesLayer {
    /// Find a dimension by name (case-insensitive).
    pub fn dimension(&self, name: &str) -> Option<&AdvertisedDimension> {
        self.dimensions
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// The `time` / `reference_time` dimensions this layer advertises.
    pub fn temporal_dimensions(&self) -> LayerDimensions {
        let mut dims = LayerDimensions::new();
        for dimension in Dimension::ALL {
            if let Some(advertised) = self.dimension(dimension.as_str()) {
                dims.insert(dimension, advertised.to_info());
            }
        }
        dims
    }
}

/// Parsed GetCapabilities response.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub version: Option<String>,
    layers: Vec<CapabilitiesLayer>,
}

impl Capabilities {
    /// Parse a WMS 1.1.1 or 1.3.0 capabilities document.
    pub fn parse(xml: &str) -> Result<Self, CapabilitiesError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut parser = Parser::default();

        loop {
            let position = reader.buffer_position();
            let xml_err = |message: String| CapabilitiesError::Xml { position, message };

            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    parser.open(&e).map_err(xml_err)?;
                    parser.path.push(e.local_name().as_ref().to_vec());
                }
                Ok(Event::Empty(e)) => {
                    parser.open(&e).map_err(xml_err)?;
                    parser.close(e.local_name().as_ref());
                }
                Ok(Event::End(e)) => {
                    parser.path.pop();
                    parser.close(e.local_name().as_ref());
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| xml_err(e.to_string()))?;
                    parser.text(&text);
                }
                Ok(Event::CData(t)) => {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    parser.text(&text);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(CapabilitiesError::Xml {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })
                }
                _ => {}
            }
            buf.clear();
        }

        parser.finish()
    }

    /// Look up a named layer anywhere in the layer tree.
    pub fn layer(&self, name: &str) -> Option<&CapabilitiesLayer> {
        self.layers
            .iter()
            .find(|l| l.name.as_deref() == Some(name))
    }

    /// Named layers in document order.
    pub fn layers(&self) -> &[CapabilitiesLayer] {
        &self.layers
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter_map(|l| l.name.as_deref())
    }
}

struct PendingDimension {
    name: String,
    units: Option<String>,
    default: Option<String>,
    text: String,
}

#[derive(Default)]
struct Parser {
    root: Option<String>,
    version: Option<String>,
    exception: Option<String>,
    path: Vec<Vec<u8>>,
    /// Open layers: slot index into `slots` and the layer being built
    frames: Vec<(usize, CapabilitiesLayer)>,
    slots: Vec<Option<CapabilitiesLayer>>,
    pending: Option<PendingDimension>,
}

impl Parser {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<(), String> {
        let local = e.local_name();
        let local = local.as_ref();

        if self.path.is_empty() && self.root.is_none() {
            self.root = Some(String::from_utf8_lossy(local).into_owned());
            match local {
                b"WMS_Capabilities" | b"WMT_MS_Capabilities" => {
                    self.version = attribute(e, b"version")?;
                }
                b"ServiceExceptionReport" => self.exception = Some(String::new()),
                _ => {}
            }
            return Ok(());
        }

        match local {
            b"Layer" => {
                let inherited = self
                    .frames
                    .last()
                    .map(|(_, parent)| parent.dimensions.clone())
                    .unwrap_or_default();
                self.slots.push(None);
                self.frames.push((
                    self.slots.len() - 1,
                    CapabilitiesLayer {
                        dimensions: inherited,
                        ..Default::default()
                    },
                ));
            }
            b"Dimension" | b"Extent" if self.parent_is(b"Layer") => {
                self.pending = Some(PendingDimension {
                    name: attribute(e, b"name")?
                        .unwrap_or_default()
                        .to_ascii_lowercase(),
                    units: attribute(e, b"units")?,
                    default: attribute(e, b"default")?,
                    text: String::new(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"Dimension" | b"Extent" => {
                if let Some(pending) = self.pending.take() {
                    self.finish_dimension(pending);
                }
            }
            b"Layer" => {
                if let Some((slot, layer)) = self.frames.pop() {
                    if layer.name.is_some() {
                        self.slots[slot] = Some(layer);
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(pending) = self.pending.as_mut() {
            pending.text.push_str(text);
            return;
        }
        if let Some(exception) = self.exception.as_mut() {
            if !exception.is_empty() {
                exception.push(' ');
            }
            exception.push_str(text.trim());
            return;
        }

        let n = self.path.len();
        if n < 2 || self.path[n - 2] != b"Layer" {
            return;
        }
        let Some((_, layer)) = self.frames.last_mut() else {
            return;
        };
        let field = match self.path[n - 1].as_slice() {
            b"Name" => &mut layer.name,
            b"Title" => &mut layer.title,
            _ => return,
        };
        field.get_or_insert_with(String::new).push_str(text.trim());
    }

    fn parent_is(&self, name: &[u8]) -> bool {
        self.path.last().map(Vec::as_slice) == Some(name)
    }

    /// Declare or redeclare a dimension on the innermost open layer.
    ///
    /// A bare WMS 1.1.1 declaration (no default, no extent) leaves an
    /// inherited extent in place.
    fn finish_dimension(&mut self, pending: PendingDimension) {
        let Some((_, layer)) = self.frames.last_mut() else {
            return;
        };
        if pending.name.is_empty() {
            return;
        }

        let values = split_extent(&pending.text);
        let carries_extent = !values.is_empty() || pending.default.is_some();

        match layer.dimensions.iter_mut().find(|d| d.name == pending.name) {
            Some(existing) => {
                if pending.units.is_some() {
                    existing.units = pending.units;
                }
                if carries_extent {
                    existing.default = pending.default;
                    existing.values = values;
                }
            }
            None => layer.dimensions.push(AdvertisedDimension {
                name: pending.name,
                units: pending.units,
                default: pending.default,
                values,
            }),
        }
    }

    fn finish(self) -> Result<Capabilities, CapabilitiesError> {
        if let Some(message) = self.exception {
            return Err(CapabilitiesError::ServiceException(message));
        }
        match self.root.as_deref() {
            Some("WMS_Capabilities") | Some("WMT_MS_Capabilities") => {}
            other => {
                return Err(CapabilitiesError::UnexpectedRoot(
                    other.unwrap_or_default().to_string(),
                ))
            }
        }
        Ok(Capabilities {
            version: self.version,
            layers: self.slots.into_iter().flatten().collect(),
        })
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if attr.key.local_name().as_ref() == key {
            let value = attr.unescape_value().map_err(|err| err.to_string())?;
            let value = value.trim();
            return Ok((!value.is_empty()).then(|| value.to_string()));
        }
    }
    Ok(None)
}

/// Split a dimension extent into its comma-separated values.
pub fn split_extent(extent: &str) -> Vec<String> {
    extent
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
