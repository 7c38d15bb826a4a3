//! OGC WMS GetCapabilities parsing.
//!
//! Supports:
//! - WMS 1.3.0 `<Dimension>` elements carrying default and extent
//! - WMS 1.1.1 `<Dimension>` declarations paired with `<Extent>` elements
//! - Dimension inheritance from parent layers
//! - `ServiceExceptionReport` responses

pub mod capabilities;

pub use capabilities::{AdvertisedDimension, Capabilities, CapabilitiesError, CapabilitiesLayer};
