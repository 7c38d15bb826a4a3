//! Common types shared by the resolver, the config synthesizer and the CLI.

pub mod bbox;
pub mod dimension;
pub mod error;
pub mod grid;
pub mod layer;
pub mod mode;

pub use bbox::BoundingBox;
pub use dimension::{Dimension, DimensionInfo, LayerDimensions, LayerTemporalInfo};
pub use error::{MapProxyError, MapProxyResult};
pub use grid::{cache_dir_suffix, service_srs, GridName};
pub use layer::{
    parse_clean_targets, parse_layer_list, EntryName, LayerSpec, DEFAULT_STYLE, RADAR_MARKER,
};
pub use mode::ResolveMode;
