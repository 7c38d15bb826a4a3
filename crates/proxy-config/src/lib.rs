//! Proxy configuration synthesis and maintenance.
//!
//! - [`CacheCatalog`]: the declarative layer list
//! - [`synthesize`]: catalog + temporal source -> complete [`ProxyConfig`]
//! - [`merge`]: refresh dimensions of selected layers in an existing document
//! - [`store`]: YAML read and atomic replace
//! - [`cache_dirs`]: tile cache directory lifecycle

pub mod cache_dirs;
pub mod catalog;
pub mod merge;
pub mod model;
pub mod store;
pub mod synthesize;

pub use catalog::CacheCatalog;
pub use merge::{apply_temporal_info, merge};
pub use model::{CacheEntry, LayerEntry, ProxyConfig, RequestLayers, SourceEntry};
pub use synthesize::{build_skeleton, synthesize, SynthesisOptions};
