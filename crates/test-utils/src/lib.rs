//! Shared test utilities for the mapproxy-ctl workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Capabilities, mapfile and catalog fixtures
//! - Temporary directory helpers that write fixtures to disk
//! - Builders for resolver output
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, write_fixture};
//! ```

pub mod fixtures;
pub mod paths;

pub use fixtures::*;
pub use mapproxy_common;
pub use paths::*;

/// Assert a layer entry dimension's default and values.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_dimension;
///
/// assert_dimension!(info, Some("2024-01-01"), ["2024-01-01"]);
/// assert_dimension!(info, None, []);
/// ```
#[macro_export]
macro_rules! assert_dimension {
    ($info:expr, $default:expr, [$($value:expr),* $(,)?]) => {{
        let info: &$crate::mapproxy_common::DimensionInfo = &$info;
        let expected_default: Option<&str> = $default;
        let expected_values: Vec<&str> = vec![$($value),*];
        assert_eq!(info.default.as_deref(), expected_default, "dimension default");
        assert_eq!(
            info.values.iter().map(String::as_str).collect::<Vec<_>>(),
            expected_values,
            "dimension values"
        );
    }};
}

#[cfg(test)]
mod tests {
    use mapproxy_common::DimensionInfo;

    #[test]
    fn test_assert_dimension_passes() {
        let info = DimensionInfo::new(Some("a".into()), vec!["a".into(), "b".into()]);
        assert_dimension!(info, Some("a"), ["a", "b"]);
        assert_dimension!(DimensionInfo::placeholder(), None, []);
    }

    #[test]
    #[should_panic(expected = "dimension default")]
    fn test_assert_dimension_fails() {
        let info = DimensionInfo::new(Some("a".into()), vec![]);
        assert_dimension!(info, Some("b"), []);
    }
}
