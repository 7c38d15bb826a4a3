//! Common test fixtures for the mapproxy-ctl workspace.
//!
//! Layer names follow the upstream naming used in production catalogs:
//! a model layer with both dimensions, a radar layer with only `time`,
//! and a static layer without any temporal dimension.

use mapproxy_common::{Dimension, DimensionInfo, LayerTemporalInfo};

/// Model layer advertising `time` and `reference_time`.
pub const MODEL_LAYER: &str = "GDPS.ETA_TT";

/// Radar layer advertising only `time`.
pub const RADAR_LAYER: &str = "RADAR_1KM_RRAI";

/// Layer advertising no temporal dimension.
pub const STATIC_LAYER: &str = "CURRENT_CONDITIONS";

/// WMS 1.3.0 capabilities describing all three fixture layers.
pub const CAPABILITIES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms">
  <Service>
    <Name>WMS</Name>
    <Title>Fixture WMS</Title>
  </Service>
  <Capability>
    <Layer>
      <Title>Fixture layers</Title>
      <Layer queryable="1">
        <Name>GDPS.ETA_TT</Name>
        <Title>GDPS.ETA - Air temperature</Title>
        <Dimension name="time" units="ISO8601" default="2024-01-01T12:00:00Z" nearestValue="0">2024-01-01T00:00:00Z/2024-01-11T00:00:00Z/PT3H</Dimension>
        <Dimension name="reference_time" units="ISO8601" default="2024-01-01T00:00:00Z">2023-12-31T12:00:00Z,2024-01-01T00:00:00Z</Dimension>
      </Layer>
      <Layer queryable="1">
        <Name>RADAR_1KM_RRAI</Name>
        <Title>Radar precipitation rate</Title>
        <Dimension name="time" units="ISO8601" default="2024-01-01T02:54:00Z">2024-01-01T00:00:00Z/2024-01-01T03:00:00Z/PT6M</Dimension>
      </Layer>
      <Layer queryable="1">
        <Name>CURRENT_CONDITIONS</Name>
        <Title>Current conditions</Title>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>
"#;

/// Capabilities scoped to [`MODEL_LAYER`], as a WMS returns with `LAYER=`.
pub const MODEL_LAYER_CAPABILITIES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms">
  <Capability>
    <Layer>
      <Title>Fixture layers</Title>
      <Layer queryable="1">
        <Name>GDPS.ETA_TT</Name>
        <Title>GDPS.ETA - Air temperature</Title>
        <Dimension name="time" units="ISO8601" default="2024-01-01T12:00:00Z">2024-01-01T00:00:00Z/2024-01-11T00:00:00Z/PT3H</Dimension>
        <Dimension name="reference_time" units="ISO8601" default="2024-01-01T00:00:00Z">2023-12-31T12:00:00Z,2024-01-01T00:00:00Z</Dimension>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>
"#;

/// Exception report returned for a layer the WMS does not know.
pub const LAYER_NOT_DEFINED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceExceptionReport version="1.3.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="LayerNotDefined">msWMSLoadGetMapParams(): WMS server error. Invalid layer(s) given in the LAYERS parameter.</ServiceException>
</ServiceExceptionReport>
"#;

/// Global mapfile with the three fixture layers.
pub const GLOBAL_MAPFILE: &str = r#"
MAP
  NAME "fixture"
  WEB
    METADATA
      "wms_title" "Fixture WMS"
    END
  END
  LAYER
    NAME "GDPS.ETA_TT"
    TYPE RASTER
    METADATA
      "wms_timeextent" "2024-01-01T00:00:00Z/2024-01-11T00:00:00Z/PT3H"
      "wms_timedefault" "2024-01-01T12:00:00Z"
      "wms_reference_time_extent" "2023-12-31T12:00:00Z,2024-01-01T00:00:00Z"
      "wms_reference_time_default" "2024-01-01T00:00:00Z"
    END
  END
  LAYER
    NAME "RADAR_1KM_RRAI"
    TYPE RASTER
    METADATA
      "wms_timeextent" "2024-01-01T00:00:00Z/2024-01-01T03:00:00Z/PT6M"
      "wms_timedefault" "2024-01-01T02:54:00Z"
    END
  END
  LAYER
    NAME "CURRENT_CONDITIONS"
    TYPE POINT
    METADATA
      "wms_title" "Current conditions"
    END
  END
END
"#;

/// Per-layer mapfile for [`MODEL_LAYER`] with a newer run than the global one.
pub const MODEL_LAYER_MAPFILE: &str = r#"
MAP
  NAME "GDPS.ETA_TT"
  LAYER
    NAME "GDPS.ETA_TT"
    TYPE RASTER
    METADATA
      "wms_timeextent" "2024-01-01T12:00:00Z/2024-01-11T12:00:00Z/PT3H"
      "wms_timedefault" "2024-01-02T00:00:00Z"
      "wms_reference_time_extent" "2024-01-01T00:00:00Z,2024-01-01T12:00:00Z"
      "wms_reference_time_default" "2024-01-01T12:00:00Z"
    END
  END
END
"#;

/// Per-layer mapfile for [`RADAR_LAYER`].
pub const RADAR_LAYER_MAPFILE: &str = r#"
LAYER
  NAME "RADAR_1KM_RRAI"
  METADATA
    "wms_timeextent" "2024-01-01T00:00:00Z/2024-01-01T03:00:00Z/PT6M"
    "wms_timedefault" "2024-01-01T02:54:00Z"
  END
END
"#;

/// Declarative cache catalog with styles and all three fixture layers.
pub const CACHE_CATALOG_YAML: &str = r#"
service:
  name: Fixture WMS
  url: http://upstream.example/wms
  layers:
    - name: GDPS.ETA_TT
      styles: [TEMPERATURE_CONTOUR]
    - name: RADAR_1KM_RRAI
    - name: CURRENT_CONDITIONS
"#;

/// Resolver output matching [`CAPABILITIES_XML`].
pub fn fixture_temporal_info() -> LayerTemporalInfo {
    temporal_info(&[
        (
            MODEL_LAYER,
            Dimension::Time,
            Some("2024-01-01T12:00:00Z"),
            &["2024-01-01T00:00:00Z/2024-01-11T00:00:00Z/PT3H"],
        ),
        (
            MODEL_LAYER,
            Dimension::ReferenceTime,
            Some("2024-01-01T00:00:00Z"),
            &["2023-12-31T12:00:00Z", "2024-01-01T00:00:00Z"],
        ),
        (
            RADAR_LAYER,
            Dimension::Time,
            Some("2024-01-01T02:54:00Z"),
            &["2024-01-01T00:00:00Z/2024-01-01T03:00:00Z/PT6M"],
        ),
    ])
}

/// Build resolver output from `(layer, dimension, default, values)` rows.
pub fn temporal_info(rows: &[(&str, Dimension, Option<&str>, &[&str])]) -> LayerTemporalInfo {
    let mut info = LayerTemporalInfo::new();
    for (layer, dimension, default, values) in rows {
        info.insert(
            layer,
            *dimension,
            DimensionInfo::new(
                default.map(String::from),
                values.iter().map(|v| v.to_string()).collect(),
            ),
        );
    }
    info
}
