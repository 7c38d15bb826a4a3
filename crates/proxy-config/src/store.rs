//! Reading and atomically replacing the configuration document.

use mapproxy_common::{MapProxyError, MapProxyResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::model::ProxyConfig;

/// Read a configuration document.
pub fn load(path: impl AsRef<Path>) -> MapProxyResult<ProxyConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading configuration");

    let content = std::fs::read_to_string(path)
        .map_err(|e| MapProxyError::Persistence(format!("read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&content)
        .map_err(|e| MapProxyError::Persistence(format!("parse {}: {}", path.display(), e)))
}

/// Replace the document at `path`.
///
/// The YAML is written to a temporary file in the same directory, flushed
/// to disk, then renamed over `path`. On any failure the previous document
/// is left untouched and the temporary file is removed.
pub fn save(config: &ProxyConfig, path: impl AsRef<Path>) -> MapProxyResult<()> {
    let path = path.as_ref();
    let persistence = |action: &str, e: &dyn std::fmt::Display| {
        MapProxyError::Persistence(format!("{} {}: {}", action, path.display(), e))
    };

    let yaml = serde_yaml::to_string(config).map_err(|e| persistence("serialize", &e))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| persistence("create temporary file for", &e))?;
    debug!(tmp = %tmp.path().display(), "Writing temporary configuration");

    tmp.write_all(yaml.as_bytes())
        .map_err(|e| persistence("write", &e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| persistence("sync", &e))?;
    tmp.persist(path)
        .map_err(|e| persistence("replace", &e.error))?;

    info!(path = %path.display(), bytes = yaml.len(), "Configuration saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LayerEntry;

    fn config_with_layer(name: &str) -> ProxyConfig {
        ProxyConfig {
            layers: vec![LayerEntry {
                name: name.to_string(),
                title: name.to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapproxy.yaml");

        save(&config_with_layer("A_default"), &path).unwrap();
        save(&config_with_layer("B_default"), &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.layers[0].name, "B_default");

        // Only the document remains, no temporary files.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_save_keeps_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapproxy.yaml");
        save(&config_with_layer("A_default"), &path).unwrap();

        let missing_dir = dir.path().join("missing").join("mapproxy.yaml");
        let err = save(&config_with_layer("B_default"), &missing_dir).unwrap_err();
        assert!(matches!(err, MapProxyError::Persistence(_)));

        assert_eq!(load(&path).unwrap().layers[0].name, "A_default");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path().join("absent.yaml")),
            Err(MapProxyError::Persistence(_))
        ));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "layers: {not: [a list").unwrap();
        assert!(matches!(load(&bad), Err(MapProxyError::Persistence(_))));
    }
}
