//! Engine configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings shared by every compile an [`Engine`](crate::Engine) performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory external `.lx` / `.lxm` expressions and references resolve against
    pub base_dir: PathBuf,
    /// Suffix of external source files
    pub source_suffix: String,
    /// Suffix of prebuilt module images
    pub module_suffix: String,
    /// References added to every compile
    pub default_references: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_dir: PathBuf::from("."),
            source_suffix: ".lx".to_string(),
            module_suffix: ".lxm".to_string(),
            default_references: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Config rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON config; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::ResourceFailure {
            path: "<engine config>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Reads a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::ResourceFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// `base_dir` joined with a relative path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.source_suffix, ".lx");
        assert_eq!(config.module_suffix, ".lxm");
        assert_eq!(config.resolve("A.B.lx"), PathBuf::from("./A.B.lx"));
    }

    #[test]
    fn test_partial_json() {
        let config =
            EngineConfig::from_json_str(r#"{"base_dir": "/srv/maps", "default_references": ["extra"]}"#)
                .unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/srv/maps"));
        assert_eq!(config.default_references, vec!["extra"]);
        assert_eq!(config.module_suffix, ".lxm");

        assert!(EngineConfig::from_json_str("{").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lucid.json");
        std::fs::write(&path, r#"{"source_suffix": ".lambda"}"#).unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap().source_suffix, ".lambda");
        assert!(EngineConfig::from_file(dir.path().join("none.json")).is_err());
    }
}
