//! Daemon configuration
//!
//! Loaded from a JSON file of the shape:
//!
//! ```json
//! {"tally": ["live", "preview"], "cameras": 0,
//!  "ports": {"control": 5762, "client": 5763}}
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, TallydError};

pub const DEFAULT_CONTROL_PORT: u16 = 5762;
pub const DEFAULT_CLIENT_PORT: u16 = 5763;

/// Validated daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallydConfig {
    /// Ordered tally kinds; position defines the numeric encoding.
    pub tally_kinds: Vec<String>,
    /// Initial floor for the snapshot length, before any tally is set.
    pub initial_cameras: u32,
    pub control_port: u16,
    pub client_port: u16,
}

impl Default for TallydConfig {
    fn default() -> Self {
        Self {
            tally_kinds: vec!["live".to_string(), "preview".to_string()],
            initial_cameras: 0,
            control_port: DEFAULT_CONTROL_PORT,
            client_port: DEFAULT_CLIENT_PORT,
        }
    }
}

/// On-disk config file shape.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    tally: Vec<String>,
    #[serde(default)]
    cameras: u32,
    ports: Ports,
}

#[derive(Debug, Deserialize)]
struct Ports {
    #[serde(default = "default_control_port")]
    control: u16,
    #[serde(default = "default_client_port")]
    client: u16,
}

fn default_control_port() -> u16 {
    DEFAULT_CONTROL_PORT
}

fn default_client_port() -> u16 {
    DEFAULT_CLIENT_PORT
}

impl TallydConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate config from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(content).map_err(|e| TallydError::Config {
                message: format!("failed to parse config: {e}"),
            })?;

        let config = Self {
            tally_kinds: file.tally,
            initial_cameras: file.cameras,
            control_port: file.ports.control,
            client_port: file.ports.client,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the tally-kind constraints: 1-8 distinct names, "off" reserved.
    pub fn validate(&self) -> Result<()> {
        if self.tally_kinds.is_empty() || self.tally_kinds.len() > 8 {
            return Err(TallydError::Config {
                message: format!(
                    "expected 1-8 tally kinds, got {}",
                    self.tally_kinds.len()
                ),
            });
        }
        for (i, kind) in self.tally_kinds.iter().enumerate() {
            if kind == "off" {
                return Err(TallydError::Config {
                    message: "\"off\" is reserved and cannot be a tally kind".to_string(),
                });
            }
            if self.tally_kinds[..i].contains(kind) {
                return Err(TallydError::Config {
                    message: format!("duplicate tally kind: {kind:?}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = TallydConfig::from_json(
            r#"{"tally": ["live", "preview"], "cameras": 4,
                "ports": {"control": 9001, "client": 9002}}"#,
        )
        .unwrap();
        assert_eq!(config.tally_kinds, vec!["live", "preview"]);
        assert_eq!(config.initial_cameras, 4);
        assert_eq!(config.control_port, 9001);
        assert_eq!(config.client_port, 9002);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let config =
            TallydConfig::from_json(r#"{"tally": ["live"], "ports": {}}"#).unwrap();
        assert_eq!(config.initial_cameras, 0);
        assert_eq!(config.control_port, DEFAULT_CONTROL_PORT);
        assert_eq!(config.client_port, DEFAULT_CLIENT_PORT);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tally": ["live"], "cameras": 2, "ports": {{"control": 5762, "client": 5763}}}}"#
        )
        .unwrap();
        let config = TallydConfig::load(file.path()).unwrap();
        assert_eq!(config.tally_kinds, vec!["live"]);
        assert_eq!(config.initial_cameras, 2);
    }

    #[test]
    fn test_rejects_bad_kind_sets() {
        assert!(TallydConfig::from_json(r#"{"tally": [], "ports": {}}"#).is_err());
        assert!(TallydConfig::from_json(
            r#"{"tally": ["a","b","c","d","e","f","g","h","i"], "ports": {}}"#
        )
        .is_err());
        assert!(
            TallydConfig::from_json(r#"{"tally": ["live", "off"], "ports": {}}"#).is_err()
        );
        assert!(
            TallydConfig::from_json(r#"{"tally": ["live", "live"], "ports": {}}"#)
                .is_err()
        );
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            TallydConfig::from_json("not json"),
            Err(TallydError::Config { .. })
        ));
    }
}
