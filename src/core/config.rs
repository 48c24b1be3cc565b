//! Optional store configuration from `.domus/config.toml`.
//!
//! A missing file is not an error; every field has a default.

use crate::core::error::DomusError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomusConfig {
    /// Directory export files are written into. Relative paths resolve
    /// against the current working directory. Default: `out/`.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl DomusConfig {
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("out"))
    }
}

pub fn load_config(root: &Path) -> Result<DomusConfig, DomusError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(DomusConfig::default());
    }
    let content = fs::read_to_string(&config_path).map_err(DomusError::IoError)?;
    let config: DomusConfig =
        toml::from_str(&content).map_err(|e| DomusError::ValidationError(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let tmp = std::env::temp_dir().join("domus-config-missing");
        let config = load_config(&tmp).unwrap();
        assert_eq!(config.export_dir(), PathBuf::from("out"));
    }
}
