//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`]. A missing file is not an error: the monitor
//! runs on defaults, as on a fresh install. Anything present must parse and
//! validate.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::MonitorConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<MonitorConfig, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "JsonConfigFile: {} not found, using defaults",
                    self.path.display()
                );
                return Ok(MonitorConfig::default());
            }
            Err(e) => {
                warn!("JsonConfigFile: cannot read {}: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let config: MonitorConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("JsonConfigFile: {} is malformed: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(config)
    }
}
