//! Librarian configuration
//!
//! Stored as JSON. Missing fields take their defaults, so a config file
//! only needs the settings it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::{TransferSettings, DEFAULT_IDENTITY_TIMEOUT, DEFAULT_PARAMETER_TIMEOUT};
use crate::error::{LibrarianError, Result};

/// Default port name filter
const DEFAULT_PORT: &str = "reface";

/// Extension for voice files
pub const PATCH_EXTENSION: &str = "syx";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarianConfig {
    /// Substring of the MIDI port name to connect to
    pub port: String,

    /// Wait for each parameter reply, in milliseconds
    pub parameter_timeout_ms: u64,

    /// Wait for the identity reply, in milliseconds
    pub identity_timeout_ms: u64,

    /// Directory voice files are listed from and saved to
    pub patch_dir: PathBuf,
}

impl Default for LibrarianConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            parameter_timeout_ms: DEFAULT_PARAMETER_TIMEOUT.as_millis() as u64,
            identity_timeout_ms: DEFAULT_IDENTITY_TIMEOUT.as_millis() as u64,
            patch_dir: PathBuf::from("."),
        }
    }
}

impl LibrarianConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LibrarianError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| LibrarianError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: LibrarianConfig =
            serde_json::from_str(&content).map_err(|e| LibrarianError::ConfigError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.validate(path)?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| LibrarianError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: &str| LibrarianError::ConfigError {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if self.parameter_timeout_ms == 0 {
            return Err(invalid("parameter_timeout_ms must be greater than zero"));
        }
        if self.identity_timeout_ms == 0 {
            return Err(invalid("identity_timeout_ms must be greater than zero"));
        }
        if self.port.trim().is_empty() {
            return Err(invalid("port must not be empty"));
        }
        Ok(())
    }

    /// Apply command-line overrides, validated like file settings
    pub fn apply_overrides(&mut self, port: Option<String>, timeout_ms: Option<u64>) -> Result<()> {
        if let Some(port) = port {
            if port.trim().is_empty() {
                return Err(LibrarianError::InvalidArgument {
                    argument: "--port".to_string(),
                    reason: "port must not be empty".to_string(),
                });
            }
            self.port = port;
        }
        if let Some(timeout_ms) = timeout_ms {
            if timeout_ms == 0 {
                return Err(LibrarianError::InvalidArgument {
                    argument: "--timeout-ms".to_string(),
                    reason: "timeout must be greater than zero".to_string(),
                });
            }
            self.parameter_timeout_ms = timeout_ms;
        }
        Ok(())
    }

    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            parameter_timeout: Duration::from_millis(self.parameter_timeout_ms),
            identity_timeout: Duration::from_millis(self.identity_timeout_ms),
        }
    }
}
