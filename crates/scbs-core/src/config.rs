//! Master configuration
//!
//! Everything a session needs is carried in a [`MasterConfig`] value handed
//! to the constructors; nothing is read from process-wide state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::protocol::SerialConfig;

/// Read timeout used by the spammer, in milliseconds
pub const SPAMMER_TIMEOUT_MS: u64 = 500;

/// Configuration of a master session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Serial line settings
    pub serial: SerialConfig,
    /// Also decode each response as a cell frame and report checksum errors.
    /// Off by default: responses are shown verbatim.
    pub verify_responses: bool,
}

impl MasterConfig {
    /// Interactive defaults (9600 8N1, 5 s timeout) for `port_name`
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            serial: SerialConfig::new(port_name),
            verify_responses: false,
        }
    }

    /// Spammer defaults: same line settings with a 0.5 s timeout
    pub fn for_spammer(port_name: impl Into<String>) -> Self {
        let mut config = Self::for_port(port_name);
        config.serial.timeout_ms = SPAMMER_TIMEOUT_MS;
        config
    }

    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::serial::Parity;

    #[test]
    fn test_defaults() {
        let config = MasterConfig::for_port("COM3");
        assert_eq!(config.serial.port_name, "COM3");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.timeout_ms, 5000);
        assert!(!config.verify_responses);

        assert_eq!(MasterConfig::for_spammer("COM3").serial.timeout_ms, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MasterConfig =
            serde_json::from_str(r#"{"serial": {"port_name": "/dev/ttyUSB1", "parity": "even"}}"#)
                .unwrap();
        assert_eq!(config.serial.port_name, "/dev/ttyUSB1");
        assert_eq!(config.serial.parity, Parity::Even);
        assert_eq!(config.serial.baud_rate, 9600);
        assert!(!config.verify_responses);
    }
}
