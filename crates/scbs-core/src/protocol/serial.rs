//! Serial port handling
//!
//! Provides low-level serial port access for the cell bus.

use serde::{Deserialize, Serialize};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;

use super::{ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Upper bound on a single blocking read; the line deadline is enforced above it
const READ_POLL: Duration = Duration::from_millis(100);

/// Parity setting of the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// Line settings used to open the bus port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits per character (5 to 8)
    pub data_bits: u8,
    /// Parity
    pub parity: Parity,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// How long a read may block before giving up, in milliseconds
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    /// Default 9600 8N1 settings for `port_name`
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Read timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Timeout for one read call on the port
    pub fn poll_timeout(&self) -> Duration {
        self.timeout().min(READ_POLL)
    }

    fn to_data_bits(&self) -> Result<serialport::DataBits, ProtocolError> {
        match self.data_bits {
            5 => Ok(serialport::DataBits::Five),
            6 => Ok(serialport::DataBits::Six),
            7 => Ok(serialport::DataBits::Seven),
            8 => Ok(serialport::DataBits::Eight),
            n => Err(ProtocolError::SerialError(format!(
                "unsupported data bits: {n}"
            ))),
        }
    }

    fn to_stop_bits(&self) -> Result<serialport::StopBits, ProtocolError> {
        match self.stop_bits {
            1 => Ok(serialport::StopBits::One),
            2 => Ok(serialport::StopBits::Two),
            n => Err(ProtocolError::SerialError(format!(
                "unsupported stop bits: {n}"
            ))),
        }
    }

    fn to_parity(&self) -> serialport::Parity {
        match self.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                (Some(usb_info.vid), Some(usb_info.pid), usb_info.product)
            }
            _ => (None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// Sort key putting ttyUSB* adapters first (numerically), then ttyACM*,
/// then everything else by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// List all available serial ports, with /dev fallbacks and deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // Linux-only: udev sometimes lags behind freshly plugged adapters
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyUSB") || fname.starts_with("ttyACM") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone()).or_insert_with(|| PortInfo {
                        name: full,
                        vid: None,
                        pid: None,
                        product: None,
                    });
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Open and configure the bus port described by `config`
pub fn open_port(config: &SerialConfig) -> Result<Box<dyn SerialPort>, ProtocolError> {
    tracing::debug!(
        port = %config.port_name,
        baud = config.baud_rate,
        timeout_ms = config.timeout_ms,
        "opening serial port"
    );

    let port = serialport::new(&config.port_name, config.baud_rate)
        .data_bits(config.to_data_bits()?)
        .parity(config.to_parity())
        .stop_bits(config.to_stop_bits()?)
        .flow_control(serialport::FlowControl::None)
        .timeout(config.poll_timeout())
        .open()?;

    clear_buffers(port.as_ref())?;
    Ok(port)
}

/// Discard anything left over in the port buffers
pub fn clear_buffers(port: &dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}
