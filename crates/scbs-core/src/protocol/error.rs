//! Protocol errors

use thiserror::Error;

use super::Command;

/// Errors that can occur while building, sending or decoding frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid number of arguments for {command}! Expected {expected} but got {actual}.")]
    ArgumentCount {
        command: Command,
        expected: usize,
        actual: usize,
    },

    #[error("Address {0} is out of range (0x0..=0x9999).")]
    AddressRange(String),

    #[error("Address '{0}' is not a decimal or 0x-prefixed hex number.")]
    InvalidAddress(String),

    #[error("Field '{0}' contains a reserved character (',', '$', '*', CR or LF).")]
    InvalidField(String),

    #[error("Unrecognized command '{0}'.")]
    UnknownCommand(String),

    #[error("Packet too large: {length} bytes exceeds the {max} byte limit")]
    PacketTooLong { length: usize, max: usize },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Checksum mismatch: expected {expected:x}, got '{actual}'")]
    ChecksumMismatch { expected: u8, actual: String },

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether this error ends the session.
    ///
    /// Only transport failures are fatal. Bad user input and corrupt
    /// responses are reported and the caller carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProtocolError::SerialError(_) | ProtocolError::PortNotFound(_) | ProtocolError::IoError(_)
        )
    }
}

impl From<serialport::Error> for ProtocolError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => ProtocolError::PortNotFound(err.description),
            serialport::ErrorKind::Io(kind) => {
                ProtocolError::IoError(std::io::Error::new(kind, err.description))
            }
            _ => ProtocolError::SerialError(err.description),
        }
    }
}
