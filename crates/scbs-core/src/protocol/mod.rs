//! Cell Bus Protocol
//!
//! Implements the line-oriented SCBS protocol spoken between the master and
//! the cells on the shared serial line.
//!
//! Every frame has the form `$<content>*<checksum>\r\n` where `<content>` is
//! a comma separated list whose first field is the wire prefix (`BSDIS`,
//! `BSMRD`, ...) and `<checksum>` is the XOR of all content bytes in hex.

mod address;
pub mod commands;
mod dispatcher;
mod error;
mod packet;
pub mod serial;
mod transport;

pub use address::RegisterAddress;
pub use commands::{ArgKind, Command};
pub use dispatcher::{Dispatcher, Request, Response};
pub use error::ProtocolError;
pub use packet::{checksum, decode_frame, encode_frame, verify_frame, Packet, PacketBuilder};
pub use serial::{list_ports, Parity, PortInfo, SerialConfig};
pub use transport::{SerialTransport, Transport};

/// Default baud rate of the cell bus
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default response timeout for interactive use, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Maximum frame length in bytes, not counting the trailing CRLF
pub const MAX_PACKET_LEN: usize = 200;

/// Maximum length of a single field as buffered by the cells
pub const MAX_FIELD_LEN: usize = 20;

/// Highest valid register address (inclusive)
pub const MAX_REG_ADDR: u32 = 0x9999;

/// Start-of-frame marker
pub const FRAME_START: char = '$';

/// End-of-content marker, followed by the checksum
pub const FRAME_END: char = '*';

/// Separator between content fields
pub const FIELD_SEPARATOR: char = ',';

/// Line terminator appended to every outgoing frame
pub const FRAME_TERMINATOR: &str = "\r\n";
