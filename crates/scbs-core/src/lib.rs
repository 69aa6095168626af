//! # SCBS Core Library
//!
//! Master-side protocol layer for the SCBS cell bus.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Packet framing and XOR checksum validation
//! - A closed command table (`DIS`, `MRD`, `MWR`, `SRD`, `SWR`, `SRS`)
//! - A dispatcher that validates user commands and drives one
//!   request/response exchange over a [`protocol::Transport`]
//! - An interactive session loop used by the `scbs-master` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use scbs_core::{config::MasterConfig, protocol::{Dispatcher, SerialTransport}};
//!
//! let config = MasterConfig::for_port("/dev/ttyUSB0");
//! let transport = SerialTransport::open(&config.serial)?;
//! let mut dispatcher = Dispatcher::new(transport);
//!
//! let response = dispatcher.dispatch("MWR", &["1000", "2.5"])?;
//! println!("{}", response);
//! ```

pub mod config;
pub mod protocol;
pub mod session;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::MasterConfig;
    pub use crate::protocol::{
        Command, Dispatcher, Packet, ProtocolError, Request, Response, SerialConfig,
        SerialTransport, Transport,
    };
    pub use crate::session::Session;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
