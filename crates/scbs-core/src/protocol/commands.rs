//! Protocol commands
//!
//! Defines the commands a master can issue on the cell bus.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ProtocolError;

/// Protocol commands for cell bus communication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Cell discover (`DIS`)
    Discover,

    /// Read a register from every cell (`MRD`)
    MultiRead,

    /// Write a register on every cell (`MWR`)
    MultiWrite,

    /// Read a register from one cell (`SRD`)
    SingleRead,

    /// Write a register on one cell (`SWR`)
    SingleWrite,

    /// Response from a single cell (`SRS`)
    SingleResponse,
}

/// Meaning of a positional command argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// ID of the last cell discovered so far
    PrevCellId,
    /// ID of a cell on the bus
    CellId,
    /// Register address, validated against [`super::MAX_REG_ADDR`]
    RegisterAddress,
    /// Opaque value, passed through as text
    Value,
}

impl Command {
    /// All commands, in wire order
    pub const ALL: [Command; 6] = [
        Command::Discover,
        Command::MultiRead,
        Command::MultiWrite,
        Command::SingleRead,
        Command::SingleWrite,
        Command::SingleResponse,
    ];

    /// Short code typed by the user
    pub fn code(&self) -> &'static str {
        match self {
            Command::Discover => "DIS",
            Command::MultiRead => "MRD",
            Command::MultiWrite => "MWR",
            Command::SingleRead => "SRD",
            Command::SingleWrite => "SWR",
            Command::SingleResponse => "SRS",
        }
    }

    /// Header field that starts the frame content
    pub fn wire_prefix(&self) -> &'static str {
        match self {
            Command::Discover => "BSDIS",
            Command::MultiRead => "BSMRD",
            Command::MultiWrite => "BSMWR",
            Command::SingleRead => "BSSRD",
            Command::SingleWrite => "BSSWR",
            Command::SingleResponse => "BSSRS",
        }
    }

    /// Human readable name, used in the help banner
    pub fn description(&self) -> &'static str {
        match self {
            Command::Discover => "Cell Discover",
            Command::MultiRead => "Multi Read",
            Command::MultiWrite => "Multi Write",
            Command::SingleRead => "Single Read",
            Command::SingleWrite => "Single Write",
            Command::SingleResponse => "Single Response",
        }
    }

    /// Positional arguments, in wire order
    pub fn args(&self) -> &'static [ArgKind] {
        use ArgKind::*;
        match self {
            Command::Discover => &[PrevCellId],
            Command::MultiRead => &[RegisterAddress],
            Command::MultiWrite => &[RegisterAddress, Value],
            Command::SingleRead => &[CellId, RegisterAddress],
            Command::SingleWrite => &[CellId, RegisterAddress, Value],
            Command::SingleResponse => &[CellId, Value],
        }
    }

    /// Number of arguments the command requires
    pub fn arity(&self) -> usize {
        self.args().len()
    }

    /// Usage line such as `SRD <CELL_ID> <REG_ADDR>`
    pub fn usage(&self) -> String {
        let mut usage = self.code().to_string();
        for arg in self.args() {
            usage.push(' ');
            usage.push_str(arg.placeholder());
        }
        usage
    }

    /// Look up a command by its user-facing code (case-sensitive)
    pub fn from_code(code: &str) -> Option<Command> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Look up a command by its wire prefix
    pub fn from_wire_prefix(prefix: &str) -> Option<Command> {
        Self::ALL.into_iter().find(|c| c.wire_prefix() == prefix)
    }
}

impl ArgKind {
    fn placeholder(&self) -> &'static str {
        match self {
            ArgKind::PrevCellId => "<PREV_CELL_ID>",
            ArgKind::CellId => "<CELL_ID>",
            ArgKind::RegisterAddress => "<REG_ADDR>",
            ArgKind::Value => "<VALUE>",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::from_code(s).ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}
