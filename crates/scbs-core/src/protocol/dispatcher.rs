//! Command dispatch
//!
//! Turns a user command (`MWR 1000 2.5`) into a validated frame, sends it and
//! waits for exactly one response line before returning.

use std::fmt;

use super::{
    ArgKind, Command, Packet, PacketBuilder, ProtocolError, RegisterAddress, Transport,
    MAX_FIELD_LEN,
};

/// A validated request, ready to be framed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    packet: Packet,
}

impl Request {
    /// Validate a command name and its arguments.
    ///
    /// Checks, in order: the command is known, the argument count matches,
    /// register addresses are in range, and no argument carries a reserved
    /// character. Arguments are forwarded verbatim.
    pub fn new<S: AsRef<str>>(command_name: &str, args: &[S]) -> Result<Self, ProtocolError> {
        let command: Command = command_name.parse()?;

        if args.len() != command.arity() {
            return Err(ProtocolError::ArgumentCount {
                command,
                expected: command.arity(),
                actual: args.len(),
            });
        }

        for (kind, arg) in command.args().iter().zip(args) {
            if *kind == ArgKind::RegisterAddress {
                AsRef::<str>::as_ref(arg).parse::<RegisterAddress>()?;
            }
        }

        let packet = PacketBuilder::new(command)
            .fields(args.iter().map(AsRef::<str>::as_ref))
            .build()?;

        for field in packet.long_fields() {
            tracing::warn!(
                command = %command,
                field,
                max = MAX_FIELD_LEN,
                "field longer than a cell buffers"
            );
        }

        Ok(Self { packet })
    }

    /// Arguments longer than [`MAX_FIELD_LEN`]; cells may truncate them
    pub fn long_fields(&self) -> impl Iterator<Item = &str> {
        self.packet.long_fields()
    }

    /// Command being sent
    pub fn command(&self) -> Command {
        self.packet.command
    }

    /// Content between `$` and `*`
    pub fn content(&self) -> String {
        self.packet.content()
    }

    /// Complete frame including checksum and CRLF
    pub fn frame(&self) -> String {
        self.packet.to_frame()
    }
}

/// What came back from the bus after a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A line (or a partial line cut off by the timeout), verbatim
    Received(String),
    /// Nothing arrived before the timeout
    TimedOut,
}

impl Response {
    /// Raw text, if anything was received
    pub fn raw(&self) -> Option<&str> {
        match self {
            Response::Received(line) => Some(line),
            Response::TimedOut => None,
        }
    }

    /// Whether the read timed out with no data
    pub fn is_timeout(&self) -> bool {
        matches!(self, Response::TimedOut)
    }

    /// Decode the received line as a cell frame.
    ///
    /// Nothing on the response path calls this implicitly; responses are
    /// surfaced as-is unless the caller asks.
    pub fn packet(&self) -> Option<Result<Packet, ProtocolError>> {
        self.raw().map(Packet::from_frame)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Received(line) => write!(f, "{:?}", line),
            Response::TimedOut => f.write_str("<timed out>"),
        }
    }
}

/// Drives one request/response exchange at a time over a [`Transport`]
pub struct Dispatcher<T> {
    transport: T,
    tx_bytes: u64,
    rx_bytes: u64,
    tx_frames: u64,
    rx_frames: u64,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher owning `transport`
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            tx_bytes: 0,
            rx_bytes: 0,
            tx_frames: 0,
            rx_frames: 0,
        }
    }

    /// Validate, send, and wait for the response to one command.
    ///
    /// Nothing is written when validation fails.
    pub fn dispatch<S: AsRef<str>>(
        &mut self,
        command_name: &str,
        args: &[S],
    ) -> Result<Response, ProtocolError> {
        let request = Request::new(command_name, args)?;
        self.send(&request)
    }

    /// Send an already validated request and block for one response line
    pub fn send(&mut self, request: &Request) -> Result<Response, ProtocolError> {
        let frame = request.frame();
        tracing::debug!(command = %request.command(), frame = frame.trim_end(), "sending");

        self.transport.write_all(frame.as_bytes())?;
        self.transport.flush()?;
        self.tx_bytes += frame.len() as u64;
        self.tx_frames += 1;

        let line = self.transport.read_line()?;
        if line.is_empty() {
            tracing::debug!(command = %request.command(), "no response before timeout");
            return Ok(Response::TimedOut);
        }

        self.rx_bytes += line.len() as u64;
        self.rx_frames += 1;
        let text = String::from_utf8_lossy(&line).into_owned();
        tracing::debug!(response = text.trim_end(), "received");
        Ok(Response::Received(text))
    }

    /// Cumulative (tx bytes, rx bytes, tx frames, rx frames)
    pub fn counters(&self) -> (u64, u64, u64, u64) {
        (self.tx_bytes, self.rx_bytes, self.tx_frames, self.rx_frames)
    }
}
