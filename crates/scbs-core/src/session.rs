//! Interactive master session
//!
//! Reads commands line by line, runs each one as a single request/response
//! exchange and reports the outcome. Bad input and corrupt responses are
//! reported and the loop carries on; transport failures end the session.

use std::io::{BufRead, Write};

use crate::config::MasterConfig;
use crate::protocol::{Command, Dispatcher, ProtocolError, Request, Transport, MAX_FIELD_LEN};

/// Prompt printed before each command
pub const PROMPT: &str = ">>> ";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line
    Empty,
    /// `exit`, in any case
    Exit,
    /// A command name and its arguments
    Command {
        /// First token, matched case-sensitively later
        name: String,
        /// Remaining tokens
        args: Vec<String>,
    },
}

/// Split a line on whitespace into an [`Input`]
pub fn parse_line(line: &str) -> Input {
    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
        return Input::Empty;
    };
    if name.eq_ignore_ascii_case("exit") {
        return Input::Exit;
    }
    Input::Command {
        name: name.to_string(),
        args: tokens.map(str::to_string).collect(),
    }
}

/// Whether the loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line
    Continue,
    /// Leave the loop
    Exit,
}

/// Welcome text listing every command and its arguments
pub fn banner() -> String {
    let mut text = String::from("Welcome to the SCBS Master Utility!\nSupported Commands:\n");
    for command in Command::ALL {
        text.push_str(&format!(
            "    {} - {}\n        {}\n",
            command.code(),
            command.description(),
            command.usage()
        ));
    }
    text.push_str("Type EXIT to quit.");
    text
}

/// A read-eval-print loop bound to one transport
pub struct Session<T> {
    dispatcher: Dispatcher<T>,
    verify_responses: bool,
}

impl<T: Transport> Session<T> {
    /// Create a session over an open transport
    pub fn new(transport: T, config: &MasterConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport),
            verify_responses: config.verify_responses,
        }
    }

    /// The dispatcher driving this session
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Run until `exit`, end of input, or a fatal error
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), ProtocolError> {
        writeln!(output, "{}", banner())?;

        let mut raw = Vec::new();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            raw.clear();
            if input.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let Ok(line) = std::str::from_utf8(&raw) else {
                tracing::warn!(bytes = raw.len(), "input is not valid UTF-8");
                writeln!(output, "\tError: Input is not valid UTF-8.")?;
                continue;
            };
            if self.execute(line, &mut output)? == Flow::Exit {
                break;
            }
        }

        let (tx_bytes, rx_bytes, tx_frames, rx_frames) = self.dispatcher.counters();
        tracing::info!(tx_bytes, rx_bytes, tx_frames, rx_frames, "session closed");
        Ok(())
    }

    /// Handle one input line, writing the outcome to `output`
    pub fn execute<W: Write>(
        &mut self,
        line: &str,
        output: &mut W,
    ) -> Result<Flow, ProtocolError> {
        let (name, args) = match parse_line(line) {
            Input::Empty => return Ok(Flow::Continue),
            Input::Exit => return Ok(Flow::Exit),
            Input::Command { name, args } => (name, args),
        };

        let request = match Request::new(&name, args.as_slice()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(command = %name, "rejected: {e}");
                writeln!(output, "\tError: {e}")?;
                return Ok(Flow::Continue);
            }
        };

        for field in request.long_fields() {
            writeln!(
                output,
                "\tWarning: '{field}' is longer than {MAX_FIELD_LEN} bytes and may be truncated by the cell"
            )?;
        }

        write!(output, "\tSending: {}", request.frame())?;
        let response = self.dispatcher.send(&request)?;
        writeln!(output, "\tResponse: {response}")?;

        if self.verify_responses {
            match response.packet() {
                Some(Ok(packet)) => {
                    writeln!(output, "\tDecoded: {} {:?}", packet.command, packet.fields)?
                }
                Some(Err(e)) => {
                    tracing::warn!("bad response: {e}");
                    writeln!(output, "\tError: {e}")?
                }
                None => {}
            }
        }

        Ok(Flow::Continue)
    }
}
