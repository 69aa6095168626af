//! Byte channel between the master and the bus
//!
//! The dispatcher only needs three things from the wire: write bytes, flush
//! them, and read back one line within a timeout.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use super::{serial, ProtocolError, SerialConfig};

/// A line-oriented, blocking byte channel
pub trait Transport {
    /// Queue `bytes` for transmission
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ProtocolError>;

    /// Push queued bytes onto the wire
    fn flush(&mut self) -> Result<(), ProtocolError>;

    /// Read up to and including the next `\n`.
    ///
    /// Returns whatever arrived before the timeout if no terminator shows
    /// up, which may be nothing at all.
    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        (**self).flush()
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
        (**self).read_line()
    }
}

/// [`Transport`] over a serial port (or any blocking stream with a read timeout)
pub struct SerialTransport<P = Box<dyn SerialPort>> {
    port: P,
    timeout: Duration,
    /// Bytes received past the last returned line
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Open the port described by `config`
    pub fn open(config: &SerialConfig) -> Result<Self, ProtocolError> {
        let port = serial::open_port(config)?;
        Ok(Self::from_port(port, config.timeout()))
    }
}

impl<P: Read + Write> SerialTransport<P> {
    /// Wrap an already opened stream. `timeout` bounds a whole `read_line`.
    pub fn from_port(port: P, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            pending: Vec::new(),
        }
    }

    /// Underlying stream
    pub fn get_ref(&self) -> &P {
        &self.port
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        Some(self.pending.drain(..=end).collect())
    }
}

impl<P: Read + Write> Transport for SerialTransport<P> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.port.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; 64];

        let mut polled = false;

        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            // Always poll once, even with a zero timeout
            if polled && Instant::now() >= deadline {
                break;
            }
            polled = true;

            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(partial = self.pending.len(), "read_line timed out");
        Ok(std::mem::take(&mut self.pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Stream that hands out scripted chunks, then times out
    struct ScriptedPort {
        chunks: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
    }

    impl ScriptedPort {
        fn new(chunks: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                chunks: chunks.into(),
                written: Vec::new(),
            }
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            }
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn transport(chunks: Vec<io::Result<Vec<u8>>>) -> SerialTransport<ScriptedPort> {
        SerialTransport::from_port(ScriptedPort::new(chunks), Duration::from_millis(50))
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut t = transport(vec![Ok(b"$BSDIS".to_vec()), Ok(b",0*53\r\n".to_vec())]);
        assert_eq!(t.read_line().unwrap(), b"$BSDIS,0*53\r\n".to_vec());
    }

    #[test]
    fn test_extra_bytes_kept_for_next_line() {
        let mut t = transport(vec![Ok(b"one\ntwo\n".to_vec())]);
        assert_eq!(t.read_line().unwrap(), b"one\n".to_vec());
        assert_eq!(t.read_line().unwrap(), b"two\n".to_vec());
    }

    #[test]
    fn test_timeout_returns_partial() {
        let mut t = transport(vec![Ok(b"$BSD".to_vec())]);
        assert_eq!(t.read_line().unwrap(), b"$BSD".to_vec());
        assert!(t.read_line().unwrap().is_empty());
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let mut t = transport(vec![
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
            Ok(b"ok\n".to_vec()),
        ]);
        assert_eq!(t.read_line().unwrap(), b"ok\n".to_vec());
    }

    #[test]
    fn test_device_error_propagates() {
        let mut t = transport(vec![Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "unplugged",
        ))]);
        let err = t.read_line().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_zero_timeout_still_reads_buffered_line() {
        let port = io::Cursor::new(b"$BSDIS,1*52\r\n".to_vec());
        let mut t = SerialTransport::from_port(port, Duration::ZERO);
        assert_eq!(t.read_line().unwrap(), b"$BSDIS,1*52\r\n".to_vec());
    }

    #[test]
    fn test_poll_timeouts_wait_for_deadline() {
        let mut t = transport(vec![
            Err(io::Error::new(io::ErrorKind::TimedOut, "poll")),
            Ok(b"$BSDIS".to_vec()),
            Err(io::Error::new(io::ErrorKind::TimedOut, "poll")),
            Ok(b",1*52\r\n".to_vec()),
        ]);
        assert_eq!(t.read_line().unwrap(), b"$BSDIS,1*52\r\n".to_vec());
    }

    #[test]
    fn test_write_reaches_port() {
        let mut t = transport(vec![]);
        t.write_all(b"$BSDIS,7*54\r\n").unwrap();
        t.flush().unwrap();
        assert_eq!(t.get_ref().written, b"$BSDIS,7*54\r\n".to_vec());
    }
}
