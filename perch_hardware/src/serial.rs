//! Channel adapter for the remote sampler's request/response protocol.
//!
//! One request token goes out, one `\r\n`-terminated decimal reply comes
//! back. The firmware may echo partial or duplicated `\r`-separated tokens in
//! a single reply; the first token that parses wins.

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};

use perch_traits::{Reading, Sensor};
use tracing::{debug, trace, warn};

use crate::error::{HwError, Result};

/// The 7-byte command that asks the remote sampler for one reading.
pub const REQUEST_TOKEN: &[u8; 7] = b"AT+00\r\n";
/// Line rate the remote sampler is flashed with.
pub const DEFAULT_BAUD: u32 = 9600;

/// Return the first `\r`-separated token of `buf` that parses as a
/// base-10 reading. Surrounding ASCII whitespace (including the trailing
/// `\n`) is ignored; empty, non-numeric, negative or overflowing tokens are
/// skipped.
pub fn parse_first_reading(buf: &[u8]) -> Option<Reading> {
    buf.split(|&b| b == b'\r').find_map(parse_token)
}

fn parse_token(token: &[u8]) -> Option<Reading> {
    let text = std::str::from_utf8(token.trim_ascii()).ok()?;
    text.parse::<Reading>().ok()
}

/// Sensor reached through a byte transport (a serial port in production,
/// an in-memory duplex in tests).
///
/// Every operation takes `&mut self`: the link must have exactly one owner,
/// since replies carry no correlation id.
pub struct SerialSensor<P> {
    port: BufReader<P>,
    line: Vec<u8>,
}

impl<P: Read + Write> SerialSensor<P> {
    pub fn new(port: P) -> Self {
        Self {
            port: BufReader::new(port),
            line: Vec::with_capacity(32),
        }
    }

    /// Hand back the transport (any buffered, unread reply bytes are lost).
    pub fn into_inner(self) -> P {
        self.port.into_inner()
    }

    /// Write the request token. A failure here means the link is unusable.
    pub fn request_reading(&mut self) -> Result<()> {
        let port = self.port.get_mut();
        port.write_all(REQUEST_TOKEN)?;
        port.flush()?;
        Ok(())
    }

    /// Block for one reply line and parse it.
    pub fn read_reading(&mut self) -> Option<Reading> {
        let line = match self.read_line() {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "no reply from sensor");
                return None;
            }
        };
        trace!(raw = ?String::from_utf8_lossy(line), "sensor reply");
        let value = parse_first_reading(line);
        if value.is_none() {
            warn!(
                raw = ?String::from_utf8_lossy(line),
                "got no reading from sensor reply"
            );
        }
        value
    }

    /// Read up to and including `\n`. Bytes that arrived before the
    /// transport timed out are returned as a (partial) line.
    fn read_line(&mut self) -> Result<&[u8]> {
        self.line.clear();
        match self.port.read_until(b'\n', &mut self.line) {
            Ok(0) => Err(HwError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "sensor link closed",
            ))),
            Ok(_) => Ok(self.line.as_slice()),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                if self.line.is_empty() {
                    Err(HwError::Timeout)
                } else {
                    debug!(bytes = self.line.len(), "partial sensor reply before timeout");
                    Ok(self.line.as_slice())
                }
            }
            Err(e) => Err(HwError::Io(e)),
        }
    }
}

impl<P: Read + Write> Sensor for SerialSensor<P> {
    fn request_and_read(&mut self) -> Option<Reading> {
        if let Err(e) = self.request_reading() {
            warn!(error = %e, "failed to send reading request");
            return None;
        }
        let value = self.read_reading();
        if value.is_none() {
            warn!("unable to get reading from pressure sensor");
        }
        value
    }
}

#[cfg(feature = "hardware")]
impl SerialSensor<Box<dyn serialport::SerialPort>> {
    /// Open the serial device. `read_timeout` bounds how long a reply may
    /// take before `read_reading` gives up with `None`.
    pub fn open(device: &str, baud: u32, read_timeout: std::time::Duration) -> Result<Self> {
        let port = serialport::new(device, baud)
            .timeout(read_timeout)
            .open()
            .map_err(|e| HwError::Open {
                device: device.to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(
            device,
            baud,
            timeout_ms = read_timeout.as_millis() as u64,
            "serial link open"
        );
        Ok(Self::new(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// In-memory duplex: records writes, serves scripted reply bytes, then
    /// times out (or reports end-of-stream when `closed`).
    #[derive(Default)]
    struct FakePort {
        written: Vec<u8>,
        incoming: VecDeque<u8>,
        closed: bool,
        fail_writes: bool,
    }

    impl FakePort {
        fn replying(bytes: &[u8]) -> Self {
            Self {
                incoming: bytes.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.incoming.is_empty() {
                if self.closed {
                    return Ok(0);
                }
                return Err(io::Error::new(ErrorKind::TimedOut, "read timed out"));
            }
            let n = buf.len().min(self.incoming.len());
            for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(ErrorKind::BrokenPipe, "port closed"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn skips_junk_tokens_and_takes_first_number() {
        assert_eq!(parse_first_reading(b"junk\rabc\r42\r\n"), Some(42));
    }

    #[test]
    fn parses_plain_reply() {
        assert_eq!(parse_first_reading(b"1234\r\n"), Some(1234));
        assert_eq!(parse_first_reading(b"1234\n"), Some(1234));
        assert_eq!(parse_first_reading(b" 7 \r"), Some(7));
    }

    #[test]
    fn first_of_duplicated_tokens_wins() {
        assert_eq!(parse_first_reading(b"12\r13\r\n"), Some(12));
    }

    #[test]
    fn rejects_replies_without_numbers() {
        assert_eq!(parse_first_reading(b""), None);
        assert_eq!(parse_first_reading(b"\r\n"), None);
        assert_eq!(parse_first_reading(b"AT+00\r\n"), None);
        assert_eq!(parse_first_reading(b"-5\r\n"), None);
    }

    #[test]
    fn overflowing_token_is_skipped() {
        assert_eq!(parse_first_reading(b"99999999999\r3\r\n"), Some(3));
    }

    #[test]
    fn out_of_domain_values_are_still_returned() {
        assert_eq!(parse_first_reading(b"70000\r\n"), Some(70_000));
    }

    #[test]
    fn request_writes_exact_token() {
        let mut sensor = SerialSensor::new(FakePort::default());
        sensor.request_reading().expect("write");
        assert_eq!(sensor.into_inner().written, b"AT+00\r\n");
    }

    #[test]
    fn request_and_read_round_trip() {
        let mut sensor = SerialSensor::new(FakePort::replying(b"512\r\n"));
        assert_eq!(sensor.request_and_read(), Some(512));
        assert_eq!(sensor.into_inner().written.len(), REQUEST_TOKEN.len());
    }

    #[test]
    fn consecutive_replies_are_read_line_by_line() {
        let mut sensor = SerialSensor::new(FakePort::replying(b"10\r\n20\r\n"));
        assert_eq!(sensor.request_and_read(), Some(10));
        assert_eq!(sensor.request_and_read(), Some(20));
        assert_eq!(sensor.request_and_read(), None);
    }

    #[test]
    fn timeout_without_bytes_is_none() {
        let mut sensor = SerialSensor::new(FakePort::default());
        assert_eq!(sensor.request_and_read(), None);
    }

    #[test]
    fn partial_reply_before_timeout_is_parsed() {
        let mut sensor = SerialSensor::new(FakePort::replying(b"300"));
        assert_eq!(sensor.read_reading(), Some(300));
    }

    #[test]
    fn end_of_stream_is_none() {
        let port = FakePort {
            closed: true,
            ..FakePort::default()
        };
        let mut sensor = SerialSensor::new(port);
        assert_eq!(sensor.read_reading(), None);
    }

    #[test]
    fn write_failure_is_none_and_reports_io() {
        let port = FakePort {
            fail_writes: true,
            incoming: b"5\r\n".iter().copied().collect(),
            ..FakePort::default()
        };
        let mut sensor = SerialSensor::new(port);
        assert!(matches!(sensor.request_reading(), Err(HwError::Io(_))));
        assert_eq!(sensor.request_and_read(), None);
    }

    #[test]
    fn garbage_reply_is_none() {
        let mut sensor = SerialSensor::new(FakePort::replying(b"ERR\r\n"));
        assert_eq!(sensor.request_and_read(), None);
    }
}
