//! Line framing for the serial command protocol.
//!
//! Commands arrive as newline-terminated ASCII:
//! - `\n` terminates a line
//! - `\r` is dropped wherever it appears, so `\r\n` senders work unchanged
//! - a line longer than [`MAX_LINE_LEN`] is discarded up to its newline

use heapless::{String, Vec};

/// Line terminator
pub const LINE_END: u8 = b'\n';

/// Maximum accepted line length in bytes (excluding the terminator)
pub const MAX_LINE_LEN: usize = 64;

/// A complete received line
pub type Line = String<MAX_LINE_LEN>;

/// Errors reported while framing lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`] and was dropped
    TooLong,
    /// Line contained bytes that are not valid UTF-8
    InvalidUtf8,
}

/// State machine splitting a byte stream into lines
#[derive(Debug, Clone)]
pub struct LineParser {
    state: ParseState,
    buffer: Vec<u8, MAX_LINE_LEN>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Collecting bytes of the current line
    Collecting,
    /// Current line overflowed; skipping until the next terminator
    Discarding,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    /// Create a new line parser
    pub fn new() -> Self {
        Self {
            state: ParseState::Collecting,
            buffer: Vec::new(),
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.state = ParseState::Collecting;
        self.buffer.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a line,
    /// `Ok(None)` when more bytes are needed, or `Err` when the finished
    /// line had to be dropped.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        match (self.state, byte) {
            (_, b'\r') => Ok(None),
            (ParseState::Discarding, LINE_END) => {
                self.reset();
                Err(LineError::TooLong)
            }
            (ParseState::Discarding, _) => Ok(None),
            (ParseState::Collecting, LINE_END) => {
                let result = core::str::from_utf8(&self.buffer)
                    .map_err(|_| LineError::InvalidUtf8)
                    .and_then(|s| Line::try_from(s).map_err(|_| LineError::TooLong));
                self.reset();
                result.map(Some)
            }
            (ParseState::Collecting, _) => {
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    self.state = ParseState::Discarding;
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete line found, if any, together with the
    /// number of bytes consumed. Bytes after a complete line are left for
    /// the next call.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (usize, Result<Option<Line>, LineError>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (i + 1, other),
            }
        }
        (bytes.len(), Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut LineParser, data: &[u8]) -> Option<Result<Line, LineError>> {
        let mut last = None;
        for &b in data {
            match parser.feed(b) {
                Ok(Some(line)) => last = Some(Ok(line)),
                Ok(None) => {}
                Err(e) => last = Some(Err(e)),
            }
        }
        last
    }

    #[test]
    fn test_simple_line() {
        let mut parser = LineParser::new();
        let line = feed_all(&mut parser, b"MOVE 100 -50\n").unwrap().unwrap();
        assert_eq!(line.as_str(), "MOVE 100 -50");
    }

    #[test]
    fn test_crlf_is_stripped() {
        let mut parser = LineParser::new();
        let line = feed_all(&mut parser, b"HOME\r\n").unwrap().unwrap();
        assert_eq!(line.as_str(), "HOME");
    }

    #[test]
    fn test_partial_line_waits() {
        let mut parser = LineParser::new();
        assert_eq!(parser.feed(b'S'), Ok(None));
        assert_eq!(parser.feed(b'T'), Ok(None));
        assert!(feed_all(&mut parser, b"OP").is_none());
        let line = feed_all(&mut parser, b"\n").unwrap().unwrap();
        assert_eq!(line.as_str(), "STOP");
    }

    #[test]
    fn test_empty_line() {
        let mut parser = LineParser::new();
        let line = parser.feed(b'\n').unwrap().unwrap();
        assert!(line.is_empty());
    }

    #[test]
    fn test_overlong_line_is_dropped_then_recovers() {
        let mut parser = LineParser::new();
        let long = [b'A'; MAX_LINE_LEN + 10];
        assert!(feed_all(&mut parser, &long).is_none());
        assert_eq!(parser.feed(b'\n'), Err(LineError::TooLong));

        let line = feed_all(&mut parser, b"HOME\n").unwrap().unwrap();
        assert_eq!(line.as_str(), "HOME");
    }

    #[test]
    fn test_line_of_exact_capacity_is_kept() {
        let mut parser = LineParser::new();
        let exact = [b'9'; MAX_LINE_LEN];
        assert!(feed_all(&mut parser, &exact).is_none());
        let line = parser.feed(b'\n').unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LEN);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut parser = LineParser::new();
        assert_eq!(parser.feed(0xFF), Ok(None));
        assert_eq!(parser.feed(b'\n'), Err(LineError::InvalidUtf8));
        let line = feed_all(&mut parser, b"STOP\n").unwrap().unwrap();
        assert_eq!(line.as_str(), "STOP");
    }

    #[test]
    fn test_feed_bytes_leaves_remainder() {
        let mut parser = LineParser::new();
        let data = b"HOME\nSTOP\n";
        let (used, result) = parser.feed_bytes(data);
        assert_eq!(used, 5);
        assert_eq!(result.unwrap().unwrap().as_str(), "HOME");

        let (used, result) = parser.feed_bytes(&data[5..]);
        assert_eq!(used, 5);
        assert_eq!(result.unwrap().unwrap().as_str(), "STOP");
    }

    #[test]
    fn test_feed_bytes_incomplete() {
        let mut parser = LineParser::new();
        let (used, result) = parser.feed_bytes(b"MOV");
        assert_eq!(used, 3);
        assert_eq!(result, Ok(None));
    }
}
