//! Framed reads over the transport.
//!
//! IMAP responses are CRLF-terminated lines that may embed literals: a
//! `{n}` at the end of a line announces exactly `n` raw bytes, after which
//! the textual line continues. One *unit* is the full assembly (the line,
//! every literal, and every continuation line), which is what the parser
//! consumes. Literal bytes are 8-bit clean and never inspected here.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::{Error, Result};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Cap on a single textual line.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Cap on a single literal.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Buffered reader that assembles complete response units.
pub struct FramedReader<R> {
    reader: BufReader<R>,
}

impl<R> FramedReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps the read half of the transport.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, inner),
        }
    }

    /// Reads one complete response unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] on EOF, [`Error::Protocol`] when a line or
    /// literal exceeds its cap, and [`Error::Io`] for transport failures.
    pub async fn read_unit(&mut self) -> Result<Vec<u8>> {
        let mut unit = Vec::new();

        loop {
            let line = self.read_line(unit.is_empty()).await?;
            unit.extend_from_slice(&line);

            let Some(count) = literal_length(&line) else {
                break;
            };
            if count > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {count} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let mut literal = vec![0u8; count];
            self.reader
                .read_exact(&mut literal)
                .await
                .map_err(eof_as_closed)?;
            unit.extend_from_slice(&literal);
            // The textual line resumes after the literal.
        }

        Ok(unit)
    }

    /// Reads a single LF-terminated line, including the terminator.
    async fn read_line(&mut self, at_unit_start: bool) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                let message = if at_unit_start && line.is_empty() {
                    "connection closed"
                } else {
                    "connection closed mid-response"
                };
                return Err(Error::Closed(message.to_string()));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }

        Ok(line)
    }
}

/// Maps an EOF during a literal read to the closed error.
fn eof_as_closed(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Closed("connection closed mid-response".to_string())
    } else {
        Error::Io(err)
    }
}

/// Extracts the literal count when a line ends with `{n}` before its
/// terminator.
fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\n")?;
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = line.strip_suffix(b"}")?;

    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn literal_length_detection() {
        assert_eq!(literal_length(b"* 1 FETCH (RFC822 {123}\r\n"), Some(123));
        assert_eq!(literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(literal_length(b"{42}\n"), Some(42));
        assert_eq!(literal_length(b"* OK no literal\r\n"), None);
        assert_eq!(literal_length(b"{}\r\n"), None);
        assert_eq!(literal_length(b"{12x}\r\n"), None);
        assert_eq!(literal_length(b"{12"), None);
    }

    #[tokio::test]
    async fn reads_a_simple_line() {
        let stream = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedReader::new(stream);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn reassembles_split_lines() {
        let stream = Builder::new()
            .read(b"* OK split ")
            .read(b"across reads\r\n")
            .build();
        let mut framed = FramedReader::new(stream);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* OK split across reads\r\n");
    }

    #[tokio::test]
    async fn unit_includes_literal_and_continuation() {
        let stream = Builder::new()
            .read(b"* 1 FETCH (RFC822 {5}\r\n")
            .read(b"hello)\r\n")
            .build();
        let mut framed = FramedReader::new(stream);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* 1 FETCH (RFC822 {5}\r\nhello)\r\n");
    }

    #[tokio::test]
    async fn literal_bytes_round_trip_unmodified() {
        // Embedded CR, LF, and NUL must come through untouched.
        let stream = Builder::new()
            .read(b"* 1 FETCH (RFC822 {6}\r\n")
            .read(b"A\r\nB\0C)\r\n")
            .build();
        let mut framed = FramedReader::new(stream);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* 1 FETCH (RFC822 {6}\r\nA\r\nB\0C)\r\n");
    }

    #[tokio::test]
    async fn consecutive_literals_in_one_unit() {
        let stream = Builder::new()
            .read(b"* 1 FETCH (RFC822.HEADER {2}\r\n")
            .read(b"h:")
            .read(b" RFC822 {3}\r\n")
            .read(b"abc)\r\n")
            .build();
        let mut framed = FramedReader::new(stream);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(
            unit,
            b"* 1 FETCH (RFC822.HEADER {2}\r\nh: RFC822 {3}\r\nabc)\r\n"
        );
    }

    #[tokio::test]
    async fn bare_lf_line() {
        let stream = Builder::new().read(b"* OK tolerant\n").build();
        let mut framed = FramedReader::new(stream);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* OK tolerant\n");
    }

    #[tokio::test]
    async fn eof_at_unit_start() {
        let stream = Builder::new().build();
        let mut framed = FramedReader::new(stream);

        match framed.read_unit().await {
            Err(Error::Closed(message)) => assert_eq!(message, "connection closed"),
            other => panic!("expected closed error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn eof_mid_response_is_distinguished() {
        let stream = Builder::new().read(b"* OK truncat").build();
        let mut framed = FramedReader::new(stream);

        match framed.read_unit().await {
            Err(Error::Closed(message)) => {
                assert_eq!(message, "connection closed mid-response");
            }
            other => panic!("expected closed error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn eof_inside_literal_is_an_error() {
        let stream = Builder::new()
            .read(b"* 1 FETCH (RFC822 {100}\r\n")
            .read(b"only a few bytes")
            .build();
        let mut framed = FramedReader::new(stream);

        match framed.read_unit().await {
            Err(Error::Closed(message)) => {
                assert_eq!(message, "connection closed mid-response");
            }
            other => panic!("expected closed error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversize_literal_is_rejected() {
        let header = format!("* 1 FETCH (RFC822 {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let stream = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedReader::new(stream);

        match framed.read_unit().await {
            Err(Error::Protocol(message)) => assert!(message.contains("literal too large")),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn overlong_line_is_rejected() {
        let long = vec![b'x'; MAX_LINE_LENGTH + 100];
        let stream = Builder::new().read(&long).build();
        let mut framed = FramedReader::new(stream);

        match framed.read_unit().await {
            Err(Error::Protocol(message)) => assert_eq!(message, "line too long"),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }
}
