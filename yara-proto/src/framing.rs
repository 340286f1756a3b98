//! Content-Length message framing
//!
//! One message on the stream looks like:
//!
//! ```text
//! Content-Length: <N>\r\n
//! \r\n
//! <exactly N bytes of UTF-8 JSON>
//! ```
//!
//! The reader tolerates a non-length header by falling back to reading a
//! single line as the payload. Any framing failure means the stream can no
//! longer be trusted to be message-aligned, so callers close the
//! connection; `Parse` is distinguished only so they can answer with the
//! JSON-RPC ParseError code before doing so.

use std::fmt;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug)]
pub enum FramingError {
    /// The stream ended cleanly before a header line was read.
    Eof,
    /// The header line did not look like `Name: value`.
    MalformedHeader(String),
    /// The stream ended or failed mid-message.
    Io(std::io::Error),
    /// The payload was delimited correctly but is not valid JSON.
    Parse(serde_json::Error),
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingError::Eof => write!(f, "stream closed"),
            FramingError::MalformedHeader(line) => write!(f, "malformed header line: {:?}", line),
            FramingError::Io(err) => write!(f, "stream error: {}", err),
            FramingError::Parse(err) => write!(f, "invalid JSON payload: {}", err),
        }
    }
}

impl std::error::Error for FramingError {}

impl From<std::io::Error> for FramingError {
    fn from(err: std::io::Error) -> Self {
        FramingError::Io(err)
    }
}

impl From<serde_json::Error> for FramingError {
    fn from(err: serde_json::Error) -> Self {
        FramingError::Parse(err)
    }
}

/// Read one framed JSON message from the stream.
pub async fn read_message<R>(reader: &mut R) -> Result<Value, FramingError>
where
    R: AsyncBufRead + Unpin,
{
    let mut header = String::new();
    if reader.read_line(&mut header).await? == 0 {
        return Err(FramingError::Eof);
    }
    let header = header.trim_end();
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| FramingError::MalformedHeader(header.to_string()))?;

    // the blank line separating the header from the payload
    let mut separator = String::new();
    if reader.read_line(&mut separator).await? == 0 {
        return Err(FramingError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stream ended before payload",
        )));
    }

    let payload = if name.eq_ignore_ascii_case("content-length") {
        let length: usize = value
            .trim()
            .parse()
            .map_err(|_| FramingError::MalformedHeader(header.to_string()))?;
        let mut buffer = vec![0u8; length];
        reader.read_exact(&mut buffer).await?;
        buffer
    } else {
        // unknown header: treat the next line as the payload
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        line.trim_end().as_bytes().to_vec()
    };

    Ok(serde_json::from_slice(&payload)?)
}

/// Serialize and frame one JSON message onto the stream, then flush.
///
/// A connection's write half is owned by exactly one task, which is what
/// keeps the header and payload of concurrent messages from interleaving.
pub async fn write_message<W>(writer: &mut W, value: &Value) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_vec(value)?;
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{duplex, AsyncWriteExt, BufReader};

    async fn round_trip(value: Value) -> Value {
        let (mut client, server) = duplex(64 * 1024);
        let mut reader = BufReader::new(server);
        write_message(&mut client, &value).await.unwrap();
        read_message(&mut reader).await.unwrap()
    }

    #[tokio::test]
    async fn round_trips_a_request_object() {
        let value = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {"rootUri": "file:///rules", "capabilities": {}}
        });
        assert_eq!(round_trip(value.clone()).await, value);
    }

    #[tokio::test]
    async fn round_trips_non_ascii_payloads() {
        let value = json!({"jsonrpc": "2.0", "method": "note", "params": {"text": "règle — 規則"}});
        assert_eq!(round_trip(value.clone()).await, value);
    }

    #[tokio::test]
    async fn reads_consecutive_messages_in_order() {
        let (mut client, server) = duplex(64 * 1024);
        let mut reader = BufReader::new(server);
        let first = json!({"jsonrpc": "2.0", "id": 1, "method": "shutdown", "params": null});
        let second = json!({"jsonrpc": "2.0", "method": "exit", "params": null});
        write_message(&mut client, &first).await.unwrap();
        write_message(&mut client, &second).await.unwrap();
        assert_eq!(read_message(&mut reader).await.unwrap(), first);
        assert_eq!(read_message(&mut reader).await.unwrap(), second);
    }

    #[tokio::test]
    async fn closed_stream_reports_eof() {
        let (client, server) = duplex(1024);
        drop(client);
        let mut reader = BufReader::new(server);
        assert!(matches!(
            read_message(&mut reader).await,
            Err(FramingError::Eof)
        ));
    }

    #[tokio::test]
    async fn header_without_colon_is_malformed() {
        let (mut client, server) = duplex(1024);
        let mut reader = BufReader::new(server);
        client.write_all(b"not a header\r\n\r\n{}\r\n").await.unwrap();
        assert!(matches!(
            read_message(&mut reader).await,
            Err(FramingError::MalformedHeader(_))
        ));
    }

    #[tokio::test]
    async fn non_numeric_length_is_malformed() {
        let (mut client, server) = duplex(1024);
        let mut reader = BufReader::new(server);
        client
            .write_all(b"Content-Length: twelve\r\n\r\n{}\r\n")
            .await
            .unwrap();
        assert!(matches!(
            read_message(&mut reader).await,
            Err(FramingError::MalformedHeader(_))
        ));
    }

    #[tokio::test]
    async fn truncated_payload_is_an_io_error() {
        let (mut client, server) = duplex(1024);
        let mut reader = BufReader::new(server);
        client
            .write_all(b"Content-Length: 100\r\n\r\n{\"jsonrpc\"")
            .await
            .unwrap();
        drop(client);
        assert!(matches!(
            read_message(&mut reader).await,
            Err(FramingError::Io(_))
        ));
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let (mut client, server) = duplex(1024);
        let mut reader = BufReader::new(server);
        client
            .write_all(b"Content-Length: 9\r\n\r\nnot json!")
            .await
            .unwrap();
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, FramingError::Parse(_)));
    }

    #[tokio::test]
    async fn unknown_header_falls_back_to_line_payload() {
        let (mut client, server) = duplex(1024);
        let mut reader = BufReader::new(server);
        client
            .write_all(b"X-Custom: yes\r\n\r\n{\"jsonrpc\":\"2.0\",\"method\":\"exit\"}\r\n")
            .await
            .unwrap();
        let value = read_message(&mut reader).await.unwrap();
        assert_eq!(value["method"], "exit");
    }
}
