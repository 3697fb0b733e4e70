//! Frame encoding and decoding over async byte streams.
//!
//! The server reads request frames field by field so it can answer each
//! malformed stage with the right error; the client writes whole requests
//! and reads whole responses. Exact-length transfers are provided by
//! `read_exact`/`write_all`, which loop until every byte has moved and
//! report EOF mid-transfer as an error.
//!
//! A peer closing its read side never aborts the process: the Rust runtime
//! ignores `SIGPIPE`, so a write to a closed socket surfaces as an
//! `io::Error` from `write_all` only.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;
use crate::MAGIC;

/// Frame operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    /// Request: detect and annotate faces.
    Detect = 0,
    /// Request: replace faces with a second image.
    Replace = 1,
    /// Response: processed JPEG payload.
    Image = 2,
    /// Response: UTF-8 error text payload.
    Error = 3,
}

impl Op {
    /// The on-wire byte for this operation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parses an operation byte.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Detect),
            1 => Some(Self::Replace),
            2 => Some(Self::Image),
            3 => Some(Self::Error),
            _ => None,
        }
    }
}

/// A parsed response frame.
///
/// The operation byte is kept raw: the client decides how to treat values
/// outside the response range, mirroring the order in which the fields are
/// read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Raw operation byte (2 = image, 3 = error text).
    pub op: u8,
    /// Response payload.
    pub payload: Vec<u8>,
}

/// Reads the 4-byte frame magic without validating it.
pub async fn read_magic<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<u32> {
    reader.read_u32_le().await
}

/// Reads the operation byte.
pub async fn read_op<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<u8> {
    reader.read_u8().await
}

/// Reads a 4-byte little-endian payload length.
pub async fn read_len<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<u32> {
    reader.read_u32_le().await
}

/// Reads exactly `len` payload bytes.
pub async fn read_payload<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: u32,
) -> std::io::Result<Vec<u8>> {
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Writes a full response frame: magic, op, length, payload.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    op: Op,
    payload: &[u8],
) -> std::io::Result<()> {
    writer.write_u32_le(MAGIC).await?;
    writer.write_u8(op.as_u8()).await?;
    writer.write_u32_le(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes a request frame: detect when `replacement` is absent, replace
/// (with the trailing second length + payload) when present.
pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    primary: &[u8],
    replacement: Option<&[u8]>,
) -> std::io::Result<()> {
    writer.write_u32_le(MAGIC).await?;
    let op = if replacement.is_some() {
        Op::Replace
    } else {
        Op::Detect
    };
    writer.write_u8(op.as_u8()).await?;
    writer.write_u32_le(primary.len() as u32).await?;
    writer.write_all(primary).await?;
    if let Some(replacement) = replacement {
        writer.write_u32_le(replacement.len() as u32).await?;
        writer.write_all(replacement).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Reads a full response frame, validating the magic.
///
/// Fields are consumed in wire order (magic, op, length, payload); a short
/// read at any point is an I/O error and a wrong magic is [`ProtocolError::BadMagic`].
pub async fn read_response<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Response, ProtocolError> {
    let magic = read_magic(reader).await?;
    if magic != MAGIC {
        return Err(ProtocolError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    let op = read_op(reader).await?;
    let len = read_len(reader).await?;
    let payload = read_payload(reader, len).await?;
    Ok(Response { op, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detect_request_layout() {
        let mut buf = Vec::new();
        write_request(&mut buf, b"JPEG", None).await.unwrap();

        // Wire order of the little-endian magic 0x23107231.
        assert_eq!(&buf[0..4], &[0x31, 0x72, 0x10, 0x23]);
        assert_eq!(buf[4], 0);
        assert_eq!(&buf[5..9], &4u32.to_le_bytes());
        assert_eq!(&buf[9..], b"JPEG");
    }

    #[tokio::test]
    async fn replace_request_carries_second_image() {
        let mut buf = Vec::new();
        write_request(&mut buf, b"first", Some(b"second!"))
            .await
            .unwrap();

        assert_eq!(buf[4], 1);
        let tail = &buf[9 + 5..];
        assert_eq!(&tail[0..4], &7u32.to_le_bytes());
        assert_eq!(&tail[4..], b"second!");
    }

    #[tokio::test]
    async fn request_fields_parse_in_sequence() {
        let mut buf = Vec::new();
        write_request(&mut buf, b"abc", None).await.unwrap();

        let mut cursor = &buf[..];
        assert_eq!(read_magic(&mut cursor).await.unwrap(), MAGIC);
        assert_eq!(read_op(&mut cursor).await.unwrap(), Op::Detect.as_u8());
        let len = read_len(&mut cursor).await.unwrap();
        assert_eq!(len, 3);
        assert_eq!(read_payload(&mut cursor, len).await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn response_roundtrip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Op::Image, b"processed").await.unwrap();

        let mut cursor = &buf[..];
        let response = read_response(&mut cursor).await.unwrap();
        assert_eq!(response.op, Op::Image.as_u8());
        assert_eq!(response.payload, b"processed");
    }

    #[tokio::test]
    async fn response_rejects_bad_magic() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Op::Error, b"nope").await.unwrap();
        buf[3] ^= 0xFF;

        let mut cursor = &buf[..];
        let err = read_response(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::BadMagic { .. }));
    }

    #[tokio::test]
    async fn truncated_payload_is_an_error() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Op::Image, b"full payload").await.unwrap();
        buf.truncate(buf.len() - 3);

        let mut cursor = &buf[..];
        assert!(read_response(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn empty_error_payload_roundtrips() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Op::Error, b"").await.unwrap();

        let mut cursor = &buf[..];
        let response = read_response(&mut cursor).await.unwrap();
        assert_eq!(response.op, Op::Error.as_u8());
        assert!(response.payload.is_empty());
    }

    #[test]
    fn op_bytes_roundtrip() {
        for op in [Op::Detect, Op::Replace, Op::Image, Op::Error] {
            assert_eq!(Op::from_u8(op.as_u8()), Some(op));
        }
        assert_eq!(Op::from_u8(4), None);
    }
}
