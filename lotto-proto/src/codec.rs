//! Frame codec: `[kind u8][len u32 little-endian][payload]`.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::io::{read_exact, read_exact_into, write_all};
use crate::message::{Kind, Message};

/// Size of the fixed frame header.
pub const HEADER_LEN: usize = 5;

/// Maximum allowed payload (1 MiB).
pub const MAX_PAYLOAD: usize = 1024 * 1024;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Header {
    /// Payload layout.
    pub kind: Kind,
    /// Payload length in bytes, already checked against [`MAX_PAYLOAD`].
    pub len: usize,
}

impl Header {
    /// Builds a header for a payload of `len` bytes.
    pub fn new(kind: Kind, len: usize) -> Result<Self> {
        if len > MAX_PAYLOAD {
            return Err(Error::FrameTooLarge {
                len,
                max: MAX_PAYLOAD,
            });
        }
        Ok(Self { kind, len })
    }

    /// Serializes the header.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        // len <= MAX_PAYLOAD, so it always fits in a u32.
        let len = (self.len as u32).to_le_bytes();
        [u8::from(self.kind), len[0], len[1], len[2], len[3]]
    }

    /// Parses and validates a header.
    ///
    /// The length is checked before the caller allocates anything for the
    /// payload.
    pub fn parse(bytes: [u8; HEADER_LEN]) -> Result<Self> {
        let kind = Kind::try_from(bytes[0])?;
        let len = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        let len = usize::try_from(len).map_err(|_| Error::FrameTooLarge {
            len: usize::MAX,
            max: MAX_PAYLOAD,
        })?;
        Self::new(kind, len)
    }
}

/// Encodes `msg` into a complete frame.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    let payload = msg.to_payload();
    let header = Header::new(msg.kind(), payload.len())?;
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes exactly one complete frame held in memory.
pub fn decode(frame: &[u8]) -> Result<Message> {
    let Some((head, rest)) = frame.split_first_chunk::<HEADER_LEN>() else {
        return Err(Error::Truncated {
            needed: HEADER_LEN,
            got: frame.len(),
        });
    };
    let header = Header::parse(*head)?;
    if rest.len() < header.len {
        return Err(Error::Truncated {
            needed: HEADER_LEN + header.len,
            got: frame.len(),
        });
    }
    if rest.len() > header.len {
        return Err(Error::TrailingBytes(rest.len() - header.len));
    }
    Message::from_payload(header.kind, rest)
}

/// Encodes `msg` and writes the whole frame to `w`, then flushes.
pub async fn send<W>(w: &mut W, msg: &Message) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode(msg)?;
    write_all(w, &frame).await?;
    w.flush().await?;
    Ok(())
}

/// Reads one frame from `r` and decodes it.
///
/// A peer that closes exactly at a frame boundary yields
/// [`Error::ConnectionClosed`], same as one that closes mid-frame.
pub async fn recv<R>(r: &mut R) -> Result<Message>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut head = [0u8; HEADER_LEN];
    read_exact_into(r, &mut head).await?;
    let header = Header::parse(head)?;
    let payload = read_exact(r, header.len).await?;
    Message::from_payload(header.kind, &payload)
}
