//! Protocol error type.

use std::io;

use crate::message::Kind;

/// Alias for `Result<T, lotto_proto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while framing, reading or writing protocol messages.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The peer closed the stream before the expected bytes arrived.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Any other I/O failure on the underlying stream.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The header carried a kind tag outside the known set.
    #[error("unknown message kind {0}")]
    UnknownKind(u8),

    /// The declared (or produced) payload length is over [`MAX_PAYLOAD`].
    ///
    /// [`MAX_PAYLOAD`]: crate::MAX_PAYLOAD
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Declared payload length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// An in-memory frame ended before the header or payload was complete.
    #[error("truncated frame: need {needed} bytes, got {got}")]
    Truncated {
        /// Bytes required to complete the frame.
        needed: usize,
        /// Bytes actually available.
        got: usize,
    },

    /// An in-memory frame carried bytes past the declared payload.
    #[error("{0} trailing bytes after frame")]
    TrailingBytes(usize),

    /// The payload did not parse into the shape its kind requires.
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload {
        /// Kind whose layout was violated.
        kind: Kind,
        /// What was wrong with it.
        reason: String,
    },
}

impl Error {
    /// Creates a [`Error::MalformedPayload`].
    pub(crate) fn malformed(kind: Kind, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            kind,
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures of the byte stream itself, as opposed to
    /// bytes that arrived intact but violate the protocol.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Io(_))
    }
}
