//! Error types for agency sessions.

use lotto_proto::Kind;

use crate::session::Phase;

/// Alias for `Result<T, lotto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by a [`Session`](crate::Session) run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Dialing, writing or reading failed, timed out, or the server closed
    /// the connection.
    #[error("connection error: {0}")]
    Connection(#[source] lotto_proto::Error),

    /// The server sent bytes that do not form a valid frame or payload.
    #[error("protocol error: {0}")]
    Protocol(#[source] lotto_proto::Error),

    /// A well-formed message that makes no sense in the current phase.
    #[error("unexpected {got} while {phase}")]
    Unexpected {
        /// Phase the session was in.
        phase: Phase,
        /// Kind that arrived.
        got: Kind,
    },

    /// The server answered `success=false` where that is fatal.
    #[error("server rejected request while {phase}: {message}")]
    Rejected {
        /// Phase the session was in.
        phase: Phase,
        /// Server-provided reason.
        message: String,
    },

    /// The server has not drawn the lottery yet.
    #[error("lottery not ready: {0}")]
    NotReady(String),

    /// A retried operation failed on every attempt.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        last: Box<Error>,
    },

    /// The configuration cannot drive a session.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading the bet source failed.
    #[error("failed to read bets: {0}")]
    Bets(#[source] std::io::Error),

    /// The run was cancelled. Never returned from [`Session::run`].
    ///
    /// [`Session::run`]: crate::Session::run
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Whether a retry policy may try again after this error.
    ///
    /// Transport and protocol failures and not-ready answers are retryable;
    /// rejections, cancellation and local failures are not.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Protocol(_) | Self::Unexpected { .. } | Self::NotReady(_)
        )
    }

    /// Builds a timeout error for the named operation.
    pub(crate) fn timed_out(op: &str) -> Self {
        Self::Connection(lotto_proto::Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("{op} timed out"),
        )))
    }
}

impl From<lotto_proto::Error> for Error {
    fn from(err: lotto_proto::Error) -> Self {
        if err.is_transport() {
            Self::Connection(err)
        } else {
            Self::Protocol(err)
        }
    }
}
