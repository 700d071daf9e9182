//! Protocol message types exchanged between agencies and the server.

use std::fmt;

use crate::error::Error;

/// Separates fields inside a record. Field content must not contain it.
pub const FIELD_DELIM: char = '|';

/// Separates bet records inside a batch payload.
pub const RECORD_DELIM: &str = ";;";

/// Numeric tag identifying the payload layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::exhaustive_enums)]
#[repr(u8)]
pub enum Kind {
    /// A batch of bets from one agency.
    Batch = 1,
    /// Server acknowledgment (success flag + message).
    Response = 2,
    /// The agency has sent all of its bets.
    FinishedNotification = 3,
    /// The agency asks for its winners.
    WinnersQuery = 4,
    /// The winners of the querying agency.
    WinnersResponse = 5,
}

impl TryFrom<u8> for Kind {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self, Error> {
        match tag {
            1 => Ok(Self::Batch),
            2 => Ok(Self::Response),
            3 => Ok(Self::FinishedNotification),
            4 => Ok(Self::WinnersQuery),
            5 => Ok(Self::WinnersResponse),
            other => Err(Error::UnknownKind(other)),
        }
    }
}

impl From<Kind> for u8 {
    fn from(kind: Kind) -> Self {
        kind as Self
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Batch => "batch",
            Self::Response => "response",
            Self::FinishedNotification => "finished-notification",
            Self::WinnersQuery => "winners-query",
            Self::WinnersResponse => "winners-response",
        })
    }
}

/// A single lottery bet placed at an agency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct Bet {
    /// Agency identifier.
    pub agency: String,
    /// Bettor's first name.
    pub first_name: String,
    /// Bettor's last name.
    pub last_name: String,
    /// Bettor's document number.
    pub document: String,
    /// Bettor's birthdate (`YYYY-MM-DD`).
    pub birthdate: String,
    /// The number bet on.
    pub number: String,
}

impl Bet {
    /// Creates a bet from its six fields.
    pub fn new(
        agency: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        document: impl Into<String>,
        birthdate: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            agency: agency.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            document: document.into(),
            birthdate: birthdate.into(),
            number: number.into(),
        }
    }
}

/// A non-empty group of bets from one agency, sent as one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Batch {
    /// Agency identifier.
    pub agency: String,
    /// Bets in submission order.
    pub bets: Vec<Bet>,
}

impl Batch {
    /// Creates a batch.
    pub fn new(agency: impl Into<String>, bets: Vec<Bet>) -> Self {
        Self {
            agency: agency.into(),
            bets,
        }
    }
}

/// Server acknowledgment of a [`Batch`], [`FinishedNotification`] or a
/// not-yet-answerable [`WinnersQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Response {
    /// Whether the request was accepted.
    pub success: bool,
    /// Human-readable detail.
    pub message: String,
}

impl Response {
    /// A successful response.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// A failed response.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Sent once an agency has no more bets to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct FinishedNotification {
    /// Agency identifier.
    pub agency: String,
}

impl FinishedNotification {
    /// Creates a notification for `agency`.
    pub fn new(agency: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
        }
    }
}

/// Asks the server for the winners of an agency.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct WinnersQuery {
    /// Agency identifier.
    pub agency: String,
}

impl WinnersQuery {
    /// Creates a query for `agency`.
    pub fn new(agency: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
        }
    }
}

/// Document numbers of the winning bettors of an agency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct WinnersResponse {
    /// Winning document numbers, in server order.
    pub winners: Vec<String>,
}

impl WinnersResponse {
    /// Creates a response listing `winners`.
    pub const fn new(winners: Vec<String>) -> Self {
        Self { winners }
    }
}

/// One protocol message: the unit carried by a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::exhaustive_enums)]
pub enum Message {
    /// See [`Batch`].
    Batch(Batch),
    /// See [`Response`].
    Response(Response),
    /// See [`FinishedNotification`].
    FinishedNotification(FinishedNotification),
    /// See [`WinnersQuery`].
    WinnersQuery(WinnersQuery),
    /// See [`WinnersResponse`].
    WinnersResponse(WinnersResponse),
}

impl Message {
    /// Kind tag written in this message's frame header.
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Batch(_) => Kind::Batch,
            Self::Response(_) => Kind::Response,
            Self::FinishedNotification(_) => Kind::FinishedNotification,
            Self::WinnersQuery(_) => Kind::WinnersQuery,
            Self::WinnersResponse(_) => Kind::WinnersResponse,
        }
    }
}

impl From<Batch> for Message {
    fn from(b: Batch) -> Self {
        Self::Batch(b)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Self::Response(r)
    }
}

impl From<FinishedNotification> for Message {
    fn from(n: FinishedNotification) -> Self {
        Self::FinishedNotification(n)
    }
}

impl From<WinnersQuery> for Message {
    fn from(q: WinnersQuery) -> Self {
        Self::WinnersQuery(q)
    }
}

impl From<WinnersResponse> for Message {
    fn from(w: WinnersResponse) -> Self {
        Self::WinnersResponse(w)
    }
}
