//! Wire protocol for lottery agency ↔ server communication.
//!
//! Every frame is a 5-byte header followed by a text payload:
//!
//! ```text
//! [kind u8][payload length u32 little-endian][payload]
//! ```
//!
//! Payloads are `|`-delimited fields; bets inside a batch are separated by
//! `;;`. The same framing is used for all five message kinds, over any
//! reliable byte stream (TCP in practice).

mod codec;
mod error;
mod io;
mod message;
mod payload;

pub use codec::{HEADER_LEN, Header, MAX_PAYLOAD, decode, encode, recv, send};
pub use error::{Error, Result};
pub use io::{read_exact, read_exact_into, write_all};
pub use message::{
    Batch, Bet, FIELD_DELIM, FinishedNotification, Kind, Message, RECORD_DELIM, Response,
    WinnersQuery, WinnersResponse,
};
