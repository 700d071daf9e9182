//! Agency-side lottery client.
//!
//! A [`Session`] submits an agency's bets to the aggregation server in
//! bounded batches, announces that the agency is finished, then polls for
//! the agency's winners until the server has drawn the lottery.
//!
//! # Quick start
//!
//! ```no_run
//! use lotto::{BetReader, Cancel, Config, Outcome, Session, TracingSink};
//!
//! # async fn demo() -> lotto::Result<()> {
//! let config = Config::new("1", "server:12345").batch_max_amount(100);
//! let bets = BetReader::open("/data/agency-1.csv", "1").map_err(lotto::Error::Bets)?;
//!
//! let cancel = Cancel::new();
//! let mut session = Session::new(config, TracingSink::default())?;
//! if let Outcome::Completed { winners, .. } = session.run(bets, &cancel).await? {
//!     println!("{} winners", winners.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The wire format lives in [`lotto_proto`].

mod bets;
mod cancel;
mod config;
mod conn;
mod error;
mod event;
mod retry;
mod session;

pub use bets::BetReader;
pub use cancel::Cancel;
pub use config::{Config, ConnectionMode};
pub use error::{Error, Result};
pub use event::{Event, EventSink, MemorySink, TracingSink};
pub use lotto_proto::Bet;
pub use retry::{Attempt, Retry};
pub use session::{Outcome, Phase, Session};
