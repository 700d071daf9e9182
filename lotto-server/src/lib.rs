//! Lottery aggregation server.
//!
//! Agencies submit bet batches and a finished notification; once every
//! expected agency has finished, the server draws and answers each
//! agency's winners query with the documents of its winning bets.
//!
//! ```no_run
//! use lotto::Cancel;
//! use lotto_server::{Server, ServerConfig};
//!
//! # async fn demo() -> std::io::Result<()> {
//! let server = Server::bind(ServerConfig::new("0.0.0.0:12345", 5)).await?;
//! server.run(&Cancel::new()).await
//! # }
//! ```

mod lottery;
mod server;

pub use lottery::{INVALID_TYPE, Lottery, NOT_DRAWN};
pub use server::{DEFAULT_WINNING_NUMBER, Server, ServerConfig};
