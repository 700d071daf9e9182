//! The agency session: send batches, announce completion, query winners.
//!
//! ```text
//! Sending ──(empty batch)──▶ Finalizing ──▶ Querying ──▶ Done
//!    └──────────────┴──────────────┴──(cancel)──▶ Aborted
//! ```
//!
//! Batches are delivered at most once: a failure while sending aborts the
//! run and nothing already confirmed is resent. Only connecting and the
//! winners query are retried.

use std::fmt;
use std::io;

use lotto_proto::{Batch, Bet, FinishedNotification, Message, Response, WinnersQuery};
use serde::Serialize;
use tracing::Instrument;

use crate::cancel::Cancel;
use crate::config::{Config, ConnectionMode};
use crate::conn::Connection;
use crate::error::{Error, Result};
use crate::event::{Event, EventSink, TracingSink};
use crate::retry::Attempt;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Phase {
    /// Submitting bet batches.
    Sending,
    /// Announcing that this agency has no more bets.
    Finalizing,
    /// Polling for winners.
    Querying,
    /// Winners received.
    Done,
    /// Stopped by cancellation or failure.
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sending => "sending",
            Self::Finalizing => "finalizing",
            Self::Querying => "querying",
            Self::Done => "done",
            Self::Aborted => "aborted",
        })
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Outcome {
    /// Every phase completed.
    Completed {
        /// Batches confirmed by the server.
        batches: usize,
        /// Bets confirmed by the server.
        bets: usize,
        /// Winning document numbers for this agency.
        winners: Vec<String>,
    },
    /// Cancellation was requested before the run finished.
    Cancelled {
        /// Phase that was interrupted.
        phase: Phase,
    },
}

/// One agency's run against the server.
///
/// # Example
///
/// ```no_run
/// use lotto::{BetReader, Cancel, Config, Session, TracingSink};
///
/// # async fn demo() -> lotto::Result<()> {
/// let config = Config::new("1", "server:12345").batch_max_amount(50);
/// let bets = BetReader::open("/data/agency-1.csv", "1").map_err(lotto::Error::Bets)?;
/// let mut session = Session::new(config, TracingSink::default())?;
/// let outcome = session.run(bets, &Cancel::new()).await?;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session<S = TracingSink> {
    /// Validated configuration.
    config: Config,
    /// Receives every observable event.
    sink: S,
    /// Current lifecycle phase.
    phase: Phase,
    /// Batches confirmed so far.
    batches_sent: usize,
    /// Bets confirmed so far.
    bets_sent: usize,
}

impl<S: EventSink> Session<S> {
    /// Creates a session after validating `config`.
    pub fn new(config: Config, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sink,
            phase: Phase::Sending,
            batches_sent: 0,
            bets_sent: 0,
        })
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Batches confirmed so far.
    pub const fn batches_sent(&self) -> usize {
        self.batches_sent
    }

    /// The configuration this session runs with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Drives the session to completion.
    ///
    /// Cancellation is not an error: it yields [`Outcome::Cancelled`] after
    /// closing any open connection. Every other way of stopping early
    /// returns `Err` after emitting exactly one [`Event::RunFailed`].
    pub async fn run<I>(&mut self, bets: I, cancel: &Cancel) -> Result<Outcome>
    where
        I: IntoIterator<Item = io::Result<Bet>>,
    {
        let span = tracing::info_span!("session", agency = %self.config.agency);
        let result = self.drive(bets.into_iter(), cancel).instrument(span).await;
        match result {
            Ok(winners) => {
                self.phase = Phase::Done;
                Ok(Outcome::Completed {
                    batches: self.batches_sent,
                    bets: self.bets_sent,
                    winners,
                })
            }
            Err(Error::Cancelled) => {
                let phase = self.phase;
                self.phase = Phase::Aborted;
                self.sink.emit(Event::Cancelled { phase });
                Ok(Outcome::Cancelled { phase })
            }
            Err(e) => {
                let phase = self.phase;
                self.phase = Phase::Aborted;
                self.sink.emit(Event::RunFailed {
                    phase,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Runs the three phases in order.
    async fn drive(
        &mut self,
        mut bets: impl Iterator<Item = io::Result<Bet>>,
        cancel: &Cancel,
    ) -> Result<Vec<String>> {
        self.phase = Phase::Sending;
        self.batches_sent = 0;
        self.bets_sent = 0;
        self.send_batches(&mut bets, cancel).await?;

        self.phase = Phase::Finalizing;
        self.finalize(cancel).await?;

        self.phase = Phase::Querying;
        let this = &*self;
        this.config
            .query_retry
            .run(cancel, |attempt| this.query_once(attempt, cancel))
            .await
    }

    /// Sends batches until the bet source runs dry. Whatever connection is
    /// still open when this returns, successfully or not, is closed.
    async fn send_batches(
        &mut self,
        bets: &mut impl Iterator<Item = io::Result<Bet>>,
        cancel: &Cancel,
    ) -> Result<()> {
        let mut kept = None;
        let res = self.send_batches_on(&mut kept, bets, cancel).await;
        if let Some(conn) = kept {
            self.close(conn).await;
        }
        res
    }

    /// Batch loop; `kept` holds the open connection between round-trips.
    async fn send_batches_on(
        &mut self,
        kept: &mut Option<Connection>,
        bets: &mut impl Iterator<Item = io::Result<Bet>>,
        cancel: &Cancel,
    ) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let chunk = next_batch(bets, self.config.batch_max_amount).map_err(Error::Bets)?;
            if chunk.is_empty() {
                return Ok(());
            }
            if self.batches_sent > 0 && !self.config.loop_period.is_zero() {
                // No connection stays open across the pause.
                if let Some(conn) = kept.take() {
                    self.close(conn).await;
                }
                cancel.sleep(self.config.loop_period).await?;
            }

            let seq = self.batches_sent + 1;
            let size = chunk.len();
            self.sink.emit(Event::BatchPrepared { batch: seq, size });

            let conn = match kept.take() {
                Some(conn) => conn,
                None => self.connect(cancel).await?,
            };
            let conn = kept.insert(conn);
            let msg = Message::from(Batch::new(self.config.agency.clone(), chunk));
            conn.send(&msg, cancel).await?;
            self.sink.emit(Event::BatchSent { batch: seq, size });

            let resp = expect_response(self.phase, conn.recv(cancel).await?)?;
            if !resp.success {
                return Err(Error::Rejected {
                    phase: Phase::Sending,
                    message: resp.message,
                });
            }
            self.batches_sent = seq;
            self.bets_sent += size;
            self.sink.emit(Event::BatchConfirmed { batch: seq, size });

            if self.config.connection_mode == ConnectionMode::PerBatch {
                if let Some(conn) = kept.take() {
                    self.close(conn).await;
                }
            }
        }
    }

    /// Tells the server this agency is done.
    async fn finalize(&self, cancel: &Cancel) -> Result<()> {
        let mut conn = self.connect(cancel).await?;
        let msg = Message::from(FinishedNotification::new(self.config.agency.clone()));
        let reply = conn.round_trip(&msg, cancel).await;
        self.close(conn).await;

        let resp = expect_response(Phase::Finalizing, reply?)?;
        if !resp.success {
            return Err(Error::Rejected {
                phase: Phase::Finalizing,
                message: resp.message,
            });
        }
        self.sink.emit(Event::FinishedConfirmed {
            batches: self.batches_sent,
        });
        Ok(())
    }

    /// One winners query on a fresh connection.
    async fn query_once(&self, attempt: u32, cancel: &Cancel) -> Result<Attempt<Vec<String>>> {
        self.sink.emit(Event::QueryAttempt { attempt });
        let reply = async {
            let mut conn = self.open(attempt, cancel).await?;
            let msg = Message::from(WinnersQuery::new(self.config.agency.clone()));
            let reply: Result<Message> = conn.round_trip(&msg, cancel).await;
            self.close(conn).await;
            reply
        }
        .await;

        let failure = match reply {
            Ok(Message::WinnersResponse(resp)) => {
                self.sink.emit(Event::Winners {
                    attempt,
                    count: resp.winners.len(),
                });
                return Ok(Attempt::Done(resp.winners));
            }
            Ok(Message::Response(Response {
                success: false,
                message,
                ..
            })) => {
                self.sink.emit(Event::QueryNotReady {
                    attempt,
                    message: message.clone(),
                });
                return Ok(Attempt::Retry(Error::NotReady(message)));
            }
            Ok(other @ (Message::Response(_)
            | Message::Batch(_)
            | Message::FinishedNotification(_)
            | Message::WinnersQuery(_))) => Error::Unexpected {
                phase: Phase::Querying,
                got: other.kind(),
            },
            Err(e) => e,
        };
        if failure.is_retryable() {
            self.sink.emit(Event::QueryFailed {
                attempt,
                error: failure.to_string(),
            });
        }
        Attempt::from_result(Err(failure))
    }

    /// Dials the server under the connect retry policy.
    async fn connect(&self, cancel: &Cancel) -> Result<Connection> {
        self.config
            .connect_retry
            .run(cancel, |attempt| async move {
                Attempt::from_result(self.open(attempt, cancel).await)
            })
            .await
    }

    /// Dials the server once, reporting the outcome.
    async fn open(&self, attempt: u32, cancel: &Cancel) -> Result<Connection> {
        let res = Connection::open(&self.config.server_address, self.config.io_timeout, cancel).await;
        match &res {
            Ok(_) => self.sink.emit(Event::Connected { attempt }),
            Err(Error::Cancelled) => {}
            Err(e) => self.sink.emit(Event::ConnectFailed {
                attempt,
                error: e.to_string(),
            }),
        }
        res
    }

    /// Closes a connection owned by the current phase, on success and
    /// failure paths alike.
    async fn close(&self, conn: Connection) {
        conn.close().await;
        self.sink.emit(Event::Disconnected { phase: self.phase });
    }
}

/// Pulls up to `max` bets off the source. An empty result means the
/// source is exhausted.
fn next_batch(
    bets: &mut impl Iterator<Item = io::Result<Bet>>,
    max: usize,
) -> io::Result<Vec<Bet>> {
    bets.take(max).collect()
}

/// Accepts only a [`Response`]; anything else is a protocol violation.
fn expect_response(phase: Phase, msg: Message) -> Result<Response> {
    match msg {
        Message::Response(resp) => Ok(resp),
        other @ (Message::Batch(_)
        | Message::FinishedNotification(_)
        | Message::WinnersQuery(_)
        | Message::WinnersResponse(_)) => Err(Error::Unexpected {
            phase,
            got: other.kind(),
        }),
    }
}
