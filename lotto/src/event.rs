//! Observable session events and where they go.
//!
//! The session never formats log lines itself: it hands an [`Event`] to the
//! [`EventSink`] it was built with. [`TracingSink`] turns each event into
//! one structured `tracing` record with `action` and `result` fields.

use std::sync::{Arc, Mutex};

use crate::session::Phase;

/// Something observable that happened during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// A connection attempt succeeded.
    Connected {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// A connection attempt failed.
    ConnectFailed {
        /// 1-based attempt number.
        attempt: u32,
        /// Failure description.
        error: String,
    },
    /// A connection was closed by the client.
    Disconnected {
        /// Phase that owned the connection.
        phase: Phase,
    },
    /// A batch was assembled from the bet source.
    BatchPrepared {
        /// 1-based batch sequence number.
        batch: usize,
        /// Bets in the batch.
        size: usize,
    },
    /// A batch frame was fully written.
    BatchSent {
        /// 1-based batch sequence number.
        batch: usize,
        /// Bets in the batch.
        size: usize,
    },
    /// The server acknowledged a batch.
    BatchConfirmed {
        /// 1-based batch sequence number.
        batch: usize,
        /// Bets in the batch.
        size: usize,
    },
    /// The server acknowledged the finished notification.
    FinishedConfirmed {
        /// Batches confirmed before finishing.
        batches: usize,
    },
    /// A winners query is about to be sent.
    QueryAttempt {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// The server has not drawn yet.
    QueryNotReady {
        /// 1-based attempt number.
        attempt: u32,
        /// Server-provided reason.
        message: String,
    },
    /// A winners query attempt failed on transport or protocol.
    QueryFailed {
        /// 1-based attempt number.
        attempt: u32,
        /// Failure description.
        error: String,
    },
    /// Winners received.
    Winners {
        /// 1-based attempt number.
        attempt: u32,
        /// Number of winners for this agency.
        count: usize,
    },
    /// The run stopped on an external cancellation request.
    Cancelled {
        /// Phase that was interrupted.
        phase: Phase,
    },
    /// The run ended with a terminal failure.
    RunFailed {
        /// Phase that failed.
        phase: Phase,
        /// Failure description.
        error: String,
    },
}

/// Receives session events.
pub trait EventSink {
    /// Records one event.
    fn emit(&self, event: Event);
}

/// Emits events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event {
            Event::Connected { attempt } => {
                tracing::debug!(action = "connect", result = "success", attempt);
            }
            Event::ConnectFailed { attempt, error } => {
                tracing::warn!(action = "connect", result = "fail", attempt, %error);
            }
            Event::Disconnected { phase } => {
                tracing::debug!(action = "closing_connection", result = "success", %phase);
            }
            Event::BatchPrepared { batch, size } => {
                tracing::debug!(action = "batch_prepared", result = "success", batch, cantidad = size);
            }
            Event::BatchSent { batch, size } => {
                tracing::debug!(action = "batch_sent", result = "success", batch, cantidad = size);
            }
            Event::BatchConfirmed { batch, size } => {
                tracing::info!(action = "apuesta_enviada", result = "success", batch, cantidad = size);
            }
            Event::FinishedConfirmed { batches } => {
                tracing::info!(action = "finished_notification", result = "success", batches);
            }
            Event::QueryAttempt { attempt } => {
                tracing::debug!(action = "consulta_ganadores", result = "in_progress", attempt);
            }
            Event::QueryNotReady { attempt, message } => {
                tracing::info!(action = "consulta_ganadores", result = "not_ready", attempt, %message);
            }
            Event::QueryFailed { attempt, error } => {
                tracing::warn!(action = "consulta_ganadores", result = "fail", attempt, %error);
            }
            Event::Winners { attempt, count } => {
                tracing::info!(
                    action = "consulta_ganadores",
                    result = "success",
                    attempt,
                    cant_ganadores = count
                );
            }
            Event::Cancelled { phase } => {
                tracing::info!(action = "client_shutdown", result = "success", %phase);
            }
            Event::RunFailed { phase, error } => {
                tracing::error!(action = "client_run", result = "fail", %phase, %error);
            }
        }
    }
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Recorded events, in emission order.
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: Event) {
        (**self).emit(event);
    }
}
