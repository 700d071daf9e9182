//! Shared lottery state: stored bets, finished agencies, the draw.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lotto_proto::{Batch, Bet, Message, Response, WinnersResponse};

/// Reply to a winners query that arrives before the draw.
pub const NOT_DRAWN: &str = "Lottery not completed yet, please try again";

/// Reply to a message only the server may send.
pub const INVALID_TYPE: &str = "Invalid message type";

/// Everything the server knows, shared by all connections.
#[derive(Debug)]
pub struct Lottery {
    /// Agencies that must finish before the draw.
    expected: usize,
    /// A bet wins when its number equals this.
    winning_number: u32,
    /// Mutable part.
    state: Mutex<State>,
}

/// Lottery state guarded by [`Lottery::state`].
#[derive(Debug, Default)]
struct State {
    /// Every bet received, in arrival order.
    bets: Vec<Bet>,
    /// Agencies that sent a finished notification.
    finished: HashSet<String>,
    /// Set once, when the last expected agency finishes.
    drawn: bool,
}

impl Lottery {
    /// Creates an empty lottery that draws once `expected` agencies finish.
    pub fn new(expected: usize, winning_number: u32) -> Self {
        Self {
            expected,
            winning_number,
            state: Mutex::default(),
        }
    }

    /// Answers one request.
    pub fn handle(&self, msg: Message) -> Message {
        match msg {
            Message::Batch(batch) => self.store(batch).into(),
            Message::FinishedNotification(n) => self.finish(n.agency).into(),
            Message::WinnersQuery(q) => self.winners(&q.agency),
            Message::Response(_) | Message::WinnersResponse(_) => {
                tracing::warn!(action = "receive_message", result = "fail", error = INVALID_TYPE);
                Response::fail(INVALID_TYPE).into()
            }
        }
    }

    /// Whether the draw has happened.
    pub fn is_drawn(&self) -> bool {
        self.lock().drawn
    }

    /// Number of bets stored so far.
    pub fn stored(&self) -> usize {
        self.lock().bets.len()
    }

    /// Appends a batch.
    fn store(&self, batch: Batch) -> Response {
        let count = batch.bets.len();
        self.lock().bets.extend(batch.bets);
        tracing::info!(
            action = "apuesta_recibida",
            result = "success",
            agency = %batch.agency,
            cantidad = count
        );
        Response::ok(format!("Batch of {count} bets stored successfully"))
    }

    /// Marks `agency` finished and draws when it was the last one.
    fn finish(&self, agency: String) -> Response {
        let mut state = self.lock();
        let message = format!("Agency {agency} finished notification received");
        if state.finished.insert(agency) {
            tracing::info!(
                action = "agency_finished",
                result = "success",
                finished_count = state.finished.len()
            );
            if !state.drawn && state.finished.len() >= self.expected {
                state.drawn = true;
                tracing::info!(action = "sorteo", result = "success", bets = state.bets.len());
            }
        }
        Response::ok(message)
    }

    /// Winning documents of `agency`, or not-drawn.
    fn winners(&self, agency: &str) -> Message {
        let state = self.lock();
        if !state.drawn {
            return Response::fail(NOT_DRAWN).into();
        }
        let winners: Vec<String> = state
            .bets
            .iter()
            .filter(|bet| bet.agency == agency && self.has_won(bet))
            .map(|bet| bet.document.clone())
            .collect();
        tracing::info!(
            action = "consulta_ganadores",
            result = "success",
            agency,
            cant_ganadores = winners.len()
        );
        WinnersResponse::new(winners).into()
    }

    /// Whether `bet` holds the winning number.
    fn has_won(&self, bet: &Bet) -> bool {
        bet.number.trim().parse::<u32>() == Ok(self.winning_number)
    }

    /// Locks the state; a poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use lotto_proto::{FinishedNotification, WinnersQuery};

    use super::*;

    fn bet(agency: &str, document: &str, number: &str) -> Bet {
        Bet::new(agency, "Ana", "Diaz", document, "1990-05-01", number)
    }

    fn finish(lottery: &Lottery, agency: &str) -> Message {
        lottery.handle(FinishedNotification::new(agency).into())
    }

    fn query(lottery: &Lottery, agency: &str) -> Message {
        lottery.handle(WinnersQuery::new(agency).into())
    }

    #[test]
    fn stores_batches() {
        let lottery = Lottery::new(1, 7574);
        let batch = Batch::new("1", vec![bet("1", "10", "1"), bet("1", "11", "2")]);
        let reply = lottery.handle(batch.into());
        assert_eq!(reply, Message::from(Response::ok("Batch of 2 bets stored successfully")));
        assert_eq!(lottery.stored(), 2);
    }

    #[test]
    fn draws_once_every_agency_finished() {
        let lottery = Lottery::new(2, 7574);
        assert_eq!(query(&lottery, "1"), Message::from(Response::fail(NOT_DRAWN)));

        finish(&lottery, "1");
        // A repeated notification does not count twice.
        let again = finish(&lottery, "1");
        assert!(matches!(again, Message::Response(Response { success: true, .. })));
        assert!(!lottery.is_drawn());

        finish(&lottery, "2");
        assert!(lottery.is_drawn());
    }

    #[test]
    fn winners_are_per_agency() {
        let lottery = Lottery::new(2, 7574);
        lottery.handle(
            Batch::new(
                "1",
                vec![bet("1", "100", "7574"), bet("1", "101", "12"), bet("1", "102", " 7574")],
            )
            .into(),
        );
        lottery.handle(Batch::new("2", vec![bet("2", "200", "7574")]).into());
        finish(&lottery, "1");
        finish(&lottery, "2");

        assert_eq!(
            query(&lottery, "1"),
            Message::from(WinnersResponse::new(vec!["100".into(), "102".into()]))
        );
        assert_eq!(query(&lottery, "2"), Message::from(WinnersResponse::new(vec!["200".into()])));
        assert_eq!(query(&lottery, "3"), Message::from(WinnersResponse::default()));
    }

    #[test]
    fn rejects_server_only_messages() {
        let lottery = Lottery::new(1, 7574);
        assert_eq!(
            lottery.handle(Response::ok("hi").into()),
            Message::from(Response::fail(INVALID_TYPE))
        );
        assert_eq!(
            lottery.handle(WinnersResponse::default().into()),
            Message::from(Response::fail(INVALID_TYPE))
        );
    }
}
