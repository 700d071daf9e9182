//! Fixed-delay bounded retry.

use std::future::Future;
use std::time::Duration;

use crate::cancel::Cancel;
use crate::error::{Error, Result};

/// Outcome of a single attempt under a [`Retry`] policy.
#[derive(Debug)]
#[non_exhaustive]
pub enum Attempt<T> {
    /// The attempt succeeded; stop retrying.
    Done(T),
    /// The attempt failed in a way that may succeed later.
    Retry(Error),
}

impl<T> Attempt<T> {
    /// Classifies a result: retryable errors become [`Attempt::Retry`],
    /// everything else is passed through as fatal.
    pub fn from_result(res: Result<T>) -> Result<Self> {
        match res {
            Ok(v) => Ok(Self::Done(v)),
            Err(e) if e.is_retryable() => Ok(Self::Retry(e)),
            Err(e) => Err(e),
        }
    }
}

/// Bounded retry with a constant delay between attempts. No growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Retry {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl Retry {
    /// Creates a policy.
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Runs `op` until it returns [`Attempt::Done`], a fatal error, or the
    /// attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The delay between attempts
    /// is interrupted by `cancel`. Exhaustion yields [`Error::Exhausted`]
    /// carrying the last attempt's failure.
    pub async fn run<T, F, Fut>(&self, cancel: &Cancel, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Attempt<T>>>,
    {
        let mut last = None;
        for attempt in 1..=self.attempts {
            if attempt > 1 {
                cancel.sleep(self.delay).await?;
            }
            match op(attempt).await? {
                Attempt::Done(v) => return Ok(v),
                Attempt::Retry(reason) => last = Some(reason),
            }
        }
        let last = last.unwrap_or_else(|| Error::Config("retry policy allows no attempts".into()));
        Err(Error::Exhausted {
            attempts: self.attempts,
            last: Box::new(last),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn stops_on_first_success() {
        let calls = Cell::new(0);
        let policy = Retry::new(3, Duration::from_millis(1));
        let out = policy
            .run(&Cancel::new(), |n| {
                calls.set(calls.get() + 1);
                async move { Ok::<_, Error>(Attempt::Done(n)) }
            })
            .await
            .unwrap();
        assert_eq!(out, 1);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn exhausts_exact_budget_with_delay() {
        let calls = Cell::new(0);
        let policy = Retry::new(3, Duration::from_millis(30));
        let start = Instant::now();
        let err = policy
            .run(&Cancel::new(), |_| {
                calls.set(calls.get() + 1);
                async { Ok::<_, Error>(Attempt::<()>::Retry(Error::NotReady("later".into()))) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.get(), 3);
        assert!(start.elapsed() >= Duration::from_millis(60));
        match err {
            Error::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, Error::NotReady(_)));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn succeeds_on_last_attempt() {
        let policy = Retry::new(3, Duration::from_millis(1));
        let out = policy
            .run(&Cancel::new(), |n| async move {
                if n < 3 {
                    Ok::<_, Error>(Attempt::Retry(Error::NotReady("later".into())))
                } else {
                    Ok(Attempt::Done("drawn"))
                }
            })
            .await
            .unwrap();
        assert_eq!(out, "drawn");
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let calls = Cell::new(0);
        let policy = Retry::new(5, Duration::from_millis(1));
        let err = policy
            .run(&Cancel::new(), |_| {
                calls.set(calls.get() + 1);
                async { Err::<Attempt<()>, _>(Error::Config("bad".into())) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn cancel_during_delay_short_circuits() {
        let cancel = Cancel::new();
        let policy = Retry::new(3, Duration::from_secs(30));
        let start = Instant::now();
        let err = policy
            .run(&cancel, |_| {
                cancel.cancel();
                async { Ok::<_, Error>(Attempt::<()>::Retry(Error::NotReady("later".into()))) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn classifies_results() {
        assert!(matches!(
            Attempt::from_result(Ok::<_, Error>(1)),
            Ok(Attempt::Done(1))
        ));
        assert!(matches!(
            Attempt::<()>::from_result(Err(Error::NotReady("x".into()))),
            Ok(Attempt::Retry(_))
        ));
        assert!(matches!(
            Attempt::<()>::from_result(Err(Error::Cancelled)),
            Err(Error::Cancelled)
        ));
    }
}
