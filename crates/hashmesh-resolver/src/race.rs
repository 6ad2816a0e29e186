//! Race-to-success combinator.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Every attempt of a race failed.
#[derive(Debug)]
pub struct RaceExhausted<E> {
    /// One entry per attempt, in completion order.
    pub failures: Vec<E>,
}

impl<E> RaceExhausted<E> {
    /// Number of attempts that took part.
    pub fn attempts(&self) -> usize {
        self.failures.len()
    }
}

/// Drive `attempts` concurrently and return the first success.
///
/// Fails only once every attempt has failed, which for an empty set is
/// immediately. Attempts still running when a winner is found are dropped.
pub async fn race_to_success<I, F, T, E>(attempts: I) -> Result<T, RaceExhausted<E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<F> = attempts.into_iter().collect();
    let total = pending.len();
    let mut failures = Vec::with_capacity(total);

    while let Some(outcome) = pending.next().await {
        match outcome {
            Ok(value) => return Ok(value),
            Err(err) => failures.push(err),
        }
    }

    debug_assert_eq!(failures.len(), total);
    Err(RaceExhausted { failures })
}
