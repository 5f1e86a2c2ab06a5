use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::info;

/// Outcome of [`drain_with_backoff`].
#[derive(Debug)]
pub struct Drained<T, R> {
    /// Everything the operation produced across all attempts.
    pub produced: Vec<R>,
    /// Work still pending after the last attempt. Empty on full success.
    pub leftover: Vec<T>,
}

/// Repeatedly hands `pending` work to `operation` until nothing is left over.
///
/// `operation` returns what it produced plus whatever it could not process.
/// Leftovers are resubmitted after a Fibonacci delay, at most `max_retries`
/// times. An `Err` from `operation` is returned immediately.
pub async fn drain_with_backoff<T, R, E, Fut, F>(
    mut pending: Vec<T>,
    mut operation: F,
    initial_delay: Duration,
    max_retries: usize,
) -> Result<Drained<T, R>, E>
where
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<(Vec<R>, Vec<T>), E>>,
{
    let mut produced = Vec::new();
    let mut retries = 0;
    let mut fib = (initial_delay, initial_delay);

    loop {
        let (mut batch, leftover) = operation(pending).await?;
        produced.append(&mut batch);

        if leftover.is_empty() || retries >= max_retries {
            return Ok(Drained { produced, leftover });
        }

        info!(
            "{} entries unprocessed. Retrying in {:?} (attempt {}/{})",
            leftover.len(),
            fib.0,
            retries + 1,
            max_retries
        );
        sleep(fib.0).await;
        retries += 1;
        fib = (fib.1, fib.0 + fib.1);
        pending = leftover;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_leftovers_are_resubmitted_until_done() {
        let mut calls = Vec::new();
        let drained = drain_with_backoff(
            vec![1, 2, 3, 4],
            |batch: Vec<i32>| {
                calls.push(batch.len());
                // process one entry per attempt
                let (head, tail) = batch.split_at(1);
                let result: Result<_, ()> = Ok((head.to_vec(), tail.to_vec()));
                async move { result }
            },
            Duration::from_millis(1),
            5,
        )
        .await
        .unwrap();

        assert_eq!(drained.produced, vec![1, 2, 3, 4]);
        assert!(drained.leftover.is_empty());
        assert_eq!(calls, vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let drained = drain_with_backoff(
            vec!["a", "b"],
            |batch: Vec<&str>| async move { Ok::<_, ()>((Vec::<()>::new(), batch)) },
            Duration::from_millis(1),
            2,
        )
        .await
        .unwrap();

        assert!(drained.produced.is_empty());
        assert_eq!(drained.leftover, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_error_stops_immediately() {
        let result = drain_with_backoff(
            vec![1],
            |_batch: Vec<i32>| async { Err::<(Vec<i32>, Vec<i32>), _>("boom") },
            Duration::from_millis(1),
            3,
        )
        .await;
        assert_eq!(result.unwrap_err(), "boom");
    }
}
