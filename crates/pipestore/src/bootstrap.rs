//! Deadline-bounded connection bootstrap
//!
//! The connect sequence runs as its own task and reports over a oneshot
//! channel while the caller waits on the deadline. Whichever happens first
//! decides the outcome.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::persistence::StoreError;

/// Run `connect` in a background task and wait at most `timeout` for it
///
/// - If the task reports first, its result is returned, success or failure.
///   When the report and the deadline are ready together the report wins.
/// - If the deadline fires first, the task is aborted so a late connection
///   is dropped rather than leaked, and [`StoreError::Timeout`] is returned.
pub async fn connect_with_deadline<T, F>(timeout: Duration, connect: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    let deadline = Instant::now() + timeout;
    let (notify_tx, notify_rx) = oneshot::channel();

    let handshake = tokio::spawn(async move {
        let outcome = connect.await;
        // Nobody is listening once the deadline has fired
        let _ = notify_tx.send(outcome);
    });

    tokio::select! {
        biased;

        outcome = notify_rx => match outcome {
            Ok(outcome) => {
                debug!(success = outcome.is_ok(), "connection handshake finished");
                outcome
            }
            Err(_) => Err(StoreError::Unavailable(
                "connection task exited without reporting".to_string(),
            )),
        },
        _ = sleep_until(deadline) => {
            handshake.abort();
            warn!(?timeout, "connection handshake timed out");
            Err(StoreError::Timeout(timeout))
        }
    }
}
