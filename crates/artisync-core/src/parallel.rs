//! Fan-out/fan-in over a collection.
//!
//! [`run_parallel`] spawns one Tokio task per item and joins all of them.
//! There is no cancellation: once a unit is dispatched it always runs to
//! completion, even after a sibling has failed. A failure only changes what is
//! reported. Errors travel through an mpsc channel and the first one to
//! *arrive* becomes the result, so with several failures the reported one
//! depends on timing, not on item order.

use std::fmt::Display;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinError;

/// Run `task` concurrently over every element of `items` and wait for all of
/// them. Returns the first error observed, if any; later errors are logged at
/// debug level and dropped. A unit that panics counts as a failure.
///
/// `task` is called on the current task to build each unit's future, so only
/// the futures it returns need to be `Send + 'static`.
pub async fn run_parallel<I, T, F, Fut, E>(items: I, task: F) -> Result<(), E>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + From<JoinError> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<E>();

    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let tx = tx.clone();
            let unit = task(item);
            tokio::spawn(async move {
                if let Err(e) = unit.await {
                    // Receiver outlives every sender; send cannot fail here.
                    let _ = tx.send(e);
                }
            })
        })
        .collect();
    // The channel closes once every unit has dropped its sender.
    drop(tx);

    let mut first: Option<E> = None;
    while let Some(err) = rx.recv().await {
        if first.is_none() {
            first = Some(err);
        } else {
            tracing::debug!(error = %err, "discarding additional parallel failure");
        }
    }

    for handle in handles {
        if let Err(join_err) = handle.await {
            tracing::warn!(error = %join_err, "parallel unit panicked");
            if first.is_none() {
                first = Some(E::from(join_err));
            }
        }
    }

    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
