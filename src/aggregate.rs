//! Fan-out existence checks with a single, deterministic outcome.

use anyhow::Result;
use futures_util::future::join_all;
use log::debug;
use std::future::Future;

/// Run `check` for every item at once and keep the items it accepts.
///
/// All checks are started before any is awaited, and every check is allowed
/// to finish even after one has failed. Items whose check returns `Ok(false)`
/// are dropped. If any check fails, the error of the earliest failing item
/// (by input position) is returned and the accepted items are discarded.
/// Accepted items keep their input order.
pub async fn run_all<T, F, Fut>(items: Vec<T>, check: F) -> Result<Vec<T>>
where
    F: Fn(&T) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let outcomes = join_all(items.iter().map(&check)).await;
    debug!("{} check(s) completed", outcomes.len());

    let mut accepted = Vec::with_capacity(items.len());
    for (item, outcome) in items.into_iter().zip(outcomes) {
        match outcome {
            Ok(true) => accepted.push(item),
            Ok(false) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(accepted)
}
