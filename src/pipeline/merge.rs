//! Fan-in of many streams into one.

use tokio::task::JoinSet;
use tracing::warn;

use super::{ResultStream, channel};

/// Combine `inputs` into a single stream.
///
/// Each input gets its own forwarding task, so a slow input never holds back
/// results that are already available on another one. Order within one
/// input is preserved; there is no ordering across inputs.
///
/// The output closes once every forwarder has finished, i.e. once every input
/// has closed. With no inputs the output is closed immediately.
#[must_use]
pub fn merge(inputs: Vec<ResultStream>) -> ResultStream {
    let (tx, rx) = channel();
    let mut forwarders = JoinSet::new();

    for mut input in inputs {
        let tx = tx.clone();
        forwarders.spawn(async move {
            while let Some(result) = input.recv().await {
                if tx.send(result).await.is_err() {
                    break;
                }
            }
        });
    }

    tokio::spawn(async move {
        while let Some(joined) = forwarders.join_next().await {
            if let Err(e) = joined {
                warn!("[merge] forwarder failed: {e}");
            }
        }
        drop(tx);
    });

    rx
}
