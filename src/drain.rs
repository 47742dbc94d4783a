use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, error, warn};

use crate::error::{GatewayResult, PurgeError};
use crate::gateway::SharedGateway;


/// Default number of deletes that may be in flight for one bucket.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Result of emptying one bucket. Failed keys do not make the drain fail.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub deleted: usize,
    pub failed: Vec<String>,
}

impl BatchOutcome {
    pub fn attempted(&self) -> usize {
        self.deleted + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, container: &str, key: String, result: GatewayResult<()>) {
        match result {
            Ok(()) => self.deleted += 1,
            Err(source) => {
                let err = PurgeError::ItemDelete { container: container.to_owned(), key: key.clone(), source };
                warn!(bucket = container, key = %key, "{err}");
                self.failed.push(key);
            }
        }
    }
}

type DeleteResult = (String, GatewayResult<()>);


/// Delete every object of `container`, with at most `concurrency` deletes running at once.
///
/// Pages are fetched one after the other; the permit pool, not page completion, throttles
/// the deletes, so deletes of the previous page may still run while the next page is
/// fetched. Listing stops on an empty page or when no continuation token is returned.
/// Returns after every dispatched delete has finished, also when listing a page fails.
pub async fn drain_container(
    gateway: &SharedGateway,
    container: &str,
    concurrency: usize,
) -> Result<BatchOutcome, PurgeError> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight: JoinSet<DeleteResult> = JoinSet::new();
    let mut outcome = BatchOutcome::default();
    let mut cursor: Option<String> = None;
    let mut page_nr = 0_usize;

    loop {
        page_nr += 1;
        let page = match gateway.list_items(container, cursor.take()).await {
            Ok(page) => page,
            Err(source) => {
                join_all(container, &mut in_flight, &mut outcome).await;
                error!(bucket = container, page = page_nr, "listing objects failed: {source}");
                return Err(PurgeError::PageList { container: container.to_owned(), source });
            }
        };
        debug!(bucket = container, page = page_nr, count = page.items.len(), "received page");
        if page.items.is_empty() {
            break;
        }

        for item in page.items {
            // acquire_owned only fails once the semaphore is closed, and this pool is never closed
            let permit = match Arc::clone(&permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    join_all(container, &mut in_flight, &mut outcome).await;
                    return Err(PurgeError::PermitsClosed { container: container.to_owned() });
                }
            };
            let gateway = Arc::clone(gateway);
            let bucket = container.to_owned();
            in_flight.spawn(async move {
                let result = gateway.delete_item(&bucket, &item.key).await;
                drop(permit);
                (item.key, result)
            });

            // collect what already finished, so results do not pile up in the set
            while let Some(joined) = in_flight.try_join_next() {
                collect(container, joined, &mut outcome);
            }
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    join_all(container, &mut in_flight, &mut outcome).await;
    debug!(bucket = container, deleted = outcome.deleted, failed = outcome.failed.len(), "drain finished");
    Ok(outcome)
}

async fn join_all(container: &str, in_flight: &mut JoinSet<DeleteResult>, outcome: &mut BatchOutcome) {
    while let Some(joined) = in_flight.join_next().await {
        collect(container, joined, outcome);
    }
}

fn collect(container: &str, joined: Result<DeleteResult, tokio::task::JoinError>, outcome: &mut BatchOutcome) {
    match joined {
        Ok((key, result)) => outcome.record(container, key, result),
        // the permit is released on unwind, the key is lost with the task
        Err(err) => error!(bucket = container, "delete task did not complete: {err}"),
    }
}
