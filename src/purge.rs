use tracing::{error, info, warn};

use crate::confirm::{Confirm, Decision};
use crate::drain::{drain_container, BatchOutcome, DEFAULT_CONCURRENCY};
use crate::error::PurgeError;
use crate::gateway::SharedGateway;


/// What happened to a single bucket during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerOutcome {
    /// name does not start with the requested prefix
    Skipped,
    Declined,
    Removed(BatchOutcome),
    DrainFailed(String),
    RemoveFailed { outcome: BatchOutcome, error: String },
}

#[derive(Debug, Default)]
pub struct PurgeReport {
    pub containers: Vec<(String, ContainerOutcome)>,
}

impl PurgeReport {
    pub fn outcome(&self, container: &str) -> Option<&ContainerOutcome> {
        self.containers.iter()
            .find(|(name, _)| name == container)
            .map(|(_, outcome)| outcome)
    }

    pub fn removed(&self) -> usize {
        self.count(|o| matches!(o, ContainerOutcome::Removed(_)))
    }

    pub fn declined(&self) -> usize {
        self.count(|o| matches!(o, ContainerOutcome::Declined))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ContainerOutcome::DrainFailed(_) | ContainerOutcome::RemoveFailed { .. }))
    }

    fn count(&self, pred: impl Fn(&ContainerOutcome) -> bool) -> usize {
        self.containers.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Walks all buckets once, asks for confirmation and empties and removes the confirmed ones.
pub struct Purger<C> {
    gateway: SharedGateway,
    gate: C,
    concurrency: usize,
    prefix: Option<String>,
}

impl<C: Confirm> Purger<C> {
    pub fn new(gateway: SharedGateway, gate: C) -> Self {
        Self {
            gateway,
            gate,
            concurrency: DEFAULT_CONCURRENCY,
            prefix: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn into_gate(self) -> C {
        self.gate
    }

    /// Only a failure to list the buckets is returned as error. Failures on a
    /// single bucket are reported and the run continues with the next one.
    pub async fn run(&mut self) -> Result<PurgeReport, PurgeError> {
        let buckets = self.gateway.list_containers().await.map_err(PurgeError::Enumeration)?;
        info!(count = buckets.len(), "listed buckets");

        let mut report = PurgeReport::default();
        for bucket in buckets {
            println!("Found bucket: {}", bucket.name);
            let outcome = self.process(&bucket.name).await;
            report.containers.push((bucket.name, outcome));
        }

        println!("{} bucket(s) removed, {} declined, {} failed",
            report.removed(), report.declined(), report.failed());
        Ok(report)
    }

    async fn process(&mut self, bucket_name: &str) -> ContainerOutcome {
        if let Some(prefix) = &self.prefix {
            if !bucket_name.starts_with(prefix.as_str()) {
                println!("Bucket with name {bucket_name} does not have the expected prefix.");
                return ContainerOutcome::Skipped;
            }
        }

        if self.gate.confirm(bucket_name) == Decision::Decline {
            println!("Bucket deletion canceled.");
            return ContainerOutcome::Declined;
        }

        println!("Deleting all objects from bucket {bucket_name}...");
        let outcome = match drain_container(&self.gateway, bucket_name, self.concurrency).await {
            Ok(outcome) => outcome,
            Err(err) => {
                println!("{err}");
                return ContainerOutcome::DrainFailed(err.to_string());
            }
        };
        if outcome.is_complete() {
            println!("Successfully deleted all {} objects from the bucket.", outcome.deleted);
        } else {
            warn!(bucket = bucket_name, failed = outcome.failed.len(), "some objects could not be deleted");
            println!("Deleted {} objects, {} could not be deleted.", outcome.deleted, outcome.failed.len());
        }

        println!("Deleting bucket {bucket_name}...");
        match self.gateway.delete_container(bucket_name).await {
            Ok(()) => {
                info!(bucket = bucket_name, deleted = outcome.deleted, "bucket removed");
                println!("Successfully deleted the bucket.");
                ContainerOutcome::Removed(outcome)
            }
            Err(source) => {
                let err = PurgeError::ContainerDelete { container: bucket_name.to_owned(), source };
                error!(bucket = bucket_name, "{err}");
                println!("{err}");
                ContainerOutcome::RemoveFailed { outcome, error: err.to_string() }
            }
        }
    }
}
