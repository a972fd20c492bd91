// src/core/scanner/fanout.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::core::models::{SubdomainCandidate, TaskResult, VerificationResult};
use crate::core::scanner::confidence::score_confidence;
use crate::core::scanner::dns_verifier::{verify_candidate, DnsProbe};

/// Width of the verification pool when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 10;

/// Runs DNS verification over a batch of candidates with at most `workers` in flight.
#[derive(Clone)]
pub struct VerificationPool {
    probe: Arc<dyn DnsProbe>,
    workers: usize,
    query_timeout: Duration,
}

impl VerificationPool {
    pub fn new(probe: Arc<dyn DnsProbe>, workers: usize, query_timeout: Duration) -> Self {
        Self {
            probe,
            workers: workers.max(1),
            query_timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Submits one task per candidate and gathers their outcomes in completion order.
    ///
    /// A task that panics or is cancelled comes back as `Err(reason)`; it never aborts
    /// the rest of the batch.
    pub async fn run(&self, candidates: Vec<SubdomainCandidate>) -> Vec<TaskResult<VerificationResult>> {
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let submitted = candidates.len();

        for candidate in candidates {
            let permits = permits.clone();
            let probe = self.probe.clone();
            let timeout = self.query_timeout;

            tasks.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err(format!("worker pool closed: {}", e)),
                };
                Ok(verify_one(probe.as_ref(), candidate, timeout).await)
            });
        }

        let mut outcomes = Vec::with_capacity(submitted);
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.unwrap_or_else(|e| Err(format!("verification task failed: {}", e))));
        }

        debug!(submitted, collected = outcomes.len(), "Verification batch drained.");
        outcomes
    }

    /// Runs the batch, drops failed tasks and returns the survivors sorted by host.
    pub async fn verify_all(&self, candidates: Vec<SubdomainCandidate>) -> Vec<VerificationResult> {
        info!(candidates = candidates.len(), workers = self.workers, "Verifying DNS for candidates.");
        collect_verified(self.run(candidates).await)
    }
}

/// Verifies and scores a single candidate.
pub async fn verify_one(probe: &dyn DnsProbe, candidate: SubdomainCandidate, timeout: Duration) -> VerificationResult {
    let (resolves, records) = verify_candidate(probe, &candidate, timeout).await;
    let confidence = score_confidence(resolves, &candidate.host);

    VerificationResult {
        host: candidate.host,
        wildcard: candidate.wildcard,
        resolves,
        records,
        confidence,
    }
}

/// Keeps the successful outcomes, logging each failure, and sorts them by host.
pub fn collect_verified(outcomes: Vec<TaskResult<VerificationResult>>) -> Vec<VerificationResult> {
    let mut verified: Vec<VerificationResult> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            Ok(result) => Some(result),
            Err(reason) => {
                warn!(%reason, "Error verifying subdomain.");
                None
            }
        })
        .collect();

    verified.sort_by(|a, b| a.host.cmp(&b.host));
    verified
}
