// src/core/scanner/dns_verifier.rs

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RecordType;
use tracing::debug;

use crate::core::models::{RecordKind, SubdomainCandidate};

/// Per-query timeout used when nothing else is configured.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(500);

/// A DNS resolver able to answer one record type for one host.
///
/// `Ok(())` means at least one record of `kind` exists; any error (NXDOMAIN, no answer,
/// timeout, transport failure) is reported as `Err` with a description.
#[async_trait]
pub trait DnsProbe: Send + Sync {
    async fn resolve(&self, host: &str, kind: RecordKind, timeout: Duration) -> Result<(), String>;
}

/// Maps the verifier's record kinds onto hickory's record types.
pub fn record_type(kind: RecordKind) -> RecordType {
    match kind {
        RecordKind::A => RecordType::A,
        RecordKind::Aaaa => RecordType::AAAA,
        RecordKind::Cname => RecordType::CNAME,
    }
}

/// [`DnsProbe`] backed by hickory. Every call builds its own resolver so attempts share no
/// cache or connection state.
#[derive(Debug, Clone, Default)]
pub struct HickoryProbe {
    config: ResolverConfig,
}

impl HickoryProbe {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DnsProbe for HickoryProbe {
    async fn resolve(&self, host: &str, kind: RecordKind, timeout: Duration) -> Result<(), String> {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        let resolver = TokioAsyncResolver::tokio(self.config.clone(), opts);

        match tokio::time::timeout(timeout, resolver.lookup(host, record_type(kind))).await {
            Ok(Ok(lookup)) if lookup.iter().next().is_some() => Ok(()),
            Ok(Ok(_)) => Err("empty answer".to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", timeout)),
        }
    }
}

/// Verifies one candidate: A, then AAAA, then CNAME, each attempt independent.
///
/// Wildcards return `(false, [])` without issuing a query. A failed attempt only means
/// that record type is absent. `resolves` is true iff any attempt succeeded.
pub async fn verify_candidate(
    probe: &dyn DnsProbe,
    candidate: &SubdomainCandidate,
    timeout: Duration,
) -> (bool, Vec<RecordKind>) {
    if candidate.wildcard {
        debug!(host = %candidate.host, "Skipping DNS verification for wildcard.");
        return (false, Vec::new());
    }

    let mut records = Vec::new();
    for kind in RecordKind::ATTEMPT_ORDER {
        match probe.resolve(&candidate.host, kind, timeout).await {
            Ok(()) => {
                if !records.contains(&kind) {
                    records.push(kind);
                }
            }
            Err(reason) => debug!(host = %candidate.host, %kind, %reason, "Record lookup failed."),
        }
    }

    (!records.is_empty(), records)
}
