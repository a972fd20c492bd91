// src/core/scanner/dns_lookup.rs

use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::RecordType;
use tracing::{debug, info, warn};

use crate::core::models::DnsLookupReport;

/// Record types reported by the plain lookup, in response order.
const LOOKUP_TYPES: [RecordType; 5] = [
    RecordType::A,
    RecordType::MX,
    RecordType::NS,
    RecordType::TXT,
    RecordType::CNAME,
];

/// Overall budget for each record type.
const LOOKUP_LIFETIME: Duration = Duration::from_secs(5);

/// How a single record-type lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    NotFound,
    NoAnswer,
    Timeout,
    Other(String),
}

impl LookupFailure {
    pub fn from_error(err: &ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } if *response_code == ResponseCode::NXDomain => {
                LookupFailure::NotFound
            }
            ResolveErrorKind::NoRecordsFound { .. } => LookupFailure::NoAnswer,
            ResolveErrorKind::Timeout => LookupFailure::Timeout,
            _ => LookupFailure::Other(err.to_string()),
        }
    }

    /// The `_warnings` line for this failure; "no answer" is not worth a warning.
    pub fn warning(&self, record_type: RecordType) -> Option<String> {
        match self {
            LookupFailure::NotFound => Some(format!("{}: Domain not found", record_type)),
            LookupFailure::NoAnswer => None,
            LookupFailure::Timeout => Some(format!("{}: Query timeout", record_type)),
            LookupFailure::Other(e) => Some(format!("{}: {}", record_type, e)),
        }
    }
}

/// Looks up A, MX, NS, TXT and CNAME records for `domain`.
///
/// Every type always appears in the report; a failed lookup leaves an empty list and may
/// add a line to `warnings`.
pub async fn run_dns_lookup(domain: &str) -> DnsLookupReport {
    run_dns_lookup_with(ResolverConfig::default(), domain, LOOKUP_LIFETIME).await
}

/// [`run_dns_lookup`] against the given nameservers with a custom per-type budget.
pub async fn run_dns_lookup_with(config: ResolverConfig, domain: &str, lifetime: Duration) -> DnsLookupReport {
    info!(domain, "Starting DNS record lookup.");

    let mut opts = ResolverOpts::default();
    opts.timeout = lifetime;
    opts.attempts = 1;
    let resolver = TokioAsyncResolver::tokio(config, opts);

    let mut report = DnsLookupReport::default();
    for record_type in LOOKUP_TYPES {
        let outcome = tokio::time::timeout(lifetime, resolver.lookup(domain, record_type)).await;
        let failure = match outcome {
            Ok(Ok(lookup)) => {
                let values: Vec<String> = lookup.iter().map(|r| r.to_string()).collect();
                debug!(%record_type, count = values.len(), "Records found.");
                report.records.insert(record_type.to_string(), values);
                continue;
            }
            Ok(Err(e)) => LookupFailure::from_error(&e),
            Err(_) => LookupFailure::Timeout,
        };

        warn!(domain, %record_type, ?failure, "Record lookup failed.");
        report.records.insert(record_type.to_string(), Vec::new());
        if let Some(line) = failure.warning(record_type) {
            report.warnings.push(line);
        }
    }

    info!(warnings = report.warnings.len(), "DNS record lookup finished.");
    report
}
