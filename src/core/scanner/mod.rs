// src/core/scanner/mod.rs

// Every stage of the subdomain pipeline lives in its own module; this file wires them
// together behind `SubdomainScanner`.
pub mod confidence;
pub mod ct_source;
pub mod dns_lookup;
pub mod dns_verifier;
pub mod extractor;
pub mod fanout;
pub mod normalizer;

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core::cache::{cache_key, ResultCache};
use crate::core::models::{CacheEntry, QuickSubdomainList, SubdomainReport};
use self::ct_source::{CtFetchError, CtLogSource};
use self::extractor::{extract_candidates, quick_list};
use self::fanout::VerificationPool;

/// Certificate-transparency subdomain enumeration with DNS verification and caching.
///
/// A request runs: cache lookup, CT fetch, candidate extraction, bounded DNS verification,
/// report assembly, cache write. Concurrent requests for the same domain are not
/// coalesced; each may run the full pipeline and overwrite the cache entry.
#[derive(Clone)]
pub struct SubdomainScanner {
    source: Arc<dyn CtLogSource>,
    pool: VerificationPool,
    cache: Arc<dyn ResultCache>,
    ttl: chrono::Duration,
}

impl SubdomainScanner {
    pub fn new(
        source: Arc<dyn CtLogSource>,
        pool: VerificationPool,
        cache: Arc<dyn ResultCache>,
        ttl: chrono::Duration,
    ) -> Self {
        Self { source, pool, cache, ttl }
    }

    /// Returns the report for `domain`, served from cache while it is fresh.
    ///
    /// `domain` must already be sanitized. Only a CT fetch failure is an error; DNS and
    /// cache problems degrade silently.
    pub async fn enumerate(&self, domain: &str) -> Result<SubdomainReport, CtFetchError> {
        let key = cache_key(domain);

        if let Some(entry) = self.cache.get(&key).await {
            if entry.is_fresh(Utc::now(), self.ttl) {
                info!(domain, "Returning cached results.");
                return Ok(entry.data);
            }
            info!(domain, written = %entry.timestamp, "Cached results are stale.");
        }

        let report = self.scan(domain).await?;
        self.cache.put(&key, CacheEntry::new(report.clone(), Utc::now())).await;
        info!(domain, total_clean = report.total_clean, "Completed subdomain enumeration.");
        Ok(report)
    }

    /// Runs the uncached pipeline.
    pub async fn scan(&self, domain: &str) -> Result<SubdomainReport, CtFetchError> {
        let entries = self.source.fetch(domain).await?;
        let extraction = extract_candidates(&entries, domain);
        let verified = self.pool.verify_all(extraction.candidates.into_candidates()).await;
        Ok(SubdomainReport::new(domain, extraction.total_raw, verified))
    }

    /// Unverified, uncached listing straight from the CT rows.
    pub async fn quick_list(&self, domain: &str) -> Result<QuickSubdomainList, CtFetchError> {
        let entries = self.source.fetch(domain).await?;
        Ok(quick_list(&entries, domain))
    }
}
