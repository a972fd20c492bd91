// src/app.rs

use std::sync::Arc;
use std::time::Instant;

use hickory_resolver::config::ResolverConfig;

use crate::config::ServerConfig;
use crate::core::cache::{JsonFileCache, ResultCache};
use crate::core::scanner::SubdomainScanner;
use crate::core::scanner::ct_source::{CrtShSource, CtFetchError, CtLogSource};
use crate::core::scanner::dns_verifier::{DnsProbe, HickoryProbe};
use crate::core::scanner::fanout::VerificationPool;

/// State shared by every request handler.
pub struct AppState {
    pub config: ServerConfig,
    pub scanner: SubdomainScanner,
    pub started: Instant,
}

impl AppState {
    /// Wires the given collaborators according to `config`.
    pub fn new(
        config: ServerConfig,
        source: Arc<dyn CtLogSource>,
        probe: Arc<dyn DnsProbe>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        let pool = VerificationPool::new(probe, config.workers, config.dns_timeout());
        let scanner = SubdomainScanner::new(source, pool, cache, config.cache_ttl());
        Self {
            config,
            scanner,
            started: Instant::now(),
        }
    }

    /// Production wiring: crt.sh, hickory and the JSON file cache.
    pub fn from_config(config: ServerConfig) -> Result<Self, CtFetchError> {
        let source = Arc::new(CrtShSource::new(&config.ct_base_url, config.ct_timeout())?);
        let probe = Arc::new(HickoryProbe::new(ResolverConfig::default()));
        let cache = Arc::new(JsonFileCache::new(config.cache_file.clone()));
        Ok(Self::new(config, source, probe, cache))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
