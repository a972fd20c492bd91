// src/core/scanner/extractor.rs

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::core::models::{CtEntry, QuickSubdomainList, SubdomainCandidate};
use crate::core::scanner::normalizer::normalize_logged;

/// Upper bound on CT rows consulted by the quick listing.
const QUICK_LIST_ROW_LIMIT: usize = 100;

/// Deduplicated candidates keyed by their normalized host.
///
/// Insertion is insert-if-absent: the first occurrence of a host wins and later duplicates
/// are dropped, never merged. Callers rely on this, so do not switch it to last-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    entries: HashMap<String, SubdomainCandidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `candidate` unless its host is already present. Returns whether it was added.
    pub fn insert_if_absent(&mut self, candidate: SubdomainCandidate) -> bool {
        if self.contains(&candidate.host) {
            return false;
        }
        self.entries.insert(candidate.host.clone(), candidate);
        true
    }

    pub fn contains(&self, host: &str) -> bool {
        self.entries.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the set. Order is unspecified; the pipeline sorts after verification.
    pub fn into_candidates(self) -> Vec<SubdomainCandidate> {
        self.entries.into_values().collect()
    }
}

/// Result of harvesting a CT payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Number of distinct non-empty lines seen before any filtering, malformed ones included.
    pub total_raw: usize,
    pub candidates: CandidateSet,
}

/// Splits every entry's `name_value` on newlines, counts the distinct raw lines and keeps the
/// lines that normalize to an in-scope hostname.
pub fn extract_candidates(entries: &[CtEntry], domain: &str) -> Extraction {
    let mut raw_lines: HashSet<&str> = HashSet::new();
    let mut candidates = CandidateSet::new();

    for entry in entries {
        let Some(name_value) = entry.name_value.as_deref() else {
            continue;
        };

        for line in name_value.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
            raw_lines.insert(line);

            if let Some(candidate) = normalize_logged(line, domain) {
                if !candidates.insert_if_absent(candidate) {
                    debug!(line, "Duplicate CT candidate dropped.");
                }
            }
        }
    }

    info!(domain, total_raw = raw_lines.len(), total_clean = candidates.len(), "Extracted CT candidates.");
    Extraction { total_raw: raw_lines.len(), candidates }
}

/// Builds the quick, unverified listing: the first line of each of the first rows whose
/// `name_value` mentions the domain, lowercased, deduplicated and sorted.
pub fn quick_list(entries: &[CtEntry], domain: &str) -> QuickSubdomainList {
    let subdomains: BTreeSet<String> = entries
        .iter()
        .take(QUICK_LIST_ROW_LIMIT)
        .filter_map(|entry| entry.name_value.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty() && name.contains(domain))
        .filter_map(|name| name.split('\n').next())
        .map(str::to_lowercase)
        .collect();

    QuickSubdomainList {
        domain: domain.to_string(),
        count: subdomains.len(),
        subdomains: subdomains.into_iter().collect(),
    }
}
