// src/core/models.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// --- Reusable Result Types ---

/// Outcome of a single verification task. A task that fails unexpectedly carries the
/// reason as a string and is filtered out by the aggregator.
pub type TaskResult<T> = Result<T, String>;

// --- Certificate Transparency Models ---

/// One row returned by the certificate transparency source. Only `name_value` is read;
/// every other column (issuer, serial, timestamps) is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CtEntry {
    #[serde(default)]
    pub name_value: Option<String>,
}

impl CtEntry {
    pub fn new(name_value: &str) -> Self {
        Self { name_value: Some(name_value.to_string()) }
    }
}

// --- Subdomain Models ---

/// A DNS record type attempted during verification, in attempt order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RecordKind {
    A,
    Aaaa,
    Cname,
}

impl RecordKind {
    /// The attempt order used by the verifier: A, then AAAA, then CNAME.
    pub const ATTEMPT_ORDER: [RecordKind; 3] = [RecordKind::A, RecordKind::Aaaa, RecordKind::Cname];
}

/// Qualitative trust signal attached to every discovered hostname.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A cleaned hostname harvested from the CT logs. The `host` string is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubdomainCandidate {
    pub host: String,
    pub wildcard: bool,
}

impl SubdomainCandidate {
    pub fn new(host: &str, wildcard: bool) -> Self {
        Self { host: host.to_string(), wildcard }
    }
}

/// A candidate after DNS verification and confidence scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResult {
    pub host: String,
    pub wildcard: bool,
    pub resolves: bool,
    pub records: Vec<RecordKind>,
    pub confidence: Confidence,
}

/// The unit returned to callers and persisted in the result cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubdomainReport {
    pub domain: String,
    pub total_raw: usize,
    pub total_clean: usize,
    pub subdomains: Vec<VerificationResult>,
}

impl SubdomainReport {
    /// Builds a report from verified results. `total_clean` always mirrors the list length.
    pub fn new(domain: &str, total_raw: usize, subdomains: Vec<VerificationResult>) -> Self {
        Self {
            domain: domain.to_string(),
            total_raw,
            total_clean: subdomains.len(),
            subdomains,
        }
    }

    /// The zeroed shape sent alongside an upstream failure.
    pub fn empty(domain: &str) -> Self {
        Self::new(domain, 0, Vec::new())
    }
}

/// Body of a failed enumeration: the zeroed report plus the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedReport {
    #[serde(flatten)]
    pub report: SubdomainReport,
    pub error: String,
}

// --- Cache Models ---

/// A persisted report together with the moment it was produced.
///
/// The timestamp is the raw ISO-8601 string as stored; an unreadable one makes the entry
/// stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub timestamp: String,
    pub data: SubdomainReport,
}

impl CacheEntry {
    pub fn new(data: SubdomainReport, now: DateTime<Utc>) -> Self {
        Self { timestamp: now.to_rfc3339(), data }
    }

    /// Parses the stored timestamp. Offset-less ISO timestamps are read as UTC.
    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// An entry is fresh while `now - timestamp < ttl`. Unparsable timestamps are stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        match self.written_at() {
            Some(written) => now.signed_duration_since(written) < ttl,
            None => false,
        }
    }
}

// --- Auxiliary Endpoint Models ---

/// Response of the quick, unverified subdomain listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuickSubdomainList {
    pub domain: String,
    pub count: usize,
    pub subdomains: Vec<String>,
}

/// Response of the plain DNS record lookup. Record types are flattened into the top level
/// (`"A": [...]`, `"MX": [...]`) next to an optional `_warnings` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsLookupReport {
    #[serde(flatten)]
    pub records: BTreeMap<String, Vec<String>>,
    #[serde(rename = "_warnings", default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_report() -> SubdomainReport {
        SubdomainReport::new(
            "example.com",
            2,
            vec![VerificationResult {
                host: "www.example.com".to_string(),
                wildcard: false,
                resolves: true,
                records: vec![RecordKind::A, RecordKind::Aaaa],
                confidence: Confidence::High,
            }],
        )
    }

    #[test]
    fn report_serializes_with_wire_names() {
        let json = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(json["total_clean"], 1);
        assert_eq!(json["subdomains"][0]["records"], serde_json::json!(["A", "AAAA"]));
        assert_eq!(json["subdomains"][0]["confidence"], "high");
    }

    #[test]
    fn record_kind_display_matches_wire_name() {
        assert_eq!(RecordKind::Cname.to_string(), "CNAME");
        assert_eq!("AAAA".parse::<RecordKind>().unwrap(), RecordKind::Aaaa);
        assert_eq!(Confidence::Medium.to_string(), "medium");
    }

    #[test]
    fn failed_report_flattens_zeroed_shape() {
        let body = FailedReport {
            report: SubdomainReport::empty("example.com"),
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["total_raw"], 0);
        assert_eq!(json["subdomains"], serde_json::json!([]));
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn cache_entry_freshness_boundary() {
        let written = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entry = CacheEntry::new(sample_report(), written);
        let ttl = chrono::Duration::hours(24);

        let almost = written + chrono::Duration::hours(23) + chrono::Duration::minutes(59);
        let past = written + chrono::Duration::hours(24) + chrono::Duration::minutes(1);
        assert!(entry.is_fresh(almost, ttl));
        assert!(!entry.is_fresh(past, ttl));
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let entry = CacheEntry {
            timestamp: "2024-05-01T12:00:00.123456".to_string(),
            data: sample_report(),
        };
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        assert!(entry.is_fresh(now, chrono::Duration::hours(24)));
    }

    #[test]
    fn garbage_timestamp_is_stale() {
        let entry = CacheEntry { timestamp: "yesterday-ish".to_string(), data: sample_report() };
        assert!(!entry.is_fresh(Utc::now(), chrono::Duration::hours(24)));
    }

    #[test]
    fn dns_lookup_report_omits_empty_warnings() {
        let mut report = DnsLookupReport::default();
        report.records.insert("A".to_string(), vec!["93.184.216.34".to_string()]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["A"][0], "93.184.216.34");
        assert!(json.get("_warnings").is_none());
    }
}
