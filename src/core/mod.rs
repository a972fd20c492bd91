// src/core/mod.rs

/// Data structures shared across the pipeline and the HTTP surface, such as
/// `SubdomainReport`, `VerificationResult` and `CacheEntry`.
pub mod models;

/// The subdomain enumeration pipeline and the plain DNS lookup.
pub mod scanner;

/// Time-boxed persistence of finished reports.
pub mod cache;
