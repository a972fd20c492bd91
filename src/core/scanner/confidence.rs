// src/core/scanner/confidence.rs

use crate::core::models::Confidence;

/// Assigns a confidence label from the resolution outcome and the hostname shape.
///
/// * Wildcards are always `Medium`: seen in CT but not queryable.
/// * Anything that resolves is `High`.
/// * A non-resolving host whose first label is all digits is `Low`; numeric labels are
///   mostly CT noise.
/// * Everything else is `Medium`.
pub fn score_confidence(resolves: bool, host: &str) -> Confidence {
    if host.starts_with("*.") {
        return Confidence::Medium;
    }
    if resolves {
        return Confidence::High;
    }

    let first_label = host.split('.').next().unwrap_or_default();
    if !first_label.is_empty() && first_label.chars().all(|c| c.is_ascii_digit()) {
        return Confidence::Low;
    }

    Confidence::Medium
}
