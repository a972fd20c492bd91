// src/core/scanner/normalizer.rs

use once_cell::sync::Lazy;
use regex::Regex;
use strum::Display;
use tracing::debug;
use url::{Host, Url};

use crate::core::models::SubdomainCandidate;

/// Maximum length of a full hostname.
const MAX_HOSTNAME_LEN: usize = 253;

/// RFC-1123 hostname shape: dot-separated labels of 1-63 alphanumerics with internal hyphens.
/// The overall length is checked separately since the regex engine has no lookahead.
static RE_HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*$").unwrap()
});

/// Why a raw CT line was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Discard {
    /// Whitespace, `@` or `" - "` artifacts of a malformed CT entry.
    #[strum(serialize = "invalid entry")]
    Malformed,
    #[strum(serialize = "non-hostname pattern")]
    NotHostname,
    #[strum(serialize = "non-subdomain")]
    OutOfScope,
}

/// Returns true when `value` is a syntactically valid hostname.
pub fn is_valid_hostname(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_HOSTNAME_LEN && RE_HOSTNAME.is_match(value)
}

/// Turns user input such as `HTTPS://Example.com:8443/path` into `example.com`.
///
/// Only `http`/`https` schemes are accepted. The host the URL parser settles on must be a
/// domain spelled exactly as typed, so userinfo, IP literals (including shorthand like
/// `10` or `0x7f.1`), percent-escapes and non-ASCII names all yield `None`.
pub fn sanitize_domain(raw: &str) -> Option<String> {
    let candidate = raw.trim().to_lowercase();
    if candidate.is_empty() {
        return None;
    }

    let with_scheme = if candidate.contains("://") {
        candidate
    } else {
        format!("https://{}", candidate)
    };
    let url = Url::parse(&with_scheme).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if !url.username().is_empty() || url.password().is_some() {
        return None;
    }

    let Some(Host::Domain(parsed)) = url.host() else {
        return None;
    };
    if parsed != typed_host(&with_scheme)? {
        return None;
    }

    let host = parsed.trim_end_matches('.');
    is_valid_hostname(host).then(|| host.to_string())
}

/// The authority text between `://` and the path, query or fragment, minus any port.
fn typed_host(with_scheme: &str) -> Option<&str> {
    let (_, rest) = with_scheme.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    authority.split(':').next()
}

/// Normalizes one raw CT line against the target `domain`.
///
/// The line is lowercased and stripped of trailing dots; a leading `*.` becomes the
/// wildcard flag (and stays in `host`) while the remainder is validated. The result must be
/// the domain itself or end with `"." + domain`.
pub fn normalize_candidate(line: &str, domain: &str) -> Result<SubdomainCandidate, Discard> {
    let line = line.trim();
    if line.chars().any(char::is_whitespace) || line.contains('@') || line.contains(" - ") {
        return Err(Discard::Malformed);
    }

    let normalized = line.to_lowercase();
    let normalized = normalized.trim_end_matches('.');
    let (wildcard, bare) = match normalized.strip_prefix("*.") {
        Some(rest) => (true, rest),
        None => (false, normalized),
    };

    if !is_valid_hostname(bare) {
        return Err(Discard::NotHostname);
    }

    let domain = domain.to_lowercase();
    if bare != domain && !bare.ends_with(&format!(".{}", domain)) {
        return Err(Discard::OutOfScope);
    }

    Ok(SubdomainCandidate::new(normalized, wildcard))
}

/// Like [`normalize_candidate`] but logs the discard reason.
pub fn normalize_logged(line: &str, domain: &str) -> Option<SubdomainCandidate> {
    match normalize_candidate(line, domain) {
        Ok(candidate) => Some(candidate),
        Err(reason) => {
            let preview: String = line.chars().take(80).collect();
            debug!(%reason, line = %preview, "Discarded CT candidate.");
            None
        }
    }
}
