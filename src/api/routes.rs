// src/api/routes.rs

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::api::error::ApiError;
use crate::app::AppState;
use crate::core::models::{FailedReport, SubdomainReport};
use crate::core::scanner::dns_lookup::run_dns_lookup;
use crate::core::scanner::normalizer::sanitize_domain;

pub const MSG_PROVIDE_DOMAIN: &str = "Please provide a valid domain name (e.g., example.com)";
pub const MSG_INVALID_DOMAIN: &str = "Invalid domain format. Please provide a valid domain name.";
pub const MSG_MISSING_DOMAIN: &str = "Missing or invalid 'domain'";

/// Body accepted by every domain-taking endpoint. Unparsable bodies count as empty.
#[derive(Debug, Default, Deserialize)]
pub struct DomainRequest {
    #[serde(default)]
    pub domain: Option<String>,
}

impl DomainRequest {
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Validates the body of the enumeration endpoint, distinguishing missing from malformed.
fn require_domain(body: &[u8]) -> Result<String, ApiError> {
    let raw = DomainRequest::from_body(body).domain.unwrap_or_default();
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() {
        return Err(ApiError::BadRequest(MSG_PROVIDE_DOMAIN.to_string()));
    }
    sanitize_domain(&raw).ok_or_else(|| ApiError::BadRequest(MSG_INVALID_DOMAIN.to_string()))
}

/// Sanitized domain or `None`, for endpoints with a single validation message.
fn optional_domain(body: &[u8]) -> Option<String> {
    DomainRequest::from_body(body).domain.as_deref().and_then(sanitize_domain)
}

pub async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "Recon API running!" }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// `POST /api/recon/subdomains`: CT harvesting, DNS verification and confidence scoring.
///
/// The pipeline runs on its own task, so a client that disconnects mid-scan does not cancel
/// the outstanding queries and the finished report still lands in the cache.
pub async fn enumerate_subdomains(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let domain = require_domain(&body)?;
    info!(domain = %domain, "Subdomain enumeration requested.");

    let scanner = state.scanner.clone();
    let target = domain.clone();
    let scan = tokio::spawn(async move { scanner.enumerate(&target).await });

    match scan.await {
        Ok(Ok(report)) => Ok(Json(report).into_response()),
        Ok(Err(e)) => {
            error!(domain = %domain, error = %e, "Error fetching from crt.sh.");
            let body = FailedReport {
                report: SubdomainReport::empty(&domain),
                error: format!("Failed to fetch from crt.sh: {}", e),
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
        Err(e) => {
            error!(domain = %domain, error = %e, "Enumeration task failed.");
            Err(ApiError::Internal(format!("enumeration task failed: {}", e)))
        }
    }
}

/// `POST /api/tools/subdomain`: the quick, unverified listing.
pub async fn quick_subdomains(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let domain = optional_domain(&body).ok_or_else(|| ApiError::BadRequest(MSG_MISSING_DOMAIN.to_string()))?;

    let list = state
        .scanner
        .quick_list(&domain)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(list).into_response())
}

/// `POST /api/recon/dns`: A, MX, NS, TXT and CNAME records.
pub async fn dns_lookup(body: Bytes) -> Result<Response, ApiError> {
    let domain = optional_domain(&body).ok_or_else(|| ApiError::BadRequest(MSG_PROVIDE_DOMAIN.to_string()))?;
    Ok(Json(run_dns_lookup(&domain).await).into_response())
}
