// Domain ownership checks for project websites

use crate::service::ServiceError;
use async_trait::async_trait;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

/// Path a project website must serve the token at
pub const WELL_KNOWN_PATH: &str = "/.well-known/portal-verification.txt";

/// Deterministic challenge token for a project/domain pair
pub fn challenge_token(chain_id: u64, project_id: u64, domain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"portal-domain-verification");
    hasher.update(chain_id.to_be_bytes());
    hasher.update(project_id.to_be_bytes());
    hasher.update((domain.len() as u32).to_be_bytes());
    hasher.update(domain.as_bytes());
    hex::encode(&hasher.finalize()[..16])
}

/// Lowercase and check a bare hostname such as `app.example.org`
pub fn normalize_domain(raw: &str) -> Option<String> {
    let domain = raw.trim().trim_end_matches('.').to_lowercase();
    let valid = domain.len() <= 253
        && domain.contains('.')
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    valid.then_some(domain)
}

#[async_trait]
pub trait DomainProbe: Send + Sync {
    /// Whether `domain` currently serves `token`
    async fn serves_token(&self, domain: &str, token: &str) -> Result<bool, ServiceError>;
}

pub struct HttpDomainProbe {
    http: reqwest::Client,
}

impl HttpDomainProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl DomainProbe for HttpDomainProbe {
    async fn serves_token(&self, domain: &str, token: &str) -> Result<bool, ServiceError> {
        let url = format!("https://{}{}", domain, WELL_KNOWN_PATH);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::UpstreamUnavailable(format!("{}: {}", domain, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("No verification file at {}", url);
            return Ok(false);
        }

        let body = response
            .error_for_status()
            .map_err(|e| ServiceError::UpstreamUnavailable(e.to_string()))?
            .text()
            .await
            .map_err(|e| ServiceError::UpstreamUnavailable(e.to_string()))?;

        Ok(body.trim() == token)
    }
}
