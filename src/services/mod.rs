// src/services/mod.rs
//! Network-facing services: clients for the issuer node and verifiers, and
//! the HTTP API the wallet agent exposes.

pub mod api_server;
pub mod credential_issuer;
pub mod verifier;

pub use api_server::ApiServer;
pub use credential_issuer::CredentialIssuer;
pub use verifier::Verifier;

use crate::error::ServiceError;
use std::time::Duration;

fn http_client(timeout: Duration) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ServiceError::Http {
            url: String::new(),
            source,
        })
}

/// Passes successful responses through and turns the rest into [`ServiceError::Status`].
async fn check_status(
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}
