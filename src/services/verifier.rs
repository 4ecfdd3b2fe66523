// src/services/verifier.rs
//! Verifier-facing transport.
//!
//! Fetches authorization requests published by a verifier and delivers the
//! wallet's zero-knowledge token to the request's callback URL.

use crate::config::VerifierSettings;
use crate::error::ServiceError;
use crate::models::authorization::MEDIA_TYPE_ZKP;
use crate::services::{check_status, http_client};
use log::{debug, info};
use std::time::Duration;

/// HTTP client for verifiers.
pub struct Verifier {
    client: reqwest::Client,
    settings: VerifierSettings,
}

impl Verifier {
    pub fn new(settings: VerifierSettings) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client(Duration::from_secs(settings.timeout_secs))?,
            settings,
        })
    }

    /// Resolves a request URL that may be relative to the configured verifier.
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.settings.url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }

    /// Downloads the raw bytes of an authorization request.
    pub async fn fetch_request(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        let url = self.resolve(url);
        debug!("Fetching authorization request from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ServiceError::Http {
                url: url.clone(),
                source,
            })?;
        let bytes = check_status(&url, response)
            .await?
            .bytes()
            .await
            .map_err(|source| ServiceError::Http {
                url: url.clone(),
                source,
            })?;
        Ok(bytes.to_vec())
    }

    /// Posts `token` to the verifier callback.
    ///
    /// # Returns
    /// The verifier's response body, which is verifier specific
    pub async fn submit_response(
        &self,
        callback_url: &str,
        token: &str,
    ) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(callback_url)
            .header(reqwest::header::CONTENT_TYPE, MEDIA_TYPE_ZKP)
            .body(token.to_string())
            .send()
            .await
            .map_err(|source| ServiceError::Http {
                url: callback_url.to_string(),
                source,
            })?;
        let body = check_status(callback_url, response)
            .await?
            .text()
            .await
            .map_err(|source| ServiceError::Http {
                url: callback_url.to_string(),
                source,
            })?;

        info!("Delivered authorization response to {}", callback_url);
        Ok(body)
    }
}
