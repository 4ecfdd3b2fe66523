// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Client for the issuer node that attests the holder's bank-ID attributes.
//! Issuing is a two step exchange:
//! 1. `POST /v2/identities/{issuerDid}/credentials` creates the credential and returns its id
//! 2. `GET /v2/identities/{issuerDid}/credentials/{id}` returns the full W3C credential
//!
//! Both calls authenticate with HTTP basic auth.

use crate::config::IssuerSettings;
use crate::error::ServiceError;
use crate::models::claims::{CredentialAttributes, TokenClaims};
use crate::models::credential::VerifiableCredential;
use crate::models::did::Did;
use crate::services::{check_status, http_client};
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of the create-credential call.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    pub credential_schema: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub credential_subject: CredentialSubject,
    /// Unix timestamp
    pub expiration: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CredentialSubject {
    pub id: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Nationality")]
    pub nationality: String,
    pub name: String,
}

#[derive(Deserialize)]
struct CreatedCredential {
    id: String,
}

/// HTTP client for the issuer node.
pub struct CredentialIssuer {
    client: reqwest::Client,
    settings: IssuerSettings,
}

impl CredentialIssuer {
    /// Creates a new CredentialIssuer
    ///
    /// # Arguments
    /// * `settings` - Issuer URL, issuer DID, credentials and credential shape
    pub fn new(settings: IssuerSettings) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client(Duration::from_secs(settings.timeout_secs))?,
            settings,
        })
    }

    fn credentials_url(&self) -> String {
        format!(
            "{}/v2/identities/{}/credentials",
            self.settings.url.trim_end_matches('/'),
            self.settings.issuer_did
        )
    }

    /// Builds the create-credential body for `holder`.
    pub fn credential_request(&self, holder: &Did, attributes: CredentialAttributes) -> CredentialRequest {
        CredentialRequest {
            credential_schema: self.settings.credential_schema.clone(),
            credential_type: self.settings.credential_type.clone(),
            credential_subject: CredentialSubject {
                id: holder.to_string(),
                age: attributes.age,
                gender: attributes.gender,
                nationality: attributes.nationality,
                name: attributes.name,
            },
            expiration: self.settings.expiration,
        }
    }

    /// Requests a credential attesting `claims` for `holder`.
    ///
    /// # Returns
    /// The credential as served by the issuer; the caller decides whether to store it.
    pub async fn issue_credential(
        &self,
        holder: &Did,
        claims: &TokenClaims,
    ) -> Result<VerifiableCredential, ServiceError> {
        self.issue_credential_on(holder, claims, Utc::now().date_naive())
            .await
    }

    async fn issue_credential_on(
        &self,
        holder: &Did,
        claims: &TokenClaims,
        today: NaiveDate,
    ) -> Result<VerifiableCredential, ServiceError> {
        let attributes = claims.credential_attributes(&self.settings.nationality, today);
        let body = self.credential_request(holder, attributes);

        let url = self.credentials_url();
        debug!("Requesting credential for {} from {}", holder, url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .json(&body)
            .send()
            .await
            .map_err(|source| ServiceError::Http {
                url: url.clone(),
                source,
            })?;
        let created: CreatedCredential = check_status(&url, response)
            .await?
            .json()
            .await
            .map_err(|source| ServiceError::Http {
                url: url.clone(),
                source,
            })?;

        let credential_url = format!("{}/{}", url, created.id);
        let response = self
            .client
            .get(&credential_url)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .send()
            .await
            .map_err(|source| ServiceError::Http {
                url: credential_url.clone(),
                source,
            })?;
        let credential: VerifiableCredential = check_status(&credential_url, response)
            .await?
            .json()
            .await
            .map_err(|source| ServiceError::Http {
                url: credential_url.clone(),
                source,
            })?;

        info!("Issuer created credential {} for {}", created.id, holder);
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::did::DidOptions;
    use mockito::{mock, Matcher};
    use serde_json::json;

    const ISSUER_DID: &str = "did:polygonid:polygon:amoy:2qXpxUxiJXdPBBP9jbjK6skPAkVywCbPmv5Ro6aPtp";

    fn holder() -> Did {
        Did::from_state(&DidOptions::default(), &[3u8; 32]).unwrap()
    }

    fn issuer(prefix: &str) -> CredentialIssuer {
        CredentialIssuer::new(IssuerSettings {
            url: format!("{}/{}", mockito::server_url(), prefix),
            issuer_did: ISSUER_DID.into(),
            username: "user-issuer".into(),
            password: "secret".into(),
            ..IssuerSettings::default()
        })
        .unwrap()
    }

    fn claims() -> TokenClaims {
        TokenClaims::from_json(br#"{"sub":"u-1","name":"Aino Virtanen","gender":"Female","birthdate":"01.01.1990"}"#)
            .unwrap()
    }

    #[test]
    fn test_credential_request_shape() {
        let issuer = issuer("shape");
        let today = NaiveDate::from_ymd_opt(2024, 11, 10).unwrap();
        let body = issuer.credential_request(&holder(), claims().credential_attributes("FIN", today));
        let json = serde_json::to_value(body).unwrap();

        assert_eq!(json["type"], "test");
        assert_eq!(json["credentialSchema"], "ipfs://QmRKRs2hsV9TRtRevW31DmoKrLssbv6iwwzxdcA7VDhpFU");
        assert_eq!(json["credentialSubject"]["id"], holder().to_string());
        assert_eq!(json["credentialSubject"]["Age"], "34");
        assert_eq!(json["credentialSubject"]["Gender"], "Female");
        assert_eq!(json["credentialSubject"]["Nationality"], "FIN");
        assert_eq!(json["expiration"], 1_903_357_766i64);
    }

    #[tokio::test]
    async fn test_issue_credential_creates_then_fetches() {
        let path = format!("/issue-ok/v2/identities/{ISSUER_DID}/credentials");
        // "user-issuer:secret"
        let auth = "Basic dXNlci1pc3N1ZXI6c2VjcmV0";

        let create = mock("POST", path.as_str())
            .match_header("authorization", auth)
            .match_body(Matcher::PartialJson(json!({
                "credentialSubject": {"id": holder().to_string(), "Nationality": "FIN"}
            })))
            .with_status(201)
            .with_body(r#"{"id":"7f3a"}"#)
            .create();
        let fetch = mock("GET", format!("{path}/7f3a").as_str())
            .match_header("authorization", auth)
            .with_body(
                json!({
                    "id": "https://issuer.example/v2/credentials/7f3a",
                    "@context": ["https://www.w3.org/2018/credentials/v1"],
                    "type": ["VerifiableCredential", "test"],
                    "issuer": ISSUER_DID,
                    "credentialSubject": {"id": holder().to_string(), "Nationality": "FIN"}
                })
                .to_string(),
            )
            .create();

        let credential = issuer("issue-ok")
            .issue_credential(&holder(), &claims())
            .await
            .unwrap();
        assert_eq!(credential.subject_id(), Some(holder().to_string().as_str()));

        create.assert();
        fetch.assert();
    }

    #[tokio::test]
    async fn test_issuer_rejection_is_status_error() {
        let path = format!("/issue-denied/v2/identities/{ISSUER_DID}/credentials");
        let _create = mock("POST", path.as_str())
            .with_status(401)
            .with_body("bad credentials")
            .create();

        let err = issuer("issue-denied")
            .issue_credential(&holder(), &claims())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Status { status: 401, .. }));
    }
}
