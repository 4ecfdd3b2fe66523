// src/services/api_server.rs
//! API Server for the wallet agent
//!
//! Exposes one [`Wallet`] over HTTP so a front end (or a test harness) can
//! drive the identity session. The API is built using Axum and includes
//! endpoints for:
//! - Wallet initialization from bank-ID claims and readiness polling
//! - The active DID and the stored identities
//! - Credential listing, storing and issuing through the issuer node
//! - Authorization proofs, either returned or delivered to the verifier

use crate::error::{ClaimsError, ServiceError, WalletError};
use crate::models::claims::TokenClaims;
use crate::models::credential::VerifiableCredential;
use crate::models::identity::IdentityRecord;
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::verifier::Verifier;
use crate::wallet::{ProofResponse, Readiness, Wallet};
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

// API request and response structures

/// Claims for initialization: either the decoded claims object or the raw id token.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimsPayload {
    claims: Option<Value>,
    id_token: Option<String>,
}

impl ClaimsPayload {
    fn into_claims(self) -> Result<TokenClaims, ApiError> {
        match (self.claims, self.id_token) {
            (Some(claims), _) => {
                let bytes = serde_json::to_vec(&claims).map_err(ClaimsError::from)?;
                Ok(TokenClaims::from_json(&bytes)?)
            }
            (None, Some(token)) => Ok(TokenClaims::from_unverified_jwt(&token)?),
            (None, None) => Err(ApiError::BadRequest(
                "either 'claims' or 'idToken' is required".into(),
            )),
        }
    }
}

#[derive(Serialize)]
struct DidResponse {
    did: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Authorization request to answer: inline, or fetched from a URL.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeRequest {
    request: Option<Value>,
    request_url: Option<String>,
}

/// One credential, or a batch that is stored all-or-nothing.
#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialUpload {
    Batch(Vec<VerifiableCredential>),
    Single(Box<VerifiableCredential>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeResponse {
    thread_id: String,
    callback_url: String,
    verifier_response: String,
}

/// Errors returned by handlers, rendered as `{ "error": kind, "message": ... }`.
#[derive(Debug)]
pub enum ApiError {
    Wallet(WalletError),
    Claims(ClaimsError),
    Upstream(ServiceError),
    BadRequest(String),
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        ApiError::Wallet(e)
    }
}

impl From<ClaimsError> for ApiError {
    fn from(e: ClaimsError) -> Self {
        ApiError::Claims(e)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Upstream(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Wallet(e) => {
                let status = match &e {
                    WalletError::InvalidAuthorizationRequest(_) => StatusCode::BAD_REQUEST,
                    WalletError::NoIdentity => StatusCode::NOT_FOUND,
                    WalletError::CredentialStore(_) => StatusCode::CONFLICT,
                    WalletError::ProofGeneration(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    WalletError::ArtifactFetch(_) => StatusCode::SERVICE_UNAVAILABLE,
                    WalletError::IdentityLoad(_) | WalletError::IdentityCreation(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.kind(), e.to_string())
            }
            ApiError::Claims(e) => (StatusCode::BAD_REQUEST, "invalid_claims", e.to_string()),
            ApiError::Upstream(e) => (StatusCode::BAD_GATEWAY, "upstream", e.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
        };
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

/// Main API server state
#[derive(Clone)]
pub struct ApiServer {
    wallet: Arc<Wallet>,
    issuer: Arc<CredentialIssuer>,
    verifier: Arc<Verifier>,
    allowed_origins: Vec<HeaderValue>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `wallet` - The wallet this agent serves
    /// * `issuer` - Client for the issuer node
    /// * `verifier` - Client for verifier endpoints
    pub fn new(wallet: Arc<Wallet>, issuer: CredentialIssuer, verifier: Verifier) -> Self {
        ApiServer {
            wallet,
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
            allowed_origins: Vec::new(),
        }
    }

    /// Lets the given browser origins call the API cross-origin.
    ///
    /// Without this no CORS headers are sent, so web pages on other origins
    /// cannot read wallet responses.
    pub fn with_allowed_origins(mut self, origins: &[String]) -> Self {
        self.allowed_origins = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid allowed origin {:?}", origin);
                    None
                }
            })
            .collect();
        self
    }

    /// Builds the router with all API routes.
    pub fn router(&self) -> Router {
        let router: Router<Arc<ApiServer>> = Router::new()
            .route("/wallet/initialize", post(Self::initialize_handler))
            .route("/wallet/ready", get(Self::ready_handler))
            .route("/wallet/did", get(Self::did_handler))
            .route("/wallet/identities", get(Self::identities_handler))
            .route(
                "/wallet/credentials",
                get(Self::list_credentials_handler).post(Self::save_credential_handler),
            )
            .route("/wallet/credentials/issue", post(Self::issue_credential_handler))
            .route("/wallet/proof", post(Self::proof_handler))
            .route("/wallet/authorize", post(Self::authorize_handler));

        let router = if self.allowed_origins.is_empty() {
            router
        } else {
            router.layer(
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(self.allowed_origins.clone()))
                    .allow_methods([Method::GET, Method::POST])
                    .allow_headers([header::CONTENT_TYPE]),
            )
        };
        router.with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and serves until the listener fails.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:8080")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Wallet API listening on {}", addr);
        axum::serve(listener, self.router()).await
    }

    // =====================
    // Wallet lifecycle
    // =====================

    /// Initializes the wallet
    ///
    /// # Endpoint
    /// POST /wallet/initialize
    ///
    /// # Responses
    /// - 200 OK: `{ "did": ... }`
    /// - 400 Bad Request: unusable claims
    /// - 503 Service Unavailable: circuits could not be fetched
    async fn initialize_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<ClaimsPayload>,
    ) -> Result<Json<DidResponse>, ApiError> {
        let claims = payload.into_claims()?;
        let did = state.wallet.initialize(&claims).await?;
        Ok(Json(DidResponse {
            did: did.to_string(),
        }))
    }

    /// GET /wallet/ready
    async fn ready_handler(State(state): State<Arc<ApiServer>>) -> Json<ReadyResponse> {
        let response = match state.wallet.readiness() {
            Readiness::Pending => ReadyResponse {
                ready: false,
                state: "pending",
                error: None,
            },
            Readiness::Ready => ReadyResponse {
                ready: true,
                state: "ready",
                error: None,
            },
            Readiness::Failed(e) => ReadyResponse {
                ready: false,
                state: "failed",
                error: Some(e.to_string()),
            },
        };
        Json(response)
    }

    /// GET /wallet/did
    async fn did_handler(
        State(state): State<Arc<ApiServer>>,
    ) -> Result<Json<DidResponse>, ApiError> {
        let did = state.wallet.active_identity_did()?;
        Ok(Json(DidResponse {
            did: did.to_string(),
        }))
    }

    /// GET /wallet/identities
    async fn identities_handler(
        State(state): State<Arc<ApiServer>>,
    ) -> Result<Json<Vec<IdentityRecord>>, ApiError> {
        Ok(Json(state.wallet.identities()?))
    }

    // =====================
    // Credentials
    // =====================

    /// GET /wallet/credentials
    async fn list_credentials_handler(
        State(state): State<Arc<ApiServer>>,
    ) -> Json<Vec<VerifiableCredential>> {
        Json(state.wallet.all_credentials())
    }

    /// Stores credentials the caller already holds
    ///
    /// # Endpoint
    /// POST /wallet/credentials
    ///
    /// # Request Body
    /// One credential, or an array of credentials stored all-or-nothing
    ///
    /// # Responses
    /// - 201 Created
    /// - 409 Conflict: wallet not ready, or a credential issued to another DID
    async fn save_credential_handler(
        State(state): State<Arc<ApiServer>>,
        Json(upload): Json<CredentialUpload>,
    ) -> Result<StatusCode, ApiError> {
        match upload {
            CredentialUpload::Batch(credentials) => state.wallet.save_credentials(credentials)?,
            CredentialUpload::Single(credential) => state.wallet.save_credential(*credential)?,
        }
        Ok(StatusCode::CREATED)
    }

    /// Requests a credential from the issuer node and stores it
    ///
    /// # Endpoint
    /// POST /wallet/credentials/issue
    ///
    /// # Request Body
    /// The same claims payload as initialization
    ///
    /// # Responses
    /// - 201 Created: the stored credential
    /// - 404 Not Found: no active identity
    /// - 502 Bad Gateway: the issuer failed
    async fn issue_credential_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<ClaimsPayload>,
    ) -> Result<(StatusCode, Json<VerifiableCredential>), ApiError> {
        let claims = payload.into_claims()?;
        let holder = state.wallet.active_identity_did()?;

        let credential = state.issuer.issue_credential(&holder, &claims).await?;
        state.wallet.save_credential(credential.clone())?;
        Ok((StatusCode::CREATED, Json(credential)))
    }

    // =====================
    // Authorization
    // =====================

    /// Creates an authorization proof
    ///
    /// # Endpoint
    /// POST /wallet/proof
    ///
    /// # Request Body
    /// Raw authorization request message
    ///
    /// # Responses
    /// - 200 OK: token, callback URL and thread id
    /// - 400 Bad Request: malformed or unsupported request
    /// - 404 Not Found: no active identity
    /// - 422 Unprocessable Entity: proof could not be generated
    async fn proof_handler(
        State(state): State<Arc<ApiServer>>,
        body: Bytes,
    ) -> Result<Json<ProofResponse>, ApiError> {
        Ok(Json(state.wallet.create_proof(&body).await?))
    }

    /// Answers an authorization request and delivers the token to its callback
    ///
    /// # Endpoint
    /// POST /wallet/authorize
    ///
    /// # Request Body
    /// `{ "request": {...} }` or `{ "requestUrl": "..." }`
    async fn authorize_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<AuthorizeRequest>,
    ) -> Result<Json<AuthorizeResponse>, ApiError> {
        let request = match (payload.request, payload.request_url) {
            (Some(request), _) => serde_json::to_vec(&request)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            (None, Some(url)) => state.verifier.fetch_request(&url).await?,
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "either 'request' or 'requestUrl' is required".into(),
                ))
            }
        };

        let proof = state.wallet.create_proof(&request).await?;
        let verifier_response = state
            .verifier
            .submit_response(&proof.callback_url, &proof.token)
            .await?;

        Ok(Json(AuthorizeResponse {
            thread_id: proof.thread_id,
            callback_url: proof.callback_url,
            verifier_response,
        }))
    }
}
