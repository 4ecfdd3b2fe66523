// src/wallet/orchestrator.rs
//! The wallet orchestrator.
//!
//! Owns one identity session: it loads the circuit artifacts, resolves or
//! creates the holder identity from the bank-ID claims, and then serves
//! credential storage and authorization proofs for that identity.
//!
//! ## Lifecycle
//! 1. [`Wallet::initialize`] runs at most once per wallet; concurrent and
//!    later callers receive the same outcome.
//! 2. Readiness is broadcast when initialization finishes, successfully or not.
//! 3. [`Wallet::save_credential`] and [`Wallet::create_proof`] need a ready wallet.

use crate::circuits::{CircuitLoader, CircuitStorage};
use crate::config::{CircuitSettings, Settings};
use crate::error::WalletError;
use crate::models::authorization::{AuthorizationRequest, AuthorizationResponse};
use crate::models::claims::TokenClaims;
use crate::models::credential::VerifiableCredential;
use crate::models::did::{Did, DidOptions};
use crate::models::identity::{Account, IdentityRecord};
use crate::storage::{ActiveIdentityStore, KeyValueStore};
use crate::utils::serialization::{field_to_decimal, field_to_le_bytes};
use crate::wallet::credential_storage::CredentialStorage;
use crate::wallet::identity_storage::IdentityStorage;
use crate::wallet::key_management::{derive_auth_secret, KeyManager};
use crate::wallet::readiness::{Readiness, ReadySignal};
use crate::zkp::jwz::{JwzHeader, UnsignedToken};
use crate::zkp::AuthProver;
use ark_bn254::Fr;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

/// Everything a [`Wallet`] is built from.
pub struct WalletDeps {
    pub store: Arc<dyn KeyValueStore>,
    pub circuits: CircuitSettings,
    pub did_options: DidOptions,
    /// Credential status service recorded on new identities
    pub revocation_url: Option<String>,
}

impl WalletDeps {
    pub fn from_settings(settings: &Settings, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            circuits: settings.circuits.clone(),
            did_options: settings.identity.did.clone(),
            revocation_url: Some(settings.identity.revocation_url.clone())
                .filter(|url| !url.is_empty()),
        }
    }
}

/// Output of [`Wallet::create_proof`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofResponse {
    /// Packed zero-knowledge token carrying the authorization response
    pub token: String,
    /// Where the verifier expects the token to be posted
    pub callback_url: String,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Loaded identity plus the prover, available once initialization succeeded.
struct Session {
    did: Did,
    secret: Fr,
    prover: Arc<AuthProver>,
}

pub struct Wallet {
    active: ActiveIdentityStore,
    identities: IdentityStorage,
    keys: KeyManager,
    credentials: CredentialStorage,
    loader: CircuitLoader,
    did_options: DidOptions,
    revocation_url: Option<String>,
    init: OnceCell<Result<Did, WalletError>>,
    ready: ReadySignal,
    session: RwLock<Option<Arc<Session>>>,
}

impl Wallet {
    /// Builds a wallet over the given storage. Performs no I/O.
    pub fn new(deps: WalletDeps) -> Result<Self, WalletError> {
        let loader = CircuitLoader::new(deps.circuits, CircuitStorage::new(deps.store.clone()))?;

        Ok(Self {
            active: ActiveIdentityStore::new(deps.store.clone()),
            identities: IdentityStorage::new(deps.store.clone()),
            keys: KeyManager::new(deps.store.clone()),
            credentials: CredentialStorage::new(deps.store),
            loader,
            did_options: deps.did_options,
            revocation_url: deps.revocation_url,
            init: OnceCell::new(),
            ready: ReadySignal::new(),
            session: RwLock::new(None),
        })
    }

    /// Loads circuits and resolves the holder identity.
    ///
    /// # Arguments
    /// * `claims` - Bank-ID claims; `sub` seeds a new identity
    ///
    /// # Returns
    /// The active DID. Every call returns the outcome of the first one.
    ///
    /// # Errors
    /// - [`WalletError::IdentityCreation`] for unusable claims or when a new identity cannot be persisted
    /// - [`WalletError::ArtifactFetch`] when the circuits cannot be loaded
    /// - [`WalletError::IdentityLoad`] when the active identity exists but cannot be read back
    pub async fn initialize(&self, claims: &TokenClaims) -> Result<Did, WalletError> {
        self.init
            .get_or_init(|| self.run_initialize(claims))
            .await
            .clone()
    }

    /// Starts [`Wallet::initialize`] in the background.
    pub fn spawn_initialize(
        self: &Arc<Self>,
        claims: TokenClaims,
    ) -> JoinHandle<Result<Did, WalletError>> {
        let wallet = Arc::clone(self);
        tokio::spawn(async move { wallet.initialize(&claims).await })
    }

    /// Waits for initialization to finish and returns its outcome.
    pub async fn wait_ready(&self) -> Result<(), WalletError> {
        self.ready.wait().await
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Current readiness state, including the initialization error if any.
    pub fn readiness(&self) -> Readiness {
        self.ready.state()
    }

    async fn run_initialize(&self, claims: &TokenClaims) -> Result<Did, WalletError> {
        let outcome = self.bootstrap(claims).await;
        match &outcome {
            Ok(did) => {
                info!("Wallet ready for {}", did);
                self.ready.settle(Ok(()));
            }
            Err(e) => {
                error!("initialize failed: {}", e);
                self.ready.settle(Err(e.clone()));
            }
        }
        outcome
    }

    async fn bootstrap(&self, claims: &TokenClaims) -> Result<Did, WalletError> {
        claims
            .validate()
            .map_err(|e| WalletError::IdentityCreation(format!("invalid claims: {e}")))?;

        let prover = Arc::new(self.loader.load().await?);
        let (did, secret) = self.resolve_identity(claims, &prover)?;

        let mut slot = self
            .session
            .write()
            .map_err(|_| WalletError::IdentityLoad("session lock poisoned".into()))?;
        *slot = Some(Arc::new(Session {
            did: did.clone(),
            secret,
            prover,
        }));
        Ok(did)
    }

    fn resolve_identity(
        &self,
        claims: &TokenClaims,
        prover: &AuthProver,
    ) -> Result<(Did, Fr), WalletError> {
        let pointer = self
            .active
            .get()
            .map_err(|e| WalletError::IdentityLoad(format!("active identity pointer: {e}")))?;

        match pointer {
            Some(account) => self.load_identity(&account.did, prover),
            None => self.create_identity(claims, prover),
        }
    }

    /// Loads the identity the active pointer names.
    fn load_identity(&self, did: &str, prover: &AuthProver) -> Result<(Did, Fr), WalletError> {
        let load_error = |message: String| WalletError::IdentityLoad(format!("{did}: {message}"));

        let parsed = Did::parse(did).map_err(|e| load_error(e.to_string()))?;
        self.identities
            .get(did)
            .map_err(|e| load_error(e.to_string()))?
            .ok_or_else(|| load_error("identity record is missing".into()))?;
        let secret = self
            .keys
            .load_secret(did)
            .map_err(|e| load_error(e.to_string()))?
            .ok_or_else(|| load_error("auth key is missing".into()))?;

        let derived = Did::from_state(&parsed.options(), &field_to_le_bytes(&prover.commitment(&secret)))
            .map_err(|e| load_error(e.to_string()))?;
        if derived != parsed {
            return Err(load_error("auth key does not belong to this identity".into()));
        }

        info!("Loaded identity {}", did);
        Ok((parsed, secret))
    }

    /// Derives the identity for `claims`, persisting it if it is new, and activates it.
    fn create_identity(
        &self,
        claims: &TokenClaims,
        prover: &AuthProver,
    ) -> Result<(Did, Fr), WalletError> {
        let secret = derive_auth_secret(claims.seed());
        let commitment = prover.commitment(&secret);
        let did = Did::from_state(&self.did_options, &field_to_le_bytes(&commitment))
            .map_err(|e| WalletError::IdentityCreation(e.to_string()))?;
        let did_text = did.to_string();
        let create_error =
            |message: String| WalletError::IdentityCreation(format!("{did_text}: {message}"));

        let existing = match self.identities.get(&did_text) {
            Ok(record) => record,
            Err(e) => {
                warn!("Replacing unreadable identity record for {}: {}", did_text, e);
                None
            }
        };

        match existing {
            Some(_) => info!("Re-activating identity {}", did_text),
            None => {
                let record = IdentityRecord {
                    did: did_text.clone(),
                    auth_commitment: field_to_decimal(&commitment),
                    revocation_url: self.revocation_url.clone(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                };
                self.identities
                    .put(&record)
                    .map_err(|e| create_error(e.to_string()))?;
                info!("Created identity {}", did_text);
            }
        }

        // The key is a pure function of the seed, so rewriting it is harmless.
        self.keys
            .store_secret(&did_text, &secret)
            .map_err(|e| create_error(e.to_string()))?;
        self.active
            .set(&Account::active(did_text.clone()))
            .map_err(|e| create_error(e.to_string()))?;

        Ok((did, secret))
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.session.read().ok().and_then(|slot| slot.clone())
    }

    fn log_failure(&self, operation: &str, error: &WalletError) {
        match self.session() {
            Some(session) => error!("{} failed for {}: {}", operation, session.did, error),
            None => error!("{} failed: {}", operation, error),
        }
    }

    /// Attaches a credential to the active identity.
    ///
    /// Re-saving a credential with an id the holder already has replaces it.
    ///
    /// # Errors
    /// [`WalletError::CredentialStore`] when the wallet is not ready, when the
    /// credential was issued to another DID, when the active identity has no
    /// record, or when persisting fails.
    pub fn save_credential(&self, credential: VerifiableCredential) -> Result<(), WalletError> {
        self.store_credentials(vec![credential]).map_err(|e| {
            self.log_failure("save_credential", &e);
            e
        })
    }

    /// Attaches a batch of credentials to the active identity.
    ///
    /// Every credential is checked before any is written, so a batch with one
    /// foreign credential stores nothing.
    ///
    /// # Errors
    /// The same as [`Wallet::save_credential`], for any member of the batch.
    pub fn save_credentials(&self, credentials: Vec<VerifiableCredential>) -> Result<(), WalletError> {
        self.store_credentials(credentials).map_err(|e| {
            self.log_failure("save_credentials", &e);
            e
        })
    }

    fn store_credentials(&self, batch: Vec<VerifiableCredential>) -> Result<(), WalletError> {
        let session = self
            .session()
            .ok_or_else(|| WalletError::CredentialStore("wallet is not ready".into()))?;
        let did = session.did.to_string();

        for credential in &batch {
            match credential.subject_id() {
                Some(subject) if subject == did => {}
                Some(subject) => {
                    return Err(WalletError::CredentialStore(format!(
                        "credential {} was issued to {}, not {}",
                        credential.id, subject, did
                    )))
                }
                None => {
                    return Err(WalletError::CredentialStore(format!(
                        "credential {} has no subject id",
                        credential.id
                    )))
                }
            }
        }

        let record = self
            .identities
            .get(&did)
            .map_err(|e| WalletError::CredentialStore(e.to_string()))?;
        if record.is_none() {
            return Err(WalletError::CredentialStore(format!(
                "no identity record for {did}"
            )));
        }

        let ids: Vec<String> = batch.iter().map(|c| c.id.clone()).collect();
        let replaced = self
            .credentials
            .store_credentials(&did, batch)
            .map_err(|e| WalletError::CredentialStore(e.to_string()))?;
        info!(
            "Stored {} credential(s) for {} ({} replaced): {}",
            ids.len(),
            did,
            replaced,
            ids.join(", ")
        );
        Ok(())
    }

    /// Answers an authorization request with a zero-knowledge token.
    ///
    /// # Errors
    /// Checked in this order:
    /// - [`WalletError::InvalidAuthorizationRequest`] when the bytes are not a supported request
    /// - [`WalletError::NoIdentity`] when there is no active identity
    /// - [`WalletError::ProofGeneration`] when the wallet is not ready, when the
    ///   request demands a credential query this wallet cannot prove, or when
    ///   proving fails
    pub async fn create_proof(&self, request: &[u8]) -> Result<ProofResponse, WalletError> {
        self.prove_request(request).await.map_err(|e| {
            self.log_failure("create_proof", &e);
            e
        })
    }

    async fn prove_request(&self, bytes: &[u8]) -> Result<ProofResponse, WalletError> {
        let request = AuthorizationRequest::parse(bytes)
            .map_err(|e| WalletError::InvalidAuthorizationRequest(e.to_string()))?;

        let account = self
            .active
            .get()
            .map_err(|e| WalletError::IdentityLoad(e.to_string()))?
            .ok_or(WalletError::NoIdentity)?;

        let session = self.session().ok_or_else(|| {
            WalletError::ProofGeneration("circuits are not loaded, wallet is not ready".into())
        })?;
        if account.did != session.did.to_string() {
            return Err(WalletError::ProofGeneration(format!(
                "active identity changed to {} since initialization",
                account.did
            )));
        }

        for query in &request.body.scope {
            if query.optional {
                warn!(
                    "Skipping optional {} query {} in request {}",
                    query.circuit_id, query.id, request.id
                );
            } else {
                return Err(WalletError::ProofGeneration(format!(
                    "query circuit {} (scope {}) is not supported",
                    query.circuit_id, query.id
                )));
            }
        }

        let response = AuthorizationResponse::for_request(&request, &account.did);
        let payload = serde_json::to_vec(&response)
            .map_err(|e| WalletError::ProofGeneration(e.to_string()))?;
        let unsigned = UnsignedToken::new(&JwzHeader::default(), &payload)
            .map_err(|e| WalletError::ProofGeneration(e.to_string()))?;

        let challenge = unsigned.challenge();
        let prover = Arc::clone(&session.prover);
        let secret = session.secret;
        let proof = tokio::task::spawn_blocking(move || prover.prove(secret, challenge))
            .await
            .map_err(|e| WalletError::ProofGeneration(format!("proving task failed: {e}")))?
            .map_err(|e| WalletError::ProofGeneration(e.to_string()))?;

        let token = unsigned
            .finish(&proof)
            .map_err(|e| WalletError::ProofGeneration(e.to_string()))?;
        info!("Created proof for request {} as {}", request.id, account.did);

        Ok(ProofResponse {
            token,
            callback_url: request.body.callback_url.clone(),
            thread_id: request.thread_id().to_string(),
            message: request.body.message,
        })
    }

    /// DID of the active identity.
    ///
    /// Reads the active pointer, so it answers before initialization too.
    pub fn active_identity_did(&self) -> Result<Did, WalletError> {
        let result = self
            .active
            .get()
            .map_err(|e| WalletError::IdentityLoad(e.to_string()))
            .and_then(|account| account.ok_or(WalletError::NoIdentity))
            .and_then(|account| {
                Did::parse(&account.did)
                    .map_err(|e| WalletError::IdentityLoad(format!("{}: {e}", account.did)))
            });
        if let Err(e) = &result {
            if *e != WalletError::NoIdentity {
                self.log_failure("active_identity_did", e);
            }
        }
        result
    }

    /// Credentials of the active identity; empty when there is none.
    ///
    /// Storage failures are logged, not returned.
    pub fn all_credentials(&self) -> Vec<VerifiableCredential> {
        let account = match self.active.get() {
            Ok(Some(account)) => account,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("all_credentials failed to read active identity: {}", e);
                return Vec::new();
            }
        };

        self.credentials
            .list_credentials(&account.did)
            .unwrap_or_else(|e| {
                error!("all_credentials failed for {}: {}", account.did, e);
                Vec::new()
            })
    }

    /// Every identity stored in this wallet.
    pub fn identities(&self) -> Result<Vec<IdentityRecord>, WalletError> {
        self.identities.list().map_err(|e| {
            let e = WalletError::IdentityLoad(e.to_string());
            self.log_failure("identities", &e);
            e
        })
    }
}
