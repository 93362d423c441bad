use std::collections::HashMap;
use std::sync::Mutex;

use rand::RngCore;
use tokio::sync::oneshot;

use super::client_data::extract_challenge;
use super::cose::{self, CoseError};

pub const CHALLENGE_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("superseded by a newer request")]
    Superseded,
    #[error("authenticator: {0}")]
    AuthenticatorFailure(String),
    #[error("no pending {0} operation")]
    NoPendingOperation(&'static str),
    #[error("credential: {0}")]
    MalformedCredential(#[from] CoseError),
    #[error("bridge dropped before completion")]
    Closed,
}

/// Credential established during registration. The public key is only
/// available here — assertions never carry it — so it is extracted once
/// from the attestation object and cached by the bridge.
#[derive(Debug, Clone)]
pub struct RegisteredCredential {
    pub credential_id: Vec<u8>,
    pub public_key: [u8; 65],
}

/// Raw assertion response handed back by the platform authenticator.
#[derive(Debug, Clone)]
pub struct AssertionResponse {
    pub credential_id: Vec<u8>,
    pub signature: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
}

/// Outcome of a sign-message request: everything a remote verifier needs
/// to run the WebAuthn signed-data construction, plus the challenge
/// recovered from `clientDataJSON` for replay checks.
#[derive(Debug, Clone)]
pub struct SignatureResult {
    pub credential_id: Vec<u8>,
    pub signature: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub challenge: Option<Vec<u8>>,
}

/// An issued request: the challenge to hand to the platform
/// authenticator, and the completion to await.
pub struct PasskeyRequest<T> {
    pub challenge: [u8; CHALLENGE_LEN],
    rx: oneshot::Receiver<Result<T, BridgeError>>,
}

impl<T> PasskeyRequest<T> {
    /// Resolve once the platform layer calls the matching `complete_*`
    /// or `fail`, or once a newer request supersedes this one.
    pub async fn wait(self) -> Result<T, BridgeError> {
        self.rx.await.unwrap_or(Err(BridgeError::Closed))
    }
}

type Slot<T> = Option<oneshot::Sender<Result<T, BridgeError>>>;

#[derive(Default)]
struct Pending {
    register: Slot<RegisteredCredential>,
    authenticate: Slot<Vec<u8>>,
    sign: Slot<SignatureResult>,
}

/// Single-in-flight passkey operations against a platform authenticator.
///
/// At most one registration, one authentication, and one sign request may
/// be pending at a time. Issuing a new request of the same kind resolves
/// the previous one with [`BridgeError::Superseded`] — supersession is
/// explicit, not a silently replaced callback. Any authenticator failure
/// aborts everything in flight and returns the bridge to idle.
pub struct PasskeyBridge {
    rp_id: String,
    pending: Mutex<Pending>,
    credentials: Mutex<HashMap<Vec<u8>, [u8; 65]>>,
}

impl PasskeyBridge {
    pub fn new(rp_id: impl Into<String>) -> Self {
        Self {
            rp_id: rp_id.into(),
            pending: Mutex::new(Pending::default()),
            credentials: Mutex::new(HashMap::new()),
        }
    }

    pub fn rp_id(&self) -> &str {
        &self.rp_id
    }

    /// Public key cached at registration time for a credential ID.
    pub fn public_key_for(&self, credential_id: &[u8]) -> Option<[u8; 65]> {
        self.credentials.lock().unwrap().get(credential_id).copied()
    }

    pub fn begin_registration(&self) -> PasskeyRequest<RegisteredCredential> {
        let (tx, rx) = oneshot::channel();
        let challenge = fresh_challenge();
        let old = self.pending.lock().unwrap().register.replace(tx);
        supersede(old);
        tracing::debug!(rp_id = %self.rp_id, "registration request issued");
        PasskeyRequest { challenge, rx }
    }

    /// Generic authenticate request; resolves to the credential ID the
    /// authenticator selected.
    pub fn begin_authentication(&self) -> PasskeyRequest<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        let challenge = fresh_challenge();
        let old = self.pending.lock().unwrap().authenticate.replace(tx);
        supersede(old);
        tracing::debug!(rp_id = %self.rp_id, "authentication request issued");
        PasskeyRequest { challenge, rx }
    }

    /// Sign-message request; resolves to the full [`SignatureResult`].
    pub fn begin_sign(&self) -> PasskeyRequest<SignatureResult> {
        let (tx, rx) = oneshot::channel();
        let challenge = fresh_challenge();
        let old = self.pending.lock().unwrap().sign.replace(tx);
        supersede(old);
        tracing::debug!(rp_id = %self.rp_id, "sign request issued");
        PasskeyRequest { challenge, rx }
    }

    /// Registration came back: extract and cache the attested public key,
    /// then resolve the pending request. Extraction failures are
    /// delivered through the pending future.
    pub fn complete_registration(
        &self,
        credential_id: &[u8],
        raw_attestation_object: &[u8],
    ) -> Result<(), BridgeError> {
        let tx = self
            .pending
            .lock()
            .unwrap()
            .register
            .take()
            .ok_or(BridgeError::NoPendingOperation("registration"))?;

        match cose::extract_p256_public_key(raw_attestation_object) {
            Ok(public_key) => {
                self.credentials
                    .lock()
                    .unwrap()
                    .insert(credential_id.to_vec(), public_key);
                tracing::info!(
                    rp_id = %self.rp_id,
                    cred_id = hex(credential_id),
                    "passkey registered"
                );
                let _ = tx.send(Ok(RegisteredCredential {
                    credential_id: credential_id.to_vec(),
                    public_key,
                }));
            }
            Err(e) => {
                tracing::warn!(rp_id = %self.rp_id, error = %e, "attestation rejected");
                let _ = tx.send(Err(BridgeError::MalformedCredential(e)));
            }
        }
        Ok(())
    }

    /// Assertion came back. A pending sign request takes priority over a
    /// generic authenticate request, mirroring which call produced it.
    pub fn complete_assertion(&self, response: AssertionResponse) -> Result<(), BridgeError> {
        let mut pending = self.pending.lock().unwrap();
        if let Some(tx) = pending.sign.take() {
            drop(pending);
            let challenge = extract_challenge(&response.client_data_json);
            tracing::info!(
                rp_id = %self.rp_id,
                cred_id = hex(&response.credential_id),
                "sign assertion completed"
            );
            let _ = tx.send(Ok(SignatureResult {
                credential_id: response.credential_id,
                signature: response.signature,
                authenticator_data: response.authenticator_data,
                client_data_json: response.client_data_json,
                challenge,
            }));
            return Ok(());
        }
        if let Some(tx) = pending.authenticate.take() {
            drop(pending);
            tracing::info!(
                rp_id = %self.rp_id,
                cred_id = hex(&response.credential_id),
                "authentication completed"
            );
            let _ = tx.send(Ok(response.credential_id));
            return Ok(());
        }
        Err(BridgeError::NoPendingOperation("assertion"))
    }

    /// Authenticator error: abort every in-flight operation and return to
    /// idle.
    pub fn fail(&self, reason: &str) {
        let mut pending = self.pending.lock().unwrap();
        tracing::warn!(rp_id = %self.rp_id, reason, "authenticator failure, clearing pending operations");
        if let Some(tx) = pending.register.take() {
            let _ = tx.send(Err(BridgeError::AuthenticatorFailure(reason.into())));
        }
        if let Some(tx) = pending.authenticate.take() {
            let _ = tx.send(Err(BridgeError::AuthenticatorFailure(reason.into())));
        }
        if let Some(tx) = pending.sign.take() {
            let _ = tx.send(Err(BridgeError::AuthenticatorFailure(reason.into())));
        }
    }
}

fn fresh_challenge() -> [u8; CHALLENGE_LEN] {
    let mut challenge = [0u8; CHALLENGE_LEN];
    rand::thread_rng().fill_bytes(&mut challenge);
    challenge
}

fn supersede<T>(old: Slot<T>) {
    if let Some(tx) = old {
        tracing::debug!("pending request superseded");
        let _ = tx.send(Err(BridgeError::Superseded));
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
