use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use super::attestation::{
    PhotoAttestation, ATTESTATION_VERSION, HASH_ALGORITHM, SIGNATURE_ALGORITHM,
};
use super::{container, PhotoError};
use crate::keystore::KeyStore;
use crate::signer::{verify_signature, Signer, SignerError};

type Blake2b256 = Blake2b<U32>;

/// A photograph with its attestation embedded.
#[derive(Debug, Clone)]
pub struct SignedPhoto {
    pub signed_bytes: Vec<u8>,
    pub attestation: PhotoAttestation,
}

/// Why a photo failed verification. Distinguishing tampering from a bad
/// signature from missing metadata is the whole diagnostic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyFailure {
    /// No attestation metadata present, or the JSON is unreadable.
    NoAttestation,
    /// The container could not be canonicalized for rehashing.
    Codec,
    /// Recomputed hash differs from the embedded one — tampering.
    HashMismatch,
    /// Embedded public key has the wrong shape or is off-curve.
    MalformedKey,
    /// Hash matches but the signature does not check out.
    SignatureInvalid,
}

/// Outcome of [`verify_photo`]. Both hashes are surfaced for diagnostics
/// whenever they were computed.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub failure: Option<VerifyFailure>,
    pub attestation: Option<PhotoAttestation>,
    pub current_hash: Option<Vec<u8>>,
    pub expected_hash: Option<Vec<u8>>,
}

impl VerificationResult {
    fn failed(failure: VerifyFailure) -> Self {
        Self {
            is_valid: false,
            failure: Some(failure),
            attestation: None,
            current_hash: None,
            expected_hash: None,
        }
    }
}

/// Sign a photograph with the account keypair.
///
/// The hash covers the canonical stored bytes: the input with any
/// previous attestation stripped. The attestation JSON is then embedded
/// in the container without touching pixel data. Signing and embedding
/// fail distinctly, so a caller can retry just the failed step.
pub fn sign_photo<S: KeyStore>(
    signer: &Signer<S>,
    image: &[u8],
) -> Result<SignedPhoto, PhotoError> {
    let public_key = signer
        .public_key()
        .ok_or(PhotoError::Signer(SignerError::NoPublicKey))?;
    let sui_address = signer
        .address()
        .ok_or(PhotoError::Signer(SignerError::NoPublicKey))?;

    let canonical = container::strip(image)?;
    let photo_hash = Blake2b256::digest(&canonical).to_vec();
    let signature = signer.sign_bytes(&photo_hash)?;

    let attestation = PhotoAttestation {
        signature,
        photo_hash: photo_hash.clone(),
        public_key: public_key.to_vec(),
        sui_address,
        timestamp: chrono::Utc::now(),
        signature_algorithm: SIGNATURE_ALGORITHM.into(),
        hash_algorithm: HASH_ALGORITHM.into(),
        version: ATTESTATION_VERSION.into(),
    };

    let json = serde_json::to_string(&attestation)
        .map_err(|_| PhotoError::MetadataWrite("attestation serialization failed"))?;
    let signed_bytes = container::embed(&canonical, &json)?;

    tracing::info!(
        size = canonical.len(),
        address = %attestation.sui_address,
        hash = hex(&photo_hash),
        "photo signed"
    );
    Ok(SignedPhoto {
        signed_bytes,
        attestation,
    })
}

/// Verify a photograph's embedded attestation.
///
/// Recomputes the hash over the stripped bytes and only then checks the
/// signature against the embedded public key. A hash mismatch is
/// reported as tampering without attempting the signature. The embedded
/// key proves nothing beyond "produced by this key's holder"; binding
/// the key to an identity is the caller's problem, and the embedded
/// address is never independently re-derived here.
pub fn verify_photo(image: &[u8]) -> VerificationResult {
    let json = match container::read(image) {
        Ok(Some(json)) => json,
        Ok(None) => return VerificationResult::failed(VerifyFailure::NoAttestation),
        Err(_) => return VerificationResult::failed(VerifyFailure::NoAttestation),
    };
    let attestation: PhotoAttestation = match serde_json::from_str(&json) {
        Ok(a) => a,
        Err(_) => return VerificationResult::failed(VerifyFailure::NoAttestation),
    };

    let canonical = match container::strip(image) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "cannot canonicalize image for verification");
            return VerificationResult {
                expected_hash: Some(attestation.photo_hash.clone()),
                attestation: Some(attestation),
                ..VerificationResult::failed(VerifyFailure::Codec)
            };
        }
    };
    let current_hash = Blake2b256::digest(&canonical).to_vec();

    if current_hash != attestation.photo_hash {
        tracing::warn!(
            current = hex(&current_hash),
            expected = hex(&attestation.photo_hash),
            "photo hash mismatch, possible tampering"
        );
        return VerificationResult {
            current_hash: Some(current_hash),
            expected_hash: Some(attestation.photo_hash.clone()),
            attestation: Some(attestation),
            ..VerificationResult::failed(VerifyFailure::HashMismatch)
        };
    }

    let key_ok = attestation.public_key.len() == 65
        && attestation.public_key[0] == 0x04
        && p256::ecdsa::VerifyingKey::from_sec1_bytes(&attestation.public_key).is_ok();
    let failure = if !key_ok {
        Some(VerifyFailure::MalformedKey)
    } else if verify_signature(
        &attestation.signature,
        &attestation.photo_hash,
        &attestation.public_key,
    ) {
        None
    } else {
        Some(VerifyFailure::SignatureInvalid)
    };

    let is_valid = failure.is_none();
    tracing::info!(
        valid = is_valid,
        address = %attestation.sui_address,
        "photo verification finished"
    );
    VerificationResult {
        is_valid,
        failure,
        attestation: Some(attestation),
        expected_hash: Some(current_hash.clone()),
        current_hash: Some(current_hash),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
