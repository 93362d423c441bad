use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};

/// Uncompressed SEC1 P-256 point: 0x04 || x || y.
pub const PUBLIC_KEY_LEN: usize = 65;
pub const UNCOMPRESSED_TAG: u8 = 0x04;

/// Verify a WebAuthn assertion signature.
///
/// The authenticator signs `authenticatorData || SHA256(clientDataJSON)`
/// with ECDSA/P-256 over SHA-256, so the client-data hash is itself
/// hashed a second time inside ECDSA. Omitting that outer hash is the
/// classic interop bug; this reproduces the construction bit-for-bit.
///
/// Never errors: any malformed input (wrong key shape, bad DER, off-curve
/// point) yields `false` — the key shape is checked before any
/// cryptographic work.
pub fn verify_assertion(
    signature: &[u8],
    authenticator_data: &[u8],
    client_data_json: &[u8],
    public_key: &[u8],
) -> bool {
    if public_key.len() != PUBLIC_KEY_LEN || public_key[0] != UNCOMPRESSED_TAG {
        return false;
    }
    let verifying_key = match VerifyingKey::from_sec1_bytes(public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = match Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let client_data_hash = Sha256::digest(client_data_json);
    let mut signed_data = Vec::with_capacity(authenticator_data.len() + 32);
    signed_data.extend_from_slice(authenticator_data);
    signed_data.extend_from_slice(&client_data_hash);

    verifying_key.verify(&signed_data, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::SigningKey;

    fn fixture() -> (SigningKey, [u8; 65]) {
        let key = SigningKey::from_slice(&[0x37u8; 32]).unwrap();
        let point = key.verifying_key().to_encoded_point(false);
        (key.clone(), point.as_bytes().try_into().unwrap())
    }

    /// Sign the way a platform authenticator does: ECDSA-SHA256 over
    /// authenticatorData || SHA256(clientDataJSON).
    fn authenticator_sign(key: &SigningKey, auth_data: &[u8], cdj: &[u8]) -> Vec<u8> {
        let cdh = Sha256::digest(cdj);
        let mut signed = auth_data.to_vec();
        signed.extend_from_slice(&cdh);
        let sig: Signature = key.sign(&signed);
        sig.to_der().as_bytes().to_vec()
    }

    #[test]
    fn test_valid_assertion_verifies() {
        let (key, pubkey) = fixture();
        let auth_data = [0xAD; 37];
        let cdj = br#"{"type":"webauthn.get","challenge":"AAAA","origin":"https://example.com"}"#;
        let sig = authenticator_sign(&key, &auth_data, cdj);
        assert!(verify_assertion(&sig, &auth_data, cdj, &pubkey));
    }

    #[test]
    fn test_mutated_client_data_fails() {
        let (key, pubkey) = fixture();
        let auth_data = [0xAD; 37];
        let cdj = br#"{"type":"webauthn.get","challenge":"AAAA"}"#.to_vec();
        let sig = authenticator_sign(&key, &auth_data, &cdj);

        let mut tampered = cdj.clone();
        tampered[10] ^= 0x01;
        assert!(!verify_assertion(&sig, &auth_data, &tampered, &pubkey));
    }

    #[test]
    fn test_mutated_authenticator_data_fails() {
        let (key, pubkey) = fixture();
        let auth_data = [0xAD; 37];
        let cdj = b"{}";
        let sig = authenticator_sign(&key, &auth_data, cdj);

        let mut tampered = auth_data;
        tampered[0] ^= 0x80;
        assert!(!verify_assertion(&sig, &tampered, cdj, &pubkey));
    }

    #[test]
    fn test_single_hash_signature_rejected() {
        // A signature over the raw clientDataJSON concatenation (missing
        // the inner client-data hash) must not verify.
        let (key, pubkey) = fixture();
        let auth_data = [0xAD; 37];
        let cdj = b"{\"type\":\"webauthn.get\"}";
        let mut wrong = auth_data.to_vec();
        wrong.extend_from_slice(cdj);
        let sig: Signature = key.sign(&wrong);
        assert!(!verify_assertion(
            sig.to_der().as_bytes(),
            &auth_data,
            cdj,
            &pubkey
        ));
    }

    #[test]
    fn test_key_shape_rejected_before_crypto() {
        let (key, pubkey) = fixture();
        let auth_data = [0xAD; 37];
        let cdj = b"{}";
        let sig = authenticator_sign(&key, &auth_data, cdj);

        // Wrong length
        assert!(!verify_assertion(&sig, &auth_data, cdj, &pubkey[..64]));
        // Wrong leading byte
        let mut bad = pubkey;
        bad[0] = 0x02;
        assert!(!verify_assertion(&sig, &auth_data, cdj, &bad));
        // Empty key
        assert!(!verify_assertion(&sig, &auth_data, cdj, &[]));
    }

    #[test]
    fn test_garbage_der_rejected() {
        let (_, pubkey) = fixture();
        assert!(!verify_assertion(&[0xFF; 70], &[0xAD; 37], b"{}", &pubkey));
        assert!(!verify_assertion(&[], &[0xAD; 37], b"{}", &pubkey));
    }
}
