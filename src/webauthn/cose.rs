use p256::ecdsa::VerifyingKey;

use crate::cbor::{self, map_get_int, map_get_str, DecodeError, Value};

/// authData prefix: rpIdHash (32) + flags (1) + signCount (4).
const AUTH_DATA_HEADER: usize = 37;
const AAGUID_LEN: usize = 16;
/// "Attested credential data present" flag bit.
const FLAG_AT: u8 = 0x40;

/// COSE key map labels (RFC 9052): kty = 1, crv = -1, x = -2, y = -3.
const LABEL_KTY: i128 = 1;
const LABEL_CRV: i128 = -1;
const LABEL_X: i128 = -2;
const LABEL_Y: i128 = -3;
/// kty 2 = EC2, crv 1 = P-256.
const KTY_EC2: u64 = 2;
const CRV_P256: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CoseError {
    #[error("cbor: {0}")]
    Cbor(#[from] DecodeError),
    #[error("malformed attestation: {0}")]
    MalformedAttestation(&'static str),
    #[error("extracted key is not a valid P-256 point")]
    InvalidPoint,
}

/// Extract the attested P-256 public key from a WebAuthn attestation
/// object, as the uncompressed SEC1 point `0x04 || x || y`.
///
/// Layout: the top-level CBOR map carries `authData` as a byte string;
/// past the 37-byte header (rpIdHash, flags, signCount) sit the 16-byte
/// AAGUID, a 2-byte big-endian credential-ID length, the credential ID,
/// and finally a CBOR COSE key map with x/y at labels -2/-3. The point is
/// rejected unless it lies on the curve.
pub fn extract_p256_public_key(attestation_object: &[u8]) -> Result<[u8; 65], CoseError> {
    let top = cbor::decode(attestation_object)?;
    let map = top
        .as_map()
        .ok_or(CoseError::MalformedAttestation("top level is not a map"))?;
    let auth_data = map_get_str(map, "authData")
        .ok_or(CoseError::MalformedAttestation("authData missing"))?
        .as_bytes()
        .ok_or(CoseError::MalformedAttestation("authData is not a byte string"))?;

    if auth_data.len() <= AUTH_DATA_HEADER {
        return Err(CoseError::MalformedAttestation(
            "authData too short for attested credential data",
        ));
    }
    let flags = auth_data[32];
    if flags & FLAG_AT == 0 {
        return Err(CoseError::MalformedAttestation(
            "AT flag not set, no attested credential data",
        ));
    }

    // Skip AAGUID, then the length-prefixed credential ID.
    let rest = &auth_data[AUTH_DATA_HEADER..];
    if rest.len() < AAGUID_LEN + 2 {
        return Err(CoseError::MalformedAttestation(
            "attested credential data truncated",
        ));
    }
    let cred_id_len =
        u16::from_be_bytes([rest[AAGUID_LEN], rest[AAGUID_LEN + 1]]) as usize;
    let cose_key_start = AAGUID_LEN + 2 + cred_id_len;
    if rest.len() <= cose_key_start {
        return Err(CoseError::MalformedAttestation(
            "credential ID overruns authData",
        ));
    }

    let cose_key = cbor::decode(&rest[cose_key_start..])?;
    let key_map = cose_key
        .as_map()
        .ok_or(CoseError::MalformedAttestation("COSE key is not a map"))?;

    // kty/crv are optional in what the extractor requires, but when
    // present they must name EC2 / P-256.
    if let Some(kty) = map_get_int(key_map, LABEL_KTY) {
        if kty != &Value::Unsigned(KTY_EC2) {
            return Err(CoseError::MalformedAttestation("COSE key kty is not EC2"));
        }
    }
    if let Some(crv) = map_get_int(key_map, LABEL_CRV) {
        if crv != &Value::Unsigned(CRV_P256) {
            return Err(CoseError::MalformedAttestation("COSE key crv is not P-256"));
        }
    }

    let x = map_get_int(key_map, LABEL_X)
        .ok_or(CoseError::MalformedAttestation("x coordinate missing"))?
        .as_bytes()
        .ok_or(CoseError::MalformedAttestation("x coordinate is not bytes"))?;
    let y = map_get_int(key_map, LABEL_Y)
        .ok_or(CoseError::MalformedAttestation("y coordinate missing"))?
        .as_bytes()
        .ok_or(CoseError::MalformedAttestation("y coordinate is not bytes"))?;
    if x.len() != 32 || y.len() != 32 {
        return Err(CoseError::MalformedAttestation(
            "coordinate is not 32 bytes",
        ));
    }

    let mut point = [0u8; 65];
    point[0] = 0x04;
    point[1..33].copy_from_slice(x);
    point[33..].copy_from_slice(y);

    // On-curve check before anything trusts this key.
    VerifyingKey::from_sec1_bytes(&point).map_err(|_| CoseError::InvalidPoint)?;

    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Value as CV;

    fn encode(v: &CV) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(v, &mut buf).unwrap();
        buf
    }

    fn cose_key(x: &[u8], y: &[u8]) -> Vec<u8> {
        encode(&CV::Map(vec![
            (CV::Integer(1.into()), CV::Integer(2.into())),
            (CV::Integer(3.into()), CV::Integer((-7i64).into())),
            (CV::Integer((-1i64).into()), CV::Integer(1.into())),
            (CV::Integer((-2i64).into()), CV::Bytes(x.to_vec())),
            (CV::Integer((-3i64).into()), CV::Bytes(y.to_vec())),
        ]))
    }

    fn auth_data(flags: u8, cred_id: &[u8], cose_key: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x11u8; 32]); // rpIdHash
        data.push(flags);
        data.extend_from_slice(&[0, 0, 0, 0]); // signCount
        data.extend_from_slice(&[0xF1u8; 16]); // AAGUID
        data.extend_from_slice(&(cred_id.len() as u16).to_be_bytes());
        data.extend_from_slice(cred_id);
        data.extend_from_slice(cose_key);
        data
    }

    fn attestation_object(auth_data: &[u8]) -> Vec<u8> {
        encode(&CV::Map(vec![
            (CV::Text("fmt".into()), CV::Text("packed".into())),
            (CV::Text("authData".into()), CV::Bytes(auth_data.to_vec())),
            (CV::Text("attStmt".into()), CV::Map(vec![])),
        ]))
    }

    /// A real P-256 point, so the on-curve check passes.
    fn real_point() -> ([u8; 32], [u8; 32]) {
        use p256::ecdsa::SigningKey;
        let key = SigningKey::from_slice(&[0x42u8; 32]).unwrap();
        let point = key.verifying_key().to_encoded_point(false);
        let sec1 = point.as_bytes();
        (sec1[1..33].try_into().unwrap(), sec1[33..65].try_into().unwrap())
    }

    #[test]
    fn test_extracts_uncompressed_point() {
        let (x, y) = real_point();
        let obj = attestation_object(&auth_data(0x41, &[0xAA; 32], &cose_key(&x, &y)));
        let point = extract_p256_public_key(&obj).unwrap();
        assert_eq!(point[0], 0x04);
        assert_eq!(&point[1..33], &x);
        assert_eq!(&point[33..], &y);
    }

    #[test]
    fn test_missing_auth_data_key() {
        let obj = encode(&CV::Map(vec![(
            CV::Text("fmt".into()),
            CV::Text("packed".into()),
        )]));
        assert!(matches!(
            extract_p256_public_key(&obj),
            Err(CoseError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn test_auth_data_too_short() {
        let obj = attestation_object(&[0u8; 37]);
        assert!(matches!(
            extract_p256_public_key(&obj),
            Err(CoseError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn test_at_flag_clear() {
        let (x, y) = real_point();
        // Same layout, but flags = UP only
        let obj = attestation_object(&auth_data(0x01, &[0xAA; 32], &cose_key(&x, &y)));
        assert!(matches!(
            extract_p256_public_key(&obj),
            Err(CoseError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn test_credential_id_overrun() {
        let (x, y) = real_point();
        let mut data = auth_data(0x41, &[0xAA; 32], &cose_key(&x, &y));
        // Lie about the credential-ID length
        data[53] = 0xFF;
        data[54] = 0xFF;
        let obj = attestation_object(&data);
        assert!(matches!(
            extract_p256_public_key(&obj),
            Err(CoseError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn test_coordinate_wrong_length() {
        let obj = attestation_object(&auth_data(
            0x41,
            &[0xAA; 32],
            &cose_key(&[0x01; 16], &[0x02; 32]),
        ));
        assert!(matches!(
            extract_p256_public_key(&obj),
            Err(CoseError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn test_wrong_kty_rejected() {
        let (x, y) = real_point();
        let key = encode(&CV::Map(vec![
            (CV::Integer(1.into()), CV::Integer(1.into())), // kty = OKP
            (CV::Integer((-2i64).into()), CV::Bytes(x.to_vec())),
            (CV::Integer((-3i64).into()), CV::Bytes(y.to_vec())),
        ]));
        let obj = attestation_object(&auth_data(0x41, &[0xAA; 32], &key));
        assert!(matches!(
            extract_p256_public_key(&obj),
            Err(CoseError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn test_off_curve_point_rejected() {
        // Coordinates of the right shape that are not on P-256.
        let obj = attestation_object(&auth_data(
            0x41,
            &[0xAA; 32],
            &cose_key(&[0x01; 32], &[0x02; 32]),
        ));
        assert!(matches!(
            extract_p256_public_key(&obj),
            Err(CoseError::InvalidPoint)
        ));
    }

    #[test]
    fn test_garbage_input_is_decode_error_not_panic() {
        assert!(extract_p256_public_key(&[0xff, 0xff, 0xff]).is_err());
        assert!(extract_p256_public_key(&[]).is_err());
    }
}
