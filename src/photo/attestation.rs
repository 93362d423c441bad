use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SIGNATURE_ALGORITHM: &str = "ECDSA-P256";
pub const HASH_ALGORITHM: &str = "BLAKE2b-256";
pub const ATTESTATION_VERSION: &str = "1.0";

/// The attestation embedded in a signed photograph.
///
/// The JSON schema is wire-compatible with the mobile client and must
/// round-trip exactly: camelCase keys, binary fields base64, ISO-8601
/// timestamp. `sui_address` is informational — verification never treats
/// it as more than a label for the key holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoAttestation {
    /// DER-encoded ECDSA/P-256 signature over the photo hash.
    #[serde(with = "crate::encoding::b64")]
    pub signature: Vec<u8>,
    /// BLAKE2b-256 of the image bytes with attestation metadata stripped.
    #[serde(with = "crate::encoding::b64")]
    pub photo_hash: Vec<u8>,
    /// Signer's 65-byte uncompressed public point.
    #[serde(with = "crate::encoding::b64")]
    pub public_key: Vec<u8>,
    pub sui_address: String,
    pub timestamp: DateTime<Utc>,
    pub signature_algorithm: String,
    pub hash_algorithm: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PhotoAttestation {
        PhotoAttestation {
            signature: vec![0x30, 0x44],
            photo_hash: vec![0xAB; 32],
            public_key: vec![0x04; 65],
            sui_address: "0xabc123".into(),
            timestamp: "2026-08-26T10:00:00Z".parse().unwrap(),
            signature_algorithm: SIGNATURE_ALGORITHM.into(),
            hash_algorithm: HASH_ALGORITHM.into(),
            version: ATTESTATION_VERSION.into(),
        }
    }

    #[test]
    fn test_schema_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "signature",
            "photoHash",
            "publicKey",
            "suiAddress",
            "timestamp",
            "signatureAlgorithm",
            "hashAlgorithm",
            "version",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 8, "schema must carry exactly these fields");
        // Binary fields are base64 strings
        assert!(obj["photoHash"].is_string());
        // ISO-8601 timestamp
        assert!(obj["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_json_roundtrip() {
        let a = sample();
        let json = serde_json::to_string(&a).unwrap();
        let b: PhotoAttestation = serde_json::from_str(&json).unwrap();
        assert_eq!(b.signature, a.signature);
        assert_eq!(b.photo_hash, a.photo_hash);
        assert_eq!(b.public_key, a.public_key);
        assert_eq!(b.sui_address, a.sui_address);
        assert_eq!(b.timestamp, a.timestamp);
    }
}
