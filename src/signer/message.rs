use rand::Rng;
use serde::{Deserialize, Serialize};

/// A signed application message: the action plus the timestamp/nonce pair
/// that makes it single-use. The remote verifier recomputes the payload
/// from the transmitted triple, so all three travel with the signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub action: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// Random positive integer, fresh per call.
    pub nonce: u64,
    /// DER-encoded ECDSA/P-256 signature over SHA-256 of the payload.
    #[serde(with = "crate::encoding::b64")]
    pub signature: Vec<u8>,
}

impl SignedMessage {
    /// The exact string the signature covers: `action + timestamp + nonce`,
    /// decimal, no separators.
    pub fn payload(&self) -> String {
        format!("{}{}{}", self.action, self.timestamp, self.nonce)
    }
}

pub(crate) fn fresh_nonce() -> u64 {
    // Positive and in i64 range so JSON consumers on 64-bit signed
    // integers parse it unchanged.
    rand::thread_rng().gen_range(1..=i64::MAX as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_concatenation() {
        let msg = SignedMessage {
            action: "register".into(),
            timestamp: 1_764_000_000,
            nonce: 42,
            signature: vec![],
        };
        assert_eq!(msg.payload(), "register176400000042");
    }

    #[test]
    fn test_json_roundtrip_with_base64_signature() {
        let msg = SignedMessage {
            action: "login".into(),
            timestamp: 1_764_000_123,
            nonce: 7,
            signature: vec![0x30, 0x44, 0x02, 0x20],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"signature\":\"MEQCIA==\""));
        assert!(json.contains("\"timestamp\":1764000123"));
        let back: SignedMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.action, "login");
        assert_eq!(back.nonce, 7);
        assert_eq!(back.signature, msg.signature);
    }

    #[test]
    fn test_nonce_is_positive() {
        for _ in 0..64 {
            assert!(fresh_nonce() >= 1);
        }
    }
}
