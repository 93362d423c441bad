use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;

/// The fields of `clientDataJSON` this core cares about. The challenge is
/// base64url-encoded per the WebAuthn serialization rules.
#[derive(Debug, Deserialize)]
pub struct ClientData {
    #[serde(rename = "type")]
    pub request_type: String,
    pub challenge: String,
    #[serde(default)]
    pub origin: Option<String>,
}

/// Parse `clientDataJSON` and recover the raw challenge bytes.
///
/// The platform API never hands the challenge back separately, so this is
/// the only way a caller can replay-check what was actually signed.
/// Returns `None` on unparseable JSON or a non-base64url challenge; the
/// caller decides whether that matters.
pub fn extract_challenge(client_data_json: &[u8]) -> Option<Vec<u8>> {
    let data: ClientData = serde_json::from_slice(client_data_json).ok()?;
    URL_SAFE_NO_PAD.decode(data.challenge).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_roundtrip() {
        let challenge = [0x5Au8; 32];
        let json = format!(
            r#"{{"type":"webauthn.get","challenge":"{}","origin":"https://example.com","crossOrigin":false}}"#,
            URL_SAFE_NO_PAD.encode(challenge)
        );
        assert_eq!(
            extract_challenge(json.as_bytes()).as_deref(),
            Some(&challenge[..])
        );
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = br#"{"type":"webauthn.create","challenge":"AQID","extra":{"nested":[1,2]}}"#;
        assert_eq!(extract_challenge(json).as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_malformed_inputs_yield_none() {
        assert_eq!(extract_challenge(b"not json"), None);
        assert_eq!(extract_challenge(br#"{"type":"webauthn.get"}"#), None);
        // '!' is not base64url
        assert_eq!(
            extract_challenge(br#"{"type":"webauthn.get","challenge":"!!!"}"#),
            None
        );
    }
}
