pub mod assertion;
pub mod bridge;
pub mod client_data;
pub mod cose;

pub use assertion::verify_assertion;
pub use bridge::{
    AssertionResponse, BridgeError, PasskeyBridge, PasskeyRequest, RegisteredCredential,
    SignatureResult,
};
pub use client_data::extract_challenge;
pub use cose::{extract_p256_public_key, CoseError};
