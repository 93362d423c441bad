pub mod attestation;
pub mod container;
pub mod service;

pub use attestation::PhotoAttestation;
pub use container::ImageFormat;
pub use service::{sign_photo, verify_photo, SignedPhoto, VerificationResult, VerifyFailure};

use crate::signer::SignerError;

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("unsupported image format")]
    UnsupportedFormat,
    #[error("malformed {0} container: {1}")]
    Codec(&'static str, &'static str),
    #[error("metadata write failed: {0}")]
    MetadataWrite(&'static str),
    #[error("signer: {0}")]
    Signer(#[from] SignerError),
}
