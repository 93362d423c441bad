#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("CBOR: {0}")]
    Cbor(#[from] crate::cbor::DecodeError),
    #[error("COSE: {0}")]
    Cose(#[from] crate::webauthn::CoseError),
    #[error("Signer: {0}")]
    Signer(#[from] crate::signer::SignerError),
    #[error("Photo: {0}")]
    Photo(#[from] crate::photo::PhotoError),
    #[error("Bridge: {0}")]
    Bridge(#[from] crate::webauthn::BridgeError),
    #[error("Store: {0}")]
    Store(#[from] crate::keystore::StoreError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
