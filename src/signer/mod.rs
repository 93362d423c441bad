pub mod address;
pub mod keypair;
pub mod message;

pub use address::derive_address;
pub use keypair::{verify_signature, Signer, SignerError, KEY_LABEL, PUBLIC_KEY_LEN};
pub use message::SignedMessage;
