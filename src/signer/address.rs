use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Sui signature-scheme flag for secp256r1 accounts.
const SECP256R1_FLAG: u8 = 0x02;

/// Derive the chain account address for an uncompressed P-256 public key.
///
/// Sui rule: `0x` + hex(BLAKE2b-256(flag || compressed-point)), where the
/// compressed point is the usual 33-byte SEC1 form. Pure function of the
/// key — same key, same address, forever.
pub fn derive_address(public_key: &[u8; 65]) -> String {
    let mut preimage = [0u8; 34];
    preimage[0] = SECP256R1_FLAG;
    // Compress in place: parity of y picks the 0x02/0x03 prefix.
    preimage[1] = 0x02 | (public_key[64] & 1);
    preimage[2..].copy_from_slice(&public_key[1..33]);

    let digest = Blake2b256::digest(preimage);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("0x{hex}")
}
