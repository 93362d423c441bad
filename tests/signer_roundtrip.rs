use wingseal::keystore::SealedFileStore;
use wingseal::{verify_signature, Signer};

fn sealed_signer(key: [u8; 32], dir: &std::path::Path) -> Signer<SealedFileStore> {
    let store = SealedFileStore::new(key, dir.to_path_buf()).unwrap();
    Signer::new(store).unwrap()
}

#[test]
fn test_keypair_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let aes_key = [0xAB; 32];

    let (public, address) = {
        let signer = sealed_signer(aes_key, dir.path());
        let public = signer.generate_keypair().unwrap();
        (public, signer.address().unwrap())
    };

    // Fresh signer over the same store — simulated restart
    let signer = sealed_signer(aes_key, dir.path());
    assert_eq!(signer.public_key(), Some(public));
    assert_eq!(
        signer.address(),
        Some(address),
        "address must be stable across restarts"
    );

    let sig = signer.sign_message("after restart").unwrap();
    assert!(verify_signature(&sig, b"after restart", &public));
}

#[test]
fn test_export_import_across_stores() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let a = sealed_signer([0x01; 32], dir_a.path());
    let public = a.generate_keypair().unwrap();
    let exported = a.export_private_key().unwrap();

    // Import into an unrelated store, different AES key
    let b = sealed_signer([0x02; 32], dir_b.path());
    let imported = b.import_private_key(&exported).unwrap();
    assert_eq!(imported, public);
    assert_eq!(a.address(), b.address());
}

#[test]
fn test_signature_bound_to_message_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let signer = sealed_signer([0x11; 32], dir.path());
    let public = signer.generate_keypair().unwrap();

    let sig = signer.sign_message("pay 10").unwrap();
    assert!(verify_signature(&sig, b"pay 10", &public));
    assert!(!verify_signature(&sig, b"pay 99", &public));

    // Another key must not validate it
    let other = signer.generate_keypair().unwrap();
    assert_ne!(other, public);
    assert!(!verify_signature(&sig, b"pay 10", &other));
}

#[test]
fn test_signed_action_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let signer = sealed_signer([0x22; 32], dir.path());
    let public = signer.generate_keypair().unwrap();

    let message = signer.sign_action("createPost").unwrap();
    let json = serde_json::to_string(&message).unwrap();
    let back: wingseal::SignedMessage = serde_json::from_str(&json).unwrap();

    // The transmitted triple reconstructs the exact signed payload
    assert!(verify_signature(
        &back.signature,
        back.payload().as_bytes(),
        &public
    ));
}

#[test]
fn test_generate_overwrites_previous_key() {
    let dir = tempfile::tempdir().unwrap();
    let aes_key = [0x33; 32];
    let signer = sealed_signer(aes_key, dir.path());

    let first = signer.generate_keypair().unwrap();
    let second = signer.generate_keypair().unwrap();
    assert_ne!(first, second);

    // Only the second key persists
    let reloaded = sealed_signer(aes_key, dir.path());
    assert_eq!(reloaded.public_key(), Some(second));
}
