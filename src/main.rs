use anyhow::Context as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;
use rand::RngCore;

use wingseal::config::{Command, Config};
use wingseal::{photo, SealedFileStore, Signer};

fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();

    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();

    match cfg.command {
        Command::Verify {
            message,
            signature,
            public_key,
        } => {
            // Pure verification needs no key store.
            let signature = BASE64.decode(signature).context("signature is not base64")?;
            let public_key = BASE64.decode(public_key).context("public key is not base64")?;
            let ok = wingseal::verify_signature(&signature, message.as_bytes(), &public_key);
            println!("{}", if ok { "valid" } else { "INVALID" });
            if !ok {
                std::process::exit(1);
            }
            return Ok(());
        }
        Command::PhotoVerify { input } => {
            let image = std::fs::read(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let result = photo::verify_photo(&image);
            match (&result.is_valid, &result.failure) {
                (true, _) => {
                    let att = result.attestation.as_ref().expect("valid implies attestation");
                    println!("valid");
                    println!("  signer:  {}", att.sui_address);
                    println!("  signed:  {}", att.timestamp);
                }
                (false, Some(failure)) => {
                    println!("INVALID: {failure:?}");
                    if let (Some(current), Some(expected)) =
                        (&result.current_hash, &result.expected_hash)
                    {
                        println!("  current hash:  {}", BASE64.encode(current));
                        println!("  expected hash: {}", BASE64.encode(expected));
                    }
                    std::process::exit(1);
                }
                (false, None) => unreachable!("failed verification always carries a reason"),
            }
            return Ok(());
        }
        _ => {}
    }

    // Everything else operates on the account keypair.
    let signer = open_signer(&cfg)?;
    match cfg.command {
        Command::Keygen => {
            let public = signer.generate_keypair()?;
            println!("public key: {}", BASE64.encode(public));
            println!("address:    {}", signer.address().expect("key just generated"));
        }
        Command::Address => match signer.address() {
            Some(address) => println!("{address}"),
            None => anyhow::bail!("no keypair; run `wingseal keygen` first"),
        },
        Command::ExportKey => match signer.export_private_key() {
            Some(encoded) => {
                eprintln!("warning: this is your private key, keep it secret");
                println!("{encoded}");
            }
            None => anyhow::bail!("no keypair; run `wingseal keygen` first"),
        },
        Command::ImportKey { key } => {
            let public = signer.import_private_key(&key)?;
            println!("public key: {}", BASE64.encode(public));
            println!("address:    {}", signer.address().expect("key just imported"));
        }
        Command::Sign { action } => {
            let message = signer.sign_action(&action)?;
            println!("{}", serde_json::to_string_pretty(&message)?);
        }
        Command::PhotoSign { input, output } => {
            let image = std::fs::read(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let signed = photo::sign_photo(&signer, &image)?;
            std::fs::write(&output, &signed.signed_bytes)
                .with_context(|| format!("cannot write {}", output.display()))?;
            println!("signed {} -> {}", input.display(), output.display());
            println!("  signer: {}", signed.attestation.sui_address);
            println!("  hash:   {}", BASE64.encode(&signed.attestation.photo_hash));
        }
        Command::Verify { .. } | Command::PhotoVerify { .. } => unreachable!("handled above"),
    }
    Ok(())
}

/// Open the signer over the sealed file store in `data_dir`.
///
/// The store key lives next to the sealed files; on-device it would come
/// from the platform keychain instead (that seam is [`wingseal::KeyStore`]).
fn open_signer(cfg: &Config) -> anyhow::Result<Signer<SealedFileStore>> {
    std::fs::create_dir_all(&cfg.data_dir)?;
    let key_path = cfg.data_dir.join("store.key");
    let aes_key: [u8; 32] = if key_path.exists() {
        std::fs::read(&key_path)?
            .as_slice()
            .try_into()
            .context("store.key is not 32 bytes")?
    } else {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        std::fs::write(&key_path, key)?;
        key
    };
    let store = SealedFileStore::new(aes_key, cfg.data_dir.join("keys"))?;
    Ok(Signer::new(store)?)
}
