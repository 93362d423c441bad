use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(name = "wingseal", about = "P-256 identity and photo attestation tool")]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Directory holding the sealed key store.
    #[arg(long, default_value = ".wingseal")]
    pub data_dir: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Generate a fresh keypair, replacing any existing one.
    Keygen,
    /// Print the account address for the current keypair.
    Address,
    /// Print the private key, base64-encoded. Sensitive output.
    ExportKey,
    /// Replace the keypair with a base64-encoded private key.
    ImportKey { key: String },
    /// Sign an action string; prints the signed-message JSON.
    Sign {
        #[arg(long)]
        action: String,
    },
    /// Check a detached signature over a message (signature and public
    /// key base64-encoded).
    Verify {
        #[arg(long)]
        message: String,
        #[arg(long)]
        signature: String,
        #[arg(long)]
        public_key: String,
    },
    /// Sign a photograph and write the attested copy.
    PhotoSign { input: PathBuf, output: PathBuf },
    /// Verify a photograph's embedded attestation.
    PhotoVerify { input: PathBuf },
}
