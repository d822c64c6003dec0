//! ML-DSA-65 key generation tool for delegates
//!
//! Generates the signing keypair a delegate uses for block production and
//! ticket settlement, and prints the address that owns its outputs.
//!
//! Usage:
//!   cargo run --bin keygen -- --name "delegate-07" --output ./keys/

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tombola::Address;
use tombola::crypto::{Keypair, MLDSA65_PUBKEY_SIZE, MLDSA65_SECRET_SIZE, verify};

#[derive(Parser)]
#[command(name = "keygen", version, about = "Tombola ML-DSA-65 Key Generator")]
struct Args {
    /// Delegate name (used for file names)
    #[arg(short, long)]
    name: String,

    /// Output directory for keys
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    println!("════════════════════════════════════════════════════════════");
    println!("  Tombola ML-DSA-65 Keypair Generator");
    println!("════════════════════════════════════════════════════════════");
    println!();
    println!("Generating keypair for: {}", args.name);
    println!();

    let keypair = Keypair::generate();
    let pubkey_bytes = keypair.public_key();
    let secret_bytes = keypair.secret_bytes();

    // Informational only; library versions may differ slightly
    if pubkey_bytes.len() != MLDSA65_PUBKEY_SIZE {
        eprintln!(
            "Note: Public key size {} differs from expected {}",
            pubkey_bytes.len(),
            MLDSA65_PUBKEY_SIZE
        );
    }
    if secret_bytes.len() != MLDSA65_SECRET_SIZE {
        eprintln!(
            "Note: Secret key size {} differs from expected {}",
            secret_bytes.len(),
            MLDSA65_SECRET_SIZE
        );
    }

    fs::create_dir_all(&args.output).expect("Failed to create output directory");

    let secret_path = args.output.join(format!("{}_secret.key", args.name));
    fs::write(&secret_path, secret_bytes).expect("Failed to write secret key");
    println!("Secret key saved to: {}", secret_path.display());
    println!("  Size: {} bytes", secret_bytes.len());
    println!();

    let pubkey_path = args.output.join(format!("{}_public.key", args.name));
    fs::write(&pubkey_path, pubkey_bytes).expect("Failed to write public key");
    println!("Public key saved to: {}", pubkey_path.display());
    println!("  Size: {} bytes", pubkey_bytes.len());
    println!();

    println!("════════════════════════════════════════════════════════════");
    println!("  Delegate Address");
    println!("════════════════════════════════════════════════════════════");
    println!();
    println!("{}", Address::from_public_key(pubkey_bytes));
    println!();

    println!("════════════════════════════════════════════════════════════");
    println!("  Public Key (hex, first 64 bytes)");
    println!("════════════════════════════════════════════════════════════");
    println!();
    println!("{}", hex::encode(&pubkey_bytes[..64]));
    println!("... ({} more bytes)", pubkey_bytes.len() - 64);
    println!();

    println!("════════════════════════════════════════════════════════════");
    println!("  Verification Test");
    println!("════════════════════════════════════════════════════════════");
    println!();

    let test_message = b"Tombola delegate key self-test";
    let signature = keypair.sign(test_message);
    match verify(pubkey_bytes, test_message, &signature) {
        Ok(()) => println!("  Signature verification: PASSED"),
        Err(_) => {
            println!("  Signature verification: FAILED");
            std::process::exit(1);
        }
    }
    println!();

    println!("Store {}_secret.key outside version control.", args.name);
    println!("The delegate loads it at startup to sign produced blocks.");
    println!();
}
