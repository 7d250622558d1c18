//! `payload-tool`: encrypt or decrypt a JSON payload from the command line.
//!
//! Startup sequence:
//! 1. Parse arguments.
//! 2. Load and validate [`Settings`] from `PAYLOAD_TOOL_*` variables.
//! 3. Initialise structured JSON logging on stderr.
//! 4. Run the command; payloads are written to stdout.

mod codec;
mod config;
mod telemetry;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use client_encryption::EncryptionCertificate;

use codec::Codec;
use config::Settings;

#[derive(Debug, Parser)]
#[command(name = "payload-tool", version, about = "Field-level and JWE encryption of JSON payloads")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encrypt the configured paths of a payload.
    Encrypt {
        /// Payload file; stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Decrypt the configured paths of a payload.
    Decrypt {
        /// Payload file; stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print the fingerprints of a certificate or public key.
    InspectCertificate {
        file: PathBuf,
        /// Also print the PEM rendering.
        #[arg(long)]
        pem: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (encrypt, input) = match cli.command {
        Command::InspectCertificate { file, pem } => return inspect_certificate(&file, pem),
        Command::Encrypt { input } => (true, input),
        Command::Decrypt { input } => (false, input),
    };

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------
    let settings = Settings::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: payload-tool configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&settings.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), scheme = ?settings.scheme, "payload-tool starting");

    let codec = Codec::from_settings(&settings)?;
    let payload = read_payload(input.as_deref())?;
    let output = if encrypt {
        codec.encrypt(&payload)?
    } else {
        codec.decrypt(&payload)?
    };
    debug!(bytes = output.len(), "payload written");

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}").context("failed to write the payload to stdout")?;
    Ok(())
}

fn read_payload(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload from {}", path.display())),
        None => {
            let mut payload = String::new();
            std::io::stdin()
                .read_to_string(&mut payload)
                .context("failed to read payload from stdin")?;
            Ok(payload)
        }
    }
}

fn inspect_certificate(file: &Path, pem: bool) -> Result<()> {
    let key = EncryptionCertificate::load(file)
        .and_then(|certificate| certificate.parse())
        .with_context(|| format!("failed to read certificate {}", file.display()))?;

    let mut stdout = std::io::stdout().lock();
    if let Some(fingerprint) = key.certificate_fingerprint() {
        writeln!(stdout, "certificate fingerprint: {fingerprint}")?;
    }
    writeln!(stdout, "key fingerprint: {}", key.key_fingerprint())?;
    if pem {
        write!(stdout, "{}", key.to_pem())?;
    }
    Ok(())
}
