//! Tessera CLI - Create, inspect and decode authentication credentials.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tessera_auth::bytes::{Bytes, BytesMut};
use tessera_auth::global::{
    self, auth_create, auth_destroy, auth_errno, auth_errstr, auth_fini, auth_get_gid,
    auth_get_host, auth_get_uid, auth_init, auth_pack, auth_print, auth_unpack, auth_verify,
};
use tessera_auth::{AuthConfig, AuthContext, ProtocolVersion, Registry};
use tessera_auth_hmac::HmacConfig;

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Tessera - Pluggable authentication credentials")]
#[command(version)]
struct Cli {
    /// Authentication configuration file (JSON)
    #[arg(short, long, env = "TESSERA_CONFIG")]
    config: Option<PathBuf>,

    /// Mechanism to load, overriding configuration and environment
    #[arg(long)]
    auth_type: Option<String>,

    /// auth/hmac configuration file (JSON); enables auth/hmac
    #[arg(long, env = "TESSERA_HMAC_CONFIG")]
    hmac_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered mechanisms
    Mechanisms,
    /// Create a credential and print it base64-encoded
    Encode {
        /// Mechanism options, e.g. "uid=1000,host=node01"
        #[arg(long)]
        info: Option<String>,
        /// Protocol version to encode for
        #[arg(long, default_value_t = ProtocolVersion::CURRENT.get())]
        protocol: u16,
    },
    /// Decode, verify and describe a base64-encoded credential
    Decode {
        /// Encoded credential
        credential: String,
        /// Protocol version the credential was encoded for
        #[arg(long, default_value_t = ProtocolVersion::CURRENT.get())]
        protocol: u16,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Describe an error code
    Errstr {
        /// Numeric error code
        #[arg(allow_hyphen_values = true)]
        code: i32,
    },
}

#[derive(Debug, Serialize)]
struct DecodedCredential {
    mechanism_id: u32,
    verified: bool,
    uid: u32,
    gid: u32,
    host: Option<String>,
    errno: i32,
    error: Option<String>,
}

// ============================================================================
// Setup
// ============================================================================

fn load_config(cli: &Cli) -> Result<AuthConfig> {
    let mut config = match &cli.config {
        Some(path) => AuthConfig::from_file(path)?,
        None => AuthConfig::default(),
    }
    .apply_env();

    if let Some(auth_type) = &cli.auth_type {
        config.auth_type = auth_type.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_registry(cli: &Cli) -> Result<Registry> {
    let mut registry = Registry::new();
    tessera_auth_none::register(&mut registry);

    if let Some(path) = &cli.hmac_config {
        let hmac = HmacConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        tessera_auth_hmac::register(&mut registry, hmac);
    }

    Ok(registry)
}

fn protocol(version: u16) -> ProtocolVersion {
    ProtocolVersion(version)
}

// ============================================================================
// Command Handlers
// ============================================================================

fn cmd_mechanisms(ctx: &AuthContext) {
    for name in ctx.registry().names() {
        let marker = if name == ctx.default_mechanism() {
            " (selected)"
        } else {
            ""
        };
        println!("{}{}", name, marker);
    }
}

fn cmd_encode(config: &AuthConfig, info: Option<String>, version: u16) -> Result<()> {
    auth_init(None).context("Failed to initialize authentication")?;

    let info = info.or_else(|| config.auth_info.clone());
    let cred = auth_create(info.as_deref()).context("Failed to create credential")?;

    let mut buf = BytesMut::new();
    auth_pack(&cred, &mut buf, protocol(version)).context("Failed to pack credential")?;
    auth_destroy(cred)?;

    println!("{}", BASE64.encode(&buf));
    Ok(())
}

fn cmd_decode(encoded: &str, version: u16, format: &str) -> Result<()> {
    let raw = BASE64
        .decode(encoded.trim())
        .context("Credential is not valid base64")?;

    auth_init(None).context("Failed to initialize authentication")?;

    let mut buf = Bytes::from(raw);
    let cred = match auth_unpack(&mut buf, protocol(version)) {
        Ok(cred) => cred,
        Err(e) => bail!("Failed to unpack credential: {}", auth_errstr(e.code().raw())),
    };

    let verify = auth_verify(&cred, None);
    let decoded = DecodedCredential {
        mechanism_id: cred.mechanism_id(),
        verified: verify.is_ok(),
        uid: auth_get_uid(&cred, None),
        gid: auth_get_gid(&cred, None),
        host: auth_get_host(&cred, None),
        errno: auth_errno(&cred).raw(),
        error: verify
            .as_ref()
            .err()
            .map(|e| auth_errstr(e.code().raw()).into_owned()),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        },
        "text" => {
            auth_print(&cred, &mut io::stdout().lock())?;
            println!("verified: {}", decoded.verified);
            if let Some(error) = &decoded.error {
                println!("error:    {}", error);
            }
            println!("uid:      {}", decoded.uid);
            println!("gid:      {}", decoded.gid);
            println!("host:     {}", decoded.host.as_deref().unwrap_or("(unknown)"));
        },
        other => bail!("Unknown format: {}", other),
    }

    auth_destroy(cred)?;
    Ok(())
}

fn cmd_errstr(code: i32) {
    println!("{}", auth_errstr(code));
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let registry = build_registry(&cli)?;

    tracing::debug!(auth_type = %config.auth_type, "Authentication configured");

    let ctx = global::install(AuthContext::from_config(registry, &config))?;

    let result = match cli.command {
        Commands::Mechanisms => {
            cmd_mechanisms(ctx);
            Ok(())
        },
        Commands::Encode { info, protocol } => cmd_encode(&config, info, protocol),
        Commands::Decode {
            credential,
            protocol,
            format,
        } => cmd_decode(&credential, protocol, &format),
        Commands::Errstr { code } => {
            cmd_errstr(code);
            Ok(())
        },
    };

    if let Err(e) = auth_fini() {
        tracing::warn!(error = %e, "Failed to release authentication mechanism");
    }

    result
}
