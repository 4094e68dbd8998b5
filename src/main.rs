//! dual-auth - operator tooling for the split-domain token service
//!
//! ```text
//! dual-auth keygen                                   new Ed25519 key pair (PEM)
//! dual-auth hash <password>                          Argon2 hash for the user store
//! dual-auth issue <api|admin> <id> <email> [--admin] mint a token pair
//! dual-auth verify <api|admin> <token> [--refresh]   check a token
//! dual-auth --version
//! ```
//!
//! Common flags: `--env <name>` (default `dev`, loads `config/<name>.yaml`)
//! and `--config <path>`.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use dual_auth::keys::{generate_key_pair, public_key_fingerprint};
use dual_auth::{
    AuthConfig, Domain, KeyMaterialProvider, PasswordHasher, Principal, TokenIssuer,
    TokenVerifier, VerificationOutcome, VerifyOptions,
};

/// Flags that consume the following argument.
const VALUE_FLAGS: [&str; 3] = ["--env", "-e", "--config"];

fn get_flag_value(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if names.contains(&args[i].as_str()) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().any(|a| a == name)
}

fn get_env() -> String {
    get_flag_value(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

/// Arguments after the program name, without flags.
fn positional_args() -> Vec<String> {
    let mut out = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
        } else if !arg.starts_with("--") {
            out.push(arg);
        }
    }
    out
}

fn load_config(env: &str) -> Result<AuthConfig> {
    if let Some(path) = get_flag_value(&["--config"]) {
        let config = AuthConfig::from_file(&path)
            .with_context(|| format!("Failed to load config {}", path))?;
        return Ok(config.apply_env_overrides()?);
    }

    let default_path = format!("config/{}.yaml", env);
    if Path::new(&default_path).exists() {
        return AuthConfig::load(env).with_context(|| format!("Failed to load {}", default_path));
    }

    // No file: defaults plus environment
    Ok(AuthConfig::default().apply_env_overrides()?)
}

fn parse_domain(raw: Option<&String>) -> Result<Domain> {
    let Some(raw) = raw else {
        bail!("missing domain (api|admin)");
    };
    Ok(raw.parse()?)
}

fn usage() -> &'static str {
    "usage: dual-auth <keygen | hash <password> | issue <api|admin> <id> <email> [--admin] | verify <api|admin> <token> [--refresh]> [--env <name>] [--config <path>]"
}

/// Prints the claims of a valid token or the rejection reason.
fn verify_token(
    config: &AuthConfig,
    domain: Domain,
    token: &str,
    options: VerifyOptions,
) -> Result<bool> {
    let keys = Arc::new(KeyMaterialProvider::new(config)?);
    match TokenVerifier::new(keys).verify(token, domain, options)? {
        VerificationOutcome::Valid { claims } => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(true)
        }
        VerificationOutcome::Invalid { reason } => {
            tracing::warn!(domain = %domain, reason = ?reason, "Token rejected");
            eprintln!("invalid: {}", reason);
            Ok(false)
        }
    }
}

fn main() -> Result<ExitCode> {
    if has_flag("--version") {
        println!("dual-auth {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
        return Ok(ExitCode::SUCCESS);
    }

    let env = get_env();
    let config = load_config(&env)?;
    let _log_guard = dual_auth::logging::init_logging(&config);

    tracing::info!(env = %env, environment = %config.environment, "dual-auth starting");

    let args = positional_args();
    let Some(command) = args.first() else {
        bail!(usage());
    };

    match command.as_str() {
        "keygen" => {
            let pair = generate_key_pair()?;
            print!("{}", pair.private_pem);
            print!("{}", pair.public_pem);
            if let Some(fp) = public_key_fingerprint(&pair.public_pem) {
                println!("fingerprint: {}", fp);
            }
        }
        "hash" => {
            let Some(password) = args.get(1) else {
                bail!("missing password");
            };
            let hasher = PasswordHasher::from_config(&config.password);
            println!("{}", hasher.hash(password)?);
        }
        "issue" => {
            let domain = parse_domain(args.get(1))?;
            let (Some(id), Some(email)) = (args.get(2), args.get(3)) else {
                bail!("usage: dual-auth issue <api|admin> <id> <email> [--admin]");
            };
            let principal = Principal::new(id.as_str(), email.as_str()).with_admin(has_flag("--admin"));

            let keys = Arc::new(KeyMaterialProvider::new(&config)?);
            let pair = TokenIssuer::new(keys).issue(&principal, domain)?;
            println!("{}", serde_json::to_string_pretty(&pair)?);
        }
        "verify" => {
            let domain = parse_domain(args.get(1))?;
            let Some(token) = args.get(2) else {
                bail!("missing token");
            };
            let options = if has_flag("--refresh") {
                VerifyOptions::refresh()
            } else {
                VerifyOptions::access()
            };

            // Returning keeps the log guard alive until buffered lines are flushed
            if !verify_token(&config, domain, token, options)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        other => bail!("unknown command {:?}\n{}", other, usage()),
    }

    Ok(ExitCode::SUCCESS)
}
