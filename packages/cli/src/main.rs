//! `icpb`: command-line companion to the ICP agent bridge.
//!
//! Works with the same key files and principals a browser host uses:
//!
//! - **`identity new`**: generate an Ed25519 key in the agent-js JSON format.
//! - **`identity principal`**: print the principal of a key file.
//! - **`principal`**: check a principal and print its canonical form.
//! - **`login-url`**: print the Internet Identity URL for a canister.
//! - **`root-key`**: report whether agents for a host fetch the root key.
//!
//! Key files are read from a path or from stdin (`-`).

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use icp_bridge::{identity_from_key, Ed25519KeyIdentity, Ed25519Library, Principal};
use tracing::{debug, info};

use config::CliConfig;

/// icpb: ICP agent bridge CLI
///
/// Inspect identities, principals and login endpoints.
#[derive(Parser)]
#[command(name = "icpb", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: CliConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or inspect Ed25519 key files.
    #[command(subcommand)]
    Identity(IdentityCommand),

    /// Check a principal and print its canonical text and raw bytes.
    ///
    /// Exits 0 if valid, 1 otherwise.
    Principal {
        /// Principal text, e.g. `ryjl3-tyaaa-aaaaa-aaaba-cai`.
        text: String,
    },

    /// Print the identity-provider URL `authenticateWithII` opens.
    LoginUrl {
        /// Canister id of the identity provider.
        canister_id: String,
    },

    /// Report whether an agent bound to HOST fetches the root key first.
    RootKey {
        /// Replica or boundary-node URL, e.g. `http://127.0.0.1:4943`.
        host: String,
    },
}

#[derive(Subcommand)]
enum IdentityCommand {
    /// Generate a key and print it as `["<der hex>", "<private hex>"]`.
    ///
    /// The output contains the private key. The principal goes to stderr so
    /// stdout can be redirected straight into a key file.
    New {
        /// Write the key here instead of stdout. Refuses to overwrite.
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Print the principal of a key file.
    ///
    /// Pass `-` as FILE to read from stdin.
    Principal {
        /// Path to a key file, or `-` for stdin.
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "icp_bridge=info,icpb=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let bridge_config = cli.config.bridge_config();
    debug!(?bridge_config, "configuration");

    match cli.command {
        Command::Identity(IdentityCommand::New { out }) => {
            let identity = Ed25519KeyIdentity::generate();
            let json = identity.to_json().to_string();

            match out {
                Some(path) => {
                    if path.exists() {
                        fatal(&format!("{} already exists", path.display()));
                    }
                    fs::write(&path, format!("{json}\n")).unwrap_or_else(|e| {
                        fatal(&format!("failed to write {}: {}", path.display(), e))
                    });
                    info!(path = %path.display(), "key written");
                }
                None => println!("{json}"),
            }
            eprintln!("principal: {}", identity.principal());
        }

        Command::Identity(IdentityCommand::Principal { file }) => {
            let key = read_input(&file);
            let identity = identity_from_key(&Ed25519Library, key.trim())
                .unwrap_or_else(|e| fatal(&format!("invalid key file: {e}")));
            println!("{}", identity.principal());
        }

        Command::Principal { text } => match Principal::from_text(&text) {
            Ok(principal) => {
                println!("{principal}");
                println!("bytes: {}", hex::encode(principal.as_slice()));
                if principal.is_anonymous() {
                    println!("kind: anonymous");
                } else if principal.is_self_authenticating() {
                    println!("kind: self-authenticating");
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        },

        Command::LoginUrl { canister_id } => {
            println!("{}", bridge_config.identity_provider_url(&canister_id));
        }

        Command::RootKey { host } => {
            if bridge_config.requires_root_key(&host) {
                println!("fetch: {host} is not {}", bridge_config.production_host);
            } else {
                println!("skip: {host} is the production host");
            }
        }
    }
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("icpb: {}", msg);
    process::exit(2);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login_url_with_domain_override() {
        let cli = Cli::try_parse_from([
            "icpb",
            "--ii-domain",
            "localhost:4943",
            "login-url",
            "rdmx6-jaaaa-aaaaa-aaadq-cai",
        ])
        .unwrap();
        let config = cli.config.bridge_config();
        assert_eq!(
            config.identity_provider_url("rdmx6-jaaaa-aaaaa-aaadq-cai"),
            "https://rdmx6-jaaaa-aaaaa-aaadq-cai.localhost:4943"
        );
    }

    #[test]
    fn global_flags_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "icpb",
            "root-key",
            "http://127.0.0.1:4943",
            "--production-host",
            "http://127.0.0.1:4943",
        ])
        .unwrap();
        assert!(!cli
            .config
            .bridge_config()
            .requires_root_key("http://127.0.0.1:4943"));
    }

    #[test]
    fn identity_principal_requires_file() {
        assert!(Cli::try_parse_from(["icpb", "identity", "principal"]).is_err());
    }
}
