//! CLI configuration, populated from flags or environment variables.

use clap::Args;
use icp_bridge::{config::IDENTITY_PROVIDER_DOMAIN, BridgeConfig, PRODUCTION_HOST};

/// Network settings shared by every subcommand.
///
/// | Flag | Variable | Default |
/// |------|----------|---------|
/// | `--production-host` | `ICPB_PRODUCTION_HOST` | `https://ic0.app` |
/// | `--ii-domain` | `ICPB_II_DOMAIN` | `ic0.app` |
#[derive(Debug, Clone, Args)]
pub struct CliConfig {
    /// Host treated as mainnet; every other host needs a root-key fetch.
    #[arg(long, global = true, env = "ICPB_PRODUCTION_HOST", default_value = PRODUCTION_HOST)]
    pub production_host: String,

    /// Domain identity-provider canisters are served from.
    #[arg(long, global = true, env = "ICPB_II_DOMAIN", default_value = IDENTITY_PROVIDER_DOMAIN)]
    pub ii_domain: String,
}

impl CliConfig {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            production_host: self.production_host.clone(),
            identity_provider_domain: self.ii_domain.clone(),
            ..BridgeConfig::default()
        }
    }
}
