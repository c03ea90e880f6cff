//! Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The mainnet boundary node. Agents bound here trust the hard-coded root key.
pub const PRODUCTION_HOST: &str = "https://ic0.app";

/// Domain identity-provider canisters are served from.
pub const IDENTITY_PROVIDER_DOMAIN: &str = "ic0.app";

/// Settings the host may override when constructing a [`Bridge`].
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `production_host` | `https://ic0.app` | Host used when none is given; the only host that skips the root-key fetch |
/// | `identity_provider_domain` | `ic0.app` | Login URL is `https://{canister_id}.{domain}` |
/// | `max_time_to_live_secs` | (absent) | Requested delegation lifetime |
/// | `derivation_origin` | (absent) | Alternative origin for principal derivation |
///
/// [`Bridge`]: crate::Bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    pub production_host: String,
    pub identity_provider_domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_to_live_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation_origin: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            production_host: PRODUCTION_HOST.into(),
            identity_provider_domain: IDENTITY_PROVIDER_DOMAIN.into(),
            max_time_to_live_secs: None,
            derivation_origin: None,
        }
    }
}

impl BridgeConfig {
    /// Whether an agent bound to `host` must fetch the root key first.
    ///
    /// Exact string comparison: anything other than the production host,
    /// including a trailing-slash variant of it, is treated as a local or
    /// test replica.
    pub fn requires_root_key(&self, host: &str) -> bool {
        host != self.production_host
    }

    /// `https://{canister_id}.{identity_provider_domain}`
    pub fn identity_provider_url(&self, canister_id: &str) -> String {
        format!("https://{}.{}", canister_id, self.identity_provider_domain)
    }

    pub fn max_time_to_live(&self) -> Option<Duration> {
        self.max_time_to_live_secs.map(Duration::from_secs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_host_skips_root_key() {
        let config = BridgeConfig::default();
        assert!(!config.requires_root_key("https://ic0.app"));
        assert!(config.requires_root_key("http://127.0.0.1:4943"));
        assert!(config.requires_root_key("https://ic0.app/"));
    }

    #[test]
    fn identity_provider_url() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.identity_provider_url("rdmx6-jaaaa-aaaaa-aaadq-cai"),
            "https://rdmx6-jaaaa-aaaaa-aaadq-cai.ic0.app"
        );
    }

    #[test]
    fn deserialize_partial_camel_case() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"identityProviderDomain":"localhost:4943","maxTimeToLiveSecs":3600}"#)
                .unwrap();
        assert_eq!(config.production_host, PRODUCTION_HOST);
        assert_eq!(config.identity_provider_domain, "localhost:4943");
        assert_eq!(config.max_time_to_live(), Some(Duration::from_secs(3600)));
    }
}
