//! The Agent Bridge, the object hosts talk to.
//!
//! A [`Bridge`] is built from its three injected libraries plus a
//! [`BridgeConfig`] and exposes the eight host operations. It keeps no
//! session state: every call is one request/response (or one login round
//! trip) against the libraries, and results and errors come back as the
//! libraries produced them.

use futures::future::{AbortRegistration, Abortable};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::document::{self, DecryptedDocument, EncryptedDocument};
use crate::error::{KeyError, LoginError};
use crate::library::{
    ActorConfig, AgentLibrary, AuthProvider, IdentityLibrary, LoginOptions, VerificationActor,
};

/// Options for [`Bridge::create_actor`].
///
/// `identity` and `host` configure the agent the actor is bound to;
/// `extra` travels to the agent library untouched.
#[derive(Debug, Clone)]
pub struct ActorOptions<Identity, Extra> {
    pub identity: Option<Identity>,
    pub host: Option<String>,
    pub extra: Extra,
}

impl<Identity, Extra: Default> Default for ActorOptions<Identity, Extra> {
    fn default() -> Self {
        Self {
            identity: None,
            host: None,
            extra: Extra::default(),
        }
    }
}

/// Parse `serialized_key` as JSON and hand it to `library`.
///
/// Fails with [`KeyError::Malformed`] on anything that is not JSON; the
/// library's own rejection of well-formed JSON comes back as
/// [`KeyError::Library`].
pub fn identity_from_key<L: IdentityLibrary>(
    library: &L,
    serialized_key: &str,
) -> Result<L::Identity, KeyError<L::Error>> {
    let parsed: serde_json::Value =
        serde_json::from_str(serialized_key).map_err(KeyError::Malformed)?;
    library
        .identity_from_parsed_json(&parsed)
        .map_err(KeyError::Library)
}

/// Internet Computer agent operations over injected libraries.
pub struct Bridge<A, I, P> {
    agents: A,
    identities: I,
    auth: P,
    config: BridgeConfig,
}

impl<A, I, P> Bridge<A, I, P>
where
    A: AgentLibrary,
    I: IdentityLibrary<Identity = A::Identity>,
    P: AuthProvider<Identity = A::Identity>,
{
    pub fn new(agents: A, identities: I, auth: P, config: BridgeConfig) -> Self {
        Self {
            agents,
            identities,
            auth,
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn agent_library(&self) -> &A {
        &self.agents
    }

    pub fn auth_provider(&self) -> &P {
        &self.auth
    }

    // ── Agents and actors ─────────────────────────────────────────────────────

    /// Build an agent for `host` (the production host when `None`).
    ///
    /// Any host other than the production host gets its root key fetched
    /// before the agent is returned. Construction and fetch errors are
    /// returned unchanged; nothing is retried.
    pub async fn create_agent(
        &self,
        identity: Option<A::Identity>,
        host: Option<&str>,
    ) -> Result<A::Agent, A::Error> {
        let host = host.unwrap_or(self.config.production_host.as_str());
        debug!(host, anonymous = identity.is_none(), "creating agent");

        let agent = self.agents.create_http_agent(identity, host)?;

        if self.config.requires_root_key(host) {
            debug!(host, "non-production host; fetching root key");
            self.agents.fetch_root_key(&agent).await?;
        }

        Ok(agent)
    }

    /// Build an actor for `canister_id` on a fresh agent.
    ///
    /// The agent comes from [`create_agent`](Self::create_agent) with
    /// `options.identity` and `options.host`. The canister id is not
    /// validated here.
    pub async fn create_actor(
        &self,
        canister_id: &str,
        interface: &A::Interface,
        options: ActorOptions<A::Identity, A::ActorExtra>,
    ) -> Result<A::Actor, A::Error> {
        let ActorOptions {
            identity,
            host,
            extra,
        } = options;

        let agent = self.create_agent(identity, host.as_deref()).await?;

        debug!(canister_id, "creating actor");
        self.agents.create_actor(
            interface,
            ActorConfig {
                agent,
                canister_id: canister_id.to_string(),
                extra,
            },
        )
    }

    // ── Identity ──────────────────────────────────────────────────────────────

    /// Rebuild an identity from its serialized JSON key document.
    pub fn create_identity_from_key(
        &self,
        serialized_key: &str,
    ) -> Result<A::Identity, KeyError<I::Error>> {
        identity_from_key(&self.identities, serialized_key)
    }

    /// Run the Internet Identity login served by `canister_id`.
    ///
    /// Settles exactly once: with the provider's identity on success, or
    /// with [`LoginError::Provider`] carrying the provider's error. There is
    /// no timeout; a provider that never answers leaves the call pending
    /// until `abort` (if given) fires, which settles it with
    /// [`LoginError::Aborted`].
    pub async fn authenticate_with_ii(
        &self,
        canister_id: &str,
        abort: Option<AbortRegistration>,
    ) -> Result<A::Identity, LoginError<P::Error>> {
        let options = LoginOptions {
            identity_provider: self.config.identity_provider_url(canister_id),
            max_time_to_live: self.config.max_time_to_live(),
            derivation_origin: self.config.derivation_origin.clone(),
        };
        info!(identity_provider = %options.identity_provider, "starting login");

        let login = self.auth.login(&options);
        let outcome = match abort {
            Some(registration) => match Abortable::new(login, registration).await {
                Ok(outcome) => outcome,
                Err(_aborted) => {
                    warn!(identity_provider = %options.identity_provider, "login aborted");
                    return Err(LoginError::Aborted);
                }
            },
            None => login.await,
        };

        match outcome {
            Ok(identity) => {
                info!("login completed");
                Ok(identity)
            }
            Err(e) => {
                info!("login rejected by identity provider");
                Err(LoginError::Provider(e))
            }
        }
    }

    // ── Document placeholders ─────────────────────────────────────────────────

    /// Placeholder; see [`document::encrypt_document`].
    pub fn encrypt_document<D: ?Sized, K: ?Sized>(
        &self,
        document: &D,
        public_key: &K,
    ) -> EncryptedDocument {
        document::encrypt_document(document, public_key)
    }

    /// Placeholder; see [`document::decrypt_document`].
    pub fn decrypt_document<C: ?Sized, N: ?Sized, K: ?Sized>(
        &self,
        encrypted_data: &C,
        nonce: &N,
        private_key: &K,
    ) -> DecryptedDocument {
        document::decrypt_document(encrypted_data, nonce, private_key)
    }

    // ── Verification tokens ───────────────────────────────────────────────────

    /// Forward to the actor's `generate_verification_token` method.
    pub async fn generate_verification_token<Act: VerificationActor + ?Sized>(
        &self,
        actor: &Act,
        document_id: &str,
        fields: &Act::Fields,
        expiry_seconds: Act::Expiry,
    ) -> Result<Act::Token, Act::Error> {
        actor
            .generate_verification_token(document_id, fields, expiry_seconds)
            .await
    }

    /// Forward to the actor's `verify_token` method.
    pub async fn verify_token<Act: VerificationActor + ?Sized>(
        &self,
        actor: &Act,
        token: Act::Token,
    ) -> Result<Act::Verification, Act::Error> {
        actor.verify_token(token).await
    }
}
