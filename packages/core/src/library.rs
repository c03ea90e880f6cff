//! Contracts for the external libraries the bridge delegates to.
//!
//! The bridge owns no protocol logic. Agent construction, root-key fetch,
//! actor proxies, key parsing and the interactive login all live in an
//! agent library supplied by the host: `@dfinity/agent` and friends in a
//! browser, an in-process fake in tests. Each concern is one trait here, and
//! the host injects implementations into [`Bridge::new`].
//!
//! Handles stay opaque: every trait names its own associated types and the
//! bridge only moves them between calls. Errors are the library's own and
//! are never translated.
//!
//! Async methods are `?Send`. The bridge runs on a single-threaded
//! cooperative executor (the browser event loop, or a current-thread
//! runtime natively) and JavaScript handles cannot cross threads anyway.
//!
//! [`Bridge::new`]: crate::Bridge::new

use std::time::Duration;

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Agent library
// ---------------------------------------------------------------------------

/// Everything [`AgentLibrary::create_actor`] receives besides the interface.
#[derive(Debug, Clone)]
pub struct ActorConfig<Agent, Extra> {
    /// The freshly built agent the actor will talk through.
    pub agent: Agent,
    /// Target canister, exactly as the caller supplied it.
    pub canister_id: String,
    /// Caller-supplied options other than identity and host, untouched.
    pub extra: Extra,
}

/// HTTP agent and actor construction.
#[async_trait(?Send)]
pub trait AgentLibrary {
    /// Credential used to sign outgoing requests.
    type Identity;
    /// A configured connection to one network endpoint.
    type Agent;
    /// A proxy bound to one canister.
    type Actor;
    /// The canister's interface description (e.g. an IDL factory).
    type Interface: ?Sized;
    /// Extra actor options passed through from the caller.
    type ActorExtra;
    type Error;

    /// Build an agent for `host`, anonymous when `identity` is `None`.
    fn create_http_agent(
        &self,
        identity: Option<Self::Identity>,
        host: &str,
    ) -> Result<Self::Agent, Self::Error>;

    /// Fetch and trust the replica's root key. Required before talking to
    /// any non-production network.
    async fn fetch_root_key(&self, agent: &Self::Agent) -> Result<(), Self::Error>;

    /// Build an actor proxy for `config.canister_id`.
    fn create_actor(
        &self,
        interface: &Self::Interface,
        config: ActorConfig<Self::Agent, Self::ActorExtra>,
    ) -> Result<Self::Actor, Self::Error>;
}

// ---------------------------------------------------------------------------
// Identity library
// ---------------------------------------------------------------------------

/// Reconstruction of identities from serialized key material.
pub trait IdentityLibrary {
    type Identity;
    type Error;

    /// Rebuild an identity from an already-parsed JSON key document.
    fn identity_from_parsed_json(
        &self,
        key: &serde_json::Value,
    ) -> Result<Self::Identity, Self::Error>;
}

// ---------------------------------------------------------------------------
// Auth provider
// ---------------------------------------------------------------------------

/// Parameters for one interactive login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    /// URL of the identity provider, e.g. `https://rdmx6-jaaaa-aaaaa-aaadq-cai.ic0.app`.
    pub identity_provider: String,
    /// Requested lifetime of the delegation. `None` lets the provider decide.
    pub max_time_to_live: Option<Duration>,
    /// Origin to derive the principal for, when it differs from the caller's.
    pub derivation_origin: Option<String>,
}

/// An interactive, user-driven authentication flow.
#[async_trait(?Send)]
pub trait AuthProvider {
    type Identity;
    type Error;

    /// Run the login flow to completion.
    ///
    /// Resolves once the provider reports success (with the identity the
    /// flow produced) or failure (with the provider's error). May suspend
    /// for as long as the user takes.
    async fn login(&self, options: &LoginOptions) -> Result<Self::Identity, Self::Error>;
}

// ---------------------------------------------------------------------------
// Verification actor
// ---------------------------------------------------------------------------

/// The remote methods a document-verification canister exposes.
///
/// The bridge only forwards; argument, token and result shapes are
/// whatever the canister defines.
#[async_trait(?Send)]
pub trait VerificationActor {
    /// The list of document fields the token discloses.
    type Fields: ?Sized;
    /// Token lifetime in seconds, in the representation the actor takes.
    type Expiry;
    type Token;
    type Verification;
    type Error;

    async fn generate_verification_token(
        &self,
        document_id: &str,
        fields: &Self::Fields,
        expiry_seconds: Self::Expiry,
    ) -> Result<Self::Token, Self::Error>;

    async fn verify_token(&self, token: Self::Token) -> Result<Self::Verification, Self::Error>;
}
