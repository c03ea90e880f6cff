//! Internet Computer agent bridge.
//!
//! Exposes the handful of operations a host application needs from an
//! Internet Computer agent library (agents, actors, identities, logins and
//! verification calls) behind a single [`Bridge`] object. The bridge does
//! no protocol work itself. The agent, identity and auth libraries are
//! injected through the traits in [`library`], so the same bridge runs over
//! `@dfinity/agent` in a browser (via `icp-bridge-wasm`) or over in-process
//! fakes in tests.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bridge`] | [`Bridge`] and its operations |
//! | [`library`] | Traits for the injected libraries |
//! | [`identity`] | Native Ed25519 identity in the agent-js JSON key format |
//! | [`principal`] | Principal text/binary encoding |
//! | [`document`] | Document-encryption **placeholders** (no cryptography) |
//! | [`config`] | [`BridgeConfig`] |
//! | [`error`] | [`KeyError`], [`LoginError`] |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use icp_bridge::{Bridge, BridgeConfig, Ed25519Library};
//!
//! let bridge = Bridge::new(agent_lib, Ed25519Library, auth, BridgeConfig::default());
//!
//! let identity = bridge.create_identity_from_key(&key_json)?;
//! let agent = bridge.create_agent(Some(identity), Some("http://127.0.0.1:4943")).await?;
//! ```

pub mod bridge;
pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod library;
pub mod principal;

pub use bridge::{identity_from_key, ActorOptions, Bridge};
pub use config::{BridgeConfig, PRODUCTION_HOST};
pub use document::{DecryptedDocument, EncryptedDocument};
pub use error::{KeyError, LoginError};
pub use identity::{Ed25519KeyIdentity, Ed25519Library, IdentityError};
pub use library::{
    ActorConfig, AgentLibrary, AuthProvider, IdentityLibrary, LoginOptions, VerificationActor,
};
pub use principal::{Principal, PrincipalError};
