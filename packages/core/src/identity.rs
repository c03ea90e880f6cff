//! Ed25519 key identity and its agent-js compatible JSON form.
//!
//! The serialized form is the one `Ed25519KeyIdentity.toJSON()` produces and
//! `Ed25519KeyIdentity.fromParsedJson()` consumes, so key files can move
//! freely between a browser host and native tooling:
//!
//! ```text
//! [ "<hex DER public key>", "<hex private key>" ]
//!
//! DER public key  = 302a300506032b6570032100 ++ 32 raw key bytes
//! private key     = 32-byte seed, or 64-byte seed ++ public key
//! ```
//!
//! The identity's principal is the self-authenticating principal of the
//! DER public key.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::library::IdentityLibrary;
use crate::principal::Principal;

/// ASN.1 `SubjectPublicKeyInfo` header for an Ed25519 key (OID 1.3.101.112).
const ED25519_DER_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Errors returned when rebuilding an identity from its JSON form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("key document must be a JSON array of two hex strings")]
    NotAKeyPair,

    #[error("{field} is not valid hex: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    #[error("public key is not a DER-encoded Ed25519 key ({0} bytes)")]
    InvalidPublicKey(usize),

    #[error("private key must be 32 or 64 bytes, got {0}")]
    InvalidPrivateKey(usize),

    #[error("public key does not belong to the private key")]
    KeyMismatch,
}

/// An Ed25519 signing identity.
#[derive(Clone)]
pub struct Ed25519KeyIdentity {
    signing_key: SigningKey,
}

impl Ed25519KeyIdentity {
    /// Generate a fresh identity using OS randomness.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore an identity from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Rebuild from the `[public_der_hex, private_hex]` JSON array.
    pub fn from_parsed_json(value: &serde_json::Value) -> Result<Self, IdentityError> {
        let pair = value.as_array().ok_or(IdentityError::NotAKeyPair)?;
        let [public_hex, private_hex] = pair.as_slice() else {
            return Err(IdentityError::NotAKeyPair);
        };
        let (Some(public_hex), Some(private_hex)) = (public_hex.as_str(), private_hex.as_str())
        else {
            return Err(IdentityError::NotAKeyPair);
        };

        let public_der = decode_hex("public key", public_hex)?;
        let public_raw = raw_from_der(&public_der)?;

        let private = decode_hex("private key", private_hex)?;
        let seed: [u8; 32] = match private.len() {
            32 => private[..].try_into().map_err(|_| IdentityError::InvalidPrivateKey(32))?,
            64 => {
                if private[32..] != public_raw[..] {
                    return Err(IdentityError::KeyMismatch);
                }
                private[..32]
                    .try_into()
                    .map_err(|_| IdentityError::InvalidPrivateKey(64))?
            }
            n => return Err(IdentityError::InvalidPrivateKey(n)),
        };

        let identity = Self::from_seed(&seed);
        if identity.signing_key.verifying_key().to_bytes() != public_raw {
            return Err(IdentityError::KeyMismatch);
        }
        Ok(identity)
    }

    /// The `[public_der_hex, private_hex]` array `from_parsed_json` accepts.
    ///
    /// Contains the private key. **Keep this secret.**
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!([
            hex::encode(self.public_key_der()),
            hex::encode(self.signing_key.to_bytes()),
        ])
    }

    /// The raw 32-byte seed. **Keep this secret.**
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The public key wrapped in its DER `SubjectPublicKeyInfo`.
    pub fn public_key_der(&self) -> Vec<u8> {
        let mut der = ED25519_DER_PREFIX.to_vec();
        der.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        der
    }

    /// The self-authenticating principal requests from this identity carry.
    pub fn principal(&self) -> Principal {
        Principal::self_authenticating(&self.public_key_der())
    }

    /// Sign `message`. Returns the raw 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl std::fmt::Debug for Ed25519KeyIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519KeyIdentity")
            .field("principal", &self.principal().to_text())
            .finish_non_exhaustive()
    }
}

/// Native [`IdentityLibrary`] backed by [`Ed25519KeyIdentity`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Library;

impl IdentityLibrary for Ed25519Library {
    type Identity = Ed25519KeyIdentity;
    type Error = IdentityError;

    fn identity_from_parsed_json(
        &self,
        key: &serde_json::Value,
    ) -> Result<Self::Identity, Self::Error> {
        Ed25519KeyIdentity::from_parsed_json(key)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn decode_hex(field: &'static str, s: &str) -> Result<Vec<u8>, IdentityError> {
    hex::decode(s).map_err(|e| IdentityError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

fn raw_from_der(der: &[u8]) -> Result<[u8; 32], IdentityError> {
    der.strip_prefix(&ED25519_DER_PREFIX[..])
        .and_then(|raw| <[u8; 32]>::try_from(raw).ok())
        .ok_or(IdentityError::InvalidPublicKey(der.len()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
