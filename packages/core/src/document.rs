//! Document encryption placeholders.
//!
//! **No cryptography happens here.** [`encrypt_document`] and
//! [`decrypt_document`] keep the host-facing contract (the record shapes a
//! caller expects back) and nothing else: every call returns the same fixed
//! strings whatever it is given. They exist so hosts written against the
//! contract keep working, not to protect anything.
//!
//! The returned records answer [`EncryptedDocument::is_placeholder`] /
//! [`DecryptedDocument::is_placeholder`] with `true`, and each call logs a
//! warning, so a caller can at least tell that nothing was encrypted.
//! Replacing these requires an authenticated-encryption scheme with an
//! explicit key-derivation contract.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ENCRYPTED_DATA_PLACEHOLDER: &str = "encrypted_data_placeholder";
pub const NONCE_PLACEHOLDER: &str = "nonce_placeholder";
pub const DECRYPTED_DATA_PLACEHOLDER: &str = "decrypted_data_placeholder";

/// `{ "encryptedData": …, "nonce": … }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedDocument {
    pub encrypted_data: String,
    pub nonce: String,
}

impl EncryptedDocument {
    pub fn is_placeholder(&self) -> bool {
        self.encrypted_data == ENCRYPTED_DATA_PLACEHOLDER && self.nonce == NONCE_PLACEHOLDER
    }
}

/// `{ "decryptedData": … }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedDocument {
    pub decrypted_data: String,
}

impl DecryptedDocument {
    pub fn is_placeholder(&self) -> bool {
        self.decrypted_data == DECRYPTED_DATA_PLACEHOLDER
    }
}

/// Placeholder: ignores both arguments and returns fixed strings.
pub fn encrypt_document<D: ?Sized, K: ?Sized>(_document: &D, _public_key: &K) -> EncryptedDocument {
    warn!("encrypt_document is a placeholder; the document was NOT encrypted");
    EncryptedDocument {
        encrypted_data: ENCRYPTED_DATA_PLACEHOLDER.into(),
        nonce: NONCE_PLACEHOLDER.into(),
    }
}

/// Placeholder: ignores all arguments and returns a fixed string.
pub fn decrypt_document<C: ?Sized, N: ?Sized, K: ?Sized>(
    _encrypted_data: &C,
    _nonce: &N,
    _private_key: &K,
) -> DecryptedDocument {
    warn!("decrypt_document is a placeholder; nothing was decrypted");
    DecryptedDocument {
        decrypted_data: DECRYPTED_DATA_PLACEHOLDER.into(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
