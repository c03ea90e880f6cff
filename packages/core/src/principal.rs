//! Internet Computer principals: binary form and checksummed text form.
//!
//! A principal is an opaque blob of at most 29 bytes. Its textual form is
//! what users and canister ids look like on the wire:
//!
//! ```text
//! base32( crc32_be(bytes) ++ bytes )   lowercase, no padding
//! grouped into 5-character chunks joined by '-'
//!
//! aaaaa-aa                         management canister (empty blob)
//! 2vxsx-fae                        anonymous caller    ([0x04])
//! ryjl3-tyaaa-aaaaa-aaaba-cai      a canister id
//! ```
//!
//! User principals derived from a public key are *self-authenticating*:
//! `sha224(der_public_key) ++ [0x02]`.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha224};
use thiserror::Error;

/// Longest binary principal the protocol allows.
pub const MAX_PRINCIPAL_LEN: usize = 29;

const SELF_AUTHENTICATING_TAG: u8 = 0x02;
const ANONYMOUS_TAG: u8 = 0x04;
const CHECKSUM_LEN: usize = 4;

/// Errors that can occur when parsing principal text or bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("principal is longer than {MAX_PRINCIPAL_LEN} bytes: {0}")]
    TooLong(usize),

    #[error("principal text is not valid base32: '{0}'")]
    InvalidBase32(String),

    #[error("principal text is too short to hold a checksum: '{0}'")]
    TooShort(String),

    #[error("principal checksum mismatch: '{0}'")]
    ChecksumMismatch(String),

    #[error("principal text is not in canonical form: expected '{expected}', got '{found}'")]
    NotCanonical { expected: String, found: String },
}

/// A parsed Internet Computer principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal {
    bytes: Vec<u8>,
}

impl Principal {
    /// The management canister, `aaaaa-aa`.
    pub fn management_canister() -> Self {
        Self { bytes: Vec::new() }
    }

    /// The anonymous caller, `2vxsx-fae`.
    pub fn anonymous() -> Self {
        Self {
            bytes: vec![ANONYMOUS_TAG],
        }
    }

    /// Derive the self-authenticating principal for a DER-encoded public key.
    pub fn self_authenticating(der_public_key: &[u8]) -> Self {
        let mut bytes = Sha224::digest(der_public_key).to_vec();
        bytes.push(SELF_AUTHENTICATING_TAG);
        Self { bytes }
    }

    /// Wrap raw principal bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > MAX_PRINCIPAL_LEN {
            return Err(PrincipalError::TooLong(bytes.len()));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Parse the dashed, checksummed text form.
    ///
    /// Accepts upper- or lowercase input but rejects anything whose
    /// canonical re-encoding differs in grouping (e.g. misplaced dashes).
    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        let compact: String = text
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let decoded = BASE32_NOPAD
            .decode(compact.as_bytes())
            .map_err(|_| PrincipalError::InvalidBase32(text.to_string()))?;

        if decoded.len() < CHECKSUM_LEN {
            return Err(PrincipalError::TooShort(text.to_string()));
        }

        let (checksum, bytes) = decoded.split_at(CHECKSUM_LEN);
        let principal = Self::from_slice(bytes)?;
        if checksum != crc32fast::hash(bytes).to_be_bytes() {
            return Err(PrincipalError::ChecksumMismatch(text.to_string()));
        }

        let expected = principal.to_text();
        if expected != text.to_ascii_lowercase() {
            return Err(PrincipalError::NotCanonical {
                expected,
                found: text.to_string(),
            });
        }

        Ok(principal)
    }

    /// The canonical text form, e.g. `2vxsx-fae`.
    pub fn to_text(&self) -> String {
        let mut blob = crc32fast::hash(&self.bytes).to_be_bytes().to_vec();
        blob.extend_from_slice(&self.bytes);

        let encoded = BASE32_NOPAD.encode(&blob).to_ascii_lowercase();
        encoded
            .as_bytes()
            .chunks(5)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_anonymous(&self) -> bool {
        self.bytes == [ANONYMOUS_TAG]
    }

    pub fn is_self_authenticating(&self) -> bool {
        self.bytes.len() == MAX_PRINCIPAL_LEN
            && self.bytes.last() == Some(&SELF_AUTHENTICATING_TAG)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
