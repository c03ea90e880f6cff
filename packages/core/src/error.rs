//! Errors the bridge adds on top of its libraries' own.
//!
//! There are only two local failure modes: a serialized key that is not
//! JSON, and a login the caller aborted. Everything else is the injected
//! library's error, carried as-is.

use thiserror::Error;

/// Returned by [`Bridge::create_identity_from_key`](crate::Bridge::create_identity_from_key).
#[derive(Debug, Error)]
pub enum KeyError<E> {
    #[error("serialized key is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("{0}")]
    Library(E),
}

/// Returned by [`Bridge::authenticate_with_ii`](crate::Bridge::authenticate_with_ii).
#[derive(Debug, Error)]
pub enum LoginError<E> {
    #[error("login aborted before the identity provider responded")]
    Aborted,

    #[error("{0}")]
    Provider(E),
}

impl<E> LoginError<E> {
    pub fn is_aborted(&self) -> bool {
        matches!(self, LoginError::Aborted)
    }
}
