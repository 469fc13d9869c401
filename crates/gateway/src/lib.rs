//! External collaborators of the Traverse engine.
//!
//! Authentication, blob storage and reviewer notification are opaque
//! services as far as progress tracking is concerned; this crate defines
//! the traits the engine programs against, HTTP-backed implementations,
//! and in-memory doubles for tests.

#![warn(missing_docs)]

pub mod auth;
pub mod blob;
pub mod notify;

pub use auth::{with_auth_retry, AuthProvider, StaticTokenProvider};
pub use blob::{BlobStore, FsBlobStore, HttpBlobStore, MemoryBlobStore, SignedUrl};
pub use notify::{NotificationChannel, ReviewNotifier};

/// Error type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors raised by the external collaborators.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Credential invalid and refresh failed; the session must
    /// re-authenticate.
    #[error("authentication failed; sign in again")]
    Unauthenticated,

    /// Network or remote-service failure. Safe to retry; no partial state
    /// is left behind.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The blob store has no object under the given reference.
    #[error("unknown storage reference: {0}")]
    UnknownRef(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}
