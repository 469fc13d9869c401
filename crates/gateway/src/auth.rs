//! Authentication boundary.
//!
//! The engine never issues tokens; it asks a provider for a bearer
//! credential and, when a call comes back unauthorized, performs exactly one
//! transparent refresh-and-retry before surfacing `Unauthenticated`.

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use super::{GatewayError, Result};

/// Supplies bearer credentials for mutating calls.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current bearer token.
    async fn bearer_token(&self) -> Result<String>;

    /// Exchange the refresh credential for a new token pair.
    async fn refresh(&self) -> Result<()>;
}

/// Run an authenticated operation with a single transparent
/// refresh-and-retry.
///
/// The operation is handed the current token. If it fails with
/// `Unauthenticated`, the provider is refreshed once and the operation is
/// retried with the new token; a second failure propagates as
/// `Unauthenticated` to force re-authentication.
pub async fn with_auth_retry<F, Fut, T>(auth: &dyn AuthProvider, mut op: F) -> Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let token = auth.bearer_token().await?;
    match op(token).await {
        Err(GatewayError::Unauthenticated) => {
            tracing::debug!("Credential rejected, attempting one refresh");
            auth.refresh().await?;
            let token = auth.bearer_token().await?;
            op(token).await
        }
        other => other,
    }
}

/// Provider holding a fixed token, for tests and offline use.
pub struct StaticTokenProvider {
    token: String,
    refreshable: AtomicBool,
}

impl StaticTokenProvider {
    /// A provider whose refresh always succeeds (and keeps the same token).
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refreshable: AtomicBool::new(true),
        }
    }

    /// A provider whose refresh always fails.
    pub fn expired(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refreshable: AtomicBool::new(false),
        }
    }

    /// Whether a refresh would succeed.
    pub fn can_refresh(&self) -> bool {
        self.refreshable.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn refresh(&self) -> Result<()> {
        if self.refreshable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GatewayError::Unauthenticated)
        }
    }
}
