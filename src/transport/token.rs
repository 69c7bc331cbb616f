//! Bearer-token injection seams.
//!
//! The transport never acquires or persists credentials itself. It consumes
//! a [`TokenSource`] — queried on every outgoing request, so a rotated token
//! is picked up by the very next attempt — and notifies an optional
//! [`TokenUpdateListener`] when the credential set rotates. Caching, if
//! desired, belongs inside the token source implementation.

use std::time::SystemTime;

use async_trait::async_trait;

use super::error::TransferError;

/// Rotated credential set delivered to a [`TokenUpdateListener`].
#[derive(Debug, Clone)]
pub struct TokenUpdate {
    /// The new access token.
    pub access_token: String,
    /// The new refresh token, when the rotation produced one.
    pub refresh_token: Option<String>,
    /// Expiry of the new access token, when known.
    pub expires_at: Option<SystemTime>,
}

/// Produces the current bearer token for an outgoing request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns the current bearer token, without the `Bearer ` prefix
    /// (a present prefix is tolerated and not doubled).
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Token`] when no token can be produced.
    async fn bearer_token(&self) -> Result<String, TransferError>;
}

/// Receives credential-rotation notifications.
pub trait TokenUpdateListener: Send + Sync {
    /// Called with the freshly rotated credential set.
    fn token_updated(&self, update: &TokenUpdate);
}

/// Token source backed by a fixed string. Useful for tests and for callers
/// whose tokens never rotate.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Creates a source that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn bearer_token(&self) -> Result<String, TransferError> {
        if self.token.is_empty() {
            return Err(TransferError::token("static token is empty"));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_returns_token() {
        let source = StaticTokenSource::new("abc123");
        assert_eq!(source.bearer_token().await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_static_source_rejects_empty_token() {
        let source = StaticTokenSource::new("");
        let result = source.bearer_token().await;
        assert!(matches!(result, Err(TransferError::Token { .. })));
    }
}
