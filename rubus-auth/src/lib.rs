//! Authentication of request originators into authorization-bearing
//! [`Viewer`] records (§4.3).
//!
//! The dispatcher calls [`Authenticator::authenticate`] before handling any
//! request and must turn an [`AuthError`] into an `UNAUTHORIZED` response
//! (§4.4, §7). The trait seam mirrors `annil::extractor::token::AnnilClaim`'s
//! split between a claim extractor and its route handlers: swapping the
//! default non-empty-token check for a JWT-backed authenticator later
//! doesn't require touching the dispatcher.

use async_trait::async_trait;
use thiserror::Error;

/// An authenticated identity, issued by the authenticator and owned by the
/// server session for the request's lifetime (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub identity: String,
    pub has_admin_privileges: bool,
}

impl Viewer {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            has_admin_privileges: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,
}

/// Maps a request originator (the opaque `authentication-token` header
/// field, §4.1) to a [`Viewer`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: Option<&str>) -> Result<Viewer, AuthError>;
}

/// The default authenticator (§4.3): accepts any originator presenting a
/// non-empty opaque token, issuing a [`Viewer`] with no admin privileges.
/// Admin elevation is a separate, future protocol concern.
#[derive(Debug, Default)]
pub struct TokenPresenceAuthenticator;

#[async_trait]
impl Authenticator for TokenPresenceAuthenticator {
    async fn authenticate(&self, token: Option<&str>) -> Result<Viewer, AuthError> {
        match token {
            Some(token) if !token.is_empty() => Ok(Viewer::new(token.to_string())),
            _ => Err(AuthError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let auth = TokenPresenceAuthenticator;
        assert_eq!(
            auth.authenticate(Some("")).await,
            Err(AuthError::Unauthenticated)
        );
        assert_eq!(
            auth.authenticate(None).await,
            Err(AuthError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn non_empty_token_is_a_non_admin_viewer() {
        let auth = TokenPresenceAuthenticator;
        let viewer = auth.authenticate(Some("abcd")).await.unwrap();
        assert_eq!(viewer.identity, "abcd");
        assert!(!viewer.has_admin_privileges);
    }
}
