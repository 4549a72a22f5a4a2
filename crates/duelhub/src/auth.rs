//! The authentication seam.
//!
//! The server does not issue identities; the storefront's credential
//! service does. During the `Hello` handshake the server hands the token
//! to an [`Authenticator`] and gets back the [`PlayerId`] every room event
//! is keyed by afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! struct TokenAuth;
//!
//! impl Authenticator for TokenAuth {
//!     async fn authenticate(
//!         &self,
//!         token: &str,
//!     ) -> Result<PlayerId, AuthError> {
//!         verify_with_credential_service(token).await
//!     }
//! }
//! ```

use duelhub_protocol::PlayerId;

/// Authentication failed; the connection is refused.
#[derive(Debug, thiserror::Error)]
#[error("authentication failed: {0}")]
pub struct AuthError(pub String);

/// Validates handshake tokens against the external credential service.
///
/// `Send + Sync + 'static` because the authenticator is shared across
/// connection tasks for the lifetime of the server. The returned future
/// must be `Send` for the same reason; implementors can still write
/// plain `async fn authenticate`.
pub trait Authenticator: Send + Sync + 'static {
    /// Resolves a handshake token to a player identity.
    ///
    /// Async because real implementations call out over the network; the
    /// handshake waits on the result before the player exists to the
    /// lobby.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, AuthError>> + Send;
}
