use async_trait::async_trait;

use crate::errors::Error;

use super::types::{AuthResponse, Credentials, Registration};

/// Remote authority that verifies credentials and issues tokens.
///
/// Implementations map a remote rejection to [`Error::Auth`] carrying the
/// server's detail text, and transport failures to [`Error::Unreachable`].
#[async_trait]
pub trait AuthEndpoint: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, Error>;

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, Error>;
}
