use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::{errors::Error, notify::NotificationChannel, store::SessionStore};

use super::{
    endpoint::AuthEndpoint,
    record::SessionRecord,
    types::{AuthMode, AuthResponse, Credentials, Registration, UserProfile},
};

pub const DEFAULT_AUTH_ERROR: &str = "An error occurred. Please try again.";
const MISSING_REQUIRED: &str = "Please fill in all required fields";
const MISSING_NAME: &str = "Please enter your name";

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
}

impl AuthState {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: AuthState,
    session: Option<SessionRecord>,
    mode: AuthMode,
    inline_error: Option<String>,
    logout_prompt: bool,
}

/// Owns the authentication lifecycle and the persisted session record.
///
/// At most one login or register call is in flight; a second call made while
/// the first is pending fails with [`Error::AuthInFlight`].
pub struct AuthManager {
    store: Arc<dyn SessionStore>,
    endpoint: Arc<dyn AuthEndpoint>,
    notifications: Arc<NotificationChannel>,
    inner: Mutex<Inner>,
}

impl AuthManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        endpoint: Arc<dyn AuthEndpoint>,
        notifications: Arc<NotificationChannel>,
    ) -> Self {
        Self {
            store,
            endpoint,
            notifications,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> AuthState {
        self.inner().state
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner().session.as_ref().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.inner().session.as_ref().map(|s| s.token.clone())
    }

    pub fn inline_error(&self) -> Option<String> {
        self.inner().inline_error.clone()
    }

    pub fn mode(&self) -> AuthMode {
        self.inner().mode
    }

    /// Switches between the login and register forms, clearing any inline error.
    pub fn set_mode(&self, mode: AuthMode) {
        let mut inner = self.inner();
        inner.mode = mode;
        inner.inline_error = None;
    }

    pub fn logout_pending(&self) -> bool {
        self.inner().logout_prompt
    }

    /// Loads a stored session without contacting the network. Anything
    /// unreadable leaves the manager unauthenticated.
    pub async fn restore_session(&self) -> AuthState {
        if self.state() != AuthState::Unauthenticated {
            return self.state();
        }

        match SessionRecord::load(self.store.as_ref()).await {
            Ok(Some(record)) => {
                tracing::info!(user_id = record.user.id, "Restored stored session");
                let mut inner = self.inner();
                inner.session = Some(record);
                inner.state = AuthState::Authenticated;
                inner.state
            }
            Ok(None) => {
                tracing::info!("No stored session");
                AuthState::Unauthenticated
            }
            Err(e) => {
                tracing::warn!("Could not read stored session: {}", e);
                AuthState::Unauthenticated
            }
        }
    }

    pub async fn login(&self, credentials: Credentials) -> Result<UserProfile, Error> {
        self.begin(AuthMode::Login, || {
            if credentials.email.trim().is_empty() || credentials.password.is_empty() {
                return Err(MISSING_REQUIRED);
            }
            Ok(())
        })?;

        tracing::info!("Logging in");
        let response = self.endpoint.login(&credentials).await;
        self.settle(AuthMode::Login, response).await
    }

    pub async fn register(&self, registration: Registration) -> Result<UserProfile, Error> {
        self.begin(AuthMode::Register, || {
            if registration.email.trim().is_empty() || registration.password.is_empty() {
                return Err(MISSING_REQUIRED);
            }
            if registration.name.trim().is_empty() {
                return Err(MISSING_NAME);
            }
            Ok(())
        })?;

        tracing::info!("Registering new account");
        let registration = registration.normalized();
        let response = self.endpoint.register(&registration).await;
        self.settle(AuthMode::Register, response).await
    }

    /// Claims the single auth slot. Form errors are reported inline without
    /// ever leaving `unauthenticated`.
    fn begin(
        &self,
        mode: AuthMode,
        validate: impl FnOnce() -> Result<(), &'static str>,
    ) -> Result<(), Error> {
        let mut inner = self.inner();
        match inner.state {
            AuthState::Authenticating => return Err(Error::AuthInFlight),
            AuthState::Authenticated => {
                return Err(Error::InvalidStateTransition {
                    from: AuthState::Authenticated.as_str().to_string(),
                    to: AuthState::Authenticating.as_str().to_string(),
                })
            }
            AuthState::Unauthenticated => {}
        }

        inner.mode = mode;
        inner.inline_error = None;

        if let Err(message) = validate() {
            inner.inline_error = Some(message.to_string());
            return Err(Error::Auth {
                detail: message.to_string(),
            });
        }

        inner.state = AuthState::Authenticating;
        Ok(())
    }

    async fn settle(
        &self,
        mode: AuthMode,
        response: Result<AuthResponse, Error>,
    ) -> Result<UserProfile, Error> {
        let record = match response.and_then(accepted_record) {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e)),
        };

        if let Err(e) = record.save(self.store.as_ref()).await {
            return Err(self.fail(e));
        }

        let user = record.user.clone();
        {
            let mut inner = self.inner();
            inner.session = Some(record);
            inner.state = AuthState::Authenticated;
            inner.logout_prompt = false;
        }

        tracing::info!(user_id = user.id, ?mode, "Authenticated");
        self.notifications.success(mode.success_message());
        Ok(user)
    }

    fn fail(&self, err: Error) -> Error {
        let message = err.detail().unwrap_or(DEFAULT_AUTH_ERROR).to_string();
        tracing::warn!("Authentication failed: {}", err);

        {
            let mut inner = self.inner();
            inner.state = AuthState::Unauthenticated;
            inner.inline_error = Some(message.clone());
        }

        self.notifications.error(message);
        err
    }

    /// Opens the logout confirmation prompt.
    pub fn request_logout(&self) -> Result<(), Error> {
        let mut inner = self.inner();
        if inner.state != AuthState::Authenticated {
            return Err(Error::Forbidden);
        }
        inner.logout_prompt = true;
        Ok(())
    }

    pub fn cancel_logout(&self) {
        self.inner().logout_prompt = false;
    }

    /// Clears the stored record and drops to `unauthenticated`. If storage
    /// cannot be cleared the session stays authenticated.
    pub async fn confirm_logout(&self) -> Result<(), Error> {
        if !self.logout_pending() {
            return Err(Error::LogoutNotRequested);
        }

        SessionRecord::clear(self.store.as_ref()).await?;

        let mut inner = self.inner();
        inner.session = None;
        inner.state = AuthState::Unauthenticated;
        inner.logout_prompt = false;
        inner.inline_error = None;
        inner.mode = AuthMode::Login;
        tracing::info!("Logged out");
        Ok(())
    }
}

fn accepted_record(response: AuthResponse) -> Result<SessionRecord, Error> {
    match response {
        AuthResponse {
            success: true,
            access_token: Some(token),
            user: Some(user),
            ..
        } if !token.trim().is_empty() => Ok(SessionRecord::new(token, user)),
        AuthResponse { detail, .. } => Err(Error::Auth {
            detail: detail.unwrap_or_default(),
        }),
    }
}
