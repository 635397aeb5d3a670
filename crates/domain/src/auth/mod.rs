/// Wire-level types shared with the auth endpoint
pub mod types;

/// Remote auth endpoint contract
pub mod endpoint;

/// Persisted token + user pair
pub mod record;

/// Authentication state machine
pub mod manager;

pub use endpoint::AuthEndpoint;
pub use manager::{AuthManager, AuthState, DEFAULT_AUTH_ERROR};
pub use record::SessionRecord;
pub use types::{AuthMode, AuthResponse, Credentials, Registration, UserProfile};
