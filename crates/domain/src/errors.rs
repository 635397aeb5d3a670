use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Entity not found: {entity}")]
    NotFound { entity: String },

    #[error("Uniqueness conflict: {field}")]
    Uniqueness { field: String },

    #[error("Forbidden action")]
    Forbidden,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Action belongs to the {expected} step, current step is {actual}")]
    StepMismatch { expected: String, actual: String },

    #[error("An authentication request is already in flight")]
    AuthInFlight,

    #[error("{detail}")]
    Auth { detail: String },

    #[error("{service} is unreachable: {message}")]
    Unreachable {
        service: String,
        message: String,
        detail: Option<String>,
    },

    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("Logout was not requested")]
    LogoutNotRequested,
}

impl Error {
    /// Whether re-invoking the same action may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Unreachable { .. } | Error::Storage { .. })
    }

    /// Text the server supplied for the user, if any.
    pub fn detail(&self) -> Option<&str> {
        let detail = match self {
            Error::Auth { detail } => Some(detail.as_str()),
            Error::Unreachable { detail, .. } => detail.as_deref(),
            _ => None,
        };
        detail.filter(|d| !d.trim().is_empty())
    }
}

impl From<cqrs_es::AggregateError<Error>> for Error {
    fn from(err: cqrs_es::AggregateError<Error>) -> Self {
        match err {
            cqrs_es::AggregateError::UserError(inner) => inner,
            other => Error::Storage {
                message: other.to_string(),
            },
        }
    }
}
