//! Clinical intake client core: session persistence, authentication, the
//! intake wizard and its screen routing.

/// Authentication session manager
pub mod auth;

/// Remote collaborators (medicine search, prescription writer)
pub mod collaborators;

/// Environment-driven settings
pub mod config;

/// Domain errors
pub mod errors;

/// Intake session aggregate
pub mod intake;

/// Screen routing
pub mod navigation;

/// Wizard navigator
pub mod navigator;

/// Transient notifications
pub mod notify;

/// Persistent session store
pub mod store;

pub use errors::Error;
pub use navigation::Screen;
pub use navigator::{Backend, Navigator};
