/// Intake aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Patient input types
pub mod inputs;

/// Fixed health-condition vocabulary
pub mod conditions;

/// Guards over intake state
pub mod validators;

/// View (read model)
pub mod view;

/// Per-session CQRS setup
pub mod cqrs;

pub use aggregate::{IntakeSession, Services, Step, AGGREGATE_TYPE};
pub use commands::Command;
pub use cqrs::Workflow;
pub use events::Event;
pub use inputs::{Gender, PatientInfo};
pub use view::{Query, View};
