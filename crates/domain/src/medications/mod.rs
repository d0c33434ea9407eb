/// Medication aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Input DTOs
pub mod inputs;

/// View (read model)
pub mod view;

/// Medications-by-user index
pub mod index;

/// CQRS setup
pub mod cqrs;

pub use aggregate::{
    DoseUnit, Medication, MedicationChanges, MedicationDetails, Services, AGGREGATE_TYPE,
};
pub use commands::Command;
pub use events::Event;
pub use index::MedicationIndex;
pub use view::{Query, View};
