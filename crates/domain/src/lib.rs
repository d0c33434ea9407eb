//! Medication Reminder Domain Models

/// Medication aggregate
pub mod medications;

/// Due-date evaluation engine
pub mod schedule;

/// Domain errors
pub mod errors;

/// Domain events wrapper
pub mod event;

pub use errors::Error;
pub use event::DomainEvent;
