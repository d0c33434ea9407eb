/// Time-of-day slots
pub mod slot;

/// Recurrence rules
pub mod recurrence;

/// Treatment duration window
pub mod window;

/// Report scope ranges
pub mod range;

/// Due medication query
pub mod query;

pub use query::{filter_due, MedicationDueQuery, MedicationSource};
pub use range::ReportScope;
pub use recurrence::Frequency;
pub use slot::ScheduleSlot;
pub use window::TreatmentDuration;
