use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};
use super::aggregate::{MedicationChanges, MedicationDetails};

pub const MEDICATION_CREATED: &str = "Medication:Created";
pub const MEDICATION_UPDATED: &str = "Medication:Updated";
pub const MEDICATION_PHOTO_ATTACHED: &str = "Medication:PhotoAttached";
pub const MEDICATION_DELETED: &str = "Medication:Deleted";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    MedicationCreated {
        id: String,
        user_id: Option<String>,
        details: MedicationDetails,
        created_at: DateTime<Utc>,
    },

    MedicationUpdated {
        id: String,
        changes: MedicationChanges,
        updated_at: DateTime<Utc>,
    },

    PhotoAttached {
        id: String,
        photo_url: String,
        updated_at: DateTime<Utc>,
    },

    MedicationDeleted {
        id: String,
        updated_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::MedicationCreated { .. } => MEDICATION_CREATED.to_string(),
            Event::MedicationUpdated { .. } => MEDICATION_UPDATED.to_string(),
            Event::PhotoAttached { .. } => MEDICATION_PHOTO_ATTACHED.to_string(),
            Event::MedicationDeleted { .. } => MEDICATION_DELETED.to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
