use serde::{Deserialize, Serialize};
use super::aggregate::{MedicationChanges, MedicationDetails};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Command {
    /// Register a new medication for a user
    CreateMedication {
        id: String,
        user_id: Option<String>,
        details: MedicationDetails,
    },

    /// Change any editable field
    UpdateMedication {
        changes: MedicationChanges,
    },

    /// Link an uploaded photo (triggered by projector)
    AttachPhoto {
        photo_url: String,
    },

    /// Remove the medication
    DeleteMedication,
}
