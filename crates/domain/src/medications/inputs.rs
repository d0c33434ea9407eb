use super::aggregate::{DoseUnit, MedicationChanges, MedicationDetails};
use crate::schedule::{Frequency, ScheduleSlot, TreatmentDuration};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateMedicationInput {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: DoseUnit,
    #[serde(default)]
    pub duration: TreatmentDuration,
    pub cap_size: String,
    pub cause: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub schedule: ScheduleSlot,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl From<CreateMedicationInput> for MedicationDetails {
    fn from(input: CreateMedicationInput) -> Self {
        Self {
            name: input.name,
            amount: input.amount,
            unit: input.unit,
            duration: input.duration,
            cap_size: input.cap_size,
            cause: input.cause,
            frequency: input.frequency,
            schedule: input.schedule,
            is_active: input.is_active,
        }
    }
}

/// Fields of a medication that may change. Unknown fields such as
/// `created_at` or `user_id` are rejected.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMedicationInput {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<DoseUnit>,
    pub duration: Option<TreatmentDuration>,
    pub cap_size: Option<String>,
    pub cause: Option<String>,
    pub frequency: Option<Frequency>,
    pub schedule: Option<ScheduleSlot>,
    pub is_active: Option<bool>,
}

impl From<UpdateMedicationInput> for MedicationChanges {
    fn from(input: UpdateMedicationInput) -> Self {
        Self {
            name: input.name,
            amount: input.amount,
            unit: input.unit,
            duration: input.duration,
            cap_size: input.cap_size,
            cause: input.cause,
            frequency: input.frequency,
            schedule: input.schedule,
            is_active: input.is_active,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadPhotoInput {
    pub content_type: String,
}
