use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    schedule::{Frequency, ScheduleSlot, TreatmentDuration},
};

use super::{Command, Event};

/// Unit the dose amount is measured in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum DoseUnit {
    Pill,
    #[serde(rename = "mg")]
    Milligram,
    #[serde(rename = "mL")]
    Millilitre,
}

impl Default for DoseUnit {
    fn default() -> Self {
        Self::Pill
    }
}

/// Medication aggregate
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: String,
    pub user_id: Option<String>,

    pub name: String,
    pub amount: f64,
    pub unit: DoseUnit,
    pub duration: TreatmentDuration,
    pub cap_size: String,
    pub cause: String,

    // Schedule
    pub frequency: Frequency,
    pub schedule: ScheduleSlot,
    #[serde(default)]
    pub is_active: bool,

    pub photo_url: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub deleted: bool,
}

/// Editable fields supplied when a medication is created
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicationDetails {
    pub name: String,
    pub amount: f64,
    pub unit: DoseUnit,
    pub duration: TreatmentDuration,
    pub cap_size: String,
    pub cause: String,
    pub frequency: Frequency,
    pub schedule: ScheduleSlot,
    pub is_active: bool,
}

/// Partial update, `None` leaves a field untouched
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicationChanges {
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

impl MedicationDetails {
    pub fn validate(&self) -> Result<(), Error> {
        require_text("name", &self.name)?;
        require_amount(self.amount)?;
        require_text("cap_size", &self.cap_size)?;
        require_text("cause", &self.cause)
    }
}

impl MedicationChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::validation("Nothing to update"));
        }
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(amount) = self.amount {
            require_amount(amount)?;
        }
        if let Some(cap_size) = &self.cap_size {
            require_text("cap_size", cap_size)?;
        }
        if let Some(cause) = &self.cause {
            require_text("cause", cause)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::validation("amount must be a non-negative number"));
    }
    Ok(())
}

pub const AGGREGATE_TYPE: &str = "Medication";

#[derive(Clone, Default)]
pub struct Services {}

#[async_trait]
impl Aggregate for Medication {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        _services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::CreateMedication {
                id,
                user_id,
                details,
            } => {
                self.validate_new()?;
                details.validate()?;

                Ok(vec![Event::MedicationCreated {
                    id,
                    user_id,
                    details,
                    created_at: Utc::now(),
                }])
            }

            Command::UpdateMedication { changes } => {
                self.validate_existing()?;
                changes.validate()?;

                Ok(vec![Event::MedicationUpdated {
                    id: self.id.clone(),
                    changes,
                    updated_at: Utc::now(),
                }])
            }

            Command::AttachPhoto { photo_url } => {
                self.validate_existing()?;
                require_text("photo_url", &photo_url)?;

                Ok(vec![Event::PhotoAttached {
                    id: self.id.clone(),
                    photo_url,
                    updated_at: Utc::now(),
                }])
            }

            Command::DeleteMedication => {
                self.validate_existing()?;

                Ok(vec![Event::MedicationDeleted {
                    id: self.id.clone(),
                    updated_at: Utc::now(),
                }])
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::MedicationCreated {
                id,
                user_id,
                details,
                created_at,
            } => {
                self.id = id;
                self.user_id = user_id;
                self.name = details.name;
                self.amount = details.amount;
                self.unit = details.unit;
                self.duration = details.duration;
                self.cap_size = details.cap_size;
                self.cause = details.cause;
                self.frequency = details.frequency;
                self.schedule = details.schedule;
                self.is_active = details.is_active;
                self.created_at = Some(created_at);
                self.updated_at = Some(created_at);
            }

            Event::MedicationUpdated {
                changes,
                updated_at,
                ..
            } => {
                self.apply_changes(changes);
                self.updated_at = Some(updated_at);
            }

            Event::PhotoAttached {
                photo_url,
                updated_at,
                ..
            } => {
                self.photo_url = Some(photo_url);
                self.updated_at = Some(updated_at);
            }

            Event::MedicationDeleted { updated_at, .. } => {
                self.deleted = true;
                self.updated_at = Some(updated_at);
            }
        }
    }
}

impl Medication {
    /// Whether `user_id` owns this medication. Unassigned medications are
    /// owned by nobody.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    fn apply_changes(&mut self, changes: MedicationChanges) {
        let MedicationChanges {
            name,
            amount,
            unit,
            duration,
            cap_size,
            cause,
            frequency,
            schedule,
            is_active,
        } = changes;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(amount) = amount {
            self.amount = amount;
        }
        if let Some(unit) = unit {
            self.unit = unit;
        }
        if let Some(duration) = duration {
            self.duration = duration;
        }
        if let Some(cap_size) = cap_size {
            self.cap_size = cap_size;
        }
        if let Some(cause) = cause {
            self.cause = cause;
        }
        if let Some(frequency) = frequency {
            self.frequency = frequency;
        }
        if let Some(schedule) = schedule {
            self.schedule = schedule;
        }
        if let Some(is_active) = is_active {
            self.is_active = is_active;
        }
    }

    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness {
                field: "id".to_string(),
            });
        }
        Ok(())
    }

    fn validate_existing(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
            });
        }
        if self.deleted {
            return Err(Error::Forbidden);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> MedicationDetails {
        MedicationDetails {
            name: "Rivastigmine".to_string(),
            amount: 2.0,
            unit: DoseUnit::Pill,
            duration: TreatmentDuration::TwoMonths,
            cap_size: "150mg 1 Capsule".to_string(),
            cause: "Alzheimer's".to_string(),
            frequency: Frequency::Daily,
            schedule: ScheduleSlot::AfterBreakfast,
            is_active: true,
        }
    }

    async fn execute(medication: &mut Medication, command: Command) -> Result<(), Error> {
        let events = medication.handle(command, &Services::default()).await?;
        for event in events {
            medication.apply(event);
        }
        Ok(())
    }

    async fn created() -> Medication {
        let mut medication = Medication::default();
        execute(
            &mut medication,
            Command::CreateMedication {
                id: "med-1".to_string(),
                user_id: Some("user-1".to_string()),
                details: details(),
            },
        )
        .await
        .unwrap();
        medication
    }

    #[tokio::test]
    async fn create_sets_fields_and_created_at() {
        let before = Utc::now();
        let medication = created().await;

        assert_eq!(medication.id, "med-1");
        assert_eq!(medication.user_id.as_deref(), Some("user-1"));
        assert_eq!(medication.name, "Rivastigmine");
        assert_eq!(medication.duration, TreatmentDuration::TwoMonths);
        assert!(medication.is_active);
        assert!(medication.created_at.unwrap() >= before);
        assert_eq!(medication.created_at, medication.updated_at);
    }

    #[tokio::test]
    async fn create_twice_is_a_uniqueness_conflict() {
        let medication = created().await;
        let result = medication
            .handle(
                Command::CreateMedication {
                    id: "med-1".to_string(),
                    user_id: None,
                    details: details(),
                },
                &Services::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::Uniqueness { .. })));
    }

    #[tokio::test]
    async fn create_rejects_invalid_details() {
        let mut blank_name = details();
        blank_name.name = "  ".to_string();
        let mut negative = details();
        negative.amount = -1.0;
        let mut no_cause = details();
        no_cause.cause = String::new();

        for details in [blank_name, negative, no_cause] {
            let result = Medication::default()
                .handle(
                    Command::CreateMedication {
                        id: "med-1".to_string(),
                        user_id: None,
                        details,
                    },
                    &Services::default(),
                )
                .await;
            assert!(matches!(result, Err(Error::Validation { .. })));
        }
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_owner() {
        let mut medication = created().await;
        let created_at = medication.created_at;

        execute(
            &mut medication,
            Command::UpdateMedication {
                changes: MedicationChanges {
                    schedule: Some(ScheduleSlot::BeforeDinner),
                    is_active: Some(false),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();

        assert_eq!(medication.schedule, ScheduleSlot::BeforeDinner);
        assert!(!medication.is_active);
        assert_eq!(medication.name, "Rivastigmine");
        assert_eq!(medication.created_at, created_at);
        assert!(medication.is_owned_by("user-1"));
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let medication = created().await;
        let result = medication
            .handle(
                Command::UpdateMedication {
                    changes: MedicationChanges::default(),
                },
                &Services::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn commands_on_missing_medication_are_not_found() {
        let result = Medication::default()
            .handle(Command::DeleteMedication, &Services::default())
            .await;

        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn deleted_medication_is_read_only() {
        let mut medication = created().await;
        execute(&mut medication, Command::DeleteMedication)
            .await
            .unwrap();
        assert!(medication.deleted);

        let result = medication
            .handle(
                Command::AttachPhoto {
                    photo_url: "s3://bucket/key".to_string(),
                },
                &Services::default(),
            )
            .await;
        assert!(matches!(result, Err(Error::Forbidden)));
    }

    #[tokio::test]
    async fn attach_photo_sets_url() {
        let mut medication = created().await;
        execute(
            &mut medication,
            Command::AttachPhoto {
                photo_url: "s3://photos/medications/med-1/p1".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            medication.photo_url.as_deref(),
            Some("s3://photos/medications/med-1/p1")
        );
    }

    #[test]
    fn unassigned_medication_has_no_owner() {
        assert!(!Medication::default().is_owned_by(""));
    }

    #[test]
    fn unit_wire_labels() {
        assert_eq!(serde_json::to_string(&DoseUnit::Milligram).unwrap(), "\"mg\"");
        assert_eq!(serde_json::to_string(&DoseUnit::Millilitre).unwrap(), "\"mL\"");
        assert!(serde_json::from_str::<DoseUnit>("\"ML\"").is_err());
    }
}
