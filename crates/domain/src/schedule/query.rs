use async_trait::async_trait;
use chrono::{DateTime, TimeZone};

use crate::{errors::Error, medications::Medication};

use super::ReportScope;

/// Read side the due query loads candidates from
#[async_trait]
pub trait MedicationSource: Send + Sync {
    /// Medications of `user_id` with `is_active` set, in storage order.
    /// Ownership beyond the user key is not checked.
    async fn fetch_active_medications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Medication>, Error>;
}

/// Lists the medications of a user that are due at a given instant
pub struct MedicationDueQuery<S> {
    source: S,
}

impl<S: MedicationSource> MedicationDueQuery<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Loads the user's active medications and keeps the ones due at `now`
    /// within `scope`, preserving storage order. Storage errors are returned
    /// as-is.
    pub async fn run<Tz>(
        &self,
        user_id: &str,
        scope: ReportScope,
        now: &DateTime<Tz>,
    ) -> Result<Vec<Medication>, Error>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        let medications = self
            .source
            .fetch_active_medications_for_user(user_id)
            .await?;

        let candidates = medications.len();
        let due = filter_due(medications, scope, now);

        tracing::info!(
            user_id,
            %scope,
            candidates,
            due = due.len(),
            "Evaluated due medications"
        );

        Ok(due)
    }
}

/// Keeps the medications due at `now` within `scope`, in input order.
pub fn filter_due<Tz: TimeZone>(
    medications: Vec<Medication>,
    scope: ReportScope,
    now: &DateTime<Tz>,
) -> Vec<Medication> {
    medications
        .into_iter()
        .filter(|medication| is_reportable(medication, scope, now))
        .collect()
}

fn is_reportable<Tz: TimeZone>(
    medication: &Medication,
    scope: ReportScope,
    now: &DateTime<Tz>,
) -> bool {
    let Some(created_at) = medication.created_at.as_ref() else {
        tracing::warn!(
            medication_id = %medication.id,
            "Skipping medication due to missing created_at"
        );
        return false;
    };

    medication
        .duration
        .is_within_treatment_window(Some(created_at), now)
        && medication.frequency.is_due_now(medication.schedule, now)
        && scope.in_report_range(now)
}
