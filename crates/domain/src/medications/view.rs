use std::sync::Arc;
use async_trait::async_trait;
use cqrs_es::{
    persist::{PersistenceError, ViewContext, ViewRepository},
    Aggregate, EventEnvelope, View as CqrsView,
};
use serde::{Deserialize, Serialize};
use super::{Medication, AGGREGATE_TYPE};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct View {
    pub aggregate_type: String,
    pub command_id: String,
    pub id: String,
    pub medication: Medication,
}

impl CqrsView<Medication> for View {
    fn update(&mut self, event: &EventEnvelope<Medication>) {
        self.id.clone_from(&event.aggregate_id);
        self.aggregate_type = AGGREGATE_TYPE.to_string();
        self.command_id = event
            .metadata
            .get("command_id")
            .cloned()
            .unwrap_or_default();
        self.medication.apply(event.payload.clone());
    }
}

pub type Repository = Arc<Box<dyn ViewRepository<View, Medication>>>;

pub struct Query {
    repo: Repository,
}

impl Query {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    async fn update(
        &self,
        medication_id: &str,
        events: &[EventEnvelope<Medication>],
    ) -> Result<(), PersistenceError> {
        let (mut view, view_context) = match self.repo.load_with_context(medication_id).await? {
            None => {
                let view_context = ViewContext::new(medication_id.to_string(), 0);
                (Default::default(), view_context)
            }
            Some((view, context)) => (view, context),
        };

        for event in events {
            view.update(event);
        }

        self.repo.update_view(view, view_context).await
    }
}

#[async_trait]
impl cqrs_es::Query<Medication> for Query {
    async fn dispatch(&self, medication_id: &str, events: &[EventEnvelope<Medication>]) {
        if let Err(err) = self.update(medication_id, events).await {
            tracing::error!("MedicationQuery error for {}: {}", medication_id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::medications::{Event, MedicationChanges};

    fn envelope(sequence: usize, payload: Event) -> EventEnvelope<Medication> {
        EventEnvelope {
            aggregate_id: "med-1".to_string(),
            sequence,
            payload,
            metadata: HashMap::from([("command_id".to_string(), format!("cmd-{sequence}"))]),
        }
    }

    #[test]
    fn view_tracks_events_and_command_id() {
        let mut view = View::default();
        let now = Utc::now();

        view.update(&envelope(
            1,
            Event::PhotoAttached {
                id: "med-1".to_string(),
                photo_url: "s3://b/k".to_string(),
                updated_at: now,
            },
        ));
        view.update(&envelope(
            2,
            Event::MedicationUpdated {
                id: "med-1".to_string(),
                changes: MedicationChanges {
                    name: Some("Memantine".to_string()),
                    ..Default::default()
                },
                updated_at: now,
            },
        ));

        assert_eq!(view.id, "med-1");
        assert_eq!(view.aggregate_type, AGGREGATE_TYPE);
        assert_eq!(view.command_id, "cmd-2");
        assert_eq!(view.medication.name, "Memantine");
        assert_eq!(view.medication.photo_url.as_deref(), Some("s3://b/k"));
    }
}
