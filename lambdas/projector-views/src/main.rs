use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_lambda_events::{
    kinesis::{KinesisEvent, KinesisEventRecord},
    streams::{KinesisBatchItemFailure, KinesisEventResponse},
};
use domain::{
    medications::{self, Medication, MedicationIndex},
    DomainEvent,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};

/// What the medications-by-user index should do with a medication
#[derive(Debug, PartialEq)]
enum IndexChange<'a> {
    Put(&'a Medication),
    Remove { user_id: &'a str, id: &'a str },
    Skip,
}

fn index_change(medication: &Medication) -> IndexChange<'_> {
    match medication.user_id.as_deref() {
        None => IndexChange::Skip,
        Some(user_id) if medication.deleted => IndexChange::Remove {
            user_id,
            id: &medication.id,
        },
        Some(_) => IndexChange::Put(medication),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);

    let medications_repo = medications::cqrs::init_repo(dynamodb_client.clone());
    let medications_index = MedicationIndex::init(dynamodb_client);

    lambda_runtime::run(service_fn(|event: LambdaEvent<KinesisEvent>| async {
        handle(event, &medications_repo, &medications_index).await
    }))
    .await
}

async fn handle(
    event: LambdaEvent<KinesisEvent>,
    repo: &medications::view::Repository,
    index: &MedicationIndex,
) -> Result<KinesisEventResponse, Error> {
    tracing::info!("Processing {} Kinesis records", event.payload.records.len());

    let mut batch_item_failures = Vec::new();

    for record in event.payload.records.iter() {
        let sequence = record.kinesis.sequence_number.clone();

        if let Err(e) = handle_record(record, repo, index).await {
            tracing::error!("Failed to process: {:#}", e);
            batch_item_failures.push(KinesisBatchItemFailure {
                item_identifier: sequence,
            });
        }
    }

    Ok(KinesisEventResponse { batch_item_failures })
}

async fn handle_record(
    record: &KinesisEventRecord,
    repo: &medications::view::Repository,
    index: &MedicationIndex,
) -> anyhow::Result<()> {
    let data = std::str::from_utf8(&record.kinesis.data).context("Record is not UTF-8")?;
    let event: DomainEvent = serde_json::from_str(data).context("Record is not a domain event")?;

    tracing::info!("Received event: {} for {}", event.event_type, event.id);

    if event.aggregate_type != medications::AGGREGATE_TYPE {
        return Ok(());
    }

    // Project the latest view rather than the single event, replays are idempotent
    let Some(view) = repo
        .load(&event.id)
        .await
        .with_context(|| format!("Failed to load medication view {}", event.id))?
    else {
        tracing::warn!("No view for medication {}", event.id);
        return Ok(());
    };

    match index_change(&view.medication) {
        IndexChange::Put(medication) => index
            .put(medication)
            .await
            .with_context(|| format!("Failed to index medication {}", event.id))?,
        IndexChange::Remove { user_id, id } => index
            .remove(user_id, id)
            .await
            .with_context(|| format!("Failed to unindex medication {}", event.id))?,
        IndexChange::Skip => tracing::info!("Medication {} has no owner, not indexed", event.id),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medication(user_id: Option<&str>, deleted: bool) -> Medication {
        Medication {
            id: "med-1".to_string(),
            user_id: user_id.map(str::to_string),
            deleted,
            ..Default::default()
        }
    }

    #[test]
    fn owned_medication_is_upserted() {
        let medication = medication(Some("user-1"), false);
        assert_eq!(index_change(&medication), IndexChange::Put(&medication));
    }

    #[test]
    fn deleted_medication_is_removed_from_owner() {
        let medication = medication(Some("user-1"), true);
        assert_eq!(
            index_change(&medication),
            IndexChange::Remove {
                user_id: "user-1",
                id: "med-1"
            }
        );
    }

    #[test]
    fn unassigned_medication_is_skipped() {
        assert_eq!(index_change(&medication(None, false)), IndexChange::Skip);
        assert_eq!(index_change(&medication(None, true)), IndexChange::Skip);
    }
}
